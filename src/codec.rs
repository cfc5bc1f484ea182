use log::{debug, info};

use crate::bitstream;
use crate::error::{HuffmanError, Result};
use crate::huffman::{FrequencyTable, HuffmanTree};
use crate::tree_codec::{self, MAGIC, MAX_COUNT};

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    pub input_len: usize,
    pub output_len: usize,
    pub distinct_symbols: usize,
    /// Bits/symbol.
    pub entropy: f64,
}

impl CompressionStats {
    /// Percentage of the input saved; negative when the artifact is larger.
    pub fn ratio(&self) -> f64 {
        // Only reachable for stats built by hand; encoding rejects empty input.
        if self.input_len == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.output_len as f64 / self.input_len as f64)
    }
}

/// Compresses `input` into a self-describing artifact.
pub fn encode(input: &[u8]) -> Result<Vec<u8>> {
    encode_with_stats(input).map(|(artifact, _)| artifact)
}

pub fn encode_with_stats(input: &[u8]) -> Result<(Vec<u8>, CompressionStats)> {
    let freq = FrequencyTable::from_bytes(input)?;

    check_counts(freq.total())?;

    let tree = HuffmanTree::build(&freq)?;
    let table = tree.code_table();

    let mut artifact = Vec::with_capacity(MAGIC.len() + (tree.len() + 1) * 8 + input.len() / 2);
    artifact.extend_from_slice(&MAGIC);
    tree_codec::serialize(&tree, &mut artifact);
    let header_len = artifact.len();
    bitstream::write_symbols(input, &table, &mut artifact)?;

    debug!(
        "Artifact: {} header bytes, {} data bytes",
        header_len,
        artifact.len() - header_len
    );

    let stats = CompressionStats {
        input_len: input.len(),
        output_len: artifact.len(),
        distinct_symbols: freq.distinct(),
        entropy: freq.entropy(),
    };
    info!(
        "Encoded {} bytes into {} bytes ({:.2}% saved)",
        stats.input_len,
        stats.output_len,
        stats.ratio()
    );
    Ok((artifact, stats))
}

/// Every node count is bounded by the input length, so checking the total
/// covers every record the tree will produce.
fn check_counts(total: u64) -> Result<()> {
    if total > MAX_COUNT {
        return Err(HuffmanError::CountOverflow { count: total });
    }
    Ok(())
}

/// Restores the original bytes from an artifact produced by [`encode`].
pub fn decode(artifact: &[u8]) -> Result<Vec<u8>> {
    let body = artifact
        .strip_prefix(&MAGIC[..])
        .ok_or(HuffmanError::HeaderMismatch)?;

    let (tree, consumed) = tree_codec::deserialize(body)?;
    tree_codec::validate(&tree)?;
    debug!(
        "Tree with {} leaves validated, {} data bytes follow",
        tree.leaf_count(),
        body.len() - consumed
    );

    let output = bitstream::read_symbols(&tree, &body[consumed..])?;
    info!("Decoded {} bytes into {} bytes", artifact.len(), output.len());
    Ok(output)
}
