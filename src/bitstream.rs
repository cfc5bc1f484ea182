use log::{debug, trace, warn};

use crate::error::{HuffmanError, Result};
use crate::huffman::{CodeTable, HuffmanTree, Node, NodeId};

/// Packs bits least-significant-bit first; the last byte is zero-padded.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        BitWriter::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        BitWriter {
            bytes: Vec::with_capacity(bytes),
            bit_len: 0,
        }
    }

    pub fn push_bit(&mut self, bit: bool) {
        let offset = self.bit_len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << offset;
            }
        }
        self.bit_len += 1;
    }

    pub fn push_bits(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.push_bit(bit);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Concatenates the code word of every input symbol and appends the packed
/// bytes to `out`.
pub fn write_symbols(data: &[u8], table: &CodeTable, out: &mut Vec<u8>) -> Result<()> {
    let mut writer = BitWriter::with_capacity(data.len() / 2);
    for &symbol in data {
        let code = table
            .get(symbol)
            .ok_or(HuffmanError::UnknownSymbol { symbol })?;
        writer.push_bits(code);
    }

    let bit_len = writer.bit_len();
    let bytes = writer.into_bytes();
    debug!(
        "Packed {} symbols into {} bits ({} bytes)",
        data.len(),
        bit_len,
        bytes.len()
    );
    out.extend(bytes);
    Ok(())
}

/// Iterates the bits of a byte slice, LSB first, with the index of the byte
/// each bit came from.
pub fn bits(data: &[u8]) -> impl Iterator<Item = (usize, bool)> + '_ {
    data.iter()
        .enumerate()
        .flat_map(|(index, &byte)| (0..8).map(move |i| (index, (byte >> i) & 1 == 1)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Active,
    /// Only zero padding may follow.
    Terminating,
}

/// Walks the tree bit by bit. Leaf counts tell real data apart from the zero
/// padding of the last byte, since the stream stores no length.
pub struct Decoder<'t> {
    tree: &'t HuffmanTree,
    remaining: Vec<u64>,
    position: NodeId,
    state: DecodeState,
    left_only: bool,
    output: Vec<u8>,
}

impl<'t> Decoder<'t> {
    /// `tree` must already have passed `tree_codec::validate`.
    pub fn new(tree: &'t HuffmanTree, capacity: usize) -> Self {
        let remaining = tree
            .nodes()
            .iter()
            .map(|node| match node {
                Node::Leaf { count, .. } => *count,
                Node::Internal { .. } => 0,
            })
            .collect();

        Decoder {
            tree,
            remaining,
            position: tree.root(),
            state: DecodeState::Active,
            left_only: true,
            output: Vec::with_capacity(capacity),
        }
    }

    /// Consumes one bit read from data byte `byte` of `len`.
    pub fn step(&mut self, bit: bool, byte: usize, len: usize) -> Result<()> {
        if bit && self.state == DecodeState::Terminating {
            return Err(HuffmanError::InvalidTermination { byte });
        }

        let next = match *self.tree.node(self.position) {
            Node::Internal { left, right, .. } => {
                if bit {
                    right
                } else {
                    left
                }
            }
            Node::Leaf { .. } => return Err(HuffmanError::InvalidPath { byte }),
        };
        if bit {
            self.left_only = false;
        }

        let Node::Leaf { symbol, .. } = *self.tree.node(next) else {
            self.position = next;
            return Ok(());
        };

        if self.remaining[next] > 0 {
            self.remaining[next] -= 1;
            self.output.push(symbol);
            self.state = DecodeState::Active;
        } else {
            if !self.left_only {
                return Err(HuffmanError::InvalidTermination { byte });
            }
            if byte + 1 < len {
                return Err(HuffmanError::PrematureTermination { symbol, byte, len });
            }
            if self.state == DecodeState::Active {
                trace!("Padding detected at data byte {}", byte);
            }
            self.state = DecodeState::Terminating;
        }

        self.position = self.tree.root();
        self.left_only = true;
        Ok(())
    }

    /// Fails unless every leaf has been used exactly as often as its count.
    pub fn finish(self) -> Result<Vec<u8>> {
        let missing: u64 = self
            .remaining
            .iter()
            .fold(0u64, |acc, &left| acc.saturating_add(left));
        if missing > 0 {
            return Err(HuffmanError::IncompleteData { missing });
        }
        Ok(self.output)
    }
}

/// Decodes the packed data region with a validated tree.
pub fn read_symbols(tree: &HuffmanTree, data: &[u8]) -> Result<Vec<u8>> {
    // Every decoded symbol costs at least one bit.
    let expected = tree.node(tree.root()).count();
    let capacity = usize::try_from(expected)
        .unwrap_or(usize::MAX)
        .min(data.len().saturating_mul(8));

    let mut decoder = Decoder::new(tree, capacity);
    for (byte, bit) in bits(data) {
        decoder.step(bit, byte, data.len()).inspect_err(|e| {
            warn!("Bitstream rejected: {}", e);
        })?;
    }

    let output = decoder.finish().inspect_err(|e| {
        warn!("Bitstream rejected: {}", e);
    })?;
    debug!(
        "Decoded {} bytes from {} data bytes",
        output.len(),
        data.len()
    );
    Ok(output)
}
