use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::codec::{self, CompressionStats};
use crate::error::Result;

pub const ENCODED_EXTENSION: &str = "huff";
pub const DECODED_EXTENSION: &str = "txt";

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    info!("Reading input file: {}", path.display());
    let data = fs::read(path)?;
    debug!("Read {} bytes", data.len());
    Ok(data)
}

/// Writes `bytes` next to `path` and moves the result into place only once
/// the write has fully succeeded. The temporary file is removed on failure.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// `notes.md` becomes `notes.md.huff`; the whole file name is kept.
pub fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

pub fn encode_file(input: &Path, output: &Path) -> Result<CompressionStats> {
    let data = read_input(input)?;
    let (artifact, stats) = codec::encode_with_stats(&data)?;
    write_atomically(output, &artifact)?;
    Ok(stats)
}

/// Returns the number of bytes written.
pub fn decode_file(input: &Path, output: &Path) -> Result<usize> {
    let artifact = read_input(input)?;
    let data = codec::decode(&artifact)?;
    write_atomically(output, &data)?;
    Ok(data.len())
}
