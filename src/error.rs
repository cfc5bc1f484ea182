use thiserror::Error;

use crate::huffman::Symbol;

pub type Result<T> = std::result::Result<T, HuffmanError>;

/// Broad class of a failure, used by callers to decide what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller handed us something we refuse to compress.
    Input,
    /// The artifact is not a Huffman file or its tree region is corrupted.
    Format,
    /// The tree is fine but the packed bit stream is corrupted or truncated.
    DataStream,
    Io,
}

#[derive(Debug, Error)]
pub enum HuffmanError {
    #[error("cannot compress an empty input")]
    EmptyInput,

    #[error("cannot build a Huffman tree from zero leaves")]
    EmptyForest,

    #[error("symbol {symbol:#04x} has no code word")]
    UnknownSymbol { symbol: Symbol },

    #[error("count {count} does not fit in the 55-bit record field")]
    CountOverflow { count: u64 },

    #[error("missing or wrong magic header")]
    HeaderMismatch,

    #[error("tree records end after {records} record(s) but the tree is incomplete")]
    TruncatedTree { records: usize },

    #[error("{extra} record(s) left over after the tree was complete")]
    TrailingRecords { extra: usize },

    #[error("invalid tree structure at node {node}: {reason}")]
    InvalidTreeStructure { node: usize, reason: &'static str },

    #[error("bit at data byte {byte} leads below a leaf")]
    InvalidPath { byte: usize },

    #[error("invalid termination at data byte {byte}")]
    InvalidTermination { byte: usize },

    #[error("too many uses of symbol {symbol:#04x} at data byte {byte} of {len}")]
    PrematureTermination { symbol: Symbol, byte: usize, len: usize },

    #[error("incomplete data: {missing} symbol occurrence(s) were never decoded")]
    IncompleteData { missing: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HuffmanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HuffmanError::EmptyInput
            | HuffmanError::EmptyForest
            | HuffmanError::UnknownSymbol { .. }
            | HuffmanError::CountOverflow { .. } => ErrorKind::Input,
            HuffmanError::HeaderMismatch
            | HuffmanError::TruncatedTree { .. }
            | HuffmanError::TrailingRecords { .. }
            | HuffmanError::InvalidTreeStructure { .. } => ErrorKind::Format,
            HuffmanError::InvalidPath { .. }
            | HuffmanError::InvalidTermination { .. }
            | HuffmanError::PrematureTermination { .. }
            | HuffmanError::IncompleteData { .. } => ErrorKind::DataStream,
            HuffmanError::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(HuffmanError::EmptyInput.kind(), ErrorKind::Input);
        assert_eq!(HuffmanError::HeaderMismatch.kind(), ErrorKind::Format);
        assert_eq!(
            HuffmanError::TrailingRecords { extra: 2 }.kind(),
            ErrorKind::Format
        );
        assert_eq!(
            HuffmanError::IncompleteData { missing: 1 }.kind(),
            ErrorKind::DataStream
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(HuffmanError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn messages_carry_detail() {
        let err = HuffmanError::PrematureTermination {
            symbol: b'A',
            byte: 3,
            len: 9,
        };
        assert_eq!(
            err.to_string(),
            "too many uses of symbol 0x41 at data byte 3 of 9"
        );
    }
}
