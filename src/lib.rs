//! Lossless byte-stream compression with static Huffman coding.
//!
//! ```
//! let artifact = huffman_codec::encode(b"BDAACB")?;
//! assert_eq!(huffman_codec::decode(&artifact)?, b"BDAACB");
//! # Ok::<(), huffman_codec::HuffmanError>(())
//! ```
//!
//! An artifact is the 8-byte magic header, the tree as pre-order 64-bit
//! records closed by an all-zero record, then the code words of the input
//! packed LSB first. Inputs made of a single distinct byte value encode to an
//! empty data region and are rejected by [`decode`].

pub mod bitstream;
pub mod codec;
pub mod error;
pub mod files;
pub mod huffman;
pub mod tree_codec;

pub use codec::{decode, encode, encode_with_stats, CompressionStats};
pub use error::{ErrorKind, HuffmanError, Result};
pub use huffman::{CodeTable, FrequencyTable, HuffmanTree, Node, Symbol};
