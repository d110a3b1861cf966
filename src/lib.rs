//! # portable-bloom
//!
//! `portable-bloom` is a bloom filter with a compact, transportable export
//! format. The filter derives its bit positions from two non-cryptographic
//! string hashes (`djb2` and `sdbm`) combined through enhanced double hashing,
//! and serializes its bit vector through a dictionary compression codec into a
//! Base64-alphabet string. Any two conforming implementations produce and
//! accept byte-identical export strings for identical filter state, so a
//! filter can be built in one process and shipped to another as plain text.
//!
//! ## Usage
//!
//! ```
//! use portable_bloom::bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::new(1000, 0.01).unwrap();
//! filter.insert("foo");
//! assert!(filter.contains("foo"));
//!
//! let exported = filter.export_data();
//!
//! let mut restored = BloomFilter::new(1000, 0.01).unwrap();
//! restored.import_data(&exported, None).unwrap();
//! assert!(restored.contains("foo"));
//! ```
//!
//! The codec in [`codec`] is a stateless compress/decompress pair and can be
//! used on arbitrary text independently of the filter.
//!
//! ## References
//!
//!  - [Less hashing, same performance: Building a better Bloom filter](https://dl.acm.org/citation.cfm?id=1400125)
//!  > Kirsch, Adam, and Michael Mitzenmacher. 2008. “Less Hashing, Same Performance: Building a Better Bloom Filter.” *Random Struct. Algorithms* 33 (2). New York, NY, USA: John Wiley & Sons, Inc.: 187–218. doi:[10.1002/rsa.v33:2](https://doi.org/10.1002/rsa.v33:2).

#![warn(missing_docs)]

pub mod bit_vec;
pub mod bloom;
pub mod codec;
mod error;
pub mod hash;

pub use self::error::Error;
