//! Error type for filter construction and import.

use thiserror::Error;

/// The error type for fallible operations on a bloom filter.
///
/// All failures are synchronous and detected at the call site; nothing is
/// retried or recovered internally. An error never leaves a filter partially
/// updated: construction and import either install a complete state or leave
/// the previous one untouched.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A constructor or override parameter was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An import string did not decompress to a well-formed byte list.
    #[error("malformed import data: {0}")]
    MalformedImport(String),
}
