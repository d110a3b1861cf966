//! Space-efficient probabilistic data structure for approximate membership
//! queries in a set, with a compressed, transportable export format.

mod bloom_filter;

pub use self::bloom_filter::BloomFilter;
