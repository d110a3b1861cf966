use crate::bit_vec::BitVec;
use crate::codec;
use crate::hash::DoubleHash;
use crate::Error;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A space-efficient probabilistic data structure to test for membership in a
/// set.
///
/// At its core, a bloom filter is a bit array, initially all set to zero. `K`
/// hash functions map each element to `K` bits in the bit array. An element
/// definitely does not exist in the bloom filter if any of the `K` bits are
/// unset. An element is possibly in the set if all of the `K` bits are set.
/// This implementation derives its rounds from two string hashes (`djb2` and
/// `sdbm`) through enhanced double hashing, and sizes the bit array to a whole
/// number of bytes so the state can be exported as a compressed text string
/// and imported elsewhere.
///
/// The exact bit layout, including the mapping of hash remainders onto bits
/// within a byte, is part of the export format and is kept stable even where
/// a cleaner mapping exists: data exported by one conforming implementation
/// must hit the same bits when imported by another.
///
/// # Examples
///
/// ```
/// use portable_bloom::bloom::BloomFilter;
///
/// let mut filter = BloomFilter::new(10, 0.01).unwrap();
///
/// assert!(!filter.contains("foo"));
/// filter.insert("foo");
/// assert!(filter.contains("foo"));
///
/// assert_eq!(filter.len(), 96);
/// assert_eq!(filter.hash_rounds(), 7);
///
/// let exported = filter.export_data();
/// let mut restored = BloomFilter::new(10, 0.01).unwrap();
/// restored.import_data(&exported, None).unwrap();
/// assert!(restored.contains("foo"));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
pub struct BloomFilter {
    bit_vec: BitVec,
    hash_rounds: usize,
}

impl BloomFilter {
    /// Constructs a new, empty `BloomFilter` with an estimated max capacity of
    /// `item_count` items and a target false positive probability of `fpp`.
    ///
    /// The bit count follows the standard optimal sizing formula and is
    /// rounded up to the next multiple of 8 for byte-addressable storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `item_count` is zero or `fpp` is
    /// not strictly between 0 and 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(1000, 0.01).unwrap();
    /// assert_eq!(filter.len(), 9592);
    /// assert_eq!(filter.hash_rounds(), 7);
    /// ```
    pub fn new(item_count: usize, fpp: f64) -> Result<Self, Error> {
        if item_count == 0 {
            return Err(Error::InvalidArgument("item_count must be positive"));
        }
        if !fpp.is_finite() || fpp <= 0.0 || fpp >= 1.0 {
            return Err(Error::InvalidArgument(
                "fpp must be strictly between 0 and 1",
            ));
        }

        let bit_count = Self::get_bit_count(item_count, fpp);
        let hash_rounds =
            (2f64.ln() * (bit_count as f64) / (item_count as f64)).round() as usize;
        Ok(BloomFilter {
            bit_vec: BitVec::new(bit_count),
            hash_rounds,
        })
    }

    fn get_bit_count(item_count: usize, fpp: f64) -> usize {
        let raw_bits = ((item_count as f64) * fpp.ln()
            / (1.0 / 2f64.powf(2f64.ln())).ln())
        .ceil() as usize;
        match raw_bits % 8 {
            0 => raw_bits,
            rem => raw_bits + 8 - rem,
        }
    }

    /// Maps a round hash onto a bit index of the vector.
    ///
    /// Remainders 1 through 7 count down from the high bit of the addressed
    /// byte; a remainder of 0 lands on the low bit of that same byte. The
    /// discontinuity is part of the export format and must not be smoothed
    /// out.
    fn bit_index(hash: u64) -> usize {
        if hash % 8 == 0 {
            (hash + 7) as usize
        } else {
            (hash - 1) as usize
        }
    }

    /// Inserts an element into the bloom filter.
    ///
    /// Returns `true` if any bit was newly set, an approximate signal that
    /// the element was not previously inserted. Partial overlap with earlier
    /// insertions can still report `true`, so this is not a guarantee of
    /// novelty.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// assert!(filter.insert("foo"));
    /// assert!(!filter.insert("foo"));
    /// ```
    pub fn insert(&mut self, item: &str) -> bool {
        let bit_count = self.bit_vec.len() as u64;
        let mut added = false;
        for hash in DoubleHash::new(item, bit_count)
            .rounds()
            .take(self.hash_rounds + 1)
        {
            let index = Self::bit_index(hash);
            if !self.bit_vec[index] {
                self.bit_vec.set(index, true);
                added = true;
            }
        }
        added
    }

    /// Inserts every element of `items` into the bloom filter.
    ///
    /// Elements are applied in reverse sequence order. Insertion order has no
    /// effect on final membership; the order is kept for behavioral parity
    /// with other conforming implementations.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// filter.insert_all(vec!["foo", "bar"]);
    /// assert!(filter.contains("foo"));
    /// assert!(filter.contains("bar"));
    /// ```
    pub fn insert_all<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: DoubleEndedIterator,
    {
        for item in items.into_iter().rev() {
            self.insert(item);
        }
    }

    /// Checks if an element is possibly in the bloom filter.
    ///
    /// Never returns `false` for a previously inserted element; returns
    /// `true` for absent elements at roughly the configured false positive
    /// rate.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo");
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains(&self, item: &str) -> bool {
        let bit_count = self.bit_vec.len() as u64;
        DoubleHash::new(item, bit_count)
            .rounds()
            .take(self.hash_rounds + 1)
            .all(|hash| self.bit_vec[Self::bit_index(hash)])
    }

    /// Serializes the bit vector into a compressed, transportable string.
    ///
    /// The format is a Base64-alphabet dictionary compression of the byte
    /// values joined with commas; see [`codec`](crate::codec) for the exact
    /// encoding. The returned string is the sole external artifact of a
    /// filter and can be fed to [`import_data`](BloomFilter::import_data) on
    /// any conforming implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    /// let exported = filter.export_data();
    /// assert!(!exported.is_empty());
    /// ```
    pub fn export_data(&self) -> String {
        let byte_list = self
            .bit_vec
            .to_bytes()
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");
        codec::compress(&byte_list)
    }

    /// Serializes the filter as [`export_data`](BloomFilter::export_data) and
    /// hands the result to `consumer`, returning its result.
    ///
    /// A convenience for callers that deliver the export through a callback
    /// rather than holding the string themselves.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    /// let length = filter.export_data_with(|exported| exported.len());
    /// assert!(length > 0);
    /// ```
    pub fn export_data_with<F, R>(&self, consumer: F) -> R
    where
        F: FnOnce(String) -> R,
    {
        consumer(self.export_data())
    }

    /// Replaces the filter's state with the decompressed contents of
    /// `compressed`, a string produced by
    /// [`export_data`](BloomFilter::export_data).
    ///
    /// The bit count becomes eight times the decoded byte count. When
    /// `hash_rounds` is `Some`, the round count is replaced as well;
    /// otherwise it is left unchanged. This is a wholesale replacement, never
    /// a merge, and on error the previous state is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedImport`] if `compressed` does not
    /// decompress, or the decompressed text is not a comma-separated list of
    /// byte values.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01).unwrap();
    /// filter.insert("foo");
    ///
    /// let mut restored = BloomFilter::new(10, 0.01).unwrap();
    /// restored.import_data(&filter.export_data(), None).unwrap();
    /// assert!(restored.contains("foo"));
    /// ```
    pub fn import_data(
        &mut self,
        compressed: &str,
        hash_rounds: Option<usize>,
    ) -> Result<(), Error> {
        let byte_list = codec::decompress(compressed)
            .ok_or_else(|| Error::MalformedImport("data did not decompress".to_owned()))?;
        let bytes = byte_list
            .split(',')
            .map(|value| {
                value
                    .parse::<u8>()
                    .map_err(|err| Error::MalformedImport(format!("byte value {:?}: {}", value, err)))
            })
            .collect::<Result<Vec<u8>, Error>>()?;

        self.bit_vec = BitVec::from_bytes(&bytes);
        if let Some(hash_rounds) = hash_rounds {
            self.hash_rounds = hash_rounds;
        }
        Ok(())
    }

    /// Returns the number of bits in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    /// assert_eq!(filter.len(), 96);
    /// ```
    pub fn len(&self) -> usize {
        self.bit_vec.len()
    }

    /// Returns `true` if the bloom filter holds no bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    /// assert!(!filter.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.bit_vec.is_empty()
    }

    /// Returns the number of derived-hash rounds configured for the filter.
    ///
    /// Each operation additionally evaluates the two base hashes, so
    /// `hash_rounds() + 1` bits are touched per item.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(1000, 0.01).unwrap();
    /// assert_eq!(filter.hash_rounds(), 7);
    /// ```
    pub fn hash_rounds(&self) -> usize {
        self.hash_rounds
    }

    /// Returns a snapshot of the raw bit vector as bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10, 0.01).unwrap();
    /// assert_eq!(filter.to_bytes(), vec![0; 12]);
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bit_vec.to_bytes()
    }

    /// Clears the bloom filter, removing all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01).unwrap();
    ///
    /// filter.insert("foo");
    /// filter.clear();
    /// assert!(!filter.contains("foo"));
    /// ```
    pub fn clear(&mut self) {
        self.bit_vec.set_all(false)
    }

    /// Returns the number of set bits in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(1000, 0.01).unwrap();
    /// filter.insert("alpha");
    /// assert_eq!(filter.count_ones(), 8);
    /// ```
    pub fn count_ones(&self) -> usize {
        self.bit_vec.count_ones()
    }

    /// Returns the number of unset bits in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(1000, 0.01).unwrap();
    /// assert_eq!(filter.count_zeros(), 9592);
    /// ```
    pub fn count_zeros(&self) -> usize {
        self.bit_vec.count_zeros()
    }

    /// Returns the estimated false positive probability of the bloom filter.
    /// This value will increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100, 0.01).unwrap();
    /// assert_eq!(filter.estimated_fpp(), 0.0);
    ///
    /// filter.insert("foo");
    /// assert!(filter.estimated_fpp() > 0.0);
    /// assert!(filter.estimated_fpp() < 0.01);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        let single_fpp = self.bit_vec.count_ones() as f64 / self.bit_vec.len() as f64;
        single_fpp.powi(self.hash_rounds as i32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::BloomFilter;
    use crate::Error;
    use rand::distributions::Alphanumeric;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    #[test]
    fn test_new() {
        let filter = BloomFilter::new(1000, 0.01).unwrap();

        assert_eq!(filter.len(), 9592);
        assert_eq!(filter.len() % 8, 0);
        assert_eq!(filter.hash_rounds(), 7);
        assert_eq!(filter.count_ones(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_arguments() {
        assert_eq!(
            BloomFilter::new(0, 0.01).unwrap_err(),
            Error::InvalidArgument("item_count must be positive"),
        );
        for fpp in &[1.0, 1.5, 0.0, -0.5, std::f64::NAN, std::f64::INFINITY] {
            assert!(matches!(
                BloomFilter::new(1000, *fpp),
                Err(Error::InvalidArgument(_)),
            ));
        }
    }

    #[test]
    fn test_bit_count_is_byte_aligned() {
        for &(item_count, fpp) in &[(10, 0.01), (100, 0.05), (1000, 0.01), (12345, 0.001)] {
            let filter = BloomFilter::new(item_count, fpp).unwrap();
            assert!(filter.len() > 0);
            assert_eq!(filter.len() % 8, 0);
        }
    }

    #[test]
    fn test_insert_contains() {
        let mut filter = BloomFilter::new(1000, 0.01).unwrap();

        assert!(!filter.contains("alpha"));
        assert!(filter.insert("alpha"));
        assert!(filter.contains("alpha"));
        assert!(!filter.insert("alpha"));
        assert_eq!(filter.count_ones(), 8);

        assert!(!filter.contains("zzz-not-inserted"));
    }

    #[test]
    fn test_exact_bit_pattern() {
        // Fixed vector; any change here breaks compatibility of exported
        // filter data.
        let mut filter = BloomFilter::new(10, 0.01).unwrap();
        assert_eq!(filter.len(), 96);
        assert_eq!(filter.hash_rounds(), 7);

        filter.insert("foo");
        filter.insert("bar");
        filter.insert("baz");
        assert_eq!(
            filter.to_bytes(),
            vec![196, 37, 112, 116, 0, 68, 0, 68, 32, 70, 68, 0],
        );
    }

    #[test]
    fn test_insert_all() {
        let mut forward = BloomFilter::new(100, 0.01).unwrap();
        let mut reversed = BloomFilter::new(100, 0.01).unwrap();

        forward.insert_all(vec!["foo", "bar", "baz"]);
        reversed.insert_all(vec!["baz", "bar", "foo"]);

        for item in &["foo", "bar", "baz"] {
            assert!(forward.contains(item));
        }
        // Insertion order does not change final membership.
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_no_false_negatives_random_keys() {
        let mut rng = XorShiftRng::seed_from_u64(0xDEAD_BEEF);
        let mut filter = BloomFilter::new(500, 0.01).unwrap();
        let keys = (0..500)
            .map(|_| {
                (&mut rng)
                    .sample_iter(&Alphanumeric)
                    .take(16)
                    .collect::<String>()
            })
            .collect::<Vec<_>>();

        for key in &keys {
            filter.insert(key);
        }
        for key in &keys {
            assert!(filter.contains(key));
        }
    }

    #[test]
    fn test_false_positive_rate_near_target() {
        let mut filter = BloomFilter::new(1000, 0.01).unwrap();
        for index in 0..1000 {
            filter.insert(&format!("key-{}", index));
        }

        let false_positives = (0..10000)
            .filter(|index| filter.contains(&format!("absent-{}", index)))
            .count();
        // Deterministic workload; the observed count is 134 (1.34%).
        assert!(false_positives < 300);
    }

    #[test]
    fn test_export_known_vector() {
        let mut filter = BloomFilter::new(10, 0.01).unwrap();
        filter.insert("foo");
        filter.insert("bar");
        filter.insert("baz");

        assert_eq!(
            filter.export_data(),
            "IwTgbANAzA7BzAEz2JADBMAOCHvWRjxzSA==",
        );
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut filter = BloomFilter::new(1000, 0.01).unwrap();
        let keys = (0..100).map(|index| format!("key-{}", index)).collect::<Vec<_>>();
        for key in &keys {
            filter.insert(key);
        }

        let mut restored = BloomFilter::new(1000, 0.01).unwrap();
        restored.import_data(&filter.export_data(), None).unwrap();

        assert_eq!(restored.len(), filter.len());
        for key in &keys {
            assert!(restored.contains(key));
        }
        for index in 0..100 {
            let absent = format!("absent-{}", index);
            assert_eq!(restored.contains(&absent), filter.contains(&absent));
        }
    }

    #[test]
    fn test_import_replaces_state_wholesale() {
        let zero_export = BloomFilter::new(10, 0.01).unwrap().export_data();

        let mut filter = BloomFilter::new(1000, 0.01).unwrap();
        filter.insert("alpha");
        filter.import_data(&zero_export, Some(3)).unwrap();

        assert_eq!(filter.len(), 96);
        assert_eq!(filter.hash_rounds(), 3);
        assert_eq!(filter.count_ones(), 0);
        for item in &["alpha", "foo", "bar", ""] {
            assert!(!filter.contains(item));
        }
    }

    #[test]
    fn test_import_zero_vector() {
        // Compressed form of eight zero bytes.
        let mut filter = BloomFilter::new(10, 0.01).unwrap();
        filter.import_data("AwGl7TyA", None).unwrap();

        assert_eq!(filter.len(), 64);
        for item in &["alpha", "beta", "gamma", "zzz-not-inserted"] {
            assert!(!filter.contains(item));
        }
    }

    #[test]
    fn test_import_keeps_hash_rounds_without_override() {
        let exported = BloomFilter::new(10, 0.01).unwrap().export_data();

        let mut filter = BloomFilter::new(1000, 0.01).unwrap();
        filter.import_data(&exported, None).unwrap();
        assert_eq!(filter.hash_rounds(), 7);
    }

    #[test]
    fn test_import_rejects_malformed_data() {
        let mut filter = BloomFilter::new(10, 0.01).unwrap();
        filter.insert("foo");
        let before = filter.clone();

        for bad in &["", "!!!!", "IZA="] {
            assert!(matches!(
                filter.import_data(bad, None),
                Err(Error::MalformedImport(_)),
            ));
        }
        // 256 is not a byte value.
        let overflow = crate::codec::compress("0,256,0");
        assert!(matches!(
            filter.import_data(&overflow, None),
            Err(Error::MalformedImport(_)),
        ));

        // Failed imports leave the previous state untouched.
        assert_eq!(filter, before);
    }

    #[test]
    fn test_export_data_with() {
        let mut filter = BloomFilter::new(10, 0.01).unwrap();
        filter.insert("foo");

        let exported = filter.export_data_with(|data| data);
        assert_eq!(exported, filter.export_data());
    }

    #[test]
    fn test_clear() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        filter.insert("foo");
        filter.clear();

        assert!(!filter.contains("foo"));
        assert_eq!(filter.count_ones(), 0);
    }

    #[test]
    fn test_estimated_fpp() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        assert_eq!(filter.estimated_fpp(), 0.0);

        filter.insert("foo");
        let expected_fpp = (8f64 / 960f64).powi(8);
        assert!((filter.estimated_fpp() - expected_fpp).abs() < std::f64::EPSILON);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_ser_de() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        filter.insert("foo");

        let serialized_filter = bincode::serialize(&filter).unwrap();
        let de_filter: BloomFilter = bincode::deserialize(&serialized_filter).unwrap();

        assert!(de_filter.contains("foo"));
        assert_eq!(filter, de_filter);
    }
}
