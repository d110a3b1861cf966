//! Non-cryptographic string hashes and the round derivation used by the
//! filter.
//!
//! Both hashes operate on the UTF-16 code units of the input and wrap at 32
//! bits, so the values match implementations that hash JavaScript-style
//! character codes. Neither is collision resistant; colliding inputs simply
//! surface as false positives in the filter.

/// Classic multiplicative string hash with seed 5381.
///
/// Each code unit updates the state as `hash = hash * 33 XOR code` with 32-bit
/// unsigned wraparound.
///
/// # Examples
///
/// ```
/// use portable_bloom::hash::djb2;
///
/// assert_eq!(djb2("alpha"), 169_960_529);
/// assert_eq!(djb2(""), 5381);
/// ```
pub fn djb2(item: &str) -> u32 {
    let mut hash: u32 = 5381;
    for code in item.encode_utf16() {
        hash = hash.wrapping_mul(33) ^ u32::from(code);
    }
    hash
}

/// The `sdbm` string hash with seed 0.
///
/// Each code unit updates the state as
/// `hash = code + (hash << 6) + (hash << 16) - hash` with 32-bit unsigned
/// wraparound.
///
/// # Examples
///
/// ```
/// use portable_bloom::hash::sdbm;
///
/// assert_eq!(sdbm("alpha"), 2_499_736_158);
/// assert_eq!(sdbm(""), 0);
/// ```
pub fn sdbm(item: &str) -> u32 {
    let mut hash: u32 = 0;
    for code in item.encode_utf16() {
        hash = u32::from(code)
            .wrapping_add(hash << 6)
            .wrapping_add(hash << 16)
            .wrapping_sub(hash);
    }
    hash
}

/// The two base hash values of an item, reduced modulo the filter's bit
/// count, from which all round hashes are derived.
#[derive(Clone, Copy, Debug)]
pub struct DoubleHash {
    h1: u64,
    h2: u64,
    bit_count: u64,
}

impl DoubleHash {
    /// Hashes `item` with [`djb2`] and [`sdbm`], reducing both values modulo
    /// `bit_count`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::hash::DoubleHash;
    ///
    /// let hash = DoubleHash::new("alpha", 9592);
    /// let rounds = hash.rounds().take(8).collect::<Vec<u64>>();
    /// assert!(rounds.iter().all(|&round| round < 9592));
    /// ```
    pub fn new(item: &str, bit_count: u64) -> Self {
        DoubleHash {
            h1: u64::from(djb2(item)) % bit_count,
            h2: u64::from(sdbm(item)) % bit_count,
            bit_count,
        }
    }

    /// Returns an infinite iterator of derived round hashes.
    ///
    /// Round 0 yields the `djb2` value and round 1 the `sdbm` value. Every
    /// later round `r` yields `(h1 + r * h2 + (r XOR 2)) mod bit_count`, an
    /// enhanced double hashing scheme that decorrelates bit positions across
    /// rounds without requiring more than two base hashes.
    pub fn rounds(self) -> RoundHashes {
        RoundHashes {
            hash: self,
            round: 0,
        }
    }
}

/// An iterator of round hashes derived from a [`DoubleHash`].
#[derive(Clone, Copy)]
pub struct RoundHashes {
    hash: DoubleHash,
    round: u64,
}

impl Iterator for RoundHashes {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let DoubleHash { h1, h2, bit_count } = self.hash;
        let round = self.round;
        self.round += 1;
        let ret = match round {
            0 => h1,
            1 => h2,
            round => (h1 + round * h2 + (round ^ 2)) % bit_count,
        };
        Some(ret)
    }
}
