//! Fixed-length list of bits backed by bytes.

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::ops::{Index, Range};

/// A fixed-length list of bits implemented using a `Vec<u8>`.
///
/// Bits are indexed most-significant-first within each byte: index 0 is the
/// high bit of the first byte. The byte representation produced by
/// [`to_bytes`](BitVec::to_bytes) is exactly the stored blocks, so a vector
/// built with [`from_bytes`](BitVec::from_bytes) round-trips untouched. This
/// makes the type suitable as the backing store of a wire format that is
/// defined in terms of byte values.
///
/// # Examples
///
/// ```
/// use portable_bloom::bit_vec::BitVec;
///
/// let mut bv = BitVec::new(8);
///
/// bv.set(0, true);
/// bv.set(1, true);
/// bv.set(3, true);
///
/// assert_eq!(bv.to_bytes(), vec![0b1101_0000]);
/// assert_eq!(bv.count_ones(), 3);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct BitVec {
    blocks: Vec<u8>,
    len: usize,
    one_count: usize,
}

const BLOCK_BIT_COUNT: usize = 8;

impl BitVec {
    fn get_block_count(len: usize) -> usize {
        (len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    fn bit_mask(index: usize) -> u8 {
        1 << (BLOCK_BIT_COUNT - 1 - index % BLOCK_BIT_COUNT)
    }

    fn clear_extra_bits(&mut self) {
        let extra_bits = self.len % BLOCK_BIT_COUNT;
        if extra_bits > 0 {
            let mask = !(0xFF >> extra_bits);
            let blocks_len = self.blocks.len();
            let block = &mut self.blocks[blocks_len - 1];
            *block &= mask;
        }
    }

    /// Constructs a new `BitVec` with a certain number of bits. All bits are
    /// initialized to `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let bv = BitVec::new(16);
    /// assert_eq!(bv.len(), 16);
    /// assert_eq!(bv.count_ones(), 0);
    /// ```
    pub fn new(len: usize) -> Self {
        BitVec {
            blocks: vec![0; Self::get_block_count(len)],
            len,
            one_count: 0,
        }
    }

    /// Constructs a `BitVec` from a byte slice. Each byte becomes eight bits,
    /// with the most significant bit of each byte coming first.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let bv = BitVec::from_bytes(&[0b1101_0000]);
    /// assert_eq!(
    ///     bv.iter().collect::<Vec<bool>>(),
    ///     vec![true, true, false, true, false, false, false, false],
    /// );
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Self {
        BitVec {
            blocks: bytes.to_vec(),
            len: bytes.len() * BLOCK_BIT_COUNT,
            one_count: bytes.iter().map(|byte| byte.count_ones() as usize).sum(),
        }
    }

    /// Returns the byte representation of the `BitVec`, the first bit becoming
    /// the high-order bit of the first byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let bv = BitVec::from_bytes(&[0b1101_0000, 0b0000_0001]);
    /// assert_eq!(bv.to_bytes(), vec![0b1101_0000, 0b0000_0001]);
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        self.blocks.clone()
    }

    /// Sets the value at index `index` to `bit`.
    ///
    /// # Panics
    ///
    /// Panics if attempting to set an index out-of-bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let mut bv = BitVec::new(8);
    /// bv.set(1, true);
    ///
    /// assert_eq!(bv.get(0), Some(false));
    /// assert_eq!(bv.get(1), Some(true));
    /// ```
    pub fn set(&mut self, index: usize, bit: bool) {
        assert!(index < self.len);
        let block_index = index / BLOCK_BIT_COUNT;
        let mask = Self::bit_mask(index);
        let prev = self.blocks[block_index] & mask != 0;
        if bit {
            if !prev {
                self.one_count += 1;
            }
            self.blocks[block_index] |= mask;
        } else {
            if prev {
                self.one_count -= 1;
            }
            self.blocks[block_index] &= !mask;
        }
    }

    /// Returns the value at index `index`, or `None` if the index is out of
    /// bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let mut bv = BitVec::new(8);
    /// bv.set(1, true);
    ///
    /// assert_eq!(bv.get(1), Some(true));
    /// assert_eq!(bv.get(8), None);
    /// ```
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            None
        } else {
            self.blocks
                .get(index / BLOCK_BIT_COUNT)
                .map(|block| block & Self::bit_mask(index) != 0)
        }
    }

    /// Sets all values in the `BitVec` to `bit`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let mut bv = BitVec::from_bytes(&[0b1101_0000]);
    /// bv.set_all(false);
    ///
    /// assert_eq!(bv.count_ones(), 0);
    /// ```
    pub fn set_all(&mut self, bit: bool) {
        let mask = if bit { !0 } else { 0 };
        self.one_count = if bit { self.len } else { 0 };
        for block in &mut self.blocks {
            *block = mask;
        }
        self.clear_extra_bits();
    }

    /// Returns an iterator over the bits of the vector in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let bv = BitVec::from_bytes(&[0b1000_0001]);
    /// let bits = bv.iter().collect::<Vec<bool>>();
    ///
    /// assert!(bits[0]);
    /// assert!(bits[7]);
    /// ```
    pub fn iter(&self) -> BitVecIter<'_> {
        BitVecIter {
            bit_vec: self,
            range: 0..self.len,
        }
    }

    /// Returns `true` if the `BitVec` holds no bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// assert!(BitVec::new(0).is_empty());
    /// assert!(!BitVec::new(8).is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bits in the `BitVec`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// assert_eq!(BitVec::from_bytes(&[0, 0]).len(), 16);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of set bits in the `BitVec`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let bv = BitVec::from_bytes(&[0b1101_0000]);
    /// assert_eq!(bv.count_ones(), 3);
    /// ```
    pub fn count_ones(&self) -> usize {
        self.one_count
    }

    /// Returns the number of unset bits in the `BitVec`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portable_bloom::bit_vec::BitVec;
    ///
    /// let bv = BitVec::from_bytes(&[0b1101_0000]);
    /// assert_eq!(bv.count_zeros(), 5);
    /// ```
    pub fn count_zeros(&self) -> usize {
        self.len - self.one_count
    }
}

/// An iterator over the bits of a `BitVec`.
///
/// This iterator yields bits in order.
pub struct BitVecIter<'a> {
    bit_vec: &'a BitVec,
    range: Range<usize>,
}

impl<'a> Iterator for BitVecIter<'a> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let bit_vec = self.bit_vec;
        self.range.next().map(|index| bit_vec[index])
    }
}

impl<'a> IntoIterator for &'a BitVec {
    type IntoIter = BitVecIter<'a>;
    type Item = bool;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

static TRUE: bool = true;
static FALSE: bool = false;

impl Index<usize> for BitVec {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        if self.get(index).expect("Error: index out of bounds.") {
            &TRUE
        } else {
            &FALSE
        }
    }
}
