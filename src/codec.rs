//! Dictionary-based text compression into a Base64-alphabet string.
//!
//! The codec is an incremental-dictionary (LZ78-family) compressor operating
//! over UTF-16 code units. Every substring observed during compression is
//! assigned an integer code; repeated substrings are emitted as codes instead
//! of being repeated. Codes grow in width as the dictionary fills, starting at
//! 2 bits. Three control codes are reserved: 0 announces an 8-bit literal, 1 a
//! 16-bit literal, and 2 marks the end of the stream. Value bits are emitted
//! least-significant-first and packed into 6-bit groups, each mapped through
//! the 64-symbol alphabet `A–Z a–z 0–9 + /`, with `=` padding on the right to
//! a length that is a multiple of 4.
//!
//! The pair is stateless and loss-less: `decompress(&compress(x))` returns
//! `Some(x)` for every string `x`.
//!
//! # Examples
//!
//! ```
//! use portable_bloom::codec;
//!
//! let compressed = codec::compress("hello hello hello");
//! assert_eq!(codec::decompress(&compressed).as_deref(), Some("hello hello hello"));
//! ```

use std::collections::{HashMap, HashSet};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CODE_LITERAL_8: u32 = 0;
const CODE_LITERAL_16: u32 = 1;
const CODE_END_OF_STREAM: u32 = 2;
const FIRST_FREE_CODE: u32 = 3;

const BITS_PER_SYMBOL: u32 = 6;

fn symbol_value(symbol: u8) -> Option<u32> {
    match symbol {
        b'A'..=b'Z' => Some(u32::from(symbol - b'A')),
        b'a'..=b'z' => Some(u32::from(symbol - b'a') + 26),
        b'0'..=b'9' => Some(u32::from(symbol - b'0') + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        // Padding carries no information; it reads back as zero bits.
        b'=' => Some(0),
        _ => None,
    }
}

/// Packs values least-significant-bit-first into 6-bit output symbols.
struct BitWriter {
    output: String,
    group: u32,
    position: u32,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            output: String::new(),
            group: 0,
            position: 0,
        }
    }

    fn push_bit(&mut self, bit: u32) {
        self.group = (self.group << 1) | bit;
        if self.position == BITS_PER_SYMBOL - 1 {
            self.position = 0;
            self.output.push(char::from(ALPHABET[self.group as usize]));
            self.group = 0;
        } else {
            self.position += 1;
        }
    }

    fn write(&mut self, value: u32, width: u32) {
        let mut value = value;
        for _ in 0..width {
            self.push_bit(value & 1);
            value >>= 1;
        }
    }

    /// Flushes the partial group with zero bits and pads to a multiple of 4.
    fn finish(mut self) -> String {
        loop {
            self.group <<= 1;
            if self.position == BITS_PER_SYMBOL - 1 {
                self.output.push(char::from(ALPHABET[self.group as usize]));
                break;
            }
            self.position += 1;
        }
        while self.output.len() % 4 != 0 {
            self.output.push('=');
        }
        self.output
    }
}

/// Reads fixed-width values least-significant-bit-first from 6-bit input
/// symbols.
struct BitReader<'a> {
    input: &'a [u8],
    value: u32,
    mask: u32,
    index: usize,
}

impl<'a> BitReader<'a> {
    fn new(input: &'a [u8]) -> Option<Self> {
        Some(BitReader {
            input,
            value: symbol_value(input[0])?,
            mask: 1 << (BITS_PER_SYMBOL - 1),
            index: 1,
        })
    }

    /// Reads `width` bits, assembling them least-significant-first.
    ///
    /// Returns `None` when an input symbol is outside the alphabet. Reading
    /// past the end of the input yields zero bits; [`exhausted`](Self::exhausted)
    /// reports that condition.
    fn read(&mut self, width: u32) -> Option<u32> {
        let mut bits = 0;
        for position in 0..width {
            let bit = self.value & self.mask;
            self.mask >>= 1;
            if self.mask == 0 {
                self.mask = 1 << (BITS_PER_SYMBOL - 1);
                self.value = match self.input.get(self.index) {
                    Some(&symbol) => symbol_value(symbol)?,
                    None => 0,
                };
                self.index += 1;
            }
            if bit != 0 {
                bits |= 1 << position;
            }
        }
        Some(bits)
    }

    fn exhausted(&self) -> bool {
        self.index > self.input.len()
    }
}

/// Tracks the doubling schedule for the code bit-width.
///
/// The threshold decrements once per emitted symbol and once per dictionary
/// insertion; when it reaches zero the width grows by one bit and the
/// threshold resets to the dictionary capacity at the new width.
struct CodeWidth {
    num_bits: u32,
    enlarge_in: u64,
}

impl CodeWidth {
    fn new(num_bits: u32, enlarge_in: u64) -> Self {
        CodeWidth {
            num_bits,
            enlarge_in,
        }
    }

    fn tick(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.num_bits;
            self.num_bits += 1;
        }
    }
}

struct Compressor {
    dictionary: HashMap<Vec<u16>, u32>,
    pending_literals: HashSet<Vec<u16>>,
    next_code: u32,
    width: CodeWidth,
    writer: BitWriter,
}

impl Compressor {
    fn new() -> Self {
        Compressor {
            dictionary: HashMap::new(),
            pending_literals: HashSet::new(),
            next_code: FIRST_FREE_CODE,
            // The first entry is emitted as a literal and must not count
            // towards the initial width-2 capacity.
            width: CodeWidth::new(2, 2),
            writer: BitWriter::new(),
        }
    }

    fn register(&mut self, word: Vec<u16>) {
        self.dictionary.insert(word, self.next_code);
        self.next_code += 1;
    }

    /// Emits the code for `word`: a tagged literal on first emission, its
    /// dictionary code afterwards.
    fn emit(&mut self, word: &[u16]) {
        if self.pending_literals.remove(word) {
            let code_unit = u32::from(word[0]);
            if code_unit < 256 {
                self.writer.write(CODE_LITERAL_8, self.width.num_bits);
                self.writer.write(code_unit, 8);
            } else {
                self.writer.write(CODE_LITERAL_16, self.width.num_bits);
                self.writer.write(code_unit, 16);
            }
            self.width.tick();
        } else {
            self.writer.write(self.dictionary[word], self.width.num_bits);
        }
        self.width.tick();
    }

    fn finish(mut self) -> String {
        self.writer.write(CODE_END_OF_STREAM, self.width.num_bits);
        self.writer.finish()
    }
}

/// Compresses `input` into a Base64-alphabet string.
///
/// The output uses only the characters `A–Z a–z 0–9 + / =` and is therefore
/// safe to embed anywhere plain text is accepted. Compressing an empty string
/// produces a stream holding only the end marker, which decompresses back to
/// an empty string.
///
/// # Examples
///
/// ```
/// use portable_bloom::codec::compress;
///
/// assert_eq!(compress("0,0,0,0,0,0,0,0"), "AwGl7TyA");
/// assert_eq!(compress(""), "Q===");
/// ```
pub fn compress(input: &str) -> String {
    let mut compressor = Compressor::new();
    let mut word: Vec<u16> = Vec::new();

    for code_unit in input.encode_utf16() {
        if !compressor.dictionary.contains_key(&[code_unit] as &[u16]) {
            compressor.register(vec![code_unit]);
            compressor.pending_literals.insert(vec![code_unit]);
        }

        let mut extended = word.clone();
        extended.push(code_unit);
        if compressor.dictionary.contains_key(&extended) {
            word = extended;
        } else {
            compressor.emit(&word);
            compressor.register(extended);
            word = vec![code_unit];
        }
    }

    if !word.is_empty() {
        compressor.emit(&word);
    }
    compressor.finish()
}

/// Decompresses a string produced by [`compress`].
///
/// Returns `None` for an empty input string and for input that is not a valid
/// stream: symbols outside the alphabet, dictionary references beyond the
/// next free code, or decoded code units that do not form valid UTF-16.
/// Input that ends before the end marker yields `Some("")`.
///
/// # Examples
///
/// ```
/// use portable_bloom::codec::{compress, decompress};
///
/// assert_eq!(decompress(&compress("abcabcabc")).as_deref(), Some("abcabcabc"));
/// assert_eq!(decompress(""), None);
/// ```
pub fn decompress(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }

    let mut reader = BitReader::new(input.as_bytes())?;
    let mut dictionary: Vec<Vec<u16>> = Vec::new();
    // The control codes occupy the first three slots but carry no text.
    dictionary.resize(FIRST_FREE_CODE as usize, Vec::new());
    let mut width = CodeWidth::new(3, 4);

    let first = match reader.read(2)? {
        CODE_LITERAL_8 => reader.read(8)? as u16,
        CODE_LITERAL_16 => reader.read(16)? as u16,
        _ => return Some(String::new()),
    };
    dictionary.push(vec![first]);
    let mut word = vec![first];
    let mut result = vec![first];

    loop {
        if reader.exhausted() {
            return Some(String::new());
        }

        let mut code = reader.read(width.num_bits)? as usize;
        match code as u32 {
            CODE_LITERAL_8 => {
                let code_unit = reader.read(8)? as u16;
                dictionary.push(vec![code_unit]);
                code = dictionary.len() - 1;
                width.enlarge_in -= 1;
            }
            CODE_LITERAL_16 => {
                let code_unit = reader.read(16)? as u16;
                dictionary.push(vec![code_unit]);
                code = dictionary.len() - 1;
                width.enlarge_in -= 1;
            }
            CODE_END_OF_STREAM => return String::from_utf16(&result).ok(),
            _ => {}
        }
        if width.enlarge_in == 0 {
            width.enlarge_in = 1 << width.num_bits;
            width.num_bits += 1;
        }

        let entry = if code >= FIRST_FREE_CODE as usize && code < dictionary.len() {
            dictionary[code].clone()
        } else if code == dictionary.len() {
            // Self-referential case: the code names the entry about to be
            // created, which must start with the previous word.
            let mut entry = word.clone();
            entry.push(word[0]);
            entry
        } else {
            return None;
        };
        result.extend_from_slice(&entry);

        let mut new_entry = word;
        new_entry.push(entry[0]);
        dictionary.push(new_entry);
        width.tick();

        word = entry;
    }
}

#[cfg(test)]
mod tests {
    use super::{compress, decompress};

    fn round_trip(input: &str) {
        assert_eq!(decompress(&compress(input)).as_deref(), Some(input));
    }

    #[test]
    fn test_compress_known_vectors() {
        assert_eq!(compress(""), "Q===");
        assert_eq!(compress("a"), "IZA=");
        assert_eq!(compress("hello hello hello"), "BYUwNmD2AEoTcpA=");
        assert_eq!(compress("0,0,0,0,0,0,0,0"), "AwGl7TyA");
        assert_eq!(compress("abcabcabcabcabcabc"), "IYIwxqHpPkA=");
        assert_eq!(
            compress("196,37,112,116,0,68,0,68,32,70,68,0"),
            "IwTgbANAzA7BzAEz2JADBMAOCHvWRjxzSA==",
        );
        assert_eq!(
            compress("The quick brown fox jumps over the lazy dog"),
            "CoCwpgBAjgrglgYwNYQEYCcD2B3AdhAM0wA8IArGAWwAcBnCTANzHQgBdwIAbAQwC8AnhAAmmAOZA===",
        );
    }

    #[test]
    fn test_output_alphabet() {
        let compressed = compress("The quick brown fox jumps over the lazy dog");
        assert!(compressed
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/' || byte == b'='));
        assert_eq!(compressed.len() % 4, 0);
    }

    #[test]
    fn test_round_trip() {
        round_trip("");
        round_trip("a");
        round_trip("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        round_trip("hello hello hello");
        round_trip("0,0,0,0,0,0,0,0");
        round_trip("196,37,112,116,0,68,0,68,32,70,68,0");
        round_trip("The quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_round_trip_unicode() {
        round_trip("héllo wörld héllo");
        round_trip("こんにちは、世界");
        // Non-BMP code points travel as surrogate pairs.
        round_trip("a\u{1F600}b\u{1F600}");
    }

    #[test]
    fn test_round_trip_dictionary_growth() {
        // Long comma-separated byte lists stress repeated width growth.
        let input = (0..=255u32)
            .map(|byte| byte.to_string())
            .collect::<Vec<_>>()
            .join(",");
        round_trip(&input);

        let repeated = "0,".repeat(4096);
        round_trip(&repeated);
    }

    #[test]
    fn test_decompress_empty_input() {
        assert_eq!(decompress(""), None);
    }

    #[test]
    fn test_decompress_invalid_symbol() {
        assert_eq!(decompress("!!!!"), None);
        assert_eq!(decompress("AwGl\u{00e9}TyA"), None);
    }

    #[test]
    fn test_decompress_truncated_input() {
        let compressed = compress("196,37,112,116,0,68,0,68,32,70,68,0");
        let truncated = &compressed[..8];
        assert_eq!(decompress(truncated).as_deref(), Some(""));
    }
}
