//! Data segments and the bit buffer they are packed into.

use crate::symbol::Version;

/// A run of payload characters encoded in a single mode.
///
/// Segments are immutable once built. [`Segment::from_text`] picks the most
/// compact mode that covers the whole string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    mode: SegmentMode,
    numchars: usize,
    data: Vec<u8>,
    bitlength: usize,
}

impl Segment {
    /// Encodes `text` in numeric mode if it is all digits, alphanumeric mode
    /// if every character is in the 45-character set, and byte mode otherwise.
    pub fn from_text(text: &str) -> Self {
        if Self::is_numeric(text) {
            Self::numeric(text)
        } else if Self::is_alphanumeric(text) {
            Self::alphanumeric(text)
        } else {
            Self::bytes(text.as_bytes())
        }
    }

    /// Creates a byte mode segment holding `data` verbatim.
    pub fn bytes(data: &[u8]) -> Self {
        Self {
            mode: SegmentMode::Byte,
            numchars: data.len(),
            data: data.to_vec(),
            bitlength: data.len() * 8,
        }
    }

    fn numeric(text: &str) -> Self {
        debug_assert!(Self::is_numeric(text));
        let mut bb = BitBuffer::new();
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Self::from_bits(SegmentMode::Numeric, text.len(), bb)
    }

    fn alphanumeric(text: &str) -> Self {
        debug_assert!(Self::is_alphanumeric(text));
        let mut bb = BitBuffer::new();
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET.find(c).unwrap_or_default() as u32;
            accumdata = accumdata * 45 + i;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6);
        }
        Self::from_bits(SegmentMode::Alphanumeric, text.len(), bb)
    }

    fn from_bits(mode: SegmentMode, numchars: usize, bb: BitBuffer) -> Self {
        Self {
            mode,
            numchars,
            bitlength: bb.len(),
            data: bb.into_bytes(),
        }
    }

    /// The mode this segment is encoded in.
    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    /// Number of characters (bytes in byte mode), as written to the count field.
    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Length of the data bits, excluding mode indicator and count field.
    pub fn bit_length(&self) -> usize {
        self.bitlength
    }

    /// Appends mode indicator, character count and data bits to `bb`.
    pub(crate) fn write_to(&self, bb: &mut BitBuffer, version: Version) {
        bb.append_bits(self.mode.mode_bits(), 4);
        bb.append_bits(self.numchars as u32, self.mode.num_char_count_bits(version));
        for i in 0..self.bitlength {
            let bit = (self.data[i >> 3] >> (7 - (i & 7))) & 1;
            bb.append_bits(bit.into(), 1);
        }
    }

    /// Number of bits needed to encode `segs` at `version`, or `None` if a
    /// character count overflows its count field.
    pub(crate) fn total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits = seg.mode.num_char_count_bits(version);
            if seg.numchars >= 1usize << ccbits {
                return None;
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.bitlength)?;
        }
        Some(result)
    }

    /// Tests whether `text` can be encoded in numeric mode.
    pub fn is_numeric(text: &str) -> bool {
        text.bytes().all(|b| b.is_ascii_digit())
    }

    /// Tests whether `text` can be encoded in alphanumeric mode.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl SegmentMode {
    fn mode_bits(self) -> u32 {
        match self {
            SegmentMode::Numeric => 0x1,
            SegmentMode::Alphanumeric => 0x2,
            SegmentMode::Byte => 0x4,
        }
    }

    fn num_char_count_bits(self, ver: Version) -> u8 {
        let widths = match self {
            SegmentMode::Numeric => [10, 12, 14],
            SegmentMode::Alphanumeric => [9, 11, 13],
            SegmentMode::Byte => [8, 16, 16],
        };
        widths[usize::from((ver.value() + 7) / 17)]
    }
}

/// An append-only sequence of bits, packed big-endian into bytes.
#[derive(Clone, Debug, Default)]
pub struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends the low `len` bits of `val`, most significant first.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0, "Value out of range");
        for i in (0..len).rev() {
            let index = self.length >> 3;
            if index == self.data.len() {
                self.data.push(0);
            }
            let bit = ((val >> i) & 1) as u8;
            self.data[index] |= bit << (7 - (self.length & 7));
            self.length += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric() {
        assert!(Segment::is_numeric("1234567890"));
        assert!(!Segment::is_numeric("1234abc"));
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(Segment::is_alphanumeric("HELLO WORLD"));
        assert!(!Segment::is_alphanumeric("Hello World"));
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(Segment::from_text("0123456789").mode(), SegmentMode::Numeric);
        assert_eq!(Segment::from_text("WIFI:S:NET").mode(), SegmentMode::Alphanumeric);
        assert_eq!(Segment::from_text("https://example.com").mode(), SegmentMode::Byte);
    }

    #[test]
    fn test_numeric_packing() {
        // "01234567" packs as 012 345 67 -> 10 + 10 + 7 bits
        let seg = Segment::from_text("01234567");
        assert_eq!(seg.bit_length(), 27);
        assert_eq!(seg.num_chars(), 8);
        // 0000001100 0101011001 1000011
        assert_eq!(seg.data, vec![0x03, 0x15, 0x98, 0x60]);
    }

    #[test]
    fn test_alphanumeric_packing() {
        // "AC-42": pairs (A,C) and (-,4) take 11 bits each, the trailing 2 takes 6
        let seg = Segment::from_text("AC-42");
        assert_eq!(seg.bit_length(), 28);
        // 10*45+12, 41*45+4, then 2
        assert_eq!(seg.data, vec![0x39, 0xDC, 0xE4, 0x20]);
    }

    #[test]
    fn test_write_to_prefixes_header() {
        let mut bb = BitBuffer::new();
        Segment::from_text("01234567").write_to(&mut bb, Version::new(1));
        // Mode 0001, count 0000001000, then the data bits
        assert_eq!(bb.len(), 4 + 10 + 27);
        assert_eq!(bb.into_bytes()[..2], [0x10, 0x20]);
    }

    #[test]
    fn test_bit_buffer_append() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0b1, 1);
        bb.append_bits(0b0100, 4);
        bb.append_bits(0xFF, 8);
        assert_eq!(bb.len(), 13);
        assert_eq!(bb.into_bytes(), vec![0b1010_0111, 0b1111_1000]);
    }

    #[test]
    fn test_total_bits_counts_header() {
        let segs = [Segment::bytes(b"abc")];
        assert_eq!(Segment::total_bits(&segs, Version::new(1)), Some(4 + 8 + 24));
        assert_eq!(Segment::total_bits(&segs, Version::new(10)), Some(4 + 16 + 24));
    }

    #[test]
    fn test_total_bits_rejects_count_overflow() {
        let long = vec![b'a'; 256];
        let segs = [Segment::bytes(&long)];
        assert_eq!(Segment::total_bits(&segs, Version::new(9)), None);
        assert!(Segment::total_bits(&segs, Version::new(10)).is_some());
    }
}
