//! QR symbol construction.
//!
//! Turns a payload string into a QR Code Model 2 module matrix: mode and
//! version selection, padding, Reed–Solomon error correction with block
//! interleaving, function pattern layout, and penalty-driven mask selection.

use core::fmt;
use core::str::FromStr;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{EncodingError, ValidationError};
use crate::segment::{BitBuffer, Segment};

/// Encodes `payload` at error correction level `ec_level` using the smallest
/// version that fits.
///
/// # Arguments
///
/// * `payload` - The text to encode. Numeric or alphanumeric mode is used
///   when every character allows it, byte mode otherwise.
/// * `ec_level` - Error correction level. It is never raised automatically.
///
/// # Returns
///
/// The symbol, or an [`EncodingError`] if the payload is empty or too long
/// for version 40 at this level.
///
/// # Example
///
/// ```rust
/// use qrcraft::symbol::{build, EcLevel};
///
/// let symbol = build("https://example.com", EcLevel::Medium).unwrap();
/// assert_eq!(symbol.version().value(), 2);
/// assert_eq!(symbol.size(), 25);
/// ```
pub fn build(payload: &str, ec_level: EcLevel) -> Result<Symbol, EncodingError> {
    SymbolBuilder::new(ec_level).build(payload)
}

/// A QR Code symbol: a square grid of dark and light modules.
///
/// Immutable once built. Two symbols compare equal when every module and the
/// recorded parameters match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    /// Width and height in modules, between 21 and 177. Equal to version * 4 + 17.
    size: i32,
    version: Version,
    ec_level: EcLevel,
    mask: Mask,
    /// Row-major, `true` is dark.
    modules: Vec<bool>,
    /// Marks finder, timing, alignment, format and version modules, which masking skips.
    isfunction: Vec<bool>,
}

impl Symbol {
    /// Returns this symbol's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this symbol's size in modules, in the range [21, 177].
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Returns the error correction level the symbol was built with.
    pub fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    /// Returns the mask pattern applied to the data modules.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns `true` for a dark module. Coordinates outside the symbol read
    /// as light, so callers can draw a quiet zone by iterating past the edges.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size;
        range.contains(&x) && range.contains(&y) && self.modules[self.index(x, y)]
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.size + x) as usize
    }

    fn blank(version: Version, ec_level: EcLevel) -> Self {
        let size = version.size();
        let len = (size * size) as usize;
        Self {
            size,
            version,
            ec_level,
            mask: Mask::new(0),
            modules: vec![false; len],
            isfunction: vec![false; len],
        }
    }

    fn set_function_module(&mut self, x: i32, y: i32, isdark: bool) {
        let index = self.index(x, y);
        self.modules[index] = isdark;
        self.isfunction[index] = true;
    }

    fn draw_function_patterns(&mut self) {
        let size = self.size;
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Skip the three alignment positions that collide with finder patterns
        let alignpatpos = self.alignment_pattern_positions();
        let last = alignpatpos.len().saturating_sub(1);
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !corner {
                    self.draw_alignment_pattern(pos0, pos1);
                }
            }
        }

        // Reserve the format area; real bits are drawn once the mask is known
        self.draw_format_bits(Mask::new(0));
        self.draw_version();
    }

    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4..=4 {
            for dx in -4..=4 {
                let xx = x + dx;
                let yy = y + dy;
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let dist = dx.abs().max(dy.abs());
                    self.set_function_module(xx, yy, dist != 2 && dist != 4);
                }
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2..=2 {
            for dx in -2..=2 {
                self.set_function_module(x + dx, y + dy, dx.abs().max(dy.abs()) != 1);
            }
        }
    }

    fn draw_format_bits(&mut self, mask: Mask) {
        let bits: u32 = {
            let data = u32::from((self.ec_level.format_bits() << 3) | mask.value());
            let mut rem: u32 = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            ((data << 10) | rem) ^ 0x5412
        };

        // First copy, around the top left finder
        for i in 0..6 {
            self.set_function_module(8, i, get_bit(bits, i));
        }
        self.set_function_module(8, 7, get_bit(bits, 6));
        self.set_function_module(8, 8, get_bit(bits, 7));
        self.set_function_module(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set_function_module(14 - i, 8, get_bit(bits, i));
        }

        // Second copy, split between the other two finders
        let size = self.size;
        for i in 0..8 {
            self.set_function_module(size - 1 - i, 8, get_bit(bits, i));
        }
        for i in 8..15 {
            self.set_function_module(8, size - 15 + i, get_bit(bits, i));
        }
        self.set_function_module(8, size - 8, true);
    }

    fn draw_version(&mut self) {
        if self.version.value() < 7 {
            return;
        }
        let ver = u32::from(self.version.value());
        let bits: u32 = {
            let mut rem: u32 = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
            }
            (ver << 12) | rem
        };
        for i in 0..18 {
            let bit = get_bit(bits, i);
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    /// Ascending center coordinates of alignment patterns, shared by both axes.
    fn alignment_pattern_positions(&self) -> Vec<i32> {
        let ver = i32::from(self.version.value());
        if ver == 1 {
            return Vec::new();
        }
        let numalign = ver / 7 + 2;
        let step = if ver == 32 {
            26
        } else {
            ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
        };
        let mut result: Vec<i32> = (0..numalign - 1).map(|i| self.size - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }

    /// Places codeword bits in the two-column zigzag, skipping function modules.
    fn draw_codewords(&mut self, data: &[u8]) {
        debug_assert_eq!(data.len(), num_raw_data_modules(self.version) / 8);
        let size = self.size;
        let mut i: usize = 0;
        let mut right = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                for j in 0..2 {
                    let x = right - j;
                    let y = if upward { size - 1 - vert } else { vert };
                    let index = self.index(x, y);
                    if !self.isfunction[index] && i < data.len() * 8 {
                        self.modules[index] = get_bit(u32::from(data[i >> 3]), 7 - (i & 7) as i32);
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, data.len() * 8);
    }

    /// XORs the mask pattern over data modules. Applying the same mask twice undoes it.
    fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let index = self.index(x, y);
                if self.isfunction[index] {
                    continue;
                }
                let invert = match mask.value() {
                    0 => (x + y) % 2 == 0,
                    1 => y % 2 == 0,
                    2 => x % 3 == 0,
                    3 => (x + y) % 3 == 0,
                    4 => (x / 3 + y / 2) % 2 == 0,
                    5 => ((x * y) % 2) + ((x * y) % 3) == 0,
                    6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
                    7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
                    _ => unreachable!(),
                };
                self.modules[index] ^= invert;
            }
        }
    }

    fn get_penalty_score(&self) -> i32 {
        let mut result: i32 = 0;
        let size = self.size;

        // Adjacent modules in row having same color, and finder-like patterns
        for y in 0..size {
            let mut runcolor = false;
            let mut runx: i32 = 0;
            let mut runhistory = FinderPenalty::new(size);
            for x in 0..size {
                if self.get_module(x, y) == runcolor {
                    runx += 1;
                    if runx == 5 {
                        result += PENALTY_N1;
                    } else if runx > 5 {
                        result += 1;
                    }
                } else {
                    runhistory.add_history(runx);
                    if !runcolor {
                        result += runhistory.count_patterns() * PENALTY_N3;
                    }
                    runcolor = self.get_module(x, y);
                    runx = 1;
                }
            }
            result += runhistory.terminate_and_count(runcolor, runx) * PENALTY_N3;
        }

        // Same, by column
        for x in 0..size {
            let mut runcolor = false;
            let mut runy: i32 = 0;
            let mut runhistory = FinderPenalty::new(size);
            for y in 0..size {
                if self.get_module(x, y) == runcolor {
                    runy += 1;
                    if runy == 5 {
                        result += PENALTY_N1;
                    } else if runy > 5 {
                        result += 1;
                    }
                } else {
                    runhistory.add_history(runy);
                    if !runcolor {
                        result += runhistory.count_patterns() * PENALTY_N3;
                    }
                    runcolor = self.get_module(x, y);
                    runy = 1;
                }
            }
            result += runhistory.terminate_and_count(runcolor, runy) * PENALTY_N3;
        }

        // 2*2 blocks of one color
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.get_module(x, y);
                if color == self.get_module(x + 1, y)
                    && color == self.get_module(x, y + 1)
                    && color == self.get_module(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Balance of dark and light modules
        let dark = self.modules.iter().filter(|&&m| m).count() as i32;
        let total = size * size;
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k * PENALTY_N4;
        result
    }
}

/// Options for turning segments into a [`Symbol`].
///
/// The defaults search every version from 1 to 40, choose the mask
/// automatically and keep the requested error correction level.
#[derive(Clone, Debug)]
pub struct SymbolBuilder {
    ec_level: EcLevel,
    min_version: Version,
    max_version: Version,
    mask: Option<Mask>,
    boost_ec: bool,
}

impl SymbolBuilder {
    /// Starts a builder for `ec_level` with every version allowed,
    /// automatic mask selection and no error correction boost.
    pub fn new(ec_level: EcLevel) -> Self {
        Self {
            ec_level,
            min_version: Version::MIN,
            max_version: Version::MAX,
            mask: None,
            boost_ec: false,
        }
    }

    /// Restricts the versions considered.
    ///
    /// # Panics
    ///
    /// Panics if `min` is greater than `max`.
    pub fn version_range(mut self, min: Version, max: Version) -> Self {
        assert!(min <= max, "Invalid version range");
        self.min_version = min;
        self.max_version = max;
        self
    }

    /// Forces a mask pattern instead of picking the lowest-penalty one.
    pub fn mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Raises the error correction level as far as possible without growing the version.
    pub fn boost_ec(mut self, boost: bool) -> Self {
        self.boost_ec = boost;
        self
    }

    /// Encodes `payload` as a single segment in its most compact mode.
    ///
    /// # Arguments
    ///
    /// * `payload` - The text to encode.
    ///
    /// # Returns
    ///
    /// The symbol, or [`EncodingError::EmptyPayload`] for an empty string and
    /// [`EncodingError::DataOverCapacity`] when no allowed version holds it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrcraft::symbol::{EcLevel, Mask, SymbolBuilder, Version};
    ///
    /// let symbol = SymbolBuilder::new(EcLevel::Quartile)
    ///     .version_range(Version::new(5), Version::MAX)
    ///     .mask(Mask::new(3))
    ///     .build("HELLO WORLD")
    ///     .unwrap();
    /// assert_eq!(symbol.version(), Version::new(5));
    /// assert_eq!(symbol.mask(), Mask::new(3));
    /// ```
    pub fn build(&self, payload: &str) -> Result<Symbol, EncodingError> {
        if payload.is_empty() {
            return Err(EncodingError::EmptyPayload);
        }
        let seg = Segment::from_text(payload);
        debug!("encoding {} chars in {:?} mode", seg.num_chars(), seg.mode());
        self.build_segments(&[seg])
    }

    /// Encodes pre-built segments in order.
    ///
    /// # Arguments
    ///
    /// * `segs` - Segments to concatenate. At least one must be non-empty.
    ///
    /// # Returns
    ///
    /// The symbol, or an [`EncodingError`]. [`EncodingError::SegmentTooLong`]
    /// means a segment's character count overflows its count field in every
    /// allowed version.
    pub fn build_segments(&self, segs: &[Segment]) -> Result<Symbol, EncodingError> {
        if segs.iter().all(|s| s.num_chars() == 0) {
            return Err(EncodingError::EmptyPayload);
        }
        let mut ecl = self.ec_level;

        // Find the minimal version number to use
        let mut version = self.min_version;
        let datausedbits: usize = loop {
            let datacapacitybits = num_data_codewords(version, ecl) * 8;
            let dataused = Segment::total_bits(segs, version);
            if let Some(n) = dataused.filter(|&n| n <= datacapacitybits) {
                break n;
            }
            if version >= self.max_version {
                return Err(match dataused {
                    None => EncodingError::SegmentTooLong,
                    Some(n) => EncodingError::DataOverCapacity {
                        used_bits: n,
                        capacity_bits: datacapacitybits,
                        ec_level: ecl,
                    },
                });
            }
            version = Version::new(version.value() + 1);
        };

        if self.boost_ec {
            for newecl in [EcLevel::Medium, EcLevel::Quartile, EcLevel::High] {
                if newecl > ecl && datausedbits <= num_data_codewords(version, newecl) * 8 {
                    ecl = newecl;
                }
            }
        }
        debug!("selected version {} at level {:?}", version.value(), ecl);

        // Concatenate all segments to create the data bit string
        let datacapacitybits = num_data_codewords(version, ecl) * 8;
        let mut bb = BitBuffer::new();
        for seg in segs {
            seg.write_to(&mut bb, version);
        }
        debug_assert_eq!(bb.len(), datausedbits);

        // Add terminator and pad up to a byte if applicable
        let numzerobits = core::cmp::min(4, datacapacitybits - bb.len());
        bb.append_bits(0, numzerobits as u8);
        let numzerobits = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);
        debug_assert_eq!(bb.len() % 8, 0);

        // Pad with alternating bytes until data capacity is reached
        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.len() >= datacapacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }

        let datacodewords = bb.into_bytes();
        Ok(encode_codewords(&datacodewords, version, ecl, self.mask))
    }
}

/// Draws a finished symbol from padded data codewords.
fn encode_codewords(data: &[u8], version: Version, ecl: EcLevel, mask: Option<Mask>) -> Symbol {
    let allcodewords = add_ecc_and_interleave(data, version, ecl);

    let mut result = Symbol::blank(version, ecl);
    result.draw_function_patterns();
    result.draw_codewords(&allcodewords);

    let mask = match mask {
        Some(mask) => mask,
        None => {
            let mut best = Mask::new(0);
            let mut minpenalty = i32::MAX;
            for i in 0u8..8 {
                let candidate = Mask::new(i);
                result.apply_mask(candidate);
                result.draw_format_bits(candidate);
                let penalty = result.get_penalty_score();
                trace!("mask {} penalty {}", i, penalty);
                if penalty < minpenalty {
                    best = candidate;
                    minpenalty = penalty;
                }
                result.apply_mask(candidate);
            }
            best
        }
    };
    debug!("applying mask {}", mask.value());
    result.mask = mask;
    result.apply_mask(mask);
    result.draw_format_bits(mask);
    result
}

/// Splits data into blocks, appends each block's ECC, and interleaves the result.
fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: EcLevel) -> Vec<u8> {
    assert_eq!(data.len(), num_data_codewords(ver, ecl));
    let numblocks = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
    let blockecclen = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
    let rawcodewords = num_raw_data_modules(ver) / 8;
    let numshortblocks = numblocks - rawcodewords % numblocks;
    let shortblocklen = rawcodewords / numblocks;

    let rs = ReedSolomonGenerator::new(blockecclen);
    let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(numblocks);
    let mut k = 0;
    for i in 0..numblocks {
        let datlen = shortblocklen - blockecclen + usize::from(i >= numshortblocks);
        let mut block = data[k..k + datlen].to_vec();
        k += datlen;
        let ecc = rs.compute_remainder(&block);
        // Short blocks get a placeholder so every block has the same length
        if i < numshortblocks {
            block.push(0);
        }
        block.extend_from_slice(&ecc);
        blocks.push(block);
    }

    let mut result = Vec::with_capacity(rawcodewords);
    for i in 0..=shortblocklen {
        for (j, block) in blocks.iter().enumerate() {
            if i != shortblocklen - blockecclen || j >= numshortblocks {
                result.push(block[i]);
            }
        }
    }
    debug_assert_eq!(result.len(), rawcodewords);
    result
}

/// Number of modules available for data and ECC codewords, including remainder bits.
fn num_raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result: usize = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign: usize = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

fn num_data_codewords(ver: Version, ecl: EcLevel) -> usize {
    num_raw_data_modules(ver) / 8
        - table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl) * table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: EcLevel) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

struct ReedSolomonGenerator {
    /// Generator polynomial coefficients, highest power first, leading 1 omitted.
    divisor: Vec<u8>,
}

impl ReedSolomonGenerator {
    fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Degree out of range");
        let mut divisor = vec![0u8; degree];
        divisor[degree - 1] = 1;
        // Multiply by (x - r^0)(x - r^1)...(x - r^{degree-1}), r = 0x02
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Self::multiply(divisor[j], root);
                if j + 1 < divisor.len() {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Self::multiply(root, 0x02);
        }
        Self { divisor }
    }

    fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.divisor.len()];
        for b in data {
            let factor = b ^ result[0];
            result.remove(0);
            result.push(0);
            for (x, &y) in result.iter_mut().zip(self.divisor.iter()) {
                *x ^= Self::multiply(y, factor);
            }
        }
        result
    }

    /// Product in GF(2^8) modulo x^8 + x^4 + x^3 + x^2 + 1.
    fn multiply(x: u8, y: u8) -> u8 {
        let mut z: u8 = 0;
        for i in (0..8).rev() {
            z = (z << 1) ^ ((z >> 7) * 0x1d);
            z ^= ((y >> i) & 1) * x;
        }
        z
    }
}

/// Run-length history for detecting 1:1:3:1:1 finder-like patterns.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size;
        }
        let len = self.run_history.len();
        self.run_history.copy_within(0..len - 1, 1);
        self.run_history[0] = currentrunlength;
    }

    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n) + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Error correction level of a QR symbol.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub enum EcLevel {
    /// Tolerates ~7% erroneous codewords.
    #[serde(rename = "L")]
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[default]
    #[serde(rename = "M")]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    #[serde(rename = "Q")]
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    #[serde(rename = "H")]
    High,
}

impl EcLevel {
    pub const ALL: [EcLevel; 4] = [EcLevel::Low, EcLevel::Medium, EcLevel::Quartile, EcLevel::High];

    fn ordinal(self) -> usize {
        match self {
            EcLevel::Low => 0,
            EcLevel::Medium => 1,
            EcLevel::Quartile => 2,
            EcLevel::High => 3,
        }
    }

    /// The 2-bit value written into the format information.
    fn format_bits(self) -> u8 {
        match self {
            EcLevel::Low => 1,
            EcLevel::Medium => 0,
            EcLevel::Quartile => 3,
            EcLevel::High => 2,
        }
    }

    pub fn letter(self) -> char {
        match self {
            EcLevel::Low => 'L',
            EcLevel::Medium => 'M',
            EcLevel::Quartile => 'Q',
            EcLevel::High => 'H',
        }
    }

    /// Approximate share of damaged codewords that can be recovered.
    pub fn recovery_percent(self) -> u8 {
        match self {
            EcLevel::Low => 7,
            EcLevel::Medium => 15,
            EcLevel::Quartile => 25,
            EcLevel::High => 30,
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for EcLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LOW" => Ok(EcLevel::Low),
            "M" | "MEDIUM" => Ok(EcLevel::Medium),
            "Q" | "QUARTILE" => Ok(EcLevel::Quartile),
            "H" | "HIGH" => Ok(EcLevel::High),
            _ => Err(ValidationError::UnknownEcLevel(s.to_string())),
        }
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules.
    pub const fn size(self) -> i32 {
        self.0 as i32 * 4 + 17
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }
}

fn get_bit(x: u32, i: i32) -> bool {
    ((x >> i) & 1) != 0
}
