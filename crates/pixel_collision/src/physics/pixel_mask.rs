//! Bit-addressable 2D shapes for per-pixel collision tests
//!
//! A [`PixelMask`] stores one bit per pixel, row-major (`y * width + x`).
//! Explicit bit access is bounds-checked and fails loudly; intersection
//! queries treat anything outside the mask as empty space.

use crate::foundation::math::PixelRect;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Pixel mask errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    /// Explicit bit access outside the mask
    #[error("bit ({x}, {y}) is outside the {width}x{height} mask")]
    OutOfBounds {
        /// Requested column
        x: i32,
        /// Requested row
        y: i32,
        /// Mask width
        width: u32,
        /// Mask height
        height: u32,
    },

    /// Persisted bit string doesn't match the declared size
    #[error("bit string has {actual} bits, expected {expected}")]
    BitStringLength {
        /// width * height
        expected: usize,
        /// Characters found
        actual: usize,
    },

    /// Persisted bit string contains something other than `0`/`1`
    #[error("invalid character {found:?} at bit {index}")]
    BitStringChar {
        /// Position in the string
        index: usize,
        /// Offending character
        found: char,
    },
}

/// Fixed-size bitset backing masks and scratch regions
#[derive(Debug, Clone, PartialEq, Eq)]
struct BitRegion {
    words: Vec<u64>,
}

impl BitRegion {
    fn new(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(64)] }
    }

    #[inline]
    fn set(&mut self, idx: usize) {
        self.words[idx >> 6] |= 1u64 << (idx & 63);
    }

    #[inline]
    fn get(&self, idx: usize) -> bool {
        self.words[idx >> 6] & (1u64 << (idx & 63)) != 0
    }

    fn clear(&mut self) {
        self.words.fill(0);
    }

    fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Any bit set both here and in `window`, whose first word lines up
    /// with word `first` of this region
    fn any_common(&self, window: &BitRegion, first: usize) -> bool {
        self.words[first..]
            .iter()
            .zip(&window.words)
            .any(|(a, b)| a & b != 0)
    }
}

/// Row-major bitmap shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MaskRecord", into = "MaskRecord")]
pub struct PixelMask {
    width: u32,
    height: u32,
    bits: BitRegion,
}

/// Common bits of two overlapping masks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskRegion {
    /// Overlap rectangle in the first mask's pixel coordinates
    pub rect: PixelRect,
    /// Bits set in both masks, local to `rect`
    pub bits: PixelMask,
}

impl PixelMask {
    /// Create an empty mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: BitRegion::new(width as usize * height as usize),
        }
    }

    /// Create a mask with every bit set
    pub fn filled(width: u32, height: u32) -> Self {
        let mut mask = Self::new(width, height);
        mask.set_region(mask.bounds());
        mask
    }

    /// Create a mask whose bit `(x, y)` is `f(x, y)`
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.bits.set(y as usize * width as usize + x as usize);
                }
            }
        }
        mask
    }

    /// Parse a row-major string of `0`/`1` characters
    pub fn from_bit_string(width: u32, height: u32, bits: &str) -> Result<Self, MaskError> {
        let expected = width as usize * height as usize;
        let actual = bits.chars().count();
        if actual != expected {
            return Err(MaskError::BitStringLength { expected, actual });
        }

        let mut mask = Self::new(width, height);
        for (index, c) in bits.chars().enumerate() {
            match c {
                '1' => mask.bits.set(index),
                '0' => {}
                found => return Err(MaskError::BitStringChar { index, found }),
            }
        }
        Ok(mask)
    }

    /// Row-major `0`/`1` representation
    pub fn to_bit_string(&self) -> String {
        (0..self.len())
            .map(|idx| if self.bits.get(idx) { '1' } else { '0' })
            .collect()
    }

    /// Mask width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The mask's own extent, anchored at the origin
    pub const fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Number of set bits
    pub fn count_set(&self) -> usize {
        self.bits.count_ones()
    }

    fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    fn checked_index(&self, x: i32, y: i32) -> Result<usize, MaskError> {
        self.index(x, y).ok_or(MaskError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    /// Words of the backing bitset touched by the rows of `rect`
    fn word_span(&self, rect: &PixelRect) -> RangeInclusive<usize> {
        let w = self.width as usize;
        let first = rect.y as usize * w + rect.x as usize;
        let last = (rect.bottom() - 1) as usize * w + (rect.right() - 1) as usize;
        (first >> 6)..=(last >> 6)
    }

    /// Empty scratch covering only the words of `rect`, plus the index of
    /// its first word in the backing bitset
    fn scratch_for(&self, rect: &PixelRect) -> (BitRegion, usize) {
        let span = self.word_span(rect);
        let first = *span.start();
        (BitRegion::new((span.end() - first + 1) << 6), first)
    }

    /// Set a single bit
    pub fn set_bit(&mut self, x: i32, y: i32) -> Result<(), MaskError> {
        let idx = self.checked_index(x, y)?;
        self.bits.set(idx);
        Ok(())
    }

    /// Read a single bit
    pub fn get_bit(&self, x: i32, y: i32) -> Result<bool, MaskError> {
        Ok(self.bits.get(self.checked_index(x, y)?))
    }

    /// Set every bit of `rect` that lies inside the mask
    pub fn set_region(&mut self, rect: PixelRect) {
        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return;
        };
        let w = self.width as usize;
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.bits.set(y as usize * w + x as usize);
            }
        }
    }

    /// Reset every bit
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Is the pixel at `(x, y)` solid? Out-of-bounds pixels never are.
    pub fn intersects_point(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|idx| self.bits.get(idx))
    }

    /// Does any solid pixel fall inside `rect` (mask-local coordinates)?
    ///
    /// With `corner_check` only the four corner pixels of `rect` are tested.
    /// That is cheaper but misses shapes that cross the rectangle without
    /// reaching its corners.
    pub fn intersects_rect(&self, rect: PixelRect, corner_check: bool) -> bool {
        if rect.is_empty() {
            return false;
        }
        if corner_check {
            return rect.corners().iter().any(|&(x, y)| self.intersects_point(x, y));
        }

        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return false;
        };
        let (mut scratch, first) = self.scratch_for(&clipped);
        let base = first << 6;
        let w = self.width as usize;
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                scratch.set(y as usize * w + x as usize - base);
            }
        }
        self.bits.any_common(&scratch, first)
    }

    /// Does `other`, placed at `(offset_x, offset_y)` in this mask's
    /// coordinates, share a solid pixel with this mask?
    pub fn intersects_mask(&self, offset_x: i32, offset_y: i32, other: &PixelMask) -> bool {
        let placed = PixelRect::new(offset_x, offset_y, other.width as i32, other.height as i32);
        let Some(overlap) = placed.intersection(&self.bounds()) else {
            return false;
        };

        // Remap the other mask's bits into our index space, overlap only.
        let (mut scratch, first) = self.scratch_for(&overlap);
        let base = first << 6;
        let w = self.width as usize;
        for y in overlap.y..overlap.bottom() {
            for x in overlap.x..overlap.right() {
                if other.intersects_point(x - offset_x, y - offset_y) {
                    scratch.set(y as usize * w + x as usize - base);
                }
            }
        }
        self.bits.any_common(&scratch, first)
    }

    /// Overlap rectangle and common bits of this mask and `other` placed at
    /// the offset; `None` when no pixel is shared
    pub fn intersection_region(
        &self,
        offset_x: i32,
        offset_y: i32,
        other: &PixelMask,
    ) -> Option<MaskRegion> {
        let placed = PixelRect::new(offset_x, offset_y, other.width as i32, other.height as i32);
        let rect = placed.intersection(&self.bounds())?;
        let bits = PixelMask::from_fn(rect.width as u32, rect.height as u32, |lx, ly| {
            let x = rect.x + lx as i32;
            let y = rect.y + ly as i32;
            self.intersects_point(x, y) && other.intersects_point(x - offset_x, y - offset_y)
        });
        (bits.count_set() > 0).then_some(MaskRegion { rect, bits })
    }
}

/// Persisted form of a [`PixelMask`]
#[derive(Serialize, Deserialize)]
struct MaskRecord {
    width: u32,
    height: u32,
    bits: String,
}

impl TryFrom<MaskRecord> for PixelMask {
    type Error = MaskError;

    fn try_from(record: MaskRecord) -> Result<Self, Self::Error> {
        PixelMask::from_bit_string(record.width, record.height, &record.bits)
    }
}

impl From<PixelMask> for MaskRecord {
    fn from(mask: PixelMask) -> Self {
        Self {
            width: mask.width,
            height: mask.height,
            bits: mask.to_bit_string(),
        }
    }
}
