//! Module for pixel formats.
//!
//! Decoding always gives [`RGBA8`] pixels, whatever the stored format was, and
//! palette entries are [`RGB8`].
//!
//! ### Between Bit Depths
//! All stored formats have channel values as integers. To *reduce* bit depth
//! just keep the top X many bits, and to *increase* bit depth you should use
//! the current bit pattern as the top X many bits, and then copy that bit
//! pattern down however many times is required to fill in all newly added
//! bits. So a 2-bit gray of `0b10` becomes `0b1010_1010`, and a 16-bit sample
//! keeps its high byte.

use bytemuck::{Pod, Zeroable};

/// An RGB value, 8-bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}
impl From<[u8; 3]> for RGB8 {
  #[inline]
  #[must_use]
  fn from([r, g, b]: [u8; 3]) -> Self {
    Self { r, g, b }
  }
}

/// An 8-bits per channel RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl RGBA8 {
  /// A gray pixel with the given alpha.
  #[inline]
  #[must_use]
  pub const fn gray(y: u8, a: u8) -> Self {
    Self { r: y, g: y, b: y, a }
  }
  #[inline]
  #[must_use]
  pub const fn with_alpha(rgb: RGB8, a: u8) -> Self {
    Self { r: rgb.r, g: rgb.g, b: rgb.b, a }
  }
}
impl From<RGB8> for RGBA8 {
  /// Fully opaque.
  #[inline]
  #[must_use]
  fn from(rgb: RGB8) -> Self {
    Self::with_alpha(rgb, u8::MAX)
  }
}
impl From<[u8; 4]> for RGBA8 {
  #[inline]
  #[must_use]
  fn from([r, g, b, a]: [u8; 4]) -> Self {
    Self { r, g, b, a }
  }
}
