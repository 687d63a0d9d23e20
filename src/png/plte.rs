use core::fmt::Debug;

use crate::error::PngError;

/// Palette data
///
/// Palette entries are always RGB.
///
/// If you want to have a paletted image with transparency then the transparency
/// info goes in a separate transparency chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Palette<'b>(&'b [[u8; 3]]);
impl<'b> Palette<'b> {
  /// The most entries a palette can have.
  pub const MAX_ENTRIES: usize = 256;

  /// Reads a `PLTE` chunk's data.
  ///
  /// The data must be 1 to 256 whole RGB entries.
  pub fn parse(data: &'b [u8]) -> Result<Self, PngError> {
    match bytemuck::try_cast_slice::<u8, [u8; 3]>(data) {
      Ok(entries) if (1..=Self::MAX_ENTRIES).contains(&entries.len()) => Ok(Self(entries)),
      _ => {
        log::warn!("PLTE data is {} bytes", data.len());
        Err(PngError::InvalidPalette)
      }
    }
  }

  /// Gets the entries as a slice.
  #[inline]
  #[must_use]
  pub const fn entries(&self) -> &'b [[u8; 3]] {
    self.0
  }

  #[inline]
  #[must_use]
  pub const fn len(&self) -> usize {
    self.0.len()
  }

  /// Always false for a parsed palette, but clippy wants it.
  #[inline]
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
impl<'b> From<&'b [[u8; 3]]> for Palette<'b> {
  #[inline]
  #[must_use]
  fn from(entries: &'b [[u8; 3]]) -> Self {
    Self(entries)
  }
}
impl Debug for Palette<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // currently prints no more than 4 palette entries
    f.debug_tuple("Palette").field(&&self.0[..self.0.len().min(4)]).field(&self.0.len()).finish()
  }
}

#[test]
fn test_palette_parse() {
  let p = Palette::parse(&[1, 2, 3, 4, 5, 6]).unwrap();
  assert_eq!(p.entries(), &[[1, 2, 3], [4, 5, 6]]);
  assert_eq!(p.len(), 2);
  assert_eq!(Palette::parse(&[]), Err(PngError::InvalidPalette));
  assert_eq!(Palette::parse(&[1, 2, 3, 4]), Err(PngError::InvalidPalette));
  assert!(Palette::parse(&[7; 256 * 3]).is_ok());
  assert_eq!(Palette::parse(&[7; 257 * 3]), Err(PngError::InvalidPalette));
}
