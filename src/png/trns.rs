use super::PngColorType;
use crate::{error::PngError, parser_helpers::u16_be};

/// Transparency
///
/// The layout depends on the image's color type:
/// * grayscale: one sample value that's fully transparent.
/// * RGB: one RGB value that's fully transparent.
/// * indexed: alpha values to pair with the palette entries. There can be fewer
///   alpha entries than palette entries, and the missing entries are fully
///   opaque (`0xFF`).
///
/// Color types that already have alpha never carry this chunk.
///
/// Spec: [tRNS](https://www.w3.org/TR/png/#11tRNS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transparency<'b> {
  /// The transparent gray sample, at the image's bit depth.
  Gray(u16),
  /// The transparent RGB samples, at the image's bit depth.
  Rgb([u16; 3]),
  /// Alpha for palette entries, starting from index 0.
  Alphas(&'b [u8]),
}
impl<'b> Transparency<'b> {
  /// Reads a `tRNS` chunk's data for an image of the given color type.
  ///
  /// `palette_len` is only used for indexed images, which can't have more alpha
  /// entries than palette entries.
  pub fn parse(
    color_type: PngColorType, data: &'b [u8], palette_len: usize,
  ) -> Result<Self, PngError> {
    let out = match (color_type, data) {
      (PngColorType::Y, &[y0, y1]) => Some(Self::Gray(u16_be([y0, y1]))),
      (PngColorType::RGB, &[r0, r1, g0, g1, b0, b1]) => {
        Some(Self::Rgb([u16_be([r0, r1]), u16_be([g0, g1]), u16_be([b0, b1])]))
      }
      (PngColorType::Index, alphas) if alphas.len() <= palette_len => Some(Self::Alphas(alphas)),
      _ => None,
    };
    out.ok_or_else(|| {
      log::warn!("tRNS of {} bytes doesn't fit color type {color_type:?}", data.len());
      PngError::InvalidTransparency
    })
  }

  /// The alpha of palette entry `index`.
  #[inline]
  #[must_use]
  pub fn alpha_for_index(&self, index: u8) -> u8 {
    match self {
      Self::Alphas(alphas) => alphas.get(usize::from(index)).copied().unwrap_or(u8::MAX),
      _ => u8::MAX,
    }
  }
}

#[test]
fn test_transparency_parse() {
  use PngColorType as C;
  assert_eq!(Transparency::parse(C::Y, &[1, 2], 0), Ok(Transparency::Gray(0x0102)));
  assert_eq!(
    Transparency::parse(C::RGB, &[0, 1, 0, 2, 0, 3], 0),
    Ok(Transparency::Rgb([1, 2, 3]))
  );
  let t = Transparency::parse(C::Index, &[0, 128], 4).unwrap();
  assert_eq!(t.alpha_for_index(1), 128);
  assert_eq!(t.alpha_for_index(3), 255);
  assert_eq!(Transparency::parse(C::Index, &[0; 5], 4), Err(PngError::InvalidTransparency));
  assert_eq!(Transparency::parse(C::Y, &[1], 0), Err(PngError::InvalidTransparency));
  assert_eq!(Transparency::parse(C::RGBA, &[], 0), Err(PngError::InvalidTransparency));
  assert_eq!(Transparency::parse(C::YA, &[0, 0], 0), Err(PngError::InvalidTransparency));
}
