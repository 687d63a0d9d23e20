//! Turning unfiltered scanlines of any PNG pixel format into RGBA8.

use alloc::vec::Vec;

use bitfrob::u8_replicate_bits;

use super::{Palette, PngColorType, Transparency, IHDR};
use crate::{
  error::{PngError, StructureViolation},
  parser_helpers::u16_be,
  pixel_formats::{RGB8, RGBA8},
};

/// Reads sample `i` of a scanline, at full precision.
///
/// Sub-byte samples are packed with the leftmost sample in the high bits.
#[inline]
fn sample(row: &[u8], bit_depth: u8, i: usize) -> u16 {
  match bit_depth {
    16 => u16_be([row[2 * i], row[2 * i + 1]]),
    8 => u16::from(row[i]),
    depth => {
      let depth = usize::from(depth);
      let bit = i * depth;
      let shift = 8 - depth - (bit % 8);
      let mask = (1_u8 << depth) - 1;
      u16::from((row[bit / 8] >> shift) & mask)
    }
  }
}

/// Scales a sample to 8 bits: 16-bit keeps the high byte, sub-byte depths
/// replicate their bits.
#[inline]
fn to_u8(sample: u16, bit_depth: u8) -> u8 {
  match bit_depth {
    16 => (sample >> 8) as u8,
    8 => sample as u8,
    depth => u8_replicate_bits(u32::from(depth), sample as u8),
  }
}

/// Converts unfiltered image data (rows of [`IHDR::bytes_per_scanline`]
/// bytes, no filter type bytes) into RGBA8 pixels.
///
/// * Indexed images need the palette, and every index must be in it.
/// * A grayscale or RGB `tRNS` color key makes exactly matching pixels fully
///   transparent. The match uses the samples at their stored bit depth.
/// * Indexed `tRNS` gives per-entry alpha.
pub fn expand_to_rgba8(
  raw: &[u8], ihdr: &IHDR, palette: Option<Palette<'_>>, transparency: Option<Transparency<'_>>,
) -> Result<Vec<RGBA8>, PngError> {
  let line_len = ihdr.bytes_per_scanline()?;
  let expected = line_len.checked_mul(ihdr.height as usize).ok_or(PngError::ImageTooLarge)?;
  if raw.len() != expected {
    return Err(PngError::PixelSizeMismatch { expected, actual: raw.len() });
  }
  let pixel_count =
    (ihdr.width as usize).checked_mul(ihdr.height as usize).ok_or(PngError::ImageTooLarge)?;
  let mut pixels: Vec<RGBA8> = Vec::new();
  pixels.try_reserve(pixel_count).map_err(|_| PngError::ImageTooLarge)?;

  let depth = ihdr.bit_depth;
  let width = ihdr.width as usize;
  let color_key = |samples: &[u16]| -> u8 {
    match (transparency, samples) {
      (Some(Transparency::Gray(y)), [s]) if y == *s => 0,
      (Some(Transparency::Rgb(rgb)), [r, g, b]) if rgb == [*r, *g, *b] => 0,
      _ => u8::MAX,
    }
  };

  match ihdr.color_type {
    PngColorType::Y => {
      for row in raw.chunks_exact(line_len) {
        pixels.extend((0..width).map(|x| {
          let y = sample(row, depth, x);
          RGBA8::gray(to_u8(y, depth), color_key(&[y]))
        }));
      }
    }
    PngColorType::RGB => {
      for row in raw.chunks_exact(line_len) {
        pixels.extend((0..width).map(|x| {
          let rgb = [0, 1, 2].map(|c| sample(row, depth, 3 * x + c));
          let [r, g, b] = rgb.map(|s| to_u8(s, depth));
          RGBA8 { r, g, b, a: color_key(&rgb) }
        }));
      }
    }
    PngColorType::Index => {
      let palette = palette.ok_or_else(|| {
        log::error!("indexed image has no palette");
        PngError::StructuralViolation(StructureViolation::MissingPalette)
      })?;
      let entries = palette.entries();
      for row in raw.chunks_exact(line_len) {
        for x in 0..width {
          let index = sample(row, depth, x) as u8;
          let rgb = entries.get(usize::from(index)).copied().ok_or_else(|| {
            log::warn!("palette index {index} with only {} entries", entries.len());
            PngError::PaletteIndexOutOfRange { index, len: entries.len() }
          })?;
          let a = transparency.map_or(u8::MAX, |t| t.alpha_for_index(index));
          pixels.push(RGBA8::with_alpha(RGB8::from(rgb), a));
        }
      }
    }
    PngColorType::YA => {
      for row in raw.chunks_exact(line_len) {
        pixels.extend((0..width).map(|x| {
          let y = to_u8(sample(row, depth, 2 * x), depth);
          RGBA8::gray(y, to_u8(sample(row, depth, 2 * x + 1), depth))
        }));
      }
    }
    PngColorType::RGBA => {
      for row in raw.chunks_exact(line_len) {
        pixels.extend((0..width).map(|x| {
          let [r, g, b, a] = [0, 1, 2, 3].map(|c| to_u8(sample(row, depth, 4 * x + c), depth));
          RGBA8 { r, g, b, a }
        }));
      }
    }
  }
  Ok(pixels)
}
