//! The scanline filters.
//!
//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Each filter subtracts a prediction from every byte (mod 256), and
//! reconstruction adds the same prediction back. The prediction only looks at
//! neighbors that are already reconstructed by the time a byte is reached:
//!
//! ```text
//! c b
//! a x
//! ```
//!
//! * `a` is the matching byte of the pixel to the left (`bpp` bytes back).
//! * `b` is the matching byte in the previous row.
//! * `c` is the matching byte of the pixel to the left in the previous row.
//!
//! Any neighbor off the edge of the image is 0.
//!
//! Because rows refer back to the *reconstructed* previous row, unfiltering
//! has to go top to bottom, one row at a time.

use alloc::vec;
use alloc::vec::Vec;

use super::telemetry::{CodecEvent, CodecObserver};
use crate::error::{PngError, StreamProblem};

/// The five filter types of filter method 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  /// No change.
  None = 0,
  /// Predict from the left.
  Sub = 1,
  /// Predict from above.
  Up = 2,
  /// Predict from the average of left and above.
  Average = 3,
  /// Predict with the Paeth predictor.
  Paeth = 4,
}
impl FilterType {
  /// Every filter type, in id order.
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(PngError::InvalidFilterType(value)),
    })
  }
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is the "predictor" of the neighboring pixel closest to the
/// computed value. Ties go to `a`, then `b`, then `c`.
#[inline]
#[must_use]
pub const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // Note(Lokathor): The PNG spec is extremely specific that you shall not,
  // under any circumstances, alter the order of evaluation of this
  // expression's tests.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

#[inline]
#[must_use]
const fn predict(ty: FilterType, a: u8, b: u8, c: u8) -> u8 {
  match ty {
    FilterType::None => 0,
    FilterType::Sub => a,
    FilterType::Up => b,
    // summed in u16 so it can't overflow
    FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
    FilterType::Paeth => paeth_predict(a, b, c),
  }
}

/// Filters `row` into `out` (same length, no type byte).
fn filter_row_into(ty: FilterType, row: &[u8], prev: Option<&[u8]>, bpp: usize, out: &mut [u8]) {
  debug_assert_eq!(row.len(), out.len());
  let bpp = bpp.max(1);
  let above = |i: usize| prev.and_then(|p| p.get(i).copied()).unwrap_or(0);
  for (i, (x, o)) in row.iter().zip(out.iter_mut()).enumerate() {
    let (a, c) = if i >= bpp { (row[i - bpp], above(i - bpp)) } else { (0, 0) };
    *o = x.wrapping_sub(predict(ty, a, above(i), c));
  }
}

/// Reverses a filter in place.
///
/// `row` holds the filtered bytes (no type byte) and becomes the reconstructed
/// bytes. `prev` must be the *reconstructed* previous row, or `None` for the
/// first row.
pub fn unfilter_row(ty: FilterType, row: &mut [u8], prev: Option<&[u8]>, bpp: usize) {
  let bpp = bpp.max(1);
  let above = |i: usize| prev.and_then(|p| p.get(i).copied()).unwrap_or(0);
  match ty {
    FilterType::None => (),
    FilterType::Up => {
      row.iter_mut().enumerate().for_each(|(i, x)| *x = x.wrapping_add(above(i)));
    }
    _ => {
      // the left neighbor of each byte was reconstructed on an earlier pass of
      // this loop, so it must be a plain index loop.
      for i in 0..row.len() {
        let (a, c) = if i >= bpp { (row[i - bpp], above(i - bpp)) } else { (0, 0) };
        row[i] = row[i].wrapping_add(predict(ty, a, above(i), c));
      }
    }
  }
}

/// Filters one scanline, giving the filter type byte followed by the filtered
/// bytes.
#[must_use]
pub fn apply_filter(ty: FilterType, row: &[u8], prev: Option<&[u8]>, bpp: usize) -> Vec<u8> {
  let mut out = vec![0; row.len() + 1];
  out[0] = ty as u8;
  filter_row_into(ty, row, prev, bpp, &mut out[1..]);
  out
}

/// Reverses [`apply_filter`]: takes a type byte plus filtered bytes and gives
/// back the original scanline.
pub fn invert_filter(
  filtered: &[u8], prev: Option<&[u8]>, bpp: usize,
) -> Result<Vec<u8>, PngError> {
  let (&ty, data) = filtered
    .split_first()
    .ok_or(PngError::CorruptStream(StreamProblem::SizeMismatch { expected: 1, actual: 0 }))?;
  let ty = FilterType::try_from(ty)?;
  let mut row = data.to_vec();
  unfilter_row(ty, &mut row, prev, bpp);
  Ok(row)
}

/// Scores filtered bytes for [`FilterStrategy::Optimal`]. Lower scores win.
///
/// This is the hook for other selection schemes, such as trial compression.
pub trait FilterHeuristic {
  /// `filtered` is the filtered row without its type byte.
  fn score(&self, filtered: &[u8]) -> u64;
}

/// The "minimum sum of absolute differences" heuristic from the PNG spec.
///
/// Each byte is read as a signed value, so `0xFF` (-1) scores 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SumOfAbsDiff;
impl FilterHeuristic for SumOfAbsDiff {
  #[inline]
  fn score(&self, filtered: &[u8]) -> u64 {
    filtered.iter().map(|&b| u64::from((b as i8).unsigned_abs())).sum()
  }
}

/// How the encoder picks each row's filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterStrategy {
  /// Use one filter type for every row.
  Fixed(FilterType),
  /// Try all five filters on each row and keep the best scoring one.
  #[default]
  Optimal,
}
impl TryFrom<u8> for FilterStrategy {
  type Error = PngError;
  /// Ids 0 through 4 are the fixed filters.
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    FilterType::try_from(value)
      .map(FilterStrategy::Fixed)
      .map_err(|_| PngError::InvalidFilterStrategy(value))
  }
}
impl From<FilterType> for FilterStrategy {
  #[inline]
  fn from(ty: FilterType) -> Self {
    Self::Fixed(ty)
  }
}

/// Filters `row` into `out` (type byte plus data) and says which filter won.
///
/// `scratch` must be at least `row.len()` bytes.
fn select_filter_into<H: FilterHeuristic + ?Sized>(
  strategy: FilterStrategy, heuristic: &H, row: &[u8], prev: Option<&[u8]>, bpp: usize,
  out: &mut [u8], scratch: &mut [u8],
) -> FilterType {
  let (ty_byte, out_data) = out.split_at_mut(1);
  let chosen = match strategy {
    FilterStrategy::Fixed(ty) => {
      filter_row_into(ty, row, prev, bpp, out_data);
      ty
    }
    FilterStrategy::Optimal => {
      let scratch = &mut scratch[..row.len()];
      let mut best: Option<(u64, FilterType)> = None;
      for ty in FilterType::ALL {
        filter_row_into(ty, row, prev, bpp, scratch);
        let score = heuristic.score(scratch);
        // strictly less, so ties keep the lower filter id
        if best.map_or(true, |(best_score, _)| score < best_score) {
          best = Some((score, ty));
          out_data.copy_from_slice(scratch);
        }
      }
      best.map_or(FilterType::None, |(_, ty)| ty)
    }
  };
  ty_byte[0] = chosen as u8;
  chosen
}

/// Filters one scanline according to the strategy, using [`SumOfAbsDiff`] for
/// [`FilterStrategy::Optimal`].
#[must_use]
pub fn select_filter(
  strategy: FilterStrategy, row: &[u8], prev: Option<&[u8]>, bpp: usize,
) -> Vec<u8> {
  select_filter_with(strategy, &SumOfAbsDiff, row, prev, bpp)
}

/// Like [`select_filter`], with a custom heuristic.
#[must_use]
pub fn select_filter_with<H: FilterHeuristic + ?Sized>(
  strategy: FilterStrategy, heuristic: &H, row: &[u8], prev: Option<&[u8]>, bpp: usize,
) -> Vec<u8> {
  let mut out = vec![0; row.len() + 1];
  let mut scratch = vec![0; row.len()];
  select_filter_into(strategy, heuristic, row, prev, bpp, &mut out, &mut scratch);
  out
}

/// Filters a whole image of `width * bpp` byte rows.
///
/// The output is `height * (width * bpp + 1)` bytes, ready for compression.
pub fn apply_filters(
  image: &[u8], width: u32, height: u32, bpp: usize, strategy: FilterStrategy,
) -> Result<Vec<u8>, PngError> {
  let line_len = (width as usize).checked_mul(bpp).ok_or(PngError::ImageTooLarge)?;
  filter_lines(image, line_len, height, bpp, strategy, &SumOfAbsDiff, &mut ())
}

/// Filters `height` rows of `line_len` bytes each.
///
/// The previous row given to each filter is always the unfiltered input row,
/// so the choice made for one row never depends on another row's output.
pub fn filter_lines<H: FilterHeuristic + ?Sized, O: CodecObserver + ?Sized>(
  image: &[u8], line_len: usize, height: u32, bpp: usize, strategy: FilterStrategy,
  heuristic: &H, observer: &mut O,
) -> Result<Vec<u8>, PngError> {
  let expected = line_len.checked_mul(height as usize).ok_or(PngError::ImageTooLarge)?;
  if image.len() != expected {
    return Err(PngError::PixelSizeMismatch { expected, actual: image.len() });
  }
  let stride = line_len.checked_add(1).ok_or(PngError::ImageTooLarge)?;
  let out_len = stride.checked_mul(height as usize).ok_or(PngError::ImageTooLarge)?;
  let mut out = vec![0_u8; out_len];
  let mut scratch = vec![0_u8; line_len];
  let mut prev: Option<&[u8]> = None;
  // a zero-width line still has its type byte
  let rows = image.chunks_exact(line_len.max(1)).take(height as usize);
  let rows = rows.chain(core::iter::repeat(&[][..])).take(height as usize);
  for ((y, row), out_line) in rows.enumerate().zip(out.chunks_exact_mut(stride)) {
    let filter = select_filter_into(strategy, heuristic, row, prev, bpp, out_line, &mut scratch);
    observer.on_event(CodecEvent::RowFiltered { row: y as u32, filter });
    prev = Some(row);
  }
  Ok(out)
}

/// Reverses [`apply_filters`] for an image of `width * bpp` byte rows.
pub fn invert_filters(
  filtered: &[u8], width: u32, height: u32, bpp: usize,
) -> Result<Vec<u8>, PngError> {
  let line_len = (width as usize).checked_mul(bpp).ok_or(PngError::ImageTooLarge)?;
  unfilter_lines(filtered, line_len, height, bpp, &mut ())
}

/// Reverses the filters on `height` rows of `line_len` bytes (plus the type
/// byte each).
///
/// This goes strictly from the top row down: every row is reconstructed from
/// the reconstructed row above it.
pub fn unfilter_lines<O: CodecObserver + ?Sized>(
  filtered: &[u8], line_len: usize, height: u32, bpp: usize, observer: &mut O,
) -> Result<Vec<u8>, PngError> {
  let stride = line_len.checked_add(1).ok_or(PngError::ImageTooLarge)?;
  let expected = stride.checked_mul(height as usize).ok_or(PngError::ImageTooLarge)?;
  if filtered.len() != expected {
    return Err(PngError::CorruptStream(StreamProblem::SizeMismatch {
      expected,
      actual: filtered.len(),
    }));
  }
  // can't overflow, it's smaller than `expected`
  let mut out = vec![0_u8; expected - height as usize];
  for (y, line) in filtered.chunks_exact(stride).enumerate() {
    let ty = FilterType::try_from(line[0])?;
    let (done, rest) = out.split_at_mut(y * line_len);
    let row = &mut rest[..line_len];
    row.copy_from_slice(&line[1..]);
    let prev = if y > 0 { Some(&done[(y - 1) * line_len..]) } else { None };
    unfilter_row(ty, row, prev, bpp);
    observer.on_event(CodecEvent::RowUnfiltered { row: y as u32, filter: ty });
  }
  Ok(out)
}
