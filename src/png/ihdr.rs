use crate::{
  error::{HeaderProblem, PngError},
  parser_helpers::{try_split_off_byte_array, u32_be},
};

/// Width and height must not exceed this.
pub const MAX_DIMENSION: u32 = (1 << 31) - 1;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// Every color type, in id order.
  pub const ALL: [Self; 5] = [Self::Y, Self::RGB, Self::Index, Self::YA, Self::RGBA];

  /// The number of samples stored for each pixel.
  #[inline]
  #[must_use]
  pub const fn samples_per_pixel(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// The number of color channels a pixel stands for.
  ///
  /// This differs from the sample count for palette images, where a single
  /// index sample stands for an RGB palette entry.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 3,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// If the pixels carry an alpha sample.
  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::YA | Self::RGBA)
  }

  /// The bit depths this color type may be stored at.
  #[inline]
  #[must_use]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::RGB => &[8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::YA => &[8, 16],
      Self::RGBA => &[8, 16],
    }
  }

  #[inline]
  #[must_use]
  pub fn allows_bit_depth(self, bit_depth: u8) -> bool {
    self.allowed_bit_depths().contains(&bit_depth)
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = HeaderProblem;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(HeaderProblem::BadColorType(value)),
    })
  }
}

/// Image Header
///
/// The compression and filter methods aren't stored: 0 is the only legal value
/// for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per sample
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored interlaced.
  ///
  /// please don't make new interlaced images, they're terrible.
  pub is_interlaced: bool,
}
impl IHDR {
  /// A non-interlaced 8-bit RGBA header, which is what the encoder writes.
  #[inline]
  #[must_use]
  pub const fn rgba8(width: u32, height: u32) -> Self {
    Self { width, height, bit_depth: 8, color_type: PngColorType::RGBA, is_interlaced: false }
  }

  /// Checks the dimension limits and the color type / bit depth pairing.
  pub fn validate(&self) -> Result<(), HeaderProblem> {
    if self.width == 0 || self.width > MAX_DIMENSION {
      return Err(HeaderProblem::BadWidth(self.width));
    }
    if self.height == 0 || self.height > MAX_DIMENSION {
      return Err(HeaderProblem::BadHeight(self.height));
    }
    if !self.color_type.allows_bit_depth(self.bit_depth) {
      return Err(HeaderProblem::BadBitDepth {
        color_type: self.color_type as u8,
        bit_depth: self.bit_depth,
      });
    }
    Ok(())
  }

  /// See [`PngColorType::channel_count`].
  #[inline]
  #[must_use]
  pub const fn channels(&self) -> usize {
    self.color_type.channel_count()
  }

  #[inline]
  #[must_use]
  pub const fn samples_per_pixel(&self) -> usize {
    self.color_type.samples_per_pixel()
  }

  #[inline]
  #[must_use]
  pub const fn has_alpha(&self) -> bool {
    self.color_type.has_alpha()
  }

  /// Bits in one pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.samples_per_pixel()
  }

  /// Bytes in one pixel. Sub-byte formats give a fraction, such as `0.25` for
  /// 2-bit grayscale.
  #[inline]
  #[must_use]
  pub fn bytes_per_pixel(&self) -> f32 {
    self.bits_per_pixel() as f32 / 8.0
  }

  /// The byte distance the filters look back for the "left" neighbor.
  ///
  /// This is the bytes per pixel rounded up, so it's 1 for every sub-byte
  /// format.
  #[inline]
  #[must_use]
  pub const fn filter_bytes_per_pixel(&self) -> usize {
    let bits = self.bits_per_pixel();
    if bits < 8 {
      1
    } else {
      bits / 8
    }
  }

  /// Bytes in one unfiltered row of the full image. When pixels are less than
  /// 8 bits it's possible to end up with partial bytes on the end, so we round
  /// up.
  #[inline]
  pub fn bytes_per_scanline(&self) -> Result<usize, PngError> {
    let bits = self
      .bits_per_pixel()
      .checked_mul(self.width as usize)
      .ok_or(PngError::ImageTooLarge)?;
    Ok(bits / 8 + usize::from(bits % 8 != 0))
  }

  /// The exact size the zlib stream must inflate to: each row plus its filter
  /// type byte.
  #[inline]
  pub fn filtered_buffer_len(&self) -> Result<usize, PngError> {
    let line = self.bytes_per_scanline()?.checked_add(1).ok_or(PngError::ImageTooLarge)?;
    line.checked_mul(self.height as usize).ok_or(PngError::ImageTooLarge)
  }
}

/// Parses and validates the 13 byte `IHDR` record.
pub fn decode_header(data: &[u8]) -> Result<IHDR, PngError> {
  decode_header_inner(data).map_err(|problem| {
    log::warn!("rejected IHDR: {problem}");
    PngError::InvalidHeader(problem)
  })
}

fn decode_header_inner(data: &[u8]) -> Result<IHDR, HeaderProblem> {
  if data.len() != 13 {
    return Err(HeaderProblem::WrongLength(data.len()));
  }
  let wrong_len = HeaderProblem::WrongLength(data.len());
  let (width, rest) = try_split_off_byte_array::<4>(data).ok_or(wrong_len)?;
  let (height, rest) = try_split_off_byte_array::<4>(rest).ok_or(wrong_len)?;
  let [bit_depth, color_type, compression_method, filter_method, interlace_method] =
    try_split_off_byte_array::<5>(rest).ok_or(wrong_len)?.0;
  let color_type = PngColorType::try_from(color_type)?;
  if compression_method != 0 {
    return Err(HeaderProblem::BadCompressionMethod(compression_method));
  }
  if filter_method != 0 {
    return Err(HeaderProblem::BadFilterMethod(filter_method));
  }
  let is_interlaced = match interlace_method {
    0 => false,
    1 => true,
    other => return Err(HeaderProblem::BadInterlaceMethod(other)),
  };
  let ihdr =
    IHDR { width: u32_be(width), height: u32_be(height), bit_depth, color_type, is_interlaced };
  ihdr.validate()?;
  Ok(ihdr)
}

/// Validates a header and serializes it to the 13 byte `IHDR` record.
pub fn encode_header(ihdr: &IHDR) -> Result<[u8; 13], PngError> {
  ihdr.validate().map_err(PngError::InvalidHeader)?;
  let mut out = [0_u8; 13];
  out[0..4].copy_from_slice(&ihdr.width.to_be_bytes());
  out[4..8].copy_from_slice(&ihdr.height.to_be_bytes());
  out[8] = ihdr.bit_depth;
  out[9] = ihdr.color_type as u8;
  // compression method and filter method stay 0
  out[12] = u8::from(ihdr.is_interlaced);
  Ok(out)
}
