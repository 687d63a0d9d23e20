use core::fmt;

use crate::png::ChunkType;

/// An error from the `pngcodec` crate.
///
/// These are the low level failure kinds. Each stage of the codec fails
/// immediately with one of these on the first violation it sees. The
/// whole-file entry points wrap them in a [`CodecError`] that also says which
/// stage failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PngError {
  /// The stream doesn't start with the 8 byte PNG signature.
  #[error("missing PNG signature")]
  InvalidSignature,

  /// Fewer bytes remain than the chunk framing requires.
  #[error("chunk at offset {offset} is truncated: needs {needed} bytes, {remaining} remain")]
  TruncatedChunk { offset: usize, needed: usize, remaining: usize },

  /// The declared length is above the PNG limit of `2^31 - 1`.
  #[error("chunk at offset {offset} declares length {length}, above the 2^31-1 limit")]
  ChunkLengthOverflow { offset: usize, length: u64 },

  /// The type bytes of a chunk aren't all ASCII letters.
  #[error("chunk at offset {offset} has an invalid type tag {ty:?}")]
  InvalidChunkType { offset: usize, ty: ChunkType },

  /// The CRC32 stored after a chunk doesn't match the type and data bytes.
  #[error("{chunk:?} at offset {offset}: declared CRC {declared:#010x}, actual {actual:#010x}")]
  ChecksumMismatch { chunk: ChunkType, offset: usize, declared: u32, actual: u32 },

  /// The chunk sequence breaks one of the ordering rules.
  #[error("structural violation: {0}")]
  StructuralViolation(StructureViolation),

  /// The `IHDR` record isn't a legal PNG header.
  #[error("invalid header: {0}")]
  InvalidHeader(HeaderProblem),

  /// The pixel buffer given to the encoder is the wrong size.
  #[error("pixel buffer is {actual} bytes, expected {expected}")]
  PixelSizeMismatch { expected: usize, actual: usize },

  /// Filter type bytes must be 0 through 4.
  #[error("invalid filter type {0}")]
  InvalidFilterType(u8),

  /// Filter strategy ids must be 0 through 4 (or the optimal strategy).
  #[error("invalid filter strategy {0}")]
  InvalidFilterStrategy(u8),

  /// The compressed image stream couldn't be turned back into filtered lines.
  #[error("corrupt image data stream: {0}")]
  CorruptStream(StreamProblem),

  /// A checked size computation overflowed.
  #[error("image dimensions are too large to process")]
  ImageTooLarge,

  /// Compression levels are 0 through 9.
  #[error("compression level {0} is not in 0..=9")]
  InvalidCompressionLevel(u8),

  /// The maximum `IDAT` chunk size must be at least one byte and at most
  /// `2^31 - 1`.
  #[error("max chunk size {0} is not in 1..=2^31-1")]
  InvalidChunkSize(usize),

  /// Text keywords are 1-79 printable Latin-1 bytes without leading, trailing,
  /// or consecutive spaces.
  #[error("invalid text keyword")]
  InvalidKeyword,

  /// A `tEXt`, `zTXt`, or `iTXt` chunk is malformed.
  #[error("malformed {0:?} chunk")]
  InvalidTextChunk(ChunkType),

  /// The `PLTE` chunk is malformed.
  #[error("palette must hold 1 to 256 RGB entries")]
  InvalidPalette,

  /// The `tRNS` chunk doesn't fit the image's color type.
  #[error("transparency chunk doesn't match the color type")]
  InvalidTransparency,

  /// A palette index points past the end of the palette.
  #[error("palette index {index} is out of range for a palette of {len} entries")]
  PaletteIndexOutOfRange { index: u8, len: usize },

  /// Adam7 interlaced images are not decoded.
  #[error("interlaced images are not supported")]
  InterlaceNotSupported,
}

/// Which ordering rule of the chunk sequence was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureViolation {
  /// The sequence has no chunks at all.
  NoChunks,
  /// The first chunk isn't `IHDR`.
  FirstChunkNotIhdr,
  /// There's more than one `IHDR`.
  DuplicateIhdr,
  /// The last chunk isn't `IEND`.
  LastChunkNotIend,
  /// There's more than one `IEND`.
  DuplicateIend,
  /// There's no `IDAT` at all.
  MissingIdat,
  /// Some other chunk appears between two `IDAT` chunks.
  NonContiguousIdat,
  /// A palette image has no `PLTE` before its image data.
  MissingPalette,
  /// There's more than one `PLTE`.
  DuplicatePalette,
  /// There's more than one `tRNS`.
  DuplicateTransparency,
  /// `tRNS` must come after `PLTE` and before the image data.
  MisplacedTransparency,
}
impl fmt::Display for StructureViolation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::NoChunks => "stream contains no chunks",
      Self::FirstChunkNotIhdr => "first chunk must be IHDR",
      Self::DuplicateIhdr => "exactly one IHDR chunk required",
      Self::LastChunkNotIend => "last chunk must be IEND",
      Self::DuplicateIend => "exactly one IEND chunk required",
      Self::MissingIdat => "at least one IDAT chunk required",
      Self::NonContiguousIdat => "IDAT chunks must be contiguous",
      Self::MissingPalette => "palette images require a PLTE chunk before IDAT",
      Self::DuplicatePalette => "at most one PLTE chunk allowed",
      Self::DuplicateTransparency => "at most one tRNS chunk allowed",
      Self::MisplacedTransparency => "tRNS must come after PLTE and before IDAT",
    })
  }
}

/// Why an `IHDR` record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderProblem {
  /// The record must be exactly 13 bytes.
  WrongLength(usize),
  /// Width must be in `1..=2^31-1`.
  BadWidth(u32),
  /// Height must be in `1..=2^31-1`.
  BadHeight(u32),
  /// Color type must be 0, 2, 3, 4, or 6.
  BadColorType(u8),
  /// The bit depth isn't allowed for the color type.
  BadBitDepth { color_type: u8, bit_depth: u8 },
  /// Compression method must be 0.
  BadCompressionMethod(u8),
  /// Filter method must be 0.
  BadFilterMethod(u8),
  /// Interlace method must be 0 or 1.
  BadInterlaceMethod(u8),
}
impl fmt::Display for HeaderProblem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Self::WrongLength(len) => write!(f, "header record is {len} bytes, expected 13"),
      Self::BadWidth(w) => write!(f, "width {w} is not in 1..=2^31-1"),
      Self::BadHeight(h) => write!(f, "height {h} is not in 1..=2^31-1"),
      Self::BadColorType(c) => write!(f, "color type {c} is not one of 0, 2, 3, 4, 6"),
      Self::BadBitDepth { color_type, bit_depth } => {
        write!(f, "bit depth {bit_depth} is not allowed for color type {color_type}")
      }
      Self::BadCompressionMethod(m) => write!(f, "compression method {m} must be 0"),
      Self::BadFilterMethod(m) => write!(f, "filter method {m} must be 0"),
      Self::BadInterlaceMethod(m) => write!(f, "interlace method {m} must be 0 or 1"),
    }
  }
}

/// Why the compressed image stream couldn't be reassembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamProblem {
  /// The zlib data itself is damaged or cut short.
  Inflate,
  /// The stream inflates to more bytes than the header allows for.
  TooMuchData { expected: usize },
  /// The stream inflates to a different size than the header requires.
  SizeMismatch { expected: usize, actual: usize },
}
impl fmt::Display for StreamProblem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Self::Inflate => f.write_str("zlib stream failed to inflate"),
      Self::TooMuchData { expected } => {
        write!(f, "stream inflates past the expected {expected} bytes")
      }
      Self::SizeMismatch { expected, actual } => {
        write!(f, "stream inflated to {actual} bytes, expected {expected}")
      }
    }
  }
}

/// The stage of the whole-file pipeline that a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  /// Checking the encode options.
  Options,
  /// Checking the 8-byte signature.
  Signature,
  /// Splitting the stream into chunks.
  ChunkParsing,
  /// Checking chunk ordering.
  ChunkStructure,
  /// Building or reading `IHDR`.
  Header,
  /// Building or reading the text chunks.
  Metadata,
  /// Filtering scanlines.
  Filtering,
  /// Compressing and framing `IDAT` data.
  Compression,
  /// Reassembling and inflating `IDAT` data.
  Decompression,
  /// Reversing the scanline filters.
  Unfiltering,
  /// Reading `PLTE`/`tRNS` and converting pixels to RGBA8.
  Expansion,
  /// Serializing the final chunk stream.
  Assembly,
}
impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Options => "options",
      Self::Signature => "signature",
      Self::ChunkParsing => "chunk parsing",
      Self::ChunkStructure => "chunk structure",
      Self::Header => "header",
      Self::Metadata => "metadata",
      Self::Filtering => "filtering",
      Self::Compression => "compression",
      Self::Decompression => "decompression",
      Self::Unfiltering => "unfiltering",
      Self::Expansion => "pixel expansion",
      Self::Assembly => "assembly",
    })
  }
}

/// A [`PngError`] tagged with the pipeline [`Stage`] that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct CodecError {
  pub stage: Stage,
  #[source]
  pub error: PngError,
}
impl CodecError {
  #[inline]
  #[must_use]
  pub const fn new(stage: Stage, error: PngError) -> Self {
    Self { stage, error }
  }
}

/// Lets `.map_err(at(Stage::Header))?` attach context at each step.
#[inline]
pub(crate) fn at(stage: Stage) -> impl Fn(PngError) -> CodecError {
  move |error| CodecError::new(stage, error)
}
