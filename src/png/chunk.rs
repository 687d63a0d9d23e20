use core::fmt::{Debug, Write};

use super::crc32::chunk_crc;

/// The four byte tag naming a chunk's type.
///
/// The case of each letter carries a property bit (bit 5 of each byte):
/// * 1st byte: uppercase means critical, lowercase means ancillary.
/// * 2nd byte: uppercase means public, lowercase means private.
/// * 3rd byte: must be uppercase in this version of PNG.
/// * 4th byte: lowercase means safe for editors to copy blindly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const tEXt: Self = Self(*b"tEXt");
  pub const zTXt: Self = Self(*b"zTXt");
  pub const iTXt: Self = Self(*b"iTXt");

  /// Critical chunks must be understood to display the image.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 32) == 0
  }
  /// Public chunks are part of the PNG spec (or registered).
  #[inline]
  #[must_use]
  pub const fn is_public(self) -> bool {
    (self.0[1] & 32) == 0
  }
  /// The reserved bit. It's always clear in conforming chunk types.
  #[inline]
  #[must_use]
  pub const fn is_reserved_bit_valid(self) -> bool {
    (self.0[2] & 32) == 0
  }
  /// Safe to copy chunks can be kept by editors that don't understand them.
  #[inline]
  #[must_use]
  pub const fn is_safe_to_copy(self) -> bool {
    (self.0[3] & 32) != 0
  }
  /// All four bytes are ASCII letters.
  #[inline]
  #[must_use]
  pub const fn is_valid_tag(self) -> bool {
    self.0[0].is_ascii_alphabetic()
      && self.0[1].is_ascii_alphabetic()
      && self.0[2].is_ascii_alphabetic()
      && self.0[3].is_ascii_alphabetic()
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}
impl From<[u8; 4]> for ChunkType {
  #[inline]
  #[must_use]
  fn from(tag: [u8; 4]) -> Self {
    Self(tag)
  }
}
impl PartialEq<[u8; 4]> for ChunkType {
  #[inline]
  fn eq(&self, other: &[u8; 4]) -> bool {
    self.0 == *other
  }
}
impl PartialEq<&[u8; 4]> for ChunkType {
  #[inline]
  fn eq(&self, other: &&[u8; 4]) -> bool {
    self.0 == **other
  }
}

/// A chunk that passed every check it was parsed with.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidChunk<'b> {
  pub(crate) ty: ChunkType,
  pub(crate) data: &'b [u8],
  pub(crate) crc32: u32,
  pub(crate) offset: usize,
}
impl<'b> ValidChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkType {
    self.ty
  }
  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }
  /// The length field, which is always the data length.
  #[inline]
  #[must_use]
  pub const fn length(&self) -> u32 {
    self.data.len() as u32
  }
  /// The CRC stored in the stream.
  #[inline]
  #[must_use]
  pub const fn crc32(&self) -> u32 {
    self.crc32
  }
  /// Byte offset of the chunk's length field, relative to the end of the
  /// signature.
  #[inline]
  #[must_use]
  pub const fn offset(&self) -> usize {
    self.offset
  }
  /// Recomputes the CRC from the type and data.
  #[inline]
  #[must_use]
  pub fn compute_actual_crc(&self) -> u32 {
    chunk_crc(self.ty.0, self.data)
  }
}
impl Debug for ValidChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ValidChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("crc32", &self.crc32)
      .field("offset", &self.offset)
      .finish()
  }
}

/// Why a chunk was marked invalid during lenient parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
  /// The stored CRC doesn't match the type and data.
  ChecksumMismatch { declared: u32, actual: u32 },
  /// The type bytes aren't all ASCII letters.
  BadChunkType,
}

/// A chunk that failed a check during lenient parsing.
///
/// The data is deliberately not exposed: it's not trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidChunk {
  pub(crate) ty: ChunkType,
  pub(crate) offset: usize,
  pub(crate) reason: InvalidReason,
}
impl InvalidChunk {
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkType {
    self.ty
  }
  #[inline]
  #[must_use]
  pub const fn offset(&self) -> usize {
    self.offset
  }
  #[inline]
  #[must_use]
  pub const fn reason(&self) -> InvalidReason {
    self.reason
  }
}

/// One chunk out of a parsed stream.
///
/// [`Chunk::Invalid`] only shows up when parsing in lenient mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chunk<'b> {
  Valid(ValidChunk<'b>),
  Invalid(InvalidChunk),
}
impl<'b> Chunk<'b> {
  /// The type tag, which both variants carry.
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkType {
    match self {
      Chunk::Valid(v) => v.ty,
      Chunk::Invalid(i) => i.ty,
    }
  }
  #[inline]
  #[must_use]
  pub const fn offset(&self) -> usize {
    match self {
      Chunk::Valid(v) => v.offset,
      Chunk::Invalid(i) => i.offset,
    }
  }
  #[inline]
  #[must_use]
  pub const fn is_valid(&self) -> bool {
    matches!(self, Chunk::Valid(_))
  }
  #[inline]
  #[must_use]
  pub const fn as_valid(&self) -> Option<&ValidChunk<'b>> {
    match self {
      Chunk::Valid(v) => Some(v),
      Chunk::Invalid(_) => None,
    }
  }
}

#[test]
fn test_chunk_type_property_bits() {
  assert!(ChunkType::IHDR.is_critical());
  assert!(ChunkType::IDAT.is_public());
  assert!(!ChunkType::tEXt.is_critical());
  assert!(ChunkType::tEXt.is_safe_to_copy());
  assert!(!ChunkType::tRNS.is_safe_to_copy());
  assert!(!ChunkType(*b"prIv").is_public());
  assert!(ChunkType::IEND.is_reserved_bit_valid());
  assert!(ChunkType(*b"abcd").is_valid_tag());
  assert!(!ChunkType(*b"ab1d").is_valid_tag());
  assert_eq!(ChunkType::IEND, *b"IEND");
  assert_eq!(alloc::format!("{:?}", ChunkType::iTXt), "iTXt");
}
