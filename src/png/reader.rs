use alloc::vec::Vec;

use super::*;
use crate::{
  error::{PngError, StructureViolation},
  parser_helpers::try_split_off_byte_array,
};

/// The largest length a chunk may declare.
pub const MAX_CHUNK_LEN: u32 = (1 << 31) - 1;

/// Options for [`parse_chunks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseOptions {
  /// When set, the first problem fails the parse. When clear, damaged chunks
  /// become [`Chunk::Invalid`] entries and truncation just ends the parse.
  pub strict_mode: bool,
  /// Check each chunk's CRC.
  pub validate_crc: bool,
}
impl Default for ParseOptions {
  #[inline]
  fn default() -> Self {
    Self { strict_mode: true, validate_crc: true }
  }
}
impl ParseOptions {
  /// Lenient parsing, for looking at damaged files.
  #[inline]
  #[must_use]
  pub const fn lenient() -> Self {
    Self { strict_mode: false, validate_crc: true }
  }
}

/// The framing of one chunk, before any checks.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawChunk<'b> {
  pub(crate) ty: ChunkType,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
  pub(crate) offset: usize,
}

/// Walks the chunk framing of a stream (signature already removed).
///
/// Each item is either the next chunk's framing or the error that stopped the
/// walk. After an error the iterator is fused.
#[derive(Debug, Clone)]
pub(crate) struct RawChunkIter<'b> {
  bytes: &'b [u8],
  offset: usize,
}
impl<'b> RawChunkIter<'b> {
  #[inline]
  pub(crate) const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, offset: 0 }
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = Result<RawChunk<'b>, PngError>;
  fn next(&mut self) -> Option<Self::Item> {
    if self.bytes.is_empty() {
      return None;
    }
    let offset = self.offset;
    let remaining = self.bytes.len();
    let truncated = |needed: usize| PngError::TruncatedChunk { offset, needed, remaining };
    let (len_bytes, rest) = match try_split_off_byte_array::<4>(self.bytes) {
      Some(x) => x,
      None => {
        self.bytes = &[];
        return Some(Err(truncated(12)));
      }
    };
    let length = u32::from_be_bytes(len_bytes);
    if length > MAX_CHUNK_LEN {
      self.bytes = &[];
      return Some(Err(PngError::ChunkLengthOverflow { offset, length: u64::from(length) }));
    }
    // the length fits in 31 bits, so this can't overflow any usize we support
    let needed = 12 + length as usize;
    if remaining < needed {
      self.bytes = &[];
      return Some(Err(truncated(needed)));
    }
    let (ty_bytes, rest) = try_split_off_byte_array::<4>(rest)?;
    let (data, rest) = rest.split_at(length as usize);
    let (crc_bytes, rest) = try_split_off_byte_array::<4>(rest)?;
    self.bytes = rest;
    self.offset += needed;
    Some(Ok(RawChunk {
      ty: ChunkType(ty_bytes),
      data,
      declared_crc: u32::from_be_bytes(crc_bytes),
      offset,
    }))
  }
}

/// Splits the chunk stream that follows the signature into chunks.
///
/// * Truncation (fewer than 12 bytes left, or a length that runs past the end)
///   fails with [`PngError::TruncatedChunk`] in strict mode. In lenient mode
///   the chunks collected so far are returned.
/// * A length above `2^31 - 1` fails with [`PngError::ChunkLengthOverflow`],
///   or ends a lenient parse.
/// * A CRC mismatch (when `validate_crc` is set) fails with
///   [`PngError::ChecksumMismatch`], or in lenient mode produces a
///   [`Chunk::Invalid`] and the parse moves on to the next chunk.
/// * A type tag that isn't four ASCII letters is handled the same way as a CRC
///   mismatch, with [`PngError::InvalidChunkType`]. The CRC is checked first,
///   so a damaged type byte is reported as a checksum mismatch.
///
/// Chunks are returned in file order.
pub fn parse_chunks(bytes: &[u8], options: ParseOptions) -> Result<Vec<Chunk<'_>>, PngError> {
  let mut out = Vec::new();
  for raw in RawChunkIter::new(bytes) {
    let raw = match raw {
      Ok(raw) => raw,
      Err(e) if options.strict_mode => {
        log::error!("{e}");
        return Err(e);
      }
      Err(e) => {
        log::warn!("stopping lenient parse: {e}");
        break;
      }
    };
    if options.validate_crc {
      let actual = chunk_crc(raw.ty.0, raw.data);
      if actual != raw.declared_crc {
        log::warn!(
          "{:?} at offset {}: declared CRC {:08x}, actual {actual:08x}",
          raw.ty,
          raw.offset,
          raw.declared_crc
        );
        if options.strict_mode {
          return Err(PngError::ChecksumMismatch {
            chunk: raw.ty,
            offset: raw.offset,
            declared: raw.declared_crc,
            actual,
          });
        }
        out.push(Chunk::Invalid(InvalidChunk {
          ty: raw.ty,
          offset: raw.offset,
          reason: InvalidReason::ChecksumMismatch { declared: raw.declared_crc, actual },
        }));
        continue;
      }
    }
    if !raw.ty.is_valid_tag() {
      if options.strict_mode {
        log::error!("invalid chunk type {:?} at offset {}", raw.ty, raw.offset);
        return Err(PngError::InvalidChunkType { offset: raw.offset, ty: raw.ty });
      }
      out.push(Chunk::Invalid(InvalidChunk {
        ty: raw.ty,
        offset: raw.offset,
        reason: InvalidReason::BadChunkType,
      }));
      continue;
    }
    out.push(Chunk::Valid(ValidChunk {
      ty: raw.ty,
      data: raw.data,
      crc32: raw.declared_crc,
      offset: raw.offset,
    }));
  }
  Ok(out)
}

/// All the valid chunks of the given type, in stream order.
pub fn find_chunks_by_type<'c, 'b>(
  chunks: &'c [Chunk<'b>], ty: ChunkType,
) -> impl Iterator<Item = &'c ValidChunk<'b>> + 'c {
  chunks.iter().filter_map(Chunk::as_valid).filter(move |c| c.ty == ty)
}

/// Checks the chunk ordering rules:
/// * exactly one `IHDR`, and it's first
/// * exactly one `IEND`, and it's last
/// * at least one `IDAT`, with all `IDAT` chunks next to each other
///
/// Invalid chunks still count by their type tag.
pub fn validate_chunk_structure(chunks: &[Chunk<'_>]) -> Result<(), PngError> {
  use StructureViolation::*;
  let fail = |v: StructureViolation| {
    log::error!("{v}");
    Err(PngError::StructuralViolation(v))
  };
  let (first, last) = match chunks {
    [] => return fail(NoChunks),
    [first, .., last] => (first.ty(), last.ty()),
    [only] => (only.ty(), only.ty()),
  };
  if first != ChunkType::IHDR {
    return fail(FirstChunkNotIhdr);
  }
  if chunks.iter().filter(|c| c.ty() == ChunkType::IHDR).count() != 1 {
    return fail(DuplicateIhdr);
  }
  if last != ChunkType::IEND {
    return fail(LastChunkNotIend);
  }
  if chunks.iter().filter(|c| c.ty() == ChunkType::IEND).count() != 1 {
    return fail(DuplicateIend);
  }
  let is_idat = |c: &Chunk<'_>| c.ty() == ChunkType::IDAT;
  let first_idat = match chunks.iter().position(is_idat) {
    Some(i) => i,
    None => return fail(MissingIdat),
  };
  let last_idat = chunks.iter().rposition(is_idat).unwrap_or(first_idat);
  if !chunks[first_idat..=last_idat].iter().all(is_idat) {
    return fail(NonContiguousIdat);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloc::vec;

  const IEND_BYTES: [u8; 12] = [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];

  fn fake(ty: ChunkType) -> Chunk<'static> {
    Chunk::Valid(ValidChunk { ty, data: &[], crc32: 0, offset: 0 })
  }

  #[test]
  fn test_parse_iend() {
    let chunks = parse_chunks(&IEND_BYTES, ParseOptions::default()).unwrap();
    assert_eq!(chunks.len(), 1);
    let iend = chunks[0].as_valid().unwrap();
    assert_eq!(iend.ty(), ChunkType::IEND);
    assert_eq!(iend.length(), 0);
    assert_eq!(iend.offset(), 0);
    assert!(chunks[0].is_valid());
  }

  #[test]
  fn test_parse_truncated() {
    for cut in 1..IEND_BYTES.len() {
      let bytes = &IEND_BYTES[..cut];
      assert!(matches!(
        parse_chunks(bytes, ParseOptions::default()),
        Err(PngError::TruncatedChunk { offset: 0, .. })
      ));
      assert_eq!(parse_chunks(bytes, ParseOptions::lenient()).unwrap(), vec![]);
    }
    // declared length runs past the end
    let mut long = IEND_BYTES;
    long[3] = 1;
    assert!(matches!(
      parse_chunks(&long, ParseOptions::default()),
      Err(PngError::TruncatedChunk { needed: 13, remaining: 12, .. })
    ));
  }

  #[test]
  fn test_parse_length_overflow() {
    let mut bytes = IEND_BYTES;
    bytes[0] = 0x80;
    assert!(matches!(
      parse_chunks(&bytes, ParseOptions::default()),
      Err(PngError::ChunkLengthOverflow { offset: 0, length: 0x8000_0000 })
    ));
    assert_eq!(parse_chunks(&bytes, ParseOptions::lenient()).unwrap(), vec![]);
  }

  #[test]
  fn test_lenient_keeps_earlier_chunks() {
    let mut bytes = vec![];
    bytes.extend_from_slice(&IEND_BYTES);
    bytes.extend_from_slice(&IEND_BYTES[..5]);
    let chunks = parse_chunks(&bytes, ParseOptions::lenient()).unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(parse_chunks(&bytes, ParseOptions::default()).is_err());
  }

  #[test]
  fn test_crc_skip() {
    let mut bytes = IEND_BYTES;
    bytes[11] ^= 1;
    let options = ParseOptions { strict_mode: true, validate_crc: false };
    let chunks = parse_chunks(&bytes, options).unwrap();
    assert!(chunks[0].is_valid());
    assert!(matches!(
      parse_chunks(&bytes, ParseOptions::default()),
      Err(PngError::ChecksumMismatch { declared: 0xAE42_6083, actual: 0xAE42_6082, .. })
    ));
  }

  #[test]
  fn test_bad_chunk_type() {
    // a non-letter tag with a CRC that matches it
    let mut bytes = IEND_BYTES;
    bytes[4] = b'1';
    bytes[8..].copy_from_slice(&chunk_crc(*b"1END", &[]).to_be_bytes());
    assert!(matches!(
      parse_chunks(&bytes, ParseOptions::default()),
      Err(PngError::InvalidChunkType { offset: 0, .. })
    ));
    let chunks = parse_chunks(&bytes, ParseOptions::lenient()).unwrap();
    match chunks[0] {
      Chunk::Invalid(i) => assert_eq!(i.reason(), InvalidReason::BadChunkType),
      Chunk::Valid(_) => panic!("expected an invalid chunk"),
    }
  }

  #[test]
  fn test_damaged_type_byte_is_a_checksum_mismatch() {
    for i in 4..8 {
      for mask in [0x01, 0x20, 0x80, 0xFF] {
        let mut bytes = IEND_BYTES;
        bytes[i] ^= mask;
        assert!(
          matches!(
            parse_chunks(&bytes, ParseOptions::default()),
            Err(PngError::ChecksumMismatch { offset: 0, declared: 0xAE42_6082, .. })
          ),
          "byte {i} ^ {mask:#04x}"
        );
        let chunks = parse_chunks(&bytes, ParseOptions::lenient()).unwrap();
        match chunks[..] {
          [Chunk::Invalid(c)] => {
            assert!(matches!(c.reason(), InvalidReason::ChecksumMismatch { .. }))
          }
          _ => panic!("byte {i} ^ {mask:#04x}: expected one invalid chunk"),
        }
      }
    }
    // without CRC checks the tag rule still applies
    let mut bytes = IEND_BYTES;
    bytes[7] ^= 0x80;
    let options = ParseOptions { strict_mode: true, validate_crc: false };
    assert!(matches!(parse_chunks(&bytes, options), Err(PngError::InvalidChunkType { .. })));
  }

  #[test]
  fn test_find_chunks_by_type() {
    let chunks = [
      fake(ChunkType::IHDR),
      fake(ChunkType::IDAT),
      Chunk::Invalid(InvalidChunk {
        ty: ChunkType::IDAT,
        offset: 7,
        reason: InvalidReason::BadChunkType,
      }),
      fake(ChunkType::IDAT),
      fake(ChunkType::IEND),
    ];
    assert_eq!(find_chunks_by_type(&chunks, ChunkType::IDAT).count(), 2);
    assert_eq!(find_chunks_by_type(&chunks, ChunkType::PLTE).count(), 0);
  }

  #[test]
  fn test_validate_chunk_structure() {
    use ChunkType as T;
    use StructureViolation::*;
    let check = |tys: &[ChunkType]| {
      let chunks: Vec<Chunk<'_>> = tys.iter().copied().map(fake).collect();
      match validate_chunk_structure(&chunks) {
        Ok(()) => None,
        Err(PngError::StructuralViolation(v)) => Some(v),
        Err(e) => panic!("unexpected error {e:?}"),
      }
    };
    assert_eq!(check(&[T::IHDR, T::IDAT, T::IEND]), None);
    assert_eq!(check(&[T::IHDR, T::tEXt, T::IDAT, T::IDAT, T::tEXt, T::IEND]), None);
    assert_eq!(check(&[]), Some(NoChunks));
    assert_eq!(check(&[T::tEXt, T::IHDR, T::IDAT, T::IEND]), Some(FirstChunkNotIhdr));
    assert_eq!(check(&[T::IHDR, T::IHDR, T::IDAT, T::IEND]), Some(DuplicateIhdr));
    assert_eq!(check(&[T::IHDR, T::IDAT, T::IEND, T::tEXt]), Some(LastChunkNotIend));
    assert_eq!(check(&[T::IHDR, T::IEND, T::IDAT, T::IEND]), Some(DuplicateIend));
    assert_eq!(check(&[T::IHDR, T::tEXt, T::IEND]), Some(MissingIdat));
    assert_eq!(check(&[T::IHDR, T::IDAT, T::tEXt, T::IDAT, T::IEND]), Some(NonContiguousIdat));
    // every reason reads differently
    let reasons = [
      FirstChunkNotIhdr,
      DuplicateIhdr,
      LastChunkNotIend,
      DuplicateIend,
      MissingIdat,
      NonContiguousIdat,
    ];
    for (i, a) in reasons.iter().enumerate() {
      for b in &reasons[i + 1..] {
        assert_ne!(alloc::format!("{a}"), alloc::format!("{b}"));
      }
    }
  }
}
