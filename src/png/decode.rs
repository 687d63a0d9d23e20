use alloc::vec::Vec;

use super::*;
use crate::{
  error::{at, CodecError, PngError, Stage, StructureViolation},
  pixel_formats::RGBA8,
};

/// A decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPng {
  /// RGBA8 pixels, row-major, top row first: `width * height * 4` bytes.
  pub pixels: Vec<u8>,
  pub width: u32,
  pub height: u32,
  /// Everything from the `tEXt`, `zTXt`, and `iTXt` chunks.
  pub metadata: Metadata,
  /// The header as stored, before expansion to RGBA8.
  pub header: IHDR,
}
impl DecodedPng {
  /// The pixels as [`RGBA8`] values.
  #[inline]
  #[must_use]
  pub fn rgba8(&self) -> &[RGBA8] {
    bytemuck::cast_slice(&self.pixels)
  }
}

/// Decodes a PNG stream to RGBA8 pixels plus its text metadata.
///
/// Progress goes to the `log` facade, and decompression uses `miniz_oxide`.
#[cfg(feature = "miniz_oxide")]
#[cfg_attr(docs_rs, doc(cfg(feature = "miniz_oxide")))]
pub fn decode(bytes: &[u8]) -> Result<DecodedPng, CodecError> {
  decode_with(bytes, &MinizCodec, &mut LogObserver)
}

/// Decodes a PNG stream with a caller-provided decompressor and observer.
///
/// Every color type and bit depth is accepted and expanded to RGBA8.
/// Interlaced images fail with [`PngError::InterlaceNotSupported`].
pub fn decode_with<Z, O>(
  bytes: &[u8], codec: &Z, observer: &mut O,
) -> Result<DecodedPng, CodecError>
where
  Z: ZlibCodec + ?Sized,
  O: CodecObserver + ?Sized,
{
  observer.on_event(CodecEvent::StageStarted(Stage::Signature));
  if !validate_signature(bytes) {
    log::error!("not a PNG: bad signature");
    return Err(CodecError::new(Stage::Signature, PngError::InvalidSignature));
  }

  observer.on_event(CodecEvent::StageStarted(Stage::ChunkParsing));
  let chunks = parse_chunks(&bytes[PNG_SIGNATURE.len()..], ParseOptions::default())
    .map_err(at(Stage::ChunkParsing))?;

  observer.on_event(CodecEvent::StageStarted(Stage::ChunkStructure));
  validate_chunk_structure(&chunks).map_err(at(Stage::ChunkStructure))?;

  observer.on_event(CodecEvent::StageStarted(Stage::Header));
  let ihdr = find_chunks_by_type(&chunks, ChunkType::IHDR)
    .next()
    .ok_or(PngError::StructuralViolation(StructureViolation::FirstChunkNotIhdr))
    .and_then(|c| decode_header(c.data()))
    .map_err(at(Stage::Header))?;
  if ihdr.is_interlaced {
    log::error!("interlaced PNGs are not supported");
    return Err(CodecError::new(Stage::Header, PngError::InterlaceNotSupported));
  }

  check_palette_and_transparency(&chunks).map_err(at(Stage::ChunkStructure))?;
  let position = |ty: ChunkType| chunks.iter().position(|c| c.ty() == ty);
  let palette = match (position(ChunkType::PLTE), position(ChunkType::IDAT)) {
    (Some(p), Some(i)) if p < i => {
      let data = chunks[p].as_valid().map(ValidChunk::data).unwrap_or_default();
      Some(Palette::parse(data).map_err(at(Stage::Expansion))?)
    }
    _ if ihdr.color_type == PngColorType::Index => {
      log::error!("indexed PNG without a PLTE chunk before its image data");
      return Err(CodecError::new(
        Stage::ChunkStructure,
        PngError::StructuralViolation(StructureViolation::MissingPalette),
      ));
    }
    (Some(_), _) => {
      log::warn!("ignoring a PLTE chunk after the image data");
      None
    }
    _ => None,
  };
  let transparency = match find_chunks_by_type(&chunks, ChunkType::tRNS).next() {
    Some(_) if ihdr.has_alpha() => {
      log::warn!("ignoring tRNS in an image that already has alpha");
      None
    }
    Some(t) => Some(
      Transparency::parse(ihdr.color_type, t.data(), palette.map_or(0, |p| p.len()))
        .map_err(at(Stage::Expansion))?,
    ),
    None => None,
  };

  observer.on_event(CodecEvent::StageStarted(Stage::Metadata));
  let metadata = decode_text_chunks(chunks.iter().filter_map(Chunk::as_valid), codec)
    .map_err(at(Stage::Metadata))?;
  for (keyword, text) in &metadata {
    observer.on_event(CodecEvent::MetadataEntry { keyword, text_len: text.len() });
  }

  observer.on_event(CodecEvent::StageStarted(Stage::Decompression));
  let expected = ihdr.filtered_buffer_len().map_err(at(Stage::Decompression))?;
  let idats = find_chunks_by_type(&chunks, ChunkType::IDAT).map(ValidChunk::data);
  let compressed_len =
    find_chunks_by_type(&chunks, ChunkType::IDAT).map(|c| c.data().len()).sum();
  let filtered = frame_for_read(idats, expected, codec).map_err(at(Stage::Decompression))?;
  let filtered_len = filtered.len();
  observer.on_event(CodecEvent::StreamDecompressed { compressed_len, filtered_len });

  observer.on_event(CodecEvent::StageStarted(Stage::Unfiltering));
  let line_len = ihdr.bytes_per_scanline().map_err(at(Stage::Unfiltering))?;
  let bpp = ihdr.filter_bytes_per_pixel();
  let raw = unfilter_lines(&filtered, line_len, ihdr.height, bpp, &mut *observer)
    .map_err(at(Stage::Unfiltering))?;

  observer.on_event(CodecEvent::StageStarted(Stage::Expansion));
  let pixels = expand_to_rgba8(&raw, &ihdr, palette, transparency).map_err(at(Stage::Expansion))?;

  Ok(DecodedPng {
    pixels: bytemuck::allocation::cast_vec(pixels),
    width: ihdr.width,
    height: ihdr.height,
    metadata,
    header: ihdr,
  })
}

/// `PLTE` and `tRNS` may each appear once, and `tRNS` goes after `PLTE` and
/// before the image data.
fn check_palette_and_transparency(chunks: &[Chunk<'_>]) -> Result<(), PngError> {
  use StructureViolation::*;
  let count = |ty: ChunkType| chunks.iter().filter(|c| c.ty() == ty).count();
  let position = |ty: ChunkType| chunks.iter().position(|c| c.ty() == ty);
  let problem = if count(ChunkType::PLTE) > 1 {
    Some(DuplicatePalette)
  } else if count(ChunkType::tRNS) > 1 {
    Some(DuplicateTransparency)
  } else {
    match (position(ChunkType::PLTE), position(ChunkType::tRNS), position(ChunkType::IDAT)) {
      (_, Some(t), Some(i)) if t > i => Some(MisplacedTransparency),
      (Some(p), Some(t), _) if t < p => Some(MisplacedTransparency),
      _ => None,
    }
  };
  match problem {
    Some(v) => {
      log::error!("{v}");
      Err(PngError::StructuralViolation(v))
    }
    None => Ok(()),
  }
}
