use alloc::vec::Vec;

use super::*;
use crate::error::{at, CodecError, PngError, Stage};

/// Settings for [`encode_with`] (and `encode`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
  /// zlib level, 0 (store) through 9 (smallest). Default 6.
  pub compression_level: u8,
  /// Default [`FilterStrategy::Optimal`].
  pub filter_strategy: FilterStrategy,
  /// The most compressed bytes per `IDAT` chunk. Default 64 KiB.
  pub max_chunk_size: usize,
  /// Written as text chunks between `IHDR` and the image data.
  pub metadata: Metadata,
}
impl Default for EncodeOptions {
  #[inline]
  fn default() -> Self {
    Self {
      compression_level: 6,
      filter_strategy: FilterStrategy::Optimal,
      max_chunk_size: 65536,
      metadata: Metadata::new(),
    }
  }
}
impl EncodeOptions {
  /// Checks the numeric settings.
  pub fn validate(&self) -> Result<(), PngError> {
    if self.compression_level > MAX_COMPRESSION_LEVEL {
      return Err(PngError::InvalidCompressionLevel(self.compression_level));
    }
    if self.max_chunk_size == 0 || self.max_chunk_size > MAX_CHUNK_LEN as usize {
      return Err(PngError::InvalidChunkSize(self.max_chunk_size));
    }
    Ok(())
  }
}

/// Encodes RGBA8 pixels (row-major, top row first) as a PNG.
///
/// Progress goes to the `log` facade, and compression uses `miniz_oxide`.
#[cfg(feature = "miniz_oxide")]
#[cfg_attr(docs_rs, doc(cfg(feature = "miniz_oxide")))]
pub fn encode(
  pixels: &[u8], width: u32, height: u32, options: &EncodeOptions,
) -> Result<Vec<u8>, CodecError> {
  encode_with(pixels, width, height, options, &MinizCodec, &mut LogObserver)
}

/// Encodes RGBA8 pixels as a PNG, with a caller-provided compressor and
/// observer.
///
/// The output is always 8-bit RGBA, not interlaced, with chunks in the order
/// `IHDR`, text, `IDAT`..., `IEND`.
pub fn encode_with<Z, O>(
  pixels: &[u8], width: u32, height: u32, options: &EncodeOptions, codec: &Z, observer: &mut O,
) -> Result<Vec<u8>, CodecError>
where
  Z: ZlibCodec + ?Sized,
  O: CodecObserver + ?Sized,
{
  observer.on_event(CodecEvent::StageStarted(Stage::Options));
  options.validate().map_err(at(Stage::Options))?;

  observer.on_event(CodecEvent::StageStarted(Stage::Header));
  let ihdr = IHDR::rgba8(width, height);
  let ihdr_bytes = encode_header(&ihdr).map_err(at(Stage::Header))?;
  let line_len = ihdr.bytes_per_scanline().map_err(at(Stage::Header))?;
  let expected = line_len
    .checked_mul(height as usize)
    .ok_or(PngError::ImageTooLarge)
    .map_err(at(Stage::Header))?;
  if pixels.len() != expected {
    log::error!("{width}x{height} RGBA8 needs {expected} bytes, got {}", pixels.len());
    return Err(CodecError::new(
      Stage::Header,
      PngError::PixelSizeMismatch { expected, actual: pixels.len() },
    ));
  }

  observer.on_event(CodecEvent::StageStarted(Stage::Filtering));
  let bpp = ihdr.filter_bytes_per_pixel();
  let filtered = filter_lines(
    pixels,
    line_len,
    height,
    bpp,
    options.filter_strategy,
    &SumOfAbsDiff,
    &mut *observer,
  )
  .map_err(at(Stage::Filtering))?;

  observer.on_event(CodecEvent::StageStarted(Stage::Compression));
  let idats =
    frame_for_write(&filtered, options.compression_level, options.max_chunk_size, codec)
      .map_err(at(Stage::Compression))?;
  observer.on_event(CodecEvent::StreamCompressed {
    filtered_len: filtered.len(),
    compressed_len: idats.iter().map(Vec::len).sum(),
    chunks: idats.len(),
  });

  observer.on_event(CodecEvent::StageStarted(Stage::Metadata));
  let texts = encode_text_chunks(&options.metadata).map_err(at(Stage::Metadata))?;
  for (keyword, text) in &options.metadata {
    observer.on_event(CodecEvent::MetadataEntry { keyword, text_len: text.len() });
  }

  observer.on_event(CodecEvent::StageStarted(Stage::Assembly));
  let chunks = core::iter::once((ChunkType::IHDR, &ihdr_bytes[..]))
    .chain(texts.iter().map(|(ty, data)| (*ty, data.as_slice())))
    .chain(idats.iter().map(|data| (ChunkType::IDAT, data.as_slice())))
    .chain(core::iter::once((ChunkType::IEND, &[][..])))
    .inspect(|&(ty, data)| observer.on_event(CodecEvent::ChunkWritten { ty, len: data.len() }));
  write_stream(chunks).map_err(at(Stage::Assembly))
}
