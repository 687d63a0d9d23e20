//! Framing the filtered image stream into `IDAT` chunks and back.
//!
//! All the `IDAT` chunks of an image hold a single zlib stream, split at
//! arbitrary byte boundaries. The split points carry no meaning.

use alloc::vec::Vec;

use super::MAX_CHUNK_LEN;
use crate::error::{PngError, StreamProblem};

/// The highest zlib compression level.
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

/// The zlib compressor and decompressor the codec hands its data to.
///
/// The codec never implements DEFLATE itself. Any implementation works as long
/// as it produces and accepts standard zlib streams (RFC 1950).
pub trait ZlibCodec {
  /// Compresses `data` into one zlib stream at `level` (0 through 9).
  fn compress(&self, data: &[u8], level: u8) -> Vec<u8>;

  /// Inflates one zlib stream.
  ///
  /// Output past `limit` bytes must be refused with
  /// [`StreamProblem::TooMuchData`] rather than allocated.
  fn decompress(&self, zlib: &[u8], limit: usize) -> Result<Vec<u8>, StreamProblem>;
}

impl<Z: ZlibCodec + ?Sized> ZlibCodec for &Z {
  #[inline]
  fn compress(&self, data: &[u8], level: u8) -> Vec<u8> {
    (**self).compress(data, level)
  }
  #[inline]
  fn decompress(&self, zlib: &[u8], limit: usize) -> Result<Vec<u8>, StreamProblem> {
    (**self).decompress(zlib, limit)
  }
}

/// [`ZlibCodec`] backed by `miniz_oxide`.
#[cfg(feature = "miniz_oxide")]
#[cfg_attr(docs_rs, doc(cfg(feature = "miniz_oxide")))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MinizCodec;
#[cfg(feature = "miniz_oxide")]
impl ZlibCodec for MinizCodec {
  #[inline]
  fn compress(&self, data: &[u8], level: u8) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, level.min(MAX_COMPRESSION_LEVEL))
  }
  fn decompress(&self, zlib: &[u8], limit: usize) -> Result<Vec<u8>, StreamProblem> {
    use miniz_oxide::inflate::TINFLStatus;
    miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(zlib, limit).map_err(|e| {
      log::warn!("zlib inflate stopped with {:?} after {} bytes", e.status, e.output.len());
      match e.status {
        TINFLStatus::HasMoreOutput => StreamProblem::TooMuchData { expected: limit },
        _ => StreamProblem::Inflate,
      }
    })
  }
}

/// Compresses the whole filtered buffer as one zlib stream, then slices the
/// compressed bytes into `IDAT` payloads of at most `max_chunk_size` bytes,
/// in order.
pub fn frame_for_write<Z: ZlibCodec + ?Sized>(
  filtered: &[u8], level: u8, max_chunk_size: usize, codec: &Z,
) -> Result<Vec<Vec<u8>>, PngError> {
  if level > MAX_COMPRESSION_LEVEL {
    return Err(PngError::InvalidCompressionLevel(level));
  }
  if max_chunk_size == 0 || max_chunk_size > MAX_CHUNK_LEN as usize {
    return Err(PngError::InvalidChunkSize(max_chunk_size));
  }
  let compressed = codec.compress(filtered, level);
  Ok(compressed.chunks(max_chunk_size).map(<[u8]>::to_vec).collect())
}

/// Concatenates the `IDAT` payloads in file order and inflates them to
/// exactly `expected_len` bytes.
///
/// Any other size is [`PngError::CorruptStream`].
pub fn frame_for_read<'a, Z, I>(
  payloads: I, expected_len: usize, codec: &Z,
) -> Result<Vec<u8>, PngError>
where
  Z: ZlibCodec + ?Sized,
  I: IntoIterator<Item = &'a [u8]>,
{
  let zlib: Vec<u8> = payloads.into_iter().flatten().copied().collect();
  let filtered = codec.decompress(&zlib, expected_len).map_err(PngError::CorruptStream)?;
  if filtered.len() != expected_len {
    log::warn!("IDAT inflated to {} bytes, expected {expected_len}", filtered.len());
    return Err(PngError::CorruptStream(StreamProblem::SizeMismatch {
      expected: expected_len,
      actual: filtered.len(),
    }));
  }
  Ok(filtered)
}
