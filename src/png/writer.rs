use alloc::vec::Vec;

use super::*;
use crate::error::PngError;

/// Appends one serialized chunk (length, type, data, CRC) to `out`.
///
/// Fails with [`PngError::ChunkLengthOverflow`] if the data is longer than
/// `2^31 - 1` bytes. Nothing is written in that case.
pub fn write_chunk(out: &mut Vec<u8>, ty: ChunkType, data: &[u8]) -> Result<(), PngError> {
  let length = match u32::try_from(data.len()) {
    Ok(len) if len <= MAX_CHUNK_LEN => len,
    _ => {
      log::error!("can't write a {ty:?} chunk of {} bytes", data.len());
      return Err(PngError::ChunkLengthOverflow { offset: out.len(), length: data.len() as u64 });
    }
  };
  out.reserve(12 + data.len());
  out.extend_from_slice(&length.to_be_bytes());
  out.extend_from_slice(&ty.0);
  out.extend_from_slice(data);
  out.extend_from_slice(&chunk_crc(ty.0, data).to_be_bytes());
  Ok(())
}

/// Builds a complete PNG stream: the signature, then each chunk in the order
/// given.
///
/// No ordering rules are checked here. Parsing the output (minus the
/// signature) with CRC checks on gives back the same chunks.
pub fn write_stream<'a, I>(chunks: I) -> Result<Vec<u8>, PngError>
where
  I: IntoIterator<Item = (ChunkType, &'a [u8])>,
{
  let mut out = Vec::from(signature_bytes());
  for (ty, data) in chunks {
    write_chunk(&mut out, ty, data)?;
  }
  Ok(out)
}
