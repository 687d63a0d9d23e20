//! Key/value text metadata: `tEXt`, `zTXt`, and `iTXt`.
//!
//! * `tEXt` is `keyword \0 text`, both Latin-1.
//! * `zTXt` is `keyword \0 method text`, with the Latin-1 text zlib compressed.
//! * `iTXt` is `keyword \0 flag method language \0 translated_keyword \0 text`,
//!   with UTF-8 text that's compressed when the flag is 1.
//!
//! Keywords are always Latin-1, 1 to 79 bytes, printable, with no leading,
//! trailing, or doubled spaces.

use alloc::{
  collections::BTreeMap,
  string::{String, ToString},
  vec::Vec,
};

use super::{idat::ZlibCodec, ChunkType, ValidChunk};
use crate::{error::PngError, parser_helpers::split_at_null};

/// Text metadata, keyword to text.
///
/// The map is ordered, so encoding the same metadata always writes the chunks
/// in the same order.
pub type Metadata = BTreeMap<String, String>;

/// The longest allowed keyword, in bytes.
pub const MAX_KEYWORD_LEN: usize = 79;

/// The most bytes a compressed text entry may inflate to.
pub const MAX_TEXT_LEN: usize = 1 << 24;

#[inline]
const fn is_printable_latin1(b: u8) -> bool {
  matches!(b, 32..=126 | 161..=255)
}

/// Checks a keyword that's already in Latin-1 bytes.
#[must_use]
pub fn is_valid_keyword(keyword: &[u8]) -> bool {
  (1..=MAX_KEYWORD_LEN).contains(&keyword.len())
    && keyword.iter().copied().all(is_printable_latin1)
    && keyword.first() != Some(&b' ')
    && keyword.last() != Some(&b' ')
    && !keyword.windows(2).any(|w| w == b"  ")
}

/// Converts to Latin-1, if every char fits in one byte.
fn to_latin1(s: &str) -> Option<Vec<u8>> {
  s.chars().map(|c| u8::try_from(c).ok()).collect()
}

fn from_latin1(bytes: &[u8]) -> String {
  bytes.iter().copied().map(char::from).collect()
}

fn keyword_bytes(keyword: &str) -> Result<Vec<u8>, PngError> {
  match to_latin1(keyword) {
    Some(bytes) if is_valid_keyword(&bytes) => Ok(bytes),
    _ => {
      log::warn!("invalid text keyword {keyword:?}");
      Err(PngError::InvalidKeyword)
    }
  }
}

/// Builds the chunk for one metadata entry.
///
/// Text that's Latin-1 (and has no null bytes) goes in a `tEXt`. Anything else
/// goes in an uncompressed `iTXt` as UTF-8.
pub fn encode_text_chunk(keyword: &str, text: &str) -> Result<(ChunkType, Vec<u8>), PngError> {
  let mut data = keyword_bytes(keyword)?;
  data.push(0);
  match to_latin1(text) {
    Some(latin1) if !latin1.contains(&0) => {
      data.extend_from_slice(&latin1);
      Ok((ChunkType::tEXt, data))
    }
    _ => {
      // not compressed, method 0, empty language tag, empty translated keyword
      data.extend_from_slice(&[0, 0, 0, 0]);
      data.extend_from_slice(text.as_bytes());
      Ok((ChunkType::iTXt, data))
    }
  }
}

/// Builds the chunks for a whole metadata map, in key order.
pub fn encode_text_chunks(metadata: &Metadata) -> Result<Vec<(ChunkType, Vec<u8>)>, PngError> {
  metadata.iter().map(|(k, v)| encode_text_chunk(k, v)).collect()
}

/// Reads one `tEXt`, `zTXt`, or `iTXt` chunk into a keyword and text.
///
/// Compressed text is inflated with `codec`, up to [`MAX_TEXT_LEN`] bytes.
pub fn decode_text_chunk<Z: ZlibCodec + ?Sized>(
  ty: ChunkType, data: &[u8], codec: &Z,
) -> Result<(String, String), PngError> {
  let malformed = || {
    log::warn!("malformed {ty:?} chunk of {} bytes", data.len());
    PngError::InvalidTextChunk(ty)
  };
  let (keyword, rest) = split_at_null(data).ok_or_else(malformed)?;
  if !is_valid_keyword(keyword) {
    log::warn!("{ty:?} chunk has an invalid keyword");
    return Err(PngError::InvalidKeyword);
  }
  let inflate = |zlib: &[u8]| codec.decompress(zlib, MAX_TEXT_LEN).map_err(|_| malformed());
  let text = match ty {
    ChunkType::tEXt => from_latin1(rest),
    ChunkType::zTXt => match rest {
      [0, zlib @ ..] => from_latin1(&inflate(zlib)?),
      _ => return Err(malformed()),
    },
    ChunkType::iTXt => {
      let (flag, method, rest) = match rest {
        [flag, method, rest @ ..] => (*flag, *method, rest),
        _ => return Err(malformed()),
      };
      let (_language, rest) = split_at_null(rest).ok_or_else(malformed)?;
      let (_translated, text) = split_at_null(rest).ok_or_else(malformed)?;
      let text = match (flag, method) {
        (0, _) => text.to_vec(),
        (1, 0) => inflate(text)?,
        _ => return Err(malformed()),
      };
      String::from_utf8(text).map_err(|_| malformed())?
    }
    _ => return Err(malformed()),
  };
  Ok((from_latin1(keyword), text))
}

/// Collects every text chunk into a [`Metadata`] map.
///
/// Chunks of other types are skipped. When a keyword repeats, the later chunk
/// wins.
pub fn decode_text_chunks<'c, 'b: 'c, Z, I>(chunks: I, codec: &Z) -> Result<Metadata, PngError>
where
  Z: ZlibCodec + ?Sized,
  I: IntoIterator<Item = &'c ValidChunk<'b>>,
{
  let mut out = Metadata::new();
  for chunk in chunks {
    if matches!(chunk.ty(), ChunkType::tEXt | ChunkType::zTXt | ChunkType::iTXt) {
      let (keyword, text) = decode_text_chunk(chunk.ty(), chunk.data(), codec)?;
      if out.contains_key(&keyword) {
        log::debug!("text keyword {keyword:?} repeats, keeping the later one");
      }
      out.insert(keyword, text);
    }
  }
  Ok(out)
}

/// Shorthand for building a [`Metadata`] map.
pub fn metadata_from<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Metadata
where
  K: ToString,
  V: ToString,
{
  pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
