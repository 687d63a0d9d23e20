use alloc::{vec, vec::Vec};

use super::*;
use crate::error::{PngError, Stage, StreamProblem};

/// A "zlib" that doesn't compress at all, so these tests work without any
/// compression feature.
struct Passthrough;
impl ZlibCodec for Passthrough {
  fn compress(&self, data: &[u8], _level: u8) -> Vec<u8> {
    data.to_vec()
  }
  fn decompress(&self, zlib: &[u8], limit: usize) -> Result<Vec<u8>, StreamProblem> {
    if zlib.len() > limit {
      Err(StreamProblem::TooMuchData { expected: limit })
    } else {
      Ok(zlib.to_vec())
    }
  }
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
  let mut out = Vec::new();
  for y in 0..height {
    for x in 0..width {
      out.extend_from_slice(&[(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8, 255 - (x + y) as u8]);
    }
  }
  out
}

#[test]
fn test_pipeline_round_trip_all_strategies() {
  let mut strategies = vec![FilterStrategy::Optimal];
  strategies.extend(FilterType::ALL.map(FilterStrategy::Fixed));
  for (width, height) in [(1, 1), (1, 5), (5, 1), (3, 4), (17, 9)] {
    let pixels = gradient(width, height);
    for &filter_strategy in &strategies {
      let options =
        EncodeOptions { filter_strategy, max_chunk_size: 10, ..EncodeOptions::default() };
      let png = encode_with(&pixels, width, height, &options, &Passthrough, &mut ()).unwrap();
      let out = decode_with(&png, &Passthrough, &mut ()).unwrap();
      assert_eq!((out.width, out.height), (width, height));
      assert_eq!(out.pixels, pixels, "{width}x{height} {filter_strategy:?}");
    }
  }
}

#[test]
fn test_decode_stage_order() {
  let png = encode_with(&gradient(2, 2), 2, 2, &EncodeOptions::default(), &Passthrough, &mut ())
    .unwrap();
  let mut stages = vec![];
  let mut rows = 0;
  let mut obs = FnObserver(|e: CodecEvent<'_>| match e {
    CodecEvent::StageStarted(s) => stages.push(s),
    CodecEvent::RowUnfiltered { .. } => rows += 1,
    _ => (),
  });
  decode_with(&png, &Passthrough, &mut obs).unwrap();
  assert_eq!(
    stages,
    [
      Stage::Signature,
      Stage::ChunkParsing,
      Stage::ChunkStructure,
      Stage::Header,
      Stage::Metadata,
      Stage::Decompression,
      Stage::Unfiltering,
      Stage::Expansion,
    ]
  );
  assert_eq!(rows, 2);
}

#[test]
fn test_encode_events() {
  let mut written = vec![];
  let mut compressed = None;
  let mut obs = FnObserver(|e: CodecEvent<'_>| match e {
    CodecEvent::ChunkWritten { ty, len } => written.push((ty, len)),
    CodecEvent::StreamCompressed { chunks, .. } => compressed = Some(chunks),
    _ => (),
  });
  let options = EncodeOptions { max_chunk_size: 6, ..EncodeOptions::default() };
  // 1x2 RGBA is 2 * (4 + 1) = 10 filtered bytes, so two IDATs
  encode_with(&[0; 8], 1, 2, &options, &Passthrough, &mut obs).unwrap();
  assert_eq!(compressed, Some(2));
  assert_eq!(
    written,
    [(ChunkType::IHDR, 13), (ChunkType::IDAT, 6), (ChunkType::IDAT, 4), (ChunkType::IEND, 0)]
  );
}

/// Packs an image by hand in any format, filtered with all-`None` rows.
fn handmade(ihdr: IHDR, extra: &[(ChunkType, &[u8])], rows: &[&[u8]]) -> Vec<u8> {
  let header = encode_header(&ihdr).unwrap();
  let filtered: Vec<u8> =
    rows.iter().flat_map(|row| core::iter::once(&0).chain(row.iter())).copied().collect();
  let mut chunks = vec![(ChunkType::IHDR, &header[..])];
  chunks.extend_from_slice(extra);
  chunks.push((ChunkType::IDAT, &filtered[..]));
  chunks.push((ChunkType::IEND, &[]));
  write_stream(chunks).unwrap()
}

#[test]
fn test_decode_every_format() {
  let ihdr = |color_type, bit_depth| IHDR { bit_depth, color_type, ..IHDR::rgba8(2, 1) };
  let check = |png: Vec<u8>, expected: [u8; 8]| {
    let out = decode_with(&png, &Passthrough, &mut ()).unwrap();
    assert_eq!(out.pixels, expected);
  };
  use PngColorType as C;
  check(handmade(ihdr(C::Y, 1), &[], &[&[0b1000_0000]]), [255, 255, 255, 255, 0, 0, 0, 255]);
  check(handmade(ihdr(C::Y, 2), &[], &[&[0b0110_0000]]), [85, 85, 85, 255, 170, 170, 170, 255]);
  check(handmade(ihdr(C::Y, 4), &[], &[&[0xF0]]), [255, 255, 255, 255, 0, 0, 0, 255]);
  check(handmade(ihdr(C::Y, 8), &[], &[&[9, 200]]), [9, 9, 9, 255, 200, 200, 200, 255]);
  check(handmade(ihdr(C::Y, 16), &[], &[&[1, 2, 3, 4]]), [1, 1, 1, 255, 3, 3, 3, 255]);
  let key: (ChunkType, &[u8]) = (ChunkType::tRNS, &[0, 4, 0, 5, 0, 6]);
  check(handmade(ihdr(C::RGB, 8), &[key], &[&[1, 2, 3, 4, 5, 6]]), [1, 2, 3, 255, 4, 5, 6, 0]);
  check(
    handmade(ihdr(C::RGB, 16), &[], &[&[1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0]]),
    [1, 2, 3, 255, 4, 5, 6, 255],
  );
  check(handmade(ihdr(C::YA, 8), &[], &[&[1, 2, 3, 4]]), [1, 1, 1, 2, 3, 3, 3, 4]);
  check(handmade(ihdr(C::YA, 16), &[], &[&[1, 0, 2, 0, 3, 0, 4, 0]]), [1, 1, 1, 2, 3, 3, 3, 4]);
  let rgba = [1, 2, 3, 4, 5, 6, 7, 8];
  check(handmade(ihdr(C::RGBA, 8), &[], &[&rgba]), rgba);
  let plte: (ChunkType, &[u8]) = (ChunkType::PLTE, &[10, 11, 12, 20, 21, 22]);
  let two_colors = [10, 11, 12, 255, 20, 21, 22, 255];
  check(handmade(ihdr(C::Index, 1), &[plte], &[&[0b0100_0000]]), two_colors);
  check(handmade(ihdr(C::Index, 4), &[plte], &[&[0x10]]), [20, 21, 22, 255, 10, 11, 12, 255]);
}

#[test]
fn test_decode_ignores_unknown_ancillary_chunks() {
  let ihdr = IHDR::rgba8(1, 1);
  let extra: [(ChunkType, &[u8]); 2] =
    [(ChunkType(*b"gAMA"), &[0, 0, 177, 143]), (ChunkType(*b"prVt"), &[1])];
  let out = decode_with(&handmade(ihdr, &extra, &[&[1, 2, 3, 4]]), &Passthrough, &mut ()).unwrap();
  assert_eq!(out.pixels, [1, 2, 3, 4]);
}

#[test]
fn test_lenient_parse_of_damaged_stream() {
  let png = encode_with(&gradient(3, 3), 3, 3, &EncodeOptions::default(), &Passthrough, &mut ())
    .unwrap();
  let body = &png[8..];
  // flip one byte inside the IHDR data (offset 0 is IHDR's length field)
  let mut damaged = body.to_vec();
  damaged[10] ^= 0x40;
  let chunks = parse_chunks(&damaged, ParseOptions::lenient()).unwrap();
  assert!(!chunks[0].is_valid());
  assert!(chunks[1..].iter().all(Chunk::is_valid));
  assert!(matches!(
    parse_chunks(&damaged, ParseOptions::default()),
    Err(PngError::ChecksumMismatch { chunk: ChunkType::IHDR, offset: 0, .. })
  ));
  // invalid chunks still count for ordering
  validate_chunk_structure(&chunks).unwrap();
}
