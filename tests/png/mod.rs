use std::io::Cursor;

use pngcodec::{
  png::{
    decode, encode, parse_chunks, validate_chunk_structure, Chunk, ChunkType, EncodeOptions,
    FilterStrategy, FilterType, InvalidReason, ParseOptions, PNG_SIGNATURE,
  },
  PngError, Stage,
};
use walkdir::WalkDir;

#[test]
fn test_parse_chunks_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    let body = v.strip_prefix(&PNG_SIGNATURE[..]).unwrap_or(&v);
    let _ = parse_chunks(body, ParseOptions::lenient());
    let _ = parse_chunks(body, ParseOptions::default());
    let _ = decode(&v);
  }
  // even totally random data should never panic the parser!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    let _ = parse_chunks(&v, ParseOptions::lenient());
    let mut with_sig = PNG_SIGNATURE.to_vec();
    with_sig.extend_from_slice(&v);
    let _ = decode(&with_sig);
  }
}

#[test]
fn test_random_round_trips() {
  let strategies = [
    FilterStrategy::Optimal,
    FilterStrategy::Fixed(FilterType::None),
    FilterStrategy::Fixed(FilterType::Paeth),
  ];
  for round in 0..12 {
    let dims = super::rand_bytes(2);
    let width = u32::from(dims[0] % 40) + 1;
    let height = u32::from(dims[1] % 40) + 1;
    let pixels = super::rand_bytes((width * height * 4) as usize);
    let options = EncodeOptions {
      compression_level: (round % 10) as u8,
      filter_strategy: strategies[round % strategies.len()],
      max_chunk_size: 1 + round * 97,
      ..EncodeOptions::default()
    };
    let png = encode(&pixels, width, height, &options).unwrap();
    let out = decode(&png).unwrap();
    assert_eq!((out.width, out.height), (width, height));
    assert_eq!(out.pixels, pixels, "{width}x{height} {options:?}");
  }
}

#[test]
fn test_two_by_two_with_metadata() {
  let pixels = [255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255];
  let options = EncodeOptions {
    metadata: pngcodec::png::metadata_from([("Title", "Test"), ("Comment", "ü ✓")]),
    ..EncodeOptions::default()
  };
  let png = encode(&pixels, 2, 2, &options).unwrap();
  assert_eq!(png[..8], PNG_SIGNATURE);
  let chunks = parse_chunks(&png[8..], ParseOptions::default()).unwrap();
  validate_chunk_structure(&chunks).unwrap();
  let types: Vec<ChunkType> = chunks.iter().map(Chunk::ty).collect();
  assert_eq!(
    types,
    [ChunkType::IHDR, ChunkType::iTXt, ChunkType::tEXt, ChunkType::IDAT, ChunkType::IEND]
  );
  let out = decode(&png).unwrap();
  assert_eq!(out.pixels, pixels);
  assert_eq!(out.metadata, options.metadata);
  assert_eq!(out.rgba8()[3], pngcodec::RGBA8 { r: 255, g: 255, b: 0, a: 255 });
}

#[test]
fn test_encode_rejects_bad_input() {
  let bad = |pixels: &[u8], w: u32, h: u32, options: &EncodeOptions| {
    let e = encode(pixels, w, h, options).unwrap_err();
    (e.stage, e.error)
  };
  let default = EncodeOptions::default();
  assert_eq!(bad(&[0; 4], 0, 1, &default).0, Stage::Header);
  assert_eq!(
    bad(&[0; 7], 1, 2, &default),
    (Stage::Header, PngError::PixelSizeMismatch { expected: 8, actual: 7 })
  );
  let level = EncodeOptions { compression_level: 10, ..EncodeOptions::default() };
  assert_eq!(bad(&[0; 4], 1, 1, &level), (Stage::Options, PngError::InvalidCompressionLevel(10)));
  let size = EncodeOptions { max_chunk_size: 0, ..EncodeOptions::default() };
  assert_eq!(bad(&[0; 4], 1, 1, &size), (Stage::Options, PngError::InvalidChunkSize(0)));
}

#[test]
fn test_every_single_byte_corruption_is_caught() {
  let pixels = super::rand_bytes(5 * 3 * 4);
  let png = encode(&pixels, 5, 3, &EncodeOptions::default()).unwrap();
  let body = &png[8..];
  let clean = parse_chunks(body, ParseOptions::default()).unwrap();
  for chunk in &clean {
    let start = chunk.offset() + 4;
    let end = start + 4 + chunk.as_valid().unwrap().data().len();
    for (i, mask) in (start..end).flat_map(|i| [0x01, 0x20, 0x80, 0xFF].map(|m| (i, m))) {
      let mut damaged = body.to_vec();
      damaged[i] ^= mask;
      match parse_chunks(&damaged, ParseOptions::default()) {
        Err(PngError::ChecksumMismatch { offset, .. }) => assert_eq!(offset, chunk.offset()),
        other => panic!("byte {i} ^ {mask:#04x}: expected a checksum mismatch, got {other:?}"),
      }
      let lenient = parse_chunks(&damaged, ParseOptions::lenient()).unwrap();
      assert_eq!(lenient.len(), clean.len());
      for (got, was) in lenient.iter().zip(&clean) {
        if got.offset() == chunk.offset() {
          assert!(matches!(
            got,
            Chunk::Invalid(c) if matches!(c.reason(), InvalidReason::ChecksumMismatch { .. })
          ));
        } else {
          assert_eq!(got, was);
        }
      }
      let e = decode(&[&PNG_SIGNATURE[..], &damaged[..]].concat()).unwrap_err();
      assert_eq!(e.stage, Stage::ChunkParsing);
    }
  }
}

/// Extra chunks for [`png_crate_encode`].
#[derive(Default)]
struct Extras {
  palette: Option<Vec<u8>>,
  trns: Option<Vec<u8>>,
  text: Option<(&'static str, &'static str)>,
}

/// Writes a PNG with the `png` crate, so we can check our decoder against it.
fn png_crate_encode(
  width: u32, height: u32, color: ::png::ColorType, depth: ::png::BitDepth, extras: Extras,
  data: &[u8],
) -> Vec<u8> {
  let mut out = Vec::new();
  {
    let mut encoder = ::png::Encoder::new(&mut out, width, height);
    encoder.set_color(color);
    encoder.set_depth(depth);
    if let Some(palette) = extras.palette {
      encoder.set_palette(palette);
    }
    if let Some(trns) = extras.trns {
      encoder.set_trns(trns);
    }
    if let Some((keyword, text)) = extras.text {
      encoder.add_text_chunk(keyword.to_string(), text.to_string()).unwrap();
    }
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(data).unwrap();
    writer.finish().unwrap();
  }
  out
}

#[test]
fn test_decode_png_crate_output() {
  use ::png::{BitDepth, ColorType};

  let rgba = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
  let title = Extras { text: Some(("Title", "from png")), ..Extras::default() };
  let png = png_crate_encode(3, 1, ColorType::Rgba, BitDepth::Eight, title, &rgba);
  let out = decode(&png).unwrap();
  assert_eq!(out.pixels, rgba);
  assert_eq!(out.metadata["Title"], "from png");

  let rows = [0b1010_0000, 0b0101_0000];
  let png = png_crate_encode(4, 2, ColorType::Grayscale, BitDepth::One, Extras::default(), &rows);
  let out = decode(&png).unwrap();
  let (w, b) = ([255, 255, 255, 255], [0, 0, 0, 255]);
  assert_eq!(out.pixels, [w, b, w, b, b, w, b, w].concat());

  let rgb16 = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
  let png = png_crate_encode(1, 1, ColorType::Rgb, BitDepth::Sixteen, Extras::default(), &rgb16);
  assert_eq!(decode(&png).unwrap().pixels, [0x12, 0x56, 0x9A, 255]);

  let ya = [10, 20, 30, 40];
  let png =
    png_crate_encode(2, 1, ColorType::GrayscaleAlpha, BitDepth::Eight, Extras::default(), &ya);
  assert_eq!(decode(&png).unwrap().pixels, [10, 10, 10, 20, 30, 30, 30, 40]);

  let palette = Extras {
    palette: Some(vec![255, 0, 0, 0, 255, 0, 0, 0, 255]),
    trns: Some(vec![128]),
    ..Extras::default()
  };
  let png = png_crate_encode(3, 1, ColorType::Indexed, BitDepth::Two, palette, &[0b0001_1000]);
  assert_eq!(decode(&png).unwrap().pixels, [255, 0, 0, 128, 0, 255, 0, 255, 0, 0, 255, 255]);
}

#[test]
fn test_png_crate_reads_our_output() {
  for strategy in [FilterStrategy::Optimal, FilterStrategy::Fixed(FilterType::Average)] {
    let (width, height) = (13, 7);
    let pixels = super::rand_bytes(width * height * 4);
    let options = EncodeOptions {
      filter_strategy: strategy,
      max_chunk_size: 100,
      metadata: pngcodec::png::metadata_from([("Author", "somebody")]),
      ..EncodeOptions::default()
    };
    let ours = encode(&pixels, width as u32, height as u32, &options).unwrap();

    let mut decoder = ::png::Decoder::new(Cursor::new(&ours[..]));
    decoder.set_transformations(::png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size().unwrap()];
    let info = reader.next_frame(&mut buf).unwrap();
    assert_eq!((info.width, info.height), (width as u32, height as u32));
    assert_eq!(info.color_type, ::png::ColorType::Rgba);
    assert_eq!(info.bit_depth, ::png::BitDepth::Eight);
    assert_eq!(&buf[..info.buffer_size()], &pixels[..]);
    let text = &reader.info().uncompressed_latin1_text;
    assert_eq!(text.len(), 1);
    assert_eq!((text[0].keyword.as_str(), text[0].text.as_str()), ("Author", "somebody"));
  }
}
