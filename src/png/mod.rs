//! Holds all the tools for encoding and decoding PNG data.
//!
//! ## Automated PNG Encoding and Decoding
#![cfg_attr(
  feature = "miniz_oxide",
  doc = r#"
If you don't need full control over the process there's functions provided
that take RGBA8 pixels and give you PNG bytes ([`encode`]), or take PNG
bytes and give you RGBA8 pixels and the text metadata ([`decode`]). Both
require the `miniz_oxide` feature (on by default). Without it, use
[`encode_with`] and [`decode_with`] and supply your own [`ZlibCodec`].

```no_run
# fn run() -> Result<(), pngcodec::CodecError> {
use pngcodec::png::*;
let pixels = [255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255];
let options = EncodeOptions {
  metadata: metadata_from([("Title", "Four pixels")]),
  ..EncodeOptions::default()
};
let png = encode(&pixels, 2, 2, &options)?;
let back = decode(&png)?;
assert_eq!(back.pixels, pixels);
# Ok(())
# }
```
"#
)]
#![cfg_attr(
  not(feature = "miniz_oxide"),
  doc = r#"
The `encode` and `decode` shortcuts need the `miniz_oxide` feature. Without
it, use [`encode_with`] and [`decode_with`] and supply your own
[`ZlibCodec`].
"#
)]
//!
//! ## Working With the Parts
//! Every stage of the pipeline is also public, so you can inspect or build a
//! PNG a piece at a time.
//!
//! The general format of a PNG is an 8 byte signature followed by "chunks".
//! Each chunk is a big-endian length, a 4 byte type tag, the data, and a CRC32
//! of the type and data. There's four "critical" chunk types:
//! * **Header** - This has all the important information about the image's
//!   dimensions, pixel format, and if the image is interlaced or not. Using
//!   this information you'll be able to know how much temporary space is
//!   required for decompression, and how much final space is required after
//!   unfiltering. See [`IHDR`].
//! * **Palette** - If an image uses indexed color it will have a palette of
//!   what index values map to what `RGB8` values. See [`Palette`].
//! * **Image Data** - One or more chunks of compressed data. All of the
//!   compressed data forms a single zlib data stream. All of the image data
//!   chunks should appear one after the other.
//! * **End** - The last chunk, lets you know you had the full PNG and your data
//!   wasn't truncated accidentally.
//!
//! After the header and before the image data there are also zero or more
//! "ancillary" chunks which might give you additional information about the
//! image. If you just want to display the image, the ancillary chunk that's
//! most likely to be important to you is if there's a transparency chunk.
//!
//! ### Step By Step
//! * [`validate_signature`] checks the first 8 bytes.
//! * [`parse_chunks`] splits the rest into [`Chunk`] values, either failing on
//!   the first problem or (in lenient mode) marking damaged chunks invalid.
//! * [`validate_chunk_structure`] checks the chunk ordering rules.
//! * [`decode_header`] reads the [`IHDR`].
//! * [`frame_for_read`] joins the image data chunks and inflates them.
//! * [`invert_filters`] (or [`unfilter_lines`]) reverses the scanline filters,
//!   strictly one row after the other.
//! * [`expand_to_rgba8`] turns whatever the stored pixel format was into RGBA8.
//!
//! Encoding runs the mirror image: [`encode_header`], [`apply_filters`],
//! [`frame_for_write`], [`encode_text_chunks`], and finally [`write_stream`].

#![forbid(unsafe_code)]

mod chunk;
mod crc32;
mod decode;
mod encode;
mod expand;
mod filtering;
mod idat;
mod ihdr;
mod plte;
mod reader;
mod signature;
mod telemetry;
mod text;
mod trns;
mod writer;

pub use chunk::*;
pub use crc32::*;
pub use decode::*;
pub use encode::*;
pub use expand::*;
pub use filtering::*;
pub use idat::*;
pub use ihdr::*;
pub use plte::*;
pub use reader::*;
pub use signature::*;
pub use telemetry::*;
pub use text::*;
pub use trns::*;
pub use writer::*;

#[cfg(test)]
mod tests;
