#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_debug_implementations)]

//! A crate for lossless PNG encoding and decoding.
//!
//! * Encoding takes 8-bit RGBA pixels and writes a standard PNG stream.
//! * Decoding accepts every non-interlaced PNG color type and bit depth, and
//!   always gives back 8-bit RGBA pixels plus the text metadata.
//!
//! Everything lives in the [`png`] module. Errors are in [`error`].
//!
//! The crate is `no_std`, but it needs `alloc`. The `miniz_oxide` feature (on
//! by default) supplies the zlib compressor and the `png::encode` /
//! `png::decode` shortcuts.

extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod error;
pub use error::{CodecError, PngError, Stage};

pub mod pixel_formats;
pub use pixel_formats::*;

mod parser_helpers;

pub mod png;
