//! Progress hooks for the encode and decode pipelines.
//!
//! The pipelines never print anything themselves. Instead they report
//! [`CodecEvent`]s to a [`CodecObserver`], and the caller picks what happens to
//! them: nothing (`()`), the `log` facade ([`LogObserver`]), or anything else.

use super::{filtering::FilterType, ChunkType};
use crate::error::Stage;

/// Something the codec did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecEvent<'a> {
  /// A pipeline stage is starting.
  StageStarted(Stage),
  /// The encoder filtered a row.
  RowFiltered { row: u32, filter: FilterType },
  /// The decoder reconstructed a row.
  RowUnfiltered { row: u32, filter: FilterType },
  /// The encoder compressed the filtered stream into `chunks` IDAT payloads.
  StreamCompressed { filtered_len: usize, compressed_len: usize, chunks: usize },
  /// The decoder inflated the concatenated IDAT payloads.
  StreamDecompressed { compressed_len: usize, filtered_len: usize },
  /// A chunk went into the output stream.
  ChunkWritten { ty: ChunkType, len: usize },
  /// A metadata entry was read or written.
  MetadataEntry { keyword: &'a str, text_len: usize },
}

/// Receives [`CodecEvent`]s.
pub trait CodecObserver {
  fn on_event(&mut self, event: CodecEvent<'_>);
}

/// Ignores everything.
impl CodecObserver for () {
  #[inline]
  fn on_event(&mut self, _: CodecEvent<'_>) {}
}

impl<O: CodecObserver + ?Sized> CodecObserver for &mut O {
  #[inline]
  fn on_event(&mut self, event: CodecEvent<'_>) {
    (**self).on_event(event)
  }
}

/// Wraps a closure as an observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FnObserver<F>(pub F);
impl<F: FnMut(CodecEvent<'_>)> CodecObserver for FnObserver<F> {
  #[inline]
  fn on_event(&mut self, event: CodecEvent<'_>) {
    (self.0)(event)
  }
}

/// Forwards events to the `log` facade.
///
/// Stage and stream events are `debug`, per-row and per-chunk events are
/// `trace`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LogObserver;
impl CodecObserver for LogObserver {
  fn on_event(&mut self, event: CodecEvent<'_>) {
    match event {
      CodecEvent::StageStarted(stage) => log::debug!("png: {stage} stage"),
      CodecEvent::RowFiltered { row, filter } => {
        log::trace!("png: row {row} filtered with {filter:?}")
      }
      CodecEvent::RowUnfiltered { row, filter } => {
        log::trace!("png: row {row} unfiltered from {filter:?}")
      }
      CodecEvent::StreamCompressed { filtered_len, compressed_len, chunks } => {
        log::debug!("png: deflated {filtered_len} bytes to {compressed_len} in {chunks} IDATs")
      }
      CodecEvent::StreamDecompressed { compressed_len, filtered_len } => {
        log::debug!("png: inflated {compressed_len} bytes of IDAT to {filtered_len} filtered bytes")
      }
      CodecEvent::ChunkWritten { ty, len } => log::trace!("png: wrote {ty:?} chunk, {len} bytes"),
      CodecEvent::MetadataEntry { keyword, text_len } => {
        log::trace!("png: text entry {keyword:?}, {text_len} bytes")
      }
    }
  }
}

#[test]
fn test_fn_observer_collects() {
  use alloc::vec::Vec;
  let mut seen = Vec::new();
  {
    let mut obs = FnObserver(|e: CodecEvent<'_>| {
      if let CodecEvent::StageStarted(s) = e {
        seen.push(s)
      }
    });
    let o: &mut dyn CodecObserver = &mut obs;
    o.on_event(CodecEvent::StageStarted(Stage::Header));
    o.on_event(CodecEvent::ChunkWritten { ty: ChunkType::IEND, len: 0 });
    o.on_event(CodecEvent::StageStarted(Stage::Filtering));
  }
  assert_eq!(seen, [Stage::Header, Stage::Filtering]);
  // the no-op and log observers accept anything
  ().on_event(CodecEvent::StageStarted(Stage::Options));
  LogObserver.on_event(CodecEvent::RowFiltered { row: 0, filter: FilterType::Paeth });
}
