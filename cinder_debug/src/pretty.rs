// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use cinder_core::frame::{FrameEventKind, PresentPath};
use cinder_core::time::HostTime;
use cinder_core::trace::{
    FrameNotifyEvent, FrameStartEvent, OutputsChangedEvent, SwapEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn path_name(path: PresentPath) -> &'static str {
    match path {
        PresentPath::Full => "full",
        PresentPath::Region => "region",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_outputs_changed(&mut self, e: &OutputsChangedEvent) {
        let _ = writeln!(
            self.writer,
            "[outputs] count={} changes={} at {:.1}µs",
            e.output_count,
            e.change_count,
            us(e.timestamp),
        );
    }

    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        let _ = writeln!(
            self.writer,
            "[frame:start] surface={} frame={} sync={} at {:.1}µs",
            e.surface.0,
            e.frame_counter,
            e.sync_counter,
            us(e.timestamp),
        );
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        let _ = writeln!(
            self.writer,
            "[swap] surface={} frame={} path={} rects={} at {:.1}µs",
            e.surface.0,
            e.frame_counter,
            path_name(e.path),
            e.rect_count,
            us(e.timestamp),
        );
    }

    fn on_frame_notify(&mut self, e: &FrameNotifyEvent) {
        let stage = match e.kind {
            FrameEventKind::Sync => "sync",
            FrameEventKind::Complete => "complete",
        };
        let presented = e
            .presentation_time
            .map_or_else(|| "?".to_owned(), |t| format!("{:.1}µs", us(t)));
        let origin = if e.synthesized { " (synthesized)" } else { "" };
        let _ = writeln!(
            self.writer,
            "[frame:{stage}] surface={} frame={} presented={presented}{origin}",
            e.surface.0,
            e.frame_counter,
        );
    }
}
