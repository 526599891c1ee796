// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//! Each surface gets its own track (`tid`); a frame is a duration event from
//! frame start to swap, and lifecycle notifications are instants on the same
//! track.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cinder_core::frame::{FrameEventKind, PresentPath};
use cinder_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_json).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_json(recorded: RecordedEvent) -> Value {
    let ts = us(recorded.timestamp());
    match recorded {
        RecordedEvent::OutputsChanged(e) => json!({
            "ph": "i",
            "name": "OutputsChanged",
            "cat": "Outputs",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "output_count": e.output_count,
                "change_count": e.change_count,
            }
        }),
        RecordedEvent::FrameStart(e) => json!({
            "ph": "B",
            "name": "Frame",
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": e.surface.0,
            "args": {
                "frame_counter": e.frame_counter,
                "sync_counter": e.sync_counter,
            }
        }),
        RecordedEvent::Swap(e) => json!({
            "ph": "E",
            "name": "Frame",
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": e.surface.0,
            "args": {
                "frame_counter": e.frame_counter,
                "path": match e.path {
                    PresentPath::Full => "full",
                    PresentPath::Region => "region",
                },
                "rect_count": e.rect_count,
            }
        }),
        RecordedEvent::FrameNotify(e) => json!({
            "ph": "i",
            "name": match e.kind {
                FrameEventKind::Sync => "Sync",
                FrameEventKind::Complete => "Complete",
            },
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": e.surface.0,
            "s": "t",
            "args": {
                "frame_counter": e.frame_counter,
                "presentation_us": e.presentation_time.map(us),
                "synthesized": e.synthesized,
            }
        }),
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
