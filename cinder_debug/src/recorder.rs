// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Counts are stored as `u32` and saturate.

use cinder_core::backend::SurfaceId;
use cinder_core::frame::{FrameEventKind, PresentPath};
use cinder_core::time::HostTime;
use cinder_core::trace::{
    FrameNotifyEvent, FrameStartEvent, OutputsChangedEvent, SwapEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_OUTPUTS_CHANGED: u8 = 1;
const TAG_FRAME_START: u8 = 2;
const TAG_SWAP: u8 = 3;
const TAG_FRAME_NOTIFY: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, n: usize) {
        self.write_u32(u32::try_from(n).unwrap_or(u32::MAX));
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.nanos());
    }

    fn write_option_time(&mut self, t: Option<HostTime>) {
        match t {
            Some(t) => {
                self.write_u8(1);
                self.write_time(t);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_outputs_changed(&mut self, e: &OutputsChangedEvent) {
        self.write_u8(TAG_OUTPUTS_CHANGED);
        self.write_count(e.output_count);
        self.write_count(e.change_count);
        self.write_time(e.timestamp);
    }

    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        self.write_u8(TAG_FRAME_START);
        self.write_u32(e.surface.0);
        self.write_u64(e.frame_counter);
        self.write_u64(e.sync_counter);
        self.write_time(e.timestamp);
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.write_u8(TAG_SWAP);
        self.write_u32(e.surface.0);
        self.write_u64(e.frame_counter);
        self.write_u8(match e.path {
            PresentPath::Full => 0,
            PresentPath::Region => 1,
        });
        self.write_count(e.rect_count);
        self.write_time(e.timestamp);
    }

    fn on_frame_notify(&mut self, e: &FrameNotifyEvent) {
        self.write_u8(TAG_FRAME_NOTIFY);
        self.write_u32(e.surface.0);
        self.write_u8(match e.kind {
            FrameEventKind::Sync => 0,
            FrameEventKind::Complete => 1,
        });
        self.write_u64(e.frame_counter);
        self.write_option_time(e.presentation_time);
        self.write_u8(u8::from(e.synthesized));
        self.write_time(e.timestamp);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// An [`OutputsChangedEvent`].
    OutputsChanged(OutputsChangedEvent),
    /// A [`FrameStartEvent`].
    FrameStart(FrameStartEvent),
    /// A [`SwapEvent`].
    Swap(SwapEvent),
    /// A [`FrameNotifyEvent`].
    FrameNotify(FrameNotifyEvent),
}

impl RecordedEvent {
    /// When the event was emitted.
    #[must_use]
    pub fn timestamp(&self) -> HostTime {
        match self {
            Self::OutputsChanged(e) => e.timestamp,
            Self::FrameStart(e) => e.timestamp,
            Self::Swap(e) => e.timestamp,
            Self::FrameNotify(e) => e.timestamp,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events. Stops at the first truncated or unknown
/// record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_count(&mut self) -> Option<usize> {
        Some(usize::try_from(self.read_u32()?).unwrap_or(usize::MAX))
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_option_time(&mut self) -> Option<Option<HostTime>> {
        let present = self.read_u8()?;
        let t = self.read_time()?;
        Some((present != 0).then_some(t))
    }

    fn decode_outputs_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::OutputsChanged(OutputsChangedEvent {
            output_count: self.read_count()?,
            change_count: self.read_count()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_frame_start(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameStart(FrameStartEvent {
            surface: SurfaceId(self.read_u32()?),
            frame_counter: self.read_u64()?,
            sync_counter: self.read_u64()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_swap(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Swap(SwapEvent {
            surface: SurfaceId(self.read_u32()?),
            frame_counter: self.read_u64()?,
            path: match self.read_u8()? {
                0 => PresentPath::Full,
                _ => PresentPath::Region,
            },
            rect_count: self.read_count()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_frame_notify(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameNotify(FrameNotifyEvent {
            surface: SurfaceId(self.read_u32()?),
            kind: match self.read_u8()? {
                0 => FrameEventKind::Sync,
                _ => FrameEventKind::Complete,
            },
            frame_counter: self.read_u64()?,
            presentation_time: self.read_option_time()?,
            synthesized: self.read_u8()? != 0,
            timestamp: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_OUTPUTS_CHANGED => self.decode_outputs_changed(),
            TAG_FRAME_START => self.decode_frame_start(),
            TAG_SWAP => self.decode_swap(),
            TAG_FRAME_NOTIFY => self.decode_frame_notify(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record_frame(rec: &mut RecorderSink) {
        rec.on_frame_start(&FrameStartEvent {
            surface: SurfaceId(1),
            frame_counter: 4,
            sync_counter: 9,
            timestamp: HostTime(1_000),
        });
        rec.on_swap(&SwapEvent {
            surface: SurfaceId(1),
            frame_counter: 4,
            path: PresentPath::Region,
            rect_count: 3,
            timestamp: HostTime(2_000),
        });
        rec.on_frame_notify(&FrameNotifyEvent {
            surface: SurfaceId(1),
            kind: FrameEventKind::Complete,
            frame_counter: 4,
            presentation_time: Some(HostTime(2_500)),
            synthesized: true,
            timestamp: HostTime(3_000),
        });
    }

    #[test]
    fn frame_lifecycle_decodes_in_order() {
        let mut rec = RecorderSink::new();
        record_frame(&mut rec);
        let events: Vec<RecordedEvent> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3, "three records written");

        let RecordedEvent::Swap(swap) = events[1] else {
            panic!("expected swap, got {:?}", events[1]);
        };
        assert_eq!(swap.path, PresentPath::Region);
        assert_eq!(swap.rect_count, 3);

        let RecordedEvent::FrameNotify(notify) = events[2] else {
            panic!("expected notify, got {:?}", events[2]);
        };
        assert_eq!(notify.kind, FrameEventKind::Complete);
        assert_eq!(notify.presentation_time, Some(HostTime(2_500)));
        assert!(notify.synthesized, "synthesized flag survives");
    }

    #[test]
    fn missing_presentation_time_stays_missing() {
        let mut rec = RecorderSink::new();
        rec.on_frame_notify(&FrameNotifyEvent {
            surface: SurfaceId(2),
            kind: FrameEventKind::Sync,
            frame_counter: 0,
            presentation_time: None,
            synthesized: false,
            timestamp: HostTime(7),
        });
        let event = decode(rec.as_bytes()).next();
        let Some(RecordedEvent::FrameNotify(notify)) = event else {
            panic!("expected notify, got {event:?}");
        };
        assert_eq!(notify.presentation_time, None);
        assert_eq!(notify.timestamp, HostTime(7));
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        record_frame(&mut rec);
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 1];
        assert_eq!(decode(cut).count(), 2, "last record is incomplete");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0, "no records");
    }
}
