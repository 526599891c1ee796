// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instrumentation hooks for the presentation pipeline.
//!
//! Backends call a [`TraceSink`] at each step of a frame's life. All methods
//! default to no-ops, so a sink only implements what it cares about.
//! Protocol diagnostics (counter mismatches and the like) go through the
//! `log` facade in the backend instead; trace events describe the normal
//! flow.

use crate::backend::SurfaceId;
use crate::frame::{FrameEventKind, PresentPath};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a topology scan changed the output list.
#[derive(Clone, Copy, Debug)]
pub struct OutputsChangedEvent {
    /// Number of live outputs after the scan.
    pub output_count: usize,
    /// Number of inserted, updated or removed outputs.
    pub change_count: usize,
    /// When the scan finished.
    pub timestamp: HostTime,
}

/// Emitted when a surface starts drawing a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameStartEvent {
    /// Surface being drawn.
    pub surface: SurfaceId,
    /// Frame sequence number about to be presented.
    pub frame_counter: u64,
    /// Frame-sync counter published to the compositor, 0 if none.
    pub sync_counter: u64,
    /// When drawing started.
    pub timestamp: HostTime,
}

/// Emitted after a swap was issued.
#[derive(Clone, Copy, Debug)]
pub struct SwapEvent {
    /// Surface that swapped.
    pub surface: SurfaceId,
    /// Frame sequence number.
    pub frame_counter: u64,
    /// Which presentation path was used.
    pub path: PresentPath,
    /// Number of rectangles for a region swap, 0 for a full swap.
    pub rect_count: usize,
    /// When the swap call returned.
    pub timestamp: HostTime,
}

/// Emitted when a lifecycle event is queued for the application.
#[derive(Clone, Copy, Debug)]
pub struct FrameNotifyEvent {
    /// Surface the frame belongs to.
    pub surface: SurfaceId,
    /// Lifecycle stage.
    pub kind: FrameEventKind,
    /// Frame sequence number.
    pub frame_counter: u64,
    /// Presentation time carried by the record, if known.
    pub presentation_time: Option<HostTime>,
    /// Whether the event was synthesized rather than signalled.
    pub synthesized: bool,
    /// When the event was queued.
    pub timestamp: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a backend.
pub trait TraceSink {
    /// Called after the output list changed.
    fn on_outputs_changed(&mut self, e: &OutputsChangedEvent) {
        _ = e;
    }

    /// Called when a frame starts.
    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        _ = e;
    }

    /// Called after a swap.
    fn on_swap(&mut self, e: &SwapEvent) {
        _ = e;
    }

    /// Called when a SYNC or COMPLETE event is queued.
    fn on_frame_notify(&mut self, e: &FrameNotifyEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}
