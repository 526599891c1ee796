// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-flight frame records and their lifecycle events.
//!
//! Every swap pushes one [`FrameInfo`] onto the surface's [`FrameInfoQueue`].
//! Completion signals then consume records and deliver two ordered
//! [`FrameEvent`]s per frame:
//!
//! ```text
//!   swap ──► push_back(FrameInfo)
//!                 │
//!                 ▼
//!   ┌───────────────────────────────┐
//!   │ front ... ... ... ... ... back│
//!   └───────────────────────────────┘
//!     │                          │
//!     │ compositor / swap event  │ region swap without a native
//!     ▼                          ▼ completion event
//!   SYNC, COMPLETE            SYNC, COMPLETE (synthesized)
//! ```
//!
//! Records are consumed from the front except when a region swap has to
//! synthesize its own completion, which takes the back. A surface that mixes
//! both presentation paths can therefore observe lifecycle events out of
//! frame order; each record carries its [`PresentPath`] so the hazard is
//! visible to callers.
//!
//! Events carry a value snapshot of the record at the time they fired.

use alloc::collections::VecDeque;
use alloc::rc::Rc;

use crate::output::Output;
use crate::time::HostTime;

/// How a frame reached the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PresentPath {
    /// Full back buffer swap.
    #[default]
    Full,
    /// Partial copy of damaged rectangles.
    Region,
}

/// Timing data for one presented frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInfo {
    /// Per-surface frame sequence number, starting at 0.
    pub frame_counter: u64,
    /// When the frame became visible, if known.
    pub presentation_time: Option<HostTime>,
    /// Refresh rate of the output the frame was shown on, 0 if unknown.
    pub refresh_rate: f32,
    /// When the compositor finished compositing this frame.
    pub composite_end_time: Option<HostTime>,
    /// Earliest time the compositor will composite the next frame.
    pub next_refresh_deadline: Option<HostTime>,
    /// Frame-sync counter value published at the end of this frame, used to
    /// correlate compositor messages. 0 when no compositor sync is active.
    pub sync_counter: u64,
    /// Output the surface mostly overlapped when the frame was swapped.
    pub output: Option<Rc<Output>>,
    /// Presentation path that produced this frame.
    pub path: PresentPath,
}

impl FrameInfo {
    /// Creates a record for the given frame number.
    #[must_use]
    pub fn new(frame_counter: u64, path: PresentPath) -> Self {
        Self {
            frame_counter,
            path,
            ..Self::default()
        }
    }

    /// Binds the record to `output`, taking its refresh rate when known.
    pub fn set_output(&mut self, output: Option<Rc<Output>>) {
        if let Some(rate) = output.as_ref().map(|o| o.refresh_rate())
            && rate != 0.0
        {
            self.refresh_rate = rate;
        }
        self.output = output;
    }
}

/// Lifecycle stage of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameEventKind {
    /// The frame has been consumed; the application may start the next one.
    Sync,
    /// The frame is on screen and its timing is final.
    Complete,
}

/// A lifecycle notification with a snapshot of its record.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameEvent {
    /// Which stage was reached.
    pub kind: FrameEventKind,
    /// The record as it was when the event fired.
    pub info: FrameInfo,
}

/// Ordered queue of in-flight frame records.
#[derive(Clone, Debug, Default)]
pub struct FrameInfoQueue {
    records: VecDeque<FrameInfo>,
}

impl FrameInfoQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record for a frame that is being presented.
    pub fn push(&mut self, info: FrameInfo) {
        self.records.push_back(info);
    }

    /// Oldest pending record.
    #[must_use]
    pub fn head(&self) -> Option<&FrameInfo> {
        self.records.front()
    }

    /// Oldest pending record, mutably.
    pub fn head_mut(&mut self) -> Option<&mut FrameInfo> {
        self.records.front_mut()
    }

    /// Most recently pushed record, mutably.
    pub fn tail_mut(&mut self) -> Option<&mut FrameInfo> {
        self.records.back_mut()
    }

    /// Removes the oldest record.
    pub fn pop_head(&mut self) -> Option<FrameInfo> {
        self.records.pop_front()
    }

    /// Removes the most recent record.
    pub fn pop_tail(&mut self) -> Option<FrameInfo> {
        self.records.pop_back()
    }

    /// Number of pending records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no frame is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every pending record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
