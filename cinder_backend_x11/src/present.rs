// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame presentation.
//!
//! Every swap appends one [`FrameInfo`] to the surface queue and eventually
//! delivers SYNC then COMPLETE for it. Who delivers depends on the
//! environment:
//!
//! ```text
//!   compositor handshake   FRAME_DRAWN (SYNC, head) / FRAME_TIMINGS (COMPLETE, pop head)
//!   GLX swap events        swap-complete event: SYNC + COMPLETE, pop head
//!                          region swaps: synthesized at once, pop tail
//!   neither                synthesized after the swap, pop tail
//! ```
//!
//! Popping the tail for region swaps while full swaps wait for a swap event
//! can deliver a region frame before an older full frame. Records carry
//! their [`PresentPath`] so consumers can tell.
//!
//! With the compositor handshake, counter 1 is odd while a frame is being
//! drawn and even once it is finished; the even value is the key compositor
//! messages refer to.

use cinder_core::backend::{Rect, SurfaceId, WinsysError};
use cinder_core::frame::{FrameEventKind, FrameInfo, PresentPath};
use cinder_core::trace::{FrameStartEvent, SwapEvent};

use crate::glx::{GL_BACK, GL_COLOR_BUFFER_BIT, GL_FRONT, GL_NEAREST, Glx};
use crate::time;
use crate::winsys::{Onscreen, WinsysState, deliver};
use crate::xlib::Xlib;

/// Bounding box of damaged rectangles, before the y flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DamageBounds {
    pub(crate) x_min: i32,
    pub(crate) y_min: i32,
    pub(crate) x_max: i32,
    pub(crate) y_max: i32,
}

impl DamageBounds {
    pub(crate) fn of(rects: &[Rect]) -> Option<Self> {
        let first = rects.first()?;
        let mut bounds = Self {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x.saturating_add(first.width),
            y_max: first.y.saturating_add(first.height),
        };
        for rect in &rects[1..] {
            bounds.x_min = bounds.x_min.min(rect.x);
            bounds.y_min = bounds.y_min.min(rect.y);
            bounds.x_max = bounds.x_max.max(rect.x.saturating_add(rect.width));
            bounds.y_max = bounds.y_max.max(rect.y.saturating_add(rect.height));
        }
        Some(bounds)
    }

    /// Clamps to a `width` x `height` surface.
    pub(crate) fn clamped(self, width: i32, height: i32) -> Self {
        Self {
            x_min: self.x_min.clamp(0, width),
            y_min: self.y_min.clamp(0, height),
            x_max: self.x_max.clamp(0, width),
            y_max: self.y_max.clamp(0, height),
        }
    }
}

/// Converts a top-left-origin rectangle to GL's bottom-left origin.
pub(crate) fn flip_y(rect: Rect, framebuffer_height: i32) -> Rect {
    Rect {
        y: framebuffer_height
            .saturating_sub(rect.y)
            .saturating_sub(rect.height),
        ..rect
    }
}

impl<X: Xlib, G: Glx> WinsysState<X, G> {
    pub(crate) fn swap_buffers(&mut self, id: SurfaceId, damage: &[Rect]) -> Result<(), WinsysError> {
        if self.context.is_none() {
            return Err(WinsysError::NoContext);
        }
        self.with_surface(id, |state, surface| state.swap_full(id, surface, damage))
    }

    pub(crate) fn swap_region(&mut self, id: SurfaceId, rects: &[Rect]) -> Result<(), WinsysError> {
        if self.context.is_none() {
            return Err(WinsysError::NoContext);
        }
        self.with_surface(id, |state, surface| state.swap_partial(id, surface, rects))
    }

    fn publish_counter(&mut self, surface: &Onscreen) {
        let counter = surface.xcounters[1];
        if counter != 0 {
            self.conn
                .native()
                .sync_set_counter(counter, surface.counters[1]);
        }
    }

    /// Marks the frame as being drawn: counter 1 becomes odd.
    pub(crate) fn start_frame(&mut self, id: SurfaceId, surface: &mut Onscreen) {
        if !self.conn.frame_drawn_supported() {
            return;
        }
        if surface.last_sync_request_value != 0 {
            surface.counters[1] = surface.last_sync_request_value;
            surface.last_sync_request_value = 0;
        }
        if surface.counters[1] % 2 == 1 {
            log::warn!(
                "frame-sync counter {} already odd at frame start",
                surface.counters[1]
            );
        }
        surface.counters[1] += 1;
        self.publish_counter(surface);

        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_frame_start(&FrameStartEvent {
                surface: id,
                frame_counter: surface.frame_counter,
                sync_counter: surface.counters[1],
                timestamp: time::now(),
            });
        }
    }

    /// Marks the frame as finished: counter 1 becomes even and keys the
    /// pending record.
    pub(crate) fn end_frame(&mut self, surface: &mut Onscreen) {
        if !self.conn.frame_drawn_supported() {
            return;
        }
        if surface.counters[1] % 2 == 0 {
            log::warn!(
                "frame-sync counter {} even at frame end",
                surface.counters[1]
            );
        }
        surface.counters[1] += 1;
        if let Some(tail) = surface.queue.tail_mut() {
            tail.sync_counter = surface.counters[1];
        }
        self.publish_counter(surface);
    }

    /// Blocks until the next vblank and stamps the pending record.
    pub(crate) fn wait_for_vblank(&mut self, surface: &mut Onscreen) {
        let drawable = surface.drawable();
        if self.extensions.oml_sync_control {
            let waited = self.glx.wait_for_msc(drawable, 0, 1, 0);
            if !self.clock.is_seen()
                && let Some(values) = self.glx.get_sync_values(drawable)
            {
                self.clock.observe_ust(values.ust, time::now());
            }
            if let Some(values) = waited
                && let Some(tail) = surface.queue.tail_mut()
                && let Some(presented) = self.clock.ust_to_host(values.ust)
            {
                tail.presentation_time = Some(presented);
            }
        } else if self.extensions.video_sync {
            let count = self.glx.get_video_sync().unwrap_or(0);
            let remainder = if count % 2 == 0 { 1 } else { 0 };
            _ = self.glx.wait_video_sync(2, remainder);
            if let Some(tail) = surface.queue.tail_mut() {
                tail.presentation_time = Some(time::now());
            }
        }
    }

    fn swap_full(&mut self, id: SurfaceId, surface: &mut Onscreen, damage: &[Rect]) {
        surface
            .queue
            .push(FrameInfo::new(surface.frame_counter, PresentPath::Full));
        self.start_frame(id, surface);
        _ = self.bind_onscreen(surface);

        let mut have_counter = false;
        if surface.throttled && !self.conn.frame_drawn_supported() {
            have_counter = self.features.vblank_counter;
            if !self.extensions.swap_control {
                let can_wait = self.features.vblank_wait;
                let end_frame_counter = if have_counter && can_wait {
                    self.glx.get_video_sync().unwrap_or(0)
                } else {
                    0
                };
                self.glx.finish();
                if have_counter && can_wait {
                    if surface.last_swap_vsync_counter == end_frame_counter {
                        self.wait_for_vblank(surface);
                    }
                } else if can_wait {
                    self.wait_for_vblank(surface);
                }
            }
        }

        self.glx.swap_buffers(surface.drawable());

        if have_counter {
            surface.last_swap_vsync_counter = self.glx.get_video_sync().unwrap_or(0);
        }

        surface.output =
            self.conn
                .output_for_rectangle(surface.x, surface.y, surface.width, surface.height);
        if let Some(tail) = surface.queue.tail_mut() {
            tail.set_output(surface.output.clone());
        }
        self.end_frame(surface);

        self.trace_swap(id, surface, PresentPath::Full, damage.len());
        self.finish_swap(id, surface, false);
    }

    fn swap_partial(&mut self, id: SurfaceId, surface: &mut Onscreen, rects: &[Rect]) {
        surface
            .queue
            .push(FrameInfo::new(surface.frame_counter, PresentPath::Region));
        self.start_frame(id, surface);

        let framebuffer_height = surface.height;
        let flipped: Vec<Rect> = rects
            .iter()
            .map(|&rect| flip_y(rect, framebuffer_height))
            .collect();
        let bounds = DamageBounds::of(rects);

        _ = self.bind_onscreen(surface);
        self.glx.finish();

        let throttle = surface.throttled && !self.conn.frame_drawn_supported();
        let have_counter = throttle && self.features.vblank_counter;
        let can_wait = throttle && self.features.vblank_wait;
        let mut end_frame_counter = 0;
        if have_counter && can_wait {
            end_frame_counter = self.glx.get_video_sync().unwrap_or(0);
            if surface.last_swap_vsync_counter == end_frame_counter {
                self.wait_for_vblank(surface);
            }
        } else if can_wait {
            self.wait_for_vblank(surface);
        }

        let drawable = surface.drawable();
        if self.extensions.copy_sub_buffer {
            for rect in &flipped {
                self.glx
                    .copy_sub_buffer(drawable, rect.x, rect.y, rect.width, rect.height);
            }
        } else if self.glx.has_blit_framebuffer() {
            self.glx.disable_scissor();
            self.glx.draw_buffer(GL_FRONT);
            for rect in &flipped {
                self.glx.blit_framebuffer(
                    rect.x,
                    rect.y,
                    rect.x.saturating_add(rect.width),
                    rect.y.saturating_add(rect.height),
                    GL_COLOR_BUFFER_BIT,
                    GL_NEAREST,
                );
            }
            self.glx.draw_buffer(GL_BACK);
        }
        self.glx.flush();

        if have_counter {
            surface.last_swap_vsync_counter = end_frame_counter;
        }

        if !surface.foreign
            && let Some(bounds) = bounds
        {
            let b = bounds.clamped(surface.width, surface.height);
            let output = self.conn.output_for_rectangle(
                surface.x.saturating_add(b.x_min),
                surface.y.saturating_add(b.y_min),
                b.x_max - b.x_min,
                b.y_max - b.y_min,
            );
            if let Some(tail) = surface.queue.tail_mut() {
                tail.set_output(output);
            }
        }

        self.end_frame(surface);

        self.trace_swap(id, surface, PresentPath::Region, rects.len());
        let synthesize = !self.conn.frame_drawn_supported() && self.features.sync_and_complete_event;
        self.finish_swap(id, surface, synthesize);
    }

    fn trace_swap(&mut self, id: SurfaceId, surface: &Onscreen, path: PresentPath, rect_count: usize) {
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_swap(&SwapEvent {
                surface: id,
                frame_counter: surface.frame_counter,
                path,
                rect_count,
                timestamp: time::now(),
            });
        }
    }

    /// Common tail of both swap paths.
    ///
    /// `region_synthesized` is set for region swaps when swap-complete
    /// events exist: copies produce no such event, so the record is
    /// delivered now.
    fn finish_swap(&mut self, id: SurfaceId, surface: &mut Onscreen, region_synthesized: bool) {
        if (!self.features.presentation_time || !self.clock.is_monotonic())
            && let Some(tail) = surface.queue.tail_mut()
        {
            tail.presentation_time = Some(time::now());
        }

        let synthesize = if region_synthesized {
            true
        } else if !self.features.sync_and_complete_event {
            if surface.queue.len() != 1 {
                log::warn!(
                    "{} frames pending on a surface without completion events",
                    surface.queue.len()
                );
            }
            true
        } else {
            false
        };

        if synthesize && let Some(info) = surface.queue.pop_tail() {
            deliver(&mut self.trace, id, surface, FrameEventKind::Sync, info.clone(), true);
            deliver(&mut self.trace, id, surface, FrameEventKind::Complete, info, true);
        }

        surface.frame_counter += 1;
    }
}
