// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window-manager, compositor and GLX event handling for surfaces.
//!
//! Compositor messages (`_NET_WM_FRAME_DRAWN`, `_NET_WM_FRAME_TIMINGS`) are
//! only honored when the compositor advertised the handshake; GLX
//! swap-complete events only when it did not. Timing fields in compositor
//! messages are microseconds; offsets are relative to the composite end.

use cinder_core::backend::{Rect, SurfaceEvent, SurfaceId};
use cinder_core::frame::FrameEventKind;
use cinder_core::time::{Duration, HostTime};

use crate::filter::FilterReturn;
use crate::glx::{GLX_BUFFER_SWAP_COMPLETE, Glx};
use crate::time;
use crate::winsys::{WinsysState, deliver};
use crate::xlib::{
    CURRENT_TIME, ClientMessageEvent, ConfigureEvent, EventMask, ExposeEvent, ExtensionEvent,
    ExtensionPayload, XEvent, XEventKind, Xlib,
};

/// Bit set in the refresh-deadline field when no deadline is known.
const NO_DEADLINE: u32 = 0x8000_0000;

impl<X: Xlib, G: Glx> WinsysState<X, G> {
    /// Entry point of the surface filter.
    pub(crate) fn handle_surface_event(&mut self, event: &XEvent) -> FilterReturn {
        match &event.kind {
            XEventKind::Configure(configure) => {
                self.handle_configure(configure);
                FilterReturn::Continue
            }
            XEventKind::Expose(expose) => {
                self.handle_expose(expose);
                FilterReturn::Continue
            }
            XEventKind::ClientMessage(message) => self.handle_client_message(message),
            XEventKind::Extension(extension) => self.handle_extension_event(extension),
            XEventKind::Other(_) => FilterReturn::Continue,
        }
    }

    fn handle_configure(&mut self, configure: &ConfigureEvent) {
        let Some(id) = self.surface_for_window(configure.window) else {
            log::warn!(
                "ConfigureNotify for unknown window 0x{:08X}",
                configure.window
            );
            return;
        };
        let foreign = self.surfaces.get(&id).is_some_and(|s| s.foreign);
        // The toolkit owning a foreign window tracks its position.
        let position = if foreign {
            None
        } else if configure.send_event {
            Some((configure.x, configure.y))
        } else {
            let root = self.conn.root();
            self.conn
                .native()
                .translate_coordinates(configure.window, root, 0, 0)
        };
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return;
        };
        if let Some((x, y)) = position {
            surface.x = x;
            surface.y = y;
        }
        surface.width = configure.width;
        surface.height = configure.height;
        if !foreign {
            surface.output = self.conn.output_for_rectangle(
                surface.x,
                surface.y,
                surface.width,
                surface.height,
            );
        }
        surface.events.push_back(SurfaceEvent::Resized {
            width: configure.width,
            height: configure.height,
        });
    }

    fn handle_expose(&mut self, expose: &ExposeEvent) {
        let Some(id) = self.surface_for_window(expose.window) else {
            return;
        };
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.events.push_back(SurfaceEvent::Dirty(Rect::new(
                expose.x,
                expose.y,
                expose.width,
                expose.height,
            )));
        }
    }

    fn handle_client_message(&mut self, message: &ClientMessageEvent) -> FilterReturn {
        let Some(id) = self.surface_for_window(message.window) else {
            return FilterReturn::Continue;
        };
        let atoms = *self.conn.atoms();

        if message.message_type == atoms.wm_protocols {
            let protocol = u64::from(message.data[0]);
            if protocol == atoms.wm_delete_window {
                if let Some(surface) = self.surfaces.get_mut(&id) {
                    surface.events.push_back(SurfaceEvent::CloseRequested);
                }
            } else if protocol == atoms.wm_take_focus {
                self.conn
                    .native()
                    .set_input_focus(message.window, CURRENT_TIME);
            } else if protocol == atoms.net_wm_ping {
                let root = self.conn.root();
                let reply = ClientMessageEvent {
                    window: root,
                    ..*message
                };
                self.conn.native().send_client_message(
                    root,
                    false,
                    EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                    &reply,
                );
            } else if protocol == atoms.net_wm_sync_request {
                self.handle_sync_request(id, message);
            } else {
                log::warn!("unhandled WM_PROTOCOLS message {protocol}");
            }
            return FilterReturn::Remove;
        }

        if message.message_type == atoms.net_wm_sync_request {
            self.handle_sync_request(id, message);
            return FilterReturn::Remove;
        }
        if message.message_type == atoms.net_wm_frame_drawn {
            return self.handle_frame_drawn(id, message);
        }
        if message.message_type == atoms.net_wm_frame_timings {
            return self.handle_frame_timings(id, message);
        }
        FilterReturn::Continue
    }

    /// Stores the counter value the compositor wants the next frame to
    /// start from. It must be even.
    ///
    /// Only the basic form is understood; a nonzero last word marks the
    /// extended form, which is ignored.
    fn handle_sync_request(&mut self, id: SurfaceId, message: &ClientMessageEvent) {
        if !self.conn.frame_drawn_supported() {
            return;
        }
        if message.data[4] != 0 {
            log::debug!("ignoring extended sync request ({})", message.data[4]);
            return;
        }
        let mut value = message.split_u64(2, 3);
        if value % 2 == 1 {
            log::warn!("sync request value {value} is odd; using {}", value + 1);
            value += 1;
        }
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.last_sync_request_value = value;
        }
    }

    fn handle_frame_drawn(&mut self, id: SurfaceId, message: &ClientMessageEvent) -> FilterReturn {
        if !self.conn.frame_drawn_supported() {
            return FilterReturn::Continue;
        }
        let counter = message.split_u64(0, 1);
        if counter == 0 {
            return FilterReturn::Remove;
        }
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return FilterReturn::Remove;
        };
        let Some(head) = surface.queue.head_mut() else {
            log::warn!("_NET_WM_FRAME_DRAWN for counter {counter} with no pending frame");
            return FilterReturn::Remove;
        };
        if head.sync_counter != counter {
            log::warn!(
                "_NET_WM_FRAME_DRAWN counter {counter} does not match pending frame {}",
                head.sync_counter
            );
        }
        if head.composite_end_time.is_some() {
            log::warn!("duplicate _NET_WM_FRAME_DRAWN for counter {counter}");
        }
        head.composite_end_time = Some(HostTime::from_micros(message.split_u64(2, 3)));
        let info = head.clone();
        deliver(&mut self.trace, id, surface, FrameEventKind::Sync, info, false);
        FilterReturn::Remove
    }

    fn handle_frame_timings(&mut self, id: SurfaceId, message: &ClientMessageEvent) -> FilterReturn {
        if !self.conn.frame_drawn_supported() {
            return FilterReturn::Continue;
        }
        let counter = message.split_u64(0, 1);
        if counter == 0 {
            return FilterReturn::Remove;
        }
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return FilterReturn::Remove;
        };
        let Some(mut info) = surface.queue.pop_head() else {
            log::warn!("_NET_WM_FRAME_TIMINGS for counter {counter} with no pending frame");
            return FilterReturn::Remove;
        };
        if info.sync_counter != counter {
            log::warn!(
                "_NET_WM_FRAME_TIMINGS counter {counter} does not match pending frame {}",
                info.sync_counter
            );
        }

        if let Some(composite_end) = info.composite_end_time {
            let presentation_offset = message.data[2];
            let refresh_interval = message.data[3];
            let deadline_offset = message.data[4];

            let presented =
                composite_end.saturating_add(Duration::from_micros(u64::from(presentation_offset)));
            if self.clock.observe_presentation(presented, time::now()) {
                info.presentation_time = Some(presented);
            }
            if refresh_interval != 0 {
                info.refresh_rate = 1_000_000.0_f32 / refresh_interval as f32;
            }
            if deadline_offset & NO_DEADLINE == 0 {
                info.next_refresh_deadline = Some(
                    composite_end.saturating_add(Duration::from_micros(u64::from(deadline_offset))),
                );
            }
        }

        deliver(&mut self.trace, id, surface, FrameEventKind::Complete, info, false);
        FilterReturn::Remove
    }

    fn handle_extension_event(&mut self, extension: &ExtensionEvent) -> FilterReturn {
        if self.conn.frame_drawn_supported()
            || extension.type_code != self.glx_event_base + GLX_BUFFER_SWAP_COMPLETE
        {
            return FilterReturn::Continue;
        }
        let ExtensionPayload::SwapComplete { drawable, ust, .. } = extension.payload else {
            return FilterReturn::Continue;
        };
        let Some(id) = self.surface_for_drawable(drawable) else {
            return FilterReturn::Continue;
        };
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return FilterReturn::Continue;
        };
        let Some(mut info) = surface.queue.pop_head() else {
            log::warn!("swap-complete event for drawable 0x{drawable:08X} with no pending frame");
            return FilterReturn::Remove;
        };
        if ust != 0 && self.clock.observe_ust(ust, time::now()) {
            info.presentation_time = self.clock.ust_to_host(ust);
        }
        deliver(&mut self.trace, id, surface, FrameEventKind::Sync, info.clone(), false);
        deliver(&mut self.trace, id, surface, FrameEventKind::Complete, info, false);
        FilterReturn::Remove
    }
}
