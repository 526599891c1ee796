// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Onscreen surface setup, teardown and window-manager properties.

use std::collections::VecDeque;

use cinder_core::backend::{OnscreenDescriptor, SurfaceId, WinsysError};
use cinder_core::frame::FrameInfoQueue;

use crate::glx::{GLX_BACK_BUFFER_AGE_EXT, GLX_BUFFER_SWAP_COMPLETE_INTEL_MASK, GLX_SAMPLES, Glx};
use crate::winsys::{Onscreen, WinsysState};
use crate::xlib::{EventMask, SizeHints, Window, WindowDesc, XA_ATOM, XA_CARDINAL, Xlib};

const SURFACE_EVENTS: EventMask = EventMask(EventMask::STRUCTURE_NOTIFY.0 | EventMask::EXPOSURE.0);

/// Where a new surface's window came from.
struct WindowSetup {
    xwin: Window,
    foreign: bool,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

fn process_id() -> u64 {
    let raw = rustix::process::Pid::as_raw(Some(rustix::process::getpid()));
    u64::try_from(raw).unwrap_or(0)
}

impl<X: Xlib, G: Glx> WinsysState<X, G> {
    pub(crate) fn create_onscreen(
        &mut self,
        descriptor: &OnscreenDescriptor,
    ) -> Result<SurfaceId, WinsysError> {
        let fbconfig = self
            .context
            .as_ref()
            .ok_or(WinsysError::NoContext)?
            .fbconfig;

        if descriptor.framebuffer.samples_per_pixel > 0
            && let Some(samples) = self.glx.fb_config_attrib(fbconfig, GLX_SAMPLES)
        {
            log::debug!("onscreen framebuffer has {samples} samples per pixel");
        }

        let setup = match descriptor.foreign_window {
            Some(xid) => self.adopt_foreign_window(xid)?,
            None => self.create_surface_window(descriptor)?,
        };

        let mut xcounters = [0; 2];
        if self.conn.sync_available() {
            for counter in &mut xcounters {
                *counter = self.conn.native().sync_create_counter(0);
            }
        }

        if !setup.foreign {
            self.set_window_properties(setup.xwin, xcounters);
        }

        let glxwin = (self.glx_version >= (1, 3)).then(|| self.glx.create_window(fbconfig, setup.xwin));
        let drawable = glxwin.unwrap_or(setup.xwin);
        if self.extensions.swap_event {
            self.glx
                .select_event(drawable, GLX_BUFFER_SWAP_COMPLETE_INTEL_MASK);
        }

        let output = self
            .conn
            .output_for_rectangle(setup.x, setup.y, setup.width, setup.height);

        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(
            id,
            Onscreen {
                xwin: setup.xwin,
                glxwin,
                foreign: setup.foreign,
                x: setup.x,
                y: setup.y,
                width: setup.width,
                height: setup.height,
                throttled: descriptor.framebuffer.swap_throttled,
                counters: [0; 2],
                xcounters,
                last_sync_request_value: 0,
                last_swap_vsync_counter: 0,
                output,
                frame_counter: 0,
                queue: FrameInfoQueue::new(),
                events: VecDeque::new(),
            },
        );
        log::debug!(
            "created surface {id:?}: window 0x{:08X}, {}x{}",
            setup.xwin,
            setup.width,
            setup.height
        );
        Ok(id)
    }

    fn adopt_foreign_window(&mut self, xid: Window) -> Result<WindowSetup, WinsysError> {
        let token = self.conn.trap();
        let attributes = self.conn.native().get_window_attributes(xid);
        self.conn.native().sync();
        let code = self.conn.untrap(token);
        let attributes = match attributes {
            Some(attributes) if code == 0 => attributes,
            _ => return Err(WinsysError::ForeignWindow { xid, code }),
        };

        let mask = attributes.your_event_mask | SURFACE_EVENTS;
        match self.foreign_event_mask.as_mut() {
            Some(callback) => callback(xid, mask),
            None => self.conn.native().select_input(xid, mask),
        }

        Ok(WindowSetup {
            xwin: xid,
            foreign: true,
            x: attributes.x,
            y: attributes.y,
            width: attributes.width,
            height: attributes.height,
        })
    }

    fn create_surface_window(
        &mut self,
        descriptor: &OnscreenDescriptor,
    ) -> Result<WindowSetup, WinsysError> {
        let fbconfig = self
            .context
            .as_ref()
            .ok_or(WinsysError::NoContext)?
            .fbconfig;
        let visual = self
            .glx
            .visual_from_fb_config(fbconfig)
            .ok_or(WinsysError::NoVisual)?;
        let width = descriptor.width.max(1);
        let height = descriptor.height.max(1);

        let root = self.conn.root();
        let token = self.conn.trap();
        let xwin = self.conn.native().create_window(
            root,
            &WindowDesc {
                x: 0,
                y: 0,
                width: width.unsigned_abs(),
                height: height.unsigned_abs(),
                visual,
                override_redirect: false,
                event_mask: SURFACE_EVENTS,
            },
        );
        self.conn.native().sync();
        let code = self.conn.untrap(token);
        if code != 0 {
            return Err(WinsysError::CreateWindow { code });
        }

        Ok(WindowSetup {
            xwin,
            foreign: false,
            x: 0,
            y: 0,
            width,
            height,
        })
    }

    fn set_window_properties(&mut self, xwin: Window, xcounters: [u64; 2]) {
        let atoms = *self.conn.atoms();
        let native = self.conn.native();
        native.set_wm_protocols(
            xwin,
            &[
                atoms.wm_delete_window,
                atoms.wm_take_focus,
                atoms.net_wm_ping,
                atoms.net_wm_sync_request,
            ],
        );
        native.change_property(xwin, atoms.net_wm_pid, XA_CARDINAL, &[process_id()]);
        native.change_property(
            xwin,
            atoms.net_wm_window_type,
            XA_ATOM,
            &[atoms.net_wm_window_type_normal],
        );
        if xcounters[0] != 0 {
            native.change_property(
                xwin,
                atoms.net_wm_sync_request_counter,
                XA_CARDINAL,
                &xcounters,
            );
        }
    }

    pub(crate) fn destroy_onscreen(&mut self, id: SurfaceId) -> Result<(), WinsysError> {
        let surface = self
            .surfaces
            .remove(&id)
            .ok_or(WinsysError::UnknownSurface(id))?;
        let drawable = surface.drawable();

        let token = self.conn.trap();
        if let Some(context) = self.context.as_mut()
            && context.current_drawable == drawable
        {
            let dummy = context.dummy_drawable();
            self.glx.make_context_current(dummy, Some(context.context));
            context.current_drawable = dummy;
        }
        if let Some(glxwin) = surface.glxwin {
            self.glx.destroy_window(glxwin);
        }
        let native = self.conn.native();
        if !surface.foreign {
            native.destroy_window(surface.xwin);
        }
        for counter in surface.xcounters {
            if counter != 0 {
                native.sync_destroy_counter(counter);
            }
        }
        native.sync();
        let code = self.conn.untrap(token);
        if code != 0 {
            log::warn!("X error {code} while destroying surface {id:?}");
        }
        Ok(())
    }

    pub(crate) fn buffer_age(&mut self, id: SurfaceId) -> Result<u32, WinsysError> {
        let drawable = self
            .surfaces
            .get(&id)
            .ok_or(WinsysError::UnknownSurface(id))?
            .drawable();
        if !self.features.buffer_age {
            return Ok(0);
        }
        Ok(self.glx.query_drawable(drawable, GLX_BACK_BUFFER_AGE_EXT))
    }

    pub(crate) fn set_visibility(&mut self, id: SurfaceId, visible: bool) -> Result<(), WinsysError> {
        let xwin = self
            .surfaces
            .get(&id)
            .ok_or(WinsysError::UnknownSurface(id))?
            .xwin;
        if visible {
            self.conn.native().map_window(xwin);
        } else {
            self.conn.native().unmap_window(xwin);
        }
        Ok(())
    }

    pub(crate) fn set_resizable(&mut self, id: SurfaceId, resizable: bool) -> Result<(), WinsysError> {
        let surface = self
            .surfaces
            .get(&id)
            .ok_or(WinsysError::UnknownSurface(id))?;
        let hints = if resizable {
            SizeHints {
                min_width: 1,
                min_height: 1,
                max_width: i32::MAX,
                max_height: i32::MAX,
            }
        } else {
            SizeHints {
                min_width: surface.width,
                min_height: surface.height,
                max_width: surface.width,
                max_height: surface.height,
            }
        };
        let xwin = surface.xwin;
        self.conn.native().set_wm_normal_hints(xwin, &hints);
        Ok(())
    }

    /// Changes throttling; a surface that is current is rebound so the swap
    /// interval follows.
    pub(crate) fn set_swap_throttled(
        &mut self,
        id: SurfaceId,
        throttled: bool,
    ) -> Result<(), WinsysError> {
        self.with_surface(id, |state, surface| {
            surface.throttled = throttled;
            let Some(context) = state.context.as_mut() else {
                return Ok(());
            };
            if context.current_drawable != surface.drawable() {
                return Ok(());
            }
            context.current_drawable = 0;
            state.bind_onscreen(surface)
        })?
    }
}
