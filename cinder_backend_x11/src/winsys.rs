// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The X11/GLX window-system backend.
//!
//! [`X11Winsys`] owns a [`FilterChain`] and the backend state it filters
//! into. Native events are fed in by the application through
//! [`X11Winsys::handle_event`]; the backend's own filters run in the order
//! they were registered:
//!
//! 1. the RandR filter (registered at connect), which rescans outputs,
//! 2. the surface filter (registered with the context), which handles
//!    window-manager and compositor messages and GLX swap events.
//!
//! Application filters added with [`X11Winsys::add_filter`] run after them.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use cinder_core::backend::{
    FramebufferConfig, OnscreenDescriptor, Rect, SurfaceEvent, SurfaceId, Winsys, WinsysError,
    WinsysFeatures,
};
use cinder_core::clock::PresentationClock;
use cinder_core::frame::{FrameEvent, FrameEventKind, FrameInfo, FrameInfoQueue};
use cinder_core::output::Output;
use cinder_core::trace::{FrameNotifyEvent, OutputsChangedEvent, TraceSink};

use crate::config::X11Config;
use crate::connection::DisplayConnection;
use crate::features::GlxExtensions;
use crate::filter::{FilterChain, FilterId, FilterReturn};
use crate::glx::{FbConfig, Glx, GlxContext, GlxDrawable, GlxLoader};
use crate::native::{XlibDisplay, XlibGlx};
use crate::time;
use crate::xlib::{EventMask, SyncCounter, Window, XEvent, Xlib};

/// Callback selecting events on an adopted foreign window.
pub type ForeignEventMaskFn = Box<dyn FnMut(Window, EventMask)>;

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// The GL context and the fallback drawable that keeps it current.
#[derive(Debug)]
pub(crate) struct ContextState {
    pub(crate) context: GlxContext,
    pub(crate) fbconfig: FbConfig,
    pub(crate) dummy_xwin: Window,
    pub(crate) dummy_glxwin: Option<GlxDrawable>,
    pub(crate) current_drawable: GlxDrawable,
}

impl ContextState {
    pub(crate) fn dummy_drawable(&self) -> GlxDrawable {
        self.dummy_glxwin.unwrap_or(self.dummy_xwin)
    }
}

/// One onscreen surface.
#[derive(Debug)]
pub(crate) struct Onscreen {
    pub(crate) xwin: Window,
    pub(crate) glxwin: Option<GlxDrawable>,
    pub(crate) foreign: bool,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) throttled: bool,
    /// Index 0 is reserved; index 1 carries the frame-sync handshake.
    pub(crate) counters: [u64; 2],
    pub(crate) xcounters: [SyncCounter; 2],
    pub(crate) last_sync_request_value: u64,
    pub(crate) last_swap_vsync_counter: u32,
    pub(crate) output: Option<Rc<Output>>,
    pub(crate) frame_counter: u64,
    pub(crate) queue: FrameInfoQueue,
    pub(crate) events: VecDeque<SurfaceEvent>,
}

impl Onscreen {
    /// The drawable GL renders to.
    pub(crate) fn drawable(&self) -> GlxDrawable {
        self.glxwin.unwrap_or(self.xwin)
    }

    pub(crate) fn owns_drawable(&self, drawable: GlxDrawable) -> bool {
        self.xwin == drawable || self.glxwin == Some(drawable)
    }
}

/// Everything the filters operate on.
pub(crate) struct WinsysState<X: Xlib, G: Glx> {
    pub(crate) conn: DisplayConnection<X>,
    pub(crate) glx: G,
    pub(crate) glx_event_base: i32,
    pub(crate) glx_version: (i32, i32),
    pub(crate) extensions: GlxExtensions,
    pub(crate) features: WinsysFeatures,
    pub(crate) context: Option<ContextState>,
    pub(crate) surfaces: BTreeMap<SurfaceId, Onscreen>,
    pub(crate) next_surface: u32,
    pub(crate) clock: PresentationClock,
    pub(crate) trace: Option<Box<dyn TraceSink>>,
    pub(crate) outputs_changed: bool,
    pub(crate) foreign_event_mask: Option<ForeignEventMaskFn>,
}

impl<X: Xlib, G: Glx> fmt::Debug for WinsysState<X, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinsysState")
            .field("glx_version", &self.glx_version)
            .field("extensions", &self.extensions)
            .field("features", &self.features)
            .field("context", &self.context)
            .field("surfaces", &self.surfaces.len())
            .finish_non_exhaustive()
    }
}

impl<X: Xlib, G: Glx> WinsysState<X, G> {
    /// Runs `f` with the surface taken out of the map, so `f` can use the
    /// rest of the state freely.
    pub(crate) fn with_surface<R>(
        &mut self,
        id: SurfaceId,
        f: impl FnOnce(&mut Self, &mut Onscreen) -> R,
    ) -> Result<R, WinsysError> {
        let mut surface = self
            .surfaces
            .remove(&id)
            .ok_or(WinsysError::UnknownSurface(id))?;
        let result = f(self, &mut surface);
        self.surfaces.insert(id, surface);
        Ok(result)
    }

    pub(crate) fn surface_for_window(&self, window: Window) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .find(|(_, s)| s.xwin == window)
            .map(|(&id, _)| id)
    }

    pub(crate) fn surface_for_drawable(&self, drawable: GlxDrawable) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .find(|(_, s)| s.owns_drawable(drawable))
            .map(|(&id, _)| id)
    }

    /// Rebinds every surface to its best output after a topology change.
    pub(crate) fn outputs_did_change(&mut self, change_count: usize) {
        self.outputs_changed = true;
        for surface in self.surfaces.values_mut() {
            surface.output =
                self.conn
                    .output_for_rectangle(surface.x, surface.y, surface.width, surface.height);
        }
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_outputs_changed(&OutputsChangedEvent {
                output_count: self.conn.outputs().len(),
                change_count,
                timestamp: time::now(),
            });
        }
    }

    pub(crate) fn handle_randr_event(&mut self, event: &XEvent) -> FilterReturn {
        let changes = self.conn.handle_randr_event(event);
        if !changes.is_empty() {
            self.outputs_did_change(changes.len());
        }
        FilterReturn::Continue
    }
}

/// Queues a lifecycle event on `surface` and reports it to the trace sink.
pub(crate) fn deliver(
    trace: &mut Option<Box<dyn TraceSink>>,
    id: SurfaceId,
    surface: &mut Onscreen,
    kind: FrameEventKind,
    info: FrameInfo,
    synthesized: bool,
) {
    if let Some(sink) = trace.as_deref_mut() {
        sink.on_frame_notify(&FrameNotifyEvent {
            surface: id,
            kind,
            frame_counter: info.frame_counter,
            presentation_time: info.presentation_time,
            synthesized,
            timestamp: time::now(),
        });
    }
    surface
        .events
        .push_back(SurfaceEvent::Frame(FrameEvent { kind, info }));
}

// ---------------------------------------------------------------------------
// X11Winsys
// ---------------------------------------------------------------------------

/// The X11/GLX backend.
///
/// The type parameters default to the libX11/libGL binding; tests plug in
/// a scripted server instead.
pub struct X11Winsys<X: Xlib + 'static = XlibDisplay, G: Glx + 'static = XlibGlx> {
    filters: FilterChain<WinsysState<X, G>>,
    state: WinsysState<X, G>,
    randr_filter: FilterId,
    surface_filter: Option<FilterId>,
}

impl<X: Xlib + 'static, G: Glx + 'static> fmt::Debug for X11Winsys<X, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Winsys")
            .field("filters", &self.filters)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<X: Xlib + 'static, G: Glx + 'static> X11Winsys<X, G> {
    /// Builds the backend on a display the application already opened.
    ///
    /// The display is not closed on disconnect; get it back with
    /// [`into_foreign_display`](Self::into_foreign_display).
    pub fn with_native(native: X, glx: G, config: &X11Config) -> Result<Self, WinsysError> {
        Self::setup(DisplayConnection::with_foreign_display(native, config), glx)
    }

    fn setup(conn: DisplayConnection<X>, mut glx: G) -> Result<Self, WinsysError> {
        let Some((_error_base, event_base)) = glx.query_extension() else {
            return Err(WinsysError::MissingGlx);
        };
        let (major, minor) = glx.query_version().ok_or(WinsysError::MissingGlx)?;
        if (major, minor) < (1, 2) {
            return Err(WinsysError::GlxTooOld { major, minor });
        }
        let extensions = GlxExtensions::parse(&glx.extensions_string());
        log::debug!("GLX {major}.{minor}, {extensions:?}");

        let state = WinsysState {
            conn,
            glx,
            glx_event_base: event_base,
            glx_version: (major, minor),
            extensions,
            features: extensions.base_features(),
            context: None,
            surfaces: BTreeMap::new(),
            next_surface: 1,
            clock: PresentationClock::new(),
            trace: None,
            outputs_changed: false,
            foreign_event_mask: None,
        };
        let mut filters = FilterChain::new();
        let randr_filter = filters.add(|state: &mut WinsysState<X, G>, event: &XEvent| {
            state.handle_randr_event(event)
        });
        Ok(Self {
            filters,
            state,
            randr_filter,
            surface_filter: None,
        })
    }

    /// Installs a trace sink, replacing any previous one.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.state.trace = sink;
    }

    /// Routes event selection on adopted foreign windows through `callback`
    /// instead of selecting directly.
    pub fn set_foreign_event_mask_callback(&mut self, callback: Option<ForeignEventMaskFn>) {
        self.state.foreign_event_mask = callback;
    }

    /// Adds an application filter after the backend's own.
    pub fn add_filter(
        &mut self,
        filter: impl FnMut(&mut X, &XEvent) -> FilterReturn + 'static,
    ) -> FilterId {
        let mut filter = filter;
        self.filters
            .add(move |state: &mut WinsysState<X, G>, event: &XEvent| {
                filter(state.conn.native(), event)
            })
    }

    /// Removes an application filter.
    pub fn remove_filter(&mut self, id: FilterId) -> bool {
        if id == self.randr_filter || Some(id) == self.surface_filter {
            return false;
        }
        self.filters.remove(id)
    }

    /// Offers a native event to every filter.
    pub fn handle_event(&mut self, event: &XEvent) -> FilterReturn {
        self.filters.dispatch(&mut self.state, event)
    }

    /// The X window of a surface.
    #[must_use]
    pub fn surface_window(&self, id: SurfaceId) -> Option<Window> {
        self.state.surfaces.get(&id).map(|s| s.xwin)
    }

    /// The output a surface is displayed on, if known.
    #[must_use]
    pub fn surface_output(&self, id: SurfaceId) -> Option<Rc<Output>> {
        self.state.surfaces.get(&id).and_then(|s| s.output.clone())
    }

    /// First GLX event code, for decoding swap-complete events.
    #[must_use]
    pub fn glx_event_base(&self) -> i32 {
        self.state.glx_event_base
    }

    /// The native display.
    pub fn native(&mut self) -> &mut X {
        self.state.conn.native()
    }

    /// Whether the compositor frame-sync handshake drives presentation.
    #[must_use]
    pub fn frame_drawn_supported(&self) -> bool {
        self.state.conn.frame_drawn_supported()
    }

    /// Disconnects, returning an adopted display to the caller.
    pub fn into_foreign_display(mut self) -> Option<X> {
        self.teardown();
        self.state.conn.disconnect()
    }

    fn teardown(&mut self) {
        self.release_context();
        self.filters.remove(self.randr_filter);
    }

    fn release_context(&mut self) {
        if let Some(id) = self.surface_filter.take() {
            self.filters.remove(id);
        }
        self.state.destroy_context();
    }
}

impl<X: Xlib + 'static, G: GlxLoader<X> + 'static> Winsys for X11Winsys<X, G> {
    type Config = X11Config;

    fn connect(config: X11Config) -> Result<Self, WinsysError> {
        let mut conn = DisplayConnection::open(&config)?;
        let glx = G::load(conn.native()).ok_or(WinsysError::MissingGlx)?;
        Self::setup(conn, glx)
    }

    fn disconnect(mut self) {
        self.teardown();
        _ = self.state.conn.disconnect();
    }

    fn features(&self) -> WinsysFeatures {
        self.state.features
    }

    fn outputs(&self) -> &[Rc<Output>] {
        self.state.conn.outputs()
    }

    fn take_outputs_changed(&mut self) -> bool {
        std::mem::take(&mut self.state.outputs_changed)
    }

    fn create_context(&mut self, config: &FramebufferConfig) -> Result<(), WinsysError> {
        self.release_context();
        self.state.create_context(config)?;
        self.surface_filter = Some(self.filters.add(
            |state: &mut WinsysState<X, G>, event: &XEvent| state.handle_surface_event(event),
        ));
        Ok(())
    }

    fn destroy_context(&mut self) {
        self.release_context();
    }

    fn create_onscreen(&mut self, descriptor: &OnscreenDescriptor) -> Result<SurfaceId, WinsysError> {
        self.state.create_onscreen(descriptor)
    }

    fn destroy_onscreen(&mut self, id: SurfaceId) -> Result<(), WinsysError> {
        self.state.destroy_onscreen(id)
    }

    fn bind(&mut self, id: SurfaceId) -> Result<(), WinsysError> {
        self.state.bind(id)
    }

    fn swap_buffers(&mut self, id: SurfaceId, damage: &[Rect]) -> Result<(), WinsysError> {
        self.state.swap_buffers(id, damage)
    }

    fn swap_region(&mut self, id: SurfaceId, rects: &[Rect]) -> Result<(), WinsysError> {
        self.state.swap_region(id, rects)
    }

    fn buffer_age(&mut self, id: SurfaceId) -> Result<u32, WinsysError> {
        self.state.buffer_age(id)
    }

    fn set_visibility(&mut self, id: SurfaceId, visible: bool) -> Result<(), WinsysError> {
        self.state.set_visibility(id, visible)
    }

    fn set_resizable(&mut self, id: SurfaceId, resizable: bool) -> Result<(), WinsysError> {
        self.state.set_resizable(id, resizable)
    }

    fn set_swap_throttled(&mut self, id: SurfaceId, throttled: bool) -> Result<(), WinsysError> {
        self.state.set_swap_throttled(id, throttled)
    }

    fn take_events(&mut self, id: SurfaceId) -> Result<Vec<SurfaceEvent>, WinsysError> {
        let surface = self
            .state
            .surfaces
            .get_mut(&id)
            .ok_or(WinsysError::UnknownSurface(id))?;
        Ok(surface.events.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCrtc, FakeDisplay, FakeGlx, FakeServer, RANDR_EVENT_BASE};
    use crate::xlib::{ExtensionEvent, ExtensionPayload, RR_SCREEN_CHANGE_NOTIFY, XEventKind};

    type TestWinsys = X11Winsys<FakeDisplay, FakeGlx>;

    fn connect(server: FakeServer) -> (TestWinsys, Rc<std::cell::RefCell<FakeServer>>) {
        let (display, glx, server) = server.split_with_glx();
        let winsys = TestWinsys::with_native(display, glx, &X11Config::default())
            .unwrap_or_else(|e| panic!("connect failed: {e}"));
        (winsys, server)
    }

    #[test]
    fn missing_glx_fails_connect() {
        let mut server = FakeServer::new();
        server.glx_missing = true;
        let (display, glx, _) = server.split_with_glx();
        let result = TestWinsys::with_native(display, glx, &X11Config::default());
        assert!(matches!(result, Err(WinsysError::MissingGlx)));
    }

    #[test]
    fn old_glx_fails_connect() {
        let mut server = FakeServer::new();
        server.glx_version = (1, 1);
        let (display, glx, _) = server.split_with_glx();
        let result = TestWinsys::with_native(display, glx, &X11Config::default());
        assert!(matches!(
            result,
            Err(WinsysError::GlxTooOld { major: 1, minor: 1 })
        ));
    }

    #[test]
    fn unreachable_display_fails_connect() {
        let config = X11Config {
            display_name: Some(crate::fake::UNREACHABLE_DISPLAY.to_owned()),
            ..X11Config::default()
        };
        assert!(matches!(
            TestWinsys::connect(config),
            Err(WinsysError::DisplayOpen)
        ));
    }

    #[test]
    fn connect_loads_glx_for_the_opened_display() {
        let winsys = TestWinsys::connect(X11Config::default())
            .unwrap_or_else(|e| panic!("connect failed: {e}"));
        assert_eq!(winsys.glx_event_base(), crate::fake::GLX_EVENT_BASE);
        assert!(winsys.features().multiple_onscreen);
        winsys.disconnect();
    }

    #[test]
    fn base_features_follow_extension_string() {
        let (winsys, _) = connect(
            FakeServer::new().with_glx_extensions("GLX_SGI_swap_control GLX_EXT_buffer_age"),
        );
        let features = winsys.features();
        assert!(features.multiple_onscreen);
        assert!(features.swap_throttle);
        assert!(features.buffer_age);
        assert!(!features.vblank_wait);
    }

    #[test]
    fn randr_event_sets_outputs_changed_and_rebinds_surfaces() {
        let mut server = FakeServer::new();
        server.add_crtc(FakeCrtc::new("DP-1", 0, 0, 1920, 1080, 60.0));
        let (mut winsys, server) = connect(server);
        winsys
            .create_context(&FramebufferConfig::default())
            .unwrap_or_else(|e| panic!("{e}"));
        let id = winsys
            .create_onscreen(&OnscreenDescriptor::new(640, 480))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            winsys.surface_output(id).map(|o| o.name().to_owned()),
            Some("DP-1".to_owned())
        );
        assert!(!winsys.take_outputs_changed(), "initial scan is silent");

        {
            let mut s = server.borrow_mut();
            s.remove_crtc("DP-1");
            s.add_crtc(FakeCrtc::new("HDMI-1", 0, 0, 1920, 1080, 50.0));
        }
        let serial = server.borrow().serial;
        let event = XEvent {
            serial,
            kind: XEventKind::Extension(ExtensionEvent {
                type_code: RANDR_EVENT_BASE + RR_SCREEN_CHANGE_NOTIFY,
                payload: ExtensionPayload::Empty,
            }),
        };
        assert_eq!(winsys.handle_event(&event), FilterReturn::Continue);
        assert!(winsys.take_outputs_changed());
        assert!(!winsys.take_outputs_changed());
        assert_eq!(
            winsys.surface_output(id).map(|o| o.name().to_owned()),
            Some("HDMI-1".to_owned())
        );
    }

    #[test]
    fn repeated_randr_event_without_changes_is_silent() {
        let mut server = FakeServer::new();
        server.add_crtc(FakeCrtc::new("DP-1", 0, 0, 1920, 1080, 60.0));
        let (mut winsys, server) = connect(server);
        let before = winsys.outputs().to_vec();
        let event = XEvent {
            serial: server.borrow().serial,
            kind: XEventKind::Extension(ExtensionEvent {
                type_code: RANDR_EVENT_BASE + RR_SCREEN_CHANGE_NOTIFY,
                payload: ExtensionPayload::Empty,
            }),
        };
        _ = winsys.handle_event(&event);
        assert!(!winsys.take_outputs_changed());
        assert!(
            Rc::ptr_eq(&before[0], &winsys.outputs()[0]),
            "an unchanged output keeps its identity"
        );
    }

    #[test]
    fn application_filters_run_after_backend_filters() {
        let (mut winsys, _) = connect(FakeServer::new());
        let seen = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&seen);
        let id = winsys.add_filter(move |_, _| {
            counter.set(counter.get() + 1);
            FilterReturn::Remove
        });
        let event = XEvent {
            serial: 0,
            kind: XEventKind::Other(2),
        };
        assert_eq!(winsys.handle_event(&event), FilterReturn::Remove);
        assert_eq!(seen.get(), 1);
        assert!(winsys.remove_filter(id));
        assert_eq!(winsys.handle_event(&event), FilterReturn::Continue);
    }

    #[test]
    fn foreign_display_survives_disconnect() {
        let (winsys, _) = connect(FakeServer::new());
        assert!(winsys.into_foreign_display().is_some());
    }

    #[test]
    fn foreign_disconnect_releases_the_context() {
        let (mut winsys, server) = connect(FakeServer::new());
        assert_eq!(winsys.create_context(&FramebufferConfig::default()), Ok(()));
        assert_eq!(server.borrow().contexts.len(), 1);
        let display = winsys.into_foreign_display();
        assert!(display.is_some());
        assert!(server.borrow().contexts.is_empty(), "context destroyed");
        assert!(
            !server.borrow().windows.keys().any(|&w| w != crate::fake::ROOT),
            "fallback window destroyed"
        );
    }

    #[test]
    fn take_events_on_unknown_surface_fails() {
        let (mut winsys, _) = connect(FakeServer::new());
        assert_eq!(
            winsys.take_events(SurfaceId(42)),
            Err(WinsysError::UnknownSurface(SurfaceId(42)))
        );
    }
}
