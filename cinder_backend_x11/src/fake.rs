// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted in-process X server for tests.
//!
//! [`FakeDisplay`] implements [`Xlib`] and [`FakeGlx`] implements [`Glx`];
//! both share one [`FakeServer`] so errors raised by GLX calls reach the
//! error handler installed through Xlib, as on a real connection. Errors are
//! reported synchronously from the failing call.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::glx::{FbConfig, GLX_SAMPLES, Glx, GlxContext, GlxDrawable, GlxLoader, SyncValues};
use crate::xlib::{
    Atom, ClientMessageEvent, CrtcInfo, ErrorEvent, ErrorHandler, EventMask, ExtensionInfo,
    ModeInfo, OutputInfo, Property, RandrXid, ScreenResources, SizeHints, SyncCounter,
    VisualInfo, Window, WindowAttributes, WindowDesc, XA_ATOM, XA_CARDINAL, Xlib,
};

/// Display name for which [`FakeDisplay::open`] fails.
pub(crate) const UNREACHABLE_DISPLAY: &str = ":unreachable";

/// Root window id.
pub(crate) const ROOT: Window = 0x1;

/// RandR event base reported by the fake.
pub(crate) const RANDR_EVENT_BASE: i32 = 89;

/// GLX event base reported by the fake.
pub(crate) const GLX_EVENT_BASE: i32 = 95;

/// `BadWindow`.
pub(crate) const BAD_WINDOW: u8 = 3;

/// `BadMatch`.
pub(crate) const BAD_MATCH: u8 = 8;

const CRTC_BASE: RandrXid = 0x100;
const MODE_BASE: RandrXid = 0x200;
const OUTPUT_BASE: RandrXid = 0x300;

/// A scripted CRTC with one output.
#[derive(Clone, Debug)]
pub(crate) struct FakeCrtc {
    pub(crate) name: String,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) refresh_hz: f64,
    pub(crate) enabled: bool,
    pub(crate) mm: (i32, i32),
    pub(crate) subpixel: u16,
    pub(crate) rotation: u16,
}

impl FakeCrtc {
    pub(crate) fn new(name: &str, x: i32, y: i32, width: u32, height: u32, refresh_hz: f64) -> Self {
        Self {
            name: name.to_owned(),
            x,
            y,
            width,
            height,
            refresh_hz,
            enabled: true,
            mm: (0, 0),
            subpixel: 0,
            rotation: 1,
        }
    }

    pub(crate) fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub(crate) fn with_physical_size(mut self, mm_width: i32, mm_height: i32) -> Self {
        self.mm = (mm_width, mm_height);
        self
    }

    pub(crate) fn with_subpixel(mut self, raw: u16) -> Self {
        self.subpixel = raw;
        self
    }

    pub(crate) fn with_rotation(mut self, rotation: u16) -> Self {
        self.rotation = rotation;
        self
    }
}

/// A window known to the fake server.
#[derive(Clone, Debug)]
pub(crate) struct FakeWindow {
    pub(crate) parent: Window,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) mapped: bool,
    pub(crate) override_redirect: bool,
    pub(crate) event_mask: EventMask,
}

/// A framebuffer config offered by the fake GLX.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FakeFbConfig {
    pub(crate) config: FbConfig,
    pub(crate) visual: Option<VisualInfo>,
    pub(crate) samples: i32,
}

/// A GL or GLX call that has no other observable effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GlCall {
    Finish,
    Flush,
    DisableScissor,
    DrawBuffer(u32),
    Blit {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
    },
    CopySubBuffer {
        drawable: GlxDrawable,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    SwapBuffers(GlxDrawable),
    SwapInterval(i32),
    GetVideoSync,
    WaitVideoSync,
    WaitForMsc,
}

/// Shared state of the scripted server.
#[derive(Default)]
pub(crate) struct FakeServer {
    pub(crate) serial: u64,
    pub(crate) synchronous: bool,
    pub(crate) error_handler: Option<ErrorHandler>,
    next_xid: u64,

    pub(crate) atoms: BTreeMap<String, Atom>,
    pub(crate) windows: BTreeMap<Window, FakeWindow>,
    pub(crate) properties: BTreeMap<(Window, Atom), Property>,
    pub(crate) wm_protocols: BTreeMap<Window, Vec<Atom>>,
    pub(crate) normal_hints: BTreeMap<Window, SizeHints>,
    pub(crate) focus: Option<Window>,
    pub(crate) sent_messages: Vec<(Window, EventMask, ClientMessageEvent)>,
    pub(crate) fail_create_window: Option<u8>,

    pub(crate) advertise_frame_drawn: bool,
    pub(crate) net_supported_bytes_after: u64,
    pub(crate) sync_missing: bool,
    pub(crate) counters: BTreeMap<SyncCounter, u64>,
    pub(crate) counter_writes: Vec<(SyncCounter, u64)>,

    pub(crate) randr_missing: bool,
    pub(crate) crtcs: Vec<FakeCrtc>,
    pub(crate) fail_screen_resources: bool,
    pub(crate) fail_crtc_info: bool,
    pub(crate) error_on_crtc_info: Option<u8>,

    pub(crate) glx_missing: bool,
    pub(crate) glx_version: (i32, i32),
    pub(crate) glx_extensions: String,
    pub(crate) has_blit: bool,
    pub(crate) indirect: bool,
    pub(crate) fb_configs: Vec<FakeFbConfig>,
    pub(crate) last_fb_attributes: Vec<i32>,
    pub(crate) fail_context_attribs: bool,
    pub(crate) fail_new_context: bool,
    pub(crate) contexts: Vec<GlxContext>,
    pub(crate) context_attribs: Option<Vec<i32>>,
    pub(crate) glx_windows: BTreeMap<GlxDrawable, Window>,
    pub(crate) glx_selected: BTreeMap<GlxDrawable, u64>,
    pub(crate) current: Option<(GlxDrawable, Option<GlxContext>)>,
    pub(crate) bind_log: Vec<GlxDrawable>,
    pub(crate) fail_bind: Option<(GlxDrawable, u8)>,
    pub(crate) fail_next_bind: Option<u8>,
    pub(crate) gl_calls: Vec<GlCall>,
    pub(crate) video_sync: u32,
    pub(crate) ust: u64,
    pub(crate) back_buffer_age: u32,
}

impl FakeServer {
    /// A server with GLX 1.4, no optional extensions and one RGB config.
    pub(crate) fn new() -> Self {
        let mut server = Self {
            next_xid: 0x40_0000,
            glx_version: (1, 4),
            ..Self::default()
        };
        server.atoms.insert("ATOM".to_owned(), XA_ATOM);
        server.atoms.insert("CARDINAL".to_owned(), XA_CARDINAL);
        server.windows.insert(
            ROOT,
            FakeWindow {
                parent: 0,
                x: 0,
                y: 0,
                width: 3840,
                height: 1080,
                mapped: true,
                override_redirect: false,
                event_mask: EventMask::default(),
            },
        );
        server.fb_configs.push(FakeFbConfig {
            config: FbConfig(0x10),
            visual: Some(rgb_visual(0x21, 24)),
            samples: 0,
        });
        server
    }

    /// Appends a 32-bit ARGB config after the default one.
    pub(crate) fn with_argb_config(mut self) -> Self {
        self.fb_configs.push(FakeFbConfig {
            config: FbConfig(0x11),
            visual: Some(rgb_visual(0x22, 32)),
            samples: 0,
        });
        self
    }

    /// Sets the GLX extension string.
    pub(crate) fn with_glx_extensions(mut self, extensions: &str) -> Self {
        extensions.clone_into(&mut self.glx_extensions);
        self
    }

    pub(crate) fn split(self) -> (FakeDisplay, Rc<RefCell<Self>>) {
        let server = Rc::new(RefCell::new(self));
        (
            FakeDisplay {
                server: Rc::clone(&server),
            },
            server,
        )
    }

    pub(crate) fn split_with_glx(self) -> (FakeDisplay, FakeGlx, Rc<RefCell<Self>>) {
        let (display, server) = self.split();
        let glx = FakeGlx {
            server: Rc::clone(&server),
        };
        (display, glx, server)
    }

    pub(crate) fn add_crtc(&mut self, crtc: FakeCrtc) {
        self.crtcs.push(crtc);
    }

    pub(crate) fn remove_crtc(&mut self, name: &str) {
        self.crtcs.retain(|c| c.name != name);
    }

    pub(crate) fn atom(&self, name: &str) -> Atom {
        self.atoms.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn counter_value(&self, counter: SyncCounter) -> Option<u64> {
        self.counters.get(&counter).copied()
    }

    fn alloc_xid(&mut self) -> u64 {
        self.next_xid += 1;
        self.next_xid
    }

    fn request(&mut self) {
        self.serial += 1;
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "scripted refresh rates are small positive values"
)]
fn dot_clock(refresh_hz: f64) -> u64 {
    (refresh_hz * 1_000_000.0).round() as u64
}

fn rgb_visual(visual_id: u64, depth: u32) -> VisualInfo {
    VisualInfo {
        visual_id,
        depth,
        red_mask: 0xff_0000,
        green_mask: 0xff00,
        blue_mask: 0xff,
    }
}

fn raise(server: &Rc<RefCell<FakeServer>>, error_code: u8, resource_id: u64) {
    let (handler, serial) = {
        let s = server.borrow();
        (s.error_handler.clone(), s.serial)
    };
    let event = ErrorEvent {
        error_code,
        request_code: 0,
        resource_id,
        serial,
    };
    match handler {
        Some(handler) => handler(&event),
        None => panic!("X error {error_code} with no handler installed"),
    }
}

// ---------------------------------------------------------------------------
// Xlib
// ---------------------------------------------------------------------------

/// Client side of the fake server.
pub(crate) struct FakeDisplay {
    server: Rc<RefCell<FakeServer>>,
}

impl FakeDisplay {
    /// Delivers a protocol error to the installed handler.
    pub(crate) fn raise_error(&mut self, code: u8) {
        raise(&self.server, code, 0);
    }
}

impl Xlib for FakeDisplay {
    fn open(display_name: Option<&str>) -> Option<Self> {
        if display_name == Some(UNREACHABLE_DISPLAY) {
            return None;
        }
        Some(FakeServer::new().split().0)
    }

    fn set_synchronous(&mut self, synchronous: bool) {
        self.server.borrow_mut().synchronous = synchronous;
    }

    fn set_error_handler(&mut self, handler: Option<ErrorHandler>) -> Option<ErrorHandler> {
        std::mem::replace(&mut self.server.borrow_mut().error_handler, handler)
    }

    fn next_request(&self) -> u64 {
        self.server.borrow().serial + 1
    }

    fn sync(&mut self) {
        self.server.borrow_mut().request();
    }

    fn flush(&mut self) {}

    fn default_root_window(&self) -> Window {
        ROOT
    }

    fn intern_atom(&mut self, name: &str) -> Atom {
        let mut s = self.server.borrow_mut();
        s.request();
        if let Some(&atom) = s.atoms.get(name) {
            return atom;
        }
        let atom = 100 + s.atoms.len() as u64;
        s.atoms.insert(name.to_owned(), atom);
        atom
    }

    fn query_extension(&mut self, name: &str) -> Option<ExtensionInfo> {
        let s = self.server.borrow();
        match name {
            "RANDR" if !s.randr_missing => Some(ExtensionInfo {
                event_base: RANDR_EVENT_BASE,
                error_base: 147,
            }),
            _ => None,
        }
    }

    fn get_property(&mut self, window: Window, property: Atom, _type_: Atom) -> Option<Property> {
        let mut s = self.server.borrow_mut();
        s.request();
        if window == ROOT && property == s.atom("_NET_SUPPORTED") {
            let mut items = vec![s.atom("_NET_WM_PING")];
            if s.advertise_frame_drawn {
                items.push(s.atom("_NET_WM_FRAME_DRAWN"));
            }
            return Some(Property {
                type_: XA_ATOM,
                format: 32,
                items,
                bytes_after: s.net_supported_bytes_after,
            });
        }
        s.properties.get(&(window, property)).cloned()
    }

    fn change_property(&mut self, window: Window, property: Atom, type_: Atom, items: &[u64]) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.properties.insert(
            (window, property),
            Property {
                type_,
                format: 32,
                items: items.to_vec(),
                bytes_after: 0,
            },
        );
    }

    fn set_wm_protocols(&mut self, window: Window, protocols: &[Atom]) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.wm_protocols.insert(window, protocols.to_vec());
    }

    fn set_wm_normal_hints(&mut self, window: Window, hints: &SizeHints) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.normal_hints.insert(window, *hints);
    }

    fn create_window(&mut self, parent: Window, desc: &WindowDesc) -> Window {
        let failure = {
            let mut s = self.server.borrow_mut();
            s.request();
            s.fail_create_window
        };
        if let Some(code) = failure {
            raise(&self.server, code, parent);
            return 0;
        }
        let mut s = self.server.borrow_mut();
        let window = s.alloc_xid();
        s.windows.insert(
            window,
            FakeWindow {
                parent,
                x: desc.x,
                y: desc.y,
                width: i32::try_from(desc.width).unwrap_or(i32::MAX),
                height: i32::try_from(desc.height).unwrap_or(i32::MAX),
                mapped: false,
                override_redirect: desc.override_redirect,
                event_mask: desc.event_mask,
            },
        );
        window
    }

    fn destroy_window(&mut self, window: Window) {
        let known = {
            let mut s = self.server.borrow_mut();
            s.request();
            s.windows.remove(&window).is_some()
        };
        if !known {
            raise(&self.server, BAD_WINDOW, window);
        }
    }

    fn map_window(&mut self, window: Window) {
        let mut s = self.server.borrow_mut();
        s.request();
        if let Some(w) = s.windows.get_mut(&window) {
            w.mapped = true;
        }
    }

    fn unmap_window(&mut self, window: Window) {
        let mut s = self.server.borrow_mut();
        s.request();
        if let Some(w) = s.windows.get_mut(&window) {
            w.mapped = false;
        }
    }

    fn select_input(&mut self, window: Window, mask: EventMask) {
        let mut s = self.server.borrow_mut();
        s.request();
        if let Some(w) = s.windows.get_mut(&window) {
            w.event_mask = mask;
        }
    }

    fn get_window_attributes(&mut self, window: Window) -> Option<WindowAttributes> {
        let attributes = {
            let mut s = self.server.borrow_mut();
            s.request();
            s.windows.get(&window).map(|w| WindowAttributes {
                x: w.x,
                y: w.y,
                width: w.width,
                height: w.height,
                your_event_mask: w.event_mask,
            })
        };
        if attributes.is_none() {
            raise(&self.server, BAD_WINDOW, window);
        }
        attributes
    }

    fn translate_coordinates(
        &mut self,
        src: Window,
        dest: Window,
        x: i32,
        y: i32,
    ) -> Option<(i32, i32)> {
        let mut s = self.server.borrow_mut();
        s.request();
        if dest != ROOT {
            return None;
        }
        let (mut ax, mut ay) = (x, y);
        let mut window = src;
        while window != ROOT {
            let w = s.windows.get(&window)?;
            ax += w.x;
            ay += w.y;
            window = w.parent;
        }
        Some((ax, ay))
    }

    fn set_input_focus(&mut self, window: Window, _time: u64) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.focus = Some(window);
    }

    fn send_client_message(
        &mut self,
        destination: Window,
        _propagate: bool,
        mask: EventMask,
        message: &ClientMessageEvent,
    ) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.sent_messages.push((destination, mask, *message));
    }

    fn sync_initialize(&mut self) -> bool {
        !self.server.borrow().sync_missing
    }

    fn sync_create_counter(&mut self, initial: u64) -> SyncCounter {
        let mut s = self.server.borrow_mut();
        s.request();
        let counter = s.alloc_xid();
        s.counters.insert(counter, initial);
        counter
    }

    fn sync_set_counter(&mut self, counter: SyncCounter, value: u64) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.counters.insert(counter, value);
        s.counter_writes.push((counter, value));
    }

    fn sync_destroy_counter(&mut self, counter: SyncCounter) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.counters.remove(&counter);
    }

    fn randr_query_extension(&mut self) -> Option<ExtensionInfo> {
        self.query_extension("RANDR")
    }

    fn randr_select_input(&mut self, _window: Window, _mask: u32) {
        self.server.borrow_mut().request();
    }

    fn randr_screen_resources(&mut self, _root: Window) -> Option<ScreenResources> {
        let mut s = self.server.borrow_mut();
        s.request();
        if s.fail_screen_resources {
            return None;
        }
        let mut resources = ScreenResources::default();
        for (index, crtc) in (0_u64..).zip(&s.crtcs) {
            resources.crtcs.push(CRTC_BASE + index);
            resources.modes.push(ModeInfo {
                id: MODE_BASE + index,
                dot_clock: dot_clock(crtc.refresh_hz),
                h_total: 1000,
                v_total: 1000,
            });
        }
        Some(resources)
    }

    fn randr_crtc_info(
        &mut self,
        _resources: &ScreenResources,
        crtc: RandrXid,
    ) -> Option<CrtcInfo> {
        let (info, error) = {
            let mut s = self.server.borrow_mut();
            s.request();
            if s.fail_crtc_info {
                return None;
            }
            let index = crtc.checked_sub(CRTC_BASE)?;
            let c = s.crtcs.get(usize::try_from(index).ok()?)?;
            let info = CrtcInfo {
                x: c.x,
                y: c.y,
                width: c.width,
                height: c.height,
                mode: c.enabled.then_some(MODE_BASE + index),
                rotation: c.rotation,
                outputs: if c.enabled {
                    vec![OUTPUT_BASE + index]
                } else {
                    Vec::new()
                },
            };
            (info, s.error_on_crtc_info)
        };
        if let Some(code) = error {
            raise(&self.server, code, crtc);
        }
        Some(info)
    }

    fn randr_output_info(
        &mut self,
        _resources: &ScreenResources,
        output: RandrXid,
    ) -> Option<OutputInfo> {
        let mut s = self.server.borrow_mut();
        s.request();
        let index = output.checked_sub(OUTPUT_BASE)?;
        let c = s.crtcs.get(usize::try_from(index).ok()?)?;
        Some(OutputInfo {
            name: c.name.clone(),
            mm_width: c.mm.0,
            mm_height: c.mm.1,
            subpixel_order: c.subpixel,
        })
    }
}

// ---------------------------------------------------------------------------
// Glx
// ---------------------------------------------------------------------------

/// GLX side of the fake server.
pub(crate) struct FakeGlx {
    server: Rc<RefCell<FakeServer>>,
}

impl GlxLoader<FakeDisplay> for FakeGlx {
    fn load(display: &FakeDisplay) -> Option<Self> {
        Some(Self {
            server: Rc::clone(&display.server),
        })
    }
}

impl FakeGlx {
    fn record(&self, call: GlCall) {
        self.server.borrow_mut().gl_calls.push(call);
    }
}

impl Glx for FakeGlx {
    fn query_extension(&mut self) -> Option<(i32, i32)> {
        let s = self.server.borrow();
        (!s.glx_missing).then_some((160, GLX_EVENT_BASE))
    }

    fn query_version(&mut self) -> Option<(i32, i32)> {
        Some(self.server.borrow().glx_version)
    }

    fn extensions_string(&mut self) -> String {
        self.server.borrow().glx_extensions.clone()
    }

    fn has_blit_framebuffer(&self) -> bool {
        self.server.borrow().has_blit
    }

    fn choose_fb_config(&mut self, attributes: &[i32]) -> Vec<FbConfig> {
        let mut s = self.server.borrow_mut();
        s.last_fb_attributes = attributes.to_vec();
        s.fb_configs.iter().map(|c| c.config).collect()
    }

    fn visual_from_fb_config(&mut self, config: FbConfig) -> Option<VisualInfo> {
        let s = self.server.borrow();
        s.fb_configs
            .iter()
            .find(|c| c.config == config)
            .and_then(|c| c.visual)
    }

    fn fb_config_attrib(&mut self, config: FbConfig, attribute: i32) -> Option<i32> {
        let s = self.server.borrow();
        let c = s.fb_configs.iter().find(|c| c.config == config)?;
        (attribute == GLX_SAMPLES).then_some(c.samples)
    }

    fn create_new_context(
        &mut self,
        _config: FbConfig,
        _render_type: i32,
        _direct: bool,
    ) -> Option<GlxContext> {
        let mut s = self.server.borrow_mut();
        if s.fail_new_context {
            return None;
        }
        let context = GlxContext(s.alloc_xid());
        s.contexts.push(context);
        Some(context)
    }

    fn create_context_attribs(
        &mut self,
        _config: FbConfig,
        _direct: bool,
        attributes: &[i32],
    ) -> Option<GlxContext> {
        let mut s = self.server.borrow_mut();
        if s.fail_context_attribs {
            return None;
        }
        s.context_attribs = Some(attributes.to_vec());
        let context = GlxContext(s.alloc_xid());
        s.contexts.push(context);
        Some(context)
    }

    fn is_direct(&mut self, _context: GlxContext) -> bool {
        !self.server.borrow().indirect
    }

    fn destroy_context(&mut self, context: GlxContext) {
        self.server.borrow_mut().contexts.retain(|&c| c != context);
    }

    fn create_window(&mut self, _config: FbConfig, window: Window) -> GlxDrawable {
        let mut s = self.server.borrow_mut();
        s.request();
        let drawable = s.alloc_xid();
        s.glx_windows.insert(drawable, window);
        drawable
    }

    fn destroy_window(&mut self, drawable: GlxDrawable) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.glx_windows.remove(&drawable);
    }

    fn make_context_current(&mut self, drawable: GlxDrawable, context: Option<GlxContext>) {
        let failure = {
            let mut s = self.server.borrow_mut();
            s.request();
            let one_shot = if context.is_some() {
                s.fail_next_bind.take()
            } else {
                None
            };
            one_shot.or_else(|| s.fail_bind.filter(|&(d, _)| d == drawable).map(|(_, code)| code))
        };
        if let Some(code) = failure {
            raise(&self.server, code, drawable);
            return;
        }
        let mut s = self.server.borrow_mut();
        s.current = context.map(|c| (drawable, Some(c)));
        s.bind_log.push(drawable);
    }

    fn swap_buffers(&mut self, drawable: GlxDrawable) {
        self.server.borrow_mut().request();
        self.record(GlCall::SwapBuffers(drawable));
    }

    fn select_event(&mut self, drawable: GlxDrawable, mask: u64) {
        let mut s = self.server.borrow_mut();
        s.request();
        s.glx_selected.insert(drawable, mask);
    }

    fn query_drawable(&mut self, _drawable: GlxDrawable, _attribute: i32) -> u32 {
        self.server.borrow().back_buffer_age
    }

    fn swap_interval(&mut self, interval: i32) {
        self.record(GlCall::SwapInterval(interval));
    }

    fn get_video_sync(&mut self) -> Option<u32> {
        self.record(GlCall::GetVideoSync);
        Some(self.server.borrow().video_sync)
    }

    fn wait_video_sync(&mut self, _divisor: i32, _remainder: i32) -> Option<u32> {
        self.record(GlCall::WaitVideoSync);
        let mut s = self.server.borrow_mut();
        s.video_sync = s.video_sync.wrapping_add(1);
        Some(s.video_sync)
    }

    fn get_sync_values(&mut self, _drawable: GlxDrawable) -> Option<SyncValues> {
        let s = self.server.borrow();
        Some(SyncValues {
            ust: s.ust,
            msc: u64::from(s.video_sync),
            sbc: 0,
        })
    }

    fn wait_for_msc(
        &mut self,
        drawable: GlxDrawable,
        _target_msc: i64,
        _divisor: i64,
        _remainder: i64,
    ) -> Option<SyncValues> {
        self.record(GlCall::WaitForMsc);
        self.get_sync_values(drawable)
    }

    fn copy_sub_buffer(&mut self, drawable: GlxDrawable, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::CopySubBuffer {
            drawable,
            x,
            y,
            width,
            height,
        });
    }

    fn finish(&mut self) {
        self.record(GlCall::Finish);
    }

    fn flush(&mut self) {
        self.record(GlCall::Flush);
    }

    fn disable_scissor(&mut self) {
        self.record(GlCall::DisableScissor);
    }

    fn draw_buffer(&mut self, mode: u32) {
        self.record(GlCall::DrawBuffer(mode));
    }

    fn blit_framebuffer(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, _mask: u32, _filter: u32) {
        self.record(GlCall::Blit { x0, y0, x1, y1 });
    }
}
