// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! libX11, libXrandr, libXext and libGL bindings.
//!
//! [`XlibDisplay`] implements [`Xlib`] and [`XlibGlx`] implements [`Glx`] on
//! top of the system libraries, loaded at runtime through `x11-dl`. XSync
//! lives in libXext, which `x11-dl` does not wrap; its four entry points are
//! resolved with `libloading`. GLX and GL extension entry points come from
//! `glXGetProcAddress`.
//!
//! Both halves share one display handle. The display is closed when the
//! last of them is dropped, unless it was adopted with
//! [`XlibDisplay::from_raw`].
//!
//! Native events are converted with [`translate_event`]; an application
//! that lets the backend own the display can drain it with
//! [`X11Winsys::dispatch_pending`].

#![expect(unsafe_code, reason = "Xlib, XRandR, XSync and GLX are C libraries")]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::ffi::{CStr, CString, c_int, c_long, c_uchar, c_uint, c_ulong};
use std::fmt;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use x11_dl::glx as ffi_glx;
use x11_dl::xlib as ffi;
use x11_dl::xrandr as ffi_randr;

use crate::filter::FilterReturn;
use crate::glx::{
    FbConfig, GLX_BUFFER_SWAP_COMPLETE, Glx, GlxContext, GlxDrawable, GlxLoader, SyncValues,
};
use crate::winsys::X11Winsys;
use crate::xlib::{
    Atom, ClientMessageEvent, ConfigureEvent, CrtcInfo, ErrorEvent, ErrorHandler, EventMask,
    ExposeEvent, ExtensionEvent, ExtensionInfo, ExtensionPayload, ModeInfo, OutputInfo, Property,
    RandrXid, ScreenResources, SizeHints, SyncCounter, VisualInfo, Window, WindowAttributes,
    WindowDesc, XEvent, XEventKind, Xlib,
};

const FALSE: ffi::Bool = 0;
const TRUE: ffi::Bool = 1;
const SUCCESS: c_int = 0;
const PROP_MODE_REPLACE: c_int = 0;
const INPUT_OUTPUT: c_uint = 1;
const ALLOC_NONE: c_int = 0;
const REVERT_TO_PARENT: c_int = 2;
const VISUAL_ID_MASK: c_long = 0x1;
const CW_BORDER_PIXEL: c_ulong = 1 << 3;
const CW_OVERRIDE_REDIRECT: c_ulong = 1 << 9;
const CW_EVENT_MASK: c_ulong = 1 << 11;
const CW_COLORMAP: c_ulong = 1 << 13;
const P_MIN_SIZE: c_long = 1 << 4;
const P_MAX_SIZE: c_long = 1 << 5;
const CLIENT_MESSAGE: c_int = 33;
const CONFIGURE_NOTIFY: c_int = 22;
const EXPOSE: c_int = 12;
/// `LASTEvent`: extension event codes start here.
const FIRST_EXTENSION_EVENT: c_int = 36;
const GL_SCISSOR_TEST: c_uint = 0x0C11;

// ---------------------------------------------------------------------------
// Integer plumbing
// ---------------------------------------------------------------------------

#[allow(
    trivial_numeric_casts,
    clippy::cast_possible_truncation,
    reason = "X ids and masks travel in C longs, whose width depends on the target"
)]
fn to_ulong(value: u64) -> c_ulong {
    value as c_ulong
}

#[allow(
    trivial_numeric_casts,
    reason = "X ids and masks travel in C longs, whose width depends on the target"
)]
fn from_ulong(value: c_ulong) -> u64 {
    value as u64
}

#[allow(
    trivial_numeric_casts,
    clippy::cast_possible_truncation,
    reason = "X ids and masks travel in C longs, whose width depends on the target"
)]
fn to_long(value: i64) -> c_long {
    value as c_long
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "format-32 client message words are carried in the low 32 bits of a long"
)]
fn long_to_word(value: c_long) -> u32 {
    value as u32
}

#[allow(
    clippy::cast_possible_wrap,
    trivial_numeric_casts,
    reason = "format-32 client message words are carried in the low 32 bits of a long"
)]
fn word_to_long(value: u32) -> c_long {
    value as c_long
}

fn to_c_int(value: usize) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}

/// An XSync 64-bit counter value.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct XSyncValue {
    hi: c_int,
    lo: c_uint,
}

impl XSyncValue {
    fn from_u64(value: u64) -> Self {
        let [h0, h1, h2, h3, l0, l1, l2, l3] = value.to_be_bytes();
        Self {
            hi: c_int::from_be_bytes([h0, h1, h2, h3]),
            lo: c_uint::from_be_bytes([l0, l1, l2, l3]),
        }
    }
}

// ---------------------------------------------------------------------------
// Error handler
// ---------------------------------------------------------------------------

type CErrorHandler = unsafe extern "C" fn(*mut ffi::Display, *mut ffi::XErrorEvent) -> c_int;

thread_local! {
    static ERROR_HANDLER: RefCell<Option<ErrorHandler>> = const { RefCell::new(None) };
    static PREVIOUS_C_HANDLER: Cell<Option<CErrorHandler>> = const { Cell::new(None) };
}

unsafe extern "C" fn error_trampoline(
    _display: *mut ffi::Display,
    event: *mut ffi::XErrorEvent,
) -> c_int {
    // SAFETY: Xlib passes a valid event for the duration of the callback.
    let Some(event) = (unsafe { event.as_ref() }) else {
        return 0;
    };
    let event = ErrorEvent {
        error_code: event.error_code,
        request_code: event.request_code,
        resource_id: from_ulong(event.resourceid),
        serial: from_ulong(event.serial),
    };
    let handler = ERROR_HANDLER.with(|slot| slot.borrow().clone());
    if let Some(handler) = handler {
        handler(&event);
    }
    0
}

// ---------------------------------------------------------------------------
// XSync
// ---------------------------------------------------------------------------

type SyncQueryExtensionFn = unsafe extern "C" fn(*mut ffi::Display, *mut c_int, *mut c_int) -> ffi::Bool;
type SyncInitializeFn = unsafe extern "C" fn(*mut ffi::Display, *mut c_int, *mut c_int) -> ffi::Status;
type SyncCreateCounterFn = unsafe extern "C" fn(*mut ffi::Display, XSyncValue) -> c_ulong;
type SyncSetCounterFn = unsafe extern "C" fn(*mut ffi::Display, c_ulong, XSyncValue) -> ffi::Status;
type SyncDestroyCounterFn = unsafe extern "C" fn(*mut ffi::Display, c_ulong) -> ffi::Status;

/// XSync entry points resolved from libXext.
struct XSync {
    query_extension: SyncQueryExtensionFn,
    initialize: SyncInitializeFn,
    create_counter: SyncCreateCounterFn,
    set_counter: SyncSetCounterFn,
    destroy_counter: SyncDestroyCounterFn,
    _library: libloading::Library,
}

impl XSync {
    fn open() -> Option<Self> {
        // SAFETY: libXext has no initialization side effects.
        let library = ["libXext.so.6", "libXext.so"]
            .into_iter()
            .find_map(|name| unsafe { libloading::Library::new(name) }.ok())?;
        // SAFETY: each symbol is looked up with its C prototype from
        // <X11/extensions/sync.h>; the pointers are copied out while
        // `library` is kept alive alongside them.
        unsafe {
            Some(Self {
                query_extension: *library
                    .get::<SyncQueryExtensionFn>(b"XSyncQueryExtension\0")
                    .ok()?,
                initialize: *library.get::<SyncInitializeFn>(b"XSyncInitialize\0").ok()?,
                create_counter: *library
                    .get::<SyncCreateCounterFn>(b"XSyncCreateCounter\0")
                    .ok()?,
                set_counter: *library.get::<SyncSetCounterFn>(b"XSyncSetCounter\0").ok()?,
                destroy_counter: *library
                    .get::<SyncDestroyCounterFn>(b"XSyncDestroyCounter\0")
                    .ok()?,
                _library: library,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// XlibDisplay
// ---------------------------------------------------------------------------

/// The open display, shared by [`XlibDisplay`] and [`XlibGlx`].
struct DisplayHandle {
    xlib: ffi::Xlib,
    display: NonNull<ffi::Display>,
    screen: c_int,
    owned: bool,
}

impl DisplayHandle {
    fn raw(&self) -> *mut ffi::Display {
        self.display.as_ptr()
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: the display was opened by us and nothing else holds it.
            unsafe { (self.xlib.XCloseDisplay)(self.raw()) };
        }
    }
}

/// An Xlib display backed by libX11.
pub struct XlibDisplay {
    handle: Rc<DisplayHandle>,
    xrandr: Option<ffi_randr::Xrandr>,
    xsync: Option<XSync>,
    resources: Option<NonNull<ffi_randr::XRRScreenResources>>,
    colormaps: BTreeMap<Window, ffi::Colormap>,
}

impl fmt::Debug for XlibDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XlibDisplay")
            .field("display", &self.handle.display)
            .field("owned", &self.handle.owned)
            .field("xrandr", &self.xrandr.is_some())
            .field("xsync", &self.xsync.is_some())
            .finish_non_exhaustive()
    }
}

impl XlibDisplay {
    /// Adopts a display the application opened with `XOpenDisplay`.
    ///
    /// The display is not closed when the adapter is dropped. Returns
    /// `None` if `display` is null or libX11 cannot be loaded.
    ///
    /// # Safety
    ///
    /// `display` must be an open Xlib display that stays open for as long
    /// as the returned value, and every [`XlibGlx`] loaded for it, lives.
    pub unsafe fn from_raw(display: *mut ffi::Display) -> Option<Self> {
        let display = NonNull::new(display)?;
        let xlib = ffi::Xlib::open().ok()?;
        Some(Self::with_handle(xlib, display, false))
    }

    fn with_handle(xlib: ffi::Xlib, display: NonNull<ffi::Display>, owned: bool) -> Self {
        // SAFETY: `display` is an open display.
        let screen = unsafe { (xlib.XDefaultScreen)(display.as_ptr()) };
        let xrandr = ffi_randr::Xrandr::open()
            .map_err(|e| log::debug!("libXrandr unavailable: {e}"))
            .ok();
        let xsync = XSync::open();
        if xsync.is_none() {
            log::debug!("libXext unavailable; XSync counters are disabled");
        }
        Self {
            handle: Rc::new(DisplayHandle {
                xlib,
                display,
                screen,
                owned,
            }),
            xrandr,
            xsync,
            resources: None,
            colormaps: BTreeMap::new(),
        }
    }

    /// The underlying `Display` pointer.
    #[must_use]
    pub fn as_raw(&self) -> *mut ffi::Display {
        self.handle.raw()
    }

    fn xlib(&self) -> &ffi::Xlib {
        &self.handle.xlib
    }

    fn raw(&self) -> *mut ffi::Display {
        self.handle.raw()
    }

    /// Number of events already received but not yet read.
    pub fn pending(&mut self) -> usize {
        // SAFETY: the display is open.
        let count = unsafe { (self.xlib().XPending)(self.raw()) };
        usize::try_from(count).unwrap_or(0)
    }

    /// Removes the next event from the queue, blocking until one arrives.
    pub fn next_event(&mut self) -> ffi::XEvent {
        let mut event = ffi::XEvent { pad: [0; 24] };
        // SAFETY: `event` is writable storage for one XEvent.
        unsafe { (self.xlib().XNextEvent)(self.raw(), &mut event) };
        event
    }

    fn free_resources(&mut self) {
        if let (Some(resources), Some(xrandr)) = (self.resources.take(), self.xrandr.as_ref()) {
            // SAFETY: `resources` came from XRRGetScreenResourcesCurrent and
            // is freed exactly once.
            unsafe { (xrandr.XRRFreeScreenResources)(resources.as_ptr()) };
        }
    }

    fn lookup_visual(&self, visual_id: u64) -> Option<NonNull<ffi::Visual>> {
        // SAFETY: XVisualInfo is a plain C struct; all-zero is a valid value.
        let mut template: ffi::XVisualInfo = unsafe { std::mem::zeroed() };
        template.visualid = to_ulong(visual_id);
        let mut count = 0;
        // SAFETY: `template` and `count` are valid for the call.
        let infos = unsafe {
            (self.xlib().XGetVisualInfo)(self.raw(), VISUAL_ID_MASK, &mut template, &mut count)
        };
        let infos = NonNull::new(infos)?;
        // SAFETY: a non-null result holds `count` >= 1 entries, freed below.
        let visual = unsafe { infos.as_ref() }.visual;
        // SAFETY: the list was allocated by Xlib.
        unsafe { (self.xlib().XFree)(infos.as_ptr().cast()) };
        NonNull::new(visual)
    }
}

impl Drop for XlibDisplay {
    fn drop(&mut self) {
        self.free_resources();
    }
}

impl Xlib for XlibDisplay {
    fn open(display_name: Option<&str>) -> Option<Self> {
        let xlib = ffi::Xlib::open()
            .map_err(|e| log::warn!("libX11 unavailable: {e}"))
            .ok()?;
        let name = display_name.map(CString::new).transpose().ok()?;
        let name_ptr = name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
        // SAFETY: `name_ptr` is null or a NUL-terminated string that outlives the call.
        let display = NonNull::new(unsafe { (xlib.XOpenDisplay)(name_ptr) })?;
        Some(Self::with_handle(xlib, display, true))
    }

    fn set_synchronous(&mut self, synchronous: bool) {
        // SAFETY: the display is open.
        _ = unsafe {
            (self.xlib().XSynchronize)(self.raw(), if synchronous { TRUE } else { FALSE })
        };
    }

    fn set_error_handler(&mut self, handler: Option<ErrorHandler>) -> Option<ErrorHandler> {
        let installing = handler.is_some();
        let previous = ERROR_HANDLER.with(|slot| slot.replace(handler));
        match (installing, previous.is_some()) {
            (true, false) => {
                // SAFETY: the trampoline matches Xlib's handler prototype.
                let old = unsafe { (self.xlib().XSetErrorHandler)(Some(error_trampoline)) };
                PREVIOUS_C_HANDLER.with(|slot| slot.set(old));
            }
            (false, true) => {
                let old = PREVIOUS_C_HANDLER.with(Cell::take);
                // SAFETY: `old` is the handler Xlib had before ours, or none.
                _ = unsafe { (self.xlib().XSetErrorHandler)(old) };
            }
            _ => {}
        }
        previous
    }

    fn next_request(&self) -> u64 {
        // SAFETY: the display is open.
        from_ulong(unsafe { (self.xlib().XNextRequest)(self.raw()) })
    }

    fn sync(&mut self) {
        // SAFETY: the display is open.
        unsafe { (self.xlib().XSync)(self.raw(), FALSE) };
    }

    fn flush(&mut self) {
        // SAFETY: the display is open.
        unsafe { (self.xlib().XFlush)(self.raw()) };
    }

    fn default_root_window(&self) -> Window {
        // SAFETY: the display is open.
        from_ulong(unsafe { (self.xlib().XDefaultRootWindow)(self.raw()) })
    }

    fn intern_atom(&mut self, name: &str) -> Atom {
        let Ok(name) = CString::new(name) else {
            return 0;
        };
        // SAFETY: `name` is NUL-terminated and outlives the call.
        from_ulong(unsafe { (self.xlib().XInternAtom)(self.raw(), name.as_ptr(), FALSE) })
    }

    fn query_extension(&mut self, name: &str) -> Option<ExtensionInfo> {
        let name = CString::new(name).ok()?;
        let (mut opcode, mut event_base, mut error_base) = (0, 0, 0);
        // SAFETY: all out-pointers are valid locals.
        let present = unsafe {
            (self.xlib().XQueryExtension)(
                self.raw(),
                name.as_ptr(),
                &mut opcode,
                &mut event_base,
                &mut error_base,
            )
        };
        (present != FALSE).then_some(ExtensionInfo {
            event_base,
            error_base,
        })
    }

    fn get_property(&mut self, window: Window, property: Atom, type_: Atom) -> Option<Property> {
        let mut actual_type = 0;
        let mut format = 0;
        let mut count = 0;
        let mut bytes_after = 0;
        let mut data: *mut c_uchar = ptr::null_mut();
        // SAFETY: all out-pointers are valid locals.
        let status = unsafe {
            (self.xlib().XGetWindowProperty)(
                self.raw(),
                to_ulong(window),
                to_ulong(property),
                0,
                c_long::MAX,
                FALSE,
                to_ulong(type_),
                &mut actual_type,
                &mut format,
                &mut count,
                &mut bytes_after,
                &mut data,
            )
        };
        if status != SUCCESS {
            return None;
        }
        let count = usize::try_from(count).unwrap_or(0);
        let mut items = Vec::with_capacity(count);
        if !data.is_null() {
            // SAFETY: Xlib returns `count` items of the reported format;
            // format-32 items are stored as C longs.
            unsafe {
                match format {
                    8 => items.extend(
                        std::slice::from_raw_parts(data, count)
                            .iter()
                            .map(|&b| u64::from(b)),
                    ),
                    16 => items.extend(
                        std::slice::from_raw_parts(data.cast::<u16>(), count)
                            .iter()
                            .map(|&s| u64::from(s)),
                    ),
                    32 => items.extend(
                        std::slice::from_raw_parts(data.cast::<c_ulong>(), count)
                            .iter()
                            .map(|&l| from_ulong(l)),
                    ),
                    _ => {}
                }
                (self.xlib().XFree)(data.cast());
            }
        }
        Some(Property {
            type_: from_ulong(actual_type),
            format,
            items,
            bytes_after: from_ulong(bytes_after),
        })
    }

    fn change_property(&mut self, window: Window, property: Atom, type_: Atom, items: &[u64]) {
        let longs: Vec<c_ulong> = items.iter().map(|&item| to_ulong(item)).collect();
        // SAFETY: format-32 data is passed as an array of C longs.
        unsafe {
            (self.xlib().XChangeProperty)(
                self.raw(),
                to_ulong(window),
                to_ulong(property),
                to_ulong(type_),
                32,
                PROP_MODE_REPLACE,
                longs.as_ptr().cast(),
                to_c_int(longs.len()),
            );
        }
    }

    fn set_wm_protocols(&mut self, window: Window, protocols: &[Atom]) {
        let mut atoms: Vec<ffi::Atom> = protocols.iter().map(|&a| to_ulong(a)).collect();
        // SAFETY: `atoms` holds `len` atoms and outlives the call.
        unsafe {
            (self.xlib().XSetWMProtocols)(
                self.raw(),
                to_ulong(window),
                atoms.as_mut_ptr(),
                to_c_int(atoms.len()),
            );
        }
    }

    fn set_wm_normal_hints(&mut self, window: Window, hints: &SizeHints) {
        // SAFETY: XSizeHints is a plain C struct; all-zero is a valid value.
        let mut raw: ffi::XSizeHints = unsafe { std::mem::zeroed() };
        raw.flags = P_MIN_SIZE | P_MAX_SIZE;
        raw.min_width = hints.min_width;
        raw.min_height = hints.min_height;
        raw.max_width = hints.max_width;
        raw.max_height = hints.max_height;
        // SAFETY: `raw` is valid for the call.
        unsafe { (self.xlib().XSetWMNormalHints)(self.raw(), to_ulong(window), &mut raw) };
    }

    fn create_window(&mut self, parent: Window, desc: &WindowDesc) -> Window {
        let Some(visual) = self.lookup_visual(desc.visual.visual_id) else {
            log::warn!("visual 0x{:x} not found", desc.visual.visual_id);
            return 0;
        };
        let parent = to_ulong(parent);
        // SAFETY: `visual` belongs to this display.
        let colormap = unsafe {
            (self.xlib().XCreateColormap)(self.raw(), parent, visual.as_ptr(), ALLOC_NONE)
        };
        // SAFETY: XSetWindowAttributes is a plain C struct; all-zero is a valid value.
        let mut attributes: ffi::XSetWindowAttributes = unsafe { std::mem::zeroed() };
        attributes.colormap = colormap;
        attributes.event_mask = to_long(desc.event_mask.0);
        attributes.override_redirect = if desc.override_redirect { TRUE } else { FALSE };
        let depth = c_int::try_from(desc.visual.depth).unwrap_or(0);
        // SAFETY: `attributes` is valid for the call and `visual` belongs to
        // this display.
        let window = unsafe {
            (self.xlib().XCreateWindow)(
                self.raw(),
                parent,
                desc.x,
                desc.y,
                desc.width,
                desc.height,
                0,
                depth,
                INPUT_OUTPUT,
                visual.as_ptr(),
                CW_BORDER_PIXEL | CW_COLORMAP | CW_EVENT_MASK | CW_OVERRIDE_REDIRECT,
                &mut attributes,
            )
        };
        let window = from_ulong(window);
        self.colormaps.insert(window, colormap);
        window
    }

    fn destroy_window(&mut self, window: Window) {
        // SAFETY: the display is open.
        unsafe { (self.xlib().XDestroyWindow)(self.raw(), to_ulong(window)) };
        if let Some(colormap) = self.colormaps.remove(&window) {
            // SAFETY: the colormap was created for this window.
            unsafe { (self.xlib().XFreeColormap)(self.raw(), colormap) };
        }
    }

    fn map_window(&mut self, window: Window) {
        // SAFETY: the display is open.
        unsafe { (self.xlib().XMapWindow)(self.raw(), to_ulong(window)) };
    }

    fn unmap_window(&mut self, window: Window) {
        // SAFETY: the display is open.
        unsafe { (self.xlib().XUnmapWindow)(self.raw(), to_ulong(window)) };
    }

    fn select_input(&mut self, window: Window, mask: EventMask) {
        // SAFETY: the display is open.
        unsafe { (self.xlib().XSelectInput)(self.raw(), to_ulong(window), to_long(mask.0)) };
    }

    fn get_window_attributes(&mut self, window: Window) -> Option<WindowAttributes> {
        // SAFETY: XWindowAttributes is a plain C struct; all-zero is a valid value.
        let mut raw: ffi::XWindowAttributes = unsafe { std::mem::zeroed() };
        // SAFETY: `raw` is valid for the call.
        let status =
            unsafe { (self.xlib().XGetWindowAttributes)(self.raw(), to_ulong(window), &mut raw) };
        (status != 0).then(|| WindowAttributes {
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            your_event_mask: EventMask(i64::from(raw.your_event_mask)),
        })
    }

    fn translate_coordinates(
        &mut self,
        src: Window,
        dest: Window,
        x: i32,
        y: i32,
    ) -> Option<(i32, i32)> {
        let (mut dest_x, mut dest_y) = (0, 0);
        let mut child = 0;
        // SAFETY: all out-pointers are valid locals.
        let same_screen = unsafe {
            (self.xlib().XTranslateCoordinates)(
                self.raw(),
                to_ulong(src),
                to_ulong(dest),
                x,
                y,
                &mut dest_x,
                &mut dest_y,
                &mut child,
            )
        };
        (same_screen != FALSE).then_some((dest_x, dest_y))
    }

    fn set_input_focus(&mut self, window: Window, time: u64) {
        // SAFETY: the display is open.
        unsafe {
            (self.xlib().XSetInputFocus)(
                self.raw(),
                to_ulong(window),
                REVERT_TO_PARENT,
                to_ulong(time),
            );
        }
    }

    fn send_client_message(
        &mut self,
        destination: Window,
        propagate: bool,
        mask: EventMask,
        message: &ClientMessageEvent,
    ) {
        let mut data = ffi::ClientMessageData::new();
        for (index, &word) in message.data.iter().enumerate() {
            data.set_long(index, word_to_long(word));
        }
        let mut event = ffi::XEvent { pad: [0; 24] };
        event.client_message = ffi::XClientMessageEvent {
            type_: CLIENT_MESSAGE,
            serial: 0,
            send_event: TRUE,
            display: self.raw(),
            window: to_ulong(message.window),
            message_type: to_ulong(message.message_type),
            format: 32,
            data,
        };
        // SAFETY: `event` is a fully initialized client message.
        unsafe {
            (self.xlib().XSendEvent)(
                self.raw(),
                to_ulong(destination),
                if propagate { TRUE } else { FALSE },
                to_long(mask.0),
                &mut event,
            );
        }
    }

    fn sync_initialize(&mut self) -> bool {
        let Some(xsync) = self.xsync.as_ref() else {
            return false;
        };
        let (mut event_base, mut error_base) = (0, 0);
        let (mut major, mut minor) = (0, 0);
        // SAFETY: all out-pointers are valid locals.
        unsafe {
            (xsync.query_extension)(self.raw(), &mut event_base, &mut error_base) != FALSE
                && (xsync.initialize)(self.raw(), &mut major, &mut minor) != 0
        }
    }

    fn sync_create_counter(&mut self, initial: u64) -> SyncCounter {
        let Some(xsync) = self.xsync.as_ref() else {
            return 0;
        };
        // SAFETY: XSync was initialized on this display.
        from_ulong(unsafe { (xsync.create_counter)(self.raw(), XSyncValue::from_u64(initial)) })
    }

    fn sync_set_counter(&mut self, counter: SyncCounter, value: u64) {
        if let Some(xsync) = self.xsync.as_ref() {
            // SAFETY: `counter` was created on this display.
            unsafe {
                (xsync.set_counter)(self.raw(), to_ulong(counter), XSyncValue::from_u64(value));
            }
        }
    }

    fn sync_destroy_counter(&mut self, counter: SyncCounter) {
        if let Some(xsync) = self.xsync.as_ref() {
            // SAFETY: `counter` was created on this display.
            unsafe { (xsync.destroy_counter)(self.raw(), to_ulong(counter)) };
        }
    }

    fn randr_query_extension(&mut self) -> Option<ExtensionInfo> {
        let xrandr = self.xrandr.as_ref()?;
        let (mut event_base, mut error_base) = (0, 0);
        // SAFETY: all out-pointers are valid locals.
        let present =
            unsafe { (xrandr.XRRQueryExtension)(self.raw(), &mut event_base, &mut error_base) };
        (present != FALSE).then_some(ExtensionInfo {
            event_base,
            error_base,
        })
    }

    fn randr_select_input(&mut self, window: Window, mask: u32) {
        if let Some(xrandr) = self.xrandr.as_ref() {
            let mask = c_int::try_from(mask).unwrap_or(0);
            // SAFETY: the display is open and RandR is present.
            unsafe { (xrandr.XRRSelectInput)(self.raw(), to_ulong(window), mask) };
        }
    }

    fn randr_screen_resources(&mut self, root: Window) -> Option<ScreenResources> {
        self.free_resources();
        let xrandr = self.xrandr.as_ref()?;
        // SAFETY: the display is open and RandR is present.
        let raw = NonNull::new(unsafe {
            (xrandr.XRRGetScreenResourcesCurrent)(self.raw(), to_ulong(root))
        })?;
        self.resources = Some(raw);
        // SAFETY: `raw` stays valid until the next scan or drop.
        let res = unsafe { raw.as_ref() };
        let crtc_count = usize::try_from(res.ncrtc).unwrap_or(0);
        let mode_count = usize::try_from(res.nmode).unwrap_or(0);
        let mut resources = ScreenResources::default();
        // SAFETY: XRandR reports the lengths of both arrays.
        unsafe {
            if crtc_count > 0 && !res.crtcs.is_null() {
                resources.crtcs = std::slice::from_raw_parts(res.crtcs, crtc_count)
                    .iter()
                    .map(|&c| from_ulong(c))
                    .collect();
            }
            if mode_count > 0 && !res.modes.is_null() {
                resources.modes = std::slice::from_raw_parts(res.modes, mode_count)
                    .iter()
                    .map(|m| ModeInfo {
                        id: from_ulong(m.id),
                        dot_clock: from_ulong(m.dotClock),
                        h_total: m.hTotal,
                        v_total: m.vTotal,
                    })
                    .collect();
            }
        }
        Some(resources)
    }

    fn randr_crtc_info(
        &mut self,
        _resources: &ScreenResources,
        crtc: RandrXid,
    ) -> Option<CrtcInfo> {
        let xrandr = self.xrandr.as_ref()?;
        let resources = self.resources?;
        // SAFETY: `resources` is the live result of the last scan.
        let raw = NonNull::new(unsafe {
            (xrandr.XRRGetCrtcInfo)(self.raw(), resources.as_ptr(), to_ulong(crtc))
        })?;
        // SAFETY: `raw` is valid until freed below.
        let info = unsafe { raw.as_ref() };
        let output_count = usize::try_from(info.noutput).unwrap_or(0);
        let outputs = if output_count > 0 && !info.outputs.is_null() {
            // SAFETY: XRandR reports the array length.
            unsafe { std::slice::from_raw_parts(info.outputs, output_count) }
                .iter()
                .map(|&o| from_ulong(o))
                .collect()
        } else {
            Vec::new()
        };
        let result = CrtcInfo {
            x: info.x,
            y: info.y,
            width: info.width,
            height: info.height,
            mode: (info.mode != 0).then(|| from_ulong(info.mode)),
            rotation: info.rotation,
            outputs,
        };
        // SAFETY: `raw` came from XRRGetCrtcInfo and is freed once.
        unsafe { (xrandr.XRRFreeCrtcInfo)(raw.as_ptr()) };
        Some(result)
    }

    fn randr_output_info(
        &mut self,
        _resources: &ScreenResources,
        output: RandrXid,
    ) -> Option<OutputInfo> {
        let xrandr = self.xrandr.as_ref()?;
        let resources = self.resources?;
        // SAFETY: `resources` is the live result of the last scan.
        let raw = NonNull::new(unsafe {
            (xrandr.XRRGetOutputInfo)(self.raw(), resources.as_ptr(), to_ulong(output))
        })?;
        // SAFETY: `raw` is valid until freed below.
        let info = unsafe { raw.as_ref() };
        let name = if info.name.is_null() {
            String::new()
        } else {
            // SAFETY: RandR output names are NUL-terminated.
            unsafe { CStr::from_ptr(info.name) }
                .to_string_lossy()
                .into_owned()
        };
        let result = OutputInfo {
            name,
            mm_width: i32::try_from(info.mm_width).unwrap_or(0),
            mm_height: i32::try_from(info.mm_height).unwrap_or(0),
            subpixel_order: info.subpixel_order,
        };
        // SAFETY: `raw` came from XRRGetOutputInfo and is freed once.
        unsafe { (xrandr.XRRFreeOutputInfo)(raw.as_ptr()) };
        Some(result)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// `GLX_BufferSwapComplete` as laid out by `GLX_INTEL_swap_event`.
#[repr(C)]
#[derive(Clone, Copy)]
struct GlxBufferSwapComplete {
    type_: c_int,
    serial: c_ulong,
    send_event: ffi::Bool,
    display: *mut ffi::Display,
    event_type: c_int,
    drawable: c_ulong,
    ust: i64,
    msc: i64,
    sbc: i64,
}

/// Converts a native event for [`X11Winsys::handle_event`].
///
/// `glx_event_base` is [`X11Winsys::glx_event_base`]; events in the GLX
/// range decode as swap completions.
#[must_use]
pub fn translate_event(raw: &ffi::XEvent, glx_event_base: i32) -> XEvent {
    let type_code = raw.get_type();
    // SAFETY: every event starts with the XAnyEvent header.
    let serial = from_ulong(unsafe { raw.any.serial });
    let kind = match type_code {
        CONFIGURE_NOTIFY => {
            // SAFETY: the type says this is a configure event.
            let e = unsafe { raw.configure };
            XEventKind::Configure(ConfigureEvent {
                window: from_ulong(e.window),
                x: e.x,
                y: e.y,
                width: e.width,
                height: e.height,
                send_event: e.send_event != FALSE,
            })
        }
        EXPOSE => {
            // SAFETY: the type says this is an expose event.
            let e = unsafe { raw.expose };
            XEventKind::Expose(ExposeEvent {
                window: from_ulong(e.window),
                x: e.x,
                y: e.y,
                width: e.width,
                height: e.height,
            })
        }
        CLIENT_MESSAGE => {
            // SAFETY: the type says this is a client message.
            let e = unsafe { raw.client_message };
            if e.format == 32 {
                let mut data = [0_u32; 5];
                for (index, word) in data.iter_mut().enumerate() {
                    *word = long_to_word(e.data.get_long(index));
                }
                XEventKind::ClientMessage(ClientMessageEvent {
                    window: from_ulong(e.window),
                    message_type: from_ulong(e.message_type),
                    data,
                })
            } else {
                XEventKind::Other(type_code)
            }
        }
        t if glx_event_base > 0 && t == glx_event_base.saturating_add(GLX_BUFFER_SWAP_COMPLETE) => {
            // SAFETY: GLX stores its swap event in the XEvent storage, which
            // is large enough and suitably aligned for it.
            let e = unsafe { *ptr::from_ref(raw).cast::<GlxBufferSwapComplete>() };
            XEventKind::Extension(ExtensionEvent {
                type_code: t,
                payload: ExtensionPayload::SwapComplete {
                    drawable: from_ulong(e.drawable),
                    ust: e.ust.cast_unsigned(),
                    msc: e.msc.cast_unsigned(),
                    sbc: e.sbc.cast_unsigned(),
                },
            })
        }
        t if t >= FIRST_EXTENSION_EVENT => XEventKind::Extension(ExtensionEvent {
            type_code: t,
            payload: ExtensionPayload::Empty,
        }),
        t => XEventKind::Other(t),
    };
    XEvent { serial, kind }
}

impl X11Winsys<XlibDisplay, XlibGlx> {
    /// Converts and offers a native event to every filter.
    pub fn handle_xevent(&mut self, raw: &ffi::XEvent) -> FilterReturn {
        let event = translate_event(raw, self.glx_event_base());
        self.handle_event(&event)
    }

    /// Reads and handles every event already queued on the display,
    /// returning how many were processed.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while self.native().pending() > 0 {
            let raw = self.native().next_event();
            _ = self.handle_xevent(&raw);
            handled += 1;
        }
        handled
    }
}

// ---------------------------------------------------------------------------
// XlibGlx
// ---------------------------------------------------------------------------

type CreateContextAttribsFn = unsafe extern "C" fn(
    *mut ffi::Display,
    ffi_glx::GLXFBConfig,
    ffi_glx::GLXContext,
    ffi::Bool,
    *const c_int,
) -> ffi_glx::GLXContext;
type SwapIntervalFn = unsafe extern "C" fn(c_int) -> c_int;
type GetVideoSyncFn = unsafe extern "C" fn(*mut c_uint) -> c_int;
type WaitVideoSyncFn = unsafe extern "C" fn(c_int, c_int, *mut c_uint) -> c_int;
type GetSyncValuesFn =
    unsafe extern "C" fn(*mut ffi::Display, c_ulong, *mut i64, *mut i64, *mut i64) -> ffi::Bool;
type WaitForMscFn = unsafe extern "C" fn(
    *mut ffi::Display,
    c_ulong,
    i64,
    i64,
    i64,
    *mut i64,
    *mut i64,
    *mut i64,
) -> ffi::Bool;
type CopySubBufferFn = unsafe extern "C" fn(*mut ffi::Display, c_ulong, c_int, c_int, c_int, c_int);
type GlVoidFn = unsafe extern "C" fn();
type GlEnumFn = unsafe extern "C" fn(c_uint);
type BlitFramebufferFn = unsafe extern "C" fn(
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_uint,
    c_uint,
);

/// Entry points resolved through `glXGetProcAddress`.
struct GlProcs {
    create_context_attribs: Option<CreateContextAttribsFn>,
    swap_interval: Option<SwapIntervalFn>,
    get_video_sync: Option<GetVideoSyncFn>,
    wait_video_sync: Option<WaitVideoSyncFn>,
    get_sync_values: Option<GetSyncValuesFn>,
    wait_for_msc: Option<WaitForMscFn>,
    copy_sub_buffer: Option<CopySubBufferFn>,
    finish: Option<GlVoidFn>,
    flush: Option<GlVoidFn>,
    disable: Option<GlEnumFn>,
    draw_buffer: Option<GlEnumFn>,
    blit_framebuffer: Option<BlitFramebufferFn>,
}

macro_rules! load_proc {
    ($glx:expr, $name:literal, $ty:ty) => {
        // SAFETY: the name is NUL-terminated, and a returned pointer has the
        // prototype of the named entry point.
        unsafe { ($glx.glXGetProcAddress)(concat!($name, "\0").as_ptr()) }
            .map(|f| unsafe { std::mem::transmute::<unsafe extern "C" fn(), $ty>(f) })
    };
}

impl GlProcs {
    fn load(glx: &ffi_glx::Glx) -> Self {
        Self {
            create_context_attribs: load_proc!(
                glx,
                "glXCreateContextAttribsARB",
                CreateContextAttribsFn
            ),
            swap_interval: load_proc!(glx, "glXSwapIntervalSGI", SwapIntervalFn),
            get_video_sync: load_proc!(glx, "glXGetVideoSyncSGI", GetVideoSyncFn),
            wait_video_sync: load_proc!(glx, "glXWaitVideoSyncSGI", WaitVideoSyncFn),
            get_sync_values: load_proc!(glx, "glXGetSyncValuesOML", GetSyncValuesFn),
            wait_for_msc: load_proc!(glx, "glXWaitForMscOML", WaitForMscFn),
            copy_sub_buffer: load_proc!(glx, "glXCopySubBufferMESA", CopySubBufferFn),
            finish: load_proc!(glx, "glFinish", GlVoidFn),
            flush: load_proc!(glx, "glFlush", GlVoidFn),
            disable: load_proc!(glx, "glDisable", GlEnumFn),
            draw_buffer: load_proc!(glx, "glDrawBuffer", GlEnumFn),
            blit_framebuffer: load_proc!(glx, "glBlitFramebuffer", BlitFramebufferFn),
        }
    }
}

/// GLX and GL backed by libGL, bound to one [`XlibDisplay`].
pub struct XlibGlx {
    handle: Rc<DisplayHandle>,
    glx: ffi_glx::Glx,
    procs: GlProcs,
    configs: Vec<ffi_glx::GLXFBConfig>,
    contexts: BTreeMap<u64, ffi_glx::GLXContext>,
    next_context: u64,
}

impl fmt::Debug for XlibGlx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XlibGlx")
            .field("configs", &self.configs.len())
            .field("contexts", &self.contexts.len())
            .finish_non_exhaustive()
    }
}

impl GlxLoader<XlibDisplay> for XlibGlx {
    fn load(display: &XlibDisplay) -> Option<Self> {
        let glx = ffi_glx::Glx::open()
            .map_err(|e| log::warn!("libGL unavailable: {e}"))
            .ok()?;
        let procs = GlProcs::load(&glx);
        Some(Self {
            handle: Rc::clone(&display.handle),
            glx,
            procs,
            configs: Vec::new(),
            contexts: BTreeMap::new(),
            next_context: 1,
        })
    }
}

impl XlibGlx {
    fn raw(&self) -> *mut ffi::Display {
        self.handle.raw()
    }

    fn register_config(&mut self, config: ffi_glx::GLXFBConfig) -> FbConfig {
        let index = match self.configs.iter().position(|&c| c == config) {
            Some(index) => index,
            None => {
                self.configs.push(config);
                self.configs.len() - 1
            }
        };
        FbConfig(u64::try_from(index).unwrap_or(u64::MAX).saturating_add(1))
    }

    fn config(&self, config: FbConfig) -> Option<ffi_glx::GLXFBConfig> {
        let index = usize::try_from(config.0.checked_sub(1)?).ok()?;
        self.configs.get(index).copied()
    }

    fn register_context(&mut self, context: ffi_glx::GLXContext) -> Option<GlxContext> {
        if context.is_null() {
            return None;
        }
        let id = self.next_context;
        self.next_context += 1;
        self.contexts.insert(id, context);
        Some(GlxContext(id))
    }

    fn context(&self, context: GlxContext) -> ffi_glx::GLXContext {
        self.contexts
            .get(&context.0)
            .copied()
            .unwrap_or(ptr::null_mut())
    }
}

impl Glx for XlibGlx {
    fn query_extension(&mut self) -> Option<(i32, i32)> {
        let (mut error_base, mut event_base) = (0, 0);
        // SAFETY: all out-pointers are valid locals.
        let present =
            unsafe { (self.glx.glXQueryExtension)(self.raw(), &mut error_base, &mut event_base) };
        (present != FALSE).then_some((error_base, event_base))
    }

    fn query_version(&mut self) -> Option<(i32, i32)> {
        let (mut major, mut minor) = (0, 0);
        // SAFETY: all out-pointers are valid locals.
        let ok = unsafe { (self.glx.glXQueryVersion)(self.raw(), &mut major, &mut minor) };
        (ok != FALSE).then_some((major, minor))
    }

    fn extensions_string(&mut self) -> String {
        // SAFETY: the display is open.
        let raw =
            unsafe { (self.glx.glXQueryExtensionsString)(self.raw(), self.handle.screen) };
        if raw.is_null() {
            return String::new();
        }
        // SAFETY: GLX returns a NUL-terminated string owned by the library.
        unsafe { CStr::from_ptr(raw) }
            .to_string_lossy()
            .into_owned()
    }

    fn has_blit_framebuffer(&self) -> bool {
        self.procs.blit_framebuffer.is_some()
    }

    fn choose_fb_config(&mut self, attributes: &[i32]) -> Vec<FbConfig> {
        let mut count = 0;
        // SAFETY: `attributes` is GLX_NONE-terminated by the caller.
        let list = unsafe {
            (self.glx.glXChooseFBConfig)(
                self.raw(),
                self.handle.screen,
                attributes.as_ptr(),
                &mut count,
            )
        };
        if list.is_null() {
            return Vec::new();
        }
        let count = usize::try_from(count).unwrap_or(0);
        // SAFETY: GLX returns `count` configs, and the list is freed below;
        // the configs themselves stay owned by GLX.
        let raw: Vec<ffi_glx::GLXFBConfig> =
            unsafe { std::slice::from_raw_parts(list, count) }.to_vec();
        // SAFETY: the list was allocated by Xlib.
        unsafe { (self.handle.xlib.XFree)(list.cast()) };
        raw.into_iter().map(|c| self.register_config(c)).collect()
    }

    fn visual_from_fb_config(&mut self, config: FbConfig) -> Option<VisualInfo> {
        let config = self.config(config)?;
        // SAFETY: `config` was returned by glXChooseFBConfig on this display.
        let info = NonNull::new(unsafe { (self.glx.glXGetVisualFromFBConfig)(self.raw(), config) })?;
        // SAFETY: a non-null result points to one XVisualInfo, freed below.
        let raw = unsafe { *info.as_ptr() };
        // SAFETY: the visual info was allocated by Xlib.
        unsafe { (self.handle.xlib.XFree)(info.as_ptr().cast()) };
        Some(VisualInfo {
            visual_id: from_ulong(raw.visualid),
            depth: u32::try_from(raw.depth).unwrap_or(0),
            red_mask: from_ulong(raw.red_mask),
            green_mask: from_ulong(raw.green_mask),
            blue_mask: from_ulong(raw.blue_mask),
        })
    }

    fn fb_config_attrib(&mut self, config: FbConfig, attribute: i32) -> Option<i32> {
        let config = self.config(config)?;
        let mut value = 0;
        // SAFETY: `config` belongs to this display; `value` is a valid local.
        let status =
            unsafe { (self.glx.glXGetFBConfigAttrib)(self.raw(), config, attribute, &mut value) };
        (status == SUCCESS).then_some(value)
    }

    fn create_new_context(
        &mut self,
        config: FbConfig,
        render_type: i32,
        direct: bool,
    ) -> Option<GlxContext> {
        let config = self.config(config)?;
        // SAFETY: `config` belongs to this display.
        let context = unsafe {
            (self.glx.glXCreateNewContext)(
                self.raw(),
                config,
                render_type,
                ptr::null_mut(),
                if direct { TRUE } else { FALSE },
            )
        };
        self.register_context(context)
    }

    fn create_context_attribs(
        &mut self,
        config: FbConfig,
        direct: bool,
        attributes: &[i32],
    ) -> Option<GlxContext> {
        let create = self.procs.create_context_attribs?;
        let config = self.config(config)?;
        // SAFETY: `attributes` is GLX_NONE-terminated by the caller and
        // `config` belongs to this display.
        let context = unsafe {
            create(
                self.raw(),
                config,
                ptr::null_mut(),
                if direct { TRUE } else { FALSE },
                attributes.as_ptr(),
            )
        };
        self.register_context(context)
    }

    fn is_direct(&mut self, context: GlxContext) -> bool {
        let context = self.context(context);
        // SAFETY: `context` is a live context of this display, or null.
        !context.is_null() && unsafe { (self.glx.glXIsDirect)(self.raw(), context) } != FALSE
    }

    fn destroy_context(&mut self, context: GlxContext) {
        if let Some(context) = self.contexts.remove(&context.0) {
            // SAFETY: the context is live and destroyed once.
            unsafe { (self.glx.glXDestroyContext)(self.raw(), context) };
        }
    }

    fn create_window(&mut self, config: FbConfig, window: Window) -> GlxDrawable {
        let Some(config) = self.config(config) else {
            return 0;
        };
        // SAFETY: `config` belongs to this display; no attributes are passed.
        from_ulong(unsafe {
            (self.glx.glXCreateWindow)(self.raw(), config, to_ulong(window), ptr::null())
        })
    }

    fn destroy_window(&mut self, drawable: GlxDrawable) {
        // SAFETY: `drawable` was created by glXCreateWindow.
        unsafe { (self.glx.glXDestroyWindow)(self.raw(), to_ulong(drawable)) };
    }

    fn make_context_current(&mut self, drawable: GlxDrawable, context: Option<GlxContext>) {
        let context = context.map_or(ptr::null_mut(), |c| self.context(c));
        let drawable = to_ulong(drawable);
        // SAFETY: `context` is a live context of this display, or null.
        unsafe { (self.glx.glXMakeContextCurrent)(self.raw(), drawable, drawable, context) };
    }

    fn swap_buffers(&mut self, drawable: GlxDrawable) {
        // SAFETY: the display is open.
        unsafe { (self.glx.glXSwapBuffers)(self.raw(), to_ulong(drawable)) };
    }

    fn select_event(&mut self, drawable: GlxDrawable, mask: u64) {
        // SAFETY: the display is open.
        unsafe { (self.glx.glXSelectEvent)(self.raw(), to_ulong(drawable), to_ulong(mask)) };
    }

    fn query_drawable(&mut self, drawable: GlxDrawable, attribute: i32) -> u32 {
        let mut value = 0;
        // SAFETY: `value` is a valid local.
        unsafe {
            (self.glx.glXQueryDrawable)(self.raw(), to_ulong(drawable), attribute, &mut value);
        }
        value
    }

    fn swap_interval(&mut self, interval: i32) {
        if let Some(swap_interval) = self.procs.swap_interval {
            // SAFETY: a context is current when the backend calls this.
            _ = unsafe { swap_interval(interval) };
        }
    }

    fn get_video_sync(&mut self) -> Option<u32> {
        let get = self.procs.get_video_sync?;
        let mut count = 0;
        // SAFETY: `count` is a valid local.
        (unsafe { get(&mut count) } == 0).then_some(count)
    }

    fn wait_video_sync(&mut self, divisor: i32, remainder: i32) -> Option<u32> {
        let wait = self.procs.wait_video_sync?;
        let mut count = 0;
        // SAFETY: `count` is a valid local.
        (unsafe { wait(divisor, remainder, &mut count) } == 0).then_some(count)
    }

    fn get_sync_values(&mut self, drawable: GlxDrawable) -> Option<SyncValues> {
        let get = self.procs.get_sync_values?;
        let (mut ust, mut msc, mut sbc) = (0, 0, 0);
        // SAFETY: all out-pointers are valid locals.
        let ok = unsafe { get(self.raw(), to_ulong(drawable), &mut ust, &mut msc, &mut sbc) };
        (ok != FALSE).then(|| SyncValues {
            ust: ust.cast_unsigned(),
            msc: msc.cast_unsigned(),
            sbc: sbc.cast_unsigned(),
        })
    }

    fn wait_for_msc(
        &mut self,
        drawable: GlxDrawable,
        target_msc: i64,
        divisor: i64,
        remainder: i64,
    ) -> Option<SyncValues> {
        let wait = self.procs.wait_for_msc?;
        let (mut ust, mut msc, mut sbc) = (0, 0, 0);
        // SAFETY: all out-pointers are valid locals.
        let ok = unsafe {
            wait(
                self.raw(),
                to_ulong(drawable),
                target_msc,
                divisor,
                remainder,
                &mut ust,
                &mut msc,
                &mut sbc,
            )
        };
        (ok != FALSE).then(|| SyncValues {
            ust: ust.cast_unsigned(),
            msc: msc.cast_unsigned(),
            sbc: sbc.cast_unsigned(),
        })
    }

    fn copy_sub_buffer(&mut self, drawable: GlxDrawable, x: i32, y: i32, width: i32, height: i32) {
        if let Some(copy) = self.procs.copy_sub_buffer {
            // SAFETY: the display is open.
            unsafe { copy(self.raw(), to_ulong(drawable), x, y, width, height) };
        }
    }

    fn finish(&mut self) {
        if let Some(finish) = self.procs.finish {
            // SAFETY: a context is current when the backend calls this.
            unsafe { finish() };
        }
    }

    fn flush(&mut self) {
        if let Some(flush) = self.procs.flush {
            // SAFETY: a context is current when the backend calls this.
            unsafe { flush() };
        }
    }

    fn disable_scissor(&mut self) {
        if let Some(disable) = self.procs.disable {
            // SAFETY: a context is current when the backend calls this.
            unsafe { disable(GL_SCISSOR_TEST) };
        }
    }

    fn draw_buffer(&mut self, mode: u32) {
        if let Some(draw_buffer) = self.procs.draw_buffer {
            // SAFETY: a context is current when the backend calls this.
            unsafe { draw_buffer(mode) };
        }
    }

    fn blit_framebuffer(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, mask: u32, filter: u32) {
        if let Some(blit) = self.procs.blit_framebuffer {
            // SAFETY: a context is current when the backend calls this.
            unsafe { blit(x0, y0, x1, y1, x0, y0, x1, y1, mask, filter) };
        }
    }
}
