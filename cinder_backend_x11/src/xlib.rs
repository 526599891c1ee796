// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Xlib capability interface.
//!
//! [`Xlib`] is the subset of Xlib, XSync and XRandR the backend needs. The
//! backend never calls a C function directly; a binding layer implements
//! this trait on top of the real libraries, and tests implement it with a
//! scripted server.
//!
//! Errors raised by any call are reported to whichever [`ErrorHandler`] is
//! installed at the time, exactly like `XSetErrorHandler`.

use std::rc::Rc;

/// An X window id.
pub type Window = u64;

/// An interned X atom.
pub type Atom = u64;

/// An X visual id.
pub type VisualId = u64;

/// An XSync counter id.
pub type SyncCounter = u64;

/// A RandR CRTC, output or mode id.
pub type RandrXid = u64;

/// `CurrentTime` for focus requests.
pub const CURRENT_TIME: u64 = 0;

/// The predefined `ATOM` type.
pub const XA_ATOM: Atom = 4;

/// The predefined `CARDINAL` type.
pub const XA_CARDINAL: Atom = 6;

/// RandR `ScreenChangeNotify` offset from the event base.
pub const RR_SCREEN_CHANGE_NOTIFY: i32 = 0;

/// RandR `Notify` offset from the event base.
pub const RR_NOTIFY: i32 = 1;

/// RandR input mask: screen, CRTC and output changes.
pub const RR_CHANGE_MASK: u32 = 1 | 2 | 4;

/// An X event selection mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct EventMask(pub i64);

impl EventMask {
    /// `ExposureMask`.
    pub const EXPOSURE: Self = Self(1 << 15);
    /// `StructureNotifyMask`.
    pub const STRUCTURE_NOTIFY: Self = Self(1 << 17);
    /// `SubstructureNotifyMask`.
    pub const SUBSTRUCTURE_NOTIFY: Self = Self(1 << 19);
    /// `SubstructureRedirectMask`.
    pub const SUBSTRUCTURE_REDIRECT: Self = Self(1 << 20);
}

impl core::ops::BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A protocol error reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorEvent {
    /// X error code (`BadWindow`, `BadMatch`, ...).
    pub error_code: u8,
    /// Major opcode of the failed request.
    pub request_code: u8,
    /// Resource the request referred to.
    pub resource_id: u64,
    /// Serial of the failed request.
    pub serial: u64,
}

/// A process-wide X error callback.
pub type ErrorHandler = Rc<dyn Fn(&ErrorEvent)>;

/// Result of an extension query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtensionInfo {
    /// First event code of the extension.
    pub event_base: i32,
    /// First error code of the extension.
    pub error_base: i32,
}

/// A window property as returned by `XGetWindowProperty`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// Actual type of the property.
    pub type_: Atom,
    /// Actual format (8, 16 or 32).
    pub format: i32,
    /// Items, widened to 64 bits.
    pub items: Vec<u64>,
    /// Bytes left unread.
    pub bytes_after: u64,
}

/// Attributes of a window to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowDesc {
    /// Left edge relative to the parent.
    pub x: i32,
    /// Top edge relative to the parent.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
    /// Visual; a colormap for it is allocated by the binding.
    pub visual: VisualInfo,
    /// Bypass the window manager.
    pub override_redirect: bool,
    /// Initial event selection.
    pub event_mask: EventMask,
}

/// A visual as described by `XVisualInfo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VisualInfo {
    /// Visual id.
    pub visual_id: VisualId,
    /// Depth in bits.
    pub depth: u32,
    /// Red channel mask.
    pub red_mask: u64,
    /// Green channel mask.
    pub green_mask: u64,
    /// Blue channel mask.
    pub blue_mask: u64,
}

impl VisualInfo {
    /// Returns `true` for a 32-bit visual whose color masks leave room for
    /// an alpha channel.
    #[must_use]
    pub fn has_alpha_channel(&self) -> bool {
        self.depth == 32 && (self.red_mask | self.green_mask | self.blue_mask) != 0xffff_ffff
    }
}

/// Geometry of an existing window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WindowAttributes {
    /// Left edge relative to the parent.
    pub x: i32,
    /// Top edge relative to the parent.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
    /// Events currently selected by this client.
    pub your_event_mask: EventMask,
}

/// `WM_NORMAL_HINTS` size constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeHints {
    /// Minimum width.
    pub min_width: i32,
    /// Minimum height.
    pub min_height: i32,
    /// Maximum width.
    pub max_width: i32,
    /// Maximum height.
    pub max_height: i32,
}

/// RandR screen resources.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ScreenResources {
    /// CRTCs of the screen.
    pub crtcs: Vec<RandrXid>,
    /// Known modes.
    pub modes: Vec<ModeInfo>,
}

/// A RandR mode line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeInfo {
    /// Mode id.
    pub id: RandrXid,
    /// Pixel clock in Hz.
    pub dot_clock: u64,
    /// Total horizontal pixels including blanking.
    pub h_total: u32,
    /// Total vertical lines including blanking.
    pub v_total: u32,
}

/// State of one CRTC.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CrtcInfo {
    /// Left edge on the screen.
    pub x: i32,
    /// Top edge on the screen.
    pub y: i32,
    /// Scanout width.
    pub width: u32,
    /// Scanout height.
    pub height: u32,
    /// Active mode, `None` when the CRTC is off.
    pub mode: Option<RandrXid>,
    /// RandR rotation and reflection bits.
    pub rotation: u16,
    /// Outputs driven by this CRTC.
    pub outputs: Vec<RandrXid>,
}

/// State of one RandR output.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OutputInfo {
    /// Connector name, e.g. `DP-1`.
    pub name: String,
    /// Physical width in millimeters.
    pub mm_width: i32,
    /// Physical height in millimeters.
    pub mm_height: i32,
    /// Raw X `SubPixel*` value.
    pub subpixel_order: u16,
}

/// `ConfigureNotify`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigureEvent {
    /// Window that changed.
    pub window: Window,
    /// New left edge.
    pub x: i32,
    /// New top edge.
    pub y: i32,
    /// New width.
    pub width: i32,
    /// New height.
    pub height: i32,
    /// Set for synthetic events sent by the window manager, whose
    /// coordinates are root-relative.
    pub send_event: bool,
}

/// `Expose`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExposeEvent {
    /// Window to redraw.
    pub window: Window,
    /// Left edge of the exposed area.
    pub x: i32,
    /// Top edge of the exposed area.
    pub y: i32,
    /// Width of the exposed area.
    pub width: i32,
    /// Height of the exposed area.
    pub height: i32,
}

/// A format-32 `ClientMessage`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientMessageEvent {
    /// Target window.
    pub window: Window,
    /// Message type atom.
    pub message_type: Atom,
    /// The five 32-bit data words.
    pub data: [u32; 5],
}

impl ClientMessageEvent {
    /// Joins two data words into a 64-bit value, `lo` holding the low half.
    #[must_use]
    pub fn split_u64(&self, lo: usize, hi: usize) -> u64 {
        u64::from(self.data[lo]) | (u64::from(self.data[hi]) << 32)
    }
}

/// Payload of an extension event the backend understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionPayload {
    /// No decoded payload (RandR notifications).
    Empty,
    /// `GLX_BufferSwapComplete` from `GLX_INTEL_swap_event`.
    SwapComplete {
        /// Drawable that swapped.
        drawable: u64,
        /// Unadjusted system time of the swap.
        ust: u64,
        /// Media stream counter.
        msc: u64,
        /// Swap buffer counter.
        sbc: u64,
    },
}

/// An event in an extension's event range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtensionEvent {
    /// Raw event type (extension event base plus offset).
    pub type_code: i32,
    /// Decoded payload.
    pub payload: ExtensionPayload,
}

/// What happened, for [`XEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XEventKind {
    /// A window was moved or resized.
    Configure(ConfigureEvent),
    /// Part of a window was exposed.
    Expose(ExposeEvent),
    /// A client message.
    ClientMessage(ClientMessageEvent),
    /// An extension event.
    Extension(ExtensionEvent),
    /// Anything else, by raw type.
    Other(i32),
}

/// A native event with the serial of the last request the server processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XEvent {
    /// Request serial at the time the event was generated.
    pub serial: u64,
    /// Decoded event.
    pub kind: XEventKind,
}

/// Native display operations.
pub trait Xlib {
    /// Opens a display by name, or the default display.
    fn open(display_name: Option<&str>) -> Option<Self>
    where
        Self: Sized;

    /// Toggles synchronous request mode.
    fn set_synchronous(&mut self, synchronous: bool);

    /// Installs `handler`, returning the previously installed one.
    fn set_error_handler(&mut self, handler: Option<ErrorHandler>) -> Option<ErrorHandler>;

    /// Serial the next request will get.
    fn next_request(&self) -> u64;

    /// Flushes and waits until every request has been processed.
    fn sync(&mut self);

    /// Flushes the output buffer.
    fn flush(&mut self);

    /// Root window of the default screen.
    fn default_root_window(&self) -> Window;

    /// Interns an atom.
    fn intern_atom(&mut self, name: &str) -> Atom;

    /// Queries a core-protocol extension by name.
    fn query_extension(&mut self, name: &str) -> Option<ExtensionInfo>;

    /// Reads a whole property.
    fn get_property(&mut self, window: Window, property: Atom, type_: Atom) -> Option<Property>;

    /// Replaces a format-32 property.
    fn change_property(&mut self, window: Window, property: Atom, type_: Atom, items: &[u64]);

    /// Sets `WM_PROTOCOLS`.
    fn set_wm_protocols(&mut self, window: Window, protocols: &[Atom]);

    /// Sets `WM_NORMAL_HINTS`.
    fn set_wm_normal_hints(&mut self, window: Window, hints: &SizeHints);

    /// Creates a window.
    fn create_window(&mut self, parent: Window, desc: &WindowDesc) -> Window;

    /// Destroys a window.
    fn destroy_window(&mut self, window: Window);

    /// Maps a window.
    fn map_window(&mut self, window: Window);

    /// Unmaps a window.
    fn unmap_window(&mut self, window: Window);

    /// Replaces the event selection of a window.
    fn select_input(&mut self, window: Window, mask: EventMask);

    /// Queries window geometry.
    fn get_window_attributes(&mut self, window: Window) -> Option<WindowAttributes>;

    /// Translates a point between window coordinate spaces.
    fn translate_coordinates(
        &mut self,
        src: Window,
        dest: Window,
        x: i32,
        y: i32,
    ) -> Option<(i32, i32)>;

    /// Gives input focus to `window`, reverting to its parent.
    fn set_input_focus(&mut self, window: Window, time: u64);

    /// Sends a client message.
    fn send_client_message(
        &mut self,
        destination: Window,
        propagate: bool,
        mask: EventMask,
        message: &ClientMessageEvent,
    );

    /// Initializes XSync; `false` if the extension is missing.
    fn sync_initialize(&mut self) -> bool;

    /// Creates a 64-bit sync counter.
    fn sync_create_counter(&mut self, initial: u64) -> SyncCounter;

    /// Sets a sync counter.
    fn sync_set_counter(&mut self, counter: SyncCounter, value: u64);

    /// Destroys a sync counter.
    fn sync_destroy_counter(&mut self, counter: SyncCounter);

    /// Queries RandR; `None` if the extension is missing.
    fn randr_query_extension(&mut self) -> Option<ExtensionInfo>;

    /// Selects RandR notifications on `window`.
    fn randr_select_input(&mut self, window: Window, mask: u32);

    /// Fetches the screen resources of the root window.
    fn randr_screen_resources(&mut self, root: Window) -> Option<ScreenResources>;

    /// Fetches one CRTC.
    fn randr_crtc_info(&mut self, resources: &ScreenResources, crtc: RandrXid)
    -> Option<CrtcInfo>;

    /// Fetches one output.
    fn randr_output_info(
        &mut self,
        resources: &ScreenResources,
        output: RandrXid,
    ) -> Option<OutputInfo>;
}
