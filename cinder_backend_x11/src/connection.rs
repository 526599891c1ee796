// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The native display connection.
//!
//! [`DisplayConnection`] owns the Xlib handle, its [`ErrorTrap`], the atoms
//! the backend uses and the output registry. Connecting queries, in order:
//!
//! 1. `_NET_SUPPORTED` on the root window, for `_NET_WM_FRAME_DRAWN`
//!    (the compositor frame-sync handshake),
//! 2. the XSync extension (frame-sync counters),
//! 3. RandR, whose notifications keep the output registry current.
//!
//! A topology scan records the serial of its first request; RandR events
//! generated before that serial are already reflected in the scan and are
//! ignored.

use std::rc::Rc;

use cinder_core::backend::WinsysError;
use cinder_core::output::{Output, OutputChange, OutputRegistry};

use crate::config::X11Config;
use crate::randr;
use crate::trap::{ErrorTrap, TrapToken};
use crate::xlib::{
    Atom, ExtensionInfo, RR_CHANGE_MASK, RR_NOTIFY, RR_SCREEN_CHANGE_NOTIFY, Window, XA_ATOM,
    XEvent, XEventKind, Xlib,
};

/// Atoms interned at connect time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Atoms {
    /// `WM_PROTOCOLS`.
    pub wm_protocols: Atom,
    /// `WM_DELETE_WINDOW`.
    pub wm_delete_window: Atom,
    /// `WM_TAKE_FOCUS`.
    pub wm_take_focus: Atom,
    /// `_NET_SUPPORTED`.
    pub net_supported: Atom,
    /// `_NET_WM_PING`.
    pub net_wm_ping: Atom,
    /// `_NET_WM_PID`.
    pub net_wm_pid: Atom,
    /// `_NET_WM_WINDOW_TYPE`.
    pub net_wm_window_type: Atom,
    /// `_NET_WM_WINDOW_TYPE_NORMAL`.
    pub net_wm_window_type_normal: Atom,
    /// `_NET_WM_SYNC_REQUEST`.
    pub net_wm_sync_request: Atom,
    /// `_NET_WM_SYNC_REQUEST_COUNTER`.
    pub net_wm_sync_request_counter: Atom,
    /// `_NET_WM_FRAME_DRAWN`.
    pub net_wm_frame_drawn: Atom,
    /// `_NET_WM_FRAME_TIMINGS`.
    pub net_wm_frame_timings: Atom,
}

impl Atoms {
    fn intern<X: Xlib>(native: &mut X) -> Self {
        Self {
            wm_protocols: native.intern_atom("WM_PROTOCOLS"),
            wm_delete_window: native.intern_atom("WM_DELETE_WINDOW"),
            wm_take_focus: native.intern_atom("WM_TAKE_FOCUS"),
            net_supported: native.intern_atom("_NET_SUPPORTED"),
            net_wm_ping: native.intern_atom("_NET_WM_PING"),
            net_wm_pid: native.intern_atom("_NET_WM_PID"),
            net_wm_window_type: native.intern_atom("_NET_WM_WINDOW_TYPE"),
            net_wm_window_type_normal: native.intern_atom("_NET_WM_WINDOW_TYPE_NORMAL"),
            net_wm_sync_request: native.intern_atom("_NET_WM_SYNC_REQUEST"),
            net_wm_sync_request_counter: native.intern_atom("_NET_WM_SYNC_REQUEST_COUNTER"),
            net_wm_frame_drawn: native.intern_atom("_NET_WM_FRAME_DRAWN"),
            net_wm_frame_timings: native.intern_atom("_NET_WM_FRAME_TIMINGS"),
        }
    }
}

/// An open X display plus the state derived from it.
#[derive(Debug)]
pub struct DisplayConnection<X: Xlib> {
    native: X,
    trap: ErrorTrap,
    root: Window,
    atoms: Atoms,
    foreign: bool,
    frame_drawn_supported: bool,
    sync_available: bool,
    randr: Option<ExtensionInfo>,
    outputs: OutputRegistry,
    outputs_update_serial: u64,
}

impl<X: Xlib> DisplayConnection<X> {
    /// Opens the configured display and queries its capabilities.
    pub fn open(config: &X11Config) -> Result<Self, WinsysError> {
        let native = X::open(config.display_name.as_deref()).ok_or(WinsysError::DisplayOpen)?;
        Ok(Self::setup(native, config, false))
    }

    /// Adopts a display opened by the application. It is handed back by
    /// [`disconnect`](Self::disconnect) instead of being closed.
    pub fn with_foreign_display(native: X, config: &X11Config) -> Self {
        Self::setup(native, config, true)
    }

    fn setup(mut native: X, config: &X11Config, foreign: bool) -> Self {
        if config.synchronous {
            native.set_synchronous(true);
        }
        let root = native.default_root_window();
        let atoms = Atoms::intern(&mut native);

        let mut connection = Self {
            native,
            trap: ErrorTrap::new(),
            root,
            atoms,
            foreign,
            frame_drawn_supported: false,
            sync_available: false,
            randr: None,
            outputs: OutputRegistry::new(),
            outputs_update_serial: 0,
        };

        connection.frame_drawn_supported = connection.query_net_supported();
        connection.sync_available = connection.native.sync_initialize();
        if !connection.sync_available {
            log::warn!("XSync extension missing; compositor frame sync is unavailable");
        }
        connection.randr = connection.native.randr_query_extension();
        if connection.randr.is_some() {
            connection.native.randr_select_input(root, RR_CHANGE_MASK);
            _ = connection.update_outputs();
        }
        connection
    }

    fn query_net_supported(&mut self) -> bool {
        let Some(property) =
            self.native
                .get_property(self.root, self.atoms.net_supported, XA_ATOM)
        else {
            return false;
        };
        if property.bytes_after != 0 {
            log::warn!("_NET_SUPPORTED was only partially read");
            return false;
        }
        if property.type_ != XA_ATOM || property.format != 32 {
            log::warn!(
                "_NET_SUPPORTED has type {} format {}, expected ATOM/32",
                property.type_,
                property.format
            );
            return false;
        }
        property.items.contains(&self.atoms.net_wm_frame_drawn)
    }

    /// Closes the connection. A foreign display is returned to the caller.
    pub fn disconnect(mut self) -> Option<X> {
        self.outputs.clear();
        self.foreign.then_some(self.native)
    }

    /// The native handle.
    pub fn native(&mut self) -> &mut X {
        &mut self.native
    }

    /// Root window of the default screen.
    #[must_use]
    pub fn root(&self) -> Window {
        self.root
    }

    /// Interned atoms.
    #[must_use]
    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    /// Whether the compositor frame-sync handshake is available.
    #[must_use]
    pub fn frame_drawn_supported(&self) -> bool {
        self.frame_drawn_supported
    }

    /// Whether XSync counters can be created.
    #[must_use]
    pub fn sync_available(&self) -> bool {
        self.sync_available
    }

    /// RandR event base, if RandR is present.
    #[must_use]
    pub fn randr_event_base(&self) -> Option<i32> {
        self.randr.map(|info| info.event_base)
    }

    /// Opens an error-trap bracket.
    pub fn trap(&mut self) -> TrapToken {
        self.trap.trap(&mut self.native)
    }

    /// Closes an error-trap bracket, returning the captured X error code.
    pub fn untrap(&mut self, token: TrapToken) -> u8 {
        self.trap.untrap(&mut self.native, token)
    }

    /// Nesting depth of open error traps.
    #[must_use]
    pub fn trap_depth(&self) -> usize {
        self.trap.depth()
    }

    /// Live outputs, sorted by name.
    #[must_use]
    pub fn outputs(&self) -> &[Rc<Output>] {
        self.outputs.outputs()
    }

    /// Output overlapping the given screen rectangle the most.
    #[must_use]
    pub fn output_for_rectangle(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Option<Rc<Output>> {
        self.outputs
            .output_for_rectangle(x, y, width, height)
            .cloned()
    }

    /// Rescans the topology and reconciles the registry.
    ///
    /// A failed scan leaves the registry untouched and reports no change.
    pub fn update_outputs(&mut self) -> Vec<OutputChange> {
        self.outputs_update_serial = self.native.next_request();

        let token = self.trap();
        let scanned = randr::scan(&mut self.native, self.root);
        let code = self.untrap(token);

        let candidates = match scanned {
            Some(candidates) if code == 0 => candidates,
            _ => {
                log::warn!("output scan failed (X error {code}); keeping previous outputs");
                return Vec::new();
            }
        };

        let changes = self.outputs.reconcile(candidates);
        if !changes.is_empty() {
            for output in self.outputs.outputs() {
                log::debug!("output {output}");
            }
        }
        changes
    }

    /// Rescans if `event` is a RandR notification newer than the last scan.
    ///
    /// Returns the resulting changes, empty if the event was not relevant.
    pub fn handle_randr_event(&mut self, event: &XEvent) -> Vec<OutputChange> {
        let (Some(base), XEventKind::Extension(ext)) = (self.randr_event_base(), &event.kind)
        else {
            return Vec::new();
        };
        let is_randr = ext.type_code == base + RR_SCREEN_CHANGE_NOTIFY
            || ext.type_code == base + RR_NOTIFY;
        if !is_randr || event.serial < self.outputs_update_serial {
            return Vec::new();
        }
        self.update_outputs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCrtc, FakeServer};
    use crate::xlib::{ExtensionEvent, ExtensionPayload};

    fn dual_head() -> FakeServer {
        let mut server = FakeServer::new();
        server.add_crtc(FakeCrtc::new("HDMI-1", 1920, 0, 1920, 1080, 59.94));
        server.add_crtc(FakeCrtc::new("DP-1", 0, 0, 1920, 1080, 60.0));
        server
    }

    fn randr_event(connection: &DisplayConnection<crate::fake::FakeDisplay>, serial: u64) -> XEvent {
        XEvent {
            serial,
            kind: XEventKind::Extension(ExtensionEvent {
                type_code: connection.randr_event_base().unwrap_or_default() + RR_NOTIFY,
                payload: ExtensionPayload::Empty,
            }),
        }
    }

    #[test]
    fn connect_scans_outputs_sorted_by_name() {
        let (display, _) = dual_head().split();
        let connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        let names: Vec<&str> = connection.outputs().iter().map(|o| o.name()).collect();
        assert_eq!(names, ["DP-1", "HDMI-1"]);
        assert_eq!(
            connection
                .output_for_rectangle(1900, 0, 100, 100)
                .map(|o| o.name().to_owned()),
            Some("HDMI-1".to_owned())
        );
    }

    #[test]
    fn second_scan_without_changes_reports_nothing() {
        let (display, _) = dual_head().split();
        let mut connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        let before: Vec<Rc<Output>> = connection.outputs().to_vec();
        assert!(connection.update_outputs().is_empty());
        assert_eq!(connection.outputs(), before.as_slice());
    }

    #[test]
    fn failed_scan_keeps_known_outputs() {
        let (display, server) = dual_head().split();
        let mut connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        server.borrow_mut().fail_screen_resources = true;
        assert!(connection.update_outputs().is_empty());
        assert_eq!(connection.outputs().len(), 2);
    }

    #[test]
    fn x_error_during_scan_keeps_known_outputs() {
        let (display, server) = dual_head().split();
        let mut connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        server.borrow_mut().error_on_crtc_info = Some(crate::fake::BAD_WINDOW);
        assert!(connection.update_outputs().is_empty());
        assert_eq!(connection.outputs().len(), 2, "a trapped error aborts the scan");
        assert_eq!(connection.trap_depth(), 0);
    }

    #[test]
    fn randr_event_triggers_rescan() {
        let (display, server) = dual_head().split();
        let mut connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        server.borrow_mut().remove_crtc("HDMI-1");

        let event = randr_event(&connection, server.borrow().serial);
        let changes = connection.handle_randr_event(&event);
        assert_eq!(changes, [OutputChange::Removed("HDMI-1".to_owned())]);
        assert_eq!(connection.outputs().len(), 1);
    }

    #[test]
    fn stale_randr_event_is_ignored() {
        let (display, server) = dual_head().split();
        let mut connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        server.borrow_mut().remove_crtc("HDMI-1");

        let event = randr_event(&connection, 0);
        assert!(connection.handle_randr_event(&event).is_empty());
        assert_eq!(connection.outputs().len(), 2);
    }

    #[test]
    fn net_supported_detects_frame_drawn() {
        let mut server = FakeServer::new();
        server.advertise_frame_drawn = true;
        let (display, _) = server.split();
        let connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        assert!(connection.frame_drawn_supported());

        let (display, _) = FakeServer::new().split();
        let connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        assert!(!connection.frame_drawn_supported());
    }

    #[test]
    fn partially_read_net_supported_is_unsupported() {
        let mut server = FakeServer::new();
        server.advertise_frame_drawn = true;
        server.net_supported_bytes_after = 4;
        let (display, _) = server.split();
        let connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        assert!(!connection.frame_drawn_supported());
    }

    #[test]
    fn missing_extensions_degrade_quietly() {
        let mut server = dual_head();
        server.sync_missing = true;
        server.randr_missing = true;
        let (display, _) = server.split();
        let connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        assert!(!connection.sync_available());
        assert_eq!(connection.randr_event_base(), None);
        assert!(connection.outputs().is_empty(), "no RandR, no outputs");
    }

    #[test]
    fn synchronous_config_is_applied() {
        let (display, server) = FakeServer::new().split();
        let config = X11Config {
            synchronous: true,
            ..X11Config::default()
        };
        let _connection = DisplayConnection::with_foreign_display(display, &config);
        assert!(server.borrow().synchronous);
    }

    #[test]
    fn foreign_display_is_returned_on_disconnect() {
        let (display, _) = FakeServer::new().split();
        let connection = DisplayConnection::with_foreign_display(display, &X11Config::default());
        assert!(connection.disconnect().is_some());
    }

    #[test]
    fn open_failure_is_a_setup_error() {
        let config = X11Config {
            display_name: Some(crate::fake::UNREACHABLE_DISPLAY.to_owned()),
            ..X11Config::default()
        };
        let result = DisplayConnection::<crate::fake::FakeDisplay>::open(&config);
        assert!(matches!(result, Err(WinsysError::DisplayOpen)));
    }
}
