// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for window-system integrations.
//!
//! A window-system backend ("winsys") owns the native display connection,
//! the single GL context and every onscreen surface created through it.
//! Callers only see the [`Winsys`] trait and the plain types in this
//! module; native handles never leak out.
//!
//! ```text
//!   connect ──► create_context ──► create_onscreen ──┐
//!                                                    ▼
//!        ┌───────── bind ◄── swap_buffers / swap_region
//!        │                          │
//!        │                          ▼
//!        │               take_events (SYNC, COMPLETE, resize, ...)
//!        ▼
//!   destroy_onscreen ──► destroy_context ──► disconnect
//! ```
//!
//! Surfaces are addressed by [`SurfaceId`]. The backend keeps the surfaces
//! in an arena; a surface never holds an owning reference back to the
//! connection.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::frame::FrameEvent;
use crate::output::Output;

/// Identifies an onscreen surface owned by a backend.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// A rectangle in surface coordinates, origin at the top left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Requested framebuffer attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FramebufferConfig {
    /// Require a real alpha channel.
    pub has_alpha: bool,
    /// Require a stencil buffer.
    pub need_stencil: bool,
    /// Multisample count, 0 for none.
    pub samples_per_pixel: u32,
    /// Throttle swaps to the display refresh.
    pub swap_throttled: bool,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            has_alpha: false,
            need_stencil: false,
            samples_per_pixel: 0,
            swap_throttled: true,
        }
    }
}

/// Parameters for a new onscreen surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OnscreenDescriptor {
    /// Initial width in pixels.
    pub width: i32,
    /// Initial height in pixels.
    pub height: i32,
    /// Framebuffer attributes.
    pub framebuffer: FramebufferConfig,
    /// Native window to render into instead of creating one.
    pub foreign_window: Option<u64>,
}

impl OnscreenDescriptor {
    /// Describes a backend-created window of the given size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            framebuffer: FramebufferConfig::default(),
            foreign_window: None,
        }
    }
}

/// Something a surface wants the application to know about.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// A frame lifecycle stage was reached.
    Frame(FrameEvent),
    /// The window was resized by the window system.
    Resized {
        /// New width.
        width: i32,
        /// New height.
        height: i32,
    },
    /// Part of the window needs to be redrawn.
    Dirty(Rect),
    /// The user asked to close the window.
    CloseRequested,
}

/// Optional capabilities of a backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WinsysFeatures {
    /// More than one onscreen surface can exist at a time.
    pub multiple_onscreen: bool,
    /// Swaps can be throttled to the display refresh.
    pub swap_throttle: bool,
    /// A hardware vblank counter can be read.
    pub vblank_counter: bool,
    /// The CPU can block until the next vblank.
    pub vblank_wait: bool,
    /// Damaged rectangles can be copied to the front buffer.
    pub swap_region: bool,
    /// Region swaps can be throttled.
    pub swap_region_throttle: bool,
    /// The back buffer age can be queried.
    pub buffer_age: bool,
    /// SYNC and COMPLETE are delivered from real completion signals.
    pub sync_and_complete_event: bool,
    /// Presentation times come from the driver or compositor.
    pub presentation_time: bool,
}

/// A setup operation failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WinsysError {
    /// The native display could not be opened.
    DisplayOpen,
    /// The GLX extension is missing.
    MissingGlx,
    /// GLX is older than 1.2.
    GlxTooOld {
        /// Reported major version.
        major: i32,
        /// Reported minor version.
        minor: i32,
    },
    /// No framebuffer config matches the request.
    NoCompatibleConfig,
    /// Alpha was requested but no config has an RGBA visual.
    NoRgbaVisual,
    /// A config has no X visual.
    NoVisual,
    /// Context creation failed.
    CreateContext,
    /// The new context could not be made current.
    BindContext,
    /// No context exists yet.
    NoContext,
    /// Querying a foreign window failed.
    ForeignWindow {
        /// The window that was queried.
        xid: u64,
        /// X error code.
        code: u8,
    },
    /// Creating the surface window failed.
    CreateWindow {
        /// X error code.
        code: u8,
    },
    /// The surface id is not live.
    UnknownSurface(SurfaceId),
}

impl fmt::Display for WinsysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisplayOpen => f.write_str("Failed to open X Display"),
            Self::MissingGlx => f.write_str("XServer appears to lack required GLX support"),
            Self::GlxTooOld { major, minor } => write!(
                f,
                "XServer appears to lack required GLX 1.2 support (found {major}.{minor})"
            ),
            Self::NoCompatibleConfig => f.write_str("Failed to find any compatible fbconfigs"),
            Self::NoRgbaVisual => f.write_str("Unable to find fbconfig with rgba visual"),
            Self::NoVisual => f.write_str("Unable to retrieve the X11 visual"),
            Self::CreateContext => f.write_str("Unable to create suitable GL context"),
            Self::BindContext => f.write_str("Unable to select the newly created GLX context"),
            Self::NoContext => f.write_str("No GL context has been created"),
            Self::ForeignWindow { xid, code } => write!(
                f,
                "Unable to query geometry of foreign xid 0x{xid:08X}: X error {code}"
            ),
            Self::CreateWindow { code } => {
                write!(f, "X error while creating window for onscreen: {code}")
            }
            Self::UnknownSurface(id) => write!(f, "Unknown surface {}", id.0),
        }
    }
}

impl core::error::Error for WinsysError {}

/// A window-system backend.
///
/// Steady-state operations (`bind`, swaps) never fail because of transient
/// native errors; those are logged and the next frame retries. They only
/// return an error for a surface id that is not live.
pub trait Winsys {
    /// Backend-specific connection parameters.
    type Config;

    /// Opens the native display and queries its capabilities.
    fn connect(config: Self::Config) -> Result<Self, WinsysError>
    where
        Self: Sized;

    /// Tears down every surface, the context and the connection.
    fn disconnect(self)
    where
        Self: Sized;

    /// Capabilities negotiated so far.
    fn features(&self) -> WinsysFeatures;

    /// Live outputs, sorted by name.
    fn outputs(&self) -> &[Rc<Output>];

    /// Returns `true` once after the output list changed.
    fn take_outputs_changed(&mut self) -> bool;

    /// Selects a framebuffer config, creates the GL context and binds it to
    /// a hidden fallback drawable.
    fn create_context(&mut self, config: &FramebufferConfig) -> Result<(), WinsysError>;

    /// Destroys the GL context and the fallback drawable.
    fn destroy_context(&mut self);

    /// Creates an onscreen surface.
    fn create_onscreen(&mut self, descriptor: &OnscreenDescriptor)
    -> Result<SurfaceId, WinsysError>;

    /// Destroys an onscreen surface, rebinding the fallback drawable first if
    /// the surface was current.
    fn destroy_onscreen(&mut self, id: SurfaceId) -> Result<(), WinsysError>;

    /// Makes the surface's drawable current.
    fn bind(&mut self, id: SurfaceId) -> Result<(), WinsysError>;

    /// Presents the whole back buffer.
    fn swap_buffers(&mut self, id: SurfaceId, damage: &[Rect]) -> Result<(), WinsysError>;

    /// Copies the given rectangles of the back buffer to the screen.
    fn swap_region(&mut self, id: SurfaceId, rects: &[Rect]) -> Result<(), WinsysError>;

    /// Age of the back buffer in frames, 0 if unknown.
    fn buffer_age(&mut self, id: SurfaceId) -> Result<u32, WinsysError>;

    /// Maps or unmaps the surface window.
    fn set_visibility(&mut self, id: SurfaceId, visible: bool) -> Result<(), WinsysError>;

    /// Allows or forbids interactive resizing.
    fn set_resizable(&mut self, id: SurfaceId, resizable: bool) -> Result<(), WinsysError>;

    /// Changes whether swaps are throttled to the display refresh.
    fn set_swap_throttled(&mut self, id: SurfaceId, throttled: bool) -> Result<(), WinsysError>;

    /// Drains the surface's pending events in delivery order.
    fn take_events(&mut self, id: SurfaceId) -> Result<Vec<SurfaceEvent>, WinsysError>;
}
