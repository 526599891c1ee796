// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! X11 backend for cinder.
//!
//! Presents GL frames through GLX on an Xlib display:
//!
//! - RandR output tracking with change notification
//! - GLX context creation, capability detection and graceful degradation
//! - Full and sub-region swaps with vblank throttling
//! - `_NET_WM_FRAME_DRAWN` / `_NET_WM_FRAME_TIMINGS` compositor frame sync,
//!   or `GLX_INTEL_swap_event` when no compositor handshake is available
//!
//! Native calls go through the [`Xlib`](xlib::Xlib) and [`Glx`](glx::Glx)
//! traits. The [`native`] module implements them on libX11, libXrandr,
//! libXext and libGL, loaded at runtime; it is the only module that holds
//! FFI.
//!
//! # Event flow
//!
//! ```text
//!   XEvent ──► X11Winsys::handle_event ──► RandR filter ──► surface filter
//!                                                               │
//!                                            application filters ◄┘
//! ```
//!
//! Surface events (frame lifecycle, resizes, exposes, close requests) are
//! queued per surface and drained with
//! [`Winsys::take_events`](cinder_core::backend::Winsys::take_events).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod connection;
pub mod features;
pub mod filter;
pub mod glx;
pub mod native;
pub mod randr;
pub mod time;
pub mod trap;
pub mod xlib;

mod context;
mod events;
mod onscreen;
mod present;
mod winsys;

#[cfg(test)]
mod fake;

pub use config::X11Config;
pub use native::{XlibDisplay, XlibGlx};
pub use winsys::{ForeignEventMaskFn, X11Winsys};
