// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GLX and GL capability interface.
//!
//! [`Glx`] covers the GLX entry points and the handful of GL calls the
//! presentation pipeline issues. Optional entry points (swap interval,
//! video sync, OML sync values, sub-buffer copy) are part of the trait, but
//! the backend only calls them after the matching extension was found in
//! the extension string (see [`GlxExtensions`](crate::features::GlxExtensions)).
//! Resolving those symbols is the binding layer's business.

use crate::xlib::{VisualInfo, Window, Xlib};

/// Opaque framebuffer config handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FbConfig(pub u64);

/// Opaque GL context handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlxContext(pub u64);

/// A GLX drawable: either an X window or a `GLXWindow` wrapper.
pub type GlxDrawable = u64;

/// Values returned by `glXGetSyncValuesOML` and `glXWaitForMscOML`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SyncValues {
    /// Unadjusted system time.
    pub ust: u64,
    /// Media stream counter.
    pub msc: u64,
    /// Swap buffer counter.
    pub sbc: u64,
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Terminates an attribute list.
pub const GLX_NONE: i32 = 0;
/// `GLX_DOUBLEBUFFER`.
pub const GLX_DOUBLEBUFFER: i32 = 5;
/// `GLX_RED_SIZE`.
pub const GLX_RED_SIZE: i32 = 8;
/// `GLX_GREEN_SIZE`.
pub const GLX_GREEN_SIZE: i32 = 9;
/// `GLX_BLUE_SIZE`.
pub const GLX_BLUE_SIZE: i32 = 10;
/// `GLX_ALPHA_SIZE`.
pub const GLX_ALPHA_SIZE: i32 = 11;
/// `GLX_DEPTH_SIZE`.
pub const GLX_DEPTH_SIZE: i32 = 12;
/// `GLX_STENCIL_SIZE`.
pub const GLX_STENCIL_SIZE: i32 = 13;
/// `GLX_DONT_CARE`.
pub const GLX_DONT_CARE: i32 = -1;
/// `GLX_DRAWABLE_TYPE`.
pub const GLX_DRAWABLE_TYPE: i32 = 0x8010;
/// `GLX_RENDER_TYPE`.
pub const GLX_RENDER_TYPE: i32 = 0x8011;
/// `GLX_WINDOW_BIT`.
pub const GLX_WINDOW_BIT: i32 = 0x1;
/// `GLX_RGBA_BIT`.
pub const GLX_RGBA_BIT: i32 = 0x1;
/// `GLX_RGBA_TYPE`.
pub const GLX_RGBA_TYPE: i32 = 0x8014;
/// `GLX_SAMPLE_BUFFERS`.
pub const GLX_SAMPLE_BUFFERS: i32 = 100_000;
/// `GLX_SAMPLES`.
pub const GLX_SAMPLES: i32 = 100_001;
/// `GLX_CONTEXT_MAJOR_VERSION_ARB`.
pub const GLX_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
/// `GLX_CONTEXT_MINOR_VERSION_ARB`.
pub const GLX_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
/// `GLX_CONTEXT_FLAGS_ARB`.
pub const GLX_CONTEXT_FLAGS_ARB: i32 = 0x2094;
/// `GLX_CONTEXT_PROFILE_MASK_ARB`.
pub const GLX_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
/// `GLX_CONTEXT_CORE_PROFILE_BIT_ARB`.
pub const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x1;
/// `GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB`.
pub const GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: i32 = 0x2;
/// `GLX_BACK_BUFFER_AGE_EXT`.
pub const GLX_BACK_BUFFER_AGE_EXT: i32 = 0x20F4;
/// `GLX_BUFFER_SWAP_COMPLETE_INTEL_MASK`.
pub const GLX_BUFFER_SWAP_COMPLETE_INTEL_MASK: u64 = 0x0400_0000;
/// Offset of `GLX_BufferSwapComplete` from the GLX event base.
pub const GLX_BUFFER_SWAP_COMPLETE: i32 = 1;

/// `GL_FRONT`.
pub const GL_FRONT: u32 = 0x0404;
/// `GL_BACK`.
pub const GL_BACK: u32 = 0x0405;
/// `GL_COLOR_BUFFER_BIT`.
pub const GL_COLOR_BUFFER_BIT: u32 = 0x4000;
/// `GL_NEAREST`.
pub const GL_NEAREST: u32 = 0x2600;

// ---------------------------------------------------------------------------
// Glx trait
// ---------------------------------------------------------------------------

/// GLX and GL operations used by the backend.
pub trait Glx {
    /// `glXQueryExtension`: `(error_base, event_base)` if GLX is present.
    fn query_extension(&mut self) -> Option<(i32, i32)>;

    /// `glXQueryVersion`.
    fn query_version(&mut self) -> Option<(i32, i32)>;

    /// `glXQueryExtensionsString` for the default screen.
    fn extensions_string(&mut self) -> String;

    /// Whether the GL side provides `glBlitFramebuffer`.
    fn has_blit_framebuffer(&self) -> bool;

    /// `glXChooseFBConfig` with a `GLX_NONE`-terminated attribute list.
    fn choose_fb_config(&mut self, attributes: &[i32]) -> Vec<FbConfig>;

    /// `glXGetVisualFromFBConfig`.
    fn visual_from_fb_config(&mut self, config: FbConfig) -> Option<VisualInfo>;

    /// `glXGetFBConfigAttrib`.
    fn fb_config_attrib(&mut self, config: FbConfig, attribute: i32) -> Option<i32>;

    /// `glXCreateNewContext`.
    fn create_new_context(
        &mut self,
        config: FbConfig,
        render_type: i32,
        direct: bool,
    ) -> Option<GlxContext>;

    /// `glXCreateContextAttribsARB`.
    fn create_context_attribs(
        &mut self,
        config: FbConfig,
        direct: bool,
        attributes: &[i32],
    ) -> Option<GlxContext>;

    /// `glXIsDirect`.
    fn is_direct(&mut self, context: GlxContext) -> bool;

    /// `glXDestroyContext`.
    fn destroy_context(&mut self, context: GlxContext);

    /// `glXCreateWindow`.
    fn create_window(&mut self, config: FbConfig, window: Window) -> GlxDrawable;

    /// `glXDestroyWindow`.
    fn destroy_window(&mut self, drawable: GlxDrawable);

    /// `glXMakeContextCurrent` with the same draw and read drawable.
    fn make_context_current(&mut self, drawable: GlxDrawable, context: Option<GlxContext>);

    /// `glXSwapBuffers`.
    fn swap_buffers(&mut self, drawable: GlxDrawable);

    /// `glXSelectEvent`.
    fn select_event(&mut self, drawable: GlxDrawable, mask: u64);

    /// `glXQueryDrawable`.
    fn query_drawable(&mut self, drawable: GlxDrawable, attribute: i32) -> u32;

    /// `glXSwapIntervalSGI`.
    fn swap_interval(&mut self, interval: i32);

    /// `glXGetVideoSyncSGI`.
    fn get_video_sync(&mut self) -> Option<u32>;

    /// `glXWaitVideoSyncSGI`.
    fn wait_video_sync(&mut self, divisor: i32, remainder: i32) -> Option<u32>;

    /// `glXGetSyncValuesOML`.
    fn get_sync_values(&mut self, drawable: GlxDrawable) -> Option<SyncValues>;

    /// `glXWaitForMscOML`.
    fn wait_for_msc(
        &mut self,
        drawable: GlxDrawable,
        target_msc: i64,
        divisor: i64,
        remainder: i64,
    ) -> Option<SyncValues>;

    /// `glXCopySubBufferMESA`.
    fn copy_sub_buffer(&mut self, drawable: GlxDrawable, x: i32, y: i32, width: i32, height: i32);

    /// `glFinish`.
    fn finish(&mut self);

    /// `glFlush`.
    fn flush(&mut self);

    /// Disables the scissor test so full-buffer blits are not clipped.
    fn disable_scissor(&mut self);

    /// `glDrawBuffer`.
    fn draw_buffer(&mut self, mode: u32);

    /// `glBlitFramebuffer` with identical source and destination rectangles.
    fn blit_framebuffer(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, mask: u32, filter: u32);
}

/// A [`Glx`] that can be loaded for an already open display.
pub trait GlxLoader<X: Xlib>: Glx + Sized {
    /// Loads GLX for `display`; `None` when the GL library is unavailable.
    fn load(display: &X) -> Option<Self>;
}
