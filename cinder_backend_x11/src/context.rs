// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GL context lifecycle and binding.
//!
//! The context is created together with a 1x1 override-redirect window off
//! screen. Whenever no surface is bound, that fallback drawable is, so the
//! context is always current on something and GL calls stay valid between
//! surfaces.

use cinder_core::backend::{FramebufferConfig, SurfaceId, WinsysError};

use crate::glx::{
    FbConfig, GLX_ALPHA_SIZE, GLX_BLUE_SIZE, GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
    GLX_CONTEXT_FLAGS_ARB, GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB, GLX_CONTEXT_MAJOR_VERSION_ARB,
    GLX_CONTEXT_MINOR_VERSION_ARB, GLX_CONTEXT_PROFILE_MASK_ARB, GLX_DEPTH_SIZE,
    GLX_DONT_CARE, GLX_DOUBLEBUFFER, GLX_DRAWABLE_TYPE, GLX_GREEN_SIZE, GLX_NONE,
    GLX_RED_SIZE, GLX_RENDER_TYPE, GLX_RGBA_BIT, GLX_RGBA_TYPE, GLX_SAMPLE_BUFFERS,
    GLX_SAMPLES, GLX_STENCIL_SIZE, GLX_WINDOW_BIT, Glx, GlxContext,
};
use crate::winsys::{ContextState, Onscreen, WinsysState};
use crate::xlib::{EventMask, WindowDesc, Xlib};

const CORE_PROFILE_ATTRIBUTES: [i32; 9] = [
    GLX_CONTEXT_MAJOR_VERSION_ARB,
    3,
    GLX_CONTEXT_MINOR_VERSION_ARB,
    1,
    GLX_CONTEXT_PROFILE_MASK_ARB,
    GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
    GLX_CONTEXT_FLAGS_ARB,
    GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB,
    GLX_NONE,
];

/// Builds the `glXChooseFBConfig` attribute list for a request.
///
/// Multisampling is only requested from GLX 1.4 on.
pub(crate) fn fbconfig_attributes(config: &FramebufferConfig, glx_version: (i32, i32)) -> Vec<i32> {
    let mut attributes = vec![
        GLX_DRAWABLE_TYPE,
        GLX_WINDOW_BIT,
        GLX_RENDER_TYPE,
        GLX_RGBA_BIT,
        GLX_DOUBLEBUFFER,
        1,
        GLX_RED_SIZE,
        1,
        GLX_GREEN_SIZE,
        1,
        GLX_BLUE_SIZE,
        1,
        GLX_ALPHA_SIZE,
        if config.has_alpha { 1 } else { GLX_DONT_CARE },
        GLX_DEPTH_SIZE,
        1,
        GLX_STENCIL_SIZE,
        if config.need_stencil { 1 } else { GLX_DONT_CARE },
    ];
    if glx_version >= (1, 4) && config.samples_per_pixel > 0 {
        attributes.extend([
            GLX_SAMPLE_BUFFERS,
            1,
            GLX_SAMPLES,
            i32::try_from(config.samples_per_pixel).unwrap_or(i32::MAX),
        ]);
    }
    attributes.push(GLX_NONE);
    attributes
}

impl<X: Xlib, G: Glx> WinsysState<X, G> {
    /// Picks a framebuffer config for `config`.
    pub(crate) fn find_fbconfig(&mut self, config: &FramebufferConfig) -> Result<FbConfig, WinsysError> {
        let attributes = fbconfig_attributes(config, self.glx_version);
        let configs = self.glx.choose_fb_config(&attributes);
        let Some(&first) = configs.first() else {
            return Err(WinsysError::NoCompatibleConfig);
        };
        if !config.has_alpha {
            return Ok(first);
        }
        configs
            .into_iter()
            .find(|&candidate| {
                self.glx
                    .visual_from_fb_config(candidate)
                    .is_some_and(|visual| visual.has_alpha_channel())
            })
            .ok_or(WinsysError::NoRgbaVisual)
    }

    fn create_gl_context(&mut self, fbconfig: FbConfig) -> Result<GlxContext, WinsysError> {
        let modern = if self.extensions.create_context {
            self.glx
                .create_context_attribs(fbconfig, true, &CORE_PROFILE_ATTRIBUTES)
        } else {
            None
        };
        modern
            .or_else(|| self.glx.create_new_context(fbconfig, GLX_RGBA_TYPE, true))
            .ok_or(WinsysError::CreateContext)
    }

    /// Creates the context and makes it current on the fallback drawable.
    pub(crate) fn create_context(&mut self, config: &FramebufferConfig) -> Result<(), WinsysError> {
        let fbconfig = self.find_fbconfig(config)?;
        let context = self.create_gl_context(fbconfig)?;

        if !self.glx.is_direct(context) {
            self.extensions.restrict_to_indirect();
        }

        let Some(visual) = self.glx.visual_from_fb_config(fbconfig) else {
            self.glx.destroy_context(context);
            return Err(WinsysError::NoVisual);
        };

        let root = self.conn.root();
        let token = self.conn.trap();
        let dummy_xwin = self.conn.native().create_window(
            root,
            &WindowDesc {
                x: -100,
                y: -100,
                width: 1,
                height: 1,
                visual,
                override_redirect: true,
                event_mask: EventMask::default(),
            },
        );
        let dummy_glxwin =
            (self.glx_version >= (1, 3)).then(|| self.glx.create_window(fbconfig, dummy_xwin));
        let dummy = dummy_glxwin.unwrap_or(dummy_xwin);
        self.glx.make_context_current(dummy, Some(context));
        self.conn.native().sync();
        let code = self.conn.untrap(token);

        if code != 0 {
            log::warn!("X error {code} while binding the new context");
            let token = self.conn.trap();
            self.glx.make_context_current(0, None);
            if let Some(glxwin) = dummy_glxwin {
                self.glx.destroy_window(glxwin);
            }
            if dummy_xwin != 0 {
                self.conn.native().destroy_window(dummy_xwin);
            }
            self.glx.destroy_context(context);
            self.conn.native().sync();
            _ = self.conn.untrap(token);
            return Err(WinsysError::BindContext);
        }

        self.context = Some(ContextState {
            context,
            fbconfig,
            dummy_xwin,
            dummy_glxwin,
            current_drawable: dummy,
        });
        self.features = self
            .extensions
            .context_features(self.glx.has_blit_framebuffer(), self.conn.frame_drawn_supported());
        Ok(())
    }

    /// Destroys every remaining surface, then the context.
    pub(crate) fn destroy_context(&mut self) {
        if self.context.is_none() {
            return;
        }
        let remaining: Vec<SurfaceId> = self.surfaces.keys().copied().collect();
        for id in remaining {
            log::warn!("destroying surface {id:?} together with its context");
            _ = self.destroy_onscreen(id);
        }
        let Some(context) = self.context.take() else {
            return;
        };
        self.glx.make_context_current(0, None);
        self.glx.destroy_context(context.context);
        if let Some(glxwin) = context.dummy_glxwin {
            self.glx.destroy_window(glxwin);
        }
        self.conn.native().destroy_window(context.dummy_xwin);
        self.features = self.extensions.base_features();
    }

    /// Makes the context current on `surface`.
    ///
    /// An X error is logged and leaves the previous binding recorded; the
    /// next bind retries.
    pub(crate) fn bind_onscreen(&mut self, surface: &Onscreen) -> Result<(), WinsysError> {
        let drawable = surface.drawable();
        let interval = i32::from(surface.throttled && !self.conn.frame_drawn_supported());
        let context = self.context.as_mut().ok_or(WinsysError::NoContext)?;
        if context.current_drawable == drawable {
            return Ok(());
        }

        let token = self.conn.trap();
        self.glx.make_context_current(drawable, Some(context.context));
        if self.extensions.swap_control {
            self.glx.swap_interval(interval);
        }
        self.conn.native().sync();
        if self.conn.untrap(token) != 0 {
            log::warn!("X Error received while making drawable 0x{drawable:08X} current");
            return Ok(());
        }
        context.current_drawable = drawable;
        Ok(())
    }

    pub(crate) fn bind(&mut self, id: SurfaceId) -> Result<(), WinsysError> {
        self.with_surface(id, |state, surface| state.bind_onscreen(surface))?
    }
}
