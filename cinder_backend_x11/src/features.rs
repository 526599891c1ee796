// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GLX extension negotiation.
//!
//! The GLX extension string is parsed once at connect time into
//! [`GlxExtensions`]. Public [`WinsysFeatures`] are derived from it in two
//! steps: a base set right after connecting, then the full set once a
//! context exists (directness, blit support and the compositor query are
//! only known by then).
//!
//! | Extension                 | Enables                                   |
//! |---------------------------|-------------------------------------------|
//! | `GLX_SGI_video_sync`      | vblank counter, vblank wait (direct only) |
//! | `GLX_SGI_swap_control`    | swap throttle via swap interval           |
//! | `GLX_OML_sync_control`    | vblank wait, UST timestamps               |
//! | `GLX_MESA_copy_sub_buffer`| swap region                               |
//! | `GLX_INTEL_swap_event`    | sync-and-complete events                  |
//! | `GLX_ARB_create_context`  | core-profile context creation             |
//! | `GLX_EXT_buffer_age`      | buffer age                                |

use cinder_core::backend::WinsysFeatures;

/// GLX extensions the backend knows how to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlxExtensions {
    /// `GLX_SGI_video_sync`.
    pub video_sync: bool,
    /// `GLX_SGI_swap_control`.
    pub swap_control: bool,
    /// `GLX_OML_sync_control`.
    pub oml_sync_control: bool,
    /// `GLX_MESA_copy_sub_buffer`.
    pub copy_sub_buffer: bool,
    /// `GLX_INTEL_swap_event`.
    pub swap_event: bool,
    /// `GLX_ARB_create_context`.
    pub create_context: bool,
    /// `GLX_EXT_buffer_age`.
    pub buffer_age: bool,
}

impl GlxExtensions {
    /// Parses a space-separated extension string.
    #[must_use]
    pub fn parse(extensions: &str) -> Self {
        let mut found = Self::default();
        for name in extensions.split_whitespace() {
            match name {
                "GLX_SGI_video_sync" => found.video_sync = true,
                "GLX_SGI_swap_control" => found.swap_control = true,
                "GLX_OML_sync_control" => found.oml_sync_control = true,
                "GLX_MESA_copy_sub_buffer" => found.copy_sub_buffer = true,
                "GLX_INTEL_swap_event" => found.swap_event = true,
                "GLX_ARB_create_context" => found.create_context = true,
                "GLX_EXT_buffer_age" => found.buffer_age = true,
                _ => {}
            }
        }
        found
    }

    /// Drops extensions documented to work only with direct contexts.
    pub fn restrict_to_indirect(&mut self) {
        self.video_sync = false;
    }

    /// Whether some primitive can block until the next vblank.
    #[must_use]
    pub fn can_wait_for_vblank(&self) -> bool {
        self.video_sync || self.oml_sync_control
    }

    /// Features available before a context exists.
    #[must_use]
    pub fn base_features(&self) -> WinsysFeatures {
        WinsysFeatures {
            multiple_onscreen: true,
            swap_throttle: self.swap_control,
            vblank_counter: self.video_sync,
            vblank_wait: self.can_wait_for_vblank(),
            buffer_age: self.buffer_age,
            sync_and_complete_event: self.swap_event,
            ..WinsysFeatures::default()
        }
    }

    /// Features once a context exists.
    ///
    /// `has_blit` reports `glBlitFramebuffer`, `frame_drawn_supported` the
    /// compositor's `_NET_WM_FRAME_DRAWN` support.
    #[must_use]
    pub fn context_features(&self, has_blit: bool, frame_drawn_supported: bool) -> WinsysFeatures {
        let mut features = self.base_features();
        features.swap_region = self.copy_sub_buffer || has_blit;
        features.swap_region_throttle = features.swap_region && features.vblank_wait;
        if frame_drawn_supported {
            features.sync_and_complete_event = true;
        }
        features.presentation_time = features.sync_and_complete_event;
        features
    }
}
