// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RandR topology scan.
//!
//! Turns the CRTC/output pairs reported by RandR into [`Output`] candidates
//! for [`OutputRegistry::reconcile`](cinder_core::output::OutputRegistry::reconcile).
//! Only the first output of each active CRTC is considered; clones share
//! the CRTC geometry anyway.

use cinder_core::output::{Output, Rotation, SubpixelOrder};

use crate::xlib::{CrtcInfo, ModeInfo, OutputInfo, ScreenResources, Window, Xlib};

/// Queries every active CRTC.
///
/// Returns `None` if any query failed; a partial scan must not be applied.
pub fn scan<X: Xlib>(native: &mut X, root: Window) -> Option<Vec<Output>> {
    let resources = native.randr_screen_resources(root)?;
    let mut outputs = Vec::with_capacity(resources.crtcs.len());
    for &crtc in &resources.crtcs {
        let info = native.randr_crtc_info(&resources, crtc)?;
        let Some(mode) = info.mode else {
            continue;
        };
        let Some(&first) = info.outputs.first() else {
            continue;
        };
        let output_info = native.randr_output_info(&resources, first)?;
        outputs.push(output_from_crtc(
            &info,
            &output_info,
            mode_refresh_rate(&resources, mode),
        ));
    }
    Some(outputs)
}

fn mode_refresh_rate(resources: &ScreenResources, mode: u64) -> f32 {
    resources
        .modes
        .iter()
        .find(|m| m.id == mode)
        .map_or(0.0, refresh_rate)
}

/// Refresh rate of a mode line in Hz, 0 if its totals are zero.
#[must_use]
pub fn refresh_rate(mode: &ModeInfo) -> f32 {
    let total = mode.h_total as f32 * mode.v_total as f32;
    if total == 0.0 {
        return 0.0;
    }
    mode.dot_clock as f32 / total
}

/// Converts a raw X `SubPixel*` value.
#[must_use]
pub fn subpixel_from_x(raw: u16) -> SubpixelOrder {
    match raw {
        1 => SubpixelOrder::HorizontalRgb,
        2 => SubpixelOrder::HorizontalBgr,
        3 => SubpixelOrder::VerticalRgb,
        4 => SubpixelOrder::VerticalBgr,
        5 => SubpixelOrder::None,
        _ => SubpixelOrder::Unknown,
    }
}

fn output_from_crtc(crtc: &CrtcInfo, info: &OutputInfo, refresh: f32) -> Output {
    let rotation = Rotation(crtc.rotation);
    let (mm_width, mm_height) = if rotation.swaps_axes() {
        (info.mm_height, info.mm_width)
    } else {
        (info.mm_width, info.mm_height)
    };
    Output::new(
        info.name.clone(),
        crtc.x,
        crtc.y,
        i32::try_from(crtc.width).unwrap_or(i32::MAX),
        i32::try_from(crtc.height).unwrap_or(i32::MAX),
    )
    .with_physical_size(mm_width, mm_height)
    .with_subpixel_order(subpixel_from_x(info.subpixel_order).transformed(rotation))
    .with_refresh_rate(refresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCrtc, FakeServer};

    #[test]
    fn refresh_rate_from_mode_line() {
        let mode = ModeInfo {
            id: 1,
            dot_clock: 148_500_000,
            h_total: 2200,
            v_total: 1125,
        };
        assert!((refresh_rate(&mode) - 60.0).abs() < 0.01);
        let degenerate = ModeInfo { h_total: 0, ..mode };
        assert!(refresh_rate(&degenerate).abs() < f32::EPSILON);
    }

    #[test]
    fn scan_skips_disabled_crtcs() {
        let (mut display, server) = FakeServer::new().split();
        {
            let mut s = server.borrow_mut();
            s.add_crtc(FakeCrtc::new("DP-1", 0, 0, 1920, 1080, 60.0));
            s.add_crtc(FakeCrtc::new("DP-2", 1920, 0, 1920, 1080, 60.0).disabled());
        }
        let root = display.default_root_window();
        let outputs = scan(&mut display, root).unwrap_or_default();
        let names: Vec<&str> = outputs.iter().map(Output::name).collect();
        assert_eq!(names, ["DP-1"]);
    }

    #[test]
    fn rotated_crtc_swaps_physical_size_and_subpixels() {
        let (mut display, server) = FakeServer::new().split();
        server.borrow_mut().add_crtc(
            FakeCrtc::new("eDP-1", 0, 0, 1080, 1920, 60.0)
                .with_physical_size(344, 194)
                .with_subpixel(1)
                .with_rotation(Rotation::ROTATE_90.0),
        );
        let root = display.default_root_window();
        let outputs = scan(&mut display, root).unwrap_or_default();
        let output = &outputs[0];
        assert_eq!((output.mm_width(), output.mm_height()), (194, 344));
        assert_eq!(output.subpixel_order(), SubpixelOrder::VerticalRgb);
    }

    #[test]
    fn failed_crtc_query_fails_the_scan() {
        let (mut display, server) = FakeServer::new().split();
        {
            let mut s = server.borrow_mut();
            s.add_crtc(FakeCrtc::new("DP-1", 0, 0, 1920, 1080, 60.0));
            s.fail_crtc_info = true;
        }
        let root = display.default_root_window();
        assert!(scan(&mut display, root).is_none());
    }

    #[test]
    fn raw_subpixel_values_follow_x_numbering() {
        assert_eq!(subpixel_from_x(0), SubpixelOrder::Unknown);
        assert_eq!(subpixel_from_x(2), SubpixelOrder::HorizontalBgr);
        assert_eq!(subpixel_from_x(5), SubpixelOrder::None);
        assert_eq!(subpixel_from_x(99), SubpixelOrder::Unknown);
    }
}
