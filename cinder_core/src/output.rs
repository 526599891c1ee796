// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display outputs and the registry that tracks them.
//!
//! An [`Output`] describes one monitor as reported by the window system:
//! position, pixel size, physical size, subpixel layout and refresh rate.
//! Outputs are immutable once published. A change in any value replaces the
//! whole record, so consumers holding an [`Rc<Output>`] always see a
//! consistent snapshot.
//!
//! [`OutputRegistry`] keeps the live list sorted by name. Each topology scan
//! produces a candidate list which is merged with the live list in one
//! lockstep pass:
//!
//! ```text
//!   live:       DP-1   DP-2          HDMI-1
//!   candidates: DP-1          eDP-1  HDMI-1
//!               ────   ────   ─────  ──────
//!               keep   remove insert update (if values differ)
//! ```
//!
//! Unchanged outputs keep their `Rc` identity, so surfaces bound to them
//! are not needlessly notified.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

/// Subpixel layout of an output.
///
/// The discriminants are the row/column indices of the rotation table and
/// are stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SubpixelOrder {
    /// Layout not reported.
    #[default]
    Unknown = 0,
    /// No subpixel structure (e.g. a projector).
    None = 1,
    /// Horizontal stripes, red on the left.
    HorizontalRgb = 2,
    /// Horizontal stripes, blue on the left.
    HorizontalBgr = 3,
    /// Vertical stripes, red on top.
    VerticalRgb = 4,
    /// Vertical stripes, blue on top.
    VerticalBgr = 5,
}

impl SubpixelOrder {
    const ALL: [Self; 6] = [
        Self::Unknown,
        Self::None,
        Self::HorizontalRgb,
        Self::HorizontalBgr,
        Self::VerticalRgb,
        Self::VerticalBgr,
    ];

    /// Maps this layout through every rotation and reflection bit set in
    /// `rotation`, lowest bit first.
    #[must_use]
    pub fn transformed(self, rotation: Rotation) -> Self {
        let mut order = self;
        for (bit, row) in SUBPIXEL_MAP.iter().enumerate() {
            if rotation.0 & (1 << bit) != 0 {
                order = row[order as usize];
            }
        }
        order
    }

    fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::None => "none",
            Self::HorizontalRgb => "horizontal_rgb",
            Self::HorizontalBgr => "horizontal_bgr",
            Self::VerticalRgb => "vertical_rgb",
            Self::VerticalBgr => "vertical_bgr",
        }
    }
}

/// Controller rotation and reflection bits, in RandR bit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rotation(pub u16);

impl Rotation {
    /// No rotation.
    pub const ROTATE_0: Self = Self(1 << 0);
    /// Rotated a quarter turn.
    pub const ROTATE_90: Self = Self(1 << 1);
    /// Upside down.
    pub const ROTATE_180: Self = Self(1 << 2);
    /// Rotated three quarter turns.
    pub const ROTATE_270: Self = Self(1 << 3);
    /// Mirrored along the x axis.
    pub const REFLECT_X: Self = Self(1 << 4);
    /// Mirrored along the y axis.
    pub const REFLECT_Y: Self = Self(1 << 5);

    /// Returns `true` if width and height are exchanged by this rotation.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        self.0 & (Self::ROTATE_90.0 | Self::ROTATE_270.0) != 0
    }

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for Rotation {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

use SubpixelOrder::{
    HorizontalBgr as HB, HorizontalRgb as HR, None as NO, Unknown as UN, VerticalBgr as VB,
    VerticalRgb as VR,
};

/// One row per rotation bit, indexed by the incoming [`SubpixelOrder`].
const SUBPIXEL_MAP: [[SubpixelOrder; 6]; 6] = [
    // ROTATE_0
    [UN, NO, HR, HB, VR, VB],
    // ROTATE_90
    [UN, NO, VR, VB, HB, HR],
    // ROTATE_180
    [UN, NO, HB, HR, VB, VR],
    // ROTATE_270
    [UN, NO, VB, VR, HR, HB],
    // REFLECT_X
    [UN, NO, HB, HR, VR, VB],
    // REFLECT_Y
    [UN, NO, HR, HB, VB, VR],
];

/// A display output as last reported by the window system.
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    name: String,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    mm_width: i32,
    mm_height: i32,
    subpixel_order: SubpixelOrder,
    refresh_rate: f32,
}

impl Output {
    /// Creates an output with the given name and screen rectangle.
    ///
    /// Physical size, subpixel order and refresh rate start out unknown.
    #[must_use]
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            mm_width: 0,
            mm_height: 0,
            subpixel_order: SubpixelOrder::Unknown,
            refresh_rate: 0.0,
        }
    }

    /// Sets the physical size in millimeters.
    #[must_use]
    pub fn with_physical_size(mut self, mm_width: i32, mm_height: i32) -> Self {
        self.mm_width = mm_width;
        self.mm_height = mm_height;
        self
    }

    /// Sets the subpixel layout.
    #[must_use]
    pub fn with_subpixel_order(mut self, order: SubpixelOrder) -> Self {
        self.subpixel_order = order;
        self
    }

    /// Sets the refresh rate in Hz.
    #[must_use]
    pub fn with_refresh_rate(mut self, hz: f32) -> Self {
        self.refresh_rate = hz;
        self
    }

    /// Stable name, used as the reconciliation key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Left edge in screen coordinates.
    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Top edge in screen coordinates.
    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Physical width in millimeters, 0 if unknown.
    #[must_use]
    pub fn mm_width(&self) -> i32 {
        self.mm_width
    }

    /// Physical height in millimeters, 0 if unknown.
    #[must_use]
    pub fn mm_height(&self) -> i32 {
        self.mm_height
    }

    /// Subpixel layout after rotation.
    #[must_use]
    pub fn subpixel_order(&self) -> SubpixelOrder {
        self.subpixel_order
    }

    /// Refresh rate in Hz, 0 if unknown.
    #[must_use]
    pub fn refresh_rate(&self) -> f32 {
        self.refresh_rate
    }

    /// Area of the intersection with the given rectangle, or `None` if they
    /// do not overlap.
    #[must_use]
    pub fn overlap_area(&self, x: i32, y: i32, width: i32, height: i32) -> Option<i64> {
        let overlap_x = i64::from(self.x.saturating_add(self.width).min(x.saturating_add(width)))
            - i64::from(self.x.max(x));
        let overlap_y = i64::from(
            self.y
                .saturating_add(self.height)
                .min(y.saturating_add(height)),
        ) - i64::from(self.y.max(y));
        (overlap_x > 0 && overlap_y > 0).then_some(overlap_x * overlap_y)
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}x{}+{}+{} ({}x{} mm)",
            self.name, self.width, self.height, self.x, self.y, self.mm_width, self.mm_height
        )?;
        if self.mm_width > 0 {
            let dpi = f64::from(self.width) / (f64::from(self.mm_width) / 25.4);
            write!(f, " {dpi:.1} dpi")?;
        }
        write!(
            f,
            " subpixel={} refresh={:.2}Hz",
            self.subpixel_order.name(),
            self.refresh_rate
        )
    }
}

/// One mutation applied by [`OutputRegistry::reconcile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputChange {
    /// An output kept its name but reported different values.
    Updated(String),
    /// A new output appeared.
    Inserted(String),
    /// An output is no longer reported.
    Removed(String),
}

/// Sorted list of live outputs.
#[derive(Clone, Debug, Default)]
pub struct OutputRegistry {
    outputs: Vec<Rc<Output>>,
}

impl OutputRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live outputs, sorted by name.
    #[must_use]
    pub fn outputs(&self) -> &[Rc<Output>] {
        &self.outputs
    }

    /// Looks up an output by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<Output>> {
        self.outputs
            .binary_search_by(|o| o.name().cmp(name))
            .ok()
            .map(|index| &self.outputs[index])
    }

    /// Replaces the live list with `candidates`.
    ///
    /// Candidates are sorted by name and de-duplicated (the first entry for
    /// a name wins). The returned list describes every mutation in name
    /// order; it is empty when nothing changed.
    pub fn reconcile(&mut self, mut candidates: Vec<Output>) -> Vec<OutputChange> {
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        candidates.dedup_by(|later, earlier| later.name == earlier.name);

        let mut changes = Vec::new();
        let mut merged = Vec::with_capacity(candidates.len());
        let mut old = core::mem::take(&mut self.outputs).into_iter().peekable();
        let mut new = candidates.into_iter().peekable();

        loop {
            let ordering = match (old.peek(), new.peek()) {
                (Some(o), Some(n)) => o.name.cmp(&n.name),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            match ordering {
                Ordering::Equal => {
                    let (Some(current), Some(candidate)) = (old.next(), new.next()) else {
                        break;
                    };
                    if *current == candidate {
                        merged.push(current);
                    } else {
                        changes.push(OutputChange::Updated(candidate.name.clone()));
                        merged.push(Rc::new(candidate));
                    }
                }
                Ordering::Less => {
                    if let Some(current) = old.next() {
                        changes.push(OutputChange::Removed(current.name.clone()));
                    }
                }
                Ordering::Greater => {
                    if let Some(candidate) = new.next() {
                        changes.push(OutputChange::Inserted(candidate.name.clone()));
                        merged.push(Rc::new(candidate));
                    }
                }
            }
        }

        self.outputs = merged;
        changes
    }

    /// Returns the output with the largest overlap with the given rectangle.
    ///
    /// Ties go to the output that sorts first by name.
    #[must_use]
    pub fn output_for_rectangle(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Option<&Rc<Output>> {
        let mut best: Option<(&Rc<Output>, i64)> = None;
        for output in &self.outputs {
            if let Some(area) = output.overlap_area(x, y, width, height)
                && best.is_none_or(|(_, best_area)| area > best_area)
            {
                best = Some((output, area));
            }
        }
        best.map(|(output, _)| output)
    }

    /// Drops every output.
    pub fn clear(&mut self) {
        self.outputs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn names(registry: &OutputRegistry) -> Vec<&str> {
        registry.outputs().iter().map(|o| o.name()).collect()
    }

    fn dual_head() -> Vec<Output> {
        vec![
            Output::new("HDMI-1", 1920, 0, 1920, 1080).with_refresh_rate(59.94),
            Output::new("DP-1", 0, 0, 1920, 1080).with_refresh_rate(60.0),
        ]
    }

    #[test]
    fn reconcile_sorts_and_reports_inserts() {
        let mut registry = OutputRegistry::new();
        let changes = registry.reconcile(dual_head());
        assert_eq!(names(&registry), ["DP-1", "HDMI-1"]);
        assert_eq!(
            changes,
            [
                OutputChange::Inserted("DP-1".into()),
                OutputChange::Inserted("HDMI-1".into()),
            ]
        );
    }

    #[test]
    fn reconcile_matches_set_difference() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(vec![
            Output::new("A", 0, 0, 10, 10),
            Output::new("B", 10, 0, 10, 10),
            Output::new("D", 20, 0, 10, 10),
        ]);
        let changes = registry.reconcile(vec![
            Output::new("E", 40, 0, 10, 10),
            Output::new("B", 10, 0, 20, 10),
            Output::new("C", 30, 0, 10, 10),
            Output::new("D", 20, 0, 10, 10),
        ]);
        assert_eq!(
            changes,
            [
                OutputChange::Removed("A".into()),
                OutputChange::Updated("B".into()),
                OutputChange::Inserted("C".into()),
                OutputChange::Inserted("E".into()),
            ]
        );
        assert_eq!(names(&registry), ["B", "C", "D", "E"]);
        assert_eq!(
            registry.get("B").map(|o| o.width()),
            Some(20),
            "updated output should carry the new values"
        );
    }

    #[test]
    fn unchanged_scan_is_a_no_op() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(dual_head());
        let before: Vec<Rc<Output>> = registry.outputs().to_vec();

        let changes = registry.reconcile(dual_head());
        assert!(changes.is_empty(), "identical scan should report no change");
        for (old, new) in before.iter().zip(registry.outputs()) {
            assert!(Rc::ptr_eq(old, new), "unchanged outputs keep identity");
        }
    }

    #[test]
    fn duplicate_candidates_are_collapsed() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(vec![
            Output::new("DP-1", 0, 0, 100, 100),
            Output::new("DP-1", 0, 0, 200, 200),
        ]);
        assert_eq!(names(&registry), ["DP-1"]);
    }

    #[test]
    fn empty_scan_removes_everything() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(dual_head());
        let changes = registry.reconcile(Vec::new());
        assert_eq!(changes.len(), 2, "both outputs should be removed");
        assert!(registry.outputs().is_empty());
    }

    #[test]
    fn rectangle_straddling_two_outputs_picks_larger_overlap() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(dual_head());
        let output = registry.output_for_rectangle(1900, 0, 100, 100);
        assert_eq!(output.map(|o| o.name()), Some("HDMI-1"));
    }

    #[test]
    fn rectangle_outside_every_output_has_no_match() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(dual_head());
        assert!(registry.output_for_rectangle(5000, 5000, 10, 10).is_none());
        assert!(
            registry.output_for_rectangle(1920, 0, 0, 100).is_none(),
            "zero width overlaps nothing"
        );
    }

    #[test]
    fn equal_overlap_goes_to_first_by_name() {
        let mut registry = OutputRegistry::new();
        let _ = registry.reconcile(dual_head());
        let output = registry.output_for_rectangle(1870, 0, 100, 100);
        assert_eq!(output.map(|o| o.name()), Some("DP-1"));
    }

    #[test]
    fn subpixel_table_is_total() {
        let flags = [
            Rotation::ROTATE_0,
            Rotation::ROTATE_90,
            Rotation::ROTATE_180,
            Rotation::ROTATE_270,
            Rotation::REFLECT_X,
            Rotation::REFLECT_Y,
        ];
        for order in SubpixelOrder::ALL {
            for flag in flags {
                let mapped = order.transformed(flag);
                assert!(
                    SubpixelOrder::ALL.contains(&mapped),
                    "{order:?} through {flag:?} should be defined"
                );
            }
        }
    }

    #[test]
    fn four_quarter_turns_return_to_start() {
        for order in SubpixelOrder::ALL {
            let mut current = order;
            for _ in 0..4 {
                current = current.transformed(Rotation::ROTATE_90);
            }
            assert_eq!(current, order, "four quarter turns should be identity");
        }
    }

    #[test]
    fn quarter_turn_makes_horizontal_stripes_vertical() {
        assert_eq!(
            SubpixelOrder::HorizontalRgb.transformed(Rotation::ROTATE_90),
            SubpixelOrder::VerticalRgb
        );
        assert_eq!(
            SubpixelOrder::HorizontalRgb.transformed(Rotation::ROTATE_0),
            SubpixelOrder::HorizontalRgb
        );
        assert_eq!(
            SubpixelOrder::HorizontalRgb.transformed(Rotation::ROTATE_180 | Rotation::REFLECT_X),
            SubpixelOrder::HorizontalRgb,
            "half turn plus mirror cancels out for horizontal stripes"
        );
    }

    #[test]
    fn rotation_axis_swap() {
        assert!(Rotation::ROTATE_90.swaps_axes());
        assert!(Rotation::ROTATE_270.swaps_axes());
        assert!(!(Rotation::ROTATE_180 | Rotation::REFLECT_Y).swaps_axes());
    }

    #[test]
    fn display_includes_dpi_when_physical_size_known() {
        let output = Output::new("DP-1", 0, 0, 1920, 1080).with_physical_size(508, 286);
        let text = alloc::format!("{output}");
        assert!(text.contains("96.0 dpi"), "unexpected display: {text}");
    }
}
