// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock-domain detection for driver and compositor timestamps.
//!
//! Drivers report swap timestamps as an "unadjusted system time" (UST) whose
//! unit and epoch are not specified. On most systems it is the monotonic
//! clock in either nanoseconds or microseconds, but that has to be checked
//! before the value can be used as a presentation time.
//!
//! [`PresentationClock`] classifies the first timestamp it sees by comparing
//! it against "now":
//!
//! ```text
//!   now - 1s  <  ust        <  now      ──► nanoseconds, scale 1
//!   now - 1s  <  ust * 1000 <  now      ──► microseconds, scale 1000
//!   otherwise                           ──► unknown domain, never trusted
//! ```
//!
//! The result is cached for the life of the connection.

use crate::time::{Duration, HostTime};

const NANOS_PER_MICRO: u64 = 1_000;

/// Cached classification of a driver timestamp domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentationClock {
    seen: bool,
    monotonic: bool,
    ust_scale: u64,
}

impl PresentationClock {
    /// Creates an unclassified clock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seen: false,
            monotonic: false,
            ust_scale: 0,
        }
    }

    /// Returns `true` once a timestamp has been classified.
    #[must_use]
    pub const fn is_seen(&self) -> bool {
        self.seen
    }

    /// Returns `true` if timestamps share the monotonic clock domain.
    #[must_use]
    pub const fn is_monotonic(&self) -> bool {
        self.monotonic
    }

    /// Multiplier converting a UST value to nanoseconds, 0 if unknown.
    #[must_use]
    pub const fn ust_scale(&self) -> u64 {
        self.ust_scale
    }

    /// Classifies `ust` against `now` if no timestamp has been classified yet.
    ///
    /// Returns whether timestamps are trusted.
    pub fn observe_ust(&mut self, ust: u64, now: HostTime) -> bool {
        if self.seen {
            return self.monotonic;
        }
        self.seen = true;

        let now_ns = now.nanos();
        let now_us = now_ns / NANOS_PER_MICRO;
        if ust < now_ns && ust > now_ns.saturating_sub(Duration::SECOND.nanos()) {
            self.ust_scale = 1;
            self.monotonic = true;
        } else if ust < now_us && ust > now_us.saturating_sub(1_000_000) {
            self.ust_scale = NANOS_PER_MICRO;
            self.monotonic = true;
        }
        self.monotonic
    }

    /// Classifies a compositor-reported presentation time, already in
    /// nanoseconds, if no timestamp has been classified yet.
    pub fn observe_presentation(&mut self, presented: HostTime, now: HostTime) -> bool {
        if self.seen {
            return self.monotonic;
        }
        self.seen = true;
        if presented < now && now.saturating_duration_since(presented) < Duration::SECOND {
            self.ust_scale = 1;
            self.monotonic = true;
        }
        self.monotonic
    }

    /// Converts a UST value to host time, if the domain is trusted.
    #[must_use]
    pub fn ust_to_host(&self, ust: u64) -> Option<HostTime> {
        self.monotonic
            .then(|| HostTime(ust.saturating_mul(self.ust_scale)))
    }
}
