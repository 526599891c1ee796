// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend-neutral types for GL presentation on desktop window systems.
//!
//! `cinder_core` holds everything about presenting GL frames that does not
//! depend on a particular window system. It is `no_std` compatible (with
//! `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   topology scan ──► OutputRegistry::reconcile() ──► outputs changed
//!                            │
//!                            ▼ output_for_rectangle()
//!   swap ──► FrameInfo ──► FrameInfoQueue ──► SYNC / COMPLETE events
//!                                  ▲
//!                                  │ PresentationClock (UST domain)
//!                       compositor / driver timestamps
//! ```
//!
//! **[`output`]**: Outputs, subpixel rotation table, and the sorted
//! registry with its lockstep reconciliation.
//!
//! **[`frame`]**: Frame records, the in-flight queue and lifecycle events.
//!
//! **[`clock`]**: Detects whether driver timestamps share the monotonic
//! clock domain.
//!
//! **[`backend`]**: The [`Winsys`](backend::Winsys) trait implemented by
//! window-system backends, plus the request, event and error types it uses.
//!
//! **[`time`]**: Nanosecond timestamps.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) instrumentation hooks.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod clock;
pub mod frame;
pub mod output;
pub mod time;
pub mod trace;
