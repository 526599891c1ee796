// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bracketing fallible X requests.
//!
//! Xlib reports protocol errors asynchronously through a process-wide
//! handler whose default action is to exit. [`ErrorTrap`] replaces that
//! handler for the duration of a bracket and records the error code in the
//! innermost open frame:
//!
//! ```text
//!   trap()        install handler, push frame { code: 0, previous }
//!     request     server error ──► handler ──► top frame.code = error
//!     sync()
//!   untrap(token) pop frame, restore previous handler, return code
//! ```
//!
//! The handler closure captures the trap's frame stack directly, so no
//! global registry is needed to find the connection an error belongs to.
//! Brackets must nest; [`ErrorTrap::untrap`] panics on an out-of-order token.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::xlib::{ErrorEvent, ErrorHandler, Xlib};

struct TrapFrame {
    code: u8,
    previous: Option<ErrorHandler>,
}

/// Proof of an open bracket, consumed by [`ErrorTrap::untrap`].
#[must_use = "every trap must be closed with untrap"]
#[derive(Debug)]
pub struct TrapToken {
    depth: usize,
}

/// Stack of error-trap frames for one display connection.
pub struct ErrorTrap {
    frames: Rc<RefCell<Vec<TrapFrame>>>,
    handler: ErrorHandler,
}

impl fmt::Debug for ErrorTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTrap")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl Default for ErrorTrap {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorTrap {
    /// Creates an empty trap stack and its handler.
    #[must_use]
    pub fn new() -> Self {
        let frames: Rc<RefCell<Vec<TrapFrame>>> = Rc::default();
        let weak: Weak<RefCell<Vec<TrapFrame>>> = Rc::downgrade(&frames);
        let handler: ErrorHandler = Rc::new(move |event: &ErrorEvent| {
            let Some(frames) = weak.upgrade() else {
                return;
            };
            match frames.borrow_mut().last_mut() {
                Some(top) => top.code = event.error_code,
                None => log::warn!(
                    "untrapped X error {} (request {}, resource 0x{:x})",
                    event.error_code,
                    event.request_code,
                    event.resource_id
                ),
            }
        });
        Self { frames, handler }
    }

    /// Number of open brackets.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Opens a bracket.
    pub fn trap<X: Xlib>(&self, native: &mut X) -> TrapToken {
        let previous = native.set_error_handler(Some(Rc::clone(&self.handler)));
        let mut frames = self.frames.borrow_mut();
        frames.push(TrapFrame { code: 0, previous });
        TrapToken {
            depth: frames.len(),
        }
    }

    /// Closes the innermost bracket and returns the error code it captured,
    /// 0 if none.
    ///
    /// # Panics
    ///
    /// Panics if `token` does not belong to the innermost open bracket.
    pub fn untrap<X: Xlib>(&self, native: &mut X, token: TrapToken) -> u8 {
        let frame = {
            let mut frames = self.frames.borrow_mut();
            assert_eq!(
                frames.len(),
                token.depth,
                "error traps must be closed in LIFO order"
            );
            frames.pop()
        };
        let Some(frame) = frame else {
            return 0;
        };
        _ = native.set_error_handler(frame.previous);
        frame.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeServer;

    fn raise(server: &mut crate::fake::FakeDisplay, code: u8) {
        server.raise_error(code);
    }

    #[test]
    fn untrap_returns_zero_without_errors() {
        let (mut display, _) = FakeServer::new().split();
        let trap = ErrorTrap::new();
        let token = trap.trap(&mut display);
        assert_eq!(trap.untrap(&mut display, token), 0);
        assert_eq!(trap.depth(), 0);
    }

    #[test]
    fn nested_traps_capture_their_own_errors() {
        let (mut display, _) = FakeServer::new().split();
        let trap = ErrorTrap::new();

        let outer = trap.trap(&mut display);
        raise(&mut display, 3);
        let inner = trap.trap(&mut display);
        raise(&mut display, 8);
        assert_eq!(trap.untrap(&mut display, inner), 8);
        assert_eq!(
            trap.untrap(&mut display, outer),
            3,
            "inner error must not leak into the outer frame"
        );
    }

    #[test]
    fn outermost_untrap_restores_previous_handler() {
        let (mut display, server) = FakeServer::new().split();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let original: ErrorHandler =
            Rc::new(move |e: &ErrorEvent| sink.borrow_mut().push(e.error_code));
        _ = display.set_error_handler(Some(Rc::clone(&original)));

        let trap = ErrorTrap::new();
        let outer = trap.trap(&mut display);
        let inner = trap.trap(&mut display);
        raise(&mut display, 9);
        _ = trap.untrap(&mut display, inner);
        _ = trap.untrap(&mut display, outer);

        assert!(
            server
                .borrow()
                .error_handler
                .as_ref()
                .is_some_and(|h| Rc::ptr_eq(h, &original)),
            "original handler should be reinstalled"
        );
        raise(&mut display, 2);
        assert_eq!(*seen.borrow(), [2], "only the post-trap error reaches it");
    }

    #[test]
    #[should_panic(expected = "LIFO")]
    fn out_of_order_untrap_panics() {
        let (mut display, _) = FakeServer::new().split();
        let trap = ErrorTrap::new();
        let outer = trap.trap(&mut display);
        let _inner = trap.trap(&mut display);
        _ = trap.untrap(&mut display, outer);
    }
}
