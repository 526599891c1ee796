// Copyright 2026 the Cinder Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native event filter chain.
//!
//! Every native event is offered to each registered filter in registration
//! order. A filter returns [`FilterReturn::Continue`] to let later filters
//! see the event (it may still have acted on it) or
//! [`FilterReturn::Remove`] to stop dispatch.
//!
//! Filters receive a mutable context chosen by the owner of the chain, so
//! they can update backend state without holding references into it.

use std::fmt;

use crate::xlib::XEvent;

/// Verdict of one filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterReturn {
    /// Offer the event to the next filter.
    Continue,
    /// The event was consumed; stop dispatch.
    Remove,
}

/// Handle for removing a filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterId(u32);

type FilterFn<C> = Box<dyn FnMut(&mut C, &XEvent) -> FilterReturn>;

/// Ordered list of event filters over a context `C`.
pub struct FilterChain<C> {
    filters: Vec<(FilterId, FilterFn<C>)>,
    next_id: u32,
}

impl<C> fmt::Debug for FilterChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl<C> Default for FilterChain<C> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> FilterChain<C> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn add(&mut self, filter: impl FnMut(&mut C, &XEvent) -> FilterReturn + 'static) -> FilterId {
        let id = FilterId(self.next_id);
        self.next_id += 1;
        self.filters.push((id, Box::new(filter)));
        id
    }

    /// Removes a filter; returns `false` if it was not registered.
    pub fn remove(&mut self, id: FilterId) -> bool {
        let before = self.filters.len();
        self.filters.retain(|(filter_id, _)| *filter_id != id);
        self.filters.len() != before
    }

    /// Number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Offers `event` to each filter until one removes it.
    pub fn dispatch(&mut self, context: &mut C, event: &XEvent) -> FilterReturn {
        for (id, filter) in &mut self.filters {
            if filter(context, event) == FilterReturn::Remove {
                log::trace!("event serial {} consumed by filter {:?}", event.serial, id);
                return FilterReturn::Remove;
            }
        }
        FilterReturn::Continue
    }
}
