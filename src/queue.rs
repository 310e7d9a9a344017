// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Queues of unmatched start events

use alloc::collections::VecDeque;

/// FIFO of open starts for a single slot and event kind
///
/// Events of one kind on one slot never overlap out of order. Hence the oldest
/// pending start always belongs to the next end of that kind.
#[derive(Clone, Debug)]
pub struct PendingQueue<T> {
    inner: VecDeque<T>,
}

impl<T: Copy> PendingQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    /// Record an open start
    pub fn push(&mut self, start: T) {
        self.inner.push_back(start);
    }

    /// Take the oldest open start
    ///
    /// If no start is pending, the given `end` is returned in its place,
    /// resulting in an interval of zero duration.
    pub fn pop_front_or(&mut self, end: T) -> T {
        self.inner.pop_front().unwrap_or(end)
    }

    /// Peek at the oldest open start
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Number of open starts
    pub fn depth(&self) -> usize {
        self.inner.len()
    }

    /// Check whether no start is open
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop all open starts
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<T: Copy> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
