//! Fixed-capacity FIFO with oldest-first eviction
//!
//! Adding to a full buffer never fails: the oldest element is evicted to
//! make room, so the buffer always holds the most recent `capacity` items.
//!
//! # Example
//!
//! ```
//! use harvest_sinks::util::BoundedEvictingBuffer;
//!
//! let mut buffer = BoundedEvictingBuffer::new(2).unwrap();
//! buffer.add(1);
//! buffer.add(2);
//! assert_eq!(buffer.add(3), Some(1));
//! assert_eq!(buffer.peek(), Some(&2));
//! ```

use std::collections::VecDeque;
use std::collections::vec_deque;

use crate::error::{Result, SinkError};

/// Bounded FIFO buffer that evicts its oldest element when full
///
/// Not synchronized; owners wrap it in a lock when sharing.
#[derive(Debug, Clone)]
pub struct BoundedEvictingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedEvictingBuffer<T> {
    /// Create a buffer holding at most `capacity` elements
    ///
    /// # Errors
    ///
    /// Returns `SinkError::InvalidCapacity` when `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SinkError::invalid_capacity(capacity));
        }
        Ok(Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append an element, returning the evicted oldest element if full
    pub fn add(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Append every element in order, evicting as needed
    ///
    /// Returns the number of evicted elements.
    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> usize {
        items
            .into_iter()
            .filter_map(|item| self.add(item))
            .count()
    }

    /// Oldest element, if any
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Newest element, if any
    #[inline]
    pub fn peek_newest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Remove and return the oldest element
    #[inline]
    pub fn poll(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Remove every element, oldest first
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Remove every element
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    /// Number of elements held
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the next `add` will evict
    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Maximum number of elements
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
#[path = "evicting_buffer_test.rs"]
mod evicting_buffer_test;
