//! Dense, reusable integer handles.
//!
//! The allocator is a bump counter plus a free list, matching the
//! free-list-over-a-counter idiom used throughout this crate (see also
//! [`crate::buffer::PositionBuffer`] and [`crate::time::Clock`]'s tick
//! subscriber registry). Handles carry no generation stamp: a single `u32`
//! is sufficient since reused handles are expected to have their
//! components released before reuse (see DESIGN.md).

use crate::error::StoreError;

/// An opaque, non-zero integer identifying a simulation object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    /// The raw integer value, for FFI/debugging only.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bump-counter-plus-free-list handle allocator.
///
/// Hands out the smallest free value: the free list is popped before the
/// counter is advanced, so handles stay dense over the lifetime of a store.
#[derive(Debug)]
pub struct HandleAllocator {
    max_live: usize,
    next: u32,
    free: Vec<Handle>,
    live: usize,
}

impl HandleAllocator {
    pub fn new(max_live: usize) -> Self {
        HandleAllocator {
            max_live,
            next: 1,
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of currently live handles.
    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn max_live(&self) -> usize {
        self.max_live
    }

    /// Allocate the smallest free handle, or fail if `max_live` is reached.
    pub fn create(&mut self) -> Result<Handle, StoreError> {
        if self.live >= self.max_live {
            return Err(StoreError::CapacityExceeded);
        }

        let handle = if let Some(h) = self.free.pop() {
            h
        } else {
            let h = Handle(self.next);
            self.next += 1;
            h
        };

        self.live += 1;
        Ok(handle)
    }

    /// Release a handle so it may be reissued by a later `create`.
    ///
    /// The caller is responsible for having already removed the handle's
    /// component rows; this allocator only tracks liveness of the integer
    /// itself.
    pub fn destroy(&mut self, handle: Handle) {
        self.free.push(handle);
        self.live = self.live.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_allocation() {
        let mut a = HandleAllocator::new(10);
        let h1 = a.create().unwrap();
        let h2 = a.create().unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn reissues_smallest_free_handle() {
        let mut a = HandleAllocator::new(10);
        let h1 = a.create().unwrap();
        let _h2 = a.create().unwrap();
        a.destroy(h1);
        let h3 = a.create().unwrap();
        assert_eq!(h1, h3);
    }

    #[test]
    fn never_issues_a_live_handle_twice() {
        let mut a = HandleAllocator::new(1000);
        let mut live = std::collections::HashSet::new();
        for _ in 0..200 {
            let h = a.create().unwrap();
            assert!(live.insert(h), "handle {h} issued while still live");
            if h.raw() % 3 == 0 {
                a.destroy(h);
                live.remove(&h);
            }
        }
    }

    #[test]
    fn capacity_exceeded() {
        let mut a = HandleAllocator::new(2);
        a.create().unwrap();
        a.create().unwrap();
        assert_eq!(a.create().unwrap_err(), StoreError::CapacityExceeded);
    }
}
