//! Reusable sample buffers.

use crate::Sample;

/// A pool of sample buffers that keep their capacity between uses.
///
/// [`get`](Self::get) hands out an empty buffer, allocating only when the pool has run
/// dry; [`give_back`](Self::give_back) returns one for reuse. The pool never shrinks, so
/// after warm-up a fan-out node cycles the same handful of allocations forever.
///
/// Single-threaded; each fan-out node owns its own pool.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Vec<Vec<Sample>>,
    allocations: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty buffer out of the pool.
    #[inline]
    pub fn get(&mut self) -> Vec<Sample> {
        match self.free.pop() {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => {
                self.allocations += 1;
                Vec::new()
            }
        }
    }

    /// Return a buffer for later reuse.
    #[inline]
    pub fn give_back(&mut self, buf: Vec<Sample>) {
        self.free.push(buf);
    }

    /// Buffers currently waiting in the pool.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Fresh buffers created over the pool's lifetime.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}
