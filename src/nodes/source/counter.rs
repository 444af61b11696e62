//! Deterministic test-pattern sources

use crate::node::{AudioNode, ProcessContext};
use crate::{Sample, DEFAULT_BLOCK_SIZE};

/// A monotonically increasing integer ramp, one step per sample, carried across blocks.
pub struct Counter {
    next: i64,
    block: Vec<Sample>,
}

impl Counter {
    pub fn new(start: i64) -> Self {
        Self {
            next: start,
            block: vec![0.0; DEFAULT_BLOCK_SIZE],
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block.resize(block_size, 0.0);
        self
    }
}

impl AudioNode for Counter {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        for sample in self.block.iter_mut() {
            *sample = self.next as Sample;
            self.next += 1;
        }

        &self.block
    }
}

/// Returns the same literal block on every pull.
pub struct Literal {
    block: Vec<Sample>,
}

impl Literal {
    pub fn new(samples: impl Into<Vec<Sample>>) -> Self {
        Self {
            block: samples.into(),
        }
    }
}

impl AudioNode for Literal {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        &self.block
    }
}
