//! Fixed-stride view over a shared sample vector

use std::rc::Rc;

use crate::node::{AudioNode, ProcessContext};
use crate::{Sample, DEFAULT_BLOCK_SIZE};

/// Reads every `stride`-th sample of a shared vector, starting at `offset`.
///
/// Each pull yields up to `N` samples and advances the cursor by `N·stride`. Once the
/// view runs past the end of the data, blocks shrink and then come back empty.
///
/// Two views with offsets 0 and 1 and a stride of 2 split interleaved stereo data
/// without copying it first.
pub struct Strided {
    data: Rc<[Sample]>,
    stride: usize,
    cursor: usize,
    block: Vec<Sample>,
    block_size: usize,
}

impl Strided {
    pub fn new(data: Rc<[Sample]>, offset: usize, stride: usize) -> Self {
        Self {
            data,
            stride: stride.max(1),
            cursor: offset,
            block: Vec::with_capacity(DEFAULT_BLOCK_SIZE),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

impl AudioNode for Strided {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        self.block.clear();
        let start = self.cursor.min(self.data.len());
        self.block.extend(
            self.data[start..]
                .iter()
                .step_by(self.stride)
                .take(self.block_size)
                .copied(),
        );
        self.cursor = self
            .cursor
            .saturating_add(self.block_size.saturating_mul(self.stride));

        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.cursor >= self.data.len()
    }
}
