//! One-shot delay line

use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Delays its input by `D` samples.
///
/// The first pull returns exactly `D` zeros without touching the upstream; every pull
/// after that passes the upstream block through unchanged. The first block is therefore
/// `D` samples long whatever the upstream block size, so branches that meet again at a
/// combiner need a [`DataBuffer`](crate::nodes::DataBuffer) to re-align.
pub struct DelayLine {
    input: Channel,
    delay: usize,
    primed: bool,
    block: Vec<Sample>,
}

impl DelayLine {
    pub fn new(input: Channel, delay: usize) -> Self {
        Self {
            input,
            delay,
            primed: false,
            block: Vec::new(),
        }
    }

    pub fn delay(&self) -> usize {
        self.delay
    }
}

impl AudioNode for DelayLine {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        if !self.primed {
            self.primed = true;
            self.block.clear();
            self.block.resize(self.delay, 0.0);
            return &self.block;
        }

        self.input.pull_into(&mut self.block);
        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.primed && self.input.is_exhausted()
    }
}
