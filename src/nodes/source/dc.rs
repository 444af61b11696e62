//! Constant (DC) source

use crate::node::{AudioNode, ProcessContext};
use crate::{Sample, DEFAULT_BLOCK_SIZE};

/// Messages to control a [`Dc`] source
#[derive(Clone, Copy, Debug)]
pub enum DcMessage {
    SetValue(f32),
}

/// Produces blocks of a single constant value.
pub struct Dc {
    value: Sample,
    block: Vec<Sample>,
}

impl Dc {
    pub fn new(value: Sample) -> Self {
        Self {
            value,
            block: vec![value; DEFAULT_BLOCK_SIZE],
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block = vec![self.value; block_size];
        self
    }

    #[inline]
    pub fn value(&self) -> Sample {
        self.value
    }
}

impl AudioNode for Dc {
    type Message = DcMessage;

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = DcMessage>,
        _output: usize,
    ) -> &[Sample] {
        for msg in messages {
            match msg {
                DcMessage::SetValue(v) => {
                    self.value = v;
                    self.block.fill(v);
                }
            }
        }

        &self.block
    }
}
