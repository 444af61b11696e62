//! DC offset (bias) effect

use super::map_block;
use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Messages to control an [`Offset`]
#[derive(Clone, Copy, Debug)]
pub enum OffsetMessage {
    SetOffset(f32),
}

/// Adds a constant to every sample: `y = x + c`.
pub struct Offset {
    input: Channel,
    offset: Sample,
    block: Vec<Sample>,
}

impl Offset {
    pub fn new(input: Channel, offset: Sample) -> Self {
        Self {
            input,
            offset,
            block: Vec::new(),
        }
    }

    #[inline]
    pub fn offset(&self) -> Sample {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Sample) {
        self.offset = offset;
    }
}

impl AudioNode for Offset {
    type Message = OffsetMessage;

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = OffsetMessage>,
        _output: usize,
    ) -> &[Sample] {
        for msg in messages {
            match msg {
                OffsetMessage::SetOffset(c) => self.offset = c,
            }
        }

        let offset = self.offset;
        map_block(&self.input, &mut self.block, |x| x + offset);
        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.input.is_exhausted()
    }
}
