//! Hard clipper

use super::map_block;
use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Messages to control a [`Clip`]
#[derive(Clone, Copy, Debug)]
pub enum ClipMessage {
    /// Set `(lower, upper)`
    SetBounds(f32, f32),
}

/// Clamps every sample: `y = min(upper, max(lower, x))`.
///
/// Defaults to the nominal full-scale range `[-1, 1]`.
pub struct Clip {
    input: Channel,
    lower: Sample,
    upper: Sample,
    block: Vec<Sample>,
}

impl Clip {
    pub fn new(input: Channel) -> Self {
        Self::with_bounds(input, -1.0, 1.0)
    }

    pub fn with_bounds(input: Channel, lower: Sample, upper: Sample) -> Self {
        Self {
            input,
            lower,
            upper,
            block: Vec::new(),
        }
    }

    pub fn bounds(&self) -> (Sample, Sample) {
        (self.lower, self.upper)
    }

    pub fn set_bounds(&mut self, lower: Sample, upper: Sample) {
        self.lower = lower;
        self.upper = upper;
    }
}

impl AudioNode for Clip {
    type Message = ClipMessage;

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = ClipMessage>,
        _output: usize,
    ) -> &[Sample] {
        for msg in messages {
            match msg {
                ClipMessage::SetBounds(lower, upper) => self.set_bounds(lower, upper),
            }
        }

        let (lower, upper) = (self.lower, self.upper);
        // min/max rather than clamp: clamp panics on inverted bounds
        map_block(&self.input, &mut self.block, |x| x.max(lower).min(upper));
        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.input.is_exhausted()
    }
}
