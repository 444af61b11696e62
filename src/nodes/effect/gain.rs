//! Gain/volume control effect

use super::map_block;
use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Messages to control gain
#[derive(Clone, Copy, Debug)]
pub enum GainMessage {
    /// Set the gain multiplier (1.0 = unity, 0.0 = silence)
    SetGain(f32),
}

/// Multiplies every sample by a gain factor: `y = g·x`.
pub struct Gain {
    input: Channel,
    gain: Sample,
    block: Vec<Sample>,
}

impl Gain {
    /// Create a new gain node with the specified gain value
    pub fn new(input: Channel, gain: Sample) -> Self {
        Self {
            input,
            gain,
            block: Vec::new(),
        }
    }

    #[inline]
    pub fn gain(&self) -> Sample {
        self.gain
    }

    pub fn set_gain(&mut self, gain: Sample) {
        self.gain = gain;
    }
}

impl AudioNode for Gain {
    type Message = GainMessage;

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = GainMessage>,
        _output: usize,
    ) -> &[Sample] {
        for msg in messages {
            match msg {
                GainMessage::SetGain(g) => self.gain = g,
            }
        }

        let gain = self.gain;
        map_block(&self.input, &mut self.block, |x| x * gain);
        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.input.is_exhausted()
    }
}
