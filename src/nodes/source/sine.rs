//! Sine wave oscillator

use core::f64::consts::TAU;

use crate::node::{AudioNode, ProcessContext};
use crate::{Sample, DEFAULT_BLOCK_SIZE};

/// Messages to control a [`Sine`] oscillator
#[derive(Clone, Copy, Debug)]
pub enum SineMessage {
    /// Set the frequency in Hz
    SetFrequency(f32),
    /// Set the peak amplitude
    SetAmplitude(f32),
}

/// A sine wave oscillator.
///
/// Keeps a phase accumulator in `[0, 2π)`. Each pull writes `A·sin(φ + k·Δ)` for
/// `k in 0..N`, with `Δ = 2π·f/fs`, and advances the accumulator by `N·Δ` (mod 2π).
/// There is no aliasing guard: frequencies above `fs/2` fold back.
pub struct Sine {
    frequency: f32,
    amplitude: f32,
    phase: f64,
    block: Vec<Sample>,
}

impl Sine {
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: frequency.max(0.0),
            amplitude: 1.0,
            phase: 0.0,
            block: vec![0.0; DEFAULT_BLOCK_SIZE],
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Start phase in radians.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase.rem_euclid(TAU);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block.resize(block_size, 0.0);
        self
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Current phase accumulator in radians.
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl AudioNode for Sine {
    type Message = SineMessage;

    fn pull(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = SineMessage>,
        _output: usize,
    ) -> &[Sample] {
        for msg in messages {
            match msg {
                SineMessage::SetFrequency(f) => self.frequency = f.max(0.0),
                SineMessage::SetAmplitude(a) => self.amplitude = a,
            }
        }

        let phase_inc = TAU * self.frequency as f64 / ctx.sample_rate as f64;
        let amplitude = self.amplitude;

        for sample in self.block.iter_mut() {
            *sample = self.phase.sin() as Sample * amplitude;
            self.phase = (self.phase + phase_inc).rem_euclid(TAU);
        }

        &self.block
    }
}
