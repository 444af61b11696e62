//! Uniform white noise

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::node::{AudioNode, ProcessContext};
use crate::{Sample, DEFAULT_BLOCK_SIZE};

/// Messages to control a [`Noise`] source
#[derive(Clone, Copy, Debug)]
pub enum NoiseMessage {
    SetAmplitude(f32),
}

/// Uniform noise in `[-A, A]`.
///
/// The generator is seeded once, at construction, from the operating system's entropy
/// source. Use [`Noise::with_seed`] for a reproducible stream.
pub struct Noise {
    amplitude: Sample,
    rng: oorandom::Rand32,
    block: Vec<Sample>,
}

impl Noise {
    pub fn new(amplitude: Sample) -> Self {
        Self::with_seed(amplitude, entropy_seed())
    }

    pub fn with_seed(amplitude: Sample, seed: u64) -> Self {
        Self {
            amplitude,
            rng: oorandom::Rand32::new(seed),
            block: vec![0.0; DEFAULT_BLOCK_SIZE],
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block.resize(block_size, 0.0);
        self
    }
}

/// 64 bits from the OS, or the clock if the OS has nothing to give.
pub(crate) fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(err) => {
            debug!(%err, "entropy source unavailable, seeding from the clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x5eed)
        }
    }
}

impl AudioNode for Noise {
    type Message = NoiseMessage;

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = NoiseMessage>,
        _output: usize,
    ) -> &[Sample] {
        for msg in messages {
            match msg {
                NoiseMessage::SetAmplitude(a) => self.amplitude = a,
            }
        }

        let amplitude = self.amplitude;
        for sample in self.block.iter_mut() {
            *sample = (self.rng.rand_float() * 2.0 - 1.0) * amplitude;
        }

        &self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Graph;

    #[test]
    fn stays_within_amplitude() {
        let mut graph = Graph::new(48_000);
        let noise = graph.add(Noise::new(0.3).with_block_size(4096));

        let block = noise.output().pull_vec();
        assert_eq!(block.len(), 4096);
        assert!(block.iter().all(|s| (-0.3..=0.3).contains(s)));
        assert!(block.iter().any(|&s| s != block[0]));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut graph = Graph::new(48_000);
        let a = graph.add(Noise::with_seed(1.0, 7).with_block_size(32));
        let b = graph.add(Noise::with_seed(1.0, 7).with_block_size(32));
        let c = graph.add(Noise::with_seed(1.0, 8).with_block_size(32));

        let a = a.output().pull_vec();
        assert_eq!(a, b.output().pull_vec());
        assert_ne!(a, c.output().pull_vec());
    }
}
