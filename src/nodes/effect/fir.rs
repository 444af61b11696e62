//! FIR filter and coefficient designers

use core::f64::consts::PI;
use std::rc::Rc;

use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Finite impulse response filter.
///
/// The coefficients are immutable and may be shared by any number of filters. Each
/// filter keeps its own ring of `L` taps.
///
/// For every incoming sample `x` the filter writes `x` at the cursor and advances it.
/// Once the ring has been filled at least once, it emits
/// `y = Σ h[i]·taps[(cursor + i) mod L]`, so `h[L-1]` weighs the newest sample and
/// `h[0]` the oldest.
///
/// # Warm-up
///
/// The first pull prepends `L/2` zeros (half the filter length of group delay), and no
/// output is produced for the first `L-1` input samples while the ring fills. Output
/// length therefore differs from input length until the filter is warm; put a
/// [`DataBuffer`](crate::nodes::DataBuffer) behind it before combining with other
/// branches.
pub struct Fir {
    input: Channel,
    coefficients: Rc<[Sample]>,
    taps: Vec<Sample>,
    cursor: usize,
    filled: bool,
    primed: bool,
    block: Vec<Sample>,
}

impl Fir {
    pub fn new(input: Channel, coefficients: Rc<[Sample]>) -> Self {
        let len = coefficients.len();
        Self {
            input,
            coefficients,
            taps: vec![0.0; len],
            cursor: 0,
            filled: false,
            primed: false,
            block: Vec::new(),
        }
    }

    pub fn coefficients(&self) -> &Rc<[Sample]> {
        &self.coefficients
    }

    /// Whether the tap ring has been filled at least once.
    pub fn is_warm(&self) -> bool {
        self.filled
    }
}

impl AudioNode for Fir {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        self.block.clear();

        let len = self.taps.len();
        if !self.primed {
            self.block.resize(len / 2, 0.0);
            self.primed = true;
        }
        if len == 0 {
            // nothing to convolve with: silence, one sample per input
            let block = &mut self.block;
            self.input
                .pull_with(|upstream| block.resize(block.len() + upstream.len(), 0.0));
            return &self.block;
        }

        let h = &*self.coefficients;
        let taps = &mut self.taps;
        let cursor = &mut self.cursor;
        let filled = &mut self.filled;
        let block = &mut self.block;

        self.input.pull_with(|upstream| {
            for &x in upstream {
                taps[*cursor] = x;
                *cursor += 1;
                if *cursor == len {
                    *cursor = 0;
                    *filled = true;
                }

                if *filled {
                    // taps[cursor..] are the oldest samples, taps[..cursor] the newest
                    let (newer, older) = taps.split_at(*cursor);
                    let y = older
                        .iter()
                        .chain(newer.iter())
                        .zip(h.iter())
                        .map(|(t, c)| t * c)
                        .sum::<Sample>();
                    block.push(y);
                }
            }
        });

        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.input.is_exhausted()
    }
}

/// Coefficient designers.
pub mod design {
    use super::*;

    /// Windowed-sinc lowpass (Hamming window) with unity DC gain.
    pub fn lowpass(cutoff_hz: f32, sample_rate: u32, taps: usize) -> Rc<[Sample]> {
        if taps == 0 {
            return Rc::from(Vec::new());
        }

        let fc = (cutoff_hz as f64 / sample_rate as f64).clamp(0.0, 0.5);
        let middle = (taps - 1) as f64 / 2.0;

        let mut h: Vec<f64> = (0..taps)
            .map(|n| {
                let m = n as f64 - middle;
                let sinc = if m == 0.0 {
                    2.0 * fc
                } else {
                    (2.0 * PI * fc * m).sin() / (PI * m)
                };
                let window = if taps == 1 {
                    1.0
                } else {
                    0.54 - 0.46 * (2.0 * PI * n as f64 / (taps - 1) as f64).cos()
                };
                sinc * window
            })
            .collect();

        let sum: f64 = h.iter().sum();
        if sum.abs() > f64::EPSILON {
            h.iter_mut().for_each(|c| *c /= sum);
        }

        h.into_iter().map(|c| c as Sample).collect()
    }

    /// `len` equal taps of `1/len`.
    pub fn moving_average(len: usize) -> Rc<[Sample]> {
        let len = len.max(1);
        vec![1.0 / len as Sample; len].into()
    }

    /// A single 1.0 at `position`, zero elsewhere.
    pub fn unit_impulse(len: usize, position: usize) -> Rc<[Sample]> {
        let mut h = vec![0.0; len];
        if let Some(c) = h.get_mut(position) {
            *c = 1.0;
        }
        h.into()
    }
}

#[cfg(test)]
mod tests {
    use super::design::*;
    use super::*;
    use crate::nodes::{Counter, Dc, Literal};
    use crate::Graph;
    use float_cmp::approx_eq;

    #[test]
    fn middle_tap_after_warm_up() {
        let mut graph = Graph::new(48_000);
        let src = graph.add(Literal::new([
            0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
        ]));
        let fir = graph.add(Fir::new(src.output(), unit_impulse(5, 2)));

        let block = fir.output().pull_vec();
        // L/2 zeros, then one output per input once the ring is full
        assert_eq!(block, vec![0.0, 0.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn zero_coefficients_give_silence() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(1).with_block_size(16));
        let fir = graph.add(Fir::new(counter.output(), vec![0.0; 7].into()));

        let first = fir.output().pull_vec();
        assert_eq!(first.len(), 3 + 16 - 6);
        assert!(first.iter().all(|&s| s == 0.0));

        let second = fir.output().pull_vec();
        assert_eq!(second.len(), 16);
        assert!(second.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn newest_tap_copies_the_input_once_warm() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(4));
        let fir = graph.add(Fir::new(counter.output(), unit_impulse(4, 3)));

        // ring fills on the 4th sample: 2 warm-up zeros, then x3
        assert_eq!(fir.output().pull_vec(), vec![0.0, 0.0, 3.0]);
        assert_eq!(fir.output().pull_vec(), vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn warm_up_can_span_several_pulls() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(2));
        let fir = graph.add(Fir::new(counter.output(), moving_average(5)));

        assert_eq!(fir.output().pull_vec(), vec![0.0, 0.0]);
        assert!(fir.output().pull_vec().is_empty());
        let third = fir.output().pull_vec();
        assert_eq!(third.len(), 2);
        assert!(approx_eq!(f32, third[0], 2.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, third[1], 3.0, epsilon = 1e-6));
    }

    #[test]
    fn lowpass_passes_dc() {
        let h = lowpass(1000.0, 48_000, 31);
        assert_eq!(h.len(), 31);
        assert!(approx_eq!(f32, h.iter().sum::<f32>(), 1.0, epsilon = 1e-5));
        assert!(approx_eq!(f32, h[0], h[30], epsilon = 1e-7));

        let mut graph = Graph::new(48_000);
        let dc = graph.add(Dc::new(0.5).with_block_size(64));
        let fir = graph.add(Fir::new(dc.output(), h));
        fir.output().pull_vec();
        for s in fir.output().pull_vec() {
            assert!(approx_eq!(f32, s, 0.5, epsilon = 1e-4));
        }
    }

    #[test]
    fn coefficients_are_shared() {
        let h = moving_average(3);
        let mut graph = Graph::new(48_000);
        let a = graph.add(Counter::new(0));
        let b = graph.add(Counter::new(0));
        graph.add(Fir::new(a.output(), Rc::clone(&h)));
        graph.add(Fir::new(b.output(), Rc::clone(&h)));
        assert_eq!(Rc::strong_count(&h), 3);
    }
}
