//! N-ary sample-wise combiner (mixer, ring modulator)

use tracing::warn;

use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Error, Result, Sample};

/// Combining function behind [`Combiner::mixer`] and [`Combiner::modulator`].
pub type CombineFn = fn(Sample, Sample) -> Sample;

/// Folds same-length blocks from several inputs with a binary function.
///
/// The first input's block is copied into scratch, then each further input is pulled
/// and folded in with `scratch[k] = f(scratch[k], b[k])`. Inputs must deliver blocks of
/// equal length. On a mismatch the combiner logs a warning and returns the scratch as
/// it stands; the remaining inputs are not pulled for that block.
///
/// Sums and products come from [`Combiner::mixer`] and [`Combiner::modulator`]; there
/// are no `Mixer` or `Modulator` types:
///
/// ```compile_fail
/// use klangstrom::nodes::Mixer;
/// ```
pub struct Combiner<F> {
    inputs: Vec<Channel>,
    combine: F,
    block: Vec<Sample>,
}

impl<F> Combiner<F>
where
    F: Fn(Sample, Sample) -> Sample + 'static,
{
    /// Fails with [`Error::EmptyCombiner`] if `inputs` is empty.
    pub fn new(inputs: Vec<Channel>, combine: F) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::EmptyCombiner);
        }

        Ok(Self {
            inputs,
            combine,
            block: Vec::new(),
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }
}

impl Combiner<CombineFn> {
    /// Sample-wise sum of `inputs`.
    pub fn mixer(inputs: Vec<Channel>) -> Result<Self> {
        Self::new(inputs, |a, b| a + b)
    }

    /// Sample-wise product of `inputs`.
    pub fn modulator(inputs: Vec<Channel>) -> Result<Self> {
        Self::new(inputs, |a, b| a * b)
    }
}

impl<F> AudioNode for Combiner<F>
where
    F: Fn(Sample, Sample) -> Sample + 'static,
{
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        let Some((first, rest)) = self.inputs.split_first() else {
            self.block.clear();
            return &self.block;
        };

        first.pull_into(&mut self.block);

        let combine = &self.combine;
        let block = &mut self.block;
        for input in rest {
            let matched = input.pull_with(|other| {
                if other.len() != block.len() {
                    warn!(
                        expected = block.len(),
                        got = other.len(),
                        node = input.node_id().index(),
                        "size mismatch, skipping remaining inputs"
                    );
                    return false;
                }

                for (acc, &x) in block.iter_mut().zip(other) {
                    *acc = combine(*acc, x);
                }
                true
            });

            if !matched {
                break;
            }
        }

        &self.block
    }

    /// Output length follows the first input.
    fn is_exhausted(&self, _output: usize) -> bool {
        self.inputs.first().map_or(true, Channel::is_exhausted)
    }
}
