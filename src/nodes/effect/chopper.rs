//! Gate that switches its input on and off periodically

use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Passes the input for `on_time` samples, then outputs silence for `off_time`.
///
/// A phase counter `t` runs over every incoming sample and wraps at
/// `on_time + off_time`; samples pass while `t <= on_time`. Output length always equals
/// the upstream block length.
pub struct Chopper {
    input: Channel,
    on_time: u64,
    period: u64,
    t: u64,
    block: Vec<Sample>,
}

impl Chopper {
    pub fn new(input: Channel, on_time: u64, off_time: u64) -> Self {
        Self {
            input,
            on_time,
            period: (on_time + off_time).max(1),
            t: 0,
            block: Vec::new(),
        }
    }
}

impl AudioNode for Chopper {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        let (on_time, period) = (self.on_time, self.period);
        let t = &mut self.t;
        let block = &mut self.block;

        self.input.pull_with(|upstream| {
            block.clear();
            block.extend(upstream.iter().map(|&x| {
                let y = if *t <= on_time { x } else { 0.0 };
                *t = (*t + 1) % period;
                y
            }));
        });

        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.input.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Dc;
    use crate::Graph;

    #[test]
    fn gates_across_block_boundaries() {
        let mut graph = Graph::new(48_000);
        let dc = graph.add(Dc::new(1.0).with_block_size(4));
        let chop = graph.add(Chopper::new(dc.output(), 2, 3));

        // period 5, passes while t <= 2
        assert_eq!(chop.output().pull_vec(), vec![1.0, 1.0, 1.0, 0.0]);
        assert_eq!(chop.output().pull_vec(), vec![0.0, 1.0, 1.0, 1.0]);
        assert_eq!(chop.output().pull_vec(), vec![0.0, 0.0, 1.0, 1.0]);
    }
}
