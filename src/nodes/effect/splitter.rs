//! Fan-out with per-consumer cursors

use std::collections::VecDeque;

use crate::node::{AudioNode, ProcessContext};
use crate::pool::BufferPool;
use crate::{Channel, Sample};

/// Exposes one upstream as `K` independent outputs.
///
/// Each output has its own read cursor into a shared queue of blocks. The upstream is
/// pulled once per block no matter how many outputs read it, and every output observes
/// the same block sequence, in any interleaving of pulls.
///
/// A block stays queued until the slowest output has read it; then its buffer goes back
/// to the pool. Memory therefore scales with the largest skew between outputs, which is
/// usually one block.
pub struct Splitter {
    input: Channel,
    blocks: VecDeque<Vec<Sample>>,
    cursors: Vec<usize>,
    pool: BufferPool,
}

impl Splitter {
    /// Fan `input` out to `outputs` outputs (at least one).
    pub fn new(input: Channel, outputs: usize) -> Self {
        Self {
            input,
            blocks: VecDeque::new(),
            cursors: vec![0; outputs.max(1)],
            pool: BufferPool::new(),
        }
    }

    /// Blocks currently held for slower outputs.
    pub fn queued(&self) -> usize {
        self.blocks.len()
    }

    /// Buffers the pool has had to allocate so far.
    pub fn allocations(&self) -> usize {
        self.pool.allocations()
    }

    fn release_consumed(&mut self) {
        let consumed = self.cursors.iter().copied().min().unwrap_or(0);
        if consumed == 0 {
            return;
        }

        for buf in self.blocks.drain(..consumed) {
            self.pool.give_back(buf);
        }
        self.cursors.iter_mut().for_each(|c| *c -= consumed);
    }
}

impl AudioNode for Splitter {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        output: usize,
    ) -> &[Sample] {
        self.release_consumed();

        if self.cursors[output] >= self.blocks.len() {
            let mut buf = self.pool.get();
            self.input.extend_into(&mut buf);
            self.blocks.push_back(buf);
        }

        let at = self.cursors[output];
        self.cursors[output] += 1;
        &self.blocks[at]
    }

    fn num_outputs(&self) -> usize {
        self.cursors.len()
    }

    fn is_exhausted(&self, output: usize) -> bool {
        self.cursors[output] >= self.blocks.len() && self.input.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{pcm_source, Counter};
    use crate::Graph;

    fn ctx() -> ProcessContext {
        ProcessContext { sample_rate: 48_000 }
    }

    #[test]
    fn outputs_see_the_same_blocks() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(4));
        let split = graph.add(Splitter::new(counter.output(), 2));
        let (a, b) = (split.output_at(0).unwrap(), split.output_at(1).unwrap());

        assert_eq!(a.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(b.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(a.pull_vec(), vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(b.pull_vec(), vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(counter.pull_count(), 2);
    }

    #[test]
    fn a_fast_output_runs_ahead() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(1));
        let split = graph.add(Splitter::new(counter.output(), 3));
        let outs = split.outputs();

        for i in 0..5 {
            assert_eq!(outs[2].pull_vec(), vec![i as f32]);
        }
        assert_eq!(counter.pull_count(), 5);
        for i in 0..5 {
            assert_eq!(outs[0].pull_vec(), vec![i as f32]);
            assert_eq!(outs[1].pull_vec(), vec![i as f32]);
        }
        assert_eq!(counter.pull_count(), 5);
    }

    #[test]
    fn steady_state_reuses_buffers() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(256));
        let mut split = Splitter::new(counter.output(), 2);

        for _ in 0..4 {
            split.pull(&ctx(), core::iter::empty(), 0);
            split.pull(&ctx(), core::iter::empty(), 1);
        }
        let warm = split.allocations();
        for _ in 0..100 {
            split.pull(&ctx(), core::iter::empty(), 1);
            split.pull(&ctx(), core::iter::empty(), 0);
        }

        assert_eq!(split.allocations(), warm);
        assert!(split.queued() <= 2);
    }

    #[test]
    fn zero_outputs_means_one() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0));
        let split = graph.add(Splitter::new(counter.output(), 0));
        assert_eq!(split.num_outputs(), 1);
    }

    #[test]
    fn outputs_end_after_their_queued_blocks() {
        let mut graph = Graph::new(48_000);
        let file = graph.add(pcm_source(std::io::Cursor::new(vec![0u8, 64]), 4));
        let split = graph.add(Splitter::new(file.output(), 2));
        let (a, b) = (split.output_at(0).unwrap(), split.output_at(1).unwrap());

        assert_eq!(a.pull_vec(), vec![0.5]);
        assert!(a.is_exhausted());
        // b has not read the last block yet
        assert!(!b.is_exhausted());
        assert_eq!(b.pull_vec(), vec![0.5]);
        assert!(b.is_exhausted());
    }
}
