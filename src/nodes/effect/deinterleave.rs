//! Splits an interleaved stream into per-channel outputs

use std::collections::VecDeque;

use crate::node::{AudioNode, ProcessContext};
use crate::pool::BufferPool;
use crate::{Channel, Sample};

/// Splits an interleaved upstream into `K` outputs.
///
/// Output `j` receives every `K`-th sample starting at index `j` of each upstream block.
/// Whichever output finds its queue empty triggers exactly one upstream pull, which
/// fills the queues of all outputs at once; any output may be pulled first.
pub struct Deinterleaver {
    input: Channel,
    queues: Vec<VecDeque<Vec<Sample>>>,
    current: Vec<Vec<Sample>>,
    pool: BufferPool,
}

impl Deinterleaver {
    /// Split `input` into `channels` outputs (at least one).
    pub fn new(input: Channel, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            input,
            queues: (0..channels).map(|_| VecDeque::new()).collect(),
            current: vec![Vec::new(); channels],
            pool: BufferPool::new(),
        }
    }

    /// Buffers the pool has had to allocate so far.
    pub fn allocations(&self) -> usize {
        self.pool.allocations()
    }

    fn refill(&mut self) {
        let queues = &mut self.queues;
        let pool = &mut self.pool;
        let stride = queues.len();

        self.input.pull_with(|upstream| {
            for (j, queue) in queues.iter_mut().enumerate() {
                let mut buf = pool.get();
                buf.extend(upstream.iter().skip(j).step_by(stride).copied());
                queue.push_back(buf);
            }
        });
    }
}

impl AudioNode for Deinterleaver {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        output: usize,
    ) -> &[Sample] {
        if self.queues[output].is_empty() {
            self.refill();
        }

        let next = match self.queues[output].pop_front() {
            Some(buf) => buf,
            None => self.pool.get(),
        };
        let previous = std::mem::replace(&mut self.current[output], next);
        self.pool.give_back(previous);

        &self.current[output]
    }

    fn num_outputs(&self) -> usize {
        self.queues.len()
    }

    fn is_exhausted(&self, output: usize) -> bool {
        self.queues[output].is_empty() && self.input.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{pcm_source, Counter};
    use crate::Graph;

    #[test]
    fn strides_the_upstream() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(6));
        let split = graph.add(Deinterleaver::new(counter.output(), 3));
        let outs = split.outputs();

        assert_eq!(outs[1].pull_vec(), vec![1.0, 4.0]);
        assert_eq!(outs[0].pull_vec(), vec![0.0, 3.0]);
        assert_eq!(outs[2].pull_vec(), vec![2.0, 5.0]);
        assert_eq!(counter.pull_count(), 1);

        assert_eq!(outs[0].pull_vec(), vec![6.0, 9.0]);
        assert_eq!(outs[0].pull_vec(), vec![12.0, 15.0]);
        assert_eq!(counter.pull_count(), 3);
        assert_eq!(outs[2].pull_vec(), vec![8.0, 11.0]);
        assert_eq!(outs[2].pull_vec(), vec![14.0, 17.0]);
        assert_eq!(counter.pull_count(), 3);
    }

    #[test]
    fn uneven_blocks_give_uneven_outputs() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(5));
        let split = graph.add(Deinterleaver::new(counter.output(), 2));
        let outs = split.outputs();

        assert_eq!(outs[0].pull_vec(), vec![0.0, 2.0, 4.0]);
        assert_eq!(outs[1].pull_vec(), vec![1.0, 3.0]);
    }

    #[test]
    fn channels_end_after_their_queued_blocks() {
        let mut graph = Graph::new(48_000);
        let file = graph.add(pcm_source(std::io::Cursor::new(vec![0u8, 64, 0, 192]), 4));
        let split = graph.add(Deinterleaver::new(file.output(), 2));
        let outs = split.outputs();

        assert_eq!(outs[0].pull_vec(), vec![0.5]);
        assert!(outs[0].is_exhausted());
        assert!(!outs[1].is_exhausted());
        assert_eq!(outs[1].pull_vec(), vec![-0.5]);
        assert!(outs[1].is_exhausted());
    }
}
