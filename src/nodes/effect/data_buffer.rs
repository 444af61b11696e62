//! Block-size adapter

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::node::{AudioNode, ProcessContext};
use crate::{Channel, Sample};

/// Re-blocks its input into blocks of exactly `M` samples.
///
/// Upstream blocks are appended to a FIFO until it holds at least `M` samples; the
/// first `M` are then handed out. The concatenated output equals the concatenated
/// input, only the block boundaries move.
///
/// Empty upstream blocks (a filter warming up) are pulled through. Once the upstream
/// is exhausted, whatever is left in the FIFO is returned instead, so the final blocks
/// of a finite stream may be short or empty.
pub struct DataBuffer {
    input: Channel,
    len: usize,
    tail: VecDeque<Sample>,
    block: Vec<Sample>,
}

/// Consecutive empty, non-final upstream blocks tolerated in one pull.
const MAX_EMPTY_PULLS: usize = 1024;

impl DataBuffer {
    pub fn new(input: Channel, len: usize) -> Self {
        Self {
            input,
            len,
            tail: VecDeque::with_capacity(len * 2),
            block: Vec::with_capacity(len),
        }
    }

    /// Output block length.
    pub fn block_len(&self) -> usize {
        self.len
    }
}

impl AudioNode for DataBuffer {
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        let mut empty_pulls = 0;
        while self.tail.len() < self.len {
            let tail = &mut self.tail;
            let got = self.input.pull_with(|upstream| {
                tail.extend(upstream.iter().copied());
                upstream.len()
            });
            if got > 0 {
                empty_pulls = 0;
                continue;
            }

            if self.input.is_exhausted() {
                debug!(buffered = self.tail.len(), wanted = self.len, "upstream exhausted");
                break;
            }
            empty_pulls += 1;
            if empty_pulls >= MAX_EMPTY_PULLS {
                warn!(
                    buffered = self.tail.len(),
                    wanted = self.len,
                    "upstream keeps returning empty blocks"
                );
                break;
            }
        }

        let take = self.len.min(self.tail.len());
        self.block.clear();
        self.block.extend(self.tail.drain(..take));

        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.tail.is_empty() && self.input.is_exhausted()
    }
}
