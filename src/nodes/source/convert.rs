//! Numeric conversion from raw typed blocks into samples

use crate::node::{AudioNode, ProcessContext};
use crate::{Sample, DEFAULT_BLOCK_SIZE};

/// A producer of blocks in some raw numeric type.
///
/// This is the non-`Sample` side of a [`Converter`]: file readers, integer buffers,
/// anything that yields contiguous blocks of plain numbers. An empty block means the
/// producer is exhausted.
pub trait RawBlocks: 'static {
    type Item: Copy;

    fn next_block(&mut self) -> &[Self::Item];

    /// True once no further values will come.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Maps each raw value through a pure function to build a block of samples.
///
/// The output block has the same length as the raw block.
pub struct Converter<B, F> {
    raw: B,
    convert: F,
    block: Vec<Sample>,
}

impl<B, F> Converter<B, F>
where
    B: RawBlocks,
    F: Fn(B::Item) -> Sample + 'static,
{
    pub fn new(raw: B, convert: F) -> Self {
        Self {
            raw,
            convert,
            block: Vec::with_capacity(DEFAULT_BLOCK_SIZE),
        }
    }

    pub fn raw(&self) -> &B {
        &self.raw
    }
}

impl<B, F> AudioNode for Converter<B, F>
where
    B: RawBlocks,
    F: Fn(B::Item) -> Sample + 'static,
{
    type Message = ();

    fn pull(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _output: usize,
    ) -> &[Sample] {
        let convert = &self.convert;
        self.block.clear();
        self.block
            .extend(self.raw.next_block().iter().map(|&x| convert(x)));

        &self.block
    }

    fn is_exhausted(&self, _output: usize) -> bool {
        self.raw.is_exhausted()
    }
}

/// Walks an in-memory vector of raw values block by block.
pub struct Chunks<T> {
    data: Vec<T>,
    position: usize,
    block_size: usize,
}

impl<T> Chunks<T> {
    pub fn new(data: Vec<T>, block_size: usize) -> Self {
        Self {
            data,
            position: 0,
            block_size,
        }
    }
}

impl<T: Copy + 'static> RawBlocks for Chunks<T> {
    type Item = T;

    fn next_block(&mut self) -> &[T] {
        let start = self.position.min(self.data.len());
        let end = start.saturating_add(self.block_size).min(self.data.len());
        self.position = end;
        &self.data[start..end]
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Graph;

    #[test]
    fn converts_each_value() {
        let mut graph = Graph::new(48_000);
        let raw = Chunks::new(vec![0u8, 128, 255], 2);
        let conv = graph.add(Converter::new(raw, |x: u8| (x as Sample - 128.0) / 128.0));

        assert_eq!(conv.output().pull_vec(), vec![-1.0, 0.0]);
        let last = conv.output().pull_vec();
        assert_eq!(last.len(), 1);
        assert!((last[0] - 127.0 / 128.0).abs() < 1e-6);
        assert!(conv.output().pull_vec().is_empty());
    }

    #[test]
    fn exhausted_once_the_data_runs_out() {
        let mut graph = Graph::new(48_000);
        let conv = graph.add(Converter::new(Chunks::new(vec![1i16, 2, 3, 4], 2), |x: i16| {
            x as Sample
        }));
        let out = conv.output();

        assert!(!out.is_exhausted());
        out.pull_vec();
        assert!(!out.is_exhausted());
        assert_eq!(out.pull_vec(), vec![3.0, 4.0]);
        assert!(out.is_exhausted());
    }
}
