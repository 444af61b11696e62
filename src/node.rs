//! Core node trait and context types.

use crate::Sample;

/// Information available during a pull.
///
/// Passed to every [`AudioNode::pull`] call.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the graph in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
}

/// Unique identifier for a node within a graph.
///
/// You typically don't interact with this directly - use [`Handle`](crate::Handle) instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw index of the node in its graph.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// The core trait for audio nodes.
///
/// A node offers exactly one operation: hand out the next block for one of its outputs.
/// Nodes can be:
/// - **Sources**: produce blocks from nothing - oscillators, file readers
/// - **Processors**: pull from one or more [`Channel`](crate::Channel)s they were built
///   with and transform what they get
/// - **Fan-out nodes**: expose several outputs backed by a single upstream
///
/// # Pull Contract
///
/// - The returned block is owned by the node and is valid until the node's next pull.
///   Consumers copy it (or consume it immediately).
/// - `output` is always in `0..self.num_outputs()`; [`Handle::output_at`](crate::Handle::output_at)
///   refuses anything else when the graph is built.
/// - The next block depends only on the node's parameters and the pulls it has served so
///   far, on any of its outputs.
/// - Pulls never fail. An exhausted upstream shows up as a shorter (or empty) block.
/// - An empty block on its own does not mean the stream has ended: filters warming up
///   and zero-length delays return empty blocks too. [`is_exhausted`](Self::is_exhausted)
///   tells the two apart.
///
/// # Message-Based Parameters
///
/// Runtime knobs are changed through messages. Pending messages are handed to `pull` and
/// must be drained before producing the block:
///
/// ```
/// use klangstrom::{AudioNode, ProcessContext, Sample};
///
/// enum LevelMessage {
///     SetLevel(Sample),
/// }
///
/// struct Level {
///     level: Sample,
///     block: Vec<Sample>,
/// }
///
/// impl AudioNode for Level {
///     type Message = LevelMessage;
///
///     fn pull(
///         &mut self,
///         _ctx: &ProcessContext,
///         messages: impl Iterator<Item = LevelMessage>,
///         _output: usize,
///     ) -> &[Sample] {
///         for msg in messages {
///             match msg {
///                 LevelMessage::SetLevel(l) => self.level = l,
///             }
///         }
///         let level = self.level;
///         self.block.iter_mut().for_each(|s| *s = level);
///         &self.block
///     }
/// }
/// ```
///
/// Nodes without runtime parameters use `()` as their message type.
pub trait AudioNode: 'static {
    /// Message type for parameter updates.
    type Message: Send + 'static;

    /// Produce the next block for `output`.
    fn pull(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        output: usize,
    ) -> &[Sample];

    /// Number of outputs. Fan-out nodes override this.
    fn num_outputs(&self) -> usize {
        1
    }

    /// True once `output` will never produce another sample.
    ///
    /// Sources over finite data report this after running dry; processors forward the
    /// state of the inputs their output length follows. Endless sources keep the default.
    fn is_exhausted(&self, _output: usize) -> bool {
        false
    }
}
