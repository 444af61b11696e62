//! Audio graph - owns nodes and message queues

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use hashbrown::HashMap;
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::debug;

use crate::node::{AudioNode, NodeId, ProcessContext};
use crate::{Error, Result, Sample};

// Type-erased wrapper so we can store heterogeneous nodes
pub(crate) trait ErasedNode {
    fn pull_erased(&mut self, output: usize) -> &[Sample];
    fn num_outputs(&self) -> usize;
    fn pull_count(&self) -> u64;
    fn is_exhausted(&self, output: usize) -> bool;
}

struct NodeWrapper<N: AudioNode> {
    node: N,
    receiver: Consumer<N::Message>,
    ctx: ProcessContext,
    pulls: u64,
}

impl<N: AudioNode> ErasedNode for NodeWrapper<N> {
    fn pull_erased(&mut self, output: usize) -> &[Sample] {
        self.pulls += 1;

        // Split borrow to avoid conflict between receiver and node
        let receiver = &mut self.receiver;
        let messages = core::iter::from_fn(|| receiver.pop().ok());
        self.node.pull(&self.ctx, messages, output)
    }

    fn num_outputs(&self) -> usize {
        self.node.num_outputs()
    }

    fn pull_count(&self) -> u64 {
        self.pulls
    }

    fn is_exhausted(&self, output: usize) -> bool {
        self.node.is_exhausted(output)
    }
}

type NodeRef = Rc<RefCell<dyn ErasedNode>>;

/// A reference to one output of a node.
///
/// This is the edge type of the graph: processors are built with the `Channel`s they read
/// from. Cloning a `Channel` is cheap and does not copy the node; several consumers may
/// hold channels to the same node.
///
/// Pulling a channel pulls the node it points at. Two consumers pulling the *same* output
/// of a plain node each advance it, so shared producers belong behind a
/// [`Splitter`](crate::nodes::Splitter).
#[derive(Clone)]
pub struct Channel {
    node: NodeRef,
    id: NodeId,
    output: usize,
}

impl Channel {
    /// Pull the next block and hand it to `f`.
    ///
    /// The block is only borrowed for the duration of the call.
    #[inline]
    pub fn pull_with<R>(&self, f: impl FnOnce(&[Sample]) -> R) -> R {
        let mut node = self.node.borrow_mut();
        f(node.pull_erased(self.output))
    }

    /// Pull the next block into `buf`, replacing its contents. Returns the block length.
    #[inline]
    pub fn pull_into(&self, buf: &mut Vec<Sample>) -> usize {
        buf.clear();
        self.extend_into(buf)
    }

    /// Pull the next block and append it to `buf`. Returns the block length.
    #[inline]
    pub fn extend_into(&self, buf: &mut Vec<Sample>) -> usize {
        self.pull_with(|block| {
            buf.extend_from_slice(block);
            block.len()
        })
    }

    /// Pull the next block into a fresh `Vec`.
    pub fn pull_vec(&self) -> Vec<Sample> {
        self.pull_with(<[Sample]>::to_vec)
    }

    /// The node this channel reads from.
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// Output index on the node.
    pub fn output_index(&self) -> usize {
        self.output
    }

    /// Pulls served by the node, over all of its outputs.
    pub fn pull_count(&self) -> u64 {
        self.node.borrow().pull_count()
    }

    /// True once this output will never produce another sample.
    ///
    /// Must not be called from inside a pull of the same node.
    pub fn is_exhausted(&self) -> bool {
        self.node.borrow().is_exhausted(self.output)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("node", &self.id)
            .field("output", &self.output)
            .finish()
    }
}

/// A handle to a node in a [`Graph`].
///
/// Handles are returned when you add a node and provide two capabilities:
/// 1. **Connections** - [`output`](Self::output) / [`output_at`](Self::output_at) give
///    the [`Channel`]s other nodes are built from
/// 2. **Messages** - Send parameter updates via [`Handle::send`]
///
/// # Message Delivery
///
/// Messages are buffered in a lock-free ring buffer and drained at the start of the
/// node's next pull. If the buffer is full, [`Handle::send`] returns `Err(msg)`.
pub struct Handle<M: Send + 'static> {
    node: NodeRef,
    id: NodeId,
    sender: Producer<M>,
    _marker: PhantomData<M>,
}

impl<M: Send + 'static> Handle<M> {
    /// Send a message to the node (applied on its next pull).
    ///
    /// Returns Err if the queue is full (message dropped)
    pub fn send(&mut self, msg: M) -> core::result::Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(m)| m)
    }

    /// Channel reference to output 0.
    pub fn output(&self) -> Channel {
        Channel {
            node: Rc::clone(&self.node),
            id: self.id,
            output: 0,
        }
    }

    /// Channel reference to output `index`.
    ///
    /// Fails if the node has no such output.
    pub fn output_at(&self, index: usize) -> Result<Channel> {
        let outputs = self.num_outputs();
        if index >= outputs {
            return Err(Error::OutputOutOfRange {
                node: self.id.0,
                output: index,
                outputs,
            });
        }

        Ok(Channel {
            node: Rc::clone(&self.node),
            id: self.id,
            output: index,
        })
    }

    /// Channel references to every output, in order.
    pub fn outputs(&self) -> Vec<Channel> {
        (0..self.num_outputs())
            .map(|output| Channel {
                node: Rc::clone(&self.node),
                id: self.id,
                output,
            })
            .collect()
    }

    /// Number of outputs of the node.
    pub fn num_outputs(&self) -> usize {
        self.node.borrow().num_outputs()
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Pulls served by the node, over all of its outputs.
    pub fn pull_count(&self) -> u64 {
        self.node.borrow().pull_count()
    }
}

/// An audio graph at a fixed sample rate.
///
/// The graph owns every node added to it; nodes live until the graph is dropped. Edges
/// are not stored here: each processor holds the [`Channel`]s it was built from, so the
/// graph is acyclic by construction (a node can only reference nodes that already exist).
pub struct Graph {
    ctx: ProcessContext,
    nodes: HashMap<NodeId, NodeRef>,
    next_node_id: u32,
}

impl Graph {
    /// Create a new graph with the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            ctx: ProcessContext { sample_rate },
            nodes: HashMap::with_capacity(64),
            next_node_id: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.ctx.sample_rate
    }

    /// Add a node, returns a handle for connections and messages
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        self.add_with_queue_size(node, 64)
    }

    /// Add a node with a custom message queue size
    pub fn add_with_queue_size<N: AudioNode>(
        &mut self,
        node: N,
        queue_size: usize,
    ) -> Handle<N::Message> {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let (producer, consumer) = RingBuffer::new(queue_size.max(1));

        debug!(
            node = id.0,
            kind = core::any::type_name::<N>(),
            outputs = node.num_outputs(),
            "adding node"
        );

        let wrapper = NodeWrapper {
            node,
            receiver: consumer,
            ctx: self.ctx,
            pulls: 0,
        };
        let node: NodeRef = Rc::new(RefCell::new(wrapper));
        self.nodes.insert(id, Rc::clone(&node));

        Handle {
            node,
            id,
            sender: producer,
            _marker: PhantomData,
        }
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Pulls served so far by node `id`, or `None` if it is not in this graph.
    pub fn pull_count(&self, id: NodeId) -> Option<u64> {
        self.nodes.get(&id).map(|node| node.borrow().pull_count())
    }
}
