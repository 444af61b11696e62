//! High-level driver loop

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::graph::{Graph, Handle};
use crate::node::AudioNode;
use crate::nodes::sink::{Progress, Sink};
use crate::Result;

/// Owns a [`Graph`] and the sinks that drive it.
///
/// Nothing happens until a sink pulls. Each call to [`process`](Self::process) runs every
/// sink once; each sink pulls one block through the graph and writes it to its device.
/// Pacing comes from the devices: a [`CpalDevice`](crate::device::CpalDevice) blocks in
/// `write` while its buffer is full.
///
/// ```
/// use klangstrom::device::{PlaybackConfig, RtrbDevice};
/// use klangstrom::nodes::{Dc, MonoSink};
/// use klangstrom::Engine;
///
/// let mut engine = Engine::new(48_000);
/// let dc = engine.add(Dc::new(0.5).with_block_size(256));
///
/// let (device, consumer) = RtrbDevice::new(PlaybackConfig::mono()).unwrap();
/// engine.add_sink(MonoSink::new(dc.output(), device).unwrap());
///
/// assert_eq!(engine.run_blocks(4), 4);
/// assert_eq!(consumer.slots(), 1024);
/// ```
pub struct Engine {
    graph: Graph,
    sinks: Vec<Box<dyn Sink>>,
    /// Blocks processed (for scheduling)
    blocks_processed: u64,
}

impl Engine {
    /// Create an engine with an empty graph at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self::from_graph(Graph::new(sample_rate))
    }

    /// Wrap an existing graph.
    pub fn from_graph(graph: Graph) -> Self {
        Self {
            graph,
            sinks: Vec::new(),
            blocks_processed: 0,
        }
    }

    /// Add a sink (builder pattern).
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn add_sink(&mut self, sink: impl Sink + 'static) {
        debug!(channels = sink.channels(), sinks = self.sinks.len() + 1, "adding sink");
        self.sinks.push(Box::new(sink));
    }

    /// Add a node to the graph. See [`Graph::add`].
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        self.graph.add(node)
    }

    /// Add a node with a custom message queue size.
    pub fn add_with_queue_size<N: AudioNode>(
        &mut self,
        node: N,
        queue_size: usize,
    ) -> Handle<N::Message> {
        self.graph.add_with_queue_size(node, queue_size)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn sample_rate(&self) -> u32 {
        self.graph.sample_rate()
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// Run every sink once.
    ///
    /// Returns the frames written by the slowest sink, or [`Progress::Exhausted`] once any
    /// sink's upstream has ended (an engine without sinks is exhausted from the start).
    /// Zero frames is not the end: filters warming up and full devices write nothing for
    /// a while.
    pub fn process(&mut self) -> Progress {
        if self.sinks.is_empty() {
            return Progress::Exhausted;
        }

        let mut slowest = usize::MAX;
        let mut exhausted = false;
        for sink in &mut self.sinks {
            match sink.run_once() {
                Progress::Frames(n) => slowest = slowest.min(n),
                Progress::Exhausted => exhausted = true,
            }
        }
        self.blocks_processed += 1;

        if exhausted {
            Progress::Exhausted
        } else {
            Progress::Frames(slowest)
        }
    }

    /// Process up to `blocks` blocks, stopping early once a sink's upstream ends.
    ///
    /// Returns the blocks processed before the end.
    pub fn run_blocks(&mut self, blocks: u64) -> u64 {
        info!(blocks, sample_rate = self.sample_rate(), "running");
        let mut done = 0;
        while done < blocks {
            if self.process().is_exhausted() {
                info!(blocks = done, "upstream exhausted");
                break;
            }
            done += 1;
        }
        done
    }

    /// Process until `stop` is set or a sink's upstream ends.
    ///
    /// Returns the blocks processed before stopping.
    pub fn run_until(&mut self, stop: &AtomicBool) -> u64 {
        info!(sample_rate = self.sample_rate(), "running until stopped");
        let mut done = 0;
        while !stop.load(Ordering::Relaxed) {
            if self.process().is_exhausted() {
                info!(blocks = done, "upstream exhausted");
                break;
            }
            done += 1;
        }
        done
    }

    /// Wait for every sink to play out, then tear down the graph and devices.
    ///
    /// All sinks are drained; the first error is returned.
    pub fn finish(mut self) -> Result<()> {
        let mut result = Ok(());
        for sink in &mut self.sinks {
            if let Err(err) = sink.drain() {
                tracing::error!(%err, "drain failed");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        info!(blocks = self.blocks_processed, "finished");
        result
    }
}
