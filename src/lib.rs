//! # Klangstrom
//!
//! A pull-based audio signal-flow engine.
//!
//! A graph of block producers is evaluated lazily: a [`Sink`](nodes::sink::Sink) asks its
//! upstream for a block of samples, that node asks its own upstream(s), and so on back to
//! the sources. There is no scheduler; the call chain *is* the schedule.
//!
//! ## Quick Start
//!
//! ```
//! use klangstrom::{Graph, nodes::{Dc, Gain}};
//!
//! let mut graph = Graph::new(48_000);
//! let dc = graph.add(Dc::new(0.5).with_block_size(4));
//! let gain = graph.add(Gain::new(dc.output(), 2.0));
//!
//! assert_eq!(gain.output().pull_vec(), vec![1.0; 4]);
//! ```
//!
//! ## Fan-out
//!
//! A node may be read by several consumers. Feed it through a
//! [`Splitter`](nodes::Splitter) so every consumer sees the same sample sequence while the
//! upstream is only pulled once per block:
//!
//! ```
//! use klangstrom::{Graph, nodes::{Counter, Splitter}};
//!
//! let mut graph = Graph::new(48_000);
//! let counter = graph.add(Counter::new(0).with_block_size(4));
//! let split = graph.add(Splitter::new(counter.output(), 2));
//!
//! let left = split.output_at(0).unwrap();
//! let right = split.output_at(1).unwrap();
//! assert_eq!(left.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
//! assert_eq!(right.pull_vec(), vec![0.0, 1.0, 2.0, 3.0]);
//! assert_eq!(counter.pull_count(), 1);
//! ```
//!
//! ## Features
//!
//! - `cpal_sink`: [`CpalDevice`](device::CpalDevice) playback through the system audio
//!   device, and the `klangstrom` binary.

mod engine;
mod error;
mod graph;
mod node;
mod pool;

pub mod device;
pub mod nodes;
pub mod presets;

pub use engine::Engine;
pub use error::{Error, Result};
pub use graph::{Channel, Graph, Handle};
pub use node::{AudioNode, NodeId, ProcessContext};
pub use pool::BufferPool;

/// The engine's sample type. Nominal full scale is `[-1.0, 1.0]`.
pub type Sample = f32;

/// Block size used by sources unless told otherwise.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
