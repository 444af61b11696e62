//! Built-in audio nodes.
//!
//! Nodes are organized into three categories:
//!
//! ## Sources ([`source`])
//!
//! Produce blocks from nothing:
//! - [`Sine`] - Sine oscillator with frequency/amplitude control
//! - [`Dc`] - Constant value
//! - [`Noise`] - Uniform white noise
//! - [`Counter`], [`Literal`] - Deterministic sources for tests and demos
//! - [`Strided`] - Every `stride`-th sample of a shared array
//! - [`Converter`] - Adapts raw blocks of another sample type, e.g. [`pcm_source`]
//!
//! ## Effects ([`effect`])
//!
//! Pull from one or more [`Channel`](crate::Channel)s:
//! - [`Gain`], [`Offset`], [`Clip`], [`Chopper`] - Per-sample maps
//! - [`Fir`] - Finite impulse response filter, see [`design`] for coefficients
//! - [`DelayLine`] - Prepends a fixed run of zeros
//! - [`DataBuffer`] - Re-blocks to a fixed length
//! - [`Combiner`] - Sample-wise fold of several inputs ([`Combiner::mixer`],
//!   [`Combiner::modulator`])
//! - [`Splitter`], [`Deinterleaver`] - Fan-out nodes with several outputs
//!
//! ## Sinks ([`sink`])
//!
//! Drive the graph and hand blocks to a [`PlaybackDevice`](crate::device::PlaybackDevice):
//! - [`MonoSink`] - One input, one channel
//! - [`StereoSink`] - Two inputs, interleaved
//!
//! # Message Types
//!
//! Nodes with runtime parameters have their own message type:
//! - [`SineMessage`] - Control [`Sine`] frequency and amplitude
//! - [`DcMessage`], [`NoiseMessage`], [`GainMessage`], [`OffsetMessage`], [`ClipMessage`]
//!
//! Nodes without parameters (like [`Combiner`]) use `()` as their message type.

pub mod effect;
pub mod sink;
pub mod source;

// Re-export common types at the top level for convenience
pub use effect::*;
pub use sink::{MonoSink, Progress, Sink, StereoSink};
pub use source::*;
