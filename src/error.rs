//! Error types.
//!
//! Errors only surface while building a graph or opening a playback device. Once the
//! driver loop runs, nodes recover locally and report through `tracing`.

/// Errors raised at graph construction or device setup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A combiner was given no inputs.
    #[error("combiner needs at least one input")]
    EmptyCombiner,

    /// A channel reference named an output the node does not have.
    #[error("output {output} out of range for node {node} with {outputs} output(s)")]
    OutputOutOfRange {
        /// Node that was asked.
        node: u32,
        /// Requested output index.
        output: usize,
        /// Outputs the node actually has.
        outputs: usize,
    },

    /// Invalid playback configuration.
    #[error("invalid playback config: {0}")]
    Config(String),

    /// No playback device available on this host.
    #[error("no audio output device available")]
    NoDevice,

    /// The requested playback device was not found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Opening or configuring the playback device failed.
    #[error("failed to open playback device: {0}")]
    DeviceOpen(String),

    /// The playback stream failed after it was opened.
    #[error("playback stream error: {0}")]
    Stream(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
