//! Sinks drive the graph: each call pulls one block and writes it to a device.

mod mono;
mod stereo;

pub use mono::*;
pub use stereo::*;

use tracing::{error, warn};

use crate::device::PlaybackDevice;
use crate::{Result, Sample};

/// What one [`Sink::run_once`] achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Frames the device accepted. Zero is normal while filters warm up or the device is
    /// full.
    Frames(usize),
    /// The upstream will never produce another sample.
    Exhausted,
}

impl Progress {
    /// Frames written, zero for [`Progress::Exhausted`].
    pub fn frames(self) -> usize {
        match self {
            Progress::Frames(n) => n,
            Progress::Exhausted => 0,
        }
    }

    pub fn is_exhausted(self) -> bool {
        self == Progress::Exhausted
    }
}

/// Terminal consumer of a graph.
///
/// The [`Engine`](crate::Engine) calls [`run_once`](Self::run_once) in a loop until it
/// reports [`Progress::Exhausted`].
pub trait Sink {
    /// Pull one block from upstream and write it out.
    fn run_once(&mut self) -> Progress;

    /// Channels per frame.
    fn channels(&self) -> u16;

    /// Block until everything written has been played.
    fn drain(&mut self) -> Result<()>;
}

/// Write a whole interleaved block, recovering once from a short or failed write.
///
/// Returns the frames the device accepted.
pub(crate) fn write_block<D: PlaybackDevice + ?Sized>(
    device: &mut D,
    interleaved: &[Sample],
) -> usize {
    let channels = device.channels().max(1) as usize;
    let frames = interleaved.len() / channels;

    let mut written = match device.write(interleaved) {
        Ok(n) => n,
        Err(err) => {
            error!(%err, "playback write failed");
            0
        }
    };
    if written >= frames {
        return written;
    }

    if let Err(err) = device.recover() {
        error!(%err, "playback device did not recover");
        return written;
    }
    match device.write(&interleaved[written * channels..]) {
        Ok(n) => written += n,
        Err(err) => error!(%err, "playback write failed after recovery"),
    }

    if written < frames {
        warn!(frames, written, "short write to playback device");
    }
    written
}
