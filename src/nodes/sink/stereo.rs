use itertools::interleave;
use tracing::warn;

use crate::device::PlaybackDevice;
use crate::nodes::sink::{write_block, Progress, Sink};
use crate::{Channel, Error, Result, Sample};

/// Plays two channels on a stereo device.
///
/// Each run pulls one block from `left` and one from `right` and interleaves them
/// frame by frame. Both sides should produce blocks of the same length; if they don't,
/// only the common prefix is played.
pub struct StereoSink<D> {
    left: Channel,
    right: Channel,
    device: D,
    left_block: Vec<Sample>,
    interleaved: Vec<Sample>,
}

impl<D: PlaybackDevice> StereoSink<D> {
    /// Fails unless `device` is stereo.
    pub fn new(left: Channel, right: Channel, device: D) -> Result<Self> {
        if device.channels() != 2 {
            return Err(Error::Config(format!(
                "stereo sink needs a 2-channel device, got {}",
                device.channels()
            )));
        }
        Ok(Self {
            left,
            right,
            device,
            left_block: Vec::new(),
            interleaved: Vec::new(),
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }
}

impl<D: PlaybackDevice> Sink for StereoSink<D> {
    fn run_once(&mut self) -> Progress {
        self.left.pull_into(&mut self.left_block);

        let left = &self.left_block;
        let interleaved = &mut self.interleaved;
        self.right.pull_with(|right| {
            if left.len() != right.len() {
                warn!(
                    left = left.len(),
                    right = right.len(),
                    "stereo block length mismatch"
                );
            }
            let frames = left.len().min(right.len());
            interleaved.clear();
            interleaved.extend(interleave(&left[..frames], &right[..frames]));
        });

        if self.interleaved.is_empty() {
            if self.left.is_exhausted() || self.right.is_exhausted() {
                return Progress::Exhausted;
            }
            return Progress::Frames(0);
        }
        Progress::Frames(write_block(&mut self.device, &self.interleaved))
    }

    fn channels(&self) -> u16 {
        2
    }

    fn drain(&mut self) -> Result<()> {
        self.device.drain()
    }
}
