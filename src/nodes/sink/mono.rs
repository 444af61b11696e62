use crate::device::PlaybackDevice;
use crate::nodes::sink::{write_block, Progress, Sink};
use crate::{Channel, Error, Result, Sample};

/// Plays one channel on a mono device.
pub struct MonoSink<D> {
    input: Channel,
    device: D,
    block: Vec<Sample>,
}

impl<D: PlaybackDevice> MonoSink<D> {
    /// Fails unless `device` is mono.
    pub fn new(input: Channel, device: D) -> Result<Self> {
        if device.channels() != 1 {
            return Err(Error::Config(format!(
                "mono sink needs a 1-channel device, got {}",
                device.channels()
            )));
        }
        Ok(Self {
            input,
            device,
            block: Vec::new(),
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

impl<D: PlaybackDevice> Sink for MonoSink<D> {
    fn run_once(&mut self) -> Progress {
        if self.input.pull_into(&mut self.block) == 0 {
            if self.input.is_exhausted() {
                return Progress::Exhausted;
            }
            return Progress::Frames(0);
        }
        Progress::Frames(write_block(&mut self.device, &self.block))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn drain(&mut self) -> Result<()> {
        self.device.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PlaybackConfig, RtrbDevice};
    use crate::nodes::{pcm_source, Counter, Literal};
    use crate::Graph;

    #[test]
    fn writes_clipped_blocks() {
        let mut graph = Graph::new(48_000);
        let lit = graph.add(Literal::new(vec![0.25, -0.5, 3.0]));
        let (device, mut consumer) = RtrbDevice::new(PlaybackConfig::mono()).unwrap();
        let mut sink = MonoSink::new(lit.output(), device).unwrap();

        assert_eq!(sink.run_once(), Progress::Frames(3));

        let out: Vec<Sample> = std::iter::from_fn(|| consumer.pop().ok()).collect();
        assert_eq!(out, vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn empty_upstream_writes_nothing() {
        let mut graph = Graph::new(48_000);
        let lit = graph.add(Literal::new(Vec::new()));
        let (device, consumer) = RtrbDevice::new(PlaybackConfig::mono()).unwrap();
        let mut sink = MonoSink::new(lit.output(), device).unwrap();

        assert_eq!(sink.run_once(), Progress::Frames(0));
        assert!(consumer.is_empty());
    }

    #[test]
    fn finite_upstream_reports_exhaustion() {
        let mut graph = Graph::new(48_000);
        let file = graph.add(pcm_source(std::io::Cursor::new(vec![0u8, 64, 0, 192]), 4));
        let (device, mut consumer) = RtrbDevice::new(PlaybackConfig::mono()).unwrap();
        let mut sink = MonoSink::new(file.output(), device).unwrap();

        assert_eq!(sink.run_once(), Progress::Frames(2));
        assert_eq!(sink.run_once(), Progress::Exhausted);
        assert_eq!(consumer.pop(), Ok(0.5));
        assert_eq!(consumer.pop(), Ok(-0.5));
    }

    #[test]
    fn refuses_stereo_devices() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0));
        let (device, _consumer) = RtrbDevice::new(PlaybackConfig::stereo()).unwrap();

        assert!(matches!(
            MonoSink::new(counter.output(), device),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn full_device_reports_short_write() {
        let mut graph = Graph::new(48_000);
        let counter = graph.add(Counter::new(0).with_block_size(8));
        let (device, _consumer) = RtrbDevice::with_capacity(PlaybackConfig::mono(), 5).unwrap();
        let mut sink = MonoSink::new(counter.output(), device).unwrap();

        assert_eq!(sink.run_once(), Progress::Frames(5));
        assert_eq!(sink.run_once(), Progress::Frames(0));
        assert_eq!(counter.pull_count(), 2);
    }
}
