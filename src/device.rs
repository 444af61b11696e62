//! Playback devices.
//!
//! A [`PlaybackDevice`] accepts interleaved blocks of samples at a fixed channel count,
//! rate and latency. Sinks pull blocks from the graph and hand them to a device.
//!
//! - [`RtrbDevice`] writes into a lock-free ring buffer whose consumer you keep: offline
//!   rendering, tests, or a hand-off to another thread.
//! - [`CpalDevice`] plays through the system audio output (requires the `cpal_sink`
//!   feature).
//!
//! # Example: List and Select a Device
//!
//! ```no_run
//! # #[cfg(feature = "cpal_sink")]
//! # fn main() -> klangstrom::Result<()> {
//! use klangstrom::device::{CpalDevice, PlaybackConfig};
//!
//! for name in CpalDevice::list_outputs() {
//!     println!("{name}");
//! }
//!
//! let device = CpalDevice::open(PlaybackConfig::default().with_channels(2))?;
//! println!("playing on {}", device.name());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cpal_sink"))]
//! # fn main() {}
//! ```

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::debug;

use crate::{Error, Result, Sample};

/// Channel count, rate and latency of a playback device.
///
/// The default is mono at 48 kHz with 500 ms of latency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// 1 (mono) or 2 (stereo)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffering between the sink and the hardware, in microseconds
    pub latency_us: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48_000,
            latency_us: 500_000,
        }
    }
}

impl PlaybackConfig {
    pub fn mono() -> Self {
        Self::default()
    }

    pub fn stereo() -> Self {
        Self::default().with_channels(2)
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_latency_us(mut self, latency_us: u32) -> Self {
        self.latency_us = latency_us;
        self
    }

    /// Check the configuration is one a device can be opened with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.channels) {
            return Err(Error::Config(format!(
                "{} channels requested, only mono and stereo are supported",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::Config("sample rate must be non-zero".into()));
        }
        Ok(())
    }

    /// Frames that fit in the latency window (at least one).
    pub fn buffer_frames(&self) -> usize {
        ((self.sample_rate as u64 * self.latency_us as u64) / 1_000_000).max(1) as usize
    }

    /// Interleaved samples that fit in the latency window.
    pub fn buffer_samples(&self) -> usize {
        self.buffer_frames() * self.channels as usize
    }

    /// The latency window as a [`Duration`](std::time::Duration).
    pub fn latency(&self) -> std::time::Duration {
        std::time::Duration::from_micros(self.latency_us as u64)
    }
}

/// An output for interleaved blocks of samples.
///
/// Devices are opened by their constructors and closed when dropped.
pub trait PlaybackDevice {
    fn channels(&self) -> u16;

    fn sample_rate(&self) -> u32;

    /// Write an interleaved block of `channels × frames` samples.
    ///
    /// Samples are clipped to `[-1, 1]` on the way out. Returns the number of whole
    /// frames accepted, which may be fewer than offered (a short write).
    fn write(&mut self, interleaved: &[Sample]) -> Result<usize>;

    /// Try to get the device back into a writable state after a short or failed write.
    fn recover(&mut self) -> Result<()> {
        Ok(())
    }

    /// Block until everything written so far has been played.
    fn drain(&mut self) -> Result<()>;
}

impl<D: PlaybackDevice + ?Sized> PlaybackDevice for Box<D> {
    fn channels(&self) -> u16 {
        (**self).channels()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn write(&mut self, interleaved: &[Sample]) -> Result<usize> {
        (**self).write(interleaved)
    }

    fn recover(&mut self) -> Result<()> {
        (**self).recover()
    }

    fn drain(&mut self) -> Result<()> {
        (**self).drain()
    }
}

/// Clip a sample to the nominal full-scale range.
#[inline]
pub fn clip_sample(x: Sample) -> Sample {
    x.clamp(-1.0, 1.0)
}

/// Push as many whole frames of `interleaved` as fit, clipped. Returns frames pushed.
fn push_frames(producer: &mut Producer<Sample>, interleaved: &[Sample], channels: usize) -> usize {
    let frames = (interleaved.len() / channels).min(producer.slots() / channels);
    for &s in &interleaved[..frames * channels] {
        // slots were checked above
        let _ = producer.push(clip_sample(s));
    }
    frames
}

/// A device that writes into an `rtrb` ring buffer.
///
/// The ring holds one latency window of samples. Writes never block: when the ring is
/// full, the write comes back short.
///
/// ```
/// use klangstrom::device::{PlaybackConfig, PlaybackDevice, RtrbDevice};
///
/// let (mut device, mut consumer) = RtrbDevice::new(PlaybackConfig::stereo()).unwrap();
/// assert_eq!(device.write(&[0.5, 2.0]).unwrap(), 1);
/// assert_eq!(consumer.pop(), Ok(0.5));
/// assert_eq!(consumer.pop(), Ok(1.0));
/// ```
pub struct RtrbDevice {
    config: PlaybackConfig,
    producer: Producer<Sample>,
}

impl RtrbDevice {
    /// Open with a ring sized to the latency window.
    pub fn new(config: PlaybackConfig) -> Result<(Self, Consumer<Sample>)> {
        Self::with_capacity(config, config.buffer_samples())
    }

    /// Open with a ring of `samples` slots.
    pub fn with_capacity(
        config: PlaybackConfig,
        samples: usize,
    ) -> Result<(Self, Consumer<Sample>)> {
        config.validate()?;
        let (producer, consumer) = RingBuffer::new(samples.max(config.channels as usize));
        debug!(?config, capacity = samples, "opened ring buffer device");
        Ok((Self { config, producer }, consumer))
    }

    /// Free sample slots in the ring.
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
}

impl PlaybackDevice for RtrbDevice {
    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn write(&mut self, interleaved: &[Sample]) -> Result<usize> {
        Ok(push_frames(
            &mut self.producer,
            interleaved,
            self.config.channels as usize,
        ))
    }

    fn drain(&mut self) -> Result<()> {
        // the consumer belongs to the caller, nothing to wait for here
        Ok(())
    }
}

#[cfg(feature = "cpal_sink")]
pub use self::cpal_device::CpalDevice;

#[cfg(feature = "cpal_sink")]
mod cpal_device {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::SampleFormat;
    use rtrb::{Consumer, Producer, RingBuffer};
    use tracing::{error, info, warn};

    use super::{push_frames, PlaybackConfig, PlaybackDevice};
    use crate::{Error, Result, Sample};

    /// Plays through a system audio output via cpal.
    ///
    /// The cpal stream runs on its own thread and consumes a ring buffer sized to the
    /// latency window; [`write`](PlaybackDevice::write) blocks until the ring has room
    /// (for at most one latency window, after which the write comes back short).
    pub struct CpalDevice {
        name: String,
        config: PlaybackConfig,
        buffer: Producer<Sample>,
        capacity: usize,
        /// Tracks how many samples CPAL has consumed
        samples_consumed: Arc<AtomicUsize>,
        /// Tracks underrun state for diagnostics
        had_underrun: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
        thread: Option<JoinHandle<()>>,
    }

    impl CpalDevice {
        /// Open the default output device.
        pub fn open(config: PlaybackConfig) -> Result<Self> {
            Self::open_named(None, config)
        }

        /// Open the first output device whose name contains `name` (case-insensitive),
        /// or the default device for `None`.
        pub fn open_named(name: Option<&str>, config: PlaybackConfig) -> Result<Self> {
            config.validate()?;

            let host = cpal::default_host();
            let device = match name {
                Some(search) => find_output_device(&host, search)?,
                None => host.default_output_device().ok_or(Error::NoDevice)?,
            };
            let name = device.name().unwrap_or_else(|_| "Unknown".into());

            let sample_format = device
                .default_output_config()
                .map_err(|e| Error::DeviceOpen(e.to_string()))?
                .sample_format();
            let stream_config = cpal::StreamConfig {
                channels: config.channels,
                sample_rate: cpal::SampleRate(config.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let capacity = config.buffer_samples();
            let (producer, consumer) = RingBuffer::<Sample>::new(capacity);

            let samples_consumed = Arc::new(AtomicUsize::new(0));
            let had_underrun = Arc::new(AtomicBool::new(false));
            let shutdown = Arc::new(AtomicBool::new(false));

            // The stream lives on its own thread; it reports back whether it started.
            let (ready_tx, ready_rx) = mpsc::sync_channel::<std::result::Result<(), String>>(1);
            let thread = {
                let samples_consumed = Arc::clone(&samples_consumed);
                let had_underrun = Arc::clone(&had_underrun);
                let shutdown = Arc::clone(&shutdown);
                thread::Builder::new()
                    .name("klangstrom-playback".into())
                    .spawn(move || {
                        let stream = build_stream(
                            &device,
                            sample_format,
                            &stream_config,
                            consumer,
                            samples_consumed,
                            had_underrun,
                        )
                        .map_err(|e| e.to_string())
                        .and_then(|stream| stream.play().map(|()| stream).map_err(|e| e.to_string()));

                        let stream = match stream {
                            Ok(stream) => {
                                let _ = ready_tx.send(Ok(()));
                                stream
                            }
                            Err(e) => {
                                let _ = ready_tx.send(Err(e));
                                return;
                            }
                        };

                        while !shutdown.load(Ordering::Acquire) {
                            thread::park_timeout(Duration::from_millis(100));
                        }
                        drop(stream);
                    })?
            };

            match ready_rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let _ = thread.join();
                    return Err(Error::DeviceOpen(e));
                }
                Err(_) => {
                    let _ = thread.join();
                    return Err(Error::DeviceOpen("playback thread exited early".into()));
                }
            }

            info!(
                device = %name,
                channels = config.channels,
                sample_rate = config.sample_rate,
                latency_us = config.latency_us,
                ?sample_format,
                "output stream started"
            );

            Ok(Self {
                name,
                config,
                buffer: producer,
                capacity,
                samples_consumed,
                had_underrun,
                shutdown,
                thread: Some(thread),
            })
        }

        /// Names of all output devices on the default host.
        pub fn list_outputs() -> Vec<String> {
            let host = cpal::default_host();
            host.output_devices()
                .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
                .unwrap_or_default()
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn config(&self) -> &PlaybackConfig {
            &self.config
        }

        /// Returns how many samples have been played
        #[inline]
        pub fn samples_consumed(&self) -> usize {
            self.samples_consumed.load(Ordering::Relaxed)
        }

        /// Returns available space in the buffer (in samples)
        #[inline]
        pub fn buffer_available(&self) -> usize {
            self.buffer.slots()
        }

        /// Check and clear the underrun flag
        pub fn check_underrun(&self) -> bool {
            self.had_underrun.swap(false, Ordering::Relaxed)
        }
    }

    fn find_output_device(host: &cpal::Host, search: &str) -> Result<cpal::Device> {
        let search_lower = search.to_lowercase();
        let devices = host
            .output_devices()
            .map_err(|e| Error::DeviceOpen(e.to_string()))?;

        for device in devices {
            if let Ok(name) = device.name() {
                if name.to_lowercase().contains(&search_lower) {
                    return Ok(device);
                }
            }
        }
        Err(Error::DeviceNotFound(search.to_string()))
    }

    fn build_stream(
        device: &cpal::Device,
        sample_format: SampleFormat,
        stream_config: &cpal::StreamConfig,
        mut consumer: Consumer<Sample>,
        samples_consumed: Arc<AtomicUsize>,
        had_underrun: Arc<AtomicBool>,
    ) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
        let on_error = |err: cpal::StreamError| error!(%err, "CPAL stream error");

        match sample_format {
            SampleFormat::F32 => device.build_output_stream(
                stream_config,
                move |data: &mut [f32], _| {
                    let mut underrun = false;
                    for sample in data.iter_mut() {
                        *sample = consumer.pop().unwrap_or_else(|_| {
                            underrun = true;
                            0.0
                        });
                    }
                    if underrun {
                        had_underrun.store(true, Ordering::Relaxed);
                    }
                    samples_consumed.fetch_add(data.len(), Ordering::Relaxed);
                },
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_output_stream(
                stream_config,
                move |data: &mut [i16], _| {
                    let mut underrun = false;
                    for sample in data.iter_mut() {
                        let s = consumer.pop().unwrap_or_else(|_| {
                            underrun = true;
                            0.0
                        });
                        *sample = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    }
                    if underrun {
                        had_underrun.store(true, Ordering::Relaxed);
                    }
                    samples_consumed.fetch_add(data.len(), Ordering::Relaxed);
                },
                on_error,
                None,
            ),
            SampleFormat::U16 => device.build_output_stream(
                stream_config,
                move |data: &mut [u16], _| {
                    let mut underrun = false;
                    for sample in data.iter_mut() {
                        let s = consumer.pop().unwrap_or_else(|_| {
                            underrun = true;
                            0.0
                        });
                        *sample = ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16;
                    }
                    if underrun {
                        had_underrun.store(true, Ordering::Relaxed);
                    }
                    samples_consumed.fetch_add(data.len(), Ordering::Relaxed);
                },
                on_error,
                None,
            ),
            _ => Err(cpal::BuildStreamError::StreamConfigNotSupported),
        }
    }

    impl PlaybackDevice for CpalDevice {
        fn channels(&self) -> u16 {
            self.config.channels
        }

        fn sample_rate(&self) -> u32 {
            self.config.sample_rate
        }

        fn write(&mut self, interleaved: &[Sample]) -> Result<usize> {
            let channels = self.config.channels as usize;
            let wanted = (interleaved.len() / channels) * channels;
            let deadline = Instant::now() + self.config.latency();

            // wait for the stream to make room, but never longer than one latency window
            while self.buffer.slots() < wanted.min(self.capacity) {
                if self.buffer.is_abandoned() {
                    return Err(Error::Stream("playback stream stopped".into()));
                }
                if Instant::now() >= deadline {
                    break;
                }
                thread::sleep(Duration::from_millis(1));
            }

            Ok(push_frames(&mut self.buffer, interleaved, channels))
        }

        fn recover(&mut self) -> Result<()> {
            if self.check_underrun() {
                warn!(device = %self.name, "playback underrun");
            }
            if self.buffer.is_abandoned() {
                return Err(Error::Stream("playback stream stopped".into()));
            }
            Ok(())
        }

        fn drain(&mut self) -> Result<()> {
            let deadline = Instant::now() + self.config.latency() * 2;
            while self.buffer.slots() < self.capacity && !self.buffer.is_abandoned() {
                if Instant::now() >= deadline {
                    warn!(
                        pending = self.capacity - self.buffer.slots(),
                        "drain timed out"
                    );
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        }
    }

    impl Drop for CpalDevice {
        fn drop(&mut self) {
            self.shutdown.store(true, Ordering::Release);
            if let Some(thread) = self.thread.take() {
                thread.thread().unpark();
                let _ = thread.join();
            }
        }
    }
}
