//! Raw 16-bit little-endian PCM input

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use super::convert::{Converter, RawBlocks};
use crate::{Result, Sample};

/// Reads signed 16-bit little-endian samples from any [`Read`]er.
///
/// Each block asks for up to `N·2` bytes. A short read gives a short block, end of file
/// gives an empty block. A dangling odd byte at the very end is dropped. Multi-channel
/// files come out interleaved; pair with a
/// [`Deinterleaver`](crate::nodes::Deinterleaver).
pub struct PcmReader<R> {
    reader: R,
    bytes: Vec<u8>,
    samples: Vec<i16>,
    exhausted: bool,
}

impl<R: Read> PcmReader<R> {
    pub fn new(reader: R, block_size: usize) -> Self {
        Self {
            reader,
            bytes: vec![0; block_size * 2],
            samples: vec![0; block_size],
            exhausted: false,
        }
    }

    fn fill(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + 'static> RawBlocks for PcmReader<R> {
    type Item = i16;

    fn next_block(&mut self) -> &[i16] {
        if self.exhausted {
            return &[];
        }

        let filled = match self.fill() {
            Ok(n) => n,
            Err(err) => {
                warn!(%err, "PCM read failed, treating as end of stream");
                self.exhausted = true;
                0
            }
        };

        let count = filled / 2;
        LittleEndian::read_i16_into(&self.bytes[..count * 2], &mut self.samples[..count]);
        if count < self.samples.len() {
            debug!(samples = count, "short PCM read");
        }

        &self.samples[..count]
    }

    /// True once the reader has hit end of file.
    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// `i16` to sample, full scale at 32768.
#[inline]
pub fn i16_to_sample(x: i16) -> Sample {
    x as Sample / 32768.0
}

/// A PCM reader normalised to samples.
pub type PcmSource<R> = Converter<PcmReader<R>, fn(i16) -> Sample>;

/// Wrap a reader of raw int16 LE data as a sample source.
pub fn pcm_source<R: Read + 'static>(reader: R, block_size: usize) -> PcmSource<R> {
    Converter::new(
        PcmReader::new(reader, block_size),
        i16_to_sample as fn(i16) -> Sample,
    )
}

/// Open a raw int16 LE file as a sample source.
pub fn open_pcm_file(
    path: impl AsRef<Path>,
    block_size: usize,
) -> Result<PcmSource<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!(path = %path.display(), block_size, "opened PCM file");
    Ok(pcm_source(BufReader::new(file), block_size))
}
