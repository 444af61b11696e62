mod chopper;
mod clip;
mod combiner;
mod data_buffer;
mod deinterleave;
mod delay;
mod fir;
mod gain;
mod offset;
mod splitter;

pub use chopper::*;
pub use clip::*;
pub use combiner::*;
pub use data_buffer::*;
pub use deinterleave::*;
pub use delay::*;
pub use fir::*;
pub use gain::*;
pub use offset::*;
pub use splitter::*;

use crate::{Channel, Sample};

/// Pull `input` and write `f(x)` for every sample into `block`.
#[inline]
pub(crate) fn map_block(input: &Channel, block: &mut Vec<Sample>, f: impl Fn(Sample) -> Sample) {
    input.pull_with(|upstream| {
        block.clear();
        block.extend(upstream.iter().map(|&x| f(x)));
    });
}
