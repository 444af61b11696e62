mod convert;
mod counter;
mod dc;
mod noise;
mod pcm;
mod sine;
mod strided;

pub use convert::*;
pub use counter::*;
pub use dc::*;
pub use noise::*;
pub use pcm::*;
pub use sine::*;
pub use strided::*;

pub(crate) use noise::entropy_seed;
