//! Audio byte-stream processing: alignment, header parsing, decoding, accumulation

mod align;
mod artifact;
mod decode;
mod header;

pub use align::SampleAligner;
pub use artifact::{ChunkAccumulator, FinalizedAudio};
pub use decode::{decode_pcm16, SampleSegment};
pub use header::{HeaderExtractor, StreamHeader};
