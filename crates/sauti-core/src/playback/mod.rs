//! Device-facing playback: scheduling, simulated devices, analysis tap

mod scheduler;
mod sim;
mod sink;
mod tap;

pub use scheduler::{PlaybackScheduler, PlaybackState};
pub use sim::{Placement, PlacementLog, SimBackend, SimClock};
pub use sink::{AudioBackend, AudioOutput};
pub use tap::AnalysisTap;
