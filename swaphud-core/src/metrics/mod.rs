//! Performance metrics
//!
//! Frame rate and system-wide CPU utilisation, sampled from inside the
//! intercepted presentation call.

pub mod cpu;
pub mod frame_rate;

pub use cpu::{CpuTickSource, CpuTicks, MetricsSampler, ProcStat};
pub use frame_rate::FrameRateCounter;
