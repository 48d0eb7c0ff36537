//! CPU utilisation sampling
//!
//! Reads the aggregate tick counters of the kernel (`/proc/stat` on Linux) and
//! reports the busy percentage between two consecutive samples.

use crate::error::MetricsError;
use std::path::PathBuf;

/// Raw tick counters of the aggregate `cpu` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTicks {
    pub fn new(user: u64, nice: u64, system: u64, idle: u64) -> Self {
        Self {
            user,
            nice,
            system,
            idle,
        }
    }
}

/// Anything that can produce the current tick counters.
pub trait CpuTickSource {
    fn read_ticks(&mut self) -> Result<CpuTicks, MetricsError>;
}

/// Tick source backed by the kernel's `/proc/stat`.
#[derive(Debug, Clone)]
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    pub fn new() -> Self {
        Self::with_path("/proc/stat")
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcStat {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTickSource for ProcStat {
    fn read_ticks(&mut self) -> Result<CpuTicks, MetricsError> {
        let contents = std::fs::read_to_string(&self.path)?;
        parse_proc_stat(&contents)
    }
}

/// Parse the aggregate `cpu` line (`cpu  user nice system idle ...`).
pub fn parse_proc_stat(contents: &str) -> Result<CpuTicks, MetricsError> {
    let line = contents
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| MetricsError::Malformed("no aggregate cpu line".to_string()))?;

    let mut fields = line.split_whitespace().skip(1).map(|f| {
        f.parse::<u64>()
            .map_err(|_| MetricsError::Malformed(format!("bad tick count '{}'", f)))
    });
    let mut next = || {
        fields
            .next()
            .unwrap_or_else(|| Err(MetricsError::Malformed("truncated cpu line".to_string())))
    };

    Ok(CpuTicks {
        user: next()?,
        nice: next()?,
        system: next()?,
        idle: next()?,
    })
}

/// Computes the busy percentage since the previous call.
///
/// Holds the last raw counters; the first call has nothing to compare with
/// and reports 0.
pub struct MetricsSampler<S = ProcStat> {
    source: S,
    previous: Option<CpuTicks>,
    last_percent: f64,
}

impl MetricsSampler<ProcStat> {
    pub fn from_proc_stat() -> Self {
        Self::new(ProcStat::new())
    }
}

impl<S: CpuTickSource> MetricsSampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            previous: None,
            last_percent: 0.0,
        }
    }

    /// Sample the source and return `100 × (1 − idle_delta / total_delta)`.
    ///
    /// Returns 0 on the first call and when no tick elapsed. A failed read
    /// returns the previous reading and leaves the stored counters untouched.
    pub fn sample_cpu_percent(&mut self) -> f64 {
        let current = match self.source.read_ticks() {
            Ok(ticks) => ticks,
            Err(e) => {
                log::debug!("CPU sample failed, keeping previous value: {}", e);
                return self.last_percent;
            }
        };

        let percent = match self.previous.replace(current) {
            None => 0.0,
            Some(previous) => busy_percent(previous, current),
        };
        self.last_percent = percent;
        percent
    }
}

fn busy_percent(previous: CpuTicks, current: CpuTicks) -> f64 {
    let delta = |now: u64, before: u64| now.saturating_sub(before);
    let idle_delta = delta(current.idle, previous.idle);
    let total_delta = delta(current.user, previous.user)
        + delta(current.nice, previous.nice)
        + delta(current.system, previous.system)
        + idle_delta;

    if total_delta == 0 {
        return 0.0;
    }
    100.0 * (1.0 - idle_delta as f64 / total_delta as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<CpuTicks, MetricsError>>);

    impl CpuTickSource for Scripted {
        fn read_ticks(&mut self) -> Result<CpuTicks, MetricsError> {
            self.0
                .pop_front()
                .unwrap_or_else(|| Err(MetricsError::Malformed("exhausted".into())))
        }
    }

    fn sampler(samples: Vec<Result<CpuTicks, MetricsError>>) -> MetricsSampler<Scripted> {
        MetricsSampler::new(Scripted(samples.into()))
    }

    #[test]
    fn first_sample_reports_zero() {
        let mut s = sampler(vec![Ok(CpuTicks::new(500, 20, 300, 10_000))]);
        assert_eq!(s.sample_cpu_percent(), 0.0);
    }

    #[test]
    fn delta_between_samples() {
        let mut s = sampler(vec![
            Ok(CpuTicks::new(0, 0, 0, 100)),
            Ok(CpuTicks::new(10, 0, 0, 190)),
        ]);
        assert_eq!(s.sample_cpu_percent(), 0.0);
        let percent = s.sample_cpu_percent();
        assert!((percent - 10.0).abs() < 1e-9, "got {}", percent);
    }

    #[test]
    fn no_elapsed_ticks_reports_zero() {
        let t = CpuTicks::new(5, 5, 5, 5);
        let mut s = sampler(vec![Ok(t), Ok(CpuTicks::new(9, 1, 2, 3)), Ok(CpuTicks::new(9, 1, 2, 3))]);
        s.sample_cpu_percent();
        s.sample_cpu_percent();
        assert_eq!(s.sample_cpu_percent(), 0.0);
    }

    #[test]
    fn read_failure_keeps_previous_reading() {
        let mut s = sampler(vec![
            Ok(CpuTicks::new(0, 0, 0, 0)),
            Ok(CpuTicks::new(50, 0, 0, 50)),
            Err(MetricsError::Malformed("gone".into())),
            Ok(CpuTicks::new(50, 0, 0, 150)),
        ]);
        assert_eq!(s.sample_cpu_percent(), 0.0);
        assert_eq!(s.sample_cpu_percent(), 50.0);
        assert_eq!(s.sample_cpu_percent(), 50.0);
        // Compared against the last good counters, not the failed read.
        assert_eq!(s.sample_cpu_percent(), 0.0);
    }

    #[test]
    fn counter_regression_does_not_underflow() {
        let mut s = sampler(vec![
            Ok(CpuTicks::new(100, 0, 0, 100)),
            Ok(CpuTicks::new(50, 0, 0, 200)),
        ]);
        s.sample_cpu_percent();
        assert_eq!(s.sample_cpu_percent(), 0.0);
    }

    #[test]
    fn parses_proc_stat_aggregate_line() {
        let text = "cpu  4705 356 584 3699 23 23 0 0 0 0\ncpu0 1393 280 291 3006 7 23 0 0 0 0\nintr 114930548\n";
        let ticks = parse_proc_stat(text).unwrap();
        assert_eq!(ticks, CpuTicks::new(4705, 356, 584, 3699));
    }

    #[test]
    fn rejects_truncated_or_garbled_lines() {
        assert!(parse_proc_stat("cpu 1 2 3").is_err());
        assert!(parse_proc_stat("cpu 1 x 3 4").is_err());
        assert!(parse_proc_stat("intr 5\n").is_err());
    }
}
