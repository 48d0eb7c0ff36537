// CPU sampler tests against a stat file on disk
#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use swaphud_core::metrics::{MetricsSampler, ProcStat};

    fn stat_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("swaphud-stat-{}-{}", std::process::id(), name))
    }

    fn write_ticks(path: &PathBuf, user: u64, nice: u64, system: u64, idle: u64) {
        let text = format!(
            "cpu  {} {} {} {} 0 0 0 0 0 0\ncpu0 {} {} {} {} 0 0 0 0 0 0\n",
            user, nice, system, idle, user, nice, system, idle
        );
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_percentage_between_two_reads() {
        let path = stat_file("delta");
        let mut sampler = MetricsSampler::new(ProcStat::with_path(&path));

        write_ticks(&path, 0, 0, 0, 100);
        assert_eq!(sampler.sample_cpu_percent(), 0.0);

        write_ticks(&path, 10, 0, 0, 190);
        let percent = sampler.sample_cpu_percent();
        std::fs::remove_file(&path).ok();
        assert!((percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unreadable_source_degrades() {
        let path = stat_file("vanishing");
        let mut sampler = MetricsSampler::new(ProcStat::with_path(&path));
        assert_eq!(sampler.sample_cpu_percent(), 0.0);

        write_ticks(&path, 0, 0, 0, 0);
        sampler.sample_cpu_percent();
        write_ticks(&path, 30, 0, 10, 60);
        let busy = sampler.sample_cpu_percent();
        assert!((busy - 40.0).abs() < 1e-9);

        std::fs::remove_file(&path).ok();
        assert_eq!(sampler.sample_cpu_percent(), busy);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_live_proc_stat() {
        let mut sampler = MetricsSampler::from_proc_stat();
        assert_eq!(sampler.sample_cpu_percent(), 0.0);
        let percent = sampler.sample_cpu_percent();
        assert!((0.0..=100.0).contains(&percent));
    }
}
