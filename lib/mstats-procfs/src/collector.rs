/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;

use mstats::{Backend, Metric, StatsError, Tags};

use crate::{ProcLimits, ProcStat, ProcStatus};

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

struct ProcMetrics {
    threads: Metric,
    memory_rss: Metric,
    memory_vsize: Metric,
    fd_open: Metric,
    fd_max: Metric,
    cpu_user: Metric,
    cpu_system: Metric,
    ctx_voluntary: Metric,
    ctx_involuntary: Metric,
    faults_minor: Metric,
    faults_major: Metric,
}

impl ProcMetrics {
    fn new(tags: &Tags) -> Self {
        let m = |name: &str, help: &str| {
            Metric::new(name)
                .with_help(help)
                .with_tags(tags.clone())
        };
        ProcMetrics {
            threads: m("process.threads", "number of threads"),
            memory_rss: m("process.memory.rss", "resident set size in bytes"),
            memory_vsize: m("process.memory.vsize", "virtual memory size in bytes"),
            fd_open: m("process.fd.open", "number of open file descriptors"),
            fd_max: m("process.fd.max", "soft limit of open file descriptors"),
            cpu_user: m("process.cpu.user", "cpu time spent in user mode in seconds"),
            cpu_system: m("process.cpu.system", "cpu time spent in kernel mode in seconds"),
            ctx_voluntary: m("process.context_switches.voluntary", ""),
            ctx_involuntary: m("process.context_switches.involuntary", ""),
            faults_minor: m("process.faults.minor", ""),
            faults_major: m("process.faults.major", ""),
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Counters {
    utime: u64,
    stime: u64,
    ctx_voluntary: u64,
    ctx_involuntary: u64,
    faults_minor: u64,
    faults_major: u64,
}

impl Counters {
    fn new(status: &ProcStatus, stat: &ProcStat) -> Self {
        Counters {
            utime: stat.utime,
            stime: stat.stime,
            ctx_voluntary: status.voluntary_ctxt_switches,
            ctx_involuntary: status.nonvoluntary_ctxt_switches,
            faults_minor: stat.minor_faults,
            faults_major: stat.major_faults,
        }
    }
}

/// Reads the proc files of one process and reports them to a backend.
///
/// Gauges are set to the current value. Counters are added as the delta
/// since the previous collection, the first collection adds the totals
/// since the process started.
pub struct ProcCollector<B> {
    backend: B,
    dir: PathBuf,
    clock_ticks: u64,
    metrics: ProcMetrics,
    last: Counters,
}

impl<B: Backend> ProcCollector<B> {
    /// Collector for the current process.
    pub fn new(backend: B) -> Self {
        ProcCollector {
            backend,
            dir: Path::new(DEFAULT_PROC_ROOT).join("self"),
            clock_ticks: DEFAULT_CLOCK_TICKS,
            metrics: ProcMetrics::new(&Tags::default()),
            last: Counters::default(),
        }
    }

    pub fn with_pid(self, root: impl AsRef<Path>, pid: u32) -> Self {
        self.with_dir(root.as_ref().join(pid.to_string()))
    }

    pub fn with_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dir = dir.into();
        self.last = Counters::default();
        self
    }

    /// Ticks per second of utime and stime, as given by `sysconf(_SC_CLK_TCK)`.
    pub fn with_clock_ticks(mut self, ticks: u64) -> Self {
        if ticks > 0 {
            self.clock_ticks = ticks;
        }
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.metrics = ProcMetrics::new(&tags);
        self
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn collect(&mut self) -> anyhow::Result<()> {
        let status = ProcStatus::parse(&self.read("status")?)
            .context(format!("failed to parse {}/status", self.dir.display()))?;
        let limits = ProcLimits::parse(&self.read("limits")?)
            .context(format!("failed to parse {}/limits", self.dir.display()))?;
        let stat = ProcStat::parse(&self.read("stat")?)
            .context(format!("failed to parse {}/stat", self.dir.display()))?;
        let fd_open = self.count_fd()?;

        let counters = Counters::new(&status, &stat);
        let last = self.last;
        let ticks = self.clock_ticks as f64;
        let metrics = &self.metrics;
        let backend = &self.backend;

        let mut errors = Vec::new();
        let mut check = |r: Result<(), StatsError>| {
            if let Err(e) = r {
                errors.push(e);
            }
        };

        check(backend.set(&metrics.threads, status.threads as f64));
        check(backend.set(&metrics.memory_rss, status.vm_rss as f64));
        check(backend.set(&metrics.memory_vsize, status.vm_size as f64));
        check(backend.set(&metrics.fd_open, fd_open as f64));
        match limits.open_files().and_then(|l| l.soft) {
            Some(max) => check(backend.set(&metrics.fd_max, max as f64)),
            None => debug!("no open files limit for {}", self.dir.display()),
        }

        let delta = |now: u64, before: u64| now.saturating_sub(before);
        check(backend.add(
            &metrics.cpu_user,
            delta(counters.utime, last.utime) as f64 / ticks,
        ));
        check(backend.add(
            &metrics.cpu_system,
            delta(counters.stime, last.stime) as f64 / ticks,
        ));
        check(backend.add(
            &metrics.ctx_voluntary,
            delta(counters.ctx_voluntary, last.ctx_voluntary) as f64,
        ));
        check(backend.add(
            &metrics.ctx_involuntary,
            delta(counters.ctx_involuntary, last.ctx_involuntary) as f64,
        ));
        check(backend.add(
            &metrics.faults_minor,
            delta(counters.faults_minor, last.faults_minor) as f64,
        ));
        check(backend.add(
            &metrics.faults_major,
            delta(counters.faults_major, last.faults_major) as f64,
        ));

        self.last = counters;
        StatsError::from_errors(errors).context("failed to report process metrics")
    }

    fn read(&self, name: &str) -> anyhow::Result<String> {
        let path = self.dir.join(name);
        fs::read_to_string(&path).context(format!("failed to read {}", path.display()))
    }

    fn count_fd(&self) -> anyhow::Result<usize> {
        let path = self.dir.join("fd");
        let entries =
            fs::read_dir(&path).context(format!("failed to list {}", path.display()))?;
        let mut count = 0;
        for entry in entries {
            entry.context(format!("failed to list {}", path.display()))?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Record {
        values: Mutex<Vec<(String, &'static str, f64)>>,
    }

    impl Record {
        fn get(&self, name: &str) -> Vec<(&'static str, f64)> {
            self.values
                .lock()
                .unwrap()
                .iter()
                .filter(|(n, _, _)| n == name)
                .map(|(_, kind, v)| (*kind, *v))
                .collect()
        }
    }

    impl Backend for Record {
        fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
            let mut values = self.values.lock().unwrap();
            values.push((metric.name().to_string(), "set", value));
            Ok(())
        }

        fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
            let mut values = self.values.lock().unwrap();
            values.push((metric.name().to_string(), "add", value));
            Ok(())
        }

        fn observe(&self, _metric: &Metric, _value: Duration) -> Result<(), StatsError> {
            Ok(())
        }

        fn close(&self) -> Result<(), StatsError> {
            Ok(())
        }
    }

    fn fixture_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/proc")
    }

    #[test]
    fn collect_fixture() {
        let record = Arc::new(Record::default());
        let mut collector = ProcCollector::new(record.clone()).with_pid(fixture_root(), 4242);
        collector.collect().unwrap();

        assert_eq!(record.get("process.threads"), [("set", 9.0)]);
        assert_eq!(record.get("process.memory.rss"), [("set", 51200.0 * 1024.0)]);
        assert_eq!(record.get("process.memory.vsize"), [("set", 901120.0 * 1024.0)]);
        assert_eq!(record.get("process.fd.open"), [("set", 7.0)]);
        assert_eq!(record.get("process.fd.max"), [("set", 1024.0)]);
        assert_eq!(record.get("process.cpu.user"), [("add", 2.5)]);
        assert_eq!(record.get("process.cpu.system"), [("add", 1.3)]);
        assert_eq!(
            record.get("process.context_switches.voluntary"),
            [("add", 1500.0)]
        );
        assert_eq!(record.get("process.faults.major"), [("add", 7.0)]);

        // nothing changed between the two reads
        collector.collect().unwrap();
        assert_eq!(record.get("process.cpu.user"), [("add", 2.5), ("add", 0.0)]);
        assert_eq!(record.get("process.threads"), [("set", 9.0), ("set", 9.0)]);
    }

    #[test]
    fn clock_ticks() {
        let record = Arc::new(Record::default());
        let mut collector = ProcCollector::new(record.clone())
            .with_pid(fixture_root(), 4242)
            .with_clock_ticks(250);
        collector.collect().unwrap();
        assert_eq!(record.get("process.cpu.user"), [("add", 1.0)]);
    }

    #[test]
    fn missing_process() {
        let record = Arc::new(Record::default());
        let mut collector = ProcCollector::new(record.clone()).with_pid(fixture_root(), 1);
        let e = collector.collect().unwrap_err();
        assert!(e.to_string().starts_with("failed to read "));
        assert!(record.values.lock().unwrap().is_empty());
    }
}
