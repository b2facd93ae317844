use std::thread;
use std::time::Duration;
use sysinfo::System;

pub struct CpuMonitor {
    pub system: System,
    usage_threshold: f32,
}

impl CpuMonitor {
    #[must_use]
    pub fn new(usage_threshold: f32) -> Self {
        let mut system = System::new_all();
        system.refresh_cpu_all();
        thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL.max(Duration::from_millis(200)));
        system.refresh_cpu_all();
        Self {
            system,
            usage_threshold,
        }
    }

    pub fn current_usage(&mut self) -> f32 {
        self.system.refresh_cpu_all();
        self.system.global_cpu_usage()
    }

    pub fn is_overloaded(&mut self) -> bool {
        self.current_usage() >= self.usage_threshold
    }

    /// 依目前 CPU 閒置量建議的平行工作數（至少 1，最多 `max_workers`）
    pub fn suggested_workers(&mut self, max_workers: usize) -> usize {
        let cpus = self.system.cpus().len().max(1);
        let usage = self.current_usage();
        workers_for_load(cpus, usage, self.usage_threshold, max_workers)
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new(95.0)
    }
}

fn workers_for_load(cpus: usize, usage: f32, threshold: f32, max_workers: usize) -> usize {
    if usage >= threshold {
        return 1;
    }
    let idle_ratio = (1.0 - usage / 100.0).clamp(0.0, 1.0);
    let idle_cpus = (cpus as f32 * idle_ratio).floor() as usize;
    idle_cpus.clamp(1, max_workers.max(1))
}
