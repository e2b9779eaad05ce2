#[cfg(feature = "cli")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, RefreshKind, System};

/// 某個批次階段結束時的資源快照
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseSnapshot {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub memory_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: Mutex<System>,
    pid: Pid,
    peak_memory_mb: AtomicU64,
}

#[cfg(feature = "cli")]
impl Sampler {
    fn start() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Could not determine current PID, system stats disabled: {}", e);
                return None;
            }
        };

        let mut system = System::new_with_specifics(RefreshKind::nothing());
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        Some(Self {
            system: Mutex::new(system),
            pid,
            peak_memory_mb: AtomicU64::new(0),
        })
    }

    fn sample(&self, elapsed: Duration) -> Option<PhaseSnapshot> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_mb = system.total_memory() / 1024 / 1024;
        let memory_percent = if total_mb > 0 {
            memory_mb as f32 / total_mb as f32 * 100.0
        } else {
            0.0
        };

        let previous_peak = self.peak_memory_mb.fetch_max(memory_mb, Ordering::Relaxed);

        Some(PhaseSnapshot {
            cpu_usage: process.cpu_usage(),
            memory_mb,
            memory_percent,
            peak_memory_mb: previous_peak.max(memory_mb),
            elapsed,
        })
    }
}

/// 批次各階段的 CPU / 記憶體紀錄，停用時不取樣
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Sampler>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            sampler: if enabled { Sampler::start() } else { None },
            start_time: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn snapshot(&self) -> Option<PhaseSnapshot> {
        self.sampler.as_ref()?.sample(self.start_time.elapsed())
    }

    /// `images` 是該階段結束時已知的圖片數
    pub fn log_phase(&self, phase: &str, images: usize) {
        if let Some(snap) = self.snapshot() {
            tracing::info!(
                "📊 {} ({} images) - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                phase,
                images,
                snap.cpu_usage,
                snap.memory_mb,
                snap.memory_percent,
                snap.peak_memory_mb,
                snap.elapsed
            );
        }
    }

    pub fn log_summary(&self, processed: usize, total: usize) {
        if let Some(snap) = self.snapshot() {
            tracing::info!(
                "📊 Batch summary - {}/{} images in {:?} ({:?} per image), Peak Memory: {}MB",
                processed,
                total,
                snap.elapsed,
                per_image(snap.elapsed, total),
                snap.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(feature = "cli")]
fn per_image(elapsed: Duration, total: usize) -> Duration {
    match u32::try_from(total) {
        Ok(n) if n > 0 => elapsed / n,
        _ => elapsed,
    }
}

// 非 CLI 環境沒有 sysinfo
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_phase(&self, _phase: &str, _images: usize) {}

    pub fn log_summary(&self, _processed: usize, _total: usize) {}
}
