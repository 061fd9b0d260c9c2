use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, OnceLock,
    },
    time::{Duration, Instant},
};

pub const REPORT_INTERVAL: u64 = 600;

/// Running totals per section since the last report.
#[derive(Default)]
pub struct SectionStats {
    sections: BTreeMap<&'static str, (Duration, u32)>,
}

impl SectionStats {
    pub fn record(&mut self, label: &'static str, duration: Duration) {
        let entry = self.sections.entry(label).or_insert((Duration::ZERO, 0));
        entry.0 += duration;
        entry.1 += 1;
    }

    pub fn average_ms(&self, label: &str) -> Option<f64> {
        self.sections
            .get(label)
            .filter(|(_, count)| *count > 0)
            .map(|(total, count)| total.as_secs_f64() * 1000.0 / *count as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// One line per report, sections in name order.
    pub fn summary(&self, frames: u64) -> String {
        let mut line = format!("[Profile] {frames} frames:");
        for label in self.sections.keys() {
            if let Some(avg) = self.average_ms(label) {
                line.push_str(&format!(" {label}={avg:.3}ms"));
            }
        }
        line
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

struct ProfilerInner {
    stats: Mutex<SectionStats>,
    frame_counter: AtomicU64,
}

static PROFILER: OnceLock<Arc<ProfilerInner>> = OnceLock::new();

#[derive(Clone)]
pub struct FrameCtx {
    inner: Arc<ProfilerInner>,
}

pub struct SectionGuard {
    inner: Arc<ProfilerInner>,
    label: &'static str,
    start: Instant,
}

impl Drop for SectionGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record(self.label, duration);
        }
    }
}

pub fn init_session() {
    if PROFILER.get().is_some() {
        return;
    }

    let inner = Arc::new(ProfilerInner {
        stats: Mutex::new(SectionStats::default()),
        frame_counter: AtomicU64::new(0),
    });

    let _ = PROFILER.set(inner);
}

/// Starts a frame. Every `REPORT_INTERVAL` frames the averages gathered so
/// far are printed and reset.
pub fn begin_frame() -> Option<FrameCtx> {
    PROFILER.get().map(|inner| {
        let frame_index = inner.frame_counter.fetch_add(1, Ordering::Relaxed);
        if frame_index > 0 && frame_index % REPORT_INTERVAL == 0 {
            if let Ok(mut stats) = inner.stats.lock() {
                if !stats.is_empty() {
                    println!("{}", stats.summary(REPORT_INTERVAL));
                }
                stats.clear();
            }
        }
        FrameCtx {
            inner: inner.clone(),
        }
    })
}

impl FrameCtx {
    pub fn section(&self, label: &'static str) -> SectionGuard {
        SectionGuard {
            inner: self.inner.clone(),
            label,
            start: Instant::now(),
        }
    }

    pub fn scope<F, R>(&self, label: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let guard = self.section(label);
        let result = f();
        drop(guard);
        result
    }
}

pub fn scope<F, R>(ctx: &Option<FrameCtx>, label: &'static str, f: F) -> R
where
    F: FnOnce() -> R,
{
    if let Some(frame) = ctx.as_ref() {
        frame.scope(label, f)
    } else {
        f()
    }
}
