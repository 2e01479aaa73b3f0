use hazard::{Evidence, HazardVerdict};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Verdicts by evidence
    relation_verdicts: AtomicUsize,
    emotion_verdicts: AtomicUsize,
    no_signal_verdicts: AtomicUsize,
    danger_verdicts: AtomicUsize,

    // NLU calls (timing in microseconds)
    nlu_calls: AtomicUsize,
    cache_hits: AtomicUsize,
    total_nlu_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            relation_verdicts: AtomicUsize::new(0),
            emotion_verdicts: AtomicUsize::new(0),
            no_signal_verdicts: AtomicUsize::new(0),
            danger_verdicts: AtomicUsize::new(0),
            nlu_calls: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            total_nlu_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_nlu_call(&self, duration: std::time::Duration) {
        self.nlu_calls.fetch_add(1, Ordering::Relaxed);
        self.total_nlu_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verdict(&self, verdict: &HazardVerdict) {
        let counter = match verdict.evidence {
            Evidence::Relation => &self.relation_verdicts,
            Evidence::Emotion => &self.emotion_verdicts,
            Evidence::None => &self.no_signal_verdicts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if verdict.is_danger() {
            self.danger_verdicts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            relation_verdicts: self.relation_verdicts.load(Ordering::Relaxed),
            emotion_verdicts: self.emotion_verdicts.load(Ordering::Relaxed),
            no_signal_verdicts: self.no_signal_verdicts.load(Ordering::Relaxed),
            danger_verdicts: self.danger_verdicts.load(Ordering::Relaxed),
            nlu_calls: self.nlu_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            avg_nlu_time_ms: self.avg_time_ms(&self.total_nlu_time_us, &self.nlu_calls),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        let cnt = count.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0 // Convert to ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub relation_verdicts: usize,
    pub emotion_verdicts: usize,
    pub no_signal_verdicts: usize,
    pub danger_verdicts: usize,
    pub nlu_calls: usize,
    pub cache_hits: usize,
    pub avg_nlu_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
