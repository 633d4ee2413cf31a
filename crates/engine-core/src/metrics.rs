use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    steps: AtomicU64,
    records_fetched: AtomicU64,
    out_of_sync: AtomicU64,
    refreshes: AtomicU64,
    recalculations: AtomicU64,
}

/// Cursor activity counters, shared by every clone.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub steps: u64,
    pub records_fetched: u64,
    pub out_of_sync: u64,
    pub refreshes: u64,
    pub recalculations: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_steps(&self, count: u64) {
        self.inner.steps.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_records_fetched(&self, count: u64) {
        self.inner
            .records_fetched
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_out_of_sync(&self, count: u64) {
        self.inner.out_of_sync.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_refreshes(&self, count: u64) {
        self.inner.refreshes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_recalculations(&self, count: u64) {
        self.inner
            .recalculations
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            steps: self.inner.steps.load(Ordering::Relaxed),
            records_fetched: self.inner.records_fetched.load(Ordering::Relaxed),
            out_of_sync: self.inner.out_of_sync.load(Ordering::Relaxed),
            refreshes: self.inner.refreshes.load(Ordering::Relaxed),
            recalculations: self.inner.recalculations.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let other = metrics.clone();
        metrics.increment_steps(2);
        other.increment_records_fetched(10);
        other.increment_out_of_sync(1);

        let snap = metrics.snapshot();
        assert_eq!(snap.steps, 2);
        assert_eq!(snap.records_fetched, 10);
        assert_eq!(snap.out_of_sync, 1);
        assert_eq!(snap.refreshes, 0);
    }
}
