//! Search engine metrics with Prometheus text exposition

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Search performance metrics
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    /// Total number of searches served
    pub total_searches: u64,

    /// Searches that returned at least one issue
    pub matched_searches: u64,

    /// Searches that returned nothing
    pub empty_searches: u64,

    /// Total issues returned across all searches
    pub issues_returned: u64,

    /// Latency percentiles (p50, p90, p95, p99, p99.9)
    pub latency_p50_ms: f64,
    pub latency_p90_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
    pub latency_p999_ms: f64,

    /// Average latency
    pub avg_latency_ms: f64,

    /// Error count
    pub error_count: u64,
}

impl SearchMetrics {
    /// Fraction of searches that found at least one issue
    pub fn match_rate(&self) -> f64 {
        if self.total_searches == 0 {
            0.0
        } else {
            self.matched_searches as f64 / self.total_searches as f64
        }
    }
}

/// Metrics collector for the search engine
pub struct MetricsCollector {
    /// Metrics data
    metrics: Arc<RwLock<SearchMetrics>>,

    /// Latency samples for percentile calculation (ring buffer)
    latency_samples: Arc<RwLock<Vec<f64>>>,

    /// Maximum samples to keep
    max_samples: usize,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(SearchMetrics::default())),
            latency_samples: Arc::new(RwLock::new(Vec::with_capacity(10_000))),
            max_samples: 10_000,
        }
    }

    /// Record a completed search and how many issues it returned
    pub async fn record_search(&self, hits: usize) {
        let mut metrics = self.metrics.write().await;
        metrics.total_searches += 1;
        metrics.issues_returned += hits as u64;

        if hits > 0 {
            metrics.matched_searches += 1;
        } else {
            metrics.empty_searches += 1;
        }
    }

    /// Record search latency
    pub async fn record_latency(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut samples = self.latency_samples.write().await;
        samples.push(latency_ms);

        // Keep only recent samples
        if samples.len() > self.max_samples {
            samples.drain(0..1_000);
        }

        let mut metrics = self.metrics.write().await;

        let sum: f64 = samples.iter().sum();
        metrics.avg_latency_ms = sum / samples.len() as f64;

        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        metrics.latency_p50_ms = Self::percentile(&sorted, 0.50);
        metrics.latency_p90_ms = Self::percentile(&sorted, 0.90);
        metrics.latency_p95_ms = Self::percentile(&sorted, 0.95);
        metrics.latency_p99_ms = Self::percentile(&sorted, 0.99);
        metrics.latency_p999_ms = Self::percentile(&sorted, 0.999);
    }

    /// Record a failed search
    pub async fn record_error(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.error_count += 1;
    }

    /// Get current metrics snapshot
    pub async fn get_metrics(&self) -> SearchMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        let mut metrics = self.metrics.write().await;
        *metrics = SearchMetrics::default();

        let mut samples = self.latency_samples.write().await;
        samples.clear();
    }

    /// Export metrics in Prometheus format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read().await;

        format!(
            r#"# HELP faultline_searches_total Total number of user issue searches
# TYPE faultline_searches_total counter
faultline_searches_total {}

# HELP faultline_searches_matched_total Searches returning at least one issue
# TYPE faultline_searches_matched_total counter
faultline_searches_matched_total {}

# HELP faultline_searches_empty_total Searches returning no issues
# TYPE faultline_searches_empty_total counter
faultline_searches_empty_total {}

# HELP faultline_issues_returned_total Issues returned across all searches
# TYPE faultline_issues_returned_total counter
faultline_issues_returned_total {}

# HELP faultline_search_latency_seconds Search latency percentiles
# TYPE faultline_search_latency_seconds summary
faultline_search_latency_seconds{{quantile="0.5"}} {}
faultline_search_latency_seconds{{quantile="0.9"}} {}
faultline_search_latency_seconds{{quantile="0.95"}} {}
faultline_search_latency_seconds{{quantile="0.99"}} {}
faultline_search_latency_seconds{{quantile="0.999"}} {}

# HELP faultline_search_errors_total Error count
# TYPE faultline_search_errors_total counter
faultline_search_errors_total {}
"#,
            metrics.total_searches,
            metrics.matched_searches,
            metrics.empty_searches,
            metrics.issues_returned,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p90_ms / 1000.0,
            metrics.latency_p95_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
            metrics.latency_p999_ms / 1000.0,
            metrics.error_count,
        )
    }

    /// Calculate percentile from sorted data
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = ((sorted.len() as f64) * p) as usize;
        let idx = idx.min(sorted.len() - 1);
        sorted[idx]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
