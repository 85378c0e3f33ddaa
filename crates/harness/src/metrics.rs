//! Trial accounting and the metrics artifact.

use fileguard_types::{Fingerprint, Identity};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Result of one `access_file` call.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Granted {
        latency: Duration,
        fingerprint: Fingerprint,
    },
    Denied,
    /// The round-trip failed before the contract answered.
    TransportError(String),
}

#[derive(Debug, Clone)]
pub struct AccessAttempt {
    pub caller: Identity,
    pub started_at: SystemTime,
    pub outcome: AttemptOutcome,
}

/// Nearest-rank percentile over an ascending slice. `p` is in `(0, 1]`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = rank.max(1) - 1;
    Some(sorted[idx.min(sorted.len() - 1)])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Latency accumulator with a cap on retained raw samples.
///
/// Count, sum, min and max cover every sample; only the first `capacity`
/// samples are kept for the raw sequence and percentiles. At least one
/// sample is always kept.
#[derive(Debug, Clone)]
pub struct LatencyRecorder {
    retained: Vec<f64>,
    capacity: usize,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    dropped: u64,
}

impl LatencyRecorder {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            retained: Vec::with_capacity(capacity.min(4096)),
            capacity,
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            dropped: 0,
        }
    }

    pub fn record(&mut self, latency: Duration) {
        let secs = latency.as_secs_f64();
        self.count += 1;
        self.sum += secs;
        self.min = self.min.min(secs);
        self.max = self.max.max(secs);
        if self.retained.len() < self.capacity {
            self.retained.push(secs);
        } else {
            self.dropped += 1;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn samples(&self) -> &[f64] {
        &self.retained
    }

    /// Mean over every recorded sample; `None` when nothing was recorded.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn summary(&self) -> Option<LatencySummary> {
        if self.count == 0 {
            return None;
        }
        let mut sorted = self.retained.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(LatencySummary {
            min: self.min,
            max: self.max,
            p50: percentile(&sorted, 0.50)?,
            p95: percentile(&sorted, 0.95)?,
            p99: percentile(&sorted, 0.99)?,
        })
    }
}

/// Metrics artifact written at the end of a run.
///
/// The first five fields keep the names downstream tooling already reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub authorized_latencies: Vec<f64>,
    pub average_authorized_latency: Option<f64>,
    pub unauthorized_attempts: u64,
    pub blocked_unauthorized_attempts: u64,
    pub tamper_detection: bool,
    pub latency_summary: Option<LatencySummary>,
    pub authorized_failures: u64,
    pub authorized_transport_errors: u64,
    pub unauthorized_transport_errors: u64,
    pub dropped_latency_samples: u64,
    pub trials: u64,
}

/// Folds access attempts into counters as the phases run.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    latencies: LatencyRecorder,
    trials: u64,
    authorized_failures: u64,
    authorized_transport_errors: u64,
    unauthorized_attempts: u64,
    blocked_unauthorized_attempts: u64,
    unauthorized_transport_errors: u64,
}

impl MetricsCollector {
    pub fn new(trials: u64, max_retained_latencies: usize) -> Self {
        Self {
            latencies: LatencyRecorder::new(max_retained_latencies),
            trials,
            authorized_failures: 0,
            authorized_transport_errors: 0,
            unauthorized_attempts: 0,
            blocked_unauthorized_attempts: 0,
            unauthorized_transport_errors: 0,
        }
    }

    /// Only successful reads contribute a latency.
    pub fn record_authorized(&mut self, attempt: &AccessAttempt) {
        match &attempt.outcome {
            AttemptOutcome::Granted { latency, .. } => self.latencies.record(*latency),
            AttemptOutcome::Denied => self.authorized_failures += 1,
            AttemptOutcome::TransportError(_) => self.authorized_transport_errors += 1,
        }
    }

    /// Every attempt counts; anything but a successful read counts as blocked.
    pub fn record_unauthorized(&mut self, attempt: &AccessAttempt) {
        self.unauthorized_attempts += 1;
        match &attempt.outcome {
            AttemptOutcome::Granted { .. } => {}
            AttemptOutcome::Denied => self.blocked_unauthorized_attempts += 1,
            AttemptOutcome::TransportError(_) => {
                self.blocked_unauthorized_attempts += 1;
                self.unauthorized_transport_errors += 1;
            }
        }
    }

    pub fn latencies(&self) -> &LatencyRecorder {
        &self.latencies
    }

    pub fn finish(self, tamper_detection: bool) -> Metrics {
        Metrics {
            average_authorized_latency: self.latencies.average(),
            latency_summary: self.latencies.summary(),
            dropped_latency_samples: self.latencies.dropped(),
            authorized_latencies: self.latencies.retained,
            unauthorized_attempts: self.unauthorized_attempts,
            blocked_unauthorized_attempts: self.blocked_unauthorized_attempts,
            tamper_detection,
            authorized_failures: self.authorized_failures,
            authorized_transport_errors: self.authorized_transport_errors,
            unauthorized_transport_errors: self.unauthorized_transport_errors,
            trials: self.trials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(outcome: AttemptOutcome) -> AccessAttempt {
        AccessAttempt {
            caller: Identity::account(1),
            started_at: SystemTime::now(),
            outcome,
        }
    }

    fn granted(ms: u64) -> AccessAttempt {
        attempt(AttemptOutcome::Granted {
            latency: Duration::from_millis(ms),
            fingerprint: Fingerprint::new("Qm123").unwrap(),
        })
    }

    #[test]
    fn test_nearest_rank_percentile() {
        let sorted: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&sorted, 0.50), Some(50.0));
        assert_eq!(percentile(&sorted, 0.95), Some(95.0));
        assert_eq!(percentile(&sorted, 0.99), Some(99.0));
        assert_eq!(percentile(&[3.0], 0.99), Some(3.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn test_empty_latencies_have_no_average() {
        let collector = MetricsCollector::new(5, 10);
        let metrics = collector.finish(false);
        assert!(metrics.authorized_latencies.is_empty());
        assert_eq!(metrics.average_authorized_latency, None);
        assert_eq!(metrics.latency_summary, None);
    }

    #[test]
    fn test_retention_cap_keeps_exact_average() {
        let mut recorder = LatencyRecorder::new(2);
        for ms in [10, 20, 30, 40] {
            recorder.record(Duration::from_millis(ms));
        }
        assert_eq!(recorder.samples().len(), 2);
        assert_eq!(recorder.dropped(), 2);
        assert_eq!(recorder.count(), 4);

        let average = recorder.average().unwrap();
        assert!((average - 0.025).abs() < 1e-9);
        let summary = recorder.summary().unwrap();
        assert!((summary.max - 0.040).abs() < 1e-9);
        assert!((summary.min - 0.010).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_still_summarizes() {
        let mut recorder = LatencyRecorder::new(0);
        recorder.record(Duration::from_millis(5));
        recorder.record(Duration::from_millis(7));

        assert!(recorder.average().is_some());
        let summary = recorder.summary().unwrap();
        assert!((summary.p50 - 0.005).abs() < 1e-9);
        assert!((summary.max - 0.007).abs() < 1e-9);
        assert_eq!(recorder.dropped(), 1);
    }

    #[test]
    fn test_outcomes_are_counted_per_phase() {
        let mut collector = MetricsCollector::new(3, 100);
        collector.record_authorized(&granted(5));
        collector.record_authorized(&attempt(AttemptOutcome::Denied));
        collector.record_authorized(&attempt(AttemptOutcome::TransportError("reset".into())));

        collector.record_unauthorized(&attempt(AttemptOutcome::Denied));
        collector.record_unauthorized(&attempt(AttemptOutcome::TransportError("reset".into())));
        collector.record_unauthorized(&granted(1));

        let metrics = collector.finish(true);
        assert_eq!(metrics.authorized_latencies.len(), 1);
        assert_eq!(metrics.authorized_failures, 1);
        assert_eq!(metrics.authorized_transport_errors, 1);
        assert_eq!(metrics.unauthorized_attempts, 3);
        assert_eq!(metrics.blocked_unauthorized_attempts, 2);
        assert_eq!(metrics.unauthorized_transport_errors, 1);
        assert!(metrics.tamper_detection);
    }

    #[test]
    fn test_artifact_field_names() {
        let metrics = MetricsCollector::new(0, 10).finish(false);
        let value = serde_json::to_value(&metrics).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "authorized_latencies",
            "average_authorized_latency",
            "unauthorized_attempts",
            "blocked_unauthorized_attempts",
            "tamper_detection",
            "latency_summary",
            "dropped_latency_samples",
            "trials",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert!(object["average_authorized_latency"].is_null());
    }
}
