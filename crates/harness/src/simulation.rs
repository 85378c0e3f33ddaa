//! Sequential access simulation
//!
//! Setup, authorized phase, unauthorized phase, tamper check and aggregation
//! run strictly one after another; each trial completes before the next one
//! starts.

use crate::config::SimulationConfig;
use crate::context::SimulationContext;
use crate::errors::{Result, SimulationError};
use crate::metrics::{AccessAttempt, AttemptOutcome, Metrics, MetricsCollector};
use fileguard_access::ErrorKind;
use fileguard_content::IntegrityVerifier;
use fileguard_types::{Fingerprint, Identity};
use std::path::PathBuf;
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationPlan {
    pub trials: u64,
    pub warmup: u64,
    pub max_retained_latencies: usize,
    pub original_file: PathBuf,
    pub candidate_file: PathBuf,
}

impl From<&SimulationConfig> for SimulationPlan {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            trials: config.trials,
            warmup: config.warmup,
            max_retained_latencies: config.max_retained_latencies,
            original_file: config.original_file.clone(),
            candidate_file: config.candidate_file.clone(),
        }
    }
}

pub struct AccessSimulation {
    ctx: SimulationContext,
    plan: SimulationPlan,
}

impl AccessSimulation {
    pub fn new(ctx: SimulationContext, plan: SimulationPlan) -> Self {
        Self { ctx, plan }
    }

    pub fn plan(&self) -> &SimulationPlan {
        &self.plan
    }

    /// Store and register the original file, then grant the authorized user.
    ///
    /// Any failure here is fatal and returned with its cause.
    pub async fn setup(&self) -> Result<Fingerprint> {
        let participants = &self.ctx.participants;

        info!("uploading {} to the content store", self.plan.original_file.display());
        let fingerprint = self
            .ctx
            .store
            .store_file(&self.plan.original_file)
            .await
            .map_err(|err| SimulationError::setup("storing original file", err))?;
        info!(%fingerprint, "original file stored");

        self.ctx
            .contract
            .register_content(&participants.owner, fingerprint.as_str())
            .await
            .map_err(|err| SimulationError::setup("registering fingerprint", err))?;
        info!(%fingerprint, "fingerprint registered");

        self.ctx
            .contract
            .grant_access(&participants.owner, &participants.authorized)
            .await
            .map_err(|err| SimulationError::setup("granting access", err))?;
        info!(user = %participants.authorized, "access granted");

        match self.ctx.contract.is_authorized(&participants.authorized).await {
            Ok(status) => info!(user = %participants.authorized, status, "authorized status"),
            Err(err) => warn!("could not retrieve authorized status: {}", err),
        }

        Ok(fingerprint)
    }

    /// One timed `access_file` call.
    pub async fn attempt(&self, caller: &Identity) -> AccessAttempt {
        let started_at = SystemTime::now();
        let start = Instant::now();
        let result = self.ctx.contract.access_file(caller).await;
        let latency = start.elapsed();

        let outcome = match result {
            Ok(fingerprint) => {
                debug!(%caller, %fingerprint, ?latency, "access granted");
                AttemptOutcome::Granted {
                    latency,
                    fingerprint,
                }
            }
            Err(err) if err.kind() == ErrorKind::Transport => {
                warn!(%caller, "access attempt failed in transit: {}", err);
                AttemptOutcome::TransportError(err.to_string())
            }
            Err(err) => {
                debug!(%caller, "access denied: {}", err);
                AttemptOutcome::Denied
            }
        };

        AccessAttempt {
            caller: *caller,
            started_at,
            outcome,
        }
    }

    pub async fn run(&self) -> Result<Metrics> {
        let participants = self.ctx.participants;
        let original = self.setup().await?;
        let mut collector = MetricsCollector::new(self.plan.trials, self.plan.max_retained_latencies);

        for _ in 0..self.plan.warmup {
            self.attempt(&participants.authorized).await;
        }

        info!(trials = self.plan.trials, "authorized phase");
        for trial in 1..=self.plan.trials {
            let attempt = self.attempt(&participants.authorized).await;
            debug!(trial, outcome = ?attempt.outcome, "authorized trial");
            collector.record_authorized(&attempt);
        }
        if collector.latencies().count() == 0 {
            warn!("no authorized latency data recorded");
        }

        info!(trials = self.plan.trials, "unauthorized phase");
        for trial in 1..=self.plan.trials {
            let attempt = self.attempt(&participants.unauthorized).await;
            debug!(trial, outcome = ?attempt.outcome, "unauthorized trial");
            collector.record_unauthorized(&attempt);
        }

        let tampered = self.tamper_check(&original).await?;
        let metrics = collector.finish(tampered);
        info!(
            average = ?metrics.average_authorized_latency,
            blocked = metrics.blocked_unauthorized_attempts,
            attempts = metrics.unauthorized_attempts,
            tamper_detection = metrics.tamper_detection,
            "simulation complete"
        );
        Ok(metrics)
    }

    async fn tamper_check(&self, original: &Fingerprint) -> Result<bool> {
        info!(
            "checking {} against the registered fingerprint",
            self.plan.candidate_file.display()
        );
        let verifier = IntegrityVerifier::new(self.ctx.store.clone());
        Ok(verifier
            .detect_tampering_file(original, &self.plan.candidate_file)
            .await?)
    }
}
