//! Prometheus metrics for the launch pipeline

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Counters shared by the ledger, the bootstrap coordinator and the API.
/// Each instance owns its registry so several services can coexist in tests.
pub struct LaunchMetrics {
    registry: Registry,
    pub pledges_submitted: IntCounterVec,
    pub pledges_withdrawn: IntCounterVec,
    pub threshold_triggers: IntCounter,
    pub approvals: IntCounter,
    pub bootstrap_steps: IntCounterVec,
    pub bootstraps_in_flight: IntGauge,
    pub launches_completed: IntCounter,
}

impl LaunchMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("coinfluence".to_string()), None)?;

        let pledges_submitted = IntCounterVec::new(
            Opts::new("pledges_submitted_total", "Pledges accepted by the ledger"),
            &["currency"],
        )?;
        let pledges_withdrawn = IntCounterVec::new(
            Opts::new("pledges_withdrawn_total", "Pledges withdrawn before launch"),
            &["currency"],
        )?;
        let threshold_triggers = IntCounter::new(
            "threshold_triggers_total",
            "Launches promoted from Collecting to ThresholdMet",
        )?;
        let approvals = IntCounter::new("approvals_total", "Launches approved by an admin")?;
        let bootstrap_steps = IntCounterVec::new(
            Opts::new("bootstrap_steps_total", "Liquidity bootstrap step outcomes"),
            &["step", "outcome"],
        )?;
        let bootstraps_in_flight = IntGauge::new(
            "bootstraps_in_flight",
            "Liquidity bootstraps currently running",
        )?;
        let launches_completed = IntCounter::new("launches_completed_total", "Launches that reached Launched")?;

        registry.register(Box::new(pledges_submitted.clone()))?;
        registry.register(Box::new(pledges_withdrawn.clone()))?;
        registry.register(Box::new(threshold_triggers.clone()))?;
        registry.register(Box::new(approvals.clone()))?;
        registry.register(Box::new(bootstrap_steps.clone()))?;
        registry.register(Box::new(bootstraps_in_flight.clone()))?;
        registry.register(Box::new(launches_completed.clone()))?;

        Ok(Self {
            registry,
            pledges_submitted,
            pledges_withdrawn,
            threshold_triggers,
            approvals,
            bootstrap_steps,
            bootstraps_in_flight,
            launches_completed,
        })
    }

    pub fn record_step(&self, step: &str, outcome: &str) {
        self.bootstrap_steps.with_label_values(&[step, outcome]).inc();
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
