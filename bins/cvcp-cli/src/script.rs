//! Replay scripts: a JSON list of registry calls executed in order.
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "submit", "caller": "0x01..", "at": 1700000000,
//!       "subject": "0x42..", "metrics": { "transaction_frequency": 25 } },
//!     { "op": "compute", "caller": "0x01..", "subject": "0x42.." }
//!   ]
//! }
//! ```
//!
//! A step without `at` runs at the current wall-clock time. A failing step
//! is reported and the script continues, as independent callers would.

use std::path::Path;

use anyhow::{Context, Result};
use cvcp_core::events::RegistryEvent;
use cvcp_core::types::{Address, BehavioralMetrics, CallContext};
use cvcp_registry::{MemoryEventLog, Registry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub caller: Address,
    /// Unix seconds; defaults to now.
    pub at: Option<u64>,
    /// Sequence number; defaults to the step's 1-based position.
    pub sequence: Option<u64>,
    #[serde(flatten)]
    pub call: Call,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    Submit {
        subject: Address,
        metrics: BehavioralMetrics,
    },
    Compute {
        subject: Address,
    },
    Batch {
        subjects: Vec<Address>,
    },
    Authorize {
        provider: Address,
    },
    Revoke {
        provider: Address,
    },
    SetInterval {
        secs: u64,
    },
    SetHistoryCap {
        cap: usize,
    },
    Pause,
    Unpause,
    Transfer {
        new_owner: Address,
    },
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Compute { .. } => "compute",
            Self::Batch { .. } => "batch",
            Self::Authorize { .. } => "authorize",
            Self::Revoke { .. } => "revoke",
            Self::SetInterval { .. } => "set_interval",
            Self::SetHistoryCap { .. } => "set_history_cap",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Transfer { .. } => "transfer",
        }
    }
}

/// One line of replay output.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<RegistryEvent>,
}

impl Script {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }

    /// Run every step against `registry`, collecting events from `log`.
    pub fn run(&self, registry: &mut Registry, log: &MemoryEventLog) -> Vec<StepOutcome> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let ctx = CallContext::new(
                    step.caller,
                    step.at.unwrap_or_else(now_secs),
                    step.sequence.unwrap_or(i as u64 + 1),
                );
                let outcome = execute(registry, &ctx, &step.call);
                let events = log.drain();
                match outcome {
                    Ok(result) => {
                        debug!(step = i, op = step.call.name(), "replay: step ok");
                        StepOutcome {
                            step: i,
                            op: step.call.name(),
                            result: Some(result),
                            error: None,
                            events,
                        }
                    }
                    Err(e) => {
                        warn!(step = i, op = step.call.name(), error = %e, "replay: step failed");
                        StepOutcome {
                            step: i,
                            op: step.call.name(),
                            result: None,
                            error: Some(e.to_string()),
                            events,
                        }
                    }
                }
            })
            .collect()
    }
}

fn execute(registry: &mut Registry, ctx: &CallContext, call: &Call) -> Result<Value> {
    let value = match call {
        Call::Submit { subject, metrics } => {
            json!({ "quality": registry.submit_metrics(ctx, *subject, *metrics)? })
        }
        Call::Compute { subject } => serde_json::to_value(registry.compute_score(ctx, *subject)?)?,
        Call::Batch { subjects } => serde_json::to_value(registry.batch_compute(ctx, subjects)?)?,
        Call::Authorize { provider } => {
            registry.authorize_provider(ctx, *provider)?;
            Value::Null
        }
        Call::Revoke { provider } => {
            registry.revoke_provider(ctx, *provider)?;
            Value::Null
        }
        Call::SetInterval { secs } => {
            registry.set_minimum_interval(ctx, *secs)?;
            Value::Null
        }
        Call::SetHistoryCap { cap } => {
            registry.set_history_cap(ctx, *cap)?;
            Value::Null
        }
        Call::Pause => {
            registry.pause(ctx)?;
            Value::Null
        }
        Call::Unpause => {
            registry.unpause(ctx)?;
            Value::Null
        }
        Call::Transfer { new_owner } => {
            registry.transfer_ownership(ctx, *new_owner)?;
            Value::Null
        }
    };
    Ok(value)
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
