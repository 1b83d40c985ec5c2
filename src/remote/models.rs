// Remote service data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operation kinds the runner performs against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Status,
    Restart,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Status => "status",
            Operation::Restart => "restart",
        }
    }
}

/// Execution policy for a restart run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// All targets at once; minimizes the total downtime window
    Parallel,
    /// One service at a time with a cooldown; limits blast radius
    Sequential,
}

impl Policy {
    pub fn label(&self) -> &'static str {
        match self {
            Policy::Parallel => "parallel",
            Policy::Sequential => "sequential",
        }
    }
}

/// Observed state of one remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Running,
    Stopped,
    /// Any other textual state reported by the remote service manager
    Other(String),
    /// The runner produced output but never mentioned this service
    Unknown,
    /// The status call itself exceeded its time limit
    Timeout,
    /// The status call failed before producing usable output
    Error,
}

impl ServiceState {
    /// Map a raw state word from runner output to a state.
    /// "started" is what the Windows service manager reports for some
    /// services that the original tooling treats as running.
    pub fn from_raw(word: &str) -> Self {
        match word.to_lowercase().as_str() {
            "running" | "started" => ServiceState::Running,
            "stopped" => ServiceState::Stopped,
            other => ServiceState::Other(other.to_string()),
        }
    }

    /// Returns true if the service is confirmed running
    pub fn is_running(&self) -> bool {
        matches!(self, ServiceState::Running)
    }

    /// Returns true for executor-level failures, as opposed to a genuine
    /// remote state like Stopped
    pub fn is_failure(&self) -> bool {
        matches!(self, ServiceState::Timeout | ServiceState::Error)
    }

    /// User-friendly state label
    pub fn status_text(&self) -> String {
        match self {
            ServiceState::Running => "Running".to_string(),
            ServiceState::Stopped => "Stopped".to_string(),
            ServiceState::Other(word) => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            ServiceState::Unknown => "Unknown".to_string(),
            ServiceState::Timeout => "Timeout".to_string(),
            ServiceState::Error => "Error".to_string(),
        }
    }

    /// Status glyph for display
    pub fn glyph(&self) -> &'static str {
        match self {
            ServiceState::Running => "●",
            ServiceState::Stopped => "○",
            ServiceState::Other(_) => "◐",
            ServiceState::Unknown => "?",
            ServiceState::Timeout => "✗",
            ServiceState::Error => "✗",
        }
    }
}

/// Complete point-in-time status of every service in a group.
///
/// Replaced wholesale on each refresh; a partial result is never merged
/// into an older snapshot.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// hostname -> service name -> state
    pub states: HashMap<String, HashMap<String, ServiceState>>,
    pub captured_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn new(states: HashMap<String, HashMap<String, ServiceState>>) -> Self {
        Self {
            states,
            captured_at: Utc::now(),
        }
    }

    /// State for one (target, service) pair; Unknown if the pair was never
    /// recorded (callers that go through the aggregator will not hit this)
    pub fn state(&self, hostname: &str, service: &str) -> ServiceState {
        self.states
            .get(hostname)
            .and_then(|services| services.get(service))
            .cloned()
            .unwrap_or(ServiceState::Unknown)
    }

    /// Total number of recorded (target, service) entries
    pub fn entry_count(&self) -> usize {
        self.states.values().map(|services| services.len()).sum()
    }
}

/// Result of one restart attempt against one unit of work
#[derive(Debug, Clone)]
pub struct RestartOutcome {
    pub hostname: String,
    /// None for a whole-target batch restart
    pub service: Option<String>,
    pub succeeded: bool,
    /// Failure detail for summaries and the audit trail
    pub detail: Option<String>,
}

/// All outcomes of one restart execution, handed to the caller by value
#[derive(Debug)]
pub struct RestartRun {
    pub policy: Policy,
    pub outcomes: Vec<RestartOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RestartRun {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn fully_successful(&self) -> bool {
        self.success_count() == self.total()
    }

    /// "ok/total" ratio for operator-facing summaries
    pub fn summary(&self) -> String {
        format!("{}/{}", self.success_count(), self.total())
    }
}
