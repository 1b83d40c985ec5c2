// Runner invocation with caller-enforced timeouts

use crate::config::Settings;
use crate::error::{Result, SvcherdError};
use crate::remote::models::{Operation, ServiceState};
use crate::remote::parser::parse_status_output;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

/// Raw result of one runner invocation
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub exit_ok: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
}

/// Opaque remote-execution transport: one invocation per call, an exit
/// status and captured output. Time limits are the caller's job, not the
/// transport's.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn invoke(
        &self,
        target: &str,
        services: &[String],
        operation: Operation,
    ) -> Result<TransportResponse>;
}

/// Production transport: spawns the configured automation runner against
/// the fixed inventory, one process per call
#[derive(Debug, Clone)]
pub struct PlaybookTransport {
    runner: String,
    status_playbook: PathBuf,
    restart_playbook: PathBuf,
    inventory: PathBuf,
}

impl PlaybookTransport {
    pub fn new(settings: &Settings) -> Self {
        Self {
            runner: settings.runner.clone(),
            status_playbook: settings.status_playbook.clone(),
            restart_playbook: settings.restart_playbook.clone(),
            inventory: settings.inventory.clone(),
        }
    }

    fn playbook_for(&self, operation: Operation) -> &Path {
        match operation {
            Operation::Status => &self.status_playbook,
            Operation::Restart => &self.restart_playbook,
        }
    }
}

#[async_trait]
impl CommandTransport for PlaybookTransport {
    async fn invoke(
        &self,
        target: &str,
        services: &[String],
        operation: Operation,
    ) -> Result<TransportResponse> {
        let services_payload = serde_json::json!({ "services": services }).to_string();

        tracing::debug!(
            "Invoking {} {} for {} ({} services)",
            self.runner,
            operation.label(),
            target,
            services.len()
        );

        // kill_on_drop so a call abandoned by the executor's timeout does
        // not leave the runner process behind
        let output = Command::new(&self.runner)
            .arg(self.playbook_for(operation))
            .arg("-i")
            .arg(&self.inventory)
            .arg("-e")
            .arg(format!("target_host={}", target))
            .arg("-e")
            .arg(services_payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SvcherdError::TransportFault {
                target: target.to_string(),
                message: format!("Failed to run '{}': {}", self.runner, e),
            })?;

        Ok(TransportResponse {
            exit_ok: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Leaf executor: one remote operation against one target, bounded by a
/// wall-clock timeout. No retry on any failure.
#[derive(Clone)]
pub struct CommandExecutor {
    transport: Arc<dyn CommandTransport>,
    status_timeout: Duration,
    restart_timeout: Duration,
}

impl CommandExecutor {
    pub fn new(
        transport: Arc<dyn CommandTransport>,
        status_timeout: Duration,
        restart_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            status_timeout,
            restart_timeout,
        }
    }

    /// Query the state of `services` on `target` in one runner call.
    ///
    /// Failures never propagate: a timeout marks every requested service
    /// `Timeout`, any other fault marks them `Error`. Services the runner
    /// does not mention are absent from the result; the aggregator maps
    /// absence to `Unknown`.
    pub async fn query_status(
        &self,
        target: &str,
        services: &[String],
    ) -> HashMap<String, ServiceState> {
        if target.is_empty() {
            return services
                .iter()
                .map(|s| (s.clone(), ServiceState::Error))
                .collect();
        }

        let call = self.transport.invoke(target, services, Operation::Status);
        match tokio::time::timeout(self.status_timeout, call).await {
            Ok(Ok(response)) => parse_status_output(&response.stdout),
            Ok(Err(e)) => {
                tracing::error!("Status query against {} failed: {}", target, e);
                services
                    .iter()
                    .map(|s| (s.clone(), ServiceState::Error))
                    .collect()
            }
            Err(_) => {
                tracing::error!("Status query against {} timed out", target);
                services
                    .iter()
                    .map(|s| (s.clone(), ServiceState::Timeout))
                    .collect()
            }
        }
    }

    /// Restart `services` on `target` in one runner call.
    ///
    /// Success is solely the runner's zero exit status; output content is
    /// not inspected.
    pub async fn run_restart(&self, target: &str, services: &[String]) -> Result<()> {
        if target.is_empty() || services.is_empty() {
            return Err(SvcherdError::TransportFault {
                target: target.to_string(),
                message: "Empty target or service scope".to_string(),
            }
            .into());
        }

        let call = self.transport.invoke(target, services, Operation::Restart);
        match tokio::time::timeout(self.restart_timeout, call).await {
            Ok(Ok(response)) if response.exit_ok => Ok(()),
            Ok(Ok(response)) => Err(SvcherdError::RemoteFailure {
                target: target.to_string(),
                code: response
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "killed".to_string()),
            }
            .into()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SvcherdError::TransportTimeout {
                target: target.to_string(),
            }
            .into()),
        }
    }
}
