// Restart orchestration under parallel and sequential policies

use crate::config::Group;
use crate::error::{Result, SvcherdError};
use crate::remote::audit::{AuditEvent, AuditLog};
use crate::remote::models::{Policy, RestartOutcome, RestartRun};
use crate::remote::pool::WorkerPool;
use crate::remote::transport::CommandExecutor;
use crate::session::Operator;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// One unit of sequential work: a single service on a single target
#[derive(Debug, Clone)]
pub struct RestartUnit {
    pub hostname: String,
    pub target_display: String,
    pub service: String,
    pub service_display: String,
}

/// Flatten a group into (target, service) units, preserving
/// target-then-service order from the static topology
pub fn flatten_units(group: &Group) -> Vec<RestartUnit> {
    let mut units = Vec::with_capacity(group.service_total());
    for target in &group.targets {
        for service in &target.services {
            units.push(RestartUnit {
                hostname: target.hostname.clone(),
                target_display: target.display_name.clone(),
                service: service.name.clone(),
                service_display: service.display_name.clone(),
            });
        }
    }
    units
}

/// Progress notifications emitted while a run executes, for live display
#[derive(Debug, Clone)]
pub enum RunProgress {
    UnitStarted {
        target_display: String,
        service_display: Option<String>,
    },
    UnitFinished {
        target_display: String,
        service_display: Option<String>,
        succeeded: bool,
    },
    CoolingDown {
        seconds: u64,
        completed: usize,
        total: usize,
    },
}

/// Executes restarts across a group under one of two policies, producing
/// exactly one outcome per unit of work.
pub struct RestartOrchestrator {
    executor: CommandExecutor,
    pool: WorkerPool,
    audit: Arc<AuditLog>,
    cooldown: Duration,
}

impl RestartOrchestrator {
    pub fn new(
        executor: CommandExecutor,
        pool: WorkerPool,
        audit: Arc<AuditLog>,
        cooldown: Duration,
    ) -> Self {
        Self {
            executor,
            pool,
            audit,
            cooldown,
        }
    }

    /// Execute a restart run over the whole group.
    ///
    /// Rejects unauthorized operators before any remote call. Individual
    /// unit failures are captured into their outcomes and never abort the
    /// rest of the run. The run itself is not classified; callers surface
    /// the success/total ratio.
    pub async fn run(
        &self,
        group: &Group,
        policy: Policy,
        operator: &Operator,
        progress: Option<mpsc::Sender<RunProgress>>,
    ) -> Result<RestartRun> {
        if !operator.authorized {
            self.audit
                .record(&AuditEvent::auth(&operator.identity, &group.name, false));
            return Err(SvcherdError::Unauthorized {
                actor: operator.identity.clone(),
            }
            .into());
        }

        self.audit
            .record(&AuditEvent::auth(&operator.identity, &group.name, true));
        tracing::info!(
            "Starting {} restart of group '{}' for {}",
            policy.label(),
            group.id,
            operator.identity
        );

        let started_at = Utc::now();
        let outcomes = match policy {
            Policy::Parallel => self.run_parallel(group, operator, &progress).await,
            Policy::Sequential => self.run_sequential(group, operator, &progress).await,
        };

        Ok(RestartRun {
            policy,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// One batched restart call per target, all targets concurrently under
    /// the shared pool. Completion order is not defined.
    async fn run_parallel(
        &self,
        group: &Group,
        operator: &Operator,
        progress: &Option<mpsc::Sender<RunProgress>>,
    ) -> Vec<RestartOutcome> {
        let (tx, mut rx) = mpsc::channel(group.targets.len().max(1));

        for target in &group.targets {
            let executor = self.executor.clone();
            let pool = self.pool.clone();
            let audit = self.audit.clone();
            let tx = tx.clone();
            let progress = progress.clone();
            let hostname = target.hostname.clone();
            let target_display = target.display_name.clone();
            let services = target.service_names();
            let group_name = group.name.clone();
            let actor = operator.identity.clone();

            tokio::spawn(async move {
                let _permit = pool.acquire().await;
                let policy = Policy::Parallel.label();

                if let Some(p) = &progress {
                    p.send(RunProgress::UnitStarted {
                        target_display: target_display.clone(),
                        service_display: None,
                    })
                    .await
                    .ok();
                }
                audit.record(&AuditEvent::start(
                    &group_name,
                    &actor,
                    &hostname,
                    &services,
                    policy,
                ));

                let outcome = match executor.run_restart(&hostname, &services).await {
                    Ok(()) => {
                        audit.record(&AuditEvent::success(
                            &group_name,
                            &actor,
                            &hostname,
                            &services,
                            policy,
                        ));
                        RestartOutcome {
                            hostname: hostname.clone(),
                            service: None,
                            succeeded: true,
                            detail: None,
                        }
                    }
                    Err(e) => {
                        audit.record(&AuditEvent::failure(
                            &group_name,
                            &actor,
                            &hostname,
                            &services,
                            policy,
                            &e.to_string(),
                        ));
                        RestartOutcome {
                            hostname: hostname.clone(),
                            service: None,
                            succeeded: false,
                            detail: Some(e.to_string()),
                        }
                    }
                };

                if let Some(p) = &progress {
                    p.send(RunProgress::UnitFinished {
                        target_display,
                        service_display: None,
                        succeeded: outcome.succeeded,
                    })
                    .await
                    .ok();
                }
                tx.send(outcome).await.ok();
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(group.targets.len());
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// One service at a time in topology order, with a full cooldown after
    /// every non-final unit regardless of its outcome. A failed unit does
    /// not abort the remaining units; that is a deliberate policy choice.
    async fn run_sequential(
        &self,
        group: &Group,
        operator: &Operator,
        progress: &Option<mpsc::Sender<RunProgress>>,
    ) -> Vec<RestartOutcome> {
        let units = flatten_units(group);
        let total = units.len();
        let policy = Policy::Sequential.label();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, unit) in units.iter().enumerate() {
            let services = std::slice::from_ref(&unit.service);

            if let Some(p) = progress {
                p.send(RunProgress::UnitStarted {
                    target_display: unit.target_display.clone(),
                    service_display: Some(unit.service_display.clone()),
                })
                .await
                .ok();
            }
            self.audit.record(&AuditEvent::start(
                &group.name,
                &operator.identity,
                &unit.hostname,
                services,
                policy,
            ));

            let outcome = match self.executor.run_restart(&unit.hostname, services).await {
                Ok(()) => {
                    self.audit.record(&AuditEvent::success(
                        &group.name,
                        &operator.identity,
                        &unit.hostname,
                        services,
                        policy,
                    ));
                    RestartOutcome {
                        hostname: unit.hostname.clone(),
                        service: Some(unit.service.clone()),
                        succeeded: true,
                        detail: None,
                    }
                }
                Err(e) => {
                    self.audit.record(&AuditEvent::failure(
                        &group.name,
                        &operator.identity,
                        &unit.hostname,
                        services,
                        policy,
                        &e.to_string(),
                    ));
                    RestartOutcome {
                        hostname: unit.hostname.clone(),
                        service: Some(unit.service.clone()),
                        succeeded: false,
                        detail: Some(e.to_string()),
                    }
                }
            };

            if let Some(p) = progress {
                p.send(RunProgress::UnitFinished {
                    target_display: unit.target_display.clone(),
                    service_display: Some(unit.service_display.clone()),
                    succeeded: outcome.succeeded,
                })
                .await
                .ok();
            }
            outcomes.push(outcome);

            if idx + 1 < total {
                tracing::info!(
                    "Cooling down {}s before the next restart ({}/{} done)",
                    self.cooldown.as_secs(),
                    idx + 1,
                    total
                );
                if let Some(p) = progress {
                    p.send(RunProgress::CoolingDown {
                        seconds: self.cooldown.as_secs(),
                        completed: idx + 1,
                        total,
                    })
                    .await
                    .ok();
                }
                tokio::time::sleep(self.cooldown).await;
            }
        }

        outcomes
    }
}
