// Group status aggregation

use crate::config::Group;
use crate::error::{Result, SvcherdError};
use crate::remote::models::{ServiceState, StatusSnapshot};
use crate::remote::pool::WorkerPool;
use crate::remote::transport::CommandExecutor;
use crate::session::Operator;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Fans status queries out across a group's targets and assembles one
/// complete snapshot.
#[derive(Clone)]
pub struct StatusAggregator {
    executor: CommandExecutor,
    pool: WorkerPool,
}

impl StatusAggregator {
    pub fn new(executor: CommandExecutor, pool: WorkerPool) -> Self {
        Self { executor, pool }
    }

    /// Refresh every target in the group concurrently, one batched status
    /// call per target.
    ///
    /// The returned snapshot always has one entry per (target, service)
    /// pair declared in the group: a failed target reports
    /// `Timeout`/`Error` for all of its services, and a service missing
    /// from the runner's output reports `Unknown`. One target's failure
    /// never blocks visibility into the others.
    pub async fn refresh(&self, group: &Group, operator: &Operator) -> Result<StatusSnapshot> {
        if !operator.authorized {
            return Err(SvcherdError::Unauthorized {
                actor: operator.identity.clone(),
            }
            .into());
        }

        tracing::info!("Refreshing status for group '{}'", group.id);

        let (tx, mut rx) = mpsc::channel(group.targets.len().max(1));

        for target in &group.targets {
            let executor = self.executor.clone();
            let pool = self.pool.clone();
            let tx = tx.clone();
            let hostname = target.hostname.clone();
            let services = target.service_names();

            tokio::spawn(async move {
                let _permit = pool.acquire().await;
                let states = executor.query_status(&hostname, &services).await;
                // The receiver only goes away if the refresh itself was
                // dropped mid-flight
                tx.send((hostname, states)).await.ok();
            });
        }
        drop(tx);

        let mut collected: HashMap<String, HashMap<String, ServiceState>> = HashMap::new();
        while let Some((hostname, states)) = rx.recv().await {
            collected.insert(hostname, states);
        }

        // Reassemble against the declared topology so absence is always
        // explicit, never a missing key
        let mut snapshot_states = HashMap::new();
        for target in &group.targets {
            let mut reported = collected.remove(&target.hostname).unwrap_or_default();
            let mut services = HashMap::new();
            for spec in &target.services {
                let state = reported.remove(&spec.name).unwrap_or(ServiceState::Unknown);
                services.insert(spec.name.clone(), state);
            }
            snapshot_states.insert(target.hostname.clone(), services);
        }

        Ok(StatusSnapshot::new(snapshot_states))
    }
}
