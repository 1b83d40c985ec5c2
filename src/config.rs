// Configuration management: runner settings and service topology

use crate::error::{Result, SvcherdError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One restartable Windows service on a remote host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Remote service identifier (as known to the service manager)
    pub name: String,
    /// Human-facing label
    pub display_name: String,
}

/// A remote host and the ordered list of services it runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub hostname: String,
    pub display_name: String,
    pub services: Vec<ServiceSpec>,
}

impl Target {
    /// Service identifiers in declaration order
    pub fn service_names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.clone()).collect()
    }
}

/// An operator-facing collection of targets, restarted and displayed as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Label for the group's restart action ("Restart billing stack", ...)
    pub restart_label: String,
    pub targets: Vec<Target>,
}

impl Group {
    /// Total number of (target, service) pairs in this group
    pub fn service_total(&self) -> usize {
        self.targets.iter().map(|t| t.services.len()).sum()
    }
}

/// Runner invocation and execution policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Automation runner program
    pub runner: String,
    /// Playbook used for status queries
    pub status_playbook: PathBuf,
    /// Playbook used for restarts
    pub restart_playbook: PathBuf,
    /// Inventory passed to the runner
    pub inventory: PathBuf,
    pub status_timeout_secs: u64,
    pub restart_timeout_secs: u64,
    /// Wait between consecutive units in sequential mode
    pub cooldown_secs: u64,
    /// Maximum simultaneous in-flight remote calls
    pub max_workers: usize,
    /// Append-only audit trail destination
    pub audit_log: PathBuf,
    /// Operators allowed to run status and restart operations
    pub authorized_operators: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runner: "ansible-playbook".to_string(),
            status_playbook: PathBuf::from("/opt/ansible/playbooks/windows/check_services.yml"),
            restart_playbook: PathBuf::from("/opt/ansible/playbooks/windows/restart_services.yml"),
            inventory: PathBuf::from("/opt/ansible/inventories/prod/hosts"),
            status_timeout_secs: 60,
            restart_timeout_secs: 300,
            cooldown_secs: 60,
            max_workers: 4,
            audit_log: PathBuf::from("logs/restarts.log"),
            authorized_operators: Vec::new(),
        }
    }
}

impl Settings {
    /// Check an operator identity against the static allowlist
    pub fn is_authorized(&self, identity: &str) -> bool {
        self.authorized_operators.iter().any(|op| op == identity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    pub groups: Vec<Group>,
}

impl Config {
    /// Get default config path: ~/.config/svcherd/config.yaml
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("svcherd").join("config.yaml"))
    }

    /// Load and validate config from path.
    ///
    /// Unlike cosmetic settings, the topology has no sensible default: a
    /// missing or invalid file is an error rather than a silent fallback.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            return Err(SvcherdError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            ))
            .into());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| SvcherdError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a group by id
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Reject topologies that cannot be operated on
    fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(SvcherdError::Config("No groups defined".to_string()).into());
        }

        let mut seen = std::collections::HashSet::new();
        for group in &self.groups {
            if group.id.is_empty() {
                return Err(SvcherdError::Config("Group with empty id".to_string()).into());
            }
            if !seen.insert(group.id.as_str()) {
                return Err(
                    SvcherdError::Config(format!("Duplicate group id '{}'", group.id)).into(),
                );
            }
            if group.targets.is_empty() {
                return Err(SvcherdError::Config(format!(
                    "Group '{}' has no targets",
                    group.id
                ))
                .into());
            }
            let mut hostnames = std::collections::HashSet::new();
            for target in &group.targets {
                if !hostnames.insert(target.hostname.as_str()) {
                    return Err(SvcherdError::Config(format!(
                        "Duplicate hostname '{}' in group '{}'",
                        target.hostname, group.id
                    ))
                    .into());
                }
                if target.hostname.is_empty() {
                    return Err(SvcherdError::Config(format!(
                        "Group '{}' has a target with an empty hostname",
                        group.id
                    ))
                    .into());
                }
                if target.services.is_empty() {
                    return Err(SvcherdError::Config(format!(
                        "Target '{}' in group '{}' has no services",
                        target.hostname, group.id
                    ))
                    .into());
                }
                for service in &target.services {
                    if service.name.is_empty() {
                        return Err(SvcherdError::Config(format!(
                            "Target '{}' in group '{}' has a service with an empty name",
                            target.hostname, group.id
                        ))
                        .into());
                    }
                }
            }
        }
        Ok(())
    }
}
