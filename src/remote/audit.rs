// Append-only audit trail for restart attempts and authorization decisions

use crate::error::{Result, SvcherdError};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Lifecycle phase of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditPhase {
    Start,
    Success,
    Failure,
    AuthGranted,
    AuthDenied,
}

impl AuditPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AuditPhase::Start => "START",
            AuditPhase::Success => "SUCCESS",
            AuditPhase::Failure => "FAILURE",
            AuditPhase::AuthGranted => "AUTH_GRANTED",
            AuditPhase::AuthDenied => "AUTH_DENIED",
        }
    }
}

/// One structured audit record. Append-only; the core never mutates or
/// deletes past events.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub phase: AuditPhase,
    pub group: String,
    pub actor: String,
    pub target: String,
    pub services: Vec<String>,
    pub detail: Option<String>,
}

impl AuditEvent {
    fn new(
        phase: AuditPhase,
        group: &str,
        actor: &str,
        target: &str,
        services: &[String],
        detail: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            phase,
            group: group.to_string(),
            actor: actor.to_string(),
            target: target.to_string(),
            services: services.to_vec(),
            detail,
        }
    }

    pub fn start(group: &str, actor: &str, target: &str, services: &[String], policy: &str) -> Self {
        Self::new(
            AuditPhase::Start,
            group,
            actor,
            target,
            services,
            Some(format!("policy={}", policy)),
        )
    }

    pub fn success(
        group: &str,
        actor: &str,
        target: &str,
        services: &[String],
        policy: &str,
    ) -> Self {
        Self::new(
            AuditPhase::Success,
            group,
            actor,
            target,
            services,
            Some(format!("policy={}", policy)),
        )
    }

    pub fn failure(
        group: &str,
        actor: &str,
        target: &str,
        services: &[String],
        policy: &str,
        detail: &str,
    ) -> Self {
        Self::new(
            AuditPhase::Failure,
            group,
            actor,
            target,
            services,
            Some(format!("policy={} {}", policy, detail)),
        )
    }

    /// Authorization decision record; no target or service scope
    pub fn auth(actor: &str, group: &str, granted: bool) -> Self {
        let phase = if granted {
            AuditPhase::AuthGranted
        } else {
            AuditPhase::AuthDenied
        };
        Self::new(phase, group, actor, "-", &[], None)
    }

    /// Pipe-delimited line consumed by downstream log aggregation:
    /// `timestamp | phase | group | actor | target | services | detail`
    pub fn format_line(&self) -> String {
        format!(
            "{} | {} | {} | {} | {} | {} | {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.phase.label(),
            self.group,
            self.actor,
            self.target,
            if self.services.is_empty() {
                "-".to_string()
            } else {
                self.services.join(",")
            },
            self.detail.as_deref().unwrap_or("-"),
        )
    }
}

/// Append-only audit log backed by a file.
///
/// Writes are serialized behind a mutex so concurrent tasks from parallel
/// restarts never interleave lines.
pub struct AuditLog {
    file: Mutex<File>,
}

impl AuditLog {
    /// Open (or create) the audit trail, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SvcherdError::Audit(format!("Cannot open {}: {}", path.display(), e)))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one record.
    ///
    /// Never fails back to the caller: a restart in progress must not
    /// abort because the trail is unwritable. A failed write is surfaced
    /// on the diagnostic channel instead.
    pub fn record(&self, event: &AuditEvent) {
        let line = event.format_line();
        tracing::info!(target: "audit", "{}", line);

        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::warn!("Failed to append audit record: {}", e);
        }
    }
}
