// Remote orchestration module

pub mod audit;
pub mod models;
pub mod parser;
pub mod pool;
pub mod restart;
pub mod status;
pub mod transport;


pub use audit::{AuditEvent, AuditLog, AuditPhase};
pub use models::{Operation, Policy, RestartOutcome, RestartRun, ServiceState, StatusSnapshot};
pub use pool::WorkerPool;
pub use restart::{flatten_units, RestartOrchestrator, RestartUnit, RunProgress};
pub use status::StatusAggregator;
pub use transport::{CommandExecutor, CommandTransport, PlaybookTransport, TransportResponse};
