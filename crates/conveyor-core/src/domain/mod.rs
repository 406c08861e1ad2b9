//! Domain model (ids, codes, priorities, envelopes, records, routing).

pub mod action;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod job;
pub mod priority;
pub mod route;

pub use action::{ActionCode, ActionItem};
pub use envelope::{JobEnvelope, Payload, merge_defaults};
pub use errors::JobError;
pub use ids::JobId;
pub use job::{HistoryRecord, JobRecord, JobStatus};
pub use priority::Priority;
pub use route::{JOB_ID_FIELD, PRIORITY_FIELD, RouteDecision, SUCCESS_FIELD, resolve};
