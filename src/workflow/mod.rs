//! Daily digest workflow: trigger → date → generate → dispatch → persist

pub mod annotate;
pub mod dispatch;
pub mod invoke;
pub mod persist;
pub mod pipeline;
pub mod schedule;
pub mod trigger;

pub use dispatch::{dispatch, DispatchOutcome};
pub use invoke::DigestInvoker;
pub use persist::{ArtifactPersister, PersistReport};
pub use pipeline::{build_sender, Pipeline, RunReport};
pub use schedule::{next_fire, parse_schedule, run_schedule};
pub use trigger::resolve_target_date;
