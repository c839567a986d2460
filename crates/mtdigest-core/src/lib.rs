//! mtdigest-core: shared types, errors and child-process plumbing for the digest pipeline

pub mod error;
pub mod process;
pub mod types;

pub use error::{Error, Result};
pub use process::{CommandSpec, ProcessOutput};
pub use types::*;
