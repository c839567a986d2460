//! mtdigest-sender: delivery backends for generated digests

pub mod buttondown;
pub mod command;
pub mod provider;

pub use buttondown::{digest_subject, ButtondownSender, BUTTONDOWN_API_URL};
pub use command::CommandSender;
pub use provider::{DigestSender, SendError, SendReceipt, SendResult};
