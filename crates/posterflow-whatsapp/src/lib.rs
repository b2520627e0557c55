//! `posterflow-whatsapp` — the messaging adapter boundary.
//!
//! Translates one (phone number, media URL) pair into exactly one outbound
//! provider call. No retry, no queuing — see the scheduler crate docs for
//! what the dispatch loop does and does not retry.
//!
//! [`sender::MediaSender`] is the contract the dispatch engine is written
//! against; [`cloud::CloudApiSender`] is the production binding to the
//! WhatsApp Business Cloud API.

pub mod cloud;
pub mod error;
pub mod phone;
pub mod sender;

pub use cloud::CloudApiSender;
pub use error::DeliveryError;
pub use sender::{MediaSender, MessageReceipt};
