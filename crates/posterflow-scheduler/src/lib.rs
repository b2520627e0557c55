//! `posterflow-scheduler` — the schedule dispatch engine.
//!
//! # Overview
//!
//! [`engine::DispatchEngine`] polls the schedule store once per minute and
//! drives every due record through the delivery state machine:
//!
//! ```text
//! Pending --[adapter success]--------------> Sent    (terminal)
//! Pending --[adapter failure]--------------> Failed  (terminal)
//! Pending --[customer/phone unresolvable]--> Failed  (terminal, no adapter call)
//! ```
//!
//! [`window::TickWindow`] computes the due interval — the calendar minute
//! containing "now" in one fixed, configured UTC offset — so reconciliation
//! never depends on the host's local timezone. [`media::MediaLocator`]
//! derives the poster media URL from the poster ID; the URL is never stored.
//!
//! Each status transition persists immediately, so a crash mid-tick leaves
//! processed records correctly marked and only the remainder re-evaluated.
//! See the engine docs for the delivery-guarantee fine print.

pub mod engine;
pub mod media;
pub mod window;

pub use engine::{DispatchEngine, TickReport};
pub use media::MediaLocator;
pub use window::TickWindow;
