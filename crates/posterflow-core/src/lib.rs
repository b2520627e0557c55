//! `posterflow-core` — shared configuration and error types.
//!
//! Every other crate in the workspace depends on this one for the
//! [`config::PosterflowConfig`] loaded at startup (posterflow.toml +
//! `POSTERFLOW_*` env overrides) and the top-level [`error::PosterflowError`].

pub mod config;
pub mod error;

pub use config::PosterflowConfig;
pub use error::{PosterflowError, Result};
