//! # Engine Module
//!
//! The boundary between the pipelines and the external analysis engine that owns the
//! loaded structures, selections and view.
//!
//! ## Overview
//!
//! Every operation the pipelines may issue is a variant of the closed [`command::EngineCommand`]
//! catalog, rendered to the engine's command-line syntax in one place. Commands are sent
//! through the [`session::Engine`] trait and answered with a
//! [`CommandResult`](crate::core::result::CommandResult). A [`session::Session`] wraps one
//! engine instance and is passed explicitly into every pipeline; there is no process-wide
//! "current session".
//!
//! ## Architecture
//!
//! - **Command Catalog** ([`command`]) - Typed operations and argument quoting
//! - **Sessions** ([`session`]) - The `Engine` trait and the per-pipeline session object
//! - **Child Process Adapter** ([`process`]) - Line-protocol driver for an engine executable
//! - **Progress Monitoring** ([`progress`]) - Progress reporting for long pipelines
//! - **Error Handling** ([`error`]) - Transport-level failures

pub mod command;
pub mod error;
pub mod process;
pub mod progress;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
