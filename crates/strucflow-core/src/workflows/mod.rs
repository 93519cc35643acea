//! # Workflows Module
//!
//! End-to-end pipelines built on top of an engine [`Session`](crate::engine::session::Session)
//! and a [`Toolbox`](crate::tools::Toolbox) of external executables.
//!
//! ## Overview
//!
//! Every pipeline follows the same shape: check that the external tools it needs are
//! available, validate its inputs, then issue engine commands one at a time, asserting the
//! required success tier after each. Files exchanged with external tools live in a scoped
//! workspace that is removed on every exit path. Failures are reported as
//! [`error::PipelineError`], classified by [`error::ErrorKind`].
//!
//! ## Pipelines
//!
//! - **Structural alignment** ([`tmalign`]) - Superimposes a model object onto a target
//!   object with TMalign and applies the recovered rigid transform.
//! - **CASP quality assessment** ([`casp_qa`]) - Scores a model against its target
//!   sequence and writes a submission line plus a B-factor-annotated model.
//! - **Structure fetch** ([`fetch`]) - Downloads an entry from the RCSB archive and
//!   imports it.
//! - **Side-chain rebuild** ([`side_chains`]) - Replaces side chains with Scwrl4 output.
//! - **Animation export** ([`animate`]) - Full-circle spins and looping turntables encoded
//!   into an animated image.

pub mod animate;
pub mod casp_qa;
pub mod error;
pub mod fetch;
pub mod side_chains;
pub mod tmalign;
