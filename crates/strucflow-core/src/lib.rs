//! # strucflow Core Library
//!
//! A control layer for structural-bioinformatics analysis pipelines. It drives an opaque
//! structural-analysis engine and a handful of external command-line tools (structural
//! aligners, side-chain rebuilders, image encoders, network fetchers) as black boxes,
//! checks every step's outcome, and guarantees that ephemeral on-disk workspaces never
//! outlive the pipeline that created them.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a layered structure so that every concern can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless data: the engine result contract and its
//!   assertion gate, rigid transforms, selection expressions, turntable planning, and the
//!   text formats exchanged with external tools.
//!
//! - **[`engine`]: The Engine Boundary.** A closed catalog of typed engine commands, the
//!   [`engine::session::Engine`] trait, the explicit [`engine::session::Session`] that
//!   replaces any process-wide "current session", and a child-process engine adapter.
//!
//! - **[`tools`] and [`workspace`]: The Environment.** Synchronous invocation of external
//!   executables with availability preconditions, and scoped temporary directories.
//!
//! - **[`workflows`]: The Public API.** End-to-end pipelines (structural alignment, CASP
//!   quality assessment export, structure fetch, side-chain rebuild, animated export) that
//!   compose everything above and report failures through one error taxonomy.

pub mod core;
pub mod engine;
pub mod tools;
pub mod workflows;
pub mod workspace;
