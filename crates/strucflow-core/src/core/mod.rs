//! # Core Module
//!
//! Stateless building blocks shared by every pipeline.
//!
//! ## Overview
//!
//! Nothing in this module talks to the analysis engine or spawns a process. It defines the
//! data that flows between those collaborators and the pure algorithms that operate on it,
//! which keeps the interesting logic (success tiers, transform parsing, frame sequencing)
//! testable without any external program installed.
//!
//! ## Architecture
//!
//! - **Result Contract** ([`result`]) - The shape of every engine reply
//! - **Assertion Gate** ([`assertions`]) - Full/partial success checks that abort a pipeline
//! - **Rigid Transforms** ([`transform`]) - Rotation plus translation applied to coordinates
//! - **Selections** ([`selection`]) - Composition of engine atom-selection expressions
//! - **Turntable Planning** ([`turntable`]) - Closed-loop rotation and capture sequences
//! - **Text Formats** ([`io`]) - Alignment reports, matrix files, CASP QA lines
//! - **Utilities** ([`utils`]) - Identifier validation

pub mod assertions;
pub mod io;
pub mod result;
pub mod selection;
pub mod transform;
pub mod turntable;
pub mod utils;
