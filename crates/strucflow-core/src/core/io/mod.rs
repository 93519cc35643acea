//! Readers and writers for the plain-text formats exchanged with external tools.
//!
//! Structural coordinates themselves are always read and written by the analysis engine;
//! this module only covers the small text formats the pipelines produce or parse directly:
//! the structural aligner's report and superposition matrix, per-atom adjunct tables, and
//! the CASP QA line.

pub mod adjuncts;
pub mod casp;
pub mod tmalign;
