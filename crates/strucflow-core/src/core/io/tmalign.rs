//! Readers for the structural aligner's score report and superposition matrix file.
//!
//! The matrix file has the layout
//!
//! ```text
//! ------ The rotation matrix to rotate Chain_1 to Chain_2 ------
//! m               t[m]        u[m][0]        u[m][1]        u[m][2]
//! 0       1.2345678901   0.9999999999   0.0000000000   0.0000000000
//! 1      -2.3456789012   0.0000000000   0.9999999999   0.0000000000
//! 2       3.4567890123   0.0000000000   0.0000000000   0.9999999999
//! ```
//!
//! where each row carries one translation component followed by one rotation row.

use crate::core::transform::RigidTransform;
use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

/// Line index of the first matrix row when no column header can be found.
const FIXED_FIRST_ROW_LINE: usize = 2;
const ROW_COUNT: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TmalignParseError {
    #[error("Matrix output is empty")]
    Empty,
    #[error("Matrix output ended before row {row}")]
    MissingRow { row: usize },
    #[error("Matrix row {row} is malformed: '{line}'")]
    MalformedRow { row: usize, line: String },
}

fn parse_row(line: &str, row: usize) -> Result<(f64, [f64; 3]), TmalignParseError> {
    let malformed = || TmalignParseError::MalformedRow {
        row,
        line: line.trim().to_string(),
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(malformed());
    }
    if fields[0].parse::<usize>() != Ok(row) {
        return Err(malformed());
    }

    let mut values = [0.0; 4];
    for (slot, field) in values.iter_mut().zip(&fields[1..5]) {
        *slot = field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(malformed)?;
    }
    Ok((values[0], [values[1], values[2], values[3]]))
}

/// Recovers the rigid transform from the aligner's matrix file contents.
///
/// Rows are located after the `t[m]` column header; when no header is present the rows
/// are read from the fixed third to fifth lines.
///
/// # Errors
///
/// Any missing or unparsable row fails the whole parse. There is no identity fallback.
pub fn parse_matrix(text: &str) -> Result<RigidTransform, TmalignParseError> {
    if text.trim().is_empty() {
        return Err(TmalignParseError::Empty);
    }

    let lines: Vec<&str> = text.lines().collect();
    let first_row = lines
        .iter()
        .position(|l| l.contains("t[m]"))
        .map(|header| header + 1)
        .unwrap_or(FIXED_FIRST_ROW_LINE);

    let mut translation = Vector3::zeros();
    let mut rotation = Matrix3::zeros();
    for row in 0..ROW_COUNT {
        let line = lines
            .get(first_row + row)
            .ok_or(TmalignParseError::MissingRow { row })?;
        let (t, u) = parse_row(line, row)?;
        translation[row] = t;
        for (col, value) in u.into_iter().enumerate() {
            rotation[(row, col)] = value;
        }
    }

    Ok(RigidTransform::new(rotation, translation))
}

/// Reads the TM-score normalized by the second chain from the aligner's report.
///
/// Returns `None` when no `TM-score=` line mentions `Chain_2` or its value is not a number.
pub fn parse_tm_score(report: &str) -> Option<f64> {
    report
        .lines()
        .filter(|l| l.starts_with("TM-score=") && l.contains("Chain_2"))
        .find_map(|l| {
            l.trim_start_matches("TM-score=")
                .split_whitespace()
                .next()?
                .parse::<f64>()
                .ok()
        })
}
