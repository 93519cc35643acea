//! Reader for per-atom adjunct tables exported by the engine.
//!
//! A table starts with a header `ID <adjunct>...` followed by one row per atom, where the
//! first column is an atom descriptor such as `c<A>r<12>R<ALA>A<CA>` and each remaining
//! column is a value or `NA`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdjunctTableError {
    #[error("Adjunct table has no header line")]
    MissingHeader,
    #[error("Adjunct '{0}' is not a column of the table")]
    MissingColumn(String),
    #[error("Line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Residue number from an atom descriptor, i.e. the value inside `r<...>`.
pub fn residue_number(descriptor: &str) -> Option<i64> {
    let start = descriptor.find("r<")? + 2;
    let len = descriptor[start..].find('>')?;
    descriptor[start..start + len].parse().ok()
}

/// Reads `(residue number, value)` pairs for one adjunct column.
///
/// Atoms with an `NA` value are skipped. Several atoms of one residue yield several
/// pairs in file order.
///
/// # Errors
///
/// Fails when the header or the requested column is missing, or when a row has no residue
/// number or an unparsable value.
pub fn read_residue_values(
    text: &str,
    adjunct: &str,
) -> Result<Vec<(i64, f64)>, AdjunctTableError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(AdjunctTableError::MissingHeader)?;
    let mut columns = header.split_whitespace();
    if columns.next() != Some("ID") {
        return Err(AdjunctTableError::MissingHeader);
    }
    let column = columns
        .position(|c| c == adjunct)
        .ok_or_else(|| AdjunctTableError::MissingColumn(adjunct.to_string()))?
        + 1;

    let mut values = Vec::new();
    for (index, line) in lines {
        let malformed = |reason: &str| AdjunctTableError::MalformedRow {
            line: index + 1,
            reason: reason.to_string(),
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        let residue = fields
            .first()
            .and_then(|d| residue_number(d))
            .ok_or_else(|| malformed("no residue number in atom descriptor"))?;
        let raw = fields
            .get(column)
            .ok_or_else(|| malformed("missing value column"))?;
        if *raw == "NA" {
            continue;
        }
        let value = raw
            .parse::<f64>()
            .map_err(|_| malformed("value is not a number"))?;
        values.push((residue, value));
    }
    Ok(values)
}
