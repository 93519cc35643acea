//! Atom-selection expressions in the engine's selection language.
//!
//! Expressions are passed to the engine as opaque strings; this module only composes them.

/// Selects alpha-carbon atoms.
pub const ALPHA_CARBONS: &str = "[-aname CA]";

/// Intersects two selection expressions.
pub fn intersect(a: &str, b: &str) -> String {
    format!("(({a}) and ({b}))")
}

/// The alpha-carbon subset of an optional caller-supplied selection.
///
/// With no selection (or a blank one) this is just [`ALPHA_CARBONS`].
pub fn alpha_carbons_of(selection: Option<&str>) -> String {
    match selection.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sel) => intersect(sel, ALPHA_CARBONS),
        None => ALPHA_CARBONS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_selection_means_all_alpha_carbons() {
        assert_eq!(alpha_carbons_of(None), "[-aname CA]");
        assert_eq!(alpha_carbons_of(Some("   ")), "[-aname CA]");
    }

    #[test]
    fn supplied_selection_is_intersected_with_alpha_carbons() {
        assert_eq!(
            alpha_carbons_of(Some("[-chain A]")),
            "(([-chain A]) and ([-aname CA]))"
        );
    }
}
