//! Fixed-width column identifiers.
//!
//! Column ids are generated sequentially and rendered as 4-digit decimal
//! strings ("0000", "0001", ...). History rewrites parse them, shift them and
//! render them back, so the codec lives in one place.

use std::cmp::Ordering;

use crate::error::{ModelError, Result};

/// Width of a rendered column id.
pub const COLUMN_ID_WIDTH: usize = 4;

/// Render a numeric column id with the fixed 4-digit width.
pub fn format_column_id(id: i64) -> String {
    format!("{id:0width$}", width = COLUMN_ID_WIDTH)
}

/// Parse a rendered column id back to its numeric value.
pub fn parse_column_id(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ModelError::InvalidColumnId(value.to_string()));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ModelError::InvalidColumnId(value.to_string()))
}

/// Column order: numeric ids by value, then named columns by name.
///
/// Rendered ids grow past the fixed width once they reach 10000, so string
/// order stops matching column order there.
pub fn compare_column_ids(a: &str, b: &str) -> Ordering {
    match (parse_column_id(a).ok(), parse_column_id(b).ok()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Numeric view over a set of created column ids.
///
/// Ids that are not decimal numbers (named columns) are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIds {
    ids: Vec<i64>,
}

impl ColumnIds {
    pub fn numeric<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = values
            .into_iter()
            .filter_map(|value| parse_column_id(value.as_ref()).ok())
            .collect();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Highest id of the set, `None` for an empty set.
    ///
    /// An empty set acts as an unbounded maximum for renumbering: no id is
    /// ever greater than it.
    pub fn max(&self) -> Option<i64> {
        self.ids.iter().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_fixed_width() {
        assert_eq!(format_column_id(0), "0000");
        assert_eq!(format_column_id(5), "0005");
        assert_eq!(format_column_id(1234), "1234");
        assert_eq!(format_column_id(12345), "12345");
    }

    #[test]
    fn parses_rendered_ids() {
        assert_eq!(parse_column_id("0004").unwrap(), 4);
        assert_eq!(parse_column_id("0100").unwrap(), 100);
        assert!(matches!(
            parse_column_id("col"),
            Err(ModelError::InvalidColumnId(_))
        ));
        assert!(parse_column_id("").is_err());
        assert!(parse_column_id("-001").is_err());
    }

    #[test]
    fn wide_ids_sort_after_narrow_ones() {
        let mut ids = vec!["10000", "lastname", "9999", "0002"];
        ids.sort_by(|a, b| compare_column_ids(a, b));
        assert_eq!(ids, vec!["0002", "9999", "10000", "lastname"]);
    }

    #[test]
    fn empty_set_has_no_maximum() {
        let ids = ColumnIds::numeric(Vec::<String>::new());
        assert!(ids.is_empty());
        assert_eq!(ids.max(), None);

        let ids = ColumnIds::numeric(["0003", "0009", "0004"]);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.max(), Some(9));
    }

    #[test]
    fn named_ids_are_left_out() {
        let ids = ColumnIds::numeric(["lastname", "0007"]);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.max(), Some(7));
        assert_eq!(ColumnIds::numeric(["lastname"]).max(), None);
    }
}
