//! Scalar-kind inference from a bounded window of leading values.
//!
//! Columns the loader already typed as numbers or booleans are trusted as is.
//! Everything else is judged by the kinds of its first few non-null cells,
//! which is cheap and usually right but can be fooled by a column whose early
//! rows are unrepresentative.

use crate::data::{Column, DType, Value};
use crate::parser::{parse_bool, parse_number};
use serde::Serialize;

/// Intrinsic kind of a column's values, independent of its declared dtype.
///
/// Variant order is the tie-break precedence: when two kinds are equally
/// common in the window, the earlier one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Text,
    Number,
    Boolean,
}

/// Kind of a single cell. Text that reads as a boolean or a number counts as
/// that kind.
pub fn kind_of(value: &Value) -> Option<ScalarKind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(ScalarKind::Boolean),
        Value::Int(_) | Value::Float(_) => Some(ScalarKind::Number),
        Value::Text(s) => {
            if parse_bool(s).is_some() {
                Some(ScalarKind::Boolean)
            } else if parse_number(s).is_some() {
                Some(ScalarKind::Number)
            } else {
                Some(ScalarKind::Text)
            }
        }
    }
}

/// Most frequent kind among the non-null cells of the first `sample_size`
/// rows. An all-null window resolves to text.
pub fn sample_kind(values: &[Value], sample_size: usize) -> ScalarKind {
    // Indexed by variant order
    let mut counts = [0usize; 3];
    for kind in values.iter().take(sample_size).filter_map(kind_of) {
        counts[kind as usize] += 1;
    }

    let mut best = ScalarKind::Text;
    let mut best_count = 0;
    for kind in [ScalarKind::Text, ScalarKind::Number, ScalarKind::Boolean] {
        if counts[kind as usize] > best_count {
            best = kind;
            best_count = counts[kind as usize];
        }
    }
    best
}

/// Resolve the kind the coercer should use for `column`.
pub fn resolve_kind(column: &Column, sample_size: usize) -> ScalarKind {
    match column.dtype {
        DType::Int | DType::Float => ScalarKind::Number,
        DType::Bool => ScalarKind::Boolean,
        DType::Text => ScalarKind::Text,
        DType::Object => sample_kind(&column.values, sample_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_kind_of_text_tokens() {
        assert_eq!(kind_of(&text("TRUE")), Some(ScalarKind::Boolean));
        assert_eq!(kind_of(&text("3.5")), Some(ScalarKind::Number));
        assert_eq!(kind_of(&text("male")), Some(ScalarKind::Text));
        assert_eq!(kind_of(&Value::Null), None);
    }

    #[test]
    fn test_majority_wins() {
        let values = vec![text("1"), text("2"), text("x"), Value::Null, text("4")];
        assert_eq!(sample_kind(&values, 25), ScalarKind::Number);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut values = vec![text("a"); 3];
        values.extend(vec![text("1"); 10]);
        assert_eq!(sample_kind(&values, 3), ScalarKind::Text);
        assert_eq!(sample_kind(&values, 25), ScalarKind::Number);
    }

    #[test]
    fn test_nulls_inside_window_are_skipped() {
        // Only rows 0..4 are inspected; two of them are null
        let values = vec![Value::Null, text("yes"), Value::Null, text("1"), text("2")];
        assert_eq!(sample_kind(&values, 4), ScalarKind::Text);
    }

    #[test]
    fn test_tie_break_precedence() {
        let values = vec![text("a"), text("1")];
        assert_eq!(sample_kind(&values, 25), ScalarKind::Text);

        let values = vec![text("true"), text("1")];
        assert_eq!(sample_kind(&values, 25), ScalarKind::Number);
    }

    #[test]
    fn test_empty_window_is_text() {
        assert_eq!(sample_kind(&[Value::Null, Value::Null], 25), ScalarKind::Text);
        assert_eq!(sample_kind(&[], 25), ScalarKind::Text);
    }

    #[test]
    fn test_declared_dtypes_skip_sampling() {
        let col = Column::new("n", DType::Float, vec![Value::Null]);
        assert_eq!(resolve_kind(&col, 25), ScalarKind::Number);

        let col = Column::new("b", DType::Bool, vec![Value::Bool(true)]);
        assert_eq!(resolve_kind(&col, 25), ScalarKind::Boolean);

        let col = Column::new("t", DType::Text, vec![text("12")]);
        assert_eq!(resolve_kind(&col, 25), ScalarKind::Text);
    }
}
