//! Visibility condition evaluator.
//!
//! Grammar, tried in order against the trimmed condition:
//!
//! 1. `path | exists`, `path | empty`, `path | !empty`
//! 2. `lhs OP rhs` where OP is one of `==`, `!=`, `>=`, `<=`, `>`, `<`
//!    surrounded by single spaces. Operators are tried in that order, so
//!    `>=` is never mistaken for `>`.
//! 3. A bare `$path`, checked for truthiness.
//! 4. Anything else is false.
//!
//! Unparseable conditions are never an error; they are simply false.

use std::cmp::Ordering;

use crate::context::DataContext;
use crate::value::TaggedValue;

const COMPARISON_OPERATORS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];

/// Evaluate a condition string against a context.
pub fn evaluate(condition: &str, ctx: &DataContext<'_>) -> bool {
    let trimmed = condition.trim();

    if trimmed.contains(" | ") {
        let mut parts = trimmed.split(" | ");
        let path = parts.next().unwrap_or_default().trim();
        let op = parts.next().unwrap_or_default().trim();
        match op {
            "exists" => {
                return ctx.resolve(path).is_some_and(|v| !v.is_null());
            }
            "empty" => return is_empty(ctx.resolve(path).as_ref()),
            "!empty" => return !is_empty(ctx.resolve(path).as_ref()),
            // Not a condition pipe; the whole string may still be a
            // comparison or a binding with value transforms.
            _ => {}
        }
    }

    for op in COMPARISON_OPERATORS {
        let needle = format!(" {} ", op);
        if let Some((lhs, rhs)) = trimmed.split_once(needle.as_str()) {
            return evaluate_comparison(lhs.trim(), op, rhs.trim(), ctx);
        }
    }

    if trimmed.starts_with('$') {
        return is_truthy(ctx.resolve(trimmed).as_ref());
    }

    false
}

fn evaluate_comparison(lhs: &str, op: &str, rhs: &str, ctx: &DataContext<'_>) -> bool {
    let left = resolve_operand(lhs, ctx);
    let right = resolve_operand(rhs, ctx);

    match op {
        "==" => is_equal(left.as_ref(), right.as_ref()),
        "!=" => !is_equal(left.as_ref(), right.as_ref()),
        ">" => compare_numeric(left.as_ref(), right.as_ref()) == Ordering::Greater,
        "<" => compare_numeric(left.as_ref(), right.as_ref()) == Ordering::Less,
        ">=" => compare_numeric(left.as_ref(), right.as_ref()) != Ordering::Less,
        "<=" => compare_numeric(left.as_ref(), right.as_ref()) != Ordering::Greater,
        _ => false,
    }
}

/// Operand literal forms: `$path`, `'quoted'`, integer, float, `true`,
/// `false`, and finally any other text as a bare string.
fn resolve_operand(operand: &str, ctx: &DataContext<'_>) -> Option<TaggedValue> {
    let trimmed = operand.trim();
    if trimmed.starts_with('$') {
        return ctx.resolve(trimmed);
    }
    if trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        // A lone `'` opens and closes itself: the empty string.
        let inner = trimmed.get(1..trimmed.len() - 1).unwrap_or_default();
        return Some(TaggedValue::String(inner.to_string()));
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(TaggedValue::Int(i));
    }
    if let Ok(d) = trimmed.parse::<f64>() {
        return Some(TaggedValue::Double(d));
    }
    match trimmed {
        "true" => Some(TaggedValue::Bool(true)),
        "false" => Some(TaggedValue::Bool(false)),
        _ => Some(TaggedValue::String(trimmed.to_string())),
    }
}

/// Loose equality: two absent operands are equal, and whenever both sides
/// have a string form they are compared as strings (`42 == '42'`).
fn is_equal(lhs: Option<&TaggedValue>, rhs: Option<&TaggedValue>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(l), Some(r)) => match (l.as_string(), r.as_string()) {
            (Some(ls), Some(rs)) => ls == rs,
            _ => l == r,
        },
        _ => false,
    }
}

/// Numeric ordering. When either side has no numeric form the operands
/// compare as equal, which makes `>=` and `<=` true and `>` and `<` false.
fn compare_numeric(lhs: Option<&TaggedValue>, rhs: Option<&TaggedValue>) -> Ordering {
    let (Some(l), Some(r)) = (
        lhs.and_then(TaggedValue::as_double),
        rhs.and_then(TaggedValue::as_double),
    ) else {
        return Ordering::Equal;
    };
    if l < r {
        Ordering::Less
    } else if l > r {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Absent and null are empty; strings, arrays and objects are empty when
/// they have no elements; numbers and booleans are never empty.
pub fn is_empty(value: Option<&TaggedValue>) -> bool {
    match value {
        None | Some(TaggedValue::Null) => true,
        Some(TaggedValue::String(s)) => s.is_empty(),
        Some(TaggedValue::Array(items)) => items.is_empty(),
        Some(TaggedValue::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

pub fn is_truthy(value: Option<&TaggedValue>) -> bool {
    match value {
        None | Some(TaggedValue::Null) => false,
        Some(TaggedValue::Bool(b)) => *b,
        Some(TaggedValue::Int(i)) => *i != 0,
        Some(TaggedValue::Double(d)) => *d != 0.0,
        Some(TaggedValue::String(s)) => !s.is_empty(),
        Some(TaggedValue::Array(items)) => !items.is_empty(),
        Some(TaggedValue::Object(map)) => !map.is_empty(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(v: serde_json::Value) -> DataContext<'static> {
        DataContext::new(TaggedValue::from(v).as_object().cloned().unwrap())
    }

    #[test]
    fn string_equality() {
        let c = ctx(json!({ "status": "active" }));
        assert!(evaluate("$.status == 'active'", &c));
        assert!(!evaluate("$.status == 'inactive'", &c));
        assert!(evaluate("$.status != 'inactive'", &c));
        assert!(!evaluate("$.status != 'active'", &c));
    }

    #[test]
    fn quoted_empty_string_operands() {
        let c = ctx(json!({ "blank": "", "name": "x" }));
        assert!(evaluate("$.blank == ''", &c));
        assert!(evaluate("$.blank == '", &c));
        assert!(!evaluate("$.name == '", &c));
        assert!(evaluate("$.name != '", &c));
    }

    #[test]
    fn equality_coerces_scalars_to_strings() {
        let c = ctx(json!({ "count": 42, "flag": true, "ratio": 2.5 }));
        assert!(evaluate("$.count == 42", &c));
        assert!(evaluate("$.count == '42'", &c));
        assert!(evaluate("$.flag == true", &c));
        assert!(evaluate("$.flag == 'true'", &c));
        assert!(evaluate("$.ratio == 2.5", &c));
    }

    #[test]
    fn equality_with_absent_operands() {
        let c = ctx(json!({ "list": [1], "other": [1] }));
        assert!(evaluate("$.missing == $.alsoMissing", &c));
        assert!(!evaluate("$.missing == 'x'", &c));
        assert!(evaluate("$.missing != 'x'", &c));
        // Containers have no string form and fall back to strict equality.
        assert!(evaluate("$.list == $.other", &c));
    }

    #[test]
    fn ordering_comparisons() {
        let c = ctx(json!({ "count": 150 }));
        assert!(evaluate("$.count > 100", &c));
        assert!(!evaluate("$.count > 200", &c));
        assert!(evaluate("$.count < 200", &c));
        assert!(evaluate("$.count <= 150", &c));
        assert!(!evaluate("$.count < 150", &c));
    }

    #[test]
    fn greater_equal_is_not_split_as_greater() {
        let c = ctx(json!({ "count": 100 }));
        assert!(evaluate("$.count >= 100", &c));
        assert!(evaluate("$.count <= 100", &c));
        assert!(!evaluate("$.count > 100", &c));
    }

    #[test]
    fn string_numbers_compare_numerically() {
        let c = ctx(json!({ "count": "9" }));
        assert!(evaluate("$.count < 10", &c));
    }

    // Non-numeric operands compare as equal. Kept for document compatibility.
    #[test]
    fn non_numeric_ordering_compares_as_equal() {
        let c = ctx(json!({ "count": 5 }));
        assert!(!evaluate("$.count < 'abc'", &c));
        assert!(!evaluate("$.count > 'abc'", &c));
        assert!(evaluate("$.count <= 'abc'", &c));
        assert!(evaluate("$.count >= 'abc'", &c));
        assert!(evaluate("$.missing >= 3", &c));
    }

    #[test]
    fn pipe_operators() {
        let c = ctx(json!({ "name": "test", "items": [], "full": [1], "nothing": null }));
        assert!(evaluate("$.name | exists", &c));
        assert!(!evaluate("$.missing | exists", &c));
        assert!(!evaluate("$.nothing | exists", &c));
        assert!(evaluate("$.items | empty", &c));
        assert!(!evaluate("$.name | empty", &c));
        assert!(evaluate("$.missing | empty", &c));
        assert!(evaluate("$.full | !empty", &c));
        assert!(!evaluate("$.items | !empty", &c));
    }

    #[test]
    fn pipe_with_value_transform_falls_through_to_truthiness() {
        let c = ctx(json!({ "items": [1, 2] }));
        assert!(evaluate("$.items | count", &c));
        assert!(evaluate("$.items | count == 2", &c));
    }

    #[test]
    fn bare_binding_truthiness() {
        let c = ctx(json!({ "flag": true, "off": false, "zero": 0, "text": "x" }));
        assert!(evaluate("$.flag", &c));
        assert!(!evaluate("$.off", &c));
        assert!(!evaluate("$.zero", &c));
        assert!(evaluate("  $.text  ", &c));
        assert!(!evaluate("$.missing", &c));
    }

    #[test]
    fn free_text_is_false() {
        let c = ctx(json!({}));
        assert!(!evaluate("always", &c));
        assert!(!evaluate("", &c));
    }

    #[test]
    fn empty_predicate() {
        assert!(is_empty(Some(&TaggedValue::Array(vec![]))));
        assert!(is_empty(Some(&TaggedValue::from(""))));
        assert!(is_empty(None));
        assert!(!is_empty(Some(&TaggedValue::Int(0))));
        assert!(!is_empty(Some(&TaggedValue::Bool(false))));
    }

    #[test]
    fn truthy_predicate() {
        assert!(!is_truthy(Some(&TaggedValue::Bool(false))));
        assert!(!is_truthy(Some(&TaggedValue::Int(0))));
        assert!(!is_truthy(Some(&TaggedValue::Double(0.0))));
        assert!(is_truthy(Some(&TaggedValue::from("x"))));
        assert!(!is_truthy(Some(&TaggedValue::from(""))));
        assert!(is_truthy(Some(&TaggedValue::from(json!({ "k": 1 })))));
    }
}
