//! FILENAME: src/filter/predicates.rs
//! PURPOSE: Typed, serializable filter predicates evaluated against a
//! single cell's value.
//! CONTEXT: Shaped after an autofilter predicate vocabulary
//! (`FilterOn`, `DynamicFilterCriteria`); reshaped into a closed sum type
//! with a uniform `test`/`description`/`serialize` surface so the filter
//! manager can compose one predicate per column without matching on a
//! dozen unrelated structs.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// Text-matching mode for `TextPredicate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextPredicate {
    Equals(String),
    NotEquals(String),
    Contains(String),
    NotContains(String),
    StartsWith(String),
    EndsWith(String),
    Blank,
    NotBlank,
}

/// Numeric comparison mode for `NumberPredicate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberPredicate {
    Equals(f64),
    NotEquals(f64),
    GreaterThan(f64),
    GreaterThanOrEqual(f64),
    LessThan(f64),
    LessThanOrEqual(f64),
    Between(f64, f64),
    NotBetween(f64, f64),
}

/// Date bucket comparison. `value` is milliseconds since the Unix epoch —
/// the filter engine's date-coercion boundary, distinct from the
/// conditional-formatting engine's Excel-serial boundary (the two call
/// sites coerce the same raw number under different units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePredicate {
    Before(i64),
    After(i64),
    OnOrBefore(i64),
    OnOrAfter(i64),
    Between(i64, i64),
    Equals(i64),
}

/// Boolean combinator applied across a `CompositePredicate`'s children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositeOp {
    And,
    Or,
}

/// The closed predicate sum type. Every variant implements the same
/// `test`/`description`/`serialize` surface via the inherent methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterPredicate {
    Text(TextPredicate),
    Number(NumberPredicate),
    Date(DatePredicate),
    IsNull,
    IsNotNull,
    Composite {
        op: CompositeOp,
        children: Vec<FilterPredicate>,
    },
}

/// Interprets a raw numeric cell value as milliseconds since the Unix
/// epoch — the filter engine's date-coercion policy (see module doc).
pub fn coerce_date_ms(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Number(n) => Some(*n as i64),
        _ => None,
    }
}

impl FilterPredicate {
    /// Builds a non-empty AND composite, failing on an empty child list.
    pub fn and(children: Vec<FilterPredicate>) -> Result<FilterPredicate, crate::error::EngineError> {
        if children.is_empty() {
            return Err(crate::error::EngineError::EmptyComposite);
        }
        Ok(FilterPredicate::Composite {
            op: CompositeOp::And,
            children,
        })
    }

    pub fn or(children: Vec<FilterPredicate>) -> Result<FilterPredicate, crate::error::EngineError> {
        if children.is_empty() {
            return Err(crate::error::EngineError::EmptyComposite);
        }
        Ok(FilterPredicate::Composite {
            op: CompositeOp::Or,
            children,
        })
    }

    /// Evaluates the predicate against a cell's value.
    pub fn test(&self, value: &CellValue) -> bool {
        match self {
            FilterPredicate::Text(p) => Self::test_text(p, value),
            FilterPredicate::Number(p) => Self::test_number(p, value),
            FilterPredicate::Date(p) => Self::test_date(p, value),
            FilterPredicate::IsNull => value.is_empty(),
            FilterPredicate::IsNotNull => !value.is_empty(),
            FilterPredicate::Composite { op, children } => match op {
                CompositeOp::And => children.iter().all(|c| c.test(value)),
                CompositeOp::Or => children.iter().any(|c| c.test(value)),
            },
        }
    }

    fn test_text(predicate: &TextPredicate, value: &CellValue) -> bool {
        let text = value.as_text();
        match predicate {
            TextPredicate::Equals(s) => text.eq_ignore_ascii_case(s),
            TextPredicate::NotEquals(s) => !text.eq_ignore_ascii_case(s),
            TextPredicate::Contains(s) => text.to_lowercase().contains(&s.to_lowercase()),
            TextPredicate::NotContains(s) => !text.to_lowercase().contains(&s.to_lowercase()),
            TextPredicate::StartsWith(s) => text.to_lowercase().starts_with(&s.to_lowercase()),
            TextPredicate::EndsWith(s) => text.to_lowercase().ends_with(&s.to_lowercase()),
            TextPredicate::Blank => text.is_empty(),
            TextPredicate::NotBlank => !text.is_empty(),
        }
    }

    fn test_number(predicate: &NumberPredicate, value: &CellValue) -> bool {
        let n = match value.as_number() {
            Some(n) => n,
            None => return false,
        };
        match *predicate {
            NumberPredicate::Equals(x) => n == x,
            NumberPredicate::NotEquals(x) => n != x,
            NumberPredicate::GreaterThan(x) => n > x,
            NumberPredicate::GreaterThanOrEqual(x) => n >= x,
            NumberPredicate::LessThan(x) => n < x,
            NumberPredicate::LessThanOrEqual(x) => n <= x,
            NumberPredicate::Between(lo, hi) => n >= lo && n <= hi,
            NumberPredicate::NotBetween(lo, hi) => !(n >= lo && n <= hi),
        }
    }

    fn test_date(predicate: &DatePredicate, value: &CellValue) -> bool {
        let ms = match coerce_date_ms(value) {
            Some(ms) => ms,
            None => return false,
        };
        match *predicate {
            DatePredicate::Before(x) => ms < x,
            DatePredicate::After(x) => ms > x,
            DatePredicate::OnOrBefore(x) => ms <= x,
            DatePredicate::OnOrAfter(x) => ms >= x,
            DatePredicate::Between(lo, hi) => ms >= lo && ms <= hi,
            DatePredicate::Equals(x) => ms == x,
        }
    }

    /// A short human-readable description, surfaced in filter-pill UI.
    pub fn description(&self) -> String {
        match self {
            FilterPredicate::Text(p) => match p {
                TextPredicate::Equals(s) => format!("is \"{}\"", s),
                TextPredicate::NotEquals(s) => format!("is not \"{}\"", s),
                TextPredicate::Contains(s) => format!("contains \"{}\"", s),
                TextPredicate::NotContains(s) => format!("does not contain \"{}\"", s),
                TextPredicate::StartsWith(s) => format!("starts with \"{}\"", s),
                TextPredicate::EndsWith(s) => format!("ends with \"{}\"", s),
                TextPredicate::Blank => "is blank".to_string(),
                TextPredicate::NotBlank => "is not blank".to_string(),
            },
            FilterPredicate::Number(p) => match *p {
                NumberPredicate::Equals(x) => format!("= {}", x),
                NumberPredicate::NotEquals(x) => format!("≠ {}", x),
                NumberPredicate::GreaterThan(x) => format!("> {}", x),
                NumberPredicate::GreaterThanOrEqual(x) => format!(">= {}", x),
                NumberPredicate::LessThan(x) => format!("< {}", x),
                NumberPredicate::LessThanOrEqual(x) => format!("<= {}", x),
                NumberPredicate::Between(lo, hi) => format!("between {} and {}", lo, hi),
                NumberPredicate::NotBetween(lo, hi) => format!("not between {} and {}", lo, hi),
            },
            FilterPredicate::Date(p) => match *p {
                DatePredicate::Before(x) => format!("before {}", x),
                DatePredicate::After(x) => format!("after {}", x),
                DatePredicate::OnOrBefore(x) => format!("on or before {}", x),
                DatePredicate::OnOrAfter(x) => format!("on or after {}", x),
                DatePredicate::Between(lo, hi) => format!("between {} and {}", lo, hi),
                DatePredicate::Equals(x) => format!("= {}", x),
            },
            FilterPredicate::IsNull => "is empty".to_string(),
            FilterPredicate::IsNotNull => "is not empty".to_string(),
            FilterPredicate::Composite { op, children } => {
                let joiner = match op {
                    CompositeOp::And => " AND ",
                    CompositeOp::Or => " OR ",
                };
                children
                    .iter()
                    .map(|c| c.description())
                    .collect::<Vec<_>>()
                    .join(joiner)
            }
        }
    }

    /// Serializes the predicate to its `{type, params}` wire form, using a
    /// flat type-tag vocabulary (`text.contains`, `number.gt`, ...).
    pub fn serialize(&self) -> serde_json::Value {
        match self {
            FilterPredicate::Text(p) => match p {
                TextPredicate::Contains(s) => tagged("text.contains", serde_json::json!({ "value": s })),
                TextPredicate::NotContains(s) => tagged("text.notContains", serde_json::json!({ "value": s })),
                TextPredicate::StartsWith(s) => tagged("text.beginsWith", serde_json::json!({ "value": s })),
                TextPredicate::EndsWith(s) => tagged("text.endsWith", serde_json::json!({ "value": s })),
                TextPredicate::Equals(s) => tagged("text.equals", serde_json::json!({ "value": s })),
                TextPredicate::NotEquals(s) => tagged("text.notEquals", serde_json::json!({ "value": s })),
                TextPredicate::Blank => tagged("text.isBlank", serde_json::json!({})),
                TextPredicate::NotBlank => tagged("text.isNotBlank", serde_json::json!({})),
            },
            FilterPredicate::Number(p) => match *p {
                NumberPredicate::GreaterThan(x) => tagged("number.gt", serde_json::json!({ "value": x })),
                NumberPredicate::GreaterThanOrEqual(x) => tagged("number.gte", serde_json::json!({ "value": x })),
                NumberPredicate::LessThan(x) => tagged("number.lt", serde_json::json!({ "value": x })),
                NumberPredicate::LessThanOrEqual(x) => tagged("number.lte", serde_json::json!({ "value": x })),
                NumberPredicate::Between(lo, hi) => tagged("number.between", serde_json::json!({ "min": lo, "max": hi })),
                NumberPredicate::NotBetween(lo, hi) => tagged("number.notBetween", serde_json::json!({ "min": lo, "max": hi })),
                NumberPredicate::Equals(x) => tagged("number.equals", serde_json::json!({ "value": x })),
                NumberPredicate::NotEquals(x) => tagged("number.notEquals", serde_json::json!({ "value": x })),
            },
            FilterPredicate::Date(p) => match *p {
                DatePredicate::Before(x) => tagged("date.before", serde_json::json!({ "value": x })),
                DatePredicate::After(x) => tagged("date.after", serde_json::json!({ "value": x })),
                DatePredicate::OnOrBefore(x) => tagged("date.onOrBefore", serde_json::json!({ "value": x })),
                DatePredicate::OnOrAfter(x) => tagged("date.onOrAfter", serde_json::json!({ "value": x })),
                DatePredicate::Between(lo, hi) => tagged("date.between", serde_json::json!({ "min": lo, "max": hi })),
                DatePredicate::Equals(x) => tagged("date.equals", serde_json::json!({ "value": x })),
            },
            FilterPredicate::IsNull => tagged("null.isEmpty", serde_json::json!({})),
            FilterPredicate::IsNotNull => tagged("null.isNotEmpty", serde_json::json!({})),
            FilterPredicate::Composite { op, children } => {
                let tag = match op {
                    CompositeOp::And => "composite.and",
                    CompositeOp::Or => "composite.or",
                };
                let children: Vec<serde_json::Value> = children.iter().map(FilterPredicate::serialize).collect();
                tagged(tag, serde_json::json!({ "children": children }))
            }
        }
    }

    /// Parses a predicate back from its `{type, params}` wire form.
    /// An unrecognized `type` tag (or a malformed wire object with no tag
    /// at all) reports `UnknownPredicateType` rather than panicking.
    pub fn deserialize(wire: &serde_json::Value) -> crate::error::EngineResult<FilterPredicate> {
        let tag = wire
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| crate::error::EngineError::UnknownPredicateType(wire.to_string()))?;
        let params = wire.get("params").cloned().unwrap_or(serde_json::Value::Null);
        let num = |key: &str| params.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
        let int = |key: &str| params.get(key).and_then(|v| v.as_i64()).unwrap_or(0);
        let text = |key: &str| params.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string();

        Ok(match tag {
            "text.contains" => FilterPredicate::Text(TextPredicate::Contains(text("value"))),
            "text.notContains" => FilterPredicate::Text(TextPredicate::NotContains(text("value"))),
            "text.beginsWith" => FilterPredicate::Text(TextPredicate::StartsWith(text("value"))),
            "text.endsWith" => FilterPredicate::Text(TextPredicate::EndsWith(text("value"))),
            "text.equals" => FilterPredicate::Text(TextPredicate::Equals(text("value"))),
            "text.notEquals" => FilterPredicate::Text(TextPredicate::NotEquals(text("value"))),
            "text.isBlank" => FilterPredicate::Text(TextPredicate::Blank),
            "text.isNotBlank" => FilterPredicate::Text(TextPredicate::NotBlank),
            "number.gt" => FilterPredicate::Number(NumberPredicate::GreaterThan(num("value"))),
            "number.gte" => FilterPredicate::Number(NumberPredicate::GreaterThanOrEqual(num("value"))),
            "number.lt" => FilterPredicate::Number(NumberPredicate::LessThan(num("value"))),
            "number.lte" => FilterPredicate::Number(NumberPredicate::LessThanOrEqual(num("value"))),
            "number.between" => FilterPredicate::Number(NumberPredicate::Between(num("min"), num("max"))),
            "number.notBetween" => FilterPredicate::Number(NumberPredicate::NotBetween(num("min"), num("max"))),
            "number.equals" => FilterPredicate::Number(NumberPredicate::Equals(num("value"))),
            "number.notEquals" => FilterPredicate::Number(NumberPredicate::NotEquals(num("value"))),
            "date.before" => FilterPredicate::Date(DatePredicate::Before(int("value"))),
            "date.after" => FilterPredicate::Date(DatePredicate::After(int("value"))),
            "date.onOrBefore" => FilterPredicate::Date(DatePredicate::OnOrBefore(int("value"))),
            "date.onOrAfter" => FilterPredicate::Date(DatePredicate::OnOrAfter(int("value"))),
            "date.between" => FilterPredicate::Date(DatePredicate::Between(int("min"), int("max"))),
            "date.equals" => FilterPredicate::Date(DatePredicate::Equals(int("value"))),
            "null.isEmpty" => FilterPredicate::IsNull,
            "null.isNotEmpty" => FilterPredicate::IsNotNull,
            "composite.and" | "composite.or" => {
                let children_json = params.get("children").and_then(|v| v.as_array()).cloned().unwrap_or_default();
                let children = children_json
                    .iter()
                    .map(FilterPredicate::deserialize)
                    .collect::<crate::error::EngineResult<Vec<_>>>()?;
                if tag == "composite.and" {
                    FilterPredicate::and(children)?
                } else {
                    FilterPredicate::or(children)?
                }
            }
            other => return Err(crate::error::EngineError::UnknownPredicateType(other.to_string())),
        })
    }
}

fn tagged(type_tag: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "type": type_tag, "params": params })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_contains_case_insensitive() {
        let p = FilterPredicate::Text(TextPredicate::Contains("ell".to_string()));
        assert!(p.test(&CellValue::String("Hello".to_string())));
        assert!(!p.test(&CellValue::String("World".to_string())));
    }

    #[test]
    fn test_number_between() {
        let p = FilterPredicate::Number(NumberPredicate::Between(1.0, 10.0));
        assert!(p.test(&CellValue::Number(5.0)));
        assert!(!p.test(&CellValue::Number(11.0)));
    }

    #[test]
    fn test_number_predicate_non_numeric_value_fails_closed() {
        let p = FilterPredicate::Number(NumberPredicate::Equals(1.0));
        assert!(!p.test(&CellValue::String("one".to_string())));
    }

    #[test]
    fn test_is_null_and_is_not_null() {
        assert!(FilterPredicate::IsNull.test(&CellValue::Empty));
        assert!(FilterPredicate::IsNotNull.test(&CellValue::Number(0.0)));
    }

    #[test]
    fn test_composite_and() {
        let p = FilterPredicate::and(vec![
            FilterPredicate::Number(NumberPredicate::GreaterThan(0.0)),
            FilterPredicate::Number(NumberPredicate::LessThan(10.0)),
        ])
        .unwrap();
        assert!(p.test(&CellValue::Number(5.0)));
        assert!(!p.test(&CellValue::Number(15.0)));
    }

    #[test]
    fn test_empty_composite_errors() {
        assert!(FilterPredicate::and(vec![]).is_err());
        assert!(FilterPredicate::or(vec![]).is_err());
    }

    #[test]
    fn test_description_joins_composite_children() {
        let p = FilterPredicate::and(vec![
            FilterPredicate::Number(NumberPredicate::GreaterThan(0.0)),
            FilterPredicate::Number(NumberPredicate::LessThan(10.0)),
        ])
        .unwrap();
        assert_eq!(p.description(), "> 0 AND < 10");
    }

    #[test]
    fn test_serialize_roundtrips_through_json() {
        let p = FilterPredicate::Text(TextPredicate::Contains("x".to_string()));
        let json = p.serialize();
        let back = FilterPredicate::deserialize(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_serialize_uses_spec_tag_vocabulary() {
        let p = FilterPredicate::Number(NumberPredicate::GreaterThan(2.0));
        let json = p.serialize();
        assert_eq!(json["type"], "number.gt");
        assert_eq!(json["params"]["value"], 2.0);
    }

    #[test]
    fn test_composite_roundtrips_through_json() {
        let p = FilterPredicate::and(vec![
            FilterPredicate::Number(NumberPredicate::GreaterThan(0.0)),
            FilterPredicate::Number(NumberPredicate::LessThan(10.0)),
        ])
        .unwrap();
        let back = FilterPredicate::deserialize(&p.serialize()).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_deserialize_unknown_tag_errors() {
        let wire = serde_json::json!({ "type": "text.startsWithBanana", "params": {} });
        let err = FilterPredicate::deserialize(&wire).unwrap_err();
        assert_eq!(err, crate::error::EngineError::UnknownPredicateType("text.startsWithBanana".to_string()));
    }
}
