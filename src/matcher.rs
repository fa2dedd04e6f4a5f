//! Structural conformance of a JSON value against a [`Ty`].
//!
//! The matcher is pure and total: it never fails, it only reports
//! [`Mismatch`]es. An empty list means the value conforms.
//!
//! - Unions conform if any member conforms; otherwise one mismatch names the
//!   union as a whole.
//! - Intersections report every member's mismatches (no short-circuit).
//! - Objects are open: undeclared properties are never flagged.
//! - Optionality excuses absence only, never `null`.
use serde::Serialize;
use serde_json::Value;

use crate::ir::{Primitive, Property, Ty};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    MissingProperty,
    TypeMismatch,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Dot-separated field path from the value root (empty for the root itself).
    pub path: String,
    pub expected: String,
    pub actual: String,
    pub kind: MismatchKind,
}

/// What to do with type shapes the matcher does not descend into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedTypes {
    /// Treat as always matching.
    #[default]
    Permit,
    /// Emit one `Unsupported` mismatch.
    Report,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    pub unsupported: UnsupportedTypes,
}

impl Mismatch {
    pub fn message(&self) -> String {
        let at = if self.path.is_empty() { "<root>" } else { self.path.as_str() };
        match self.kind {
            MismatchKind::MissingProperty => {
                format!("Property '{at}' is missing; expected {}", self.expected)
            }
            MismatchKind::TypeMismatch => {
                format!("Type '{}' is not assignable to type '{}' at '{at}'", self.actual, self.expected)
            }
            MismatchKind::Unsupported => {
                format!("Type '{}' at '{at}' cannot be checked structurally", self.expected)
            }
        }
    }
}

impl Matcher {
    pub fn new(unsupported: UnsupportedTypes) -> Self {
        Self { unsupported }
    }

    /// Match `value` (`None` = absent) against `ty`, reporting mismatches
    /// relative to `path`.
    pub fn check(&self, value: Option<&Value>, ty: &Ty, path: &str) -> Vec<Mismatch> {
        let mut out = Vec::new();
        self.check_into(value, ty, path, &mut out);
        out
    }

    fn check_into(&self, value: Option<&Value>, ty: &Ty, path: &str, out: &mut Vec<Mismatch>) {
        match ty {
            Ty::Any => {}
            Ty::Never => {
                if value.is_some() {
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::Null => {
                if !matches!(value, Some(Value::Null)) {
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::Undefined => {
                if value.is_some() {
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::Union { members } => {
                let conforms = members
                    .iter()
                    .any(|member| self.check(value, member, path).is_empty());
                if !conforms {
                    // per-member detail is not actionable for a disjunction
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::Intersection { members } => {
                for member in members {
                    self.check_into(value, member, path, out);
                }
            }
            Ty::Object { properties } => match value {
                Some(Value::Object(map)) => {
                    for Property { name, ty: prop_ty, optional } in properties {
                        let child = child_path(path, name);
                        match map.get(name) {
                            None if *optional => {}
                            None => out.push(Mismatch {
                                path: child,
                                expected: prop_ty.describe(),
                                actual: kind_of(None).to_string(),
                                kind: MismatchKind::MissingProperty,
                            }),
                            Some(v) => self.check_into(Some(v), prop_ty, &child, out),
                        }
                    }
                }
                _ => out.push(type_mismatch(path, ty, value)),
            },
            Ty::NumberLiteral { value: expected } => {
                let equal = match value {
                    Some(Value::Number(n)) => n.as_f64() == Some(*expected),
                    _ => false,
                };
                if !equal {
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::StringLiteral { value: expected } => {
                let equal = matches!(value, Some(Value::String(s)) if s == expected);
                if !equal {
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::Primitive { primitive } => {
                let ok = matches!(
                    (primitive, value),
                    (Primitive::Number, Some(Value::Number(_)))
                        | (Primitive::String, Some(Value::String(_)))
                        | (Primitive::Boolean, Some(Value::Bool(_)))
                );
                if !ok {
                    out.push(type_mismatch(path, ty, value));
                }
            }
            Ty::Unsupported { name } => {
                if self.unsupported == UnsupportedTypes::Report {
                    out.push(Mismatch {
                        path: path.to_string(),
                        expected: name.clone(),
                        actual: kind_of(value).to_string(),
                        kind: MismatchKind::Unsupported,
                    });
                }
            }
        }
    }
}

/// Permissive match from the document root.
pub fn check(value: &Value, ty: &Ty) -> Vec<Mismatch> {
    Matcher::default().check(Some(value), ty, "")
}

pub fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() { name.to_string() } else { format!("{path}.{name}") }
}

fn type_mismatch(path: &str, ty: &Ty, value: Option<&Value>) -> Mismatch {
    Mismatch {
        path: path.to_string(),
        expected: ty.describe(),
        actual: kind_of(value).to_string(),
        kind: MismatchKind::TypeMismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(ms: &[Mismatch]) -> Vec<&str> {
        ms.iter().map(|m| m.path.as_str()).collect()
    }

    #[test]
    fn union_conforms_when_any_member_does() {
        let ty = Ty::union(vec![Ty::number_lit(1.0), Ty::string_lit("x")]);
        assert!(check(&json!(1), &ty).is_empty());
        assert!(check(&json!("x"), &ty).is_empty());

        let ms = check(&json!("y"), &ty);
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].expected, r#"1 | "x""#);
        assert_eq!(ms[0].actual, "string");
    }

    #[test]
    fn intersection_concatenates_member_mismatches() {
        let a = Ty::object(vec![Property::required("p", Ty::number())]);
        let b = Ty::object(vec![Property::required("q", Ty::string())]);
        let v = json!({ "p": "no", "q": 3 });

        let mut expected = check(&v, &a);
        expected.extend(check(&v, &b));
        let got = check(&v, &Ty::intersection(vec![a, b]));
        assert_eq!(got, expected);
        assert_eq!(paths(&got), vec!["p", "q"]);
    }

    #[test]
    fn missing_required_property_reports_dotted_path() {
        let ty = Ty::object(vec![Property::required(
            "a",
            Ty::object(vec![Property::required("b", Ty::number())]),
        )]);
        let ms = check(&json!({ "a": {} }), &ty);
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].path, "a.b");
        assert_eq!(ms[0].kind, MismatchKind::MissingProperty);
        assert_eq!(ms[0].expected, "number");
    }

    #[test]
    fn optional_absence_is_excused_but_null_is_not() {
        let ty = Ty::object(vec![Property::optional("x", Ty::string())]);
        assert!(check(&json!({}), &ty).is_empty());

        let ms = check(&json!({ "x": null }), &ty);
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].actual, "null");

        let nullable = Ty::object(vec![Property::optional(
            "x",
            Ty::union(vec![Ty::string(), Ty::Null]),
        )]);
        assert!(check(&json!({ "x": null }), &nullable).is_empty());
    }

    #[test]
    fn extra_properties_are_tolerated() {
        let ty = Ty::object(vec![Property::required("a", Ty::number())]);
        assert!(check(&json!({ "a": 1, "b": "extra", "$type": {} }), &ty).is_empty());
    }

    #[test]
    fn literals_use_strict_equality() {
        assert!(check(&json!(2.0), &Ty::number_lit(2.0)).is_empty());
        assert_eq!(check(&json!("2"), &Ty::number_lit(2.0)).len(), 1);
        assert_eq!(check(&json!(3), &Ty::number_lit(2.0)).len(), 1);
        assert_eq!(check(&json!("Literal"), &Ty::string_lit("literal")).len(), 1);
    }

    #[test]
    fn terminal_kinds() {
        let m = Matcher::default();
        assert!(m.check(Some(&json!([1, 2])), &Ty::Any, "").is_empty());
        assert!(m.check(None, &Ty::Never, "").is_empty());
        assert_eq!(m.check(Some(&json!(null)), &Ty::Never, "").len(), 1);
        assert!(m.check(Some(&json!(null)), &Ty::Null, "").is_empty());
        assert_eq!(m.check(None, &Ty::Null, "").len(), 1);
        assert!(m.check(None, &Ty::Undefined, "").is_empty());
        assert_eq!(m.check(Some(&json!(null)), &Ty::Undefined, "").len(), 1);
        assert!(m.check(Some(&json!(true)), &Ty::boolean(), "").is_empty());
        assert_eq!(m.check(Some(&json!(0)), &Ty::boolean(), "").len(), 1);
    }

    #[test]
    fn unsupported_shapes_follow_policy() {
        let ty = Ty::object(vec![Property::required(
            "arr",
            Ty::Unsupported { name: "number[]".into() },
        )]);
        let v = json!({ "arr": [1, "two"] });
        assert!(Matcher::new(UnsupportedTypes::Permit).check(Some(&v), &ty, "").is_empty());

        let ms = Matcher::new(UnsupportedTypes::Report).check(Some(&v), &ty, "");
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].kind, MismatchKind::Unsupported);
        assert_eq!(ms[0].path, "arr");
    }

    #[test]
    fn non_object_against_object_type_does_not_descend() {
        let ty = Ty::object(vec![Property::required("a", Ty::number())]);
        let ms = check(&json!([]), &ty);
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].path, "");
        assert_eq!(ms[0].actual, "array");
    }

    #[test]
    fn model_document_conforms() {
        let ty = Ty::object(vec![
            Property::required("value", Ty::number()),
            Property::required("arr", Ty::Unsupported { name: "number[]".into() }),
            Property::optional("optionalProp", Ty::string()),
            Property::required(
                "enumProp",
                Ty::union(vec![
                    Ty::number_lit(1.0),
                    Ty::number_lit(2.0),
                    Ty::boolean(),
                    Ty::string_lit("literal string"),
                ]),
            ),
            Property::required(
                "nestedObj",
                Ty::object(vec![Property::required("nestedVal", Ty::number())]),
            ),
            Property::required(
                "intersectionType",
                Ty::intersection(vec![
                    Ty::object(vec![Property::required("nestedVal1", Ty::number())]),
                    Ty::object(vec![Property::required("nestedVal2", Ty::string())]),
                ]),
            ),
        ]);
        let doc = json!({
            "$type": { "$from": "./model.ts", "$import": "MyType" },
            "value": 1234,
            "arr": [56, 78, 90],
            "enumProp": 1,
            "nestedObj": { "nestedVal": 1234 },
            "intersectionType": { "nestedVal1": 1234, "nestedVal2": "abcd" }
        });
        assert!(check(&doc, &ty).is_empty());

        let bad = json!({
            "value": "1234",
            "arr": [],
            "enumProp": 3,
            "nestedObj": {},
            "intersectionType": { "nestedVal1": "x" }
        });
        let ms = check(&bad, &ty);
        assert_eq!(
            paths(&ms),
            vec![
                "value",
                "enumProp",
                "nestedObj.nestedVal",
                "intersectionType.nestedVal1",
                "intersectionType.nestedVal2",
            ]
        );
    }
}
