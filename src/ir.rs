// Structural type descriptions. Read-only trees handed to the matcher.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Number,
    String,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ty {
    Any,
    Never,                   // only an absent value conforms
    Null,                    // exactly null
    Undefined,               // exactly absent
    NumberLiteral { value: f64 },
    StringLiteral { value: String },
    Primitive { primitive: Primitive },
    Object {
        properties: Vec<Property>, // declaration order, kept for stable reporting
    },
    Union { members: Vec<Ty> },
    Intersection { members: Vec<Ty> },
    /// Shapes the matcher does not descend into (arrays, tuples, functions, ...).
    Unsupported { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Ty,
    #[serde(default)]
    pub optional: bool,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
        }
    }
}

impl Property {
    pub fn required(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty, optional: false }
    }
    pub fn optional(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty, optional: true }
    }
}

impl Ty {
    pub fn number() -> Self { Ty::Primitive { primitive: Primitive::Number } }
    pub fn string() -> Self { Ty::Primitive { primitive: Primitive::String } }
    pub fn boolean() -> Self { Ty::Primitive { primitive: Primitive::Boolean } }
    pub fn number_lit(value: f64) -> Self { Ty::NumberLiteral { value } }
    pub fn string_lit(value: impl Into<String>) -> Self { Ty::StringLiteral { value: value.into() } }
    pub fn object(properties: Vec<Property>) -> Self { Ty::Object { properties } }
    pub fn union(members: Vec<Ty>) -> Self { Ty::Union { members } }
    pub fn intersection(members: Vec<Ty>) -> Self { Ty::Intersection { members } }

    /// Human-readable rendering, close to how the type would be written in source.
    pub fn describe(&self) -> String {
        match self {
            Ty::Any => "any".to_string(),
            Ty::Never => "never".to_string(),
            Ty::Null => "null".to_string(),
            Ty::Undefined => "undefined".to_string(),
            Ty::NumberLiteral { value } => render_number(*value),
            Ty::StringLiteral { value } => {
                serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
            }
            Ty::Primitive { primitive } => primitive.as_str().to_string(),
            Ty::Object { properties } => {
                if properties.is_empty() {
                    return "{}".to_string();
                }
                let fields = properties
                    .iter()
                    .map(|p| {
                        let mark = if p.optional { "?" } else { "" };
                        format!("{}{mark}: {}", p.name, p.ty.describe())
                    })
                    .collect::<Vec<_>>();
                format!("{{ {} }}", fields.join("; "))
            }
            Ty::Union { members } => join_members(members, " | "),
            Ty::Intersection { members } => join_members(members, " & "),
            Ty::Unsupported { name } => name.clone(),
        }
    }
}

fn join_members(members: &[Ty], sep: &str) -> String {
    if members.is_empty() {
        return "never".to_string();
    }
    members
        .iter()
        .map(|m| match m {
            // parenthesize nested compound members so `A | (B & C)` stays readable
            Ty::Union { .. } | Ty::Intersection { .. } => format!("({})", m.describe()),
            _ => m.describe(),
        })
        .collect::<Vec<_>>()
        .join(sep)
}

// prefer integer rendering when exact
fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
