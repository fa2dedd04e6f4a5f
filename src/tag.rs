//! `"$type": { "$from": "...", "$import": "..." }` extraction.
//!
//! Tolerant pattern matching over raw text: the rest of the document does not
//! need to parse. A missing or malformed tag yields `None` (untagged document).
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeTag {
    /// Relative path of the type's source, as written in `$from`.
    pub from: String,
    /// Exported type name, as written in `$import`.
    pub import: String,
}

// string body allows escapes; unescaped via serde_json afterwards
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""\$type"\s*:\s*\{\s*"\$(from|import)"\s*:\s*("(?:[^"\\\n]|\\.)*")\s*,\s*"\$(from|import)"\s*:\s*("(?:[^"\\\n]|\\.)*")\s*\}"#,
    )
    .expect("tag regex")
});

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier regex"));

pub fn extract(text: &str) -> Option<TypeTag> {
    let caps = TAG_RE.captures(text)?;
    let (key_a, key_b) = (&caps[1], &caps[3]);
    if key_a == key_b {
        return None;
    }
    let val_a = unescape(&caps[2])?;
    let val_b = unescape(&caps[4])?;
    let (from, import) = if key_a == "from" { (val_a, val_b) } else { (val_b, val_a) };

    // both values get spliced into the synthesized header
    if from.is_empty() || from.contains(['"', '\n', '\r']) || !IDENT_RE.is_match(&import) {
        return None;
    }
    Some(TypeTag { from, import })
}

fn unescape(quoted: &str) -> Option<String> {
    serde_json::from_str::<String>(quoted).ok()
}
