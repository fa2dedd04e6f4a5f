// Best-effort text positions for dotted property paths.
use crate::remap::{Position, Range};

/// Range of the deepest key of `path` that can be found in `text`, walking the
/// path segment by segment. Falls back to the whole document.
pub fn locate_path(text: &str, path: &str) -> Range {
    let mut cursor = 0usize;
    let mut found: Option<(usize, usize)> = None;

    if !path.is_empty() {
        for segment in path.split('.') {
            match find_key(text, cursor, segment) {
                Some((start, end)) => {
                    found = Some((start, end));
                    cursor = end;
                }
                None => break,
            }
        }
    }

    match found {
        Some((start, end)) => Range::new(position_at(text, start), position_at(text, end)),
        None => whole_document(text),
    }
}

pub fn whole_document(text: &str) -> Range {
    Range::new(Position::default(), position_at(text, text.len()))
}

// `"segment"` followed by optional whitespace and a colon, at or after `from`
fn find_key(text: &str, from: usize, segment: &str) -> Option<(usize, usize)> {
    let needle = serde_json::to_string(segment).ok()?;
    let mut at = from;
    while let Some(rel) = text.get(at..)?.find(&needle) {
        let start = at + rel;
        let end = start + needle.len();
        if text[end..].trim_start().starts_with(':') {
            return Some((start, end));
        }
        at = end;
    }
    None
}

/// Byte offset → zero-based line and character (in chars).
pub fn position_at(text: &str, offset: usize) -> Position {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let character = before[line_start..].chars().count();
    Position::new(line as u32, character as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "{\n  \"a\": {\n    \"b\": 1,\n    \"value\": \"b\"\n  },\n  \"c\": 2\n}";

    #[test]
    fn finds_nested_key() {
        let r = locate_path(DOC, "a.b");
        assert_eq!(r.start, Position::new(2, 4));
        assert_eq!(r.end, Position::new(2, 7));
    }

    #[test]
    fn string_values_are_not_keys() {
        let r = locate_path(DOC, "a.value");
        assert_eq!(r.start, Position::new(3, 4));
    }

    #[test]
    fn missing_leaf_falls_back_to_parent() {
        let r = locate_path(DOC, "a.missing");
        assert_eq!(r.start, Position::new(1, 2));
    }

    #[test]
    fn unknown_path_covers_whole_document() {
        let r = locate_path(DOC, "zzz");
        assert_eq!(r, whole_document(DOC));
        assert_eq!(r.end, Position::new(6, 1));
        assert_eq!(locate_path(DOC, ""), whole_document(DOC));
    }
}
