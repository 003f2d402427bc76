//! Locating JSON objects inside free-form model output.
//!
//! Models wrap JSON in prose or code fences, so replies are scanned for an
//! object instead of being parsed whole.

/// First balanced `{...}` in `text`. Braces inside string literals are ignored.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Span from the first `{` to the last `}`.
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the first balanced object, falling back to the outermost span.
pub fn parse_embedded_object(text: &str) -> Option<serde_json::Value> {
    let parse = |candidate: &str| {
        serde_json::from_str::<serde_json::Value>(candidate)
            .ok()
            .filter(|v| v.is_object())
    };

    first_balanced_object(text)
        .and_then(parse)
        .or_else(|| outermost_object(text).and_then(parse))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_object_inside_prose() {
        let text = "Sure! ```json\n{\"a\": {\"b\": 1}}\n``` hope that helps {x}";
        assert_eq!(first_balanced_object(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        let text = r#"{"english": "Look {stunning}", "hindi": "quote \" }"} trailing"#;
        assert_eq!(
            first_balanced_object(text),
            Some(r#"{"english": "Look {stunning}", "hindi": "quote \" }"}"#)
        );
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(first_balanced_object("{\"a\": 1"), None);
        assert_eq!(first_balanced_object("no json here"), None);
    }

    #[test]
    fn test_outermost_span() {
        assert_eq!(outermost_object("x {a} y {b} z"), Some("{a} y {b}"));
        assert_eq!(outermost_object("} {"), None);
    }

    #[test]
    fn test_parse_embedded_object() {
        let value = parse_embedded_object("result: {\"has_model\": true}").unwrap();
        assert_eq!(value["has_model"], true);
        assert!(parse_embedded_object("[1, 2]").is_none());
    }
}
