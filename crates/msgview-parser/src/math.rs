//! `$..$` / `$$..$$` detection in plain text.

/// Piece of a text run after math extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Math { content: &'a str, display: bool },
}

/// Split `text` into literal runs and math runs.
///
/// `$$` opens display math and `$` opens inline math. A delimiter with no
/// closing partner, or one enclosing only whitespace, stays literal.
pub(crate) fn split_math(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let display = bytes.get(i + 1) == Some(&b'$');
        let delimiter = if display { "$$" } else { "$" };
        let body_start = i + delimiter.len();

        match text[body_start..].find(delimiter) {
            Some(offset) if !text[body_start..body_start + offset].trim().is_empty() => {
                if literal_start < i {
                    segments.push(Segment::Text(&text[literal_start..i]));
                }
                segments.push(Segment::Math {
                    content: text[body_start..body_start + offset].trim(),
                    display,
                });
                i = body_start + offset + delimiter.len();
                literal_start = i;
            }
            _ => i += delimiter.len(),
        }
    }

    if literal_start < text.len() {
        segments.push(Segment::Text(&text[literal_start..]));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_inline_math() {
        assert_eq!(
            split_math("a $x^2$ b"),
            vec![
                Segment::Text("a "),
                Segment::Math {
                    content: "x^2",
                    display: false
                },
                Segment::Text(" b"),
            ]
        );
    }

    #[test]
    fn test_split_display_math() {
        assert_eq!(
            split_math("$$ E=mc^2 $$"),
            vec![Segment::Math {
                content: "E=mc^2",
                display: true
            }]
        );
    }

    #[test]
    fn test_unclosed_dollar_is_literal() {
        assert_eq!(split_math("costs $5"), vec![Segment::Text("costs $5")]);
    }

    #[test]
    fn test_whitespace_only_math_is_literal() {
        assert_eq!(split_math("$ $"), vec![Segment::Text("$ $")]);
    }

    #[test]
    fn test_plain_text_is_single_segment() {
        assert_eq!(split_math("héllo"), vec![Segment::Text("héllo")]);
        assert!(split_math("").is_empty());
    }
}
