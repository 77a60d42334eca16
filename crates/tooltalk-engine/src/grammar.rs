//! Markers and tag scanning for the text-embedded wire grammar.
//!
//! The protocol is deliberately not full XML: tags carry no attributes, do
//! not self-close, and never nest a tag inside one of the same name. A
//! linear scanner is enough, and none of the surrounding ecosystem pulls in
//! an XML crate for this shape of data.

use tooltalk_core::{Error, Result};

/// Opens an invocation block in assistant output.
pub const TOOL_CALLS_OPEN: &str = "<tool_calls>";
/// Closes an invocation block. Registered as a model stop sequence so
/// generation halts exactly at the end of a tool request.
pub const TOOL_CALLS_CLOSE: &str = "</tool_calls>";

/// Opens the result block fed back to the model as a user turn.
pub const TOOL_RESULTS_OPEN: &str = "<tool_results>";
pub const TOOL_RESULTS_CLOSE: &str = "</tool_results>";

/// Markers bounding the JSON object produced by the secondary
/// parameter-resolution call. The closing marker doubles as that call's
/// stop sequence.
pub const JSON_OPEN: &str = "<json>";
pub const JSON_CLOSE: &str = "</json>";

/// Finds the first `<name>…</name>` element in `text`.
///
/// Returns the inner text and the offset just past the closing tag, or
/// `None` when no opening tag is present. An opening tag without its
/// closing tag is a parse error.
pub(crate) fn find_element<'a>(text: &'a str, name: &str) -> Result<Option<(&'a str, usize)>> {
    let open = format!("<{name}>");
    let Some(start) = text.find(&open) else {
        return Ok(None);
    };
    let inner_start = start + open.len();
    let close = format!("</{name}>");
    let Some(rel) = text[inner_start..].find(&close) else {
        return Err(Error::parse_error(format!("unclosed <{name}> element")));
    };
    let inner = &text[inner_start..inner_start + rel];
    Ok(Some((inner, inner_start + rel + close.len())))
}

/// Scans a sequence of sibling `<name>value</name>` elements, in order.
///
/// Used for the named-parameter children of a `<parameters>` container.
/// Anything that is not a well-formed child element is a parse error.
pub(crate) fn child_elements(text: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let Some(after_open) = trimmed.strip_prefix('<') else {
            let snippet: String = trimmed.chars().take(30).collect();
            return Err(Error::parse_error(format!(
                "unexpected text where a tag was expected: '{snippet}'"
            )));
        };
        let Some(gt) = after_open.find('>') else {
            return Err(Error::parse_error("unterminated tag"));
        };
        let name = &after_open[..gt];
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::parse_error(format!("invalid tag name '{name}'")));
        }
        let body = &after_open[gt + 1..];
        let close = format!("</{name}>");
        let Some(end) = body.find(&close) else {
            return Err(Error::parse_error(format!("unclosed <{name}> element")));
        };
        out.push((name.to_string(), body[..end].trim().to_string()));
        rest = &body[end + close.len()..];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_element() {
        let (inner, end) = find_element("a <x>hi</x> b", "x").unwrap().unwrap();
        assert_eq!(inner, "hi");
        assert_eq!(&"a <x>hi</x> b"[end..], " b");

        assert!(find_element("no tags here", "x").unwrap().is_none());
        assert!(find_element("<x>unclosed", "x").is_err());
    }

    #[test]
    fn test_child_elements() {
        let pairs = child_elements("\n<city>Paris</city>\n<days>3</days>\n").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("city".to_string(), "Paris".to_string()),
                ("days".to_string(), "3".to_string()),
            ]
        );

        assert!(child_elements("<city>Paris").is_err());
        assert!(child_elements("stray text").is_err());
    }
}
