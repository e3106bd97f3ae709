//! HTML stripping for storefront description fields.
//!
//! Descriptions arrive as HTML fragments; they are stored and served
//! as plain text. Tags are removed, entities decoded, and whitespace
//! runs collapsed to single spaces.

use std::sync::OnceLock;

use regex::Regex;

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Strip tags, decode entities, collapse whitespace, trim.
pub fn strip_html(input: &str) -> String {
    let without_tags = tag_re().replace_all(input, " ");
    let decoded = decode_entities(&without_tags);
    ws_re().replace_all(&decoded, " ").trim().to_owned()
}

/// Decode the named entities that actually occur in storefront text
/// plus numeric (`&#NN;` / `&#xNN;`) references. Unrecognized entities
/// pass through verbatim.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            // Entities are short; anything longer is not one.
            Some(semi) if semi <= 10 => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(ch) => out.push_str(&ch),
                    None => out.push_str(&tail[..=semi]),
                }
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        _ => {
            let code = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))?;
            return char::from_u32(code).map(String::from);
        }
    };
    Some(decoded.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn decodes_named_entities() {
        assert_eq!(strip_html("Fish &amp; Chips &lt;3"), "Fish & Chips <3");
        assert_eq!(strip_html("a&nbsp;b"), "a b");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(strip_html("caf&#233;"), "café");
        assert_eq!(strip_html("caf&#xE9;"), "café");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            strip_html("<h1>Title</h1>\n\n   Body\ttext  "),
            "Title Body text"
        );
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(strip_html("x &bogus; y"), "x &bogus; y");
        assert_eq!(strip_html("lone & ampersand"), "lone & ampersand");
    }

    #[test]
    fn empty_input() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("<br/>"), "");
    }
}
