use std::collections::HashMap;

use crate::dom::Dom;
use crate::{Error, Result};

/// Parses markup into a fresh document.
///
/// Scripts and styles are kept as raw text and never executed; page behavior
/// comes from the controllers attached to the [`Page`](crate::Page).
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();

    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            if let Some(end) = find_subslice(bytes, i + 4, b"-->") {
                i = end + 3;
            } else {
                return Err(Error::HtmlParse("unclosed HTML comment".into()));
            }
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;

                // Stray end tags with no open counterpart are ignored.
                if let Some(open_at) = stack
                    .iter()
                    .rposition(|node| dom.is_tag(*node, &tag))
                    .filter(|idx| *idx > 0)
                {
                    stack.truncate(open_at);
                }
                continue;
            }

            if starts_with_at(bytes, i, b"<!") || starts_with_at(bytes, i, b"<?") {
                i = skip_declaration(bytes, i)?;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            let escapable = is_escapable_raw_text_tag(&tag);
            if (escapable || is_raw_text_tag(&tag)) && !self_closing {
                let close = find_case_insensitive_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        let text = if escapable {
                            decode_html_character_references(body)
                        } else {
                            body.to_string()
                        };
                        dom.create_text(node, text);
                    }
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            if !text.is_empty() {
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                dom.create_text(parent, decode_html_character_references(text));
            }
        }
    }

    dom.initialize_form_control_values()?;
    Ok(dom)
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

    skip_ws(bytes, &mut i);
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    if tag.is_empty() {
        return Err(Error::HtmlParse(format!("empty tag name at byte {at}")));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unclosed <{tag}> start tag")));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'>' {
            self_closing = true;
            i += 2;
            break;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        if name.is_empty() {
            return Err(Error::HtmlParse(format!(
                "invalid attribute name in <{tag}>"
            )));
        }

        skip_ws(bytes, &mut i);

        let value = if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, bytes, &mut i)?
        } else {
            String::new()
        };

        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;

    if !(bytes.get(i) == Some(&b'<') && bytes.get(i + 1) == Some(&b'/')) {
        return Err(Error::HtmlParse("expected end tag".into()));
    }
    i += 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse("unclosed end tag".into()));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        *i += 1;
        return Ok(decode_html_character_references(value));
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !(bytes[*i] == b'/' && *i + 1 < bytes.len() && bytes[*i + 1] == b'>')
    {
        *i += 1;
    }

    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_html_character_references(value))
}

fn skip_declaration(bytes: &[u8], at: usize) -> Result<usize> {
    find_subslice(bytes, at, b">")
        .map(|end| end + 1)
        .ok_or_else(|| Error::HtmlParse("unclosed markup declaration".into()))
}

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "copy" => Some('©'),
            "reg" => Some('®'),
            "trade" => Some('™'),
            "hellip" => Some('…'),
            "middot" => Some('·'),
            "mdash" => Some('—'),
            "ndash" => Some('–'),
            "rsquo" => Some('’'),
            "lsquo" => Some('‘'),
            "rdquo" => Some('”'),
            "ldquo" => Some('“'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail.find(';').and_then(|semicolon| {
            let raw = &tail[..semicolon];
            let ch = match raw.strip_prefix('#') {
                Some(numeric) => decode_numeric(numeric),
                None => decode_named(raw),
            }?;
            Some((ch, semicolon))
        });

        match decoded {
            Some((ch, semicolon)) => {
                out.push(ch);
                rest = &tail[semicolon + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

// Text only, but character references still decode.
fn is_escapable_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "textarea" | "title")
}

fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|window| window == needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn find_case_insensitive_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut needle = Vec::with_capacity(tag.len() + 2);
    needle.extend_from_slice(b"</");
    needle.extend(tag.iter().map(|b| b.to_ascii_lowercase()));

    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(&needle))
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_markup_and_attributes() -> Result<()> {
        let dom = parse_html(
            r#"<!DOCTYPE html>
            <html><body>
              <form id="contactForm" novalidate>
                <input type="text" data-testid="test-contact-name" value="Ada">
                <textarea data-testid="test-contact-message">Hello there</textarea>
                <button type="submit"><span class="button-text">Send Message</span></button>
              </form>
            </body></html>"#,
        )?;

        let form = dom
            .by_id("contactForm")
            .ok_or_else(|| Error::HtmlParse("form missing".into()))?;
        assert_eq!(dom.attr(form, "novalidate").as_deref(), Some(""));

        let name = dom
            .query_selector("[data-testid='test-contact-name']")?
            .ok_or_else(|| Error::HtmlParse("name missing".into()))?;
        assert_eq!(dom.value(name)?, "Ada");

        let message = dom
            .query_selector("textarea")?
            .ok_or_else(|| Error::HtmlParse("textarea missing".into()))?;
        assert_eq!(dom.value(message)?, "Hello there");

        let label = dom
            .query_selector("#contactForm .button-text")?
            .ok_or_else(|| Error::HtmlParse("label missing".into()))?;
        assert_eq!(dom.text_content(label), "Send Message");
        Ok(())
    }

    #[test]
    fn script_bodies_stay_raw_text() -> Result<()> {
        let dom = parse_html("<p id='a'>x</p><script>if (a < b) { go('</p>'); }</script><p id='b'>y</p>")?;
        assert!(dom.by_id("a").is_some());
        let b = dom
            .by_id("b")
            .ok_or_else(|| Error::HtmlParse("b missing".into()))?;
        assert_eq!(dom.text_content(b), "y");
        Ok(())
    }

    #[test]
    fn textarea_content_is_decoded_text() -> Result<()> {
        let mut dom = parse_html(
            "<form id='f'><textarea id='t'>a <b> &amp; c</textarea><p id='after'>z</p></form>",
        )?;
        let textarea = dom
            .by_id("t")
            .ok_or_else(|| Error::HtmlParse("t missing".into()))?;
        assert_eq!(dom.value(textarea)?, "a <b> & c");
        assert!(dom.by_id("after").is_some());

        let form = dom
            .by_id("f")
            .ok_or_else(|| Error::HtmlParse("f missing".into()))?;
        dom.set_value(textarea, "changed")?;
        dom.reset_form(form)?;
        assert_eq!(dom.value(textarea)?, "a <b> & c");
        Ok(())
    }

    #[test]
    fn decodes_character_references() {
        assert_eq!(
            decode_html_character_references("Tom &amp; Jerry &#169; &#x41; &bogus; &"),
            "Tom & Jerry © A &bogus; &"
        );
    }

    #[test]
    fn stray_end_tags_are_ignored() -> Result<()> {
        let dom = parse_html("<div id='outer'></span><p id='inner'>t</p></div>")?;
        let inner = dom
            .by_id("inner")
            .ok_or_else(|| Error::HtmlParse("inner missing".into()))?;
        let outer = dom
            .by_id("outer")
            .ok_or_else(|| Error::HtmlParse("outer missing".into()))?;
        assert_eq!(dom.parent(inner), Some(outer));
        Ok(())
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        assert!(matches!(
            parse_html("<p>a</p><!-- open"),
            Err(Error::HtmlParse(_))
        ));
    }
}
