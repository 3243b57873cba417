//! HTML escaping and the HTML -> plain text degradation.

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape and turn newlines into `<br>`, for free-text content.
pub fn escape_multiline(input: &str) -> String {
    input.lines().map(escape).collect::<Vec<_>>().join("<br>")
}

/// Tags whose boundaries separate paragraphs (blank line in text).
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "table", "ul", "ol", "blockquote", "pre",
];

/// Tags whose boundaries start a new line.
const LINE_TAGS: &[&str] = &["div", "tr", "li", "section", "header", "footer", "hr"];

const SKIP_CONTENT_TAGS: &[&str] = &["style", "script", "head", "title"];

const CELL_SEPARATOR: &str = " | ";

/// Degrade an HTML body into readable plain text.
///
/// - tags are stripped; `<style>`/`<script>`/`<head>` content is dropped
/// - `<br>` and block boundaries become line breaks, paragraphs and
///   headings are separated by a blank line, `<li>` gets a `- ` bullet
/// - table cells are joined with ` | `, one row per line
/// - common entities are decoded
/// - horizontal whitespace is collapsed, blank-line runs are squeezed to one
///
/// Input without markup is only entity-decoded and whitespace-normalised,
/// so plain text passes through unchanged.
///
/// Entities are decoded only after all tags are gone, so escaped content
/// such as `&lt;b&gt;` comes out as a literal `<b>`. The result is plain
/// text, not HTML: feeding it back in would read that `<b>` as a tag.
pub fn html_to_text(html: &str) -> String {
    if !contains_markup(html) {
        return normalize_whitespace(&decode_entities(html));
    }

    let mut raw = String::with_capacity(html.len());
    let mut skip_depth = 0usize;
    let mut pre_depth = 0usize;
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let (before, tail) = rest.split_at(start);
        if skip_depth == 0 {
            push_text(&mut raw, before, pre_depth > 0);
        }
        let Some(tag) = Tag::parse(tail) else {
            // A '<' that does not open a tag is plain text.
            if skip_depth == 0 {
                raw.push('<');
            }
            rest = &tail[1..];
            continue;
        };
        rest = &tail[tag.len..];

        let name = tag.name.as_str();
        if SKIP_CONTENT_TAGS.contains(&name) {
            if tag.closing {
                skip_depth = skip_depth.saturating_sub(1);
            } else if !tag.self_closing {
                skip_depth += 1;
            }
            continue;
        }
        if skip_depth > 0 {
            continue;
        }
        if name == "pre" {
            if tag.closing {
                pre_depth = pre_depth.saturating_sub(1);
            } else {
                pre_depth += 1;
            }
        }

        match (name, tag.closing) {
            ("br", _) => {
                trim_trailing_blanks(&mut raw);
                raw.push('\n');
            }
            ("li", false) => {
                ensure_breaks(&mut raw, 1);
                raw.push_str("- ");
            }
            ("td" | "th", true) => raw.push_str(CELL_SEPARATOR),
            ("tr", true) => {
                trim_trailing_separator(&mut raw);
                ensure_breaks(&mut raw, 1);
            }
            (name, _) if PARAGRAPH_TAGS.contains(&name) => ensure_breaks(&mut raw, 2),
            (name, _) if LINE_TAGS.contains(&name) => ensure_breaks(&mut raw, 1),
            _ => {}
        }
    }
    if skip_depth == 0 {
        push_text(&mut raw, rest, pre_depth > 0);
    }

    normalize_whitespace(&decode_entities(&raw))
}

/// Whether `input` has at least one `<` that opens a tag.
fn contains_markup(input: &str) -> bool {
    input.match_indices('<').any(|(i, _)| {
        input[i + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
    })
}

/// Append a text node. Source newlines are plain whitespace outside `<pre>`.
fn push_text(raw: &mut String, text: &str, preformatted: bool) {
    if preformatted {
        raw.push_str(text);
    } else {
        raw.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
    }
}

fn trim_trailing_blanks(buf: &mut String) {
    let len = buf.trim_end_matches([' ', '\t']).len();
    buf.truncate(len);
}

/// Make the buffer end in at least `n` line breaks. No-op on an empty
/// buffer so the text never starts with blank lines.
fn ensure_breaks(buf: &mut String, n: usize) {
    trim_trailing_blanks(buf);
    if buf.is_empty() {
        return;
    }
    let trailing = buf.len() - buf.trim_end_matches('\n').len();
    for _ in trailing..n {
        buf.push('\n');
    }
}

fn trim_trailing_separator(buf: &mut String) {
    trim_trailing_blanks(buf);
    if buf.ends_with('|') {
        buf.pop();
    }
}

struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
    len: usize,
}

impl Tag {
    /// Parse a tag at the start of `input` (which begins with `<`).
    fn parse(input: &str) -> Option<Tag> {
        let body = &input[1..];
        let first = body.chars().next()?;
        if !(first.is_ascii_alphabetic() || first == '/' || first == '!') {
            return None;
        }
        let end = body.find('>')?;
        let inner = &body[..end];
        let closing = inner.starts_with('/');
        let name: String = inner
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Some(Tag {
            name,
            closing,
            self_closing: inner.ends_with('/'),
            len: end + 2,
        })
    }
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail[1..].find(';').filter(|&i| i <= 8) {
            Some(end) => {
                let entity = &tail[1..=end];
                match decode_entity(entity) {
                    Some(c) => {
                        out.push(c);
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn normalize_whitespace(input: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = false;
    for line in input.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !blank_run && !lines.is_empty() {
                lines.push(String::new());
            }
            blank_run = true;
        } else {
            lines.push(collapsed);
            blank_run = false;
        }
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_markup_survives_as_literal_text() {
        let html = format!("<p>Use {} here</p>", escape("<b and c>"));
        assert_eq!(html_to_text(&html), "Use <b and c> here");
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn strips_tags_and_breaks_blocks() {
        let html = "<h1>Welcome</h1><p>Hello <strong>Ana</strong>,</p><p>see you<br>soon</p>";
        assert_eq!(html_to_text(html), "Welcome\n\nHello Ana,\n\nsee you\nsoon");
    }

    #[test]
    fn tables_become_pipe_delimited_rows() {
        let html = "<table><tr><th>Name</th><th>Position</th></tr>\
                    <tr><td>Ana</td><td>Analyst</td></tr></table>";
        assert_eq!(html_to_text(html), "Name | Position\nAna | Analyst");
    }

    #[test]
    fn list_items_get_bullets() {
        let html = "<ul><li>one</li><li>two</li></ul>";
        assert_eq!(html_to_text(html), "- one\n- two");
    }

    #[test]
    fn drops_style_and_decodes_entities() {
        let html = "<html><head><style>p { color: red; }</style></head>\
                    <body><p>Tom &amp; Jerry&nbsp;&#8212; &lt;ok&gt;</p></body></html>";
        assert_eq!(html_to_text(html), "Tom & Jerry \u{2014} <ok>");
    }

    #[test]
    fn squeezes_blank_lines() {
        let html = "<p>a</p>\n\n\n<p></p><div></div><p>b</p>";
        assert_eq!(html_to_text(html), "a\n\nb");
    }

    #[test]
    fn plain_text_is_a_fixed_point() {
        let text = "Dear Ana,\n\nYour probation ends in 5 days.\n- item | value";
        assert_eq!(html_to_text(text), text);
        let once = html_to_text("<p>x  <  y</p><p>a & b</p>");
        assert_eq!(html_to_text(&once), once);
    }

    #[test]
    fn source_newlines_are_whitespace_outside_pre() {
        let html = "<div>one\ntwo</div>\n<pre>a\n  b</pre>";
        assert_eq!(html_to_text(html), "one two\n\na\nb");
    }

    #[test]
    fn non_empty_html_with_text_gives_non_empty_text() {
        assert!(!html_to_text("<div><span>x</span></div>").is_empty());
    }
}
