#![forbid(unsafe_code)]

//! Character references written by canonical XML.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Attribute,
    ProcessingInstruction,
}

fn reference(ch: char, context: Context) -> Option<&'static str> {
    match (ch, context) {
        ('\r', _) => Some("&#xD;"),
        (_, Context::ProcessingInstruction) => None,
        ('&', _) => Some("&amp;"),
        ('<', _) => Some("&lt;"),
        ('>', Context::Text) => Some("&gt;"),
        ('"', Context::Attribute) => Some("&quot;"),
        ('\t', Context::Attribute) => Some("&#x9;"),
        ('\n', Context::Attribute) => Some("&#xA;"),
        _ => None,
    }
}

fn escape(s: &str, context: Context) -> Cow<'_, str> {
    let Some(first) = s.find(|ch| reference(ch, context).is_some()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first]);
    for ch in s[first..].chars() {
        match reference(ch, context) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Text node content: `&` `<` `>` and carriage return.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape(s, Context::Text)
}

/// Attribute values: `&` `<` `"` and the whitespace characters tab, line
/// feed and carriage return.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s, Context::Attribute)
}

pub fn escape_pi(s: &str) -> Cow<'_, str> {
    escape(s, Context::ProcessingInstruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_text("x < y && y > z"), "x &lt; y &amp;&amp; y &gt; z");
        assert_eq!(escape_text("crlf\r\n"), "crlf&#xD;\n");
        assert_eq!(escape_text("say \"hi\""), "say \"hi\"");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("<a href=\"x\">"), "&lt;a href=&quot;x&quot;>");
        assert_eq!(escape_attr("1\t2\n3\r"), "1&#x9;2&#xA;3&#xD;");
    }

    #[test]
    fn test_escape_pi() {
        assert_eq!(escape_pi("a<b&c\r"), "a<b&c&#xD;");
    }
}
