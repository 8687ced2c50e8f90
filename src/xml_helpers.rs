//! Shared XML attribute parsing and escaping utilities.

use quick_xml::events::BytesStart;

use crate::types::Color;

/// Extract a string attribute value by key (exact key match).
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `i32` attribute value by key.
pub fn attr_i32(e: &BytesStart, key: &[u8]) -> Option<i32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; anything else as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Extract the `val` attribute as a string. Very common in SpreadsheetML.
pub fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

/// Collect every attribute as owned `(key, value)` pairs, in document order,
/// skipping the keys listed in `skip`.
pub fn collect_attrs(e: &BytesStart, skip: &[&[u8]]) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter(|attr| !skip.contains(&attr.key.as_ref()))
        .filter_map(|attr| {
            let key = std::str::from_utf8(attr.key.as_ref()).ok()?.to_string();
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// Parse color attributes (`rgb`, `theme`, `tint`, `indexed`, `auto`) into a [`Color`].
pub fn parse_color_attrs(e: &BytesStart) -> Color {
    Color {
        rgb: attr_string(e, b"rgb"),
        theme: attr_u32(e, b"theme"),
        tint: attr_f64(e, b"tint"),
        indexed: attr_u32(e, b"indexed"),
        auto: attr_bool(e, b"auto"),
    }
}

/// Namespace prefix of an element name (`"x"` for `x:row`), if any.
pub fn name_prefix(e: &BytesStart) -> Option<String> {
    let name = e.name();
    let raw = std::str::from_utf8(name.as_ref()).ok()?;
    raw.split_once(':').map(|(prefix, _)| prefix.to_string())
}

/// Build a qualified element name from an optional prefix.
pub fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// Minimal XML escaping for attribute/text content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write `name="value"` pairs (escaped) after a leading space each.
pub fn push_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&xml_escape(value));
        out.push('"');
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string_unescapes() {
        let e = make_start(r#"<foo name="a &amp; b" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("a & b".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_numbers_and_bools() {
        let e = make_start(r#"<row r="12" ht="20.5" hidden="1" customHeight="false" />"#);
        assert_eq!(attr_u32(&e, b"r"), Some(12));
        assert_eq!(attr_f64(&e, b"ht"), Some(20.5));
        assert_eq!(attr_bool(&e, b"hidden"), Some(true));
        assert_eq!(attr_bool(&e, b"customHeight"), Some(false));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }

    #[test]
    fn test_collect_attrs_skips_keys() {
        let e = make_start(r#"<row r="3" spans="1:4" hidden="1" ht="15" />"#);
        let attrs = collect_attrs(&e, &[b"r", b"hidden"]);
        assert_eq!(
            attrs,
            vec![
                ("spans".to_string(), "1:4".to_string()),
                ("ht".to_string(), "15".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_color_attrs() {
        let e = make_start(r#"<color theme="4" tint="-0.25" />"#);
        let color = parse_color_attrs(&e);
        assert_eq!(color.theme, Some(4));
        assert_eq!(color.tint, Some(-0.25));
        assert_eq!(color.rgb, None);
        assert_eq!(color.auto, None);
    }

    #[test]
    fn test_name_prefix_and_qualified() {
        let e = make_start(r#"<x:row r="1">"#);
        assert_eq!(name_prefix(&e).as_deref(), Some("x"));
        assert_eq!(qualified(Some("x"), "c"), "x:c");
        assert_eq!(qualified(None, "c"), "c");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
    }
}
