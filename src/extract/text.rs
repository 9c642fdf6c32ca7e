// src/extract/text.rs
use once_cell::sync::OnceCell;
use regex::{Captures, Regex};

/// Strip tags, decode HTML entities, collapse whitespace, trim.
///
/// Works on substrings, not a DOM: unbalanced or nested markup degrades to
/// best-effort text rather than failing.
pub fn clean_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    // 1) Strip tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("static tag regex"));
    let out = re_tags.replace_all(s, "");

    // 2) HTML entity decode
    let out = html_escape::decode_html_entities(&out);

    // 3) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static ws regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Group 1 when the pattern has a capture group, else the whole match.
/// A group that did not take part in the match yields "".
pub fn pick_capture<'h>(re: &Regex, caps: &Captures<'h>) -> &'h str {
    let idx = if re.captures_len() > 1 { 1 } else { 0 };
    caps.get(idx).map_or("", |m| m.as_str())
}

/// First match of `re` in `text`, cleaned. Returns `default` on no match or
/// when the cleaned capture is empty.
pub fn first_match(re: &Regex, text: &str, default: &str) -> String {
    let cleaned = re
        .captures(text)
        .map(|caps| clean_text(pick_capture(re, &caps)))
        .unwrap_or_default();
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::compile_pattern;

    #[test]
    fn clean_text_strips_tags_entities_and_ws() {
        let s = "  <b>라운드랩</b>&nbsp;&amp;\n\t<span>독도</span>  토너 ";
        assert_eq!(clean_text(s), "라운드랩 & 독도 토너");
    }

    #[test]
    fn clean_text_decodes_after_stripping() {
        // Escaped markup survives as literal text.
        assert_eq!(clean_text("&lt;b&gt;x&lt;/b&gt;"), "<b>x</b>");
    }

    #[test]
    fn clean_text_tolerates_unbalanced_markup() {
        assert_eq!(clean_text("<div><span>abc</div"), "abc</div");
        assert_eq!(clean_text("a < b"), "a < b");
    }

    #[test]
    fn first_match_returns_default_on_miss_or_empty() {
        let re = compile_pattern(r#"class="tx_brand"[^>]*>(.*?)<"#).unwrap();
        assert_eq!(first_match(&re, "<p>none</p>", "Unknown"), "Unknown");
        assert_eq!(
            first_match(&re, r#"<span class="tx_brand">   </span>"#, "Unknown"),
            "Unknown"
        );
        assert_eq!(
            first_match(&re, r#"<SPAN CLASS="tx_brand"> 메디힐 </span>"#, ""),
            "메디힐"
        );
    }

    #[test]
    fn unmatched_optional_group_is_default_not_whole_match() {
        let re = compile_pattern(r"qty(?:=(\d+))?").unwrap();
        assert_eq!(first_match(&re, "qty only", "none"), "none");
        assert_eq!(first_match(&re, "qty=3", "none"), "3");
    }

    #[test]
    fn first_match_without_group_uses_whole_match() {
        let re = compile_pattern(r"\d+,\d+").unwrap();
        assert_eq!(first_match(&re, "price 12,900 won", ""), "12,900");
    }
}
