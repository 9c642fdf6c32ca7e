// src/extract/segment.rs
use regex::Regex;

use crate::extract::text::pick_capture;

/// Split page markup into item fragments, in document order.
///
/// Non-overlapping matches of `item`; group 1 per match when the pattern has
/// one (empty when it did not participate), else the whole match.
/// Unbounded: rank limits are applied later.
pub fn segment<'a>(item: &Regex, page: &'a str) -> Vec<&'a str> {
    item.captures_iter(page)
        .map(|caps| pick_capture(item, &caps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::compile_pattern;

    #[test]
    fn yields_captures_in_document_order() {
        let re = compile_pattern(r"<li[^>]*>(.*?)</li>").unwrap();
        let html = "<ul>\n<li class=a>one</li><LI>\ntwo\n</LI><li>three</li></ul>";
        assert_eq!(segment(&re, html), vec!["one", "\ntwo\n", "three"]);
    }

    #[test]
    fn unmatched_group_yields_empty_fragment() {
        let re = compile_pattern(r"<hr>(?:<p>(.*?)</p>)?").unwrap();
        assert_eq!(segment(&re, "<hr><p>a</p><hr>"), vec!["a", ""]);
    }

    #[test]
    fn no_matches_is_empty() {
        let re = compile_pattern(r"<li>(.*?)</li>").unwrap();
        assert!(segment(&re, "<div>nothing</div>").is_empty());
    }

    #[test]
    fn not_truncated() {
        let re = compile_pattern(r"<li>(.*?)</li>").unwrap();
        let html: String = (0..100).map(|i| format!("<li>{i}</li>")).collect();
        assert_eq!(segment(&re, &html).len(), 100);
    }
}
