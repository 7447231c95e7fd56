// Text cleaning: strips the platform noise that would otherwise surface as
// "keywords": links, hashtags, mentions and retweet markers.

use std::sync::LazyLock;

use regex_lite::Regex;

// URL bodies stop at the first non-ASCII character, so a link glued to
// Japanese text ("…/abc朝です") does not swallow the sentence.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z][A-Za-z0-9+.-]*://[!-~]+").expect("URL pattern is valid")
});

// The marker is removed together with its body.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[#＃@＠][0-9A-Za-z_\x{FF10}-\x{FF19}\x{3041}-\x{3096}\x{30A1}-\x{30FA}\x{30FC}\x{3005}\x{3400}-\x{4DBF}\x{4E00}-\x{9FFF}]+")
        .expect("tag pattern is valid")
});

// `\b` is ASCII-only in regex-lite, so "ですRT " still matches while "ART " does not.
// Runs after whitespace collapsing, so a marker is followed by one space or the end.
static RT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bRT(?: |$)").expect("RT pattern is valid"));

/// Clean raw post text.
///
/// Removals leave a space behind so the text on either side never fuses into
/// one token. The passes run until nothing changes, so cleaning is idempotent.
pub fn clean(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let text = URL_RE.replace_all(text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = collapse_whitespace(&text);
    let text = RT_RE.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Collapse runs of Unicode whitespace (including U+3000) to one ASCII space and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_url_mention_hashtag_and_rt() {
        assert_eq!(
            clean("これはすごい朝ですRT @user https://x.co/abc #tag"),
            "これはすごい朝です"
        );
    }

    #[test]
    fn test_leading_rt() {
        assert_eq!(clean("RT @someone: 平和を祈る"), ": 平和を祈る");
    }

    #[test]
    fn test_rt_inside_word_kept() {
        assert_eq!(clean("ART museum"), "ART museum");
    }

    #[test]
    fn test_url_glued_to_japanese() {
        assert_eq!(clean("見て https://example.com/a朝です"), "見て 朝です");
    }

    #[test]
    fn test_fullwidth_markers() {
        assert_eq!(clean("＃平和 と ＠山田 さん"), "と さん");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(clean("  平和\t\n\u{3000}祈り  "), "平和 祈り");
    }

    #[test]
    fn test_idempotent_on_messy_input() {
        for raw in [
            "RT RT @a 朝 RT",
            "http#x://y 朝",
            "＃タグ＃タグ https://a.b/c?d=e#f 夜\u{3000}\u{3000}です",
            "RT:RT @x",
        ] {
            let once = clean(raw);
            assert_eq!(clean(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_trailing_rt_removed() {
        assert_eq!(clean("朝ですRT"), "朝です");
    }

    #[test]
    fn test_empty_and_noise_only() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("RT @a #b https://c.d"), "");
    }
}
