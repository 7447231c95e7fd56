// Character-class segmentation.
//
// Japanese has no spaces between words, but script changes are a decent
// proxy for word boundaries: "東京タワーに行った" splits into 東京 / タワー /
// に / 行 / った. Tokens are maximal runs of one class; whitespace only
// separates.

use serde::Serialize;

/// The script class of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Hiragana,
    Katakana,
    Ideograph,
    Latin,
    Digit,
    Whitespace,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if is_hiragana(c) {
            CharClass::Hiragana
        } else if is_katakana(c) {
            CharClass::Katakana
        } else if is_ideograph(c) {
            CharClass::Ideograph
        } else if c.is_ascii_alphabetic() {
            CharClass::Latin
        } else if c.is_ascii_digit() || ('０'..='９').contains(&c) {
            CharClass::Digit
        } else if c.is_whitespace() {
            CharClass::Whitespace
        } else {
            CharClass::Other
        }
    }
}

pub fn is_hiragana(c: char) -> bool {
    ('\u{3041}'..='\u{3096}').contains(&c)
}

/// Katakana letters plus the prolonged sound mark, so ラーメン stays whole.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A1}'..='\u{30FA}').contains(&c) || c == 'ー'
}

/// CJK unified ideographs (base block and extension A) plus the 々 iteration mark.
pub fn is_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c) || ('\u{3400}'..='\u{4DBF}').contains(&c) || c == '々'
}

/// Split text into maximal same-class runs, dropping whitespace.
pub fn segment(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, CharClass)> = None;

    for (i, c) in text.char_indices() {
        let class = CharClass::of(c);
        if let Some((start, run_class)) = current {
            if run_class == class {
                continue;
            }
            tokens.push(&text[start..i]);
            current = None;
        }
        if class != CharClass::Whitespace {
            current = Some((i, class));
        }
    }

    if let Some((start, _)) = current {
        tokens.push(&text[start..]);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_script_change() {
        assert_eq!(
            segment("東京タワーに行った"),
            vec!["東京", "タワー", "に", "行", "った"]
        );
    }

    #[test]
    fn test_whitespace_never_forms_token() {
        assert_eq!(segment("  平和  祈り "), vec!["平和", "祈", "り"]);
        assert_eq!(segment("a\u{3000}b"), vec!["a", "b"]);
        assert!(segment("   ").is_empty());
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_same_class_separated_by_space_are_two_tokens() {
        assert_eq!(segment("abc def"), vec!["abc", "def"]);
    }

    #[test]
    fn test_digits_latin_and_other() {
        assert_eq!(segment("GPT4は！"), vec!["GPT", "4", "は", "！"]);
        assert_eq!(segment("２０２６年"), vec!["２０２６", "年"]);
    }

    #[test]
    fn test_char_classes() {
        assert_eq!(CharClass::of('あ'), CharClass::Hiragana);
        assert_eq!(CharClass::of('ア'), CharClass::Katakana);
        assert_eq!(CharClass::of('ー'), CharClass::Katakana);
        assert_eq!(CharClass::of('朝'), CharClass::Ideograph);
        assert_eq!(CharClass::of('々'), CharClass::Ideograph);
        assert_eq!(CharClass::of('z'), CharClass::Latin);
        assert_eq!(CharClass::of('7'), CharClass::Digit);
        assert_eq!(CharClass::of('\u{3000}'), CharClass::Whitespace);
        assert_eq!(CharClass::of('。'), CharClass::Other);
        assert_eq!(CharClass::of('😀'), CharClass::Other);
    }
}
