//! Input normalization
//!
//! Every path (fuzzy matching, anchors, history lookups, legacy scoring) works
//! on the normalized form so that spelling variants of the same name meet:
//! - lowercase (Unicode-aware)
//! - Arabic diacritics and tatweel removed
//! - alef variants, alef maqsura and taa marbuta folded
//! - Arabic-Indic digits mapped to ASCII
//! - punctuation treated as whitespace, whitespace runs collapsed, trimmed

const TATWEEL: char = '\u{0640}';

/// Normalize a raw entity name
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars() {
        if ch == TATWEEL || is_diacritic(ch) {
            continue;
        }

        let folded = fold(ch);
        if folded.is_whitespace() || is_separator(folded) {
            pending_space = !out.is_empty();
            continue;
        }

        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(folded.to_lowercase());
    }

    out
}

/// Whitespace-separated tokens of an already normalized string
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}

fn is_diacritic(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

fn is_separator(ch: char) -> bool {
    ch.is_ascii_punctuation()
        || matches!(
            ch,
            '،' | '؛' | '؟' | '«' | '»' | '–' | '—' | '“' | '”' | '‘' | '’'
        )
}

fn fold(ch: char) -> char {
    match ch {
        'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
        'ى' => 'ي',
        'ة' => 'ه',
        '\u{0660}'..='\u{0669}' => {
            char::from_digit(ch as u32 - 0x0660, 10).unwrap_or(ch)
        }
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_whitespace_collapsed() {
        assert_eq!(normalize("شركة  النورس"), normalize("شركة النورس"));
        assert_eq!(normalize("  ACME\t\tSupplies \n"), "acme supplies");
    }

    #[test]
    fn test_arabic_letter_folding() {
        assert_eq!(normalize("أحمد"), "احمد");
        assert_eq!(normalize("إبراهيم"), "ابراهيم");
        assert_eq!(normalize("مستشفى"), "مستشفي");
        assert_eq!(normalize("شركة"), "شركه");
    }

    #[test]
    fn test_diacritics_and_tatweel_removed() {
        assert_eq!(normalize("مُحَمَّد"), "محمد");
        assert_eq!(normalize("الـنـورس"), "النورس");
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(normalize("Al-Rajhi Bank, Ltd."), "al rajhi bank ltd");
        assert_eq!(normalize("النورس، للتجارة"), "النورس للتجاره");
    }

    #[test]
    fn test_arabic_indic_digits() {
        assert_eq!(normalize("مصنع ٢٠٢٤"), "مصنع 2024");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  -- "), "");
    }

    #[test]
    fn test_tokens_skip_empty() {
        let tokens: Vec<_> = tokens("acme supplies co").collect();
        assert_eq!(tokens, vec!["acme", "supplies", "co"]);
    }
}
