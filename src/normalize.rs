use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes a free-text artist or performer name for equality
/// comparison. Two names refer to the same act iff their normalized forms
/// are equal.
///
/// Steps, in order: NFD decomposition, strip combining marks, unify curly
/// apostrophes, lowercase, collapse every run outside `[a-z0-9]` to a single
/// space, trim. Idempotent and total — empty input yields an empty string.
pub fn normalize(raw: &str) -> String {
    let folded: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .flat_map(char::to_lowercase)
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// `normalize` over an optional input; `None` yields the empty string.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_diacritics() {
        assert_eq!(normalize("Beyoncé"), normalize("beyonce"));
        assert_eq!(normalize("Sigur Rós"), "sigur ros");
        assert_eq!(normalize("MÖTLEY CRÜE"), "motley crue");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(normalize("AC/DC"), "ac dc");
        assert_eq!(normalize("Florence + The Machine"), "florence the machine");
        assert_eq!(normalize("  Tyler,   The Creator!  "), "tyler the creator");
    }

    #[test]
    fn unifies_apostrophe_variants() {
        assert_eq!(normalize("D’Angelo"), normalize("D'Angelo"));
    }

    #[test]
    fn idempotent() {
        for name in ["Beyoncé", "AC/DC", "  Sigur Rós ()  ", "", "a"] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn total_on_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize_opt(None), "");
    }
}
