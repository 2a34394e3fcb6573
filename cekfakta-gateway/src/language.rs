//! Language-code correction and display names.

use crate::text_analytics::LanguageResult;

/// Words that mark short Indonesian scam messages the detector tends to
/// report as English.
pub const INDONESIAN_KEYWORDS: &[&str] = &["anda", "hadiah", "rekening", "jutaan"];

/// ISO 639-1 code → name used in the classifier prompt and the response.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("id", "Indonesian"),
    ("en", "English"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// Language after correction and name normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLanguage {
    pub iso_code: String,
    pub name: String,
    /// Whether the keyword heuristic overrode the detector.
    pub corrected: bool,
}

/// Canonical name for a code, if it is one of the ten known languages.
pub fn language_name(iso_code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(code, _)| *code == iso_code)
        .map(|(_, name)| *name)
}

/// Apply the English→Indonesian keyword override, then map the code to a
/// canonical name. Unknown codes keep the detector's own name.
///
/// The keyword match is a case-insensitive substring test, so it also fires
/// on English words that contain a keyword, such as "panda".
pub fn resolve(detected: &LanguageResult, text: &str) -> ResolvedLanguage {
    let mut iso_code = detected.iso_code.to_lowercase();
    let mut corrected = false;

    if iso_code == "en" {
        let lowered = text.to_lowercase();
        if INDONESIAN_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            iso_code = "id".to_string();
            corrected = true;
        }
    }

    let name = language_name(&iso_code)
        .map(str::to_string)
        .unwrap_or_else(|| detected.display_name.clone());

    ResolvedLanguage {
        iso_code,
        name,
        corrected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(code: &str, name: &str) -> LanguageResult {
        LanguageResult {
            iso_code: code.into(),
            display_name: name.into(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_english_with_keyword_becomes_indonesian() {
        let resolved = resolve(&detected("en", "English"), "Please verify your REKENING now");
        assert_eq!(resolved.iso_code, "id");
        assert_eq!(resolved.name, "Indonesian");
        assert!(resolved.corrected);
    }

    #[test]
    fn test_english_without_keyword_stays() {
        let resolved = resolve(&detected("en", "English"), "You won a free cruise");
        assert_eq!(resolved.name, "English");
        assert!(!resolved.corrected);
    }

    #[test]
    fn test_only_english_is_corrected() {
        let resolved = resolve(&detected("ms", "Malay"), "Anda menang hadiah");
        assert_eq!(resolved.iso_code, "ms");
        assert_eq!(resolved.name, "Malay");
        assert!(!resolved.corrected);
    }

    #[test]
    fn test_substring_match_fires_inside_words() {
        let resolved = resolve(&detected("en", "English"), "The panda ate bamboo");
        assert!(resolved.corrected);
    }

    #[test]
    fn test_known_codes_use_canonical_names() {
        assert_eq!(resolve(&detected("zh", "Chinese_Simplified"), "你好").name, "Chinese");
        assert_eq!(resolve(&detected("JA", "Japanese"), "こんにちは").name, "Japanese");
        assert_eq!(language_name("ko"), Some("Korean"));
        assert_eq!(language_name("pt"), None);
    }

    #[test]
    fn test_unknown_code_keeps_detector_name() {
        let resolved = resolve(&detected("pt", "Portuguese"), "Olá");
        assert_eq!(resolved.name, "Portuguese");
    }
}
