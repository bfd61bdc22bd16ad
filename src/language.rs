//! Display names for Wikipedia language editions.
//!
//! Prompt instructions read better with "French" than "fr", so the composer
//! maps edition codes to English names here. Wikipedia has hundreds of
//! editions; the table covers the widely-requested ones and any unknown code
//! passes through verbatim rather than failing.

/// (edition code, English name) pairs for common Wikipedia editions.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("uk", "Ukrainian"),
    ("pl", "Polish"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("ja", "Japanese"),
    ("zh", "Chinese"),
    ("ko", "Korean"),
    ("ar", "Arabic"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("tr", "Turkish"),
    ("fa", "Persian"),
    ("cs", "Czech"),
    ("fi", "Finnish"),
    ("no", "Norwegian"),
    ("da", "Danish"),
    ("el", "Greek"),
    ("hu", "Hungarian"),
    ("ro", "Romanian"),
    ("id", "Indonesian"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
    ("ca", "Catalan"),
];

/// English display name for a language edition code. Unknown codes are
/// returned as-is so any edition can still be requested.
pub fn display_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}
