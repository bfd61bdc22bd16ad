use regex::Regex;
use std::sync::OnceLock;

/// Maximum display length for a cleaned snippet, in characters.
const MAX_SNIPPET_CHARS: usize = 150;
/// A sentence terminator only counts as a cut point past this offset.
const MIN_SENTENCE_OFFSET: usize = 50;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

/// Clean a raw search snippet for display: strip HTML tags, decode the
/// common entities, trim, and cap the length at 150 characters. When the
/// cap forces a cut, back off to the last sentence terminator found past
/// character 50 so the snippet does not end mid-sentence; otherwise append
/// an ellipsis.
///
/// Pure and total: never fails, same input always gives the same output.
pub fn clean(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let stripped = tag_regex().replace_all(raw, "");
    let cleaned = stripped
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    let cleaned = cleaned.trim();

    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() <= MAX_SNIPPET_CHARS {
        return cleaned.to_string();
    }

    let prefix = &chars[..MAX_SNIPPET_CHARS - 3];
    let last_sentence_end = prefix
        .iter()
        .rposition(|c| matches!(c, '.' | '!' | '?'))
        .filter(|&idx| idx >= MIN_SENTENCE_OFFSET);

    match last_sentence_end {
        Some(idx) => prefix[..=idx].iter().collect(),
        None => {
            let mut out: String = prefix.iter().collect();
            out.push_str("...");
            out
        }
    }
}
