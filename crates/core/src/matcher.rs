//! Transcript matching.
//!
//! Matching is a deliberate substring/equality heuristic, not language
//! understanding: recognized speech from a child reading a short scripted
//! line either equals the expected phrase, contains it, or is contained by
//! it once case and whitespace are normalized.

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether `heard` matches the `expected` phrase. Empty `heard` never
/// matches.
pub fn matches(expected: &str, heard: &str) -> bool {
    let n = normalize(expected);
    let h = normalize(heard);
    if h.is_empty() {
        return false;
    }
    n == h || n.contains(&h) || h.contains(&n)
}

/// Picks the choice that best matches `heard`: the first choice satisfying
/// [`matches`], else the first choice with plain lowercase containment in
/// either direction, else none.
pub fn best_choice<'a>(heard: &str, choices: &'a [String]) -> Option<&'a str> {
    let h = heard.trim().to_lowercase();
    if h.is_empty() {
        return None;
    }
    if let Some(choice) = choices.iter().find(|c| matches(c, heard)) {
        return Some(choice.as_str());
    }
    choices
        .iter()
        .find(|c| {
            let c_lower = c.to_lowercase();
            c_lower.contains(&h) || h.contains(&c_lower)
        })
        .map(String::as_str)
}
