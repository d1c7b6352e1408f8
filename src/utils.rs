/// Clean up a hash pasted by the user. Copies from other tools often group
/// digits with spaces, dashes or colons (`e1:0a:dc`, `E1-0A-DC`).
pub fn normalize_pasted_hash(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | ':'))
        .collect()
}

/// Case-insensitive comparison after normalising both sides. Empty never matches.
pub fn hashes_match(a: &str, b: &str) -> bool {
    let a = normalize_pasted_hash(a);
    let b = normalize_pasted_hash(b);
    !a.is_empty() && !b.is_empty() && a.eq_ignore_ascii_case(&b)
}
