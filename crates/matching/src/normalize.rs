//! Per-field canonicalization. Normalizers never fail; empty or absent
//! input maps to the empty string.

/// Lowercase, trim, collapse internal whitespace runs to single spaces.
pub fn normalize_text(value: Option<&str>) -> String {
    match value {
        Some(v) => v
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    }
}

/// Lowercase and trim. No structural validation.
pub fn normalize_email(value: Option<&str>) -> String {
    match value {
        Some(v) => v.trim().to_lowercase(),
        None => String::new(),
    }
}

/// Keep only digits. Leading zeros survive.
pub fn normalize_phone(value: Option<&str>) -> String {
    match value {
        Some(v) => v.chars().filter(char::is_ascii_digit).collect(),
        None => String::new(),
    }
}

/// Text normalization, then strip scheme, a leading `www.`, and a single
/// trailing slash.
pub fn normalize_website(value: Option<&str>) -> String {
    let text = normalize_text(value);
    let stripped = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"))
        .unwrap_or(&text);
    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
    let stripped = stripped.strip_suffix('/').unwrap_or(stripped);
    stripped.to_string()
}
