//! String similarity kernels. Every kernel takes already-normalized,
//! non-empty strings and returns a score in `[0, 1]`; empty-side handling
//! happens in the field comparator.

/// 1.0 on equality, 0.0 otherwise.
pub fn exact(a: &str, b: &str) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

/// Levenshtein similarity: `1 - distance / max(len)`.
pub fn edit(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Jaro-Winkler similarity, good for short names.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}

/// Phonetic similarity: 1.0 when the Metaphone codes agree, otherwise the
/// edit similarity of the two codes.
pub fn phonetic(a: &str, b: &str) -> f64 {
    let code_a = metaphone(a);
    let code_b = metaphone(b);
    if code_a == code_b {
        1.0
    } else {
        edit(&code_a, &code_b)
    }
}

/// Token-sort ratio: sort whitespace-separated tokens in both inputs, then
/// score `2·M / (|a| + |b|)` where `M` is the longest-common-subsequence
/// length of the token-sorted forms.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted = |s: &str| {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.join(" ")
    };
    let sorted_a = sorted(a);
    let sorted_b = sorted(b);
    let len_a = sorted_a.chars().count();
    let len_b = sorted_b.chars().count();
    if len_a + len_b == 0 {
        return 1.0;
    }
    2.0 * lcs_len(&sorted_a, &sorted_b) as f64 / (len_a + len_b) as f64
}

/// Longest common subsequence length over chars, two-row DP.
fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

// ─── Metaphone ──────────────────────────────────────────────────────────

/// Classic Metaphone code of a word. Non-alphabetic characters are
/// ignored; the code is empty for inputs without letters.
pub fn metaphone(input: &str) -> String {
    let word: Vec<char> = input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if word.is_empty() {
        return String::new();
    }

    let n = word.len();
    let at = |idx: usize| word.get(idx).copied();
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u');

    let mut out = String::new();
    let mut i = 0usize;
    let mut start = 0usize;

    // Initial-letter exceptions.
    match (word[0], at(1)) {
        ('a', Some('e'))
        | ('g', Some('n'))
        | ('k', Some('n'))
        | ('p', Some('n'))
        | ('w', Some('r')) => {
            i = 1;
            start = 1;
        }
        ('x', _) => {
            out.push('S');
            i = 1;
        }
        ('w', Some('h')) => {
            out.push('W');
            i = 2;
        }
        _ => {}
    }

    while i < n {
        let c = word[i];

        // Collapse doubled letters, except c ("accept" keeps both).
        if i > 0 && word[i - 1] == c && c != 'c' {
            i += 1;
            continue;
        }

        match c {
            'a' | 'e' | 'i' | 'o' | 'u' => {
                if i == start {
                    out.push(c.to_ascii_uppercase());
                }
            }
            'b' => {
                // Terminal -mb keeps the b silent.
                if !(i + 1 == n && i > 0 && word[i - 1] == 'm') {
                    out.push('B');
                }
            }
            'c' => {
                if at(i + 1) == Some('i') && at(i + 2) == Some('a') {
                    out.push('X');
                } else if at(i + 1) == Some('h') {
                    if i > 0 && word[i - 1] == 's' {
                        out.push('K');
                    } else {
                        out.push('X');
                    }
                    i += 1;
                } else if matches!(at(i + 1), Some('i') | Some('e') | Some('y')) {
                    // -sci-, -sce-, -scy-: the c is silent.
                    if !(i > 0 && word[i - 1] == 's') {
                        out.push('S');
                    }
                } else {
                    out.push('K');
                }
            }
            'd' => {
                if at(i + 1) == Some('g')
                    && matches!(at(i + 2), Some('e') | Some('i') | Some('y'))
                {
                    out.push('J');
                    i += 1;
                } else {
                    out.push('T');
                }
            }
            'f' => out.push('F'),
            'g' => {
                if at(i + 1) == Some('h') {
                    if i + 2 < n && !is_vowel(word[i + 2]) {
                        // -gh- before a consonant is silent ("light").
                    } else if i + 2 >= n {
                        // Terminal -gh is silent.
                    } else {
                        out.push('K');
                    }
                    i += 1;
                } else if at(i + 1) == Some('n')
                    && (i + 2 == n
                        || (at(i + 2) == Some('e') && at(i + 3) == Some('d') && i + 4 == n))
                {
                    // Terminal -gn / -gned keeps the g silent.
                } else if matches!(at(i + 1), Some('e') | Some('i') | Some('y')) {
                    out.push('J');
                } else {
                    out.push('K');
                }
            }
            'h' => {
                let after_vowel = i > 0 && is_vowel(word[i - 1]);
                let before_vowel = matches!(at(i + 1), Some(next) if is_vowel(next));
                if !(after_vowel && !before_vowel) {
                    out.push('H');
                }
            }
            'j' => out.push('J'),
            'k' => {
                if !(i > 0 && word[i - 1] == 'c') {
                    out.push('K');
                }
            }
            'l' => out.push('L'),
            'm' => out.push('M'),
            'n' => out.push('N'),
            'p' => {
                if at(i + 1) == Some('h') {
                    out.push('F');
                    i += 1;
                } else {
                    out.push('P');
                }
            }
            'q' => out.push('K'),
            'r' => out.push('R'),
            's' => {
                if at(i + 1) == Some('h') {
                    out.push('X');
                    i += 1;
                } else if at(i + 1) == Some('i')
                    && matches!(at(i + 2), Some('o') | Some('a'))
                {
                    out.push('X');
                } else {
                    out.push('S');
                }
            }
            't' => {
                if at(i + 1) == Some('i') && matches!(at(i + 2), Some('o') | Some('a')) {
                    out.push('X');
                } else if at(i + 1) == Some('h') {
                    out.push('0');
                    i += 1;
                } else if !(at(i + 1) == Some('c') && at(i + 2) == Some('h')) {
                    // -tch-: the t is silent.
                    out.push('T');
                }
            }
            'v' => out.push('F'),
            'w' => {
                if matches!(at(i + 1), Some(next) if is_vowel(next)) {
                    out.push('W');
                }
            }
            'x' => out.push_str("KS"),
            'y' => {
                if matches!(at(i + 1), Some(next) if is_vowel(next)) {
                    out.push('Y');
                }
            }
            'z' => out.push('S'),
            _ => {}
        }

        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        assert_eq!(exact("acme.com", "acme.com"), 1.0);
        assert_eq!(exact("acme.com", "acme.org"), 0.0);
    }

    #[test]
    fn test_edit_is_normalized_levenshtein() {
        let score = edit("kitten", "sitting");
        assert!((score - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
        assert_eq!(edit("same", "same"), 1.0);
    }

    #[test]
    fn test_jaro_winkler_favors_shared_prefix() {
        let score = jaro_winkler("martha", "marhta");
        assert!(score > 0.95 && score < 1.0);
        assert!(jaro_winkler("jon", "john") > 0.9);
    }

    #[test]
    fn test_metaphone_codes() {
        assert_eq!(metaphone("smith"), "SM0");
        assert_eq!(metaphone("smyth"), "SM0");
        assert_eq!(metaphone("john"), "JN");
        assert_eq!(metaphone("jon"), "JN");
        assert_eq!(metaphone("knight"), "NT");
        assert_eq!(metaphone("wright"), "RT");
        assert_eq!(metaphone(""), "");
    }

    #[test]
    fn test_phonetic_matches_homophones() {
        assert_eq!(phonetic("smith", "smyth"), 1.0);
        assert_eq!(phonetic("jon", "john"), 1.0);
        let score = phonetic("smith", "baker");
        assert!((0.0..1.0).contains(&score));
    }

    #[test]
    fn test_token_sort_handles_reordering() {
        assert_eq!(token_sort_ratio("acme corporation", "corporation acme"), 1.0);
        let score = token_sort_ratio("acme corp", "acme corporation");
        assert!(score > 0.7 && score < 1.0);
    }

    #[test]
    fn test_kernels_stay_in_unit_range() {
        for (a, b) in [
            ("a", "completely different"),
            ("acme", "acme"),
            ("jon smith", "smith jon"),
        ] {
            for score in [
                exact(a, b),
                edit(a, b),
                jaro_winkler(a, b),
                phonetic(a, b),
                token_sort_ratio(a, b),
            ] {
                assert!((0.0..=1.0).contains(&score), "{a} vs {b} gave {score}");
            }
        }
    }
}
