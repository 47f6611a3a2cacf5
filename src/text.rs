//! Small text helpers shared by the resolver, classifier and retriever
//!
//! Matching is ASCII case-insensitive. Lowercasing with `to_ascii_lowercase`
//! keeps byte offsets stable, so match positions found in the lowered copy are
//! valid in the original text.

/// True for terms that need word boundaries (plain ASCII words like "note")
fn is_ascii_word(term: &str) -> bool {
    term.bytes().any(|b| b.is_ascii_alphanumeric())
        && term
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b' ' || b == b'\'' || b == b'-')
}

fn is_boundary(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
    let after_ok = end >= bytes.len() || !bytes[end].is_ascii_alphanumeric();
    before_ok && after_ok
}

/// Byte ranges where `term` occurs in `text`
pub(crate) fn find_term(text: &str, term: &str) -> Vec<(usize, usize)> {
    if term.is_empty() {
        return Vec::new();
    }

    let lowered = text.to_ascii_lowercase();
    let needle = term.to_ascii_lowercase();
    let word = is_ascii_word(&needle);

    lowered
        .match_indices(&needle)
        .map(|(start, m)| (start, start + m.len()))
        .filter(|&(start, end)| !word || is_boundary(&lowered, start, end))
        .collect()
}

/// Whether `text` contains `term`
pub(crate) fn contains_term(text: &str, term: &str) -> bool {
    !find_term(text, term).is_empty()
}

/// Replace every occurrence of `term` with a space
pub(crate) fn remove_term(text: &str, term: &str) -> String {
    let ranges = find_term(text, term);
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in ranges {
        out.push_str(&text[cursor..start]);
        out.push(' ');
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Replace every byte range with a space; ranges may overlap
pub(crate) fn blank_ranges(text: &str, mut ranges: Vec<(usize, usize)>) -> String {
    ranges.sort_unstable();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in ranges {
        if end <= cursor {
            continue;
        }
        if start < cursor {
            cursor = end;
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push(' ');
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Collapse whitespace runs into single spaces and trim the ends
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn sentence punctuation into spaces
pub(crate) fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '？' | '！' | '，' | '。' | '、' | '；' | '：' | '?' | '!' | ',' | ';' => ' ',
            _ => c,
        })
        .collect()
}

/// Count ASCII words that look like proper nouns: an upper-case letter followed
/// by one or more letters ("Python", "Django", "AI")
pub(crate) fn count_capitalized_words(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_alphabetic() {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }

        let word = &bytes[start..i];
        if word.len() >= 2
            && word[0].is_ascii_uppercase()
            && word[1..].iter().all(|b| b.is_ascii_alphabetic())
        {
            count += 1;
        }
    }

    count
}

/// Cut `text` to at most `max_chars` characters
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
