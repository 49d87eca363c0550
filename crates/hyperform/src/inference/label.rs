//! Human-readable labels from field names.

/// Tokens always rendered in upper case.
const ACRONYMS: &[&str] = &[
    "id", "api", "url", "uri", "uuid", "ip", "http", "https", "aws", "sdk", "ui", "ux",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Other,
}

fn class_of(c: char) -> CharClass {
    if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_ascii_digit() {
        CharClass::Digit
    } else {
        CharClass::Other
    }
}

/// Split a field name into words.
///
/// Breaks on `_`, `-`, whitespace, lower→upper transitions, the end of an
/// upper-case run followed by a lower-case letter (`HTTPServer` → `HTTP`,
/// `Server`), and letter/digit transitions. A lone trailing `s` stays with
/// its upper-case run (`userIDs` → `user`, `IDs`).
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let (p, k) = (class_of(prev), class_of(c));
            let is_lower_at = |j: usize| chars.get(j).is_some_and(|n| class_of(*n) == CharClass::Lower);
            let plural_run = chars.get(i + 1) == Some(&'s') && !is_lower_at(i + 2);
            let next_is_lower = is_lower_at(i + 1) && !plural_run;
            let boundary = matches!(
                (p, k),
                (CharClass::Lower, CharClass::Upper)
                    | (CharClass::Digit, CharClass::Lower)
                    | (CharClass::Digit, CharClass::Upper)
                    | (CharClass::Lower, CharClass::Digit)
                    | (CharClass::Upper, CharClass::Digit)
            ) || (p == CharClass::Upper && k == CharClass::Upper && next_is_lower);

            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    if ACRONYMS.contains(&lower.as_str()) {
        return lower.to_uppercase();
    }
    if let Some(stem) = lower.strip_suffix('s').filter(|stem| ACRONYMS.contains(stem)) {
        return format!("{}s", stem.to_uppercase());
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a field name into a display label: `apiKey` → `API Key`.
pub fn humanize_label(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ")
}
