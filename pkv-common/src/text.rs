//! String normalisation shared by the catalog, query engine and image resolver

/// Words dropped from the end of a venue name when comparing names.
///
/// "Monal Restaurant" and "Monal" refer to the same place in the mapping tables.
const GENERIC_SUFFIXES: &[&str] = &["restaurant", "cafe", "eatery", "pvt", "ltd"];

/// Fold common accented Latin letters to ASCII
fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Lowercase, accent-folded form used for case-insensitive comparisons
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase().chars().map(fold_char).collect()
}

/// Split folded text into alphanumeric words
pub fn words(s: &str) -> Vec<String> {
    fold(&s.replace('&', " and "))
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// URL slug: lowercase ASCII words joined by `-`
///
/// # Examples
/// ```
/// use pkv_common::text::slugify;
///
/// assert_eq!(slugify("Café Aylanto, Lahore"), "cafe-aylanto-lahore");
/// assert_eq!(slugify("  Salt'n Pepper  "), "salt-n-pepper");
/// ```
pub fn slugify(s: &str) -> String {
    fold(s)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalised venue name for fuzzy comparison
///
/// Lowercases, folds accents, replaces `&` with "and", strips punctuation,
/// drops a leading "the" and generic trailing words such as "restaurant".
/// A name made only of generic words is kept as-is rather than emptied.
pub fn normalize_name(name: &str) -> String {
    let mut tokens = words(name);

    if tokens.len() > 1 && tokens[0] == "the" {
        tokens.remove(0);
    }

    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1].as_str();
        if GENERIC_SUFFIXES.contains(&last) {
            tokens.pop();
        } else {
            break;
        }
    }

    tokens.join(" ")
}

/// Truncate to at most `max` characters on a word boundary, appending `…`
pub fn truncate_words(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }

    // Leave room for the ellipsis
    let budget = max.saturating_sub(1);
    let mut out = String::new();
    for word in s.split_whitespace() {
        let needed = if out.is_empty() { word.chars().count() } else { out.chars().count() + 1 + word.chars().count() };
        if needed > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    if out.is_empty() {
        out = s.chars().take(budget).collect();
    }
    let trimmed = out.trim_end_matches(|c: char| c == ',' || c == '.' || c == ';' || c == ':');
    format!("{trimmed}…")
}
