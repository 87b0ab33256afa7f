//! Candidate S3 folder names generated from venue identity
//!
//! Photo folders were created by hand over several collection runs, so the
//! same venue may live under `monal`, `Monal`, `the_monal` or
//! `monal-islamabad`. The generator enumerates the spellings seen in the bucket.

use crate::model::Venue;
use crate::text::{normalize_name, words};

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Spellings of one word list: kebab, snake, compact, Title_Snake
fn spellings(tokens: &[String]) -> Vec<String> {
    if tokens.is_empty() {
        return Vec::new();
    }
    vec![
        tokens.join("-"),
        tokens.join("_"),
        tokens.concat(),
        tokens.iter().map(|t| title_case(t)).collect::<Vec<_>>().join("_"),
    ]
}

fn push_unique(out: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !out.contains(&candidate) {
        out.push(candidate);
    }
}

/// Candidate folders for a venue, most likely first
///
/// The declared `s3_folder` comes first and is used verbatim. Generated
/// folders sit under the category slug: the full name, the normalised name
/// (generic suffixes dropped), then both again with the city appended.
pub fn candidate_folders(venue: &Venue) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(folder) = venue.s3_folder.as_deref() {
        push_unique(&mut out, folder.trim_matches('/').to_string());
    }

    let full = words(&venue.name);
    let normalized: Vec<String> = normalize_name(&venue.name)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let city = words(&venue.city);

    let mut name_forms = vec![full.clone()];
    if normalized != full {
        name_forms.push(normalized);
    }

    let mut with_city: Vec<Vec<String>> = Vec::new();
    for form in &name_forms {
        if !city.is_empty() && !form.ends_with(&city) {
            with_city.push(form.iter().chain(city.iter()).cloned().collect());
        }
    }

    let prefix = venue.category.slug();
    for form in name_forms.iter().chain(with_city.iter()) {
        for spelling in spellings(form) {
            push_unique(&mut out, format!("{}/{}", prefix, spelling));
        }
    }

    out
}

/// Object keys to probe: each folder combined with each file, bounded by `max`
pub fn candidate_keys(venue: &Venue, files: &[String], max: usize) -> Vec<String> {
    candidate_folders(venue)
        .iter()
        .flat_map(|folder| files.iter().map(move |file| format!("{}/{}", folder, file)))
        .take(max)
        .collect()
}
