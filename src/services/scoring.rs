//! Point values for free-text responses.
//!
//! Every client recomputes these independently for every other participant; nothing here is
//! authoritative server-side.

use std::collections::BTreeMap;

use crate::dto::identity::Identity;

/// Points `reviewer` would award `author` for one cell.
///
/// `responses` holds every participant's answer to the same cell. A response scores zero when it
/// is missing or blank, when it is the reviewer's own, or when another participant typed the same
/// text (ignoring case). Otherwise its first word must start with `letter`, and each word that does
/// is worth one point.
pub fn score_response(
    letter: &str,
    author: &Identity,
    responses: &BTreeMap<Identity, String>,
    reviewer: &Identity,
) -> u32 {
    if author == reviewer {
        return 0;
    }
    let Some(text) = responses.get(author).map(|text| normalize(text)) else {
        return 0;
    };
    if text.is_empty() {
        return 0;
    }

    let duplicated = responses
        .iter()
        .filter(|(participant, _)| *participant != author)
        .any(|(_, other)| normalize(other) == text);
    if duplicated {
        return 0;
    }

    count_letter_words(&text, &letter.to_uppercase())
}

/// Points for every participant's answer to one cell, as seen by `reviewer`.
pub fn score_cell(
    letter: &str,
    responses: &BTreeMap<Identity, String>,
    reviewer: &Identity,
) -> BTreeMap<Identity, u32> {
    responses
        .keys()
        .map(|author| {
            (
                author.clone(),
                score_response(letter, author, responses, reviewer),
            )
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.trim().to_uppercase()
}

fn count_letter_words(text: &str, letter: &str) -> u32 {
    let mut words = text.split_whitespace();
    match words.next() {
        Some(first) if first.starts_with(letter) => {
            1 + words.filter(|word| word.starts_with(letter)).count() as u32
        }
        _ => 0,
    }
}
