//! Categories and per-participant decisions, plus the normalised cell keys used to reason about them.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dto::identity::Identity;

/// Single-letter round identifier (e.g. `"K"`).
pub type Letter = String;
/// 1-based prompt index within a letter.
pub type PromptIndex = u32;

/// Prompt labels for one letter keyed by index.
pub type Prompts = BTreeMap<PromptIndex, String>;
/// Categories assigned by the server; letters keep the server's order.
pub type Categories = IndexMap<Letter, Prompts>;
/// A participant's typed answers: letter, then index.
pub type Responses = BTreeMap<Letter, BTreeMap<PromptIndex, String>>;
/// Points for one reviewed participant: letter, then index.
pub type LetterPoints = BTreeMap<Letter, BTreeMap<PromptIndex, u32>>;
/// Points a reviewer assigned, keyed by the reviewed participant.
pub type PointsByParticipant = BTreeMap<Identity, LetterPoints>;

/// One participant's responses and the points they awarded to others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decisions {
    /// Points this participant awarded while reviewing.
    #[serde(default)]
    pub points: PointsByParticipant,
    /// Answers this participant typed.
    #[serde(default)]
    pub responses: Responses,
}

impl Decisions {
    /// Response typed for a cell, if any.
    pub fn response(&self, cell: &CellKey) -> Option<&str> {
        self.responses
            .get(&cell.letter)
            .and_then(|answers| answers.get(&cell.index))
            .map(String::as_str)
    }

    /// Letters this participant already answered.
    pub fn answered_letters(&self) -> impl Iterator<Item = &Letter> {
        self.responses.keys()
    }
}

/// One prompt within a round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Round letter.
    pub letter: Letter,
    /// Prompt within the letter.
    pub index: PromptIndex,
}

impl CellKey {
    /// Key for prompt `index` under `letter`.
    pub fn new(letter: impl Into<Letter>, index: PromptIndex) -> Self {
        Self {
            letter: letter.into(),
            index,
        }
    }
}

/// One participant's answer to one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResponseKey {
    /// Who typed the answer.
    pub participant: Identity,
    /// Which prompt it answers.
    pub cell: CellKey,
}

impl ResponseKey {
    /// Key for `participant`'s answer to `cell`.
    pub fn new(participant: Identity, cell: CellKey) -> Self {
        Self { participant, cell }
    }
}

/// Flat view of every participant's responses, keyed by `(participant, letter, index)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseTable {
    entries: BTreeMap<ResponseKey, String>,
}

impl ResponseTable {
    /// Flatten the nested decisions of every participant.
    pub fn from_decisions(decisions: &BTreeMap<Identity, Decisions>) -> Self {
        let entries = decisions
            .iter()
            .flat_map(|(participant, decision)| {
                decision.responses.iter().flat_map(move |(letter, answers)| {
                    answers.iter().map(move |(index, text)| {
                        (
                            ResponseKey::new(participant.clone(), CellKey::new(letter.clone(), *index)),
                            text.clone(),
                        )
                    })
                })
            })
            .collect();
        Self { entries }
    }

    /// Every participant's answer for a single cell.
    pub fn cell(&self, cell: &CellKey) -> BTreeMap<Identity, String> {
        self.entries
            .iter()
            .filter(|(key, _)| &key.cell == cell)
            .map(|(key, text)| (key.participant.clone(), text.clone()))
            .collect()
    }
}
