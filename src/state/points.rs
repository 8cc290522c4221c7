//! Working copy of the points a reviewer is about to submit.

use std::collections::BTreeMap;

use crate::{
    dto::{
        decisions::{CellKey, Categories, Decisions, PointsByParticipant, ResponseKey, ResponseTable},
        identity::Identity,
    },
    error::SessionError,
    services::scoring::score_cell,
    state::round_timer::PROMPTS_PER_LETTER,
};

/// One reviewable checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointEntry {
    /// Text the participant typed, if any.
    pub response: Option<String>,
    /// Value from the scoring pass; the most a reviewer can award.
    pub computed: u32,
    /// Value that will be submitted.
    pub awarded: u32,
    /// The reviewer's own row, which cannot be toggled.
    pub locked: bool,
}

impl PointEntry {
    /// Whether any points are awarded.
    pub fn is_checked(&self) -> bool {
        self.awarded > 0
    }
}

/// Every participant's responses with the points the reviewer intends to award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsBoard {
    entries: BTreeMap<ResponseKey, PointEntry>,
}

impl PointsBoard {
    /// Seed the board from a fresh scoring pass over every participant's responses.
    pub fn seed(
        reviewer: &Identity,
        categories: &Categories,
        decisions: &BTreeMap<Identity, Decisions>,
    ) -> Self {
        let table = ResponseTable::from_decisions(decisions);
        let mut entries = BTreeMap::new();

        for (letter, prompts) in categories {
            for index in prompts.keys().take(PROMPTS_PER_LETTER) {
                let cell = CellKey::new(letter.clone(), *index);
                let responses = table.cell(&cell);
                let scores = score_cell(letter, &responses, reviewer);
                for participant in decisions.keys() {
                    let computed = scores.get(participant).copied().unwrap_or(0);
                    entries.insert(
                        ResponseKey::new(participant.clone(), cell.clone()),
                        PointEntry {
                            response: responses.get(participant).cloned(),
                            computed,
                            awarded: computed,
                            locked: participant == reviewer,
                        },
                    );
                }
            }
        }

        Self { entries }
    }

    /// Checkbox for one response.
    pub fn entry(&self, key: &ResponseKey) -> Option<&PointEntry> {
        self.entries.get(key)
    }

    /// Every checkbox, ordered by participant, letter and index.
    pub fn entries(&self) -> impl Iterator<Item = (&ResponseKey, &PointEntry)> {
        self.entries.iter()
    }

    /// Flip a checkbox between zero and its computed value, returning the new value.
    pub fn toggle(&mut self, key: &ResponseKey) -> Result<u32, SessionError> {
        let entry = self.entries.get_mut(key).ok_or_else(|| {
            SessionError::InvalidInput(format!(
                "no response from {} for {}{}",
                key.participant, key.cell.letter, key.cell.index
            ))
        })?;
        if entry.locked {
            return Err(SessionError::InvalidInput(
                "participants cannot score their own responses".into(),
            ));
        }

        entry.awarded = if entry.is_checked() { 0 } else { entry.computed };
        Ok(entry.awarded)
    }

    /// Points to submit, keyed participant, letter, index. The reviewer's own row is left out.
    pub fn to_points(&self) -> PointsByParticipant {
        let mut points = PointsByParticipant::new();
        for (key, entry) in self.entries.iter().filter(|(_, entry)| !entry.locked) {
            points
                .entry(key.participant.clone())
                .or_default()
                .entry(key.cell.letter.clone())
                .or_default()
                .insert(key.cell.index, entry.awarded);
        }
        points
    }

    /// Sum of awarded points per participant, as currently checked.
    pub fn totals(&self) -> BTreeMap<Identity, u32> {
        let mut totals = BTreeMap::new();
        for (key, entry) in &self.entries {
            *totals.entry(key.participant.clone()).or_insert(0) += entry.awarded;
        }
        totals
    }
}
