//! Per-category countdown for the playing phase.
//!
//! Every armed tick carries the generation it was scheduled under. Submitting, advancing or
//! cancelling bumps the generation, so a tick that fires afterwards is recognised as stale and
//! ignored instead of advancing a second time.

use std::{collections::BTreeMap, time::Duration};

use tokio::time::Instant;

use crate::dto::decisions::{Categories, Letter, PromptIndex, Prompts};

/// Most prompts shown for a single letter.
pub const PROMPTS_PER_LETTER: usize = 10;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Drafts collected for a category that just ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedCategory {
    /// Letter that was played.
    pub letter: Letter,
    /// Drafts typed for it, by prompt index.
    pub responses: BTreeMap<PromptIndex, String>,
}

/// Handle for the next scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    generation: u64,
    /// When the tick should fire.
    pub due: Instant,
}

/// Result of moving past the current category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// A new category is now active.
    Entered {
        /// Category left behind, if one was active.
        finished: Option<FinishedCategory>,
        /// Letter now being played.
        letter: Letter,
        /// First tick of the new countdown.
        tick: TickTicket,
    },
    /// Every category has been played. Emitted at most once per timer.
    PlayingDone {
        /// Last category played, if one was active.
        finished: Option<FinishedCategory>,
    },
}

/// What a scheduled tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains; schedule `tick` next.
    Pending {
        /// Whole seconds left.
        remaining: i64,
        /// Next tick to schedule.
        tick: TickTicket,
    },
    /// The deadline passed and the timer moved on.
    Advanced(Advance),
    /// The tick was scheduled before a submit or cancel and must be dropped.
    Stale,
}

/// Countdown and drafts for the local player's run through the categories.
#[derive(Debug, Clone)]
pub struct RoundTimer {
    categories: Categories,
    seen: Vec<Letter>,
    current: Option<Letter>,
    drafts: BTreeMap<PromptIndex, String>,
    duration: Duration,
    deadline: Option<Instant>,
    generation: u64,
    started: bool,
    done: bool,
}

impl RoundTimer {
    /// Prepare a timer over `categories`, skipping letters the player already answered.
    pub fn new<'a>(
        categories: &Categories,
        duration: Duration,
        already_answered: impl IntoIterator<Item = &'a Letter>,
    ) -> Self {
        let seen = already_answered
            .into_iter()
            .filter(|letter| categories.contains_key(*letter))
            .cloned()
            .collect();

        Self {
            categories: categories.clone(),
            seen,
            current: None,
            drafts: BTreeMap::new(),
            duration,
            deadline: None,
            generation: 0,
            started: false,
            done: false,
        }
    }

    /// Enter the first unseen category. Only the first call does anything.
    pub fn start(&mut self, now: Instant) -> Option<Advance> {
        if self.started {
            return None;
        }
        self.started = true;
        Some(self.advance(now))
    }

    /// Letter currently being played.
    pub fn current_letter(&self) -> Option<&Letter> {
        self.current.as_ref()
    }

    /// Prompts shown for the current letter.
    pub fn current_prompts(&self) -> Prompts {
        self.current
            .as_ref()
            .and_then(|letter| self.categories.get(letter))
            .map(|prompts| {
                prompts
                    .iter()
                    .take(PROMPTS_PER_LETTER)
                    .map(|(index, label)| (*index, label.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Letters presented so far, in presentation order.
    pub fn seen(&self) -> &[Letter] {
        &self.seen
    }

    /// Text typed so far for the current letter.
    pub fn drafts(&self) -> &BTreeMap<PromptIndex, String> {
        &self.drafts
    }

    /// Whether every category has been played.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Store the text typed for one prompt of the current letter.
    ///
    /// Returns `false` when no category is active or the prompt is not shown.
    pub fn set_draft(&mut self, index: PromptIndex, text: impl Into<String>) -> bool {
        if self.done || !self.current_prompts().contains_key(&index) {
            return false;
        }
        self.drafts.insert(index, text.into());
        true
    }

    /// Whole seconds left before the deadline, rounded down. Negative once overdue.
    pub fn remaining(&self, now: Instant) -> i64 {
        let Some(deadline) = self.deadline else {
            return 0;
        };
        if now <= deadline {
            (deadline - now).as_millis() as i64 / 1000
        } else {
            let overdue = (now - deadline).as_millis() as i64;
            -((overdue + 999) / 1000)
        }
    }

    /// Handle a scheduled tick.
    pub fn tick(&mut self, ticket: TickTicket, now: Instant) -> TickOutcome {
        if self.done || ticket.generation != self.generation {
            return TickOutcome::Stale;
        }

        let remaining = self.remaining(now);
        if remaining <= 0 {
            TickOutcome::Advanced(self.advance(now))
        } else {
            TickOutcome::Pending {
                remaining,
                tick: self.schedule(now),
            }
        }
    }

    /// Finish the current category early. Any pending tick becomes stale.
    pub fn submit(&mut self, now: Instant) -> Option<Advance> {
        if self.done || self.current.is_none() {
            return None;
        }
        Some(self.advance(now))
    }

    /// Invalidate the pending tick without advancing.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.deadline = None;
    }

    fn schedule(&self, now: Instant) -> TickTicket {
        TickTicket {
            generation: self.generation,
            due: now + TICK_INTERVAL,
        }
    }

    fn advance(&mut self, now: Instant) -> Advance {
        self.generation += 1;

        let finished = self.current.take().map(|letter| FinishedCategory {
            letter,
            responses: std::mem::take(&mut self.drafts),
        });

        let next = self
            .categories
            .keys()
            .find(|letter| !self.seen.contains(letter))
            .cloned();

        match next {
            Some(letter) => {
                self.seen.push(letter.clone());
                self.current = Some(letter.clone());
                self.drafts.clear();
                self.deadline = Some(now + self.duration);
                Advance::Entered {
                    finished,
                    letter,
                    tick: self.schedule(now),
                }
            }
            None => {
                self.done = true;
                self.deadline = None;
                Advance::PlayingDone { finished }
            }
        }
    }
}
