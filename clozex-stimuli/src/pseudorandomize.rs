//! Constraint-based shuffling of stimulus tables.
//!
//! Rows are appended one at a time, each drawn uniformly from the rows that
//! would not extend a run beyond its limit. A dead end restarts the attempt
//! from the given prefix.

use clozex_core::TrialSpec;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StimuliError;

/// Maximum run lengths. A limit of zero disables that constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConstraints {
    /// Same `ExpCondition` in a row.
    pub max_condition: usize,
    /// Same item type (item vs. filler) in a row.
    pub max_type: usize,
    /// Same question presence in a row.
    pub max_question: usize,
    /// Same answer key across consecutive questions, ignoring rows without one.
    pub max_answer: usize,
}

impl OrderConstraints {
    /// Limits for the two fillers that follow the opening question filler.
    pub const OPENING: Self = Self {
        max_condition: 1,
        max_type: 3,
        max_question: 2,
        max_answer: 2,
    };

    /// Limits for the body of a block.
    pub const BODY: Self = Self {
        max_condition: 2,
        max_type: 2,
        max_question: 3,
        max_answer: 3,
    };

    fn admits(&self, order: &[TrialSpec], candidate: &TrialSpec) -> bool {
        !extends_run(order.iter().map(|t| &t.condition), self.max_condition, &candidate.condition)
            && !extends_run(order.iter().map(|t| &t.item_type), self.max_type, &candidate.item_type)
            && !extends_run(
                order.iter().map(|t| &t.has_question),
                self.max_question,
                &candidate.has_question,
            )
            && match &candidate.answer {
                Some(answer) => !extends_run(
                    order.iter().filter_map(|t| t.answer.as_ref()),
                    self.max_answer,
                    answer,
                ),
                None => true,
            }
    }
}

impl Default for OrderConstraints {
    fn default() -> Self {
        Self::BODY
    }
}

/// True if the last `max` values all equal `candidate`.
fn extends_run<'a, T, I>(values: I, max: usize, candidate: &T) -> bool
where
    T: PartialEq + 'a,
    I: DoubleEndedIterator<Item = &'a T>,
{
    if max == 0 {
        return false;
    }
    let mut tail = 0;
    for value in values.rev().take(max) {
        if value != candidate {
            return false;
        }
        tail += 1;
    }
    tail == max
}

/// Appends `n` rows from `pool` to `prefix` under `constraints`.
///
/// Restarts from `prefix` on a dead end, giving up after `max_attempts`.
pub fn extend_order<R: Rng>(
    pool: &[TrialSpec],
    prefix: &[TrialSpec],
    n: usize,
    constraints: &OrderConstraints,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<TrialSpec>, StimuliError> {
    if n > pool.len() {
        return Err(StimuliError::NotEnoughRows {
            requested: n,
            available: pool.len(),
        });
    }

    'attempt: for attempt in 1..=max_attempts {
        let mut order = prefix.to_vec();
        let mut remaining: Vec<&TrialSpec> = pool.iter().collect();

        for _ in 0..n {
            let eligible: Vec<usize> = remaining
                .iter()
                .enumerate()
                .filter(|(_, t)| constraints.admits(&order, t))
                .map(|(i, _)| i)
                .collect();
            if eligible.is_empty() {
                debug!(attempt, placed = order.len(), "no eligible rows, restarting");
                continue 'attempt;
            }
            let pick = eligible[rng.random_range(0..eligible.len())];
            order.push(remaining.swap_remove(pick).clone());
        }
        return Ok(order);
    }

    Err(StimuliError::Unsatisfiable {
        attempts: max_attempts,
    })
}

fn is_filler(spec: &TrialSpec) -> bool {
    spec.item_type.contains("Filler")
}

/// Orders a whole block: a filler with a question first, two more fillers,
/// then everything else.
pub fn standard_order<R: Rng>(rows: &[TrialSpec], rng: &mut R) -> Result<Vec<TrialSpec>, StimuliError> {
    let openers: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, t)| is_filler(t) && t.has_question.is_yes())
        .map(|(i, _)| i)
        .collect();
    if openers.is_empty() {
        return Err(StimuliError::NoQuestionFiller);
    }
    let opener = openers[rng.random_range(0..openers.len())];

    let mut rest: Vec<TrialSpec> = rows.to_vec();
    let first = rest.remove(opener);

    let (fillers, items): (Vec<TrialSpec>, Vec<TrialSpec>) =
        rest.into_iter().partition(is_filler);
    let opening_fillers = 2.min(fillers.len());
    let order = extend_order(
        &fillers,
        std::slice::from_ref(&first),
        opening_fillers,
        &OrderConstraints::OPENING,
        5,
        rng,
    )?;

    let mut remaining: Vec<TrialSpec> = fillers
        .into_iter()
        .filter(|f| !order.iter().any(|o| o.item_num == f.item_num))
        .collect();
    remaining.extend(items);

    let n = remaining.len();
    let order = extend_order(&remaining, &order, n, &OrderConstraints::BODY, 500, rng)?;
    info!(rows = order.len(), "pseudorandomized block");
    Ok(order)
}

/// Several independent orders of the same rows, concatenated. Each row's
/// `latin_list` carries the 1-based order number.
pub fn standard_orders<R: Rng>(
    rows: &[TrialSpec],
    count: usize,
    rng: &mut R,
) -> Result<Vec<TrialSpec>, StimuliError> {
    let mut all = Vec::with_capacity(rows.len() * count);
    for group in 1..=count {
        let order = standard_order(rows, rng)?;
        all.extend(order.into_iter().map(|mut t| {
            t.latin_list = group.to_string();
            t
        }));
    }
    Ok(all)
}
