//! This module implements grid-filling as plain chronological backtracking over the domains left
//! behind by node consistency and AC-3. We pick a slot, try each of its remaining words against
//! everything assigned so far, recurse on the first one that fits, and undo it if the recursion
//! comes back empty-handed. Propagation happens once, up front; the search itself never shrinks a
//! domain, so only the assignment needs to be rolled back.
//!
//! Which slot gets filled next and the order its words are tried in are pluggable through
//! `SlotSelector` and `ValueOrdering`. The defaults are enumeration order and domain order.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::arc_consistency::{
    establish_arc_consistency, ArcConsistencyFailure, ArcConsistencySuccess,
};
use crate::domains::Domains;
use crate::grid_config::{Choice, GridConfig, SlotId};
use crate::types::WordId;
use crate::word_list::{Word, WordList};
use crate::CHECK_INVARIANTS;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Number of calls to `backtrack`, i.e. partial assignments visited.
    pub states: usize,
    /// Number of tentative assignments that were undone.
    pub backtracks: usize,
    pub revisions: usize,
    pub node_eliminations: usize,
    pub arc_eliminations: usize,
    pub total_time: Duration,
    pub node_consistency_time: Duration,
    pub arc_consistency_time: Duration,
    pub search_time: Duration,
}

/// A partial or complete mapping from slots to the words chosen for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    words: BTreeMap<SlotId, WordId>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Assignment {
        Assignment::default()
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words.get(&slot_id).copied()
    }

    #[must_use]
    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words.contains_key(&slot_id)
    }

    /// Assign a word to a slot, returning whatever was there before.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        self.words.insert(slot_id, word_id)
    }

    /// Remove the slot's entry entirely, so it counts as unassigned again.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        self.words.remove(&slot_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Assigned `(slot, word)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words.iter().map(|(&slot_id, &word_id)| (slot_id, word_id))
    }

    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }
}

/// Strategy for deciding which unassigned slot the search should fill next.
pub trait SlotSelector {
    /// Pick the next slot to fill, or `None` if there's nothing left to pick.
    fn select_unassigned_slot(
        &self,
        config: &GridConfig,
        domains: &Domains,
        assignment: &Assignment,
    ) -> Option<SlotId>;
}

/// Strategy for deciding the order in which a slot's remaining words are tried.
pub trait ValueOrdering {
    fn order_domain_values<'d>(
        &self,
        slot_id: SlotId,
        domains: &'d Domains,
        assignment: &Assignment,
    ) -> Cow<'d, [WordId]>;
}

/// Take the first slot, in enumeration order, that isn't assigned yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstUnassigned;

impl SlotSelector for FirstUnassigned {
    fn select_unassigned_slot(
        &self,
        config: &GridConfig,
        _domains: &Domains,
        assignment: &Assignment,
    ) -> Option<SlotId> {
        config
            .slot_ids()
            .find(|&slot_id| !assignment.is_assigned(slot_id))
    }
}

/// Try words in the order they sit in the slot's domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainOrder;

impl ValueOrdering for DomainOrder {
    fn order_domain_values<'d>(
        &self,
        slot_id: SlotId,
        domains: &'d Domains,
        _assignment: &Assignment,
    ) -> Cow<'d, [WordId]> {
        Cow::Borrowed(domains.get(slot_id))
    }
}

/// Is every slot in the grid assigned a word that actually belongs to the word list?
#[must_use]
pub fn is_assignment_complete(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> bool {
    config.slot_ids().all(|slot_id| {
        assignment
            .get(slot_id)
            .is_some_and(|word_id| word_list.get_word(word_id).is_some())
    })
}

/// Check every assigned word against its slot's length, and every pair of assigned words against
/// each other: no word may appear twice, and crossing words must agree on their shared letter.
#[must_use]
pub fn is_consistent(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> bool {
    let mut assigned: Vec<(SlotId, &Word)> = Vec::with_capacity(assignment.len());

    for (slot_id, word_id) in assignment.iter() {
        let Some(word) = word_list.get_word(word_id) else {
            return false;
        };
        if word.length() != config.slot_configs[slot_id].length {
            return false;
        }
        assigned.push((slot_id, word));
    }

    // Overlaps are symmetric, so each unordered pair only needs checking once.
    for (idx, &(x, word_x)) in assigned.iter().enumerate() {
        for &(y, word_y) in &assigned[idx + 1..] {
            if word_x.normalized_string == word_y.normalized_string {
                return false;
            }

            if let Some((i, j)) = config.overlap(x, y) {
                if word_x.glyphs[i] != word_y.glyphs[j] {
                    return false;
                }
            }
        }
    }

    true
}

/// Recursive depth-first search over assignments, reading (never modifying) a domain store that has
/// already been made consistent.
pub struct BacktrackingSearch<'a, S: SlotSelector, V: ValueOrdering> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: &'a Domains,
    slot_selector: S,
    value_ordering: V,
    statistics: Statistics,
}

impl<'a, S: SlotSelector, V: ValueOrdering> BacktrackingSearch<'a, S, V> {
    #[must_use]
    pub fn new(
        config: &'a GridConfig,
        word_list: &'a WordList,
        domains: &'a Domains,
        slot_selector: S,
        value_ordering: V,
    ) -> Self {
        BacktrackingSearch {
            config,
            word_list,
            domains,
            slot_selector,
            value_ordering,
            statistics: Statistics::default(),
        }
    }

    /// Try to extend `assignment` into a complete, consistent one. If we succeed, `assignment`
    /// holds the result; if we fail, it's left exactly as it was passed in.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> bool {
        self.statistics.states += 1;

        if is_assignment_complete(self.config, self.word_list, assignment) {
            return true;
        }

        let Some(slot_id) = self
            .slot_selector
            .select_unassigned_slot(self.config, self.domains, assignment)
        else {
            return false;
        };

        let candidates = self
            .value_ordering
            .order_domain_values(slot_id, self.domains, assignment);

        for &word_id in candidates.iter() {
            assignment.assign(slot_id, word_id);

            if is_consistent(self.config, self.word_list, assignment) && self.backtrack(assignment)
            {
                return true;
            }

            assignment.unassign(slot_id);
            self.statistics.backtracks += 1;
            trace!(
                event = "backtrack",
                slot = slot_id,
                word = self
                    .word_list
                    .get_word(word_id)
                    .map(|word| word.normalized_string.as_str()),
                depth = assignment.len(),
            );
        }

        false
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}

/// A struct representing the results of a fill operation.
#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,

    /// One choice per slot, in slot order.
    pub choices: Vec<Choice>,
}

impl FillSuccess {
    /// The word chosen for the given slot.
    #[must_use]
    pub fn word_id_for_slot(&self, slot_id: SlotId) -> Option<WordId> {
        self.choices
            .iter()
            .find(|choice| choice.slot_id == slot_id)
            .map(|choice| choice.word_id)
    }
}

/// Why a fill produced no solution. Both cases are ordinary answers for an unsolvable puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// Propagation emptied this slot's domain before search began.
    Unsatisfiable { slot_id: SlotId },

    /// Search tried every remaining candidate without finding a complete assignment.
    Exhausted,
}

/// Search for a valid fill for the given grid, using enumeration order for slots and domain order
/// for words.
pub fn find_fill(config: &GridConfig, word_list: &WordList) -> Result<FillSuccess, FillFailure> {
    find_fill_with_strategies(config, word_list, FirstUnassigned, DomainOrder)
}

/// Search for a valid fill for the given grid: node consistency, then AC-3, then backtracking with
/// the given strategies.
pub fn find_fill_with_strategies<S: SlotSelector, V: ValueOrdering>(
    config: &GridConfig,
    word_list: &WordList,
    slot_selector: S,
    value_ordering: V,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let mut statistics = Statistics::default();

    info!(
        event = "fill_start",
        slots = config.slot_count(),
        words = word_list.len(),
    );

    let mut domains = Domains::new(config, word_list);

    let checkpoint = Instant::now();
    statistics.node_eliminations = domains.enforce_node_consistency(config, word_list);
    statistics.node_consistency_time = checkpoint.elapsed();

    // If we can't even make the grid arc-consistent, there's no point searching.
    let checkpoint = Instant::now();
    match establish_arc_consistency(config, word_list, &mut domains, None) {
        Ok(ArcConsistencySuccess {
            revisions,
            eliminations,
        }) => {
            statistics.revisions = revisions;
            statistics.arc_eliminations = eliminations;
            statistics.arc_consistency_time = checkpoint.elapsed();
        }
        Err(ArcConsistencyFailure { slot_id }) => {
            debug!(
                event = "fill_unsatisfiable",
                slot = %config.slot_configs[slot_id].slot_key(),
            );
            return Err(FillFailure::Unsatisfiable { slot_id });
        }
    }

    let checkpoint = Instant::now();
    let mut assignment = Assignment::new();
    let mut search = BacktrackingSearch::new(
        config,
        word_list,
        &domains,
        slot_selector,
        value_ordering,
    );
    let found = search.backtrack(&mut assignment);
    statistics.states = search.statistics().states;
    statistics.backtracks = search.statistics().backtracks;
    statistics.search_time = checkpoint.elapsed();
    statistics.total_time = start.elapsed();

    if !found {
        debug!(
            event = "search_exhausted",
            states = statistics.states,
            backtracks = statistics.backtracks,
        );
        return Err(FillFailure::Exhausted);
    }

    if CHECK_INVARIANTS {
        assert!(
            is_assignment_complete(config, word_list, &assignment)
                && is_consistent(config, word_list, &assignment),
            "Search returned an invalid assignment?"
        );
    }

    info!(
        event = "fill_complete",
        states = statistics.states,
        backtracks = statistics.backtracks,
        duration_ms = statistics.total_time.as_millis() as u64,
    );

    Ok(FillSuccess {
        statistics,
        choices: assignment.choices(),
    })
}
