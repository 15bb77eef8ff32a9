//! This module contains a crossword-specific implementation of the AC-3 algorithm. For our
//! purposes, a grid is arc-consistent when, for every pair of crossing slots, each word left in one
//! slot's domain has at least one word in the other slot's domain with the same letter in the
//! shared cell.
//!
//! Uniqueness (no word used twice) isn't a binary constraint between crossing slots, so it's
//! checked during search instead (see `backtracking_search`).

use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::util::build_glyph_counts_for_cell;
use crate::word_list::WordList;

/// A directed constraint `(x, y)`: "every word in x's domain needs a compatible word in y's".
pub type ConstraintArc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were popped from the queue and revised.
    pub revisions: usize,

    /// How many words were removed from domains along the way.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`: the domain of `slot_id` was wiped
/// out, so the puzzle has no solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `x`'s domain consistent with `y`'s: remove every word from `x` that has no word in `y`
/// agreeing with it at their shared cell. Returns true if anything was removed. If the slots don't
/// cross, nothing can be removed.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return false;
    };

    // A word in `x` is supported exactly when some word in `y` carries the same glyph at `y_cell`,
    // so one pass over `y` is enough to answer the question for every word in `x`.
    let y_glyph_counts = build_glyph_counts_for_cell(word_list, domains.get(y), y_cell);

    let removed = domains.retain(x, |word_id| {
        word_list.words[word_id]
            .glyphs
            .get(x_cell)
            .is_some_and(|&glyph| y_glyph_counts[glyph] > 0)
    });

    removed > 0
}

/// Every arc `(x, y)` where `y` is a neighbor of `x`, with `x` in enumeration order.
#[must_use]
pub fn all_arcs(config: &GridConfig) -> Vec<ConstraintArc> {
    config
        .slot_ids()
        .flat_map(|x| config.neighbors(x).iter().map(move |&y| (x, y)))
        .collect()
}

/// Run AC-3 over the given arcs (or every arc in the grid, if `arcs` is `None`), shrinking domains
/// in place until no more words can be removed. Fails as soon as any domain is wiped out, and also
/// if some domain was already empty going in.
pub fn establish_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    arcs: Option<Vec<ConstraintArc>>,
) -> ArcConsistencyResult {
    let start = Instant::now();

    let mut queue: VecDeque<ConstraintArc> = arcs.unwrap_or_else(|| all_arcs(config)).into();
    let mut queued: HashSet<ConstraintArc> = queue.iter().copied().collect();
    let mut result = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));
        result.revisions += 1;

        let before = domains.option_count(x);
        if !revise(config, word_list, domains, x, y) {
            continue;
        }

        let remaining = domains.option_count(x);
        result.eliminations += before - remaining;
        trace!(
            event = "revise",
            x,
            y,
            eliminated = before - remaining,
            remaining,
        );

        if remaining == 0 {
            debug!(
                event = "domain_wipeout",
                slot = %config.slot_configs[x].slot_key(),
                revisions = result.revisions,
            );
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        // `x` lost words, so anything relying on `x` for support needs to be rechecked. `y` is
        // skipped because the words `x` just lost had no partner in `y` to begin with.
        for &z in config.neighbors(x) {
            if z != y && queued.insert((z, x)) {
                queue.push_back((z, x));
            }
        }
    }

    if let Some(slot_id) = domains.first_empty_slot() {
        debug!(
            event = "empty_domain",
            slot = %config.slot_configs[slot_id].slot_key(),
        );
        return Err(ArcConsistencyFailure { slot_id });
    }

    info!(
        event = "arc_consistency",
        revisions = result.revisions,
        eliminations = result.eliminations,
        duration_us = start.elapsed().as_micros() as u64,
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use crate::arc_consistency::{
        all_arcs, establish_arc_consistency, revise, ArcConsistencyFailure,
    };
    use crate::domains::Domains;
    use crate::grid_config::{generate_grid_config_from_template_string, GridConfig};
    use crate::word_list::tests::resource_path;
    use crate::word_list::WordList;

    fn load(structure: &str, words: &str) -> (GridConfig, WordList, Domains) {
        let config = GridConfig::from_structure_file(&resource_path(structure)).unwrap();
        let word_list = WordList::from_dict_file(&resource_path(words), None).unwrap();
        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);
        (config, word_list, domains)
    }

    fn strings<'a>(word_list: &'a WordList, domain: &[usize]) -> Vec<&'a str> {
        domain
            .iter()
            .map(|&word_id| word_list.words[word_id].normalized_string.as_str())
            .collect()
    }

    /// For every arc, every word in x's domain has a partner in y's domain.
    fn assert_arc_consistent(config: &GridConfig, word_list: &WordList, domains: &Domains) {
        for (x, y) in all_arcs(config) {
            let (i, j) = config.overlap(x, y).unwrap();
            for &wx in domains.get(x) {
                assert!(
                    domains.get(y).iter().any(|&wy| {
                        word_list.words[wx].glyphs[i] == word_list.words[wy].glyphs[j]
                    }),
                    "{} in slot {x} has no support in slot {y}",
                    word_list.words[wx].normalized_string,
                );
            }
        }
    }

    #[test]
    fn test_revise_removes_unsupported_words() {
        let config = generate_grid_config_from_template_string(
            "
            ___
            #_#
            #_#
            #_#
            ",
        )
        .unwrap();
        let word_list = WordList::new(["cat", "dog", "bat", "cats", "dogs", "also"], None);
        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        // The down slot starts at the across slot's middle letter.
        assert_eq!(config.overlap(0, 1), Some((1, 0)));

        // Only ALSO starts with a letter (A or O) found in the middle of a three-letter word.
        assert!(revise(&config, &word_list, &mut domains, 1, 0));
        assert_eq!(strings(&word_list, domains.get(1)), vec!["ALSO"]);

        assert!(revise(&config, &word_list, &mut domains, 0, 1));
        assert_eq!(strings(&word_list, domains.get(0)), vec!["CAT", "BAT"]);

        assert!(!revise(&config, &word_list, &mut domains, 0, 1));
        assert!(!revise(&config, &word_list, &mut domains, 1, 0));
    }

    #[test]
    fn test_revise_compares_letters_by_value() {
        let config = generate_grid_config_from_template_string("__\n_#").unwrap();
        // Distinct words sharing letters, plus the same letter spelled with a combining accent.
        let word_list = WordList::new(["ab", "ax", "\u{e9}t", "e\u{301}s"], None);
        let mut domains = Domains::from_options(vec![vec![0, 2], vec![3]]);

        assert!(revise(&config, &word_list, &mut domains, 0, 1));
        assert_eq!(domains.get(0), &[2]);
    }

    #[test]
    fn test_revise_is_noop_without_overlap() {
        let config = generate_grid_config_from_template_string(
            "
            ___
            ###
            ___
            ",
        )
        .unwrap();
        let word_list = WordList::new(["cat", "dog", "xyz"], None);
        let mut domains = Domains::from_options(vec![vec![0, 1], vec![2]]);

        assert_eq!(config.overlap(0, 1), None);
        assert!(!revise(&config, &word_list, &mut domains, 0, 1));
        assert!(!revise(&config, &word_list, &mut domains, 1, 0));
        assert_eq!(domains.get(0), &[0, 1]);
        assert_eq!(domains.get(1), &[2]);
    }

    #[test]
    fn test_arc_consistency_solves_structure0() {
        let (config, word_list, mut domains) = load("structure0.txt", "words0.txt");

        let success = establish_arc_consistency(&config, &word_list, &mut domains, None)
            .expect("Failed to establish consistency");

        assert_eq!(strings(&word_list, domains.get(0)), vec!["SEVEN"]);
        assert_eq!(strings(&word_list, domains.get(1)), vec!["ONE"]);
        assert_eq!(strings(&word_list, domains.get(2)), vec!["SIX"]);
        assert_eq!(strings(&word_list, domains.get(3)), vec!["NINE"]);
        assert_eq!(success.eliminations, 10);
        assert_arc_consistent(&config, &word_list, &domains);
    }

    #[test]
    fn test_arc_consistency_postcondition_and_monotonic_shrink() {
        let (config, word_list, mut domains) = load("structure2.txt", "words1.txt");
        let before = domains.clone();

        establish_arc_consistency(&config, &word_list, &mut domains, None)
            .expect("Failed to establish consistency");

        assert_arc_consistent(&config, &word_list, &domains);
        for slot_id in config.slot_ids() {
            assert!(domains
                .get(slot_id)
                .iter()
                .all(|word_id| before.get(slot_id).contains(word_id)));
        }
    }

    #[test]
    fn test_arc_consistency_is_idempotent() {
        let (config, word_list, mut domains) = load("structure2.txt", "words1.txt");

        establish_arc_consistency(&config, &word_list, &mut domains, None).unwrap();
        let after_first_pass = domains.clone();

        let success = establish_arc_consistency(&config, &word_list, &mut domains, None).unwrap();

        assert_eq!(success.eliminations, 0);
        assert_eq!(domains, after_first_pass);
    }

    #[test]
    fn test_arc_consistency_fails_on_missing_length() {
        // No four-letter words, so the down slot is empty after node consistency and can't
        // support anything in the across slot.
        let config = generate_grid_config_from_template_string(
            "
            ___
            #_#
            #_#
            #_#
            ",
        )
        .unwrap();
        let word_list = WordList::new(["cat", "dog", "horse"], None);
        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        assert_eq!(
            establish_arc_consistency(&config, &word_list, &mut domains, None),
            Err(ArcConsistencyFailure { slot_id: 0 })
        );
        assert_eq!(domains.option_count(0), 0);
    }

    #[test]
    fn test_arc_consistency_fails_on_empty_isolated_slot() {
        // A lone slot with no neighbors never gets revised, but its empty domain still counts.
        let config = generate_grid_config_from_template_string("____").unwrap();
        let word_list = WordList::new(["cat"], None);
        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        assert_eq!(
            establish_arc_consistency(&config, &word_list, &mut domains, None),
            Err(ArcConsistencyFailure { slot_id: 0 })
        );
    }

    #[test]
    fn test_explicit_arcs_only_revise_what_was_asked() {
        let (config, word_list, mut domains) = load("structure0.txt", "words0.txt");

        // Start from a single arc. Revising it drops EIGHT from the across slot, which queues
        // (3, 0); that pins the long down slot to NINE, which in turn queues (1, 3).
        let success =
            establish_arc_consistency(&config, &word_list, &mut domains, Some(vec![(0, 2)]))
                .unwrap();

        assert_eq!(success.revisions, 3);
        assert_eq!(strings(&word_list, domains.get(3)), vec!["NINE"]);
        assert_eq!(strings(&word_list, domains.get(1)), vec!["ONE"]);
        // (0, 3) was never queued, so THREE survives even though NINE can't support it.
        assert_eq!(strings(&word_list, domains.get(0)), vec!["THREE", "SEVEN"]);
        assert_eq!(domains.option_count(2), 4);
    }
}
