//! The domain store: for each slot, the words that could still legally fill it. Domains only ever
//! shrink, and the surviving words keep their original relative order.

use tracing::info;

use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;
use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    /// Remaining options for each slot, indexed by `SlotId`.
    options: Vec<Vec<WordId>>,
}

impl Domains {
    /// Seed every slot with its own copy of the full vocabulary, in word list order.
    #[must_use]
    pub fn new(config: &GridConfig, word_list: &WordList) -> Domains {
        Domains {
            options: config
                .slot_ids()
                .map(|_| word_list.word_ids().collect())
                .collect(),
        }
    }

    /// Build a store from explicit option lists, one per slot.
    #[must_use]
    pub fn from_options(options: Vec<Vec<WordId>>) -> Domains {
        Domains { options }
    }

    /// The words still available for the given slot.
    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> &[WordId] {
        &self.options[slot_id]
    }

    #[must_use]
    pub fn option_count(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    /// Total number of options across every slot.
    #[must_use]
    pub fn total_option_count(&self) -> usize {
        self.options.iter().map(Vec::len).sum()
    }

    /// The first slot (in enumeration order) with no options left, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.options.iter().position(Vec::is_empty)
    }

    /// Keep only the options of `slot_id` for which `keep` returns true, returning how many were
    /// removed.
    pub fn retain<F>(&mut self, slot_id: SlotId, mut keep: F) -> usize
    where
        F: FnMut(WordId) -> bool,
    {
        let options = &mut self.options[slot_id];
        let before = options.len();
        options.retain(|&word_id| keep(word_id));
        before - options.len()
    }

    /// Enforce the unary constraint on every slot: remove each word whose length differs from the
    /// slot's length. This never fails, though it can leave a domain empty. Returns the number of
    /// words removed across all slots.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig, word_list: &WordList) -> usize {
        let eliminations: usize = config
            .slot_configs
            .iter()
            .map(|slot_config| {
                self.retain(slot_config.id, |word_id| {
                    word_list.words[word_id].length() == slot_config.length
                })
            })
            .sum();

        if CHECK_INVARIANTS {
            for slot_config in &config.slot_configs {
                assert!(
                    self.get(slot_config.id)
                        .iter()
                        .all(|&word_id| word_list.words[word_id].length() == slot_config.length),
                    "Wrong-length word survived node consistency?"
                );
            }
        }

        info!(
            event = "node_consistency",
            eliminations,
            remaining = self.total_option_count(),
        );

        eliminations
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::Domains;
    use crate::grid_config::generate_grid_config_from_template_string;
    use crate::word_list::WordList;

    fn strings<'a>(word_list: &'a WordList, domain: &[usize]) -> Vec<&'a str> {
        domain
            .iter()
            .map(|&word_id| word_list.words[word_id].normalized_string.as_str())
            .collect()
    }

    #[test]
    fn test_node_consistency_filters_by_length() {
        // A three-letter across slot crossing a four-letter down slot.
        let config = generate_grid_config_from_template_string(
            "
            ___
            #_#
            #_#
            #_#
            ",
        )
        .unwrap();
        let word_list = WordList::new(["cat", "dog", "cats", "dogs"], None);
        let mut domains = Domains::new(&config, &word_list);

        assert_eq!(domains.option_count(0), 4);
        assert_eq!(domains.enforce_node_consistency(&config, &word_list), 4);

        assert_eq!(strings(&word_list, domains.get(0)), vec!["CAT", "DOG"]);
        assert_eq!(strings(&word_list, domains.get(1)), vec!["CATS", "DOGS"]);
    }

    #[test]
    fn test_node_consistency_is_idempotent() {
        let config = generate_grid_config_from_template_string("___\n_#_\n___").unwrap();
        let word_list = WordList::new(["one", "two", "three", "fours"], None);
        let mut domains = Domains::new(&config, &word_list);

        domains.enforce_node_consistency(&config, &word_list);
        let after_first_pass = domains.clone();

        assert_eq!(domains.enforce_node_consistency(&config, &word_list), 0);
        assert_eq!(domains, after_first_pass);
    }

    #[test]
    fn test_node_consistency_can_empty_a_domain() {
        let config = generate_grid_config_from_template_string("____").unwrap();
        let word_list = WordList::new(["cat", "horse"], None);
        let mut domains = Domains::new(&config, &word_list);

        domains.enforce_node_consistency(&config, &word_list);

        assert_eq!(domains.first_empty_slot(), Some(0));
    }

    #[test]
    fn test_slot_domains_are_independent() {
        let config = generate_grid_config_from_template_string("___\n#_#\n#_#").unwrap();
        let word_list = WordList::new(["cat", "dog"], None);
        let mut domains = Domains::new(&config, &word_list);

        assert_eq!(domains.retain(0, |word_id| word_id == 0), 1);

        assert_eq!(domains.get(0), &[0]);
        assert_eq!(domains.get(1), &[0, 1]);
    }
}
