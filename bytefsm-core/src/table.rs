//! Transition tables and the matching engine.
//!
//! Entries are evaluated in insertion order and the first entry that matches
//! wins; there is no backtracking. An entry is in exactly one mode:
//!
//! - **Literal**: matches when the input starts with the key. Consumes the
//!   key's length. An empty key matches unconditionally and consumes nothing.
//! - **Predicates**: an ordered list; the first predicate to accept decides
//!   how many bytes are consumed. Registering a predicate on a literal entry
//!   turns it into a predicate entry and its key is dropped.
//! - **Wildcard**: a single catch-all predicate, normally [`any_byte`].
//!
//! [`any_byte`]: crate::matcher::any_byte

use crate::error::FsmError;
use crate::matcher::{LiteralMatcher, Predicate};
use crate::output::Handler;
use crate::state::StateId;
use serde::Serialize;

/// Handle to an entry in a state's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntryId {
    pub state: StateId,
    pub index: usize,
}

/// How an entry decides whether it matches.
#[derive(Clone)]
pub enum EntryKind {
    Literal(Vec<u8>),
    Predicates(Vec<Predicate>),
    Wildcard(Predicate),
}

impl std::fmt::Debug for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Literal(key) => f
                .debug_tuple("Literal")
                .field(&String::from_utf8_lossy(key))
                .finish(),
            EntryKind::Predicates(list) => f.debug_tuple("Predicates").field(&list.len()).finish(),
            EntryKind::Wildcard(_) => f.write_str("Wildcard"),
        }
    }
}

/// A single transition rule.
#[derive(Clone)]
pub struct Entry {
    kind: EntryKind,
    next: StateId,
    handler: Option<Handler>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.kind)
            .field("next", &self.next)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Entry {
    pub(crate) fn new(kind: EntryKind, next: StateId, handler: Option<Handler>) -> Self {
        Self {
            kind,
            next,
            handler,
        }
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn next(&self) -> StateId {
        self.next
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Number of registered predicates; zero for literal and wildcard entries.
    pub fn predicate_count(&self) -> usize {
        match &self.kind {
            EntryKind::Predicates(list) => list.len(),
            _ => 0,
        }
    }

    /// Appends a predicate, converting a literal entry into a predicate entry.
    pub(crate) fn push_predicate(&mut self, predicate: Predicate, max: usize) -> Result<(), usize> {
        if max == 0 {
            return Err(self.predicate_count());
        }
        if let EntryKind::Literal(_) = self.kind {
            self.kind = EntryKind::Predicates(vec![predicate]);
            return Ok(());
        }
        match &mut self.kind {
            EntryKind::Predicates(list) if list.len() < max => {
                list.push(predicate);
                Ok(())
            }
            EntryKind::Predicates(list) => Err(list.len()),
            _ => Err(0),
        }
    }

    /// Tests the entry against the remaining input.
    ///
    /// Returns the number of bytes consumed on a match.
    pub fn try_match(
        &self,
        input: &[u8],
        literal: &dyn LiteralMatcher,
    ) -> Result<Option<usize>, FsmError> {
        match &self.kind {
            EntryKind::Literal(key) => {
                if key.len() > input.len() {
                    return Ok(None);
                }
                let matched = literal.compare(key, &input[..key.len()]);
                Ok(matched.then_some(key.len()))
            }
            EntryKind::Predicates(list) => {
                for predicate in list {
                    if let Some(consumed) = predicate.matches(input) {
                        return checked(consumed, input.len()).map(Some);
                    }
                }
                Ok(None)
            }
            EntryKind::Wildcard(predicate) => match predicate.matches(input) {
                Some(consumed) => checked(consumed, input.len()).map(Some),
                None => Ok(None),
            },
        }
    }
}

fn checked(consumed: usize, remaining: usize) -> Result<usize, FsmError> {
    if consumed > remaining {
        return Err(FsmError::MatcherOverrun {
            consumed,
            remaining,
        });
    }
    Ok(consumed)
}

/// Outcome of a successful table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Index of the matching entry.
    pub index: usize,
    /// Target state.
    pub next: StateId,
    /// Bytes consumed by the match.
    pub consumed: usize,
}

/// Fixed-capacity, insertion-ordered list of entries.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    entries: Vec<Entry>,
    capacity: usize,
}

impl TransitionTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    /// Appends an entry, returning its index, or `None` when full.
    pub(crate) fn push(&mut self, entry: Entry) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.entries.push(entry);
        Some(self.entries.len() - 1)
    }

    /// Finds the first entry matching the start of `input`.
    pub fn select(
        &self,
        input: &[u8],
        literal: &dyn LiteralMatcher,
    ) -> Result<Option<Selection>, FsmError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if let Some(consumed) = entry.try_match(input, literal)? {
                return Ok(Some(Selection {
                    index,
                    next: entry.next,
                    consumed,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{any_byte, ascii_digit, ascii_lower, predicate, ExactBytes};

    fn sid(n: u32) -> StateId {
        StateId::from_raw(n)
    }

    fn literal(key: &[u8], next: u32) -> Entry {
        Entry::new(EntryKind::Literal(key.to_vec()), sid(next), None)
    }

    #[test]
    fn test_literal_exactness() {
        let mut table = TransitionTable::with_capacity(4);
        table.push(literal(b"abc", 1)).unwrap();

        let hit = table.select(b"abcd", &ExactBytes).unwrap().unwrap();
        assert_eq!(hit.next, sid(1));
        assert_eq!(hit.consumed, 3);

        assert!(table.select(b"abx", &ExactBytes).unwrap().is_none());
        assert!(table.select(b"ab", &ExactBytes).unwrap().is_none());
        assert!(table.select(b"ABC", &ExactBytes).unwrap().is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = TransitionTable::with_capacity(4);
        table.push(literal(b"a", 1)).unwrap();
        table.push(literal(b"ab", 2)).unwrap();

        let hit = table.select(b"ab", &ExactBytes).unwrap().unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.next, sid(1));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut table = TransitionTable::with_capacity(1);
        assert_eq!(table.push(literal(b"a", 0)), Some(0));
        assert!(table.is_full());
        assert_eq!(table.push(literal(b"b", 0)), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_predicates_are_ored_in_order() {
        let mut entry = literal(b"", 1);
        entry.push_predicate(predicate(ascii_digit), 2).unwrap();
        entry.push_predicate(predicate(ascii_lower), 2).unwrap();
        assert_eq!(entry.predicate_count(), 2);
        assert_eq!(entry.push_predicate(predicate(any_byte), 2), Err(2));

        assert_eq!(entry.try_match(b"7", &ExactBytes).unwrap(), Some(1));
        assert_eq!(entry.try_match(b"q", &ExactBytes).unwrap(), Some(1));
        assert_eq!(entry.try_match(b"Q", &ExactBytes).unwrap(), None);
    }

    #[test]
    fn test_zero_predicate_limit_keeps_literal() {
        let mut entry = literal(b"x", 1);
        assert_eq!(entry.push_predicate(predicate(ascii_digit), 0), Err(0));
        assert_eq!(entry.predicate_count(), 0);
        assert_eq!(entry.try_match(b"x", &ExactBytes).unwrap(), Some(1));
    }

    #[test]
    fn test_predicate_replaces_literal_key() {
        let mut entry = literal(b"x", 1);
        entry.push_predicate(predicate(ascii_digit), 4).unwrap();
        assert_eq!(entry.try_match(b"x", &ExactBytes).unwrap(), None);
        assert_eq!(entry.try_match(b"5", &ExactBytes).unwrap(), Some(1));
    }

    #[test]
    fn test_wildcard_rejects_predicates() {
        let mut entry = Entry::new(EntryKind::Wildcard(predicate(any_byte)), sid(0), None);
        assert!(entry.push_predicate(predicate(ascii_digit), 4).is_err());
        assert_eq!(entry.try_match(b"@", &ExactBytes).unwrap(), Some(1));
    }

    #[test]
    fn test_empty_key_matches_without_consuming() {
        let entry = literal(b"", 3);
        assert_eq!(entry.try_match(b"anything", &ExactBytes).unwrap(), Some(0));
    }

    #[test]
    fn test_matcher_overrun_is_an_error() {
        let greedy = predicate(|_: &[u8]| Some(10));
        let entry = Entry::new(EntryKind::Wildcard(greedy), sid(0), None);
        let err = entry.try_match(b"abc", &ExactBytes).unwrap_err();
        assert!(matches!(
            err,
            FsmError::MatcherOverrun {
                consumed: 10,
                remaining: 3
            }
        ));
    }
}
