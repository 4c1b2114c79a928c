//! States and the state arena.
//!
//! State graphs are cyclic (self-looping dead states, alternating pairs) and
//! many entries point at the same target, so states live in a [`StateGraph`]
//! arena and refer to each other through copyable [`StateId`] handles.
//! Machines hold only the id of their initial state; one graph can back
//! several machines.

use crate::config::{EngineConfig, Limits};
use crate::error::FsmError;
use crate::matcher::{any_byte, predicate, Predicate};
use crate::output::Handler;
use crate::table::{Entry, EntryId, EntryKind, TransitionTable};
use serde::Serialize;

/// Handle to a state in a [`StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StateId(u32);

impl StateId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Id for the arena slot at `index`, if it fits in a handle.
    fn for_slot(index: usize) -> Result<Self, FsmError> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| FsmError::TooManyStates {
                max: u32::MAX as usize,
            })
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A node with a finality flag and its own transition table.
#[derive(Debug, Clone)]
pub struct State {
    id: StateId,
    name: String,
    is_final: bool,
    table: TransitionTable,
}

impl State {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }
}

/// Arena owning every state and its transition table.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    states: Vec<State>,
    limits: Limits,
}

impl StateGraph {
    pub fn new(limits: Limits) -> Self {
        Self {
            states: Vec::new(),
            limits,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.limits.clone())
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    /// Creates a state. Finality is fixed for the life of the state.
    pub fn create_state(&mut self, name: &str, is_final: bool) -> Result<StateId, FsmError> {
        if name.is_empty() {
            return Err(FsmError::EmptyName);
        }
        if name.len() > self.limits.max_state_name {
            return Err(FsmError::NameTooLong {
                name: name.to_string(),
                len: name.len(),
                max: self.limits.max_state_name,
            });
        }

        let id = StateId::for_slot(self.states.len())?;
        self.states.push(State {
            id,
            name: name.to_string(),
            is_final,
            table: TransitionTable::with_capacity(self.limits.max_table_size),
        });

        tracing::debug!(state = name, is_final, id = id.as_u32(), "created state");
        Ok(id)
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    pub fn state(&self, id: StateId) -> Result<&State, FsmError> {
        self.get(id).ok_or(FsmError::UnknownState(id.as_u32()))
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State, FsmError> {
        self.states
            .get_mut(id.index())
            .ok_or(FsmError::UnknownState(id.as_u32()))
    }

    /// Looks up the first state with the given name.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states.iter().find(|s| s.name == name).map(|s| s.id)
    }

    pub fn entry(&self, id: EntryId) -> Result<&Entry, FsmError> {
        let state = self.state(id.state)?;
        state.table.get(id.index).ok_or_else(|| FsmError::UnknownEntry {
            state: state.name.clone(),
            index: id.index,
        })
    }

    fn insert(&mut self, from: StateId, to: StateId, entry: Entry) -> Result<EntryId, FsmError> {
        self.state(to)?;
        let state = self.state_mut(from)?;
        let index = state.table.push(entry).ok_or_else(|| FsmError::TableFull {
            state: state.name.clone(),
            capacity: state.table.capacity(),
        })?;
        Ok(EntryId { state: from, index })
    }

    /// Adds a literal-key entry to `from`'s table.
    ///
    /// An empty key makes a predicate-ready entry; until a predicate is
    /// registered it matches unconditionally without consuming input.
    pub fn add_entry(
        &mut self,
        from: StateId,
        key: &[u8],
        to: StateId,
        handler: Option<Handler>,
    ) -> Result<EntryId, FsmError> {
        if key.len() > self.limits.max_key_size {
            return Err(FsmError::KeyTooLong {
                len: key.len(),
                max: self.limits.max_key_size,
            });
        }

        let id = self.insert(from, to, Entry::new(EntryKind::Literal(key.to_vec()), to, handler))?;
        tracing::debug!(
            from = from.as_u32(),
            to = to.as_u32(),
            key = %String::from_utf8_lossy(key),
            index = id.index,
            "added entry"
        );
        Ok(id)
    }

    /// Adds an entry with an empty key, ready for [`register_predicate`].
    ///
    /// [`register_predicate`]: StateGraph::register_predicate
    pub fn add_predicate_entry(
        &mut self,
        from: StateId,
        to: StateId,
        handler: Option<Handler>,
    ) -> Result<EntryId, FsmError> {
        self.add_entry(from, &[], to, handler)
    }

    /// Appends a predicate to an entry. Predicates run in registration order.
    pub fn register_predicate(
        &mut self,
        entry: EntryId,
        matcher: Predicate,
    ) -> Result<(), FsmError> {
        let max = self.limits.max_predicates;
        let state = self.state_mut(entry.state)?;
        let name = state.name.clone();
        let target = state
            .table
            .get_mut(entry.index)
            .ok_or_else(|| FsmError::UnknownEntry {
                state: name.clone(),
                index: entry.index,
            })?;

        if let EntryKind::Wildcard(_) = target.kind() {
            return Err(FsmError::WildcardPredicate {
                state: name,
                index: entry.index,
            });
        }
        if let EntryKind::Literal(key) = target.kind() {
            if !key.is_empty() {
                tracing::debug!(state = %name, index = entry.index, "predicate replaces literal key");
            }
        }

        target
            .push_predicate(matcher, max)
            .map_err(|_| FsmError::PredicateLimit {
                state: name,
                index: entry.index,
                max,
            })
    }

    /// Adds a catch-all entry. Without a matcher it accepts any single byte.
    pub fn add_wildcard_entry(
        &mut self,
        from: StateId,
        to: StateId,
        handler: Option<Handler>,
        matcher: Option<Predicate>,
    ) -> Result<EntryId, FsmError> {
        let matcher = matcher.unwrap_or_else(|| predicate(any_byte));
        let id = self.insert(from, to, Entry::new(EntryKind::Wildcard(matcher), to, handler))?;
        tracing::debug!(
            from = from.as_u32(),
            to = to.as_u32(),
            index = id.index,
            "added wildcard entry"
        );
        Ok(id)
    }
}
