//! Machine and invocation driver.
//!
//! A [`Machine`] names an initial state in a [`StateGraph`] and drives input
//! through it: at each step the current state's table selects the first
//! matching entry, its output handler runs, the cursor advances by the
//! bytes consumed and the entry's target becomes the current state. A run
//! succeeds when the cursor reaches the end of the input exactly; it is
//! accepted when the state it ends in is final.
//!
//! Entries may match without consuming input. At most one such step is
//! taken per cursor position; a second one at the same position fails the
//! run with [`FsmError::ZeroProgress`].
//!
//! Machines are not synchronized. Invoking one machine from several threads
//! requires external locking, or one machine per thread.

use crate::config::EngineConfig;
use crate::error::FsmError;
use crate::matcher::{ExactBytes, LiteralMatcher};
use crate::output::OutputBuffer;
use crate::state::{StateGraph, StateId};
use crate::table::EntryKind;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Whether the run ended in a final state.
    pub accepted: bool,
    /// State the run ended in.
    pub final_state: StateId,
    /// Name of the state the run ended in.
    pub final_state_name: String,
    /// Input bytes consumed; always the full input on success.
    pub consumed: usize,
    /// Transitions taken.
    pub steps: usize,
    /// Whether any output was cut short.
    pub output_truncated: bool,
}

/// A finite state machine over a [`StateGraph`].
pub struct Machine {
    name: String,
    initial: Option<StateId>,
    input: Vec<u8>,
    cursor: usize,
    current: Option<StateId>,
    output: OutputBuffer,
    literal: Box<dyn LiteralMatcher>,
    max_input: usize,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("initial", &self.initial)
            .field("cursor", &self.cursor)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Creates a machine with the default (exact, case-sensitive) literal matcher.
    pub fn new(name: &str, config: &EngineConfig) -> Result<Self, FsmError> {
        let max = config.limits.max_machine_name;
        if name.len() > max {
            return Err(FsmError::NameTooLong {
                name: name.to_string(),
                len: name.len(),
                max,
            });
        }

        Ok(Self {
            name: name.to_string(),
            initial: None,
            input: Vec::new(),
            cursor: 0,
            current: None,
            output: OutputBuffer::from_config(config)?,
            literal: Box::new(ExactBytes),
            max_input: config.limits.max_input_size,
        })
    }

    /// Replaces the literal matcher used for keyed entries.
    pub fn with_literal_matcher(mut self, matcher: impl LiteralMatcher + 'static) -> Self {
        self.literal = Box::new(matcher);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    /// Sets the initial state. Returns false, changing nothing, if one is already set.
    pub fn set_initial_state(&mut self, state: StateId) -> bool {
        self.try_set_initial_state(state).is_ok()
    }

    pub fn try_set_initial_state(&mut self, state: StateId) -> Result<(), FsmError> {
        if self.initial.is_some() {
            return Err(FsmError::InitialStateAlreadySet {
                machine: self.name.clone(),
            });
        }
        self.initial = Some(state);
        Ok(())
    }

    /// Stores input for runs that do not pass their own.
    pub fn set_input(&mut self, input: &[u8]) -> Result<(), FsmError> {
        if input.len() > self.max_input {
            return Err(FsmError::InputTooLarge {
                len: input.len(),
                max: self.max_input,
            });
        }
        self.input.clear();
        self.input.extend_from_slice(input);
        Ok(())
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// Input offset where the last run stopped.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// State where the last run stopped.
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    /// Internal output buffer, used when a run is given no sink.
    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    /// Runs the machine.
    ///
    /// `input` defaults to the buffered input set with [`set_input`]; `output`
    /// defaults to the internal buffer. Whichever sink is used is reset
    /// before the run. On failure, output written by earlier steps is kept
    /// and [`cursor`] / [`current_state`] report where the run stopped.
    ///
    /// [`set_input`]: Machine::set_input
    /// [`cursor`]: Machine::cursor
    /// [`current_state`]: Machine::current_state
    pub fn invoke(
        &mut self,
        graph: &StateGraph,
        input: Option<&[u8]>,
        output: Option<&mut OutputBuffer>,
    ) -> Result<Invocation, FsmError> {
        let initial = self.initial.ok_or_else(|| FsmError::NoInitialState {
            machine: self.name.clone(),
        })?;
        graph.state(initial)?;

        let Machine {
            name,
            input: buffered,
            cursor,
            current,
            output: internal,
            literal,
            max_input,
            ..
        } = self;

        let input = input.unwrap_or(buffered.as_slice());
        if input.len() > *max_input {
            return Err(FsmError::InputTooLarge {
                len: input.len(),
                max: *max_input,
            });
        }

        let out = match output {
            Some(out) => out,
            None => internal,
        };
        out.reset();
        *cursor = 0;
        *current = Some(initial);

        let result = drive(graph, initial, input, &**literal, out, cursor, current);
        out.finish();

        let steps = match result {
            Ok(steps) => steps,
            Err(e) => {
                tracing::debug!(machine = %name, cursor = *cursor, error = %e, "run rejected");
                return Err(e);
            }
        };

        let state = graph.state(current.unwrap_or(initial))?;
        let invocation = Invocation {
            accepted: state.is_final(),
            final_state: state.id(),
            final_state_name: state.name().to_string(),
            consumed: *cursor,
            steps,
            output_truncated: out.is_truncated(),
        };

        tracing::debug!(
            machine = %name,
            accepted = invocation.accepted,
            state = %invocation.final_state_name,
            steps,
            "run complete"
        );
        Ok(invocation)
    }

    /// Renders the states reachable from the initial state.
    pub fn describe(&self, graph: &StateGraph) -> String {
        let mut text = String::new();
        let Some(initial) = self.initial else {
            let _ = writeln!(text, "machine '{}' (no initial state)", self.name);
            return text;
        };

        let initial_name = graph.get(initial).map(|s| s.name()).unwrap_or("?");
        let _ = writeln!(text, "machine '{}' (initial: {})", self.name, initial_name);

        let mut seen = HashSet::from([initial]);
        let mut queue = VecDeque::from([initial]);
        while let Some(id) = queue.pop_front() {
            let Some(state) = graph.get(id) else {
                continue;
            };
            let marker = if state.is_final() { " [final]" } else { "" };
            let _ = writeln!(text, "  {}{}", state.name(), marker);

            for entry in state.table().entries() {
                let target = graph.get(entry.next()).map(|s| s.name()).unwrap_or("?");
                let rule = match entry.kind() {
                    EntryKind::Literal(key) if key.is_empty() => "<empty>".to_string(),
                    EntryKind::Literal(key) => format!("'{}'", String::from_utf8_lossy(key)),
                    EntryKind::Predicates(list) => format!("<{} predicate(s)>", list.len()),
                    EntryKind::Wildcard(_) => "<any>".to_string(),
                };
                let _ = writeln!(text, "    {} -> {}", rule, target);

                if seen.insert(entry.next()) {
                    queue.push_back(entry.next());
                }
            }
        }
        text
    }
}

/// Drives `input` from `start` to the end, returning the number of steps.
fn drive(
    graph: &StateGraph,
    start: StateId,
    input: &[u8],
    literal: &dyn LiteralMatcher,
    out: &mut OutputBuffer,
    cursor: &mut usize,
    current: &mut Option<StateId>,
) -> Result<usize, FsmError> {
    let mut state = graph.state(start)?;
    let mut steps = 0;
    let mut zero_step_at = None;

    while *cursor < input.len() {
        let remaining = &input[*cursor..];
        let Some(selection) = state.table().select(remaining, literal)? else {
            return Err(FsmError::FailedTransition {
                state: state.name().to_string(),
                cursor: *cursor,
            });
        };

        if selection.consumed == 0 {
            if zero_step_at == Some(*cursor) {
                return Err(FsmError::ZeroProgress {
                    state: state.name().to_string(),
                    cursor: *cursor,
                });
            }
            zero_step_at = Some(*cursor);
        }

        let next = graph.state(selection.next)?;
        if let Some(handler) = state
            .table()
            .get(selection.index)
            .and_then(|entry| entry.handler())
        {
            handler.on_transition(state, next, &remaining[..selection.consumed], out);
        }

        tracing::trace!(
            from = state.name(),
            to = next.name(),
            cursor = *cursor,
            consumed = selection.consumed,
            "transition"
        );

        *cursor += selection.consumed;
        *current = Some(next.id());
        state = next;
        steps += 1;
    }

    Ok(steps)
}
