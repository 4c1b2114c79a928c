//! # bytefsm-core
//!
//! Table-driven finite state machine engine over byte input.
//!
//! This crate provides:
//! - A state arena with fixed-capacity, insertion-ordered transition tables
//! - Literal, predicate and wildcard transition entries
//! - The invocation driver (accept/reject plus an error code)
//! - A bounded output composer written by per-transition handlers
//!
//! ```rust
//! use bytefsm_core::{EngineConfig, Machine, StateGraph};
//!
//! let config = EngineConfig::default();
//! let mut graph = StateGraph::from_config(&config);
//! let s0 = graph.create_state("S0", true).unwrap();
//! graph.add_entry(s0, b"0", s0, None).unwrap();
//! graph.add_entry(s0, b"1", s0, None).unwrap();
//!
//! let mut machine = Machine::new("bits", &config).unwrap();
//! machine.set_initial_state(s0);
//!
//! let run = machine.invoke(&graph, Some(b"0110"), None).unwrap();
//! assert!(run.accepted);
//! ```

pub mod config;
pub mod error;
pub mod machine;
pub mod matcher;
pub mod output;
pub mod state;
pub mod table;

pub use config::{ConfigError, EngineConfig, Limits, OutputConfig};
pub use error::{ErrorCode, ErrorKind, FsmError};
pub use machine::{Invocation, Machine};
pub use matcher::{predicate, AsciiCaseInsensitive, ExactBytes, LiteralMatcher, Matcher, Predicate};
pub use output::{handler, Handler, OutputBuffer, OutputHandler};
pub use state::{State, StateGraph, StateId};
pub use table::{Entry, EntryId, EntryKind, Selection, TransitionTable};
