//! Bundled demo machines.
//!
//! Each demo builds its own [`StateGraph`] and [`Machine`] from the engine
//! configuration, the same way a host application would.

use bytefsm_core::matcher::{ascii_digit, ascii_lower, ascii_upper};
use bytefsm_core::{
    handler, predicate, EngineConfig, ErrorCode, FsmError, Handler, Machine, OutputBuffer, State,
    StateGraph, StateId,
};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write as _;

/// Header bytes used by the bit counter: two little-endian `u32` counters.
const BIT_COUNTER_HEADER: usize = 8;

/// Demo machines available from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoKind {
    /// Flips every bit and counts ones and zeros in the output header
    BitCounter,
    /// Accepts strictly alternating bit strings
    Alternator,
    /// Validates addresses at gmail.com or protonmail.com
    Email,
}

impl DemoKind {
    pub const ALL: [DemoKind; 3] = [DemoKind::BitCounter, DemoKind::Alternator, DemoKind::Email];

    pub fn name(&self) -> &'static str {
        match self {
            DemoKind::BitCounter => "bit-counter",
            DemoKind::Alternator => "alternator",
            DemoKind::Email => "email",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DemoKind::BitCounter => "flips every bit, counting ones and zeros",
            DemoKind::Alternator => "accepts strictly alternating bit strings",
            DemoKind::Email => "accepts <5+ alphanumerics>@gmail.com or @protonmail.com",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// Builds the demo's graph and machine.
    pub fn build(self, config: &EngineConfig) -> Result<Demo, FsmError> {
        let mut config = config.clone();
        if self == DemoKind::BitCounter {
            config.output.header_size = BIT_COUNTER_HEADER;
        }

        let mut graph = StateGraph::from_config(&config);
        let (name, initial) = match self {
            DemoKind::BitCounter => ("Bit Flipper", build_bit_counter(&mut graph)?),
            DemoKind::Alternator => ("bit flipper - alternator", build_alternator(&mut graph)?),
            DemoKind::Email => ("Email Validator", build_email(&mut graph)?),
        };

        let mut machine = Machine::new(name, &config)?;
        machine.try_set_initial_state(initial)?;

        Ok(Demo {
            kind: self,
            graph,
            machine,
        })
    }
}

/// Counts tallied by the bit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitStats {
    pub ones: u32,
    pub zeros: u32,
}

impl BitStats {
    fn read(header: &[u8]) -> Option<Self> {
        let ones = header.get(0..4)?.try_into().ok()?;
        let zeros = header.get(4..8)?.try_into().ok()?;
        Some(Self {
            ones: u32::from_le_bytes(ones),
            zeros: u32::from_le_bytes(zeros),
        })
    }
}

/// Outcome of running a demo over one input.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub demo: DemoKind,
    pub machine: String,
    pub input: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub accepted: bool,
    pub final_state: Option<String>,
    pub cursor: usize,
    pub output: String,
    pub output_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BitStats>,
}

/// A built demo, ready to run.
pub struct Demo {
    kind: DemoKind,
    graph: StateGraph,
    machine: Machine,
}

impl Demo {
    pub fn kind(&self) -> DemoKind {
        self.kind
    }

    pub fn describe(&self) -> String {
        self.machine.describe(&self.graph)
    }

    pub fn run(&mut self, input: &[u8]) -> RunReport {
        let result = self.machine.invoke(&self.graph, Some(input), None);
        let code = ErrorCode::of(&result);
        let output = self.machine.output();

        let final_state = self
            .machine
            .current_state()
            .and_then(|id| self.graph.get(id))
            .map(|s| s.name().to_string());

        let stats = match self.kind {
            DemoKind::BitCounter => BitStats::read(output.header()),
            _ => None,
        };

        let (accepted, error) = match &result {
            Ok(run) => (run.accepted, None),
            Err(e) => (false, Some(e.to_string())),
        };

        RunReport {
            demo: self.kind,
            machine: self.machine.name().to_string(),
            input: String::from_utf8_lossy(input).into_owned(),
            code,
            error,
            accepted,
            final_state,
            cursor: self.machine.cursor(),
            output: output.body_lossy().into_owned(),
            output_truncated: output.is_truncated(),
            stats,
        }
    }
}

fn flipped(bit: u8) -> char {
    if bit == b'1' {
        '0'
    } else {
        '1'
    }
}

fn bit_counter_handler() -> Handler {
    handler(|from: &State, to: &State, matched: &[u8], out: &mut OutputBuffer| {
        let Some(&bit) = matched.first() else {
            return;
        };

        let slot = if bit == b'1' { 0..4 } else { 4..8 };
        let header = out.header_mut();
        if let Some(word) = header.get_mut(slot) {
            let mut count = [0u8; 4];
            count.copy_from_slice(word);
            let count = u32::from_le_bytes(count).wrapping_add(1);
            word.copy_from_slice(&count.to_le_bytes());
        }

        let _ = writeln!(
            out,
            "{}-->{} | {}-->{} ",
            from.name(),
            bit as char,
            flipped(bit),
            to.name()
        );
    })
}

fn bitflip_handler() -> Handler {
    handler(|from: &State, to: &State, matched: &[u8], out: &mut OutputBuffer| {
        if let Some(&bit) = matched.first() {
            let _ = writeln!(
                out,
                "{} --> {}|{} --> {}",
                from.name(),
                bit as char,
                flipped(bit),
                to.name()
            );
        }
    })
}

fn build_bit_counter(graph: &mut StateGraph) -> Result<StateId, FsmError> {
    let s0 = graph.create_state("S0", true)?;
    let count = bit_counter_handler();
    graph.add_entry(s0, b"0", s0, Some(count.clone()))?;
    graph.add_entry(s0, b"1", s0, Some(count))?;
    Ok(s0)
}

fn build_alternator(graph: &mut StateGraph) -> Result<StateId, FsmError> {
    let q0 = graph.create_state("q0", false)?;
    let q1 = graph.create_state("q1", true)?;
    let q2 = graph.create_state("q2", true)?;
    let dead = graph.create_state("D", false)?;

    let flip = bitflip_handler();
    let edges = [
        (q0, b'1', q1),
        (q0, b'0', q2),
        (q1, b'1', dead),
        (q1, b'0', q2),
        (q2, b'1', q1),
        (q2, b'0', dead),
        (dead, b'0', dead),
        (dead, b'1', dead),
    ];
    for (from, bit, to) in edges {
        graph.add_entry(from, &[bit], to, Some(flip.clone()))?;
    }
    Ok(q0)
}

fn alphanumeric_entry(graph: &mut StateGraph, from: StateId, to: StateId) -> Result<(), FsmError> {
    let entry = graph.add_predicate_entry(from, to, None)?;
    graph.register_predicate(entry, predicate(ascii_digit))?;
    graph.register_predicate(entry, predicate(ascii_lower))?;
    graph.register_predicate(entry, predicate(ascii_upper))?;
    Ok(())
}

fn build_email(graph: &mut StateGraph) -> Result<StateId, FsmError> {
    let dead = graph.create_state("D", false)?;
    graph.add_wildcard_entry(dead, dead, None, None)?;

    let accept = graph.create_state("F", true)?;
    graph.add_wildcard_entry(accept, dead, None, None)?;

    let domain = graph.create_state("q6", false)?;
    graph.add_entry(domain, b"gmail.com", accept, None)?;
    graph.add_entry(domain, b"protonmail.com", accept, None)?;
    graph.add_wildcard_entry(domain, dead, None, None)?;

    let local = graph.create_state("q5", false)?;
    alphanumeric_entry(graph, local, local)?;
    graph.add_entry(local, b"@", domain, None)?;
    graph.add_wildcard_entry(local, dead, None, None)?;

    // Five leading alphanumerics are required before the open-ended run in q5.
    let mut next = local;
    for name in ["q4", "q3", "q2", "q1", "q0"] {
        let state = graph.create_state(name, false)?;
        alphanumeric_entry(graph, state, next)?;
        graph.add_wildcard_entry(state, dead, None, None)?;
        next = state;
    }
    Ok(next)
}
