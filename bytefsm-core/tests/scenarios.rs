//! End-to-end runs of small hand-built machines.

use bytefsm_core::matcher::{ascii_digit, ascii_lower, ascii_upper};
use bytefsm_core::{
    handler, predicate, EngineConfig, ErrorCode, FsmError, Handler, Machine, OutputBuffer,
    OutputConfig, State, StateGraph, StateId,
};
use std::fmt::Write as _;

fn bitflip_handler() -> Handler {
    handler(|from: &State, to: &State, matched: &[u8], out: &mut OutputBuffer| {
        let bit = matched[0] as char;
        let flipped = if bit == '1' { '0' } else { '1' };
        let _ = writeln!(out, "{} --> {}|{} --> {}", from.name(), bit, flipped, to.name());
    })
}

fn sink() -> OutputBuffer {
    OutputBuffer::from_config(&EngineConfig::default()).unwrap()
}

#[test]
fn bit_flip_emits_one_line_per_bit() {
    let config = EngineConfig::default();
    let mut graph = StateGraph::from_config(&config);
    let s0 = graph.create_state("S0", true).unwrap();
    graph.add_entry(s0, b"0", s0, Some(bitflip_handler())).unwrap();
    graph.add_entry(s0, b"1", s0, Some(bitflip_handler())).unwrap();

    let mut machine = Machine::new("Bit Flipper", &config).unwrap();
    assert!(machine.set_initial_state(s0));

    let run = machine.invoke(&graph, Some(b"000"), None).unwrap();
    assert!(run.accepted);
    assert_eq!(run.consumed, 3);

    let text = machine.output().body_lossy();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().all(|line| line == "S0 --> 0|1 --> S0"));
}

fn alternator() -> (StateGraph, Machine) {
    let config = EngineConfig::default();
    let mut graph = StateGraph::from_config(&config);
    let q0 = graph.create_state("q0", false).unwrap();
    let q1 = graph.create_state("q1", true).unwrap();
    let q2 = graph.create_state("q2", true).unwrap();
    let dead = graph.create_state("D", false).unwrap();

    let edges: [(StateId, &[u8], StateId); 8] = [
        (q0, b"1", q1),
        (q0, b"0", q2),
        (q1, b"1", dead),
        (q1, b"0", q2),
        (q2, b"1", q1),
        (q2, b"0", dead),
        (dead, b"0", dead),
        (dead, b"1", dead),
    ];
    for (from, key, to) in edges {
        graph.add_entry(from, key, to, Some(bitflip_handler())).unwrap();
    }

    let mut machine = Machine::new("bit flipper - alternator", &config).unwrap();
    machine.set_initial_state(q0);
    (graph, machine)
}

#[test]
fn alternator_accepts_alternating_bits() {
    let (graph, mut machine) = alternator();
    let run = machine.invoke(&graph, Some(b"0101010101"), None).unwrap();
    assert!(run.accepted);
    assert_eq!(run.final_state_name, "q1");
    assert_eq!(run.steps, 10);
}

#[test]
fn alternator_diverts_repeated_bit_to_dead_state() {
    let (graph, mut machine) = alternator();
    let run = machine.invoke(&graph, Some(b"0011"), None).unwrap();
    assert!(!run.accepted);
    assert_eq!(run.final_state_name, "D");

    let lines: Vec<_> = machine
        .output()
        .body_lossy()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines[1], "q2 --> 0|1 --> D");
}

fn alphanumeric_entry(graph: &mut StateGraph, from: StateId, to: StateId) {
    let entry = graph.add_predicate_entry(from, to, None).unwrap();
    graph.register_predicate(entry, predicate(ascii_digit)).unwrap();
    graph.register_predicate(entry, predicate(ascii_lower)).unwrap();
    graph.register_predicate(entry, predicate(ascii_upper)).unwrap();
}

fn email_validator() -> (StateGraph, Machine) {
    let config = EngineConfig::default();
    let mut graph = StateGraph::from_config(&config);

    let dead = graph.create_state("D", false).unwrap();
    graph.add_wildcard_entry(dead, dead, None, None).unwrap();

    let accept = graph.create_state("F", true).unwrap();
    graph.add_wildcard_entry(accept, dead, None, None).unwrap();

    let domain = graph.create_state("q6", false).unwrap();
    graph.add_entry(domain, b"gmail.com", accept, None).unwrap();
    graph.add_entry(domain, b"protonmail.com", accept, None).unwrap();
    graph.add_wildcard_entry(domain, dead, None, None).unwrap();

    let local = graph.create_state("q5", false).unwrap();
    alphanumeric_entry(&mut graph, local, local);
    graph.add_entry(local, b"@", domain, None).unwrap();
    graph.add_wildcard_entry(local, dead, None, None).unwrap();

    // q0..q4 require at least five local-part characters before '@'.
    let mut next = local;
    for name in ["q4", "q3", "q2", "q1", "q0"] {
        let state = graph.create_state(name, false).unwrap();
        alphanumeric_entry(&mut graph, state, next);
        graph.add_wildcard_entry(state, dead, None, None).unwrap();
        next = state;
    }

    let mut machine = Machine::new("Email Validator", &config).unwrap();
    machine.set_initial_state(next);
    (graph, machine)
}

#[test]
fn email_validator_accepts_known_domains() {
    let (graph, mut machine) = email_validator();
    for input in [&b"email@gmail.com"[..], &b"Email42@protonmail.com"[..]] {
        let run = machine.invoke(&graph, Some(input), None).unwrap();
        assert!(run.accepted, "{}", String::from_utf8_lossy(input));
        assert_eq!(run.final_state_name, "F");
    }
}

#[test]
fn email_validator_rejects_unknown_domain() {
    let (graph, mut machine) = email_validator();
    let run = machine.invoke(&graph, Some(b"email@yahoo.com"), None).unwrap();
    assert!(!run.accepted);
    assert_eq!(run.final_state_name, "D");
}

#[test]
fn email_validator_rejects_short_local_part_and_trailing_bytes() {
    let (graph, mut machine) = email_validator();
    for input in [
        &b"ab@gmail.com"[..],
        &b"email@gmail.com.au"[..],
        &b"em.ail@gmail.com"[..],
    ] {
        let run = machine.invoke(&graph, Some(input), None).unwrap();
        assert!(!run.accepted, "{}", String::from_utf8_lossy(input));
    }
}

#[test]
fn missing_entry_is_a_failed_transition() {
    let config = EngineConfig::default();
    let mut graph = StateGraph::from_config(&config);
    let s0 = graph.create_state("S0", true).unwrap();
    graph.add_entry(s0, b"0", s0, None).unwrap();

    let mut machine = Machine::new("partial", &config).unwrap();
    machine.set_initial_state(s0);

    let result = machine.invoke(&graph, Some(b"0x0"), None);
    assert_eq!(ErrorCode::of(&result), ErrorCode::FailedTransition);
    match result {
        Err(FsmError::FailedTransition { state, cursor }) => {
            assert_eq!(state, "S0");
            assert_eq!(cursor, 1);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn first_registered_entry_wins() {
    let config = EngineConfig::default();
    let mut graph = StateGraph::from_config(&config);
    let start = graph.create_state("start", false).unwrap();
    let first = graph.create_state("first", true).unwrap();
    let second = graph.create_state("second", false).unwrap();

    let tag = |label: &'static str| {
        handler(move |_: &State, _: &State, _: &[u8], out: &mut OutputBuffer| {
            out.write(label.as_bytes());
        })
    };
    graph.add_entry(start, b"a", first, Some(tag("first"))).unwrap();
    graph.add_wildcard_entry(start, second, Some(tag("second")), None).unwrap();

    let mut machine = Machine::new("order", &config).unwrap();
    machine.set_initial_state(start);

    let run = machine.invoke(&graph, Some(b"a"), None).unwrap();
    assert!(run.accepted);
    assert_eq!(machine.output().body(), b"first");
}

#[test]
fn independent_sinks_see_identical_output() {
    let (graph, mut machine) = alternator();
    let mut a = sink();
    let mut b = sink();

    let run_a = machine.invoke(&graph, Some(b"010011"), Some(&mut a)).unwrap();
    let run_b = machine.invoke(&graph, Some(b"010011"), Some(&mut b)).unwrap();

    assert_eq!(run_a, run_b);
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn header_region_carries_binary_counters() {
    let mut config = EngineConfig::default();
    config.output = OutputConfig::default()
        .with_header_size(8)
        .with_auto_terminate(true);

    let count = handler(|_: &State, _: &State, matched: &[u8], out: &mut OutputBuffer| {
        let slot = if matched[0] == b'1' { 0..4 } else { 4..8 };
        let header = out.header_mut();
        let mut word = [0u8; 4];
        word.copy_from_slice(&header[slot.clone()]);
        let n = u32::from_le_bytes(word) + 1;
        header[slot].copy_from_slice(&n.to_le_bytes());
        out.write(matched);
    });

    let mut graph = StateGraph::from_config(&config);
    let s0 = graph.create_state("S0", true).unwrap();
    graph.add_entry(s0, b"0", s0, Some(count.clone())).unwrap();
    graph.add_entry(s0, b"1", s0, Some(count)).unwrap();

    let mut machine = Machine::new("Bit Counter", &config).unwrap();
    machine.set_initial_state(s0);
    machine.invoke(&graph, Some(b"0110111"), None).unwrap();

    let out = machine.output();
    assert_eq!(&out.header()[..4], &5u32.to_le_bytes());
    assert_eq!(&out.header()[4..], &2u32.to_le_bytes());
    assert_eq!(out.body(), b"0110111");
    assert_eq!(out.terminated().unwrap().last(), Some(&0));
}
