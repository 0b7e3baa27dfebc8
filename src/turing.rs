//! This module defines the `TuringMachine` engine: a single-tape machine that
//! may be deterministic or nondeterministic. A run advances a whole set of
//! tape configurations at once ("generations"); competing rules for the same
//! `(state, symbol)` pair branch into distinct configurations, and a
//! configuration with no applicable rule simply stops propagating.

use crate::types::SimulatorError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The JSON-facing definition of a Turing machine.
///
/// Transition keys are `"state,symbol"` strings; each target is a
/// `[next_state, write_symbol, move_letter]` triple with the move letter one
/// of `L`, `R`, `S`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuringMachineDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub states: Vec<String>,
    pub alphabet: Vec<String>,
    pub tape_alphabet: Vec<String>,
    pub transitions: HashMap<String, Vec<(String, String, String)>>,
    pub initial_state: String,
    pub blank_symbol: String,
    pub final_states: Vec<String>,
}

/// Represents the possible head movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Stay,
}

impl Move {
    fn from_letter(letter: &str) -> Result<Self, SimulatorError> {
        match letter {
            "L" => Ok(Move::Left),
            "R" => Ok(Move::Right),
            "S" => Ok(Move::Stay),
            other => Err(SimulatorError::InvalidDefinition(format!(
                "Unknown move letter '{}', expected L, R or S",
                other
            ))),
        }
    }

    fn letter(&self) -> &'static str {
        match self {
            Move::Left => "L",
            Move::Right => "R",
            Move::Stay => "S",
        }
    }
}

/// One possible world of a nondeterministic run: the state, a tape snapshot
/// and the head index into it. The tape is conceptually infinite; the
/// snapshot is extended with blanks whenever the head walks past an edge, so
/// `head` may sit at `-1` or `tape.len()` between steps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TapeConfiguration {
    pub state: String,
    pub tape: Vec<String>,
    pub head: isize,
}

impl TapeConfiguration {
    /// The tape contents joined into a string, handy for assertions and
    /// display.
    pub fn tape_text(&self) -> String {
        self.tape.concat()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TmRule {
    next_state: String,
    write: String,
    movement: Move,
}

/// Represents a Turing machine mid-simulation.
///
/// `history` retains every generation (the full configuration set after each
/// step) for replay or step-back by the caller; generation 0 is the initial
/// singleton seeded by `reset`.
pub struct TuringMachine {
    states: BTreeSet<String>,
    input_alphabet: BTreeSet<String>,
    tape_alphabet: BTreeSet<String>,
    transitions: HashMap<(String, String), Vec<TmRule>>,
    initial_state: String,
    blank_symbol: String,
    final_states: BTreeSet<String>,
    deterministic: bool,
    active: BTreeSet<TapeConfiguration>,
    history: Vec<BTreeSet<TapeConfiguration>>,
}

impl TuringMachine {
    /// Builds an engine from a definition, validating the alphabet
    /// containment rules and every transition up front.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidDefinition` if the blank symbol is not
    /// in the tape alphabet, the input alphabet is not a subset of the tape
    /// alphabet, a state reference is unknown, or a transition key or move
    /// letter is malformed.
    pub fn new(definition: TuringMachineDefinition) -> Result<Self, SimulatorError> {
        let states: BTreeSet<String> = definition.states.into_iter().collect();
        let input_alphabet: BTreeSet<String> = definition.alphabet.into_iter().collect();
        let tape_alphabet: BTreeSet<String> = definition.tape_alphabet.into_iter().collect();
        let final_states: BTreeSet<String> = definition.final_states.into_iter().collect();

        if !states.contains(&definition.initial_state) {
            return Err(SimulatorError::InvalidDefinition(format!(
                "Initial state '{}' is not in the state set",
                definition.initial_state
            )));
        }
        for state in &final_states {
            if !states.contains(state) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Final state '{}' is not in the state set",
                    state
                )));
            }
        }
        if !tape_alphabet.contains(&definition.blank_symbol) {
            return Err(SimulatorError::InvalidDefinition(format!(
                "Blank symbol '{}' is not in the tape alphabet",
                definition.blank_symbol
            )));
        }
        if !input_alphabet.is_subset(&tape_alphabet) {
            return Err(SimulatorError::InvalidDefinition(
                "Input alphabet must be a subset of the tape alphabet".to_string(),
            ));
        }

        let mut transitions: HashMap<(String, String), Vec<TmRule>> = HashMap::new();
        for (key, targets) in definition.transitions {
            let parts: Vec<&str> = key.split(',').collect();
            if parts.len() != 2 {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Malformed transition key '{}', expected 'state,symbol'",
                    key
                )));
            }
            let state = parts[0].to_string();
            let symbol = parts[1].to_string();
            if !states.contains(&state) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Transition source '{}' is not in the state set",
                    state
                )));
            }
            if !tape_alphabet.contains(&symbol) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Transition read symbol '{}' is not in the tape alphabet",
                    symbol
                )));
            }

            let mut rules = Vec::new();
            for (next_state, write, move_letter) in targets {
                if !states.contains(&next_state) {
                    return Err(SimulatorError::InvalidDefinition(format!(
                        "Transition target '{}' is not in the state set",
                        next_state
                    )));
                }
                if !tape_alphabet.contains(&write) {
                    return Err(SimulatorError::InvalidDefinition(format!(
                        "Write symbol '{}' is not in the tape alphabet",
                        write
                    )));
                }
                rules.push(TmRule {
                    next_state,
                    write,
                    movement: Move::from_letter(&move_letter)?,
                });
            }
            transitions.insert((state, symbol), rules);
        }

        let deterministic = transitions.values().all(|rules| rules.len() <= 1);

        Ok(Self {
            states,
            input_alphabet,
            tape_alphabet,
            transitions,
            initial_state: definition.initial_state,
            blank_symbol: definition.blank_symbol,
            final_states,
            deterministic,
            active: BTreeSet::new(),
            history: Vec::new(),
        })
    }

    /// Seeds a fresh run: the tape holds `input` flanked by one blank of
    /// padding on each side (growth past the edges is dynamic), with the
    /// head on the first input cell. Generation 0 is the initial singleton.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidSymbol` if `input` contains a
    /// character outside the input alphabet.
    pub fn reset(&mut self, input: &str) -> Result<(), SimulatorError> {
        let mut tape = vec![self.blank_symbol.clone()];
        for ch in input.chars() {
            let symbol = ch.to_string();
            if !self.input_alphabet.contains(&symbol) {
                return Err(SimulatorError::InvalidSymbol(symbol));
            }
            tape.push(symbol);
        }
        tape.push(self.blank_symbol.clone());

        let head = if input.is_empty() { 0 } else { 1 };
        let initial = TapeConfiguration {
            state: self.initial_state.clone(),
            tape,
            head,
        };
        self.active = BTreeSet::from([initial]);
        self.history = vec![self.active.clone()];
        Ok(())
    }

    /// Extends a configuration's tape so the head lands on a real cell,
    /// returning the normalized tape and head index. The tape only ever
    /// grows.
    fn normalize(&self, config: &TapeConfiguration) -> (Vec<String>, usize) {
        let mut tape = config.tape.clone();
        let mut head = config.head;
        while head < 0 {
            tape.insert(0, self.blank_symbol.clone());
            head += 1;
        }
        let head = head as usize;
        while head >= tape.len() {
            tape.push(self.blank_symbol.clone());
        }
        (tape, head)
    }

    /// Advances every active configuration by one tape operation and appends
    /// the resulting generation (possibly empty) to the history.
    ///
    /// Returns whether any configuration advanced; `false` means every path
    /// has halted and the run is terminal.
    pub fn step(&mut self) -> bool {
        if self.active.is_empty() {
            return false;
        }

        let mut next = BTreeSet::new();
        let mut moved = false;

        for config in &self.active {
            let (tape, head) = self.normalize(config);
            let symbol = tape[head].clone();

            let Some(rules) = self.transitions.get(&(config.state.clone(), symbol)) else {
                // Implicit halt on this path.
                continue;
            };
            for rule in rules {
                let mut new_tape = tape.clone();
                new_tape[head] = rule.write.clone();
                let new_head = match rule.movement {
                    Move::Left => head as isize - 1,
                    Move::Right => head as isize + 1,
                    Move::Stay => head as isize,
                };
                next.insert(TapeConfiguration {
                    state: rule.next_state.clone(),
                    tape: new_tape,
                    head: new_head,
                });
                moved = true;
            }
        }

        self.active = next.clone();
        self.history.push(next);
        moved
    }

    /// Steps until acceptance, a total halt, or the generation budget runs
    /// out, and returns final acceptance. The budget is the caller's: the
    /// engine has no internal watchdog.
    pub fn run(&mut self, max_generations: usize) -> bool {
        for _ in 0..max_generations {
            if self.is_accepted() || !self.step() {
                break;
            }
        }
        self.is_accepted()
    }

    /// Whether any active configuration sits in a final state.
    pub fn is_accepted(&self) -> bool {
        self.active
            .iter()
            .any(|config| self.final_states.contains(&config.state))
    }

    /// Whether every path has halted (the active configuration set is empty).
    pub fn is_halted(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether the transition table has at most one target per
    /// `(state, symbol)` key. Informational only: stepping handles
    /// branching uniformly either way.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    pub fn active_configurations(&self) -> &BTreeSet<TapeConfiguration> {
        &self.active
    }

    /// Every generation since the last reset; generation 0 is the initial
    /// singleton.
    pub fn history(&self) -> &[BTreeSet<TapeConfiguration>] {
        &self.history
    }

    pub fn blank_symbol(&self) -> &str {
        &self.blank_symbol
    }

    /// Rebuilds the JSON-facing definition, e.g. for saving.
    pub fn to_definition(&self, name: Option<&str>) -> TuringMachineDefinition {
        let mut transitions: HashMap<String, Vec<(String, String, String)>> = HashMap::new();
        for ((state, symbol), rules) in &self.transitions {
            let key = format!("{},{}", state, symbol);
            let targets = rules
                .iter()
                .map(|rule| {
                    (
                        rule.next_state.clone(),
                        rule.write.clone(),
                        rule.movement.letter().to_string(),
                    )
                })
                .collect();
            transitions.insert(key, targets);
        }

        TuringMachineDefinition {
            name: name.map(|n| n.to_string()),
            kind: Some("TM".to_string()),
            states: self.states.iter().cloned().collect(),
            alphabet: self.input_alphabet.iter().cloned().collect(),
            tape_alphabet: self.tape_alphabet.iter().cloned().collect(),
            transitions,
            initial_state: self.initial_state.clone(),
            blank_symbol: self.blank_symbol.clone(),
            final_states: self.final_states.iter().cloned().collect(),
        }
    }
}
