//! This module defines the `FiniteAutomaton` engine, which simulates
//! deterministic and nondeterministic finite automata over an explicit
//! transition table. Nondeterminism is handled uniformly by tracking the full
//! set of active states at every step.

use crate::types::SimulatorError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The JSON-facing definition of a finite automaton.
///
/// `transitions` maps a source state to a map from input symbol to the list
/// of destination states; a missing entry means the transition is undefined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FiniteAutomatonDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub states: Vec<String>,
    pub alphabet: Vec<String>,
    pub transitions: HashMap<String, HashMap<String, Vec<String>>>,
    pub initial_state: String,
    pub final_states: Vec<String>,
}

/// Record of one input step: the symbol consumed, the active-state snapshots
/// before and after, and the individual transitions fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiniteStep {
    pub input: String,
    pub from_states: BTreeSet<String>,
    pub to_states: BTreeSet<String>,
    /// Fired transitions as `(from, symbol, to)` triples.
    pub transitions: Vec<(String, String, String)>,
}

/// Represents a finite automaton mid-simulation.
///
/// The engine holds the validated definition, the current set of active
/// states and an append-only history of step records. The active set starts
/// as the singleton initial state and is replaced wholesale by each step;
/// an empty active set means every path has died, and further steps simply
/// produce empty sets.
pub struct FiniteAutomaton {
    states: BTreeSet<String>,
    alphabet: BTreeSet<String>,
    transitions: HashMap<(String, String), BTreeSet<String>>,
    initial_state: String,
    final_states: BTreeSet<String>,
    active_states: BTreeSet<String>,
    history: Vec<FiniteStep>,
}

impl FiniteAutomaton {
    /// Builds an engine from a definition, validating every structural
    /// invariant up front.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidDefinition` if the initial state or a
    /// final state is not in the state set, or a transition references an
    /// unknown state or symbol.
    pub fn new(definition: FiniteAutomatonDefinition) -> Result<Self, SimulatorError> {
        let states: BTreeSet<String> = definition.states.into_iter().collect();
        let alphabet: BTreeSet<String> = definition.alphabet.into_iter().collect();
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

        let mut transitions: HashMap<(String, String), BTreeSet<String>> = HashMap::new();
        for (from, by_symbol) in definition.transitions {
            if !states.contains(&from) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Transition source '{}' is not in the state set",
                    from
                )));
            }
            for (symbol, targets) in by_symbol {
                if !alphabet.contains(&symbol) {
                    return Err(SimulatorError::InvalidDefinition(format!(
                        "Transition symbol '{}' is not in the alphabet",
                        symbol
                    )));
                }
                let entry = transitions
                    .entry((from.clone(), symbol))
                    .or_default();
                for target in targets {
                    if !states.contains(&target) {
                        return Err(SimulatorError::InvalidDefinition(format!(
                            "Transition target '{}' is not in the state set",
                            target
                        )));
                    }
                    entry.insert(target);
                }
            }
        }

        let mut active_states = BTreeSet::new();
        active_states.insert(definition.initial_state.clone());

        Ok(Self {
            states,
            alphabet,
            transitions,
            initial_state: definition.initial_state,
            final_states,
            active_states,
            history: Vec::new(),
        })
    }

    /// Resets the active set to the singleton initial state and clears the
    /// step history.
    pub fn reset(&mut self) {
        self.active_states.clear();
        self.active_states.insert(self.initial_state.clone());
        self.history.clear();
    }

    /// Consumes one input symbol: the new active set is the union of the
    /// transition targets of every currently active state. States with no
    /// rule for the symbol simply contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidSymbol` if the symbol is not in the
    /// alphabet; the engine state is left untouched.
    pub fn step(&mut self, symbol: &str) -> Result<FiniteStep, SimulatorError> {
        if !self.alphabet.contains(symbol) {
            return Err(SimulatorError::InvalidSymbol(symbol.to_string()));
        }

        let (to_states, fired) = self.advance(&self.active_states, symbol);
        let record = FiniteStep {
            input: symbol.to_string(),
            from_states: self.active_states.clone(),
            to_states: to_states.clone(),
            transitions: fired,
        };
        self.history.push(record.clone());
        self.active_states = to_states;

        Ok(record)
    }

    /// Pure step function: computes the successor set and the fired
    /// transitions without touching the engine state.
    fn advance(
        &self,
        from: &BTreeSet<String>,
        symbol: &str,
    ) -> (BTreeSet<String>, Vec<(String, String, String)>) {
        let mut to_states = BTreeSet::new();
        let mut fired = Vec::new();

        for state in from {
            if let Some(targets) = self.transitions.get(&(state.clone(), symbol.to_string())) {
                for target in targets {
                    to_states.insert(target.clone());
                    fired.push((state.clone(), symbol.to_string(), target.clone()));
                }
            }
        }

        (to_states, fired)
    }

    /// Whether any active state is a final state.
    pub fn is_accepted(&self) -> bool {
        self.active_states
            .iter()
            .any(|state| self.final_states.contains(state))
    }

    /// Resets the engine and steps through every character of `input` in
    /// order. Steps continue even after the active set empties; subsequent
    /// steps just produce empty sets.
    pub fn simulate(&mut self, input: &str) -> Result<bool, SimulatorError> {
        self.reset();
        for ch in input.chars() {
            self.step(&ch.to_string())?;
        }
        Ok(self.is_accepted())
    }

    /// The current set of active states.
    pub fn active_states(&self) -> &BTreeSet<String> {
        &self.active_states
    }

    /// The ordered step records accumulated since the last reset.
    pub fn history(&self) -> &[FiniteStep] {
        &self.history
    }

    /// The input consumed so far, reassembled from the step records.
    pub fn consumed_input(&self) -> String {
        self.history.iter().map(|step| step.input.as_str()).collect()
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn final_states(&self) -> &BTreeSet<String> {
        &self.final_states
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// Rebuilds the JSON-facing definition, e.g. for saving. The optional
    /// `name` and the `type` tag are filled in.
    pub fn to_definition(&self, name: Option<&str>) -> FiniteAutomatonDefinition {
        let mut transitions: HashMap<String, HashMap<String, Vec<String>>> = HashMap::new();
        for ((from, symbol), targets) in &self.transitions {
            transitions
                .entry(from.clone())
                .or_default()
                .insert(symbol.clone(), targets.iter().cloned().collect());
        }

        FiniteAutomatonDefinition {
            name: name.map(|n| n.to_string()),
            kind: Some("FA".to_string()),
            states: self.states.iter().cloned().collect(),
            alphabet: self.alphabet.iter().cloned().collect(),
            transitions,
            initial_state: self.initial_state.clone(),
            final_states: self.final_states.iter().cloned().collect(),
        }
    }
}
