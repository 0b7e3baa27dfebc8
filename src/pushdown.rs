//! This module defines the `PushdownAutomaton` engine. A pushdown automaton
//! run is a set of `(state, stack)` configurations advanced in lockstep:
//! consuming an input symbol maps every configuration through the applicable
//! rules, and epsilon-closure rounds are applied to a fixed point before and
//! after each consumed symbol.

use crate::types::{decode_epsilon, encode_epsilon, SimulatorError, MAX_CLOSURE_ROUNDS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The JSON-facing definition of a pushdown automaton.
///
/// Transition keys are `"state,input,stack_top"` strings; the epsilon marker
/// `ε` stands for a non-consuming input and/or a no-pop stack condition.
/// Each target is a `[next_state, [push_symbols...]]` pair where the push
/// list reads top-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushdownAutomatonDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub states: Vec<String>,
    pub input_alphabet: Vec<String>,
    pub stack_alphabet: Vec<String>,
    pub transitions: HashMap<String, Vec<(String, Vec<String>)>>,
    pub initial_state: String,
    pub initial_stack_symbol: String,
    pub final_states: Vec<String>,
}

/// One possible world of a nondeterministic run: a state plus the full stack
/// snapshot. The stack top is the last element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdaConfiguration {
    pub state: String,
    pub stack: Vec<String>,
}

impl PdaConfiguration {
    /// The stack top, or the empty (epsilon) token when the stack is empty.
    pub fn stack_top(&self) -> &str {
        self.stack.last().map(String::as_str).unwrap_or("")
    }
}

/// Record of one fired transition, with the stack snapshots around it.
/// Epsilon is the empty string in `input_symbol` and `stack_pop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaTransitionRecord {
    pub from_state: String,
    pub input_symbol: String,
    pub stack_pop: String,
    pub to_state: String,
    pub pushed: Vec<String>,
    pub from_stack: Vec<String>,
    pub to_stack: Vec<String>,
}

/// Record of one logical step: either a consumed input symbol or an
/// epsilon-closure round (`input == None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaStep {
    pub input: Option<String>,
    pub before: BTreeSet<PdaConfiguration>,
    pub after: BTreeSet<PdaConfiguration>,
    pub transitions: Vec<PdaTransitionRecord>,
    pub accepted: bool,
}

/// Internal transition key: `(state, input-or-epsilon, stack-top-or-epsilon)`
/// with epsilon as the empty string.
type RuleKey = (String, String, String);

/// Represents a pushdown automaton mid-simulation.
///
/// Acceptance is by final state alone, regardless of stack contents; callers
/// wanting empty-stack acceptance can inspect `stacks()` themselves.
pub struct PushdownAutomaton {
    states: BTreeSet<String>,
    input_alphabet: BTreeSet<String>,
    stack_alphabet: BTreeSet<String>,
    transitions: HashMap<RuleKey, Vec<(String, Vec<String>)>>,
    initial_state: String,
    initial_stack_symbol: String,
    final_states: BTreeSet<String>,
    active: BTreeSet<PdaConfiguration>,
    history: Vec<PdaStep>,
}

impl PushdownAutomaton {
    /// Builds an engine from a definition, decoding epsilon markers and
    /// validating every rule against the declared alphabets.
    ///
    /// The initial epsilon closure is applied immediately and recorded as the
    /// first history entry, marking the starting configuration set.
    pub fn new(definition: PushdownAutomatonDefinition) -> Result<Self, SimulatorError> {
        let states: BTreeSet<String> = definition.states.into_iter().collect();
        let input_alphabet: BTreeSet<String> = definition.input_alphabet.into_iter().collect();
        let stack_alphabet: BTreeSet<String> = definition.stack_alphabet.into_iter().collect();
        let final_states: BTreeSet<String> = definition.final_states.into_iter().collect();

        if !states.contains(&definition.initial_state) {
            return Err(SimulatorError::InvalidDefinition(format!(
                "Initial state '{}' is not in the state set",
                definition.initial_state
            )));
        }
        if !definition.initial_stack_symbol.is_empty()
            && !stack_alphabet.contains(&definition.initial_stack_symbol)
        {
            return Err(SimulatorError::InvalidDefinition(format!(
                "Initial stack symbol '{}' is not in the stack alphabet",
                definition.initial_stack_symbol
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

        let mut transitions: HashMap<RuleKey, Vec<(String, Vec<String>)>> = HashMap::new();
        for (key, targets) in definition.transitions {
            let parts: Vec<&str> = key.split(',').collect();
            if parts.len() != 3 {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Malformed transition key '{}', expected 'state,input,stack_top'",
                    key
                )));
            }
            let state = parts[0].to_string();
            let input = decode_epsilon(parts[1]);
            let stack_top = decode_epsilon(parts[2]);

            if !states.contains(&state) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Transition source '{}' is not in the state set",
                    state
                )));
            }
            if !input.is_empty() && !input_alphabet.contains(&input) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Transition input '{}' is not in the input alphabet",
                    input
                )));
            }
            if !stack_top.is_empty() && !stack_alphabet.contains(&stack_top) {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Transition stack top '{}' is not in the stack alphabet",
                    stack_top
                )));
            }

            let mut decoded_targets = Vec::new();
            for (next_state, push_raw) in targets {
                if !states.contains(&next_state) {
                    return Err(SimulatorError::InvalidDefinition(format!(
                        "Transition target '{}' is not in the state set",
                        next_state
                    )));
                }
                let push: Vec<String> = push_raw.iter().map(|s| decode_epsilon(s)).collect();
                for symbol in &push {
                    if !symbol.is_empty() && !stack_alphabet.contains(symbol) {
                        return Err(SimulatorError::InvalidDefinition(format!(
                            "Push symbol '{}' is not in the stack alphabet",
                            symbol
                        )));
                    }
                }
                decoded_targets.push((next_state, push));
            }
            transitions.insert((state, input, stack_top), decoded_targets);
        }

        let mut automaton = Self {
            states,
            input_alphabet,
            stack_alphabet,
            transitions,
            initial_state: definition.initial_state,
            initial_stack_symbol: definition.initial_stack_symbol,
            final_states,
            active: BTreeSet::new(),
            history: Vec::new(),
        };
        automaton.reset();
        Ok(automaton)
    }

    /// Resets the run to the initial configuration and applies the initial
    /// epsilon closure, recording it as the first history entry.
    pub fn reset(&mut self) {
        let mut stack = Vec::new();
        if !self.initial_stack_symbol.is_empty() {
            stack.push(self.initial_stack_symbol.clone());
        }
        self.active = BTreeSet::from([PdaConfiguration {
            state: self.initial_state.clone(),
            stack,
        }]);
        self.history.clear();
        self.close_epsilon(true);
    }

    /// Collects the rules applicable to `config` for the given input symbol
    /// (`None` for a pure epsilon round). A rule keyed on epsilon for the
    /// stack top applies regardless of the literal top, so both the exact and
    /// the epsilon stack keys are gathered. Epsilon-input rules fire only in
    /// closure rounds, never while a symbol is being consumed.
    ///
    /// Returns `(input_key, pop_key, next_state, push)` tuples; the pop match
    /// itself is checked at application time.
    fn candidates(
        &self,
        config: &PdaConfiguration,
        input: Option<&str>,
    ) -> Vec<(String, String, String, Vec<String>)> {
        let input_keys: Vec<&str> = vec![input.unwrap_or("")];

        let top = config.stack_top();
        let mut stack_keys: Vec<&str> = Vec::new();
        if !top.is_empty() {
            stack_keys.push(top);
        }
        stack_keys.push("");

        let mut found = Vec::new();
        for input_key in &input_keys {
            for stack_key in &stack_keys {
                let key = (
                    config.state.clone(),
                    input_key.to_string(),
                    stack_key.to_string(),
                );
                if let Some(targets) = self.transitions.get(&key) {
                    for (next_state, push) in targets {
                        found.push((
                            input_key.to_string(),
                            stack_key.to_string(),
                            next_state.clone(),
                            push.clone(),
                        ));
                    }
                }
            }
        }
        found
    }

    /// Applies a rule's stack effect to `config`: pop the rule's pop symbol
    /// (nothing for epsilon), then push the push sequence right-to-left so
    /// its first symbol ends on top. Returns `None` when the rule requires a
    /// pop the stack cannot satisfy; such moves are discarded, not errors.
    fn apply_stack_effect(
        config: &PdaConfiguration,
        pop: &str,
        push: &[String],
    ) -> Option<Vec<String>> {
        let mut stack = config.stack.clone();
        if !pop.is_empty() {
            if stack.last().map(String::as_str) != Some(pop) {
                return None;
            }
            stack.pop();
        }
        for symbol in push.iter().rev() {
            if !symbol.is_empty() {
                stack.push(symbol.clone());
            }
        }
        Some(stack)
    }

    /// Pure step function: maps every configuration in `from` through the
    /// applicable rules and returns the deduplicated successor set with the
    /// fired transitions. Used uniformly for real-symbol steps
    /// (`input == Some(..)`) and epsilon rounds (`input == None`).
    fn advance(
        &self,
        from: &BTreeSet<PdaConfiguration>,
        input: Option<&str>,
    ) -> (BTreeSet<PdaConfiguration>, Vec<PdaTransitionRecord>) {
        let mut successors = BTreeSet::new();
        let mut fired = Vec::new();

        for config in from {
            for (input_key, pop_key, next_state, push) in self.candidates(config, input) {
                let Some(new_stack) = Self::apply_stack_effect(config, &pop_key, &push) else {
                    continue;
                };
                let successor = PdaConfiguration {
                    state: next_state.clone(),
                    stack: new_stack.clone(),
                };
                if successors.insert(successor) {
                    fired.push(PdaTransitionRecord {
                        from_state: config.state.clone(),
                        input_symbol: input_key,
                        stack_pop: pop_key,
                        to_state: next_state,
                        pushed: push,
                        from_stack: config.stack.clone(),
                        to_stack: new_stack,
                    });
                }
            }
        }

        (successors, fired)
    }

    /// Applies epsilon-only moves to a fixed point: rounds continue until no
    /// configuration outside the closed set is produced. The round is
    /// recorded in history only when it changed the set, or when marking the
    /// initial configuration.
    fn close_epsilon(&mut self, initial: bool) {
        let before = self.active.clone();
        let mut closed = self.active.clone();
        let mut fired = Vec::new();

        for _ in 0..MAX_CLOSURE_ROUNDS {
            let (reached, records) = self.advance(&closed, None);
            let fresh: Vec<PdaTransitionRecord> = records
                .into_iter()
                .filter(|record| {
                    !closed.contains(&PdaConfiguration {
                        state: record.to_state.clone(),
                        stack: record.to_stack.clone(),
                    })
                })
                .collect();

            let size_before = closed.len();
            closed.extend(reached);
            if closed.len() == size_before {
                break;
            }
            fired.extend(fresh);
        }

        self.active = closed.clone();
        if initial || closed != before {
            let accepted = self.is_accepted();
            self.history.push(PdaStep {
                input: None,
                before,
                after: closed,
                transitions: fired,
                accepted,
            });
        }
    }

    /// Processes one input symbol: consumes it across every active
    /// configuration, records the step, then applies the trailing epsilon
    /// closure. Returns whether any configuration survived.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidSymbol` if the symbol is not in the
    /// input alphabet; the engine state is left untouched.
    pub fn step(&mut self, symbol: &str) -> Result<bool, SimulatorError> {
        if !self.input_alphabet.contains(symbol) {
            return Err(SimulatorError::InvalidSymbol(symbol.to_string()));
        }

        let (successors, fired) = self.advance(&self.active, Some(symbol));
        let before = std::mem::replace(&mut self.active, successors);
        let accepted = self.is_accepted();
        self.history.push(PdaStep {
            input: Some(symbol.to_string()),
            before,
            after: self.active.clone(),
            transitions: fired,
            accepted,
        });

        if self.active.is_empty() {
            return Ok(false);
        }
        self.close_epsilon(false);
        Ok(!self.active.is_empty())
    }

    /// Resets the run and interleaves closure and consumption for each
    /// character of `input`, stopping early once the configuration set
    /// empties. Returns final acceptance.
    pub fn simulate(&mut self, input: &str) -> Result<bool, SimulatorError> {
        self.reset();
        for ch in input.chars() {
            if !self.step(&ch.to_string())? {
                return Ok(false);
            }
        }
        Ok(self.is_accepted())
    }

    /// Whether any active configuration sits in a final state. Stack
    /// contents are ignored: this engine accepts by final state only.
    pub fn is_accepted(&self) -> bool {
        self.active
            .iter()
            .any(|config| self.final_states.contains(&config.state))
    }

    pub fn active_configurations(&self) -> &BTreeSet<PdaConfiguration> {
        &self.active
    }

    /// The distinct states across the active configurations.
    pub fn current_states(&self) -> BTreeSet<String> {
        self.active
            .iter()
            .map(|config| config.state.clone())
            .collect()
    }

    /// The stacks of the active configurations, one per possible world.
    /// Exposed so callers can layer empty-stack acceptance on top of the
    /// final-state default.
    pub fn stacks(&self) -> Vec<Vec<String>> {
        self.active.iter().map(|c| c.stack.clone()).collect()
    }

    pub fn history(&self) -> &[PdaStep] {
        &self.history
    }

    /// The input consumed so far, reassembled from the step records
    /// (closure rounds contribute nothing).
    pub fn consumed_input(&self) -> String {
        self.history
            .iter()
            .filter_map(|step| step.input.as_deref())
            .collect()
    }

    pub fn last_step(&self) -> Option<&PdaStep> {
        self.history.last()
    }

    /// Rebuilds the JSON-facing definition with epsilon markers restored.
    pub fn to_definition(&self, name: Option<&str>) -> PushdownAutomatonDefinition {
        let mut transitions: HashMap<String, Vec<(String, Vec<String>)>> = HashMap::new();
        for ((state, input, stack_top), targets) in &self.transitions {
            let key = format!(
                "{},{},{}",
                state,
                encode_epsilon(input),
                encode_epsilon(stack_top)
            );
            let encoded: Vec<(String, Vec<String>)> = targets
                .iter()
                .map(|(next_state, push)| {
                    (
                        next_state.clone(),
                        push.iter().map(|s| encode_epsilon(s)).collect(),
                    )
                })
                .collect();
            transitions.insert(key, encoded);
        }

        PushdownAutomatonDefinition {
            name: name.map(|n| n.to_string()),
            kind: Some("PDA".to_string()),
            states: self.states.iter().cloned().collect(),
            input_alphabet: self.input_alphabet.iter().cloned().collect(),
            stack_alphabet: self.stack_alphabet.iter().cloned().collect(),
            transitions,
            initial_state: self.initial_state.clone(),
            initial_stack_symbol: self.initial_stack_symbol.clone(),
            final_states: self.final_states.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// PDA for { aⁿbⁿ | n ≥ 1 }: push A per 'a' in q0, pop an A per 'b' in
    /// q1, and epsilon-move to the accepting q2 once only the bottom marker
    /// Z remains. Acceptance is by final state, so the Z-guarded epsilon
    /// move is what enforces the "all A's popped" condition.
    fn anbn_definition() -> PushdownAutomatonDefinition {
        let mut transitions: HashMap<String, Vec<(String, Vec<String>)>> = HashMap::new();
        transitions.insert(
            "q0,a,Z".to_string(),
            vec![("q0".to_string(), vec!["A".to_string(), "Z".to_string()])],
        );
        transitions.insert(
            "q0,a,A".to_string(),
            vec![("q0".to_string(), vec!["A".to_string(), "A".to_string()])],
        );
        transitions.insert(
            "q0,b,A".to_string(),
            vec![("q1".to_string(), vec!["ε".to_string()])],
        );
        transitions.insert(
            "q1,b,A".to_string(),
            vec![("q1".to_string(), vec!["ε".to_string()])],
        );
        transitions.insert(
            "q1,ε,Z".to_string(),
            vec![("q2".to_string(), vec!["Z".to_string()])],
        );

        PushdownAutomatonDefinition {
            name: None,
            kind: None,
            states: vec!["q0".to_string(), "q1".to_string(), "q2".to_string()],
            input_alphabet: vec!["a".to_string(), "b".to_string()],
            stack_alphabet: vec!["Z".to_string(), "A".to_string()],
            transitions,
            initial_state: "q0".to_string(),
            initial_stack_symbol: "Z".to_string(),
            final_states: vec!["q2".to_string()],
        }
    }

    #[test]
    fn test_anbn_acceptance() {
        let mut pda = PushdownAutomaton::new(anbn_definition()).unwrap();
        assert!(pda.simulate("aabb").unwrap());
        assert!(pda.simulate("ab").unwrap());
        assert!(!pda.simulate("aab").unwrap());
        assert!(!pda.simulate("abb").unwrap());
        // Empty input: q0 is not final, so reject.
        assert!(!pda.simulate("").unwrap());
    }

    #[test]
    fn test_stack_discipline() {
        let mut pda = PushdownAutomaton::new(anbn_definition()).unwrap();
        pda.simulate("aabb").unwrap();
        // All A's popped; both surviving worlds sit on the bare bottom marker.
        assert_eq!(pda.stacks(), vec![vec!["Z".to_string()], vec!["Z".to_string()]]);
        assert_eq!(
            pda.current_states(),
            BTreeSet::from(["q1".to_string(), "q2".to_string()])
        );
        assert_eq!(pda.consumed_input(), "aabb");
    }

    #[test]
    fn test_push_order_first_symbol_on_top() {
        // q0,a,Z pushes ["A", "Z"]: Z goes deepest, A ends on top.
        let mut pda = PushdownAutomaton::new(anbn_definition()).unwrap();
        pda.step("a").unwrap();
        let stacks = pda.stacks();
        assert_eq!(stacks, vec![vec!["Z".to_string(), "A".to_string()]]);
    }

    #[test]
    fn test_invalid_symbol_is_local() {
        let mut pda = PushdownAutomaton::new(anbn_definition()).unwrap();
        pda.step("a").unwrap();
        let before = pda.active_configurations().clone();
        assert_eq!(
            pda.step("x"),
            Err(SimulatorError::InvalidSymbol("x".to_string()))
        );
        assert_eq!(pda.active_configurations(), &before);
        // Retry with a valid symbol still works.
        assert!(pda.step("b").unwrap());
    }

    #[test]
    fn test_epsilon_closure_idempotent() {
        // q0 --ε,Z/Z--> q1 --ε,Z/Z--> q2; closure from the start must reach
        // all three states and applying it again must change nothing.
        let mut transitions: HashMap<String, Vec<(String, Vec<String>)>> = HashMap::new();
        transitions.insert(
            "q0,ε,Z".to_string(),
            vec![("q1".to_string(), vec!["Z".to_string()])],
        );
        transitions.insert(
            "q1,ε,Z".to_string(),
            vec![("q2".to_string(), vec!["Z".to_string()])],
        );
        let definition = PushdownAutomatonDefinition {
            name: None,
            kind: None,
            states: vec!["q0".to_string(), "q1".to_string(), "q2".to_string()],
            input_alphabet: vec!["a".to_string()],
            stack_alphabet: vec!["Z".to_string()],
            transitions,
            initial_state: "q0".to_string(),
            initial_stack_symbol: "Z".to_string(),
            final_states: vec!["q2".to_string()],
        };

        let mut pda = PushdownAutomaton::new(definition).unwrap();
        assert_eq!(pda.current_states().len(), 3);
        assert!(pda.is_accepted());

        let after_once = pda.active_configurations().clone();
        pda.close_epsilon(false);
        assert_eq!(pda.active_configurations(), &after_once);
        // The no-op closure round is not recorded.
        assert_eq!(pda.history().len(), 1);
    }

    #[test]
    fn test_initial_closure_recorded() {
        let pda = PushdownAutomaton::new(anbn_definition()).unwrap();
        // No epsilon rules here, but the initial marking entry must exist.
        assert_eq!(pda.history().len(), 1);
        let step = &pda.history()[0];
        assert_eq!(step.input, None);
        assert_eq!(step.before, step.after);
    }

    #[test]
    fn test_nondeterministic_branching() {
        // Two rules on the same key produce two distinct configurations.
        let mut transitions: HashMap<String, Vec<(String, Vec<String>)>> = HashMap::new();
        transitions.insert(
            "q0,a,Z".to_string(),
            vec![
                ("q1".to_string(), vec!["Z".to_string()]),
                ("q2".to_string(), vec!["A".to_string(), "Z".to_string()]),
            ],
        );
        let definition = PushdownAutomatonDefinition {
            name: None,
            kind: None,
            states: vec!["q0".to_string(), "q1".to_string(), "q2".to_string()],
            input_alphabet: vec!["a".to_string()],
            stack_alphabet: vec!["Z".to_string(), "A".to_string()],
            transitions,
            initial_state: "q0".to_string(),
            initial_stack_symbol: "Z".to_string(),
            final_states: vec!["q1".to_string()],
        };

        let mut pda = PushdownAutomaton::new(definition).unwrap();
        pda.step("a").unwrap();
        assert_eq!(pda.active_configurations().len(), 2);
        assert_eq!(
            pda.current_states(),
            BTreeSet::from(["q1".to_string(), "q2".to_string()])
        );
    }

    #[test]
    fn test_malformed_transition_key_rejected() {
        let mut definition = anbn_definition();
        definition
            .transitions
            .insert("q0,a".to_string(), vec![("q0".to_string(), vec![])]);
        assert!(matches!(
            PushdownAutomaton::new(definition),
            Err(SimulatorError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_unknown_push_symbol_rejected() {
        let mut definition = anbn_definition();
        definition
            .transitions
            .insert("q0,a,Z".to_string(), vec![("q0".to_string(), vec!["X".to_string()])]);
        assert!(matches!(
            PushdownAutomaton::new(definition),
            Err(SimulatorError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_to_definition_round_trip() {
        let pda = PushdownAutomaton::new(anbn_definition()).unwrap();
        let definition = pda.to_definition(Some("anbn"));
        assert_eq!(definition.kind.as_deref(), Some("PDA"));

        let rebuilt = PushdownAutomaton::new(definition).unwrap();
        assert_eq!(rebuilt.transitions, pda.transitions);
        assert_eq!(rebuilt.final_states, pda.final_states);
        assert_eq!(rebuilt.initial_stack_symbol, pda.initial_stack_symbol);
    }
}
