//! This module provides functions for analyzing automaton definitions to detect common
//! inconsistencies before simulation. This includes checks for unreachable states, transitions
//! that target undeclared states, and final states no run can ever enter. Findings are
//! informational: a definition with findings still simulates.

use crate::finite::FiniteAutomatonDefinition;
use crate::turing::TuringMachineDefinition;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

/// A single issue detected in a definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Finding {
    /// States declared in the definition that no path from the initial state reaches.
    UnreachableStates(Vec<String>),
    /// Transition targets that are not declared in the state list.
    UndefinedTransitionTargets(Vec<String>),
    /// Final states that are either undeclared or unreachable, so no run can accept through them.
    DeadFinalStates(Vec<String>),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::UnreachableStates(states) => {
                write!(f, "States unreachable from the initial state: {:?}", states)
            }
            Finding::UndefinedTransitionTargets(states) => {
                write!(f, "Transitions reference undeclared states: {:?}", states)
            }
            Finding::DeadFinalStates(states) => {
                write!(f, "Final states that no run can reach: {:?}", states)
            }
        }
    }
}

/// Analyzes a finite automaton definition.
///
/// # Arguments
///
/// * `definition` - A reference to the definition to analyze.
///
/// # Returns
///
/// A list of findings, empty when the definition is clean.
pub fn analyze_finite(definition: &FiniteAutomatonDefinition) -> Vec<Finding> {
    let edges: Vec<(String, String)> = definition
        .transitions
        .iter()
        .flat_map(|(from, by_symbol)| {
            by_symbol
                .values()
                .flatten()
                .map(move |to| (from.clone(), to.clone()))
        })
        .collect();

    collect_findings(
        &definition.states,
        &definition.initial_state,
        &definition.final_states,
        &edges,
    )
}

/// Analyzes a Turing machine definition.
///
/// # Arguments
///
/// * `definition` - A reference to the definition to analyze.
///
/// # Returns
///
/// A list of findings, empty when the definition is clean.
pub fn analyze_turing(definition: &TuringMachineDefinition) -> Vec<Finding> {
    let edges: Vec<(String, String)> = definition
        .transitions
        .iter()
        .flat_map(|(key, targets)| {
            // Keys are encoded as "state,symbol"; the state is the part before
            // the first comma.
            let from = key.split(',').next().unwrap_or(key).to_string();
            targets
                .iter()
                .map(move |(next, _, _)| (from.clone(), next.clone()))
        })
        .collect();

    collect_findings(
        &definition.states,
        &definition.initial_state,
        &definition.final_states,
        &edges,
    )
}

fn collect_findings(
    states: &[String],
    initial: &str,
    finals: &[String],
    edges: &[(String, String)],
) -> Vec<Finding> {
    [
        check_undefined_targets(states, edges),
        check_unreachable_states(states, initial, edges),
        check_dead_final_states(states, initial, finals, edges),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Breadth-first reachability over the transition graph, starting from the
/// initial state.
fn reachable_states(initial: &str, edges: &[(String, String)]) -> HashSet<String> {
    let mut reachable = HashSet::new();
    reachable.insert(initial.to_string());
    let mut queue = VecDeque::from([initial.to_string()]);

    while let Some(state) = queue.pop_front() {
        for (from, to) in edges {
            if *from == state && reachable.insert(to.clone()) {
                queue.push_back(to.clone());
            }
        }
    }

    reachable
}

fn check_unreachable_states(
    states: &[String],
    initial: &str,
    edges: &[(String, String)],
) -> Option<Finding> {
    let reachable = reachable_states(initial, edges);
    let unreachable: Vec<String> = states
        .iter()
        .filter(|state| !reachable.contains(*state))
        .cloned()
        .collect();

    (!unreachable.is_empty()).then_some(Finding::UnreachableStates(unreachable))
}

fn check_undefined_targets(states: &[String], edges: &[(String, String)]) -> Option<Finding> {
    let declared: HashSet<&String> = states.iter().collect();
    let undefined: BTreeSet<String> = edges
        .iter()
        .map(|(_, to)| to)
        .filter(|to| !declared.contains(to))
        .cloned()
        .collect();

    (!undefined.is_empty()).then_some(Finding::UndefinedTransitionTargets(
        undefined.into_iter().collect(),
    ))
}

fn check_dead_final_states(
    states: &[String],
    initial: &str,
    finals: &[String],
    edges: &[(String, String)],
) -> Option<Finding> {
    let declared: HashSet<&String> = states.iter().collect();
    let reachable = reachable_states(initial, edges);
    let dead: Vec<String> = finals
        .iter()
        .filter(|state| !declared.contains(*state) || !reachable.contains(*state))
        .cloned()
        .collect();

    (!dead.is_empty()).then_some(Finding::DeadFinalStates(dead))
}
