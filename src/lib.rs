//! This crate provides the core logic for a suite of formal-language simulators.
//! It includes modules for simulating finite automata, pushdown automata, Turing
//! machines and context-free grammar derivations, for explaining regular-expression
//! patterns, and for loading, saving and analyzing automaton definitions.

pub mod analyzer;
pub mod catalog;
pub mod explain;
pub mod finite;
pub mod grammar;
pub mod loader;
pub mod pushdown;
pub mod turing;
pub mod types;

/// Re-exports the analysis functions and `Finding` enum from the analyzer module.
pub use analyzer::{analyze_finite, analyze_turing, Finding};
/// Re-exports the `Catalog` facade over the embedded sample definitions.
pub use catalog::{Catalog, CatalogEntry};
/// Re-exports the regex explainer and its component and report types.
pub use explain::{MatchReport, PatternComponent, RegexExplainer};
/// Re-exports the finite automaton simulator and its definition type.
pub use finite::{FiniteAutomaton, FiniteAutomatonDefinition, FiniteStep};
/// Re-exports the context-free grammar engine and its step types.
pub use grammar::{ContextFreeGrammar, DerivationStep, GrammarDefinition, PossibleStep};
/// Re-exports the `DefinitionLoader` struct and tagged `Definition` enum.
pub use loader::{Definition, DefinitionLoader};
/// Re-exports the pushdown automaton simulator and its configuration types.
pub use pushdown::{
    PdaConfiguration, PdaStep, PushdownAutomaton, PushdownAutomatonDefinition,
};
/// Re-exports the Turing machine simulator and its configuration types.
pub use turing::{TapeConfiguration, TuringMachine, TuringMachineDefinition};
/// Re-exports the shared error type and simulation limits from the types module.
pub use types::{
    SimulatorError, EPSILON_MARKER, MAX_CLOSURE_ROUNDS, MAX_DERIVATION_DEPTH, MAX_GENERATIONS,
};
