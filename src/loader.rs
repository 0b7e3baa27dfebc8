//! This module provides the `DefinitionLoader` struct, responsible for loading automaton
//! definitions from JSON files and strings, and for saving running simulators back to disk.
//! A tagged `Definition` enum dispatches mixed collections of files on their `type` field.

use crate::finite::{FiniteAutomaton, FiniteAutomatonDefinition};
use crate::grammar::{ContextFreeGrammar, GrammarDefinition};
use crate::pushdown::{PushdownAutomaton, PushdownAutomatonDefinition};
use crate::turing::{TuringMachine, TuringMachineDefinition};
use crate::types::SimulatorError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// A definition of any supported kind, discriminated by the JSON `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Finite(FiniteAutomatonDefinition),
    Pushdown(PushdownAutomatonDefinition),
    Turing(TuringMachineDefinition),
    Grammar(GrammarDefinition),
}

impl Definition {
    /// The display name stored in the definition, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Definition::Finite(d) => d.name.as_deref(),
            Definition::Pushdown(d) => d.name.as_deref(),
            Definition::Turing(d) => d.name.as_deref(),
            Definition::Grammar(d) => d.name.as_deref(),
        }
    }

    /// The `type` tag this definition serializes under.
    pub fn kind(&self) -> &'static str {
        match self {
            Definition::Finite(_) => "FA",
            Definition::Pushdown(_) => "PDA",
            Definition::Turing(_) => "TM",
            Definition::Grammar(_) => "CFG",
        }
    }
}

/// `DefinitionLoader` is a utility struct for reading and writing automaton definitions.
/// It provides typed methods per definition kind plus `parse_any` for content whose kind
/// is only known from its `type` tag.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Reads and deserializes a JSON definition file.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the JSON file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` if the file is successfully read and deserialized.
    /// * `Err(SimulatorError::FileError)` if the file cannot be read.
    /// * `Err(SimulatorError::MalformedFile)` if the content is not a valid definition.
    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SimulatorError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SimulatorError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, SimulatorError> {
        serde_json::from_str(content).map_err(|e| {
            SimulatorError::MalformedFile(format!("Not a valid definition: {}", e))
        })
    }

    fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), SimulatorError> {
        let content = serde_json::to_string_pretty(value).map_err(|e| {
            SimulatorError::FileError(format!("Failed to serialize definition: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            SimulatorError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })
    }

    /// Loads a finite automaton from the specified file path and constructs
    /// a ready-to-run simulator from it.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the JSON file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(FiniteAutomaton)` on success.
    /// * `Err(SimulatorError::FileError)` if the file cannot be read.
    /// * `Err(SimulatorError::MalformedFile)` if the content is not valid JSON.
    /// * `Err(SimulatorError::InvalidDefinition)` if the definition is inconsistent.
    pub fn load_finite(path: &Path) -> Result<FiniteAutomaton, SimulatorError> {
        FiniteAutomaton::new(Self::read_json(path)?)
    }

    /// Loads a finite automaton from string content instead of a file.
    pub fn load_finite_from_str(content: &str) -> Result<FiniteAutomaton, SimulatorError> {
        FiniteAutomaton::new(Self::parse_json(content)?)
    }

    /// Serializes the automaton's definition to pretty-printed JSON at `path`,
    /// stored under `name`.
    pub fn save_finite(
        automaton: &FiniteAutomaton,
        path: &Path,
        name: &str,
    ) -> Result<(), SimulatorError> {
        Self::write_json(&automaton.to_definition(Some(name)), path)
    }

    /// Loads a pushdown automaton from the specified file path.
    pub fn load_pushdown(path: &Path) -> Result<PushdownAutomaton, SimulatorError> {
        PushdownAutomaton::new(Self::read_json(path)?)
    }

    /// Loads a pushdown automaton from string content instead of a file.
    pub fn load_pushdown_from_str(content: &str) -> Result<PushdownAutomaton, SimulatorError> {
        PushdownAutomaton::new(Self::parse_json(content)?)
    }

    /// Serializes the automaton's definition to pretty-printed JSON at `path`.
    pub fn save_pushdown(
        automaton: &PushdownAutomaton,
        path: &Path,
        name: &str,
    ) -> Result<(), SimulatorError> {
        Self::write_json(&automaton.to_definition(Some(name)), path)
    }

    /// Loads a Turing machine from the specified file path.
    pub fn load_turing(path: &Path) -> Result<TuringMachine, SimulatorError> {
        TuringMachine::new(Self::read_json(path)?)
    }

    /// Loads a Turing machine from string content instead of a file.
    pub fn load_turing_from_str(content: &str) -> Result<TuringMachine, SimulatorError> {
        TuringMachine::new(Self::parse_json(content)?)
    }

    /// Serializes the machine's definition to pretty-printed JSON at `path`.
    pub fn save_turing(
        machine: &TuringMachine,
        path: &Path,
        name: &str,
    ) -> Result<(), SimulatorError> {
        Self::write_json(&machine.to_definition(Some(name)), path)
    }

    /// Loads a context-free grammar from the specified file path.
    pub fn load_grammar(path: &Path) -> Result<ContextFreeGrammar, SimulatorError> {
        ContextFreeGrammar::new(Self::read_json(path)?)
    }

    /// Loads a context-free grammar from string content instead of a file.
    pub fn load_grammar_from_str(content: &str) -> Result<ContextFreeGrammar, SimulatorError> {
        ContextFreeGrammar::new(Self::parse_json(content)?)
    }

    /// Serializes the grammar's definition to pretty-printed JSON at `path`.
    pub fn save_grammar(
        grammar: &ContextFreeGrammar,
        path: &Path,
        name: &str,
    ) -> Result<(), SimulatorError> {
        Self::write_json(&grammar.to_definition(Some(name)), path)
    }

    /// Parses JSON content whose kind is only known from its `type` tag.
    ///
    /// # Arguments
    ///
    /// * `content` - The JSON text of a definition carrying a `type` field.
    ///
    /// # Returns
    ///
    /// * `Ok(Definition)` if the tag is recognized and the content deserializes.
    /// * `Err(SimulatorError::MalformedFile)` if the tag is missing, unknown,
    ///   or the content does not match the tagged shape.
    pub fn parse_any(content: &str) -> Result<Definition, SimulatorError> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| SimulatorError::MalformedFile(format!("Not valid JSON: {}", e)))?;

        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                SimulatorError::MalformedFile("Definition is missing its 'type' tag".to_string())
            })?
            .to_string();

        let reshape = |e: serde_json::Error| {
            SimulatorError::MalformedFile(format!("Invalid '{}' definition: {}", tag, e))
        };

        match tag.as_str() {
            "FA" => Ok(Definition::Finite(
                serde_json::from_value(value).map_err(reshape)?,
            )),
            "PDA" => Ok(Definition::Pushdown(
                serde_json::from_value(value).map_err(reshape)?,
            )),
            "TM" => Ok(Definition::Turing(
                serde_json::from_value(value).map_err(reshape)?,
            )),
            "CFG" => Ok(Definition::Grammar(
                serde_json::from_value(value).map_err(reshape)?,
            )),
            other => Err(SimulatorError::MalformedFile(format!(
                "Unknown definition type '{}'",
                other
            ))),
        }
    }

    /// Loads a definition of any kind from the specified file path.
    pub fn load_any(path: &Path) -> Result<Definition, SimulatorError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SimulatorError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::parse_any(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const FINITE_JSON: &str = r#"{
        "type": "FA",
        "states": ["q0", "q1"],
        "alphabet": ["a", "b"],
        "transitions": {
            "q0": {"a": ["q1"], "b": ["q0"]},
            "q1": {"a": ["q1"], "b": ["q0"]}
        },
        "initial_state": "q0",
        "final_states": ["q1"]
    }"#;

    const PUSHDOWN_JSON: &str = r#"{
        "type": "PDA",
        "states": ["q0", "q1", "q2"],
        "input_alphabet": ["a", "b"],
        "stack_alphabet": ["Z", "A"],
        "transitions": {
            "q0,a,Z": [["q0", ["A", "Z"]]],
            "q0,a,A": [["q0", ["A", "A"]]],
            "q0,b,A": [["q1", ["ε"]]],
            "q1,b,A": [["q1", ["ε"]]],
            "q1,ε,Z": [["q2", ["Z"]]]
        },
        "initial_state": "q0",
        "initial_stack_symbol": "Z",
        "final_states": ["q2"]
    }"#;

    const TURING_JSON: &str = r#"{
        "type": "TM",
        "states": ["q0", "qf"],
        "alphabet": ["1"],
        "tape_alphabet": ["1", "_"],
        "transitions": {
            "q0,1": [["q0", "1", "R"]],
            "q0,_": [["qf", "1", "S"]]
        },
        "initial_state": "q0",
        "blank_symbol": "_",
        "final_states": ["qf"]
    }"#;

    const GRAMMAR_JSON: &str = r#"{
        "type": "CFG",
        "variables": ["S"],
        "terminals": ["a", "b"],
        "productions": {"S": ["aSb", "ε"]},
        "start": "S"
    }"#;

    #[test]
    fn test_load_finite_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("fa.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(FINITE_JSON.as_bytes()).unwrap();

        let mut automaton = DefinitionLoader::load_finite(&file_path).unwrap();
        assert!(automaton.simulate("ba").unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = DefinitionLoader::load_finite(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SimulatorError::FileError(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"this is not a definition").unwrap();

        let result = DefinitionLoader::load_finite(&file_path);
        assert!(matches!(result, Err(SimulatorError::MalformedFile(_))));
    }

    #[test]
    fn test_finite_save_and_reload() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("fa.json");

        let automaton = DefinitionLoader::load_finite_from_str(FINITE_JSON).unwrap();
        DefinitionLoader::save_finite(&automaton, &file_path, "Odd machine").unwrap();

        let reloaded = DefinitionLoader::load_finite(&file_path).unwrap();
        assert_eq!(
            reloaded.to_definition(Some("Odd machine")),
            automaton.to_definition(Some("Odd machine"))
        );
    }

    #[test]
    fn test_pushdown_save_and_reload() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("pda.json");

        let automaton = DefinitionLoader::load_pushdown_from_str(PUSHDOWN_JSON).unwrap();
        DefinitionLoader::save_pushdown(&automaton, &file_path, "Balanced").unwrap();

        let mut reloaded = DefinitionLoader::load_pushdown(&file_path).unwrap();
        assert!(reloaded.simulate("aabb").unwrap());
        assert!(!reloaded.simulate("aab").unwrap());
    }

    #[test]
    fn test_turing_save_and_reload() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tm.json");

        let machine = DefinitionLoader::load_turing_from_str(TURING_JSON).unwrap();
        DefinitionLoader::save_turing(&machine, &file_path, "Append").unwrap();

        let mut reloaded = DefinitionLoader::load_turing(&file_path).unwrap();
        reloaded.reset("11").unwrap();
        assert!(reloaded.run(100));
    }

    #[test]
    fn test_grammar_save_and_reload() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("cfg.json");

        let grammar = DefinitionLoader::load_grammar_from_str(GRAMMAR_JSON).unwrap();
        DefinitionLoader::save_grammar(&grammar, &file_path, "Matched pairs").unwrap();

        let mut reloaded = DefinitionLoader::load_grammar(&file_path).unwrap();
        assert!(reloaded.derive_string("aabb").is_some());
    }

    #[test]
    fn test_parse_any_dispatches_on_tag() {
        assert!(matches!(
            DefinitionLoader::parse_any(FINITE_JSON).unwrap(),
            Definition::Finite(_)
        ));
        assert!(matches!(
            DefinitionLoader::parse_any(PUSHDOWN_JSON).unwrap(),
            Definition::Pushdown(_)
        ));
        assert!(matches!(
            DefinitionLoader::parse_any(TURING_JSON).unwrap(),
            Definition::Turing(_)
        ));
        assert!(matches!(
            DefinitionLoader::parse_any(GRAMMAR_JSON).unwrap(),
            Definition::Grammar(_)
        ));
    }

    #[test]
    fn test_parse_any_rejects_missing_or_unknown_tag() {
        let untagged = r#"{"states": []}"#;
        assert!(matches!(
            DefinitionLoader::parse_any(untagged),
            Err(SimulatorError::MalformedFile(_))
        ));

        let unknown = r#"{"type": "LBA"}"#;
        assert!(matches!(
            DefinitionLoader::parse_any(unknown),
            Err(SimulatorError::MalformedFile(_))
        ));
    }

    #[test]
    fn test_definition_accessors() {
        let definition = DefinitionLoader::parse_any(GRAMMAR_JSON).unwrap();
        assert_eq!(definition.kind(), "CFG");
        assert_eq!(definition.name(), None);
    }
}
