//! This module defines the constants and the shared error type used by every
//! simulation engine in the crate.

use thiserror::Error;

/// The marker used in definition files and production strings to denote the
/// empty string (epsilon). Inside the engines epsilon is represented by the
/// empty string token itself; the marker only appears at the file boundary
/// and in grammar productions.
pub const EPSILON_MARKER: &str = "ε";

/// The maximum recursion depth for the grammar backtracking search.
///
/// The search is exponential in the worst case and unbounded grammars
/// (left-recursive or epsilon-cyclic) could otherwise loop forever; this
/// bound guarantees `derive_string` terminates.
pub const MAX_DERIVATION_DEPTH: usize = 512;

/// The maximum number of epsilon-closure rounds applied in one closure call.
/// The closure normally stops at a fixed point; this bound keeps cyclic
/// stack-growing epsilon loops from running away.
pub const MAX_CLOSURE_ROUNDS: usize = 1000;

/// The default generation budget for `TuringMachine::run` callers.
pub const MAX_GENERATIONS: usize = 10000;

/// Represents the errors that can occur while constructing or driving a
/// simulation engine.
///
/// An undefined transition is deliberately *not* an error: a configuration
/// with no applicable rule simply does not propagate, which is a normal
/// rejecting or halting outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    /// An input symbol handed to `step` is not in the declared alphabet.
    /// The engine state is left untouched; the caller may retry.
    #[error("Symbol '{0}' is not in the declared alphabet")]
    InvalidSymbol(String),
    /// A construction-time invariant of a machine or grammar definition is
    /// violated. Fatal: no partially-constructed engine is returned.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),
    /// A requested grammar derivation step does not exist.
    #[error("No production '{production}' is registered for variable '{variable}'")]
    InvalidProduction { variable: char, production: String },
    /// A definition file failed to parse or is missing required fields.
    #[error("Malformed definition file: {0}")]
    MalformedFile(String),
    /// A filesystem operation failed while loading or saving a definition.
    #[error("File error: {0}")]
    FileError(String),
}

/// Translates the epsilon marker used in definition files into the internal
/// empty-string representation.
pub(crate) fn decode_epsilon(symbol: &str) -> String {
    if symbol == EPSILON_MARKER {
        String::new()
    } else {
        symbol.to_string()
    }
}

/// Translates the internal empty-string epsilon back into the file marker.
pub(crate) fn encode_epsilon(symbol: &str) -> String {
    if symbol.is_empty() {
        EPSILON_MARKER.to_string()
    } else {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_round_trip() {
        assert_eq!(decode_epsilon("ε"), "");
        assert_eq!(decode_epsilon("a"), "a");
        assert_eq!(encode_epsilon(""), "ε");
        assert_eq!(encode_epsilon("Z"), "Z");
    }

    #[test]
    fn test_error_display() {
        let error = SimulatorError::InvalidSymbol("c".to_string());
        let message = format!("{}", error);
        assert!(message.contains("not in the declared alphabet"));
        assert!(message.contains('c'));

        let error = SimulatorError::InvalidProduction {
            variable: 'S',
            production: "aSb".to_string(),
        };
        assert!(format!("{}", error).contains("aSb"));
    }
}
