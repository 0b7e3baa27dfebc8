use crate::loader::{Definition, DefinitionLoader};
use crate::types::SimulatorError;

// Default embedded definitions
const DEFINITION_TEXTS: [&str; 4] = [
    include_str!("../defs/ends-with-ab.json"),
    include_str!("../defs/matched-an-bn.json"),
    include_str!("../defs/unary-append.json"),
    include_str!("../defs/matched-pairs.json"),
];

lazy_static::lazy_static! {
    static ref DEFINITIONS: Vec<Definition> = DEFINITION_TEXTS
        .iter()
        .filter_map(|text| DefinitionLoader::parse_any(text).ok())
        .collect();
}

/// Summary of one catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub index: usize,
    pub name: String,
    pub kind: &'static str,
}

pub struct Catalog;

impl Catalog {
    /// Get the number of available definitions
    pub fn count() -> usize {
        DEFINITIONS.len()
    }

    /// List all definition names
    pub fn names() -> Vec<String> {
        DEFINITIONS
            .iter()
            .map(|definition| definition.name().unwrap_or("unnamed").to_string())
            .collect()
    }

    /// Get a definition by its index
    pub fn get_by_index(index: usize) -> Result<Definition, SimulatorError> {
        DEFINITIONS.get(index).cloned().ok_or_else(|| {
            SimulatorError::InvalidDefinition(format!("Catalog index {} out of range", index))
        })
    }

    /// Get a definition by its name
    pub fn get_by_name(name: &str) -> Result<Definition, SimulatorError> {
        DEFINITIONS
            .iter()
            .find(|definition| definition.name() == Some(name))
            .cloned()
            .ok_or_else(|| {
                SimulatorError::InvalidDefinition(format!("Definition '{}' not found", name))
            })
    }

    /// Get summary information for every catalog entry
    pub fn entries() -> Vec<CatalogEntry> {
        DEFINITIONS
            .iter()
            .enumerate()
            .map(|(index, definition)| CatalogEntry {
                index,
                name: definition.name().unwrap_or("unnamed").to_string(),
                kind: definition.kind(),
            })
            .collect()
    }

    /// Search for definitions by name, case-insensitively
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();
        DEFINITIONS
            .iter()
            .enumerate()
            .filter(|(_, definition)| {
                definition
                    .name()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the original JSON text of a definition by its index
    pub fn text_by_index(index: usize) -> Result<&'static str, SimulatorError> {
        DEFINITION_TEXTS.get(index).copied().ok_or_else(|| {
            SimulatorError::InvalidDefinition(format!(
                "Catalog text index {} out of range",
                index
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite::FiniteAutomaton;
    use crate::grammar::ContextFreeGrammar;
    use crate::pushdown::PushdownAutomaton;
    use crate::turing::TuringMachine;

    #[test]
    fn test_catalog_holds_all_embedded_definitions() {
        assert_eq!(Catalog::count(), 4);
    }

    #[test]
    fn test_catalog_names() {
        let names = Catalog::names();
        assert!(names.contains(&"Ends with ab".to_string()));
        assert!(names.contains(&"Matched a^n b^n".to_string()));
        assert!(names.contains(&"Unary append".to_string()));
        assert!(names.contains(&"Matched pairs".to_string()));
    }

    #[test]
    fn test_all_definitions_construct_valid_simulators() {
        for index in 0..Catalog::count() {
            let definition = Catalog::get_by_index(index).unwrap();
            match definition {
                Definition::Finite(d) => {
                    FiniteAutomaton::new(d).unwrap();
                }
                Definition::Pushdown(d) => {
                    PushdownAutomaton::new(d).unwrap();
                }
                Definition::Turing(d) => {
                    TuringMachine::new(d).unwrap();
                }
                Definition::Grammar(d) => {
                    ContextFreeGrammar::new(d).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_embedded_samples_accept_their_languages() {
        let Definition::Finite(fa) = Catalog::get_by_name("Ends with ab").unwrap() else {
            panic!("wrong kind");
        };
        let mut fa = FiniteAutomaton::new(fa).unwrap();
        assert!(fa.simulate("bab").unwrap());
        assert!(!fa.simulate("ba").unwrap());

        let Definition::Pushdown(pda) = Catalog::get_by_name("Matched a^n b^n").unwrap() else {
            panic!("wrong kind");
        };
        let mut pda = PushdownAutomaton::new(pda).unwrap();
        assert!(pda.simulate("aaabbb").unwrap());
        assert!(!pda.simulate("aabbb").unwrap());

        let Definition::Grammar(cfg) = Catalog::get_by_name("Matched pairs").unwrap() else {
            panic!("wrong kind");
        };
        let mut cfg = ContextFreeGrammar::new(cfg).unwrap();
        assert!(cfg.derive_string("ab").is_some());
    }

    #[test]
    fn test_get_by_index_out_of_range() {
        assert!(Catalog::get_by_index(999).is_err());
        assert!(Catalog::text_by_index(999).is_err());
    }

    #[test]
    fn test_get_by_name_not_found() {
        assert!(Catalog::get_by_name("Nonexistent").is_err());
    }

    #[test]
    fn test_entries_carry_kind_tags() {
        let entries = Catalog::entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].kind, "FA");
        assert_eq!(entries[1].kind, "PDA");
        assert_eq!(entries[2].kind, "TM");
        assert_eq!(entries[3].kind, "CFG");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let results = Catalog::search("matched");
        assert_eq!(results.len(), 2);
        assert!(Catalog::search("zzz").is_empty());
    }
}
