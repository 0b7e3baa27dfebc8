//! This module defines the `ContextFreeGrammar` derivation engine. It steps a
//! single sentential form through leftmost (or explicitly chosen)
//! substitutions, and offers a heuristic-guided backtracking search from the
//! start symbol to a target string.

use crate::types::{SimulatorError, EPSILON_MARKER, MAX_DERIVATION_DEPTH};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// The JSON-facing definition of a context-free grammar. Variables are
/// single uppercase letters; the epsilon marker `ε` as a whole production
/// substitutes to nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrammarDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub variables: Vec<String>,
    pub terminals: Vec<String>,
    pub productions: HashMap<String, Vec<String>>,
    pub start: String,
}

/// An applicable substitution: the variable at byte `position` of the
/// current derivation, and one of its registered productions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PossibleStep {
    pub position: usize,
    pub variable: char,
    pub production: String,
}

/// Record of one applied substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationStep {
    pub from: String,
    pub variable: char,
    pub production: String,
    pub to: String,
    pub position: usize,
}

/// Represents a context-free grammar mid-derivation.
///
/// The engine holds the current sentential form, the append-only step
/// history, and the recomputed list of applicable substitutions.
pub struct ContextFreeGrammar {
    variables: BTreeSet<char>,
    terminals: BTreeSet<char>,
    productions: HashMap<char, Vec<String>>,
    start_symbol: char,
    current: String,
    history: Vec<DerivationStep>,
    possible: Vec<PossibleStep>,
}

fn single_char(symbol: &str) -> Option<char> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

impl ContextFreeGrammar {
    /// Builds an engine from a definition.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidDefinition` if a variable is not a
    /// single uppercase letter, a terminal is not a single character, the
    /// start symbol is not a variable, or a production mentions a symbol
    /// outside the declared sets.
    pub fn new(definition: GrammarDefinition) -> Result<Self, SimulatorError> {
        let mut variables = BTreeSet::new();
        for symbol in &definition.variables {
            match single_char(symbol) {
                Some(ch) if ch.is_ascii_uppercase() => {
                    variables.insert(ch);
                }
                _ => {
                    return Err(SimulatorError::InvalidDefinition(format!(
                        "Variable '{}' must be a single uppercase letter",
                        symbol
                    )))
                }
            }
        }

        let mut terminals = BTreeSet::new();
        for symbol in &definition.terminals {
            match single_char(symbol) {
                Some(ch) if !ch.is_ascii_uppercase() => {
                    terminals.insert(ch);
                }
                _ => {
                    return Err(SimulatorError::InvalidDefinition(format!(
                        "Terminal '{}' must be a single non-uppercase character",
                        symbol
                    )))
                }
            }
        }

        let start_symbol = single_char(&definition.start)
            .filter(|ch| variables.contains(ch))
            .ok_or_else(|| {
                SimulatorError::InvalidDefinition(format!(
                    "Start symbol '{}' is not a declared variable",
                    definition.start
                ))
            })?;

        let mut productions: HashMap<char, Vec<String>> = HashMap::new();
        for (variable, bodies) in &definition.productions {
            let variable = single_char(variable)
                .filter(|ch| variables.contains(ch))
                .ok_or_else(|| {
                    SimulatorError::InvalidDefinition(format!(
                        "Production head '{}' is not a declared variable",
                        variable
                    ))
                })?;
            for body in bodies {
                if body != EPSILON_MARKER {
                    for ch in body.chars() {
                        if !variables.contains(&ch) && !terminals.contains(&ch) {
                            return Err(SimulatorError::InvalidDefinition(format!(
                                "Production '{}' mentions undeclared symbol '{}'",
                                body, ch
                            )));
                        }
                    }
                }
            }
            productions.insert(variable, bodies.clone());
        }

        let mut grammar = Self {
            variables,
            terminals,
            productions,
            start_symbol,
            current: String::new(),
            history: Vec::new(),
            possible: Vec::new(),
        };
        grammar.reset();
        Ok(grammar)
    }

    /// Parses production rules from text, one rule per line in the form
    /// `S -> aSb | ε`, inferring terminals from the production bodies.
    pub fn parse(rules_text: &str, start: char) -> Result<Self, SimulatorError> {
        let mut productions: HashMap<String, Vec<String>> = HashMap::new();
        let mut terminals: BTreeSet<char> = BTreeSet::new();

        let lines: Vec<&str> = rules_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(SimulatorError::InvalidDefinition(
                "No production rules given".to_string(),
            ));
        }

        for line in lines {
            let Some((head, bodies)) = line.split_once("->") else {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Invalid rule '{}', expected 'Variable -> production | production'",
                    line
                )));
            };
            let head = head.trim();
            if single_char(head).filter(char::is_ascii_uppercase).is_none() {
                return Err(SimulatorError::InvalidDefinition(format!(
                    "Rule head '{}' must be a single uppercase letter",
                    head
                )));
            }

            let entry = productions.entry(head.to_string()).or_default();
            for body in bodies.split('|') {
                let body = body.trim().to_string();
                if body != EPSILON_MARKER {
                    for ch in body.chars() {
                        if !ch.is_ascii_uppercase() {
                            terminals.insert(ch);
                        }
                    }
                }
                entry.push(body);
            }
        }

        let variables: Vec<String> = productions.keys().cloned().collect();
        Self::new(GrammarDefinition {
            name: None,
            kind: None,
            variables,
            terminals: terminals.iter().map(|ch| ch.to_string()).collect(),
            productions,
            start: start.to_string(),
        })
    }

    /// Resets the derivation to the bare start symbol.
    pub fn reset(&mut self) {
        self.current = self.start_symbol.to_string();
        self.history.clear();
        self.possible = self.possible_for(&self.current);
    }

    /// Enumerates every applicable substitution in `form`: for each position
    /// holding a variable, every production registered for it, in
    /// left-to-right position order.
    fn possible_for(&self, form: &str) -> Vec<PossibleStep> {
        let mut steps = Vec::new();
        for (position, ch) in form.char_indices() {
            if self.variables.contains(&ch) {
                if let Some(bodies) = self.productions.get(&ch) {
                    for body in bodies {
                        steps.push(PossibleStep {
                            position,
                            variable: ch,
                            production: body.clone(),
                        });
                    }
                }
            }
        }
        steps
    }

    /// Replaces the variable at byte `position` of `form` with the
    /// production text; the epsilon marker substitutes to nothing.
    /// Variables are ASCII, so the replaced span is one byte wide.
    fn substitute(form: &str, position: usize, production: &str) -> String {
        let replacement = if production == EPSILON_MARKER {
            ""
        } else {
            production
        };
        format!(
            "{}{}{}",
            &form[..position],
            replacement,
            &form[position + 1..]
        )
    }

    /// Applies one derivation step. With an explicit `(variable, production)`
    /// choice, the leftmost matching substitution is used; without one, the
    /// first possible step (the leftmost variable's first production).
    ///
    /// Returns `Ok(None)` once no variable remains — the derivation halted.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidProduction` if the requested choice is
    /// not currently applicable.
    pub fn step(
        &mut self,
        choice: Option<(char, &str)>,
    ) -> Result<Option<DerivationStep>, SimulatorError> {
        if self.possible.is_empty() {
            return Ok(None);
        }

        let step = match choice {
            Some((variable, production)) => self
                .possible
                .iter()
                .find(|step| step.variable == variable && step.production == production)
                .cloned()
                .ok_or(SimulatorError::InvalidProduction {
                    variable,
                    production: production.to_string(),
                })?,
            None => self.possible[0].clone(),
        };

        let to = Self::substitute(&self.current, step.position, &step.production);
        let record = DerivationStep {
            from: self.current.clone(),
            variable: step.variable,
            production: step.production,
            to: to.clone(),
            position: step.position,
        };

        self.current = to;
        self.history.push(record.clone());
        self.possible = self.possible_for(&self.current);
        Ok(Some(record))
    }

    /// Heuristic score for trying `candidate` while deriving `target`:
    /// 0.6 × the absolute length difference plus 0.4 × the count of
    /// positions, up to the shorter length, past the common prefix. Lower
    /// scores are tried first. Performance heuristic only; it never changes
    /// the success/failure outcome.
    fn heuristic(candidate: &str, target: &str) -> f64 {
        let candidate: Vec<char> = candidate.chars().collect();
        let target: Vec<char> = target.chars().collect();

        let length_score = (candidate.len() as f64 - target.len() as f64).abs();
        let shorter = candidate.len().min(target.len());
        let prefix = candidate
            .iter()
            .zip(&target)
            .take_while(|(a, b)| a == b)
            .count();

        length_score * 0.6 + (shorter.saturating_sub(prefix)) as f64 * 0.4
    }

    /// The number of terminal characters in `form`. Terminals never
    /// disappear under substitution, so a form with more terminals than the
    /// target has can never derive it.
    fn terminal_count(&self, form: &str) -> usize {
        form.chars()
            .filter(|ch| !self.variables.contains(ch))
            .count()
    }

    /// Backtracking depth-first search for a derivation of `target`.
    ///
    /// Recursion is over immutable sentential forms: each frame gets its own
    /// string, so failure needs no rewind beyond popping the path. On
    /// success the engine is left holding the found derivation (current form
    /// and history); on failure it is left reset.
    ///
    /// Unlike the unbounded reference behavior, the search prunes forms
    /// whose terminal count already exceeds the target and stops at
    /// `MAX_DERIVATION_DEPTH`, so it always terminates.
    pub fn derive_string(&mut self, target: &str) -> Option<Vec<DerivationStep>> {
        self.reset();
        let mut path = Vec::new();
        let start = self.current.clone();
        if self.search(&start, target, 0, &mut path) {
            self.current = target.to_string();
            self.history = path.clone();
            self.possible = self.possible_for(&self.current);
            Some(path)
        } else {
            None
        }
    }

    fn search(
        &self,
        current: &str,
        target: &str,
        depth: usize,
        path: &mut Vec<DerivationStep>,
    ) -> bool {
        if current == target {
            return true;
        }
        if depth >= MAX_DERIVATION_DEPTH {
            return false;
        }
        if self.terminal_count(current) > target.chars().count() {
            return false;
        }

        let steps = self.possible_for(current);
        if steps.is_empty() {
            return false;
        }

        let mut scored: Vec<(f64, PossibleStep, String)> = steps
            .into_iter()
            .map(|step| {
                let next = Self::substitute(current, step.position, &step.production);
                (Self::heuristic(&next, target), step, next)
            })
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        for (_, step, next) in scored {
            path.push(DerivationStep {
                from: current.to_string(),
                variable: step.variable,
                production: step.production,
                to: next.clone(),
                position: step.position,
            });
            if self.search(&next, target, depth + 1, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// The byte position of the leftmost variable in the current derivation,
    /// or `None` when only terminals remain.
    pub fn leftmost_variable(&self) -> Option<usize> {
        self.current
            .char_indices()
            .find(|(_, ch)| self.variables.contains(ch))
            .map(|(position, _)| position)
    }

    /// The productions registered for `variable`, in declaration order.
    pub fn productions_for(&self, variable: char) -> &[String] {
        self.productions
            .get(&variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The currently applicable substitutions, recomputed after every
    /// mutation.
    pub fn possible_steps(&self) -> &[PossibleStep] {
        &self.possible
    }

    pub fn current_derivation(&self) -> &str {
        &self.current
    }

    pub fn history(&self) -> &[DerivationStep] {
        &self.history
    }

    pub fn start_symbol(&self) -> char {
        self.start_symbol
    }

    /// Rebuilds the JSON-facing definition, e.g. for saving.
    pub fn to_definition(&self, name: Option<&str>) -> GrammarDefinition {
        GrammarDefinition {
            name: name.map(|n| n.to_string()),
            kind: Some("CFG".to_string()),
            variables: self.variables.iter().map(|ch| ch.to_string()).collect(),
            terminals: self.terminals.iter().map(|ch| ch.to_string()).collect(),
            productions: self
                .productions
                .iter()
                .map(|(variable, bodies)| (variable.to_string(), bodies.clone()))
                .collect(),
            start: self.start_symbol.to_string(),
        }
    }
}
