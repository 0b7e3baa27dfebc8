//! This module defines the `RegexExplainer`, a best-effort tokenizer over a
//! regular-expression pattern that emits one descriptive component per
//! recognized construct. Actual matching (search, groups, spans) is
//! delegated to the `regex` crate; nothing here executes the pattern.

use crate::types::SimulatorError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref METACHARACTER_DESCRIPTIONS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("\\d", "matches any digit (0-9)");
        map.insert("\\D", "matches any character that is NOT a digit");
        map.insert(
            "\\w",
            "matches any word character (letters, digits, underscore)",
        );
        map.insert("\\W", "matches any character that is NOT a word character");
        map.insert(
            "\\s",
            "matches any whitespace character (space, tab, newline, ...)",
        );
        map.insert("\\S", "matches any character that is NOT whitespace");
        map.insert(
            "\\b",
            "matches a word boundary (transition between word and non-word characters)",
        );
        map.insert(
            "\\B",
            "matches a non-boundary position (inside a word or between two non-words)",
        );
        map.insert("\\A", "anchors the match to the very start of the input");
        map.insert("\\z", "anchors the match to the very end of the input");
        map.insert(
            "\\Z",
            "anchors the match to the end of the input, before a final newline",
        );
        map
    };
}

/// One recognized construct of a pattern. Unterminated brackets, braces and
/// parens degrade to `Literal` components for the offending character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternComponent {
    /// A plain or escaped character matched verbatim.
    Literal(String),
    /// A character-class or boundary escape such as `\d` or `\b`.
    Metacharacter(String),
    /// A `\1`-style reference to an earlier capture group.
    Backreference(String),
    /// The `.` wildcard.
    Dot,
    /// A quantifier with no preceding element to attach to.
    Quantifier(String),
    /// A component with an attached quantifier (`a*`, `[0-9]{2,3}`, ...).
    Quantified(Box<PatternComponent>, String),
    /// A bracketed character set, negated or not.
    CharSet(String),
    /// A parenthesized group, matched by balanced-paren scanning.
    Group(String),
    /// The alternation bar.
    Alternation,
    /// The `^` or `$` anchor.
    Anchor(char),
}

/// Span of the overall match within the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Span of one capture group within the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMatch {
    pub number: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// The result of delegating a search to the standard regex evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub matched: Option<MatchSpan>,
    pub groups: Vec<GroupMatch>,
    /// Human-readable narration of the search outcome.
    pub trace: Vec<String>,
}

/// Explains a regular-expression pattern component by component and reports
/// how it matched a given text. The explanation side is pure tokenization;
/// `run` delegates matching to the `regex` crate.
pub struct RegexExplainer {
    pattern: String,
    components: Vec<PatternComponent>,
}

impl RegexExplainer {
    /// Tokenizes `pattern`. Never fails: unrecognized or unterminated
    /// constructs degrade to literal components.
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            components: tokenize(pattern),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn components(&self) -> &[PatternComponent] {
        &self.components
    }

    /// One descriptive line per component, in pattern order.
    pub fn explanations(&self) -> Vec<String> {
        self.components.iter().map(explain).collect()
    }

    /// Runs the delegated search against `text` and reports the full match,
    /// the captured groups and a textual validation trace.
    ///
    /// # Errors
    ///
    /// Returns `SimulatorError::InvalidDefinition` when the pattern is
    /// rejected by the regex evaluator (the tokenizer is more lenient than
    /// the matcher).
    pub fn run(&self, text: &str) -> Result<MatchReport, SimulatorError> {
        let regex = Regex::new(&self.pattern)
            .map_err(|e| SimulatorError::InvalidDefinition(format!("Invalid pattern: {}", e)))?;

        let mut trace = vec![format!(
            "Searching for pattern '{}' in the input text",
            self.pattern
        )];

        let Some(captures) = regex.captures(text) else {
            trace.push("No match found".to_string());
            return Ok(MatchReport {
                matched: None,
                groups: Vec::new(),
                trace,
            });
        };

        // Group 0 is the overall match and always present on a hit.
        let matched = captures.get(0).map(|m| MatchSpan {
            text: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        });
        if let Some(span) = &matched {
            trace.push(format!(
                "Found a match '{}' spanning indices {}..{}",
                span.text, span.start, span.end
            ));
        }

        let mut groups = Vec::new();
        for number in 1..captures.len() {
            if let Some(group) = captures.get(number) {
                trace.push(format!(
                    "Group {} captured '{}' at indices {}..{}",
                    number,
                    group.as_str(),
                    group.start(),
                    group.end()
                ));
                groups.push(GroupMatch {
                    number,
                    text: group.as_str().to_string(),
                    start: group.start(),
                    end: group.end(),
                });
            }
        }
        if groups.is_empty() {
            trace.push("The pattern captured no groups in this match".to_string());
        }

        Ok(MatchReport {
            matched,
            groups,
            trace,
        })
    }
}

/// Splits a pattern into descriptive components. A quantifier attaches to
/// the preceding component when one exists and is not itself a quantifier.
pub fn tokenize(pattern: &str) -> Vec<PatternComponent> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut components: Vec<PatternComponent> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                if i + 1 < chars.len() {
                    let next = chars[i + 1];
                    let escape = format!("\\{}", next);
                    if "dwsDSWbBAzZ".contains(next) {
                        components.push(PatternComponent::Metacharacter(escape));
                    } else if next.is_ascii_digit() {
                        components.push(PatternComponent::Backreference(escape));
                    } else {
                        components.push(PatternComponent::Literal(escape));
                    }
                    i += 2;
                } else {
                    // Trailing backslash
                    components.push(PatternComponent::Literal("\\".to_string()));
                    i += 1;
                }
            }
            '.' => {
                components.push(PatternComponent::Dot);
                i += 1;
            }
            '*' | '+' | '?' => {
                attach_quantifier(&mut components, chars[i].to_string());
                i += 1;
            }
            '{' => match chars[i..].iter().position(|&c| c == '}') {
                Some(offset) => {
                    let content: String = chars[i..=i + offset].iter().collect();
                    attach_quantifier(&mut components, content);
                    i += offset + 1;
                }
                None => {
                    components.push(PatternComponent::Literal("{".to_string()));
                    i += 1;
                }
            },
            '[' => match chars[i..].iter().position(|&c| c == ']') {
                Some(offset) => {
                    let content: String = chars[i..=i + offset].iter().collect();
                    components.push(PatternComponent::CharSet(content));
                    i += offset + 1;
                }
                None => {
                    components.push(PatternComponent::Literal("[".to_string()));
                    i += 1;
                }
            },
            '(' => {
                let mut depth = 1;
                let mut j = i + 1;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    j += 1;
                }
                if depth == 0 {
                    let content: String = chars[i..j].iter().collect();
                    components.push(PatternComponent::Group(content));
                    i = j;
                } else {
                    components.push(PatternComponent::Literal("(".to_string()));
                    i += 1;
                }
            }
            '|' => {
                components.push(PatternComponent::Alternation);
                i += 1;
            }
            '^' | '$' => {
                components.push(PatternComponent::Anchor(chars[i]));
                i += 1;
            }
            other => {
                components.push(PatternComponent::Literal(other.to_string()));
                i += 1;
            }
        }
    }

    components
}

fn attach_quantifier(components: &mut Vec<PatternComponent>, quantifier: String) {
    match components.last() {
        Some(PatternComponent::Quantifier(_)) | Some(PatternComponent::Quantified(..)) | None => {
            // Nothing sensible to attach to (e.g. "*abc")
            components.push(PatternComponent::Quantifier(quantifier));
        }
        Some(_) => {
            if let Some(previous) = components.pop() {
                components.push(PatternComponent::Quantified(Box::new(previous), quantifier));
            }
        }
    }
}

fn explain_quantifier(quantifier: &str) -> String {
    match quantifier {
        "*" => "matches ZERO or more repetitions of the preceding element (greedy)".to_string(),
        "+" => "matches ONE or more repetitions of the preceding element (greedy)".to_string(),
        "?" => "matches ZERO or ONE repetition, making the preceding element optional".to_string(),
        braced if braced.starts_with('{') && braced.ends_with('}') => {
            let content = &braced[1..braced.len() - 1];
            match content.split_once(',') {
                Some((min, "")) => {
                    format!("matches {} or more repetitions of the preceding element", min)
                }
                Some((min, max)) => format!(
                    "matches between {} and {} repetitions of the preceding element",
                    min, max
                ),
                None => format!(
                    "matches exactly {} repetitions of the preceding element",
                    content
                ),
            }
        }
        other => format!("quantifier '{}'", other),
    }
}

/// Produces the descriptive text for one component.
pub fn explain(component: &PatternComponent) -> String {
    match component {
        PatternComponent::Literal(text) => {
            format!("Literal '{}': matches the character '{}' exactly", text, text)
        }
        PatternComponent::Metacharacter(text) => match METACHARACTER_DESCRIPTIONS.get(text.as_str())
        {
            Some(description) => format!("Metacharacter '{}': {}", text, description),
            None => format!("Metacharacter '{}'", text),
        },
        PatternComponent::Backreference(text) => format!(
            "Backreference '{}': matches the exact text previously captured by group {}",
            text,
            &text[1..]
        ),
        PatternComponent::Dot => {
            "Dot '.': matches any single character except a newline".to_string()
        }
        PatternComponent::Quantifier(quantifier) => format!(
            "Dangling quantifier '{}': {}",
            quantifier,
            explain_quantifier(quantifier)
        ),
        PatternComponent::Quantified(inner, quantifier) => format!(
            "{}; quantified with '{}': {}",
            explain(inner),
            quantifier,
            explain_quantifier(quantifier)
        ),
        PatternComponent::CharSet(set) => {
            if set.starts_with("[^") {
                format!(
                    "Negated character set '{}': matches any character NOT listed in the brackets",
                    set
                )
            } else {
                format!(
                    "Character set '{}': matches any one character listed in the brackets",
                    set
                )
            }
        }
        PatternComponent::Group(group) => format!(
            "Group '{}': encloses a subexpression and captures the text it matches",
            group
        ),
        PatternComponent::Alternation => {
            "Alternation '|': matches either the expression on its left or the one on its right"
                .to_string()
        }
        PatternComponent::Anchor(anchor) => match anchor {
            '^' => "Anchor '^': matches at the start of the input (or line)".to_string(),
            '$' => "Anchor '$': matches at the end of the input (or line)".to_string(),
            other => format!("Anchor '{}'", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_literals_and_metacharacters() {
        let components = tokenize(r"a\d\.");
        assert_eq!(
            components,
            vec![
                PatternComponent::Literal("a".to_string()),
                PatternComponent::Metacharacter(r"\d".to_string()),
                PatternComponent::Literal(r"\.".to_string()),
            ]
        );
    }

    #[test]
    fn test_quantifier_attaches_to_previous() {
        let components = tokenize("ab*");
        assert_eq!(
            components,
            vec![
                PatternComponent::Literal("a".to_string()),
                PatternComponent::Quantified(
                    Box::new(PatternComponent::Literal("b".to_string())),
                    "*".to_string()
                ),
            ]
        );

        // A quantifier with nothing before it stands alone.
        let components = tokenize("*a");
        assert_eq!(
            components[0],
            PatternComponent::Quantifier("*".to_string())
        );
    }

    #[test]
    fn test_brace_quantifier() {
        let components = tokenize("a{2,3}");
        assert_eq!(
            components,
            vec![PatternComponent::Quantified(
                Box::new(PatternComponent::Literal("a".to_string())),
                "{2,3}".to_string()
            )]
        );
    }

    #[test]
    fn test_char_set_group_alternation_anchors() {
        let components = tokenize("^[a-z]+(foo|bar)$");
        assert_eq!(
            components,
            vec![
                PatternComponent::Anchor('^'),
                PatternComponent::Quantified(
                    Box::new(PatternComponent::CharSet("[a-z]".to_string())),
                    "+".to_string()
                ),
                PatternComponent::Group("(foo|bar)".to_string()),
                PatternComponent::Anchor('$'),
            ]
        );
    }

    #[test]
    fn test_nested_group_scanning() {
        let components = tokenize("((a)b)c");
        assert_eq!(
            components,
            vec![
                PatternComponent::Group("((a)b)".to_string()),
                PatternComponent::Literal("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_constructs_degrade_to_literals() {
        assert_eq!(
            tokenize("[ab"),
            vec![
                PatternComponent::Literal("[".to_string()),
                PatternComponent::Literal("a".to_string()),
                PatternComponent::Literal("b".to_string()),
            ]
        );
        assert_eq!(
            tokenize("(a"),
            vec![
                PatternComponent::Literal("(".to_string()),
                PatternComponent::Literal("a".to_string()),
            ]
        );
        assert_eq!(tokenize("a{2")[1], PatternComponent::Literal("{".to_string()));
        assert_eq!(tokenize("\\"), vec![PatternComponent::Literal("\\".to_string())]);
    }

    #[test]
    fn test_explanations_cover_all_components() {
        let explainer = RegexExplainer::new(r"^a+\d|[xy].$");
        let explanations = explainer.explanations();
        assert_eq!(explanations.len(), explainer.components().len());
        assert!(explanations.iter().all(|line| !line.is_empty()));
        assert!(explanations[0].contains("start of the input"));
    }

    #[test]
    fn test_run_reports_match_and_groups() {
        let explainer = RegexExplainer::new(r"(\d+)-(\d+)");
        let report = explainer.run("order 12-34 shipped").unwrap();

        let span = report.matched.unwrap();
        assert_eq!(span.text, "12-34");
        assert_eq!(span.start, 6);
        assert_eq!(span.end, 11);

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].text, "12");
        assert_eq!(report.groups[1].text, "34");
        assert!(report.trace.len() >= 3);
    }

    #[test]
    fn test_run_reports_no_match() {
        let explainer = RegexExplainer::new("xyz");
        let report = explainer.run("abc").unwrap();
        assert_eq!(report.matched, None);
        assert!(report.groups.is_empty());
        assert!(report.trace.last().unwrap().contains("No match"));
    }

    #[test]
    fn test_run_rejects_invalid_pattern() {
        let explainer = RegexExplainer::new("a(");
        assert!(matches!(
            explainer.run("aaa"),
            Err(SimulatorError::InvalidDefinition(_))
        ));
    }
}
