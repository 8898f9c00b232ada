//! Rule matching against a single input string.
//!
//! # Responsibilities
//! - Compile each rule as a regular expression
//! - Report whether any rule matches the input (first match wins)
//! - Distinguish "filtered" from "rule does not compile"
//!
//! # Design Decisions
//! - Unanchored search: a literal rule matches anywhere in the input
//! - No compiled-rule cache; rule sets are small and evaluated twice per request

use regex::Regex;
use thiserror::Error;

/// Errors produced while evaluating filter rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A rule string is not a valid regular expression.
    #[error("cannot compile malformed filter string")]
    MalformedFilter,
}

/// A rule that failed eager validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRule {
    /// Position of the rule in its rule set.
    pub index: usize,
    pub rule: String,
    /// Compiler message from the regex engine.
    pub message: String,
}

impl std::fmt::Display for InvalidRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule #{} {:?}: {}", self.index, self.rule, self.message)
    }
}

/// Check `input` against an ordered rule set.
///
/// Returns `Ok(true)` when the input is allowed: either no rule set is
/// configured, or none of the rules match. Returns `Ok(false)` as soon as a
/// rule matches. A rule that fails to compile stops evaluation with
/// [`FilterError::MalformedFilter`], even if a later rule would have matched.
pub fn filter(input: &str, rules: Option<&[String]>) -> Result<bool, FilterError> {
    let Some(rules) = rules else {
        return Ok(true);
    };

    for rule in rules {
        let re = Regex::new(rule).map_err(|_| FilterError::MalformedFilter)?;
        if re.is_match(input) {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Compile every rule up front and collect all failures.
pub fn validate_rules(rules: &[String]) -> Result<(), Vec<InvalidRule>> {
    let errors: Vec<InvalidRule> = rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            Regex::new(rule).err().map(|e| InvalidRule {
                index,
                rule: rule.clone(),
                message: e.to_string(),
            })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
