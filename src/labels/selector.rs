//! Selector - conjunctive predicates over a label set.
//!
//! Textual grammar, comma separated, every term must hold:
//!
//! | term | holds when |
//! |---|---|
//! | `key=value`, `key==value` | key present with that value |
//! | `key!=value` | key absent, or present with a different value |
//! | `key in (a,b)` | key present with one of the values |
//! | `key notin (a,b)` | key absent, or present with none of the values |
//! | `key` | key present |
//! | `!key` | key absent |
//!
//! An ID with an empty label set is not in the index at all, so even
//! selectors made only of negative terms never return it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::{validate_key, validate_value, LabelError, Labels};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals(String),
    NotEquals(String),
    In(BTreeSet<String>),
    NotIn(BTreeSet<String>),
    Exists,
    DoesNotExist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
}

impl Requirement {
    pub fn new(key: impl Into<String>, operator: Operator) -> Result<Self, LabelError> {
        let key = key.into();
        validate_key(&key)?;
        match &operator {
            Operator::Equals(value) | Operator::NotEquals(value) => validate_value(value)?,
            Operator::In(values) | Operator::NotIn(values) => {
                if values.is_empty() {
                    return Err(LabelError::InvalidLabel(format!(
                        "set requirement on {:?} needs at least one value",
                        key
                    )));
                }
                for value in values {
                    validate_value(value)?;
                }
            }
            Operator::Exists | Operator::DoesNotExist => {}
        }
        Ok(Self { key, operator })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        let actual = labels.get(&self.key);
        match &self.operator {
            Operator::Equals(value) => actual == Some(value),
            Operator::NotEquals(value) => actual != Some(value),
            Operator::In(values) => actual.is_some_and(|v| values.contains(v)),
            Operator::NotIn(values) => !actual.is_some_and(|v| values.contains(v)),
            Operator::Exists => actual.is_some(),
            Operator::DoesNotExist => actual.is_none(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &BTreeSet<String>| {
            values.iter().map(String::as_str).collect::<Vec<_>>().join(",")
        };
        match &self.operator {
            Operator::Equals(value) => write!(f, "{}={}", self.key, value),
            Operator::NotEquals(value) => write!(f, "{}!={}", self.key, value),
            Operator::In(values) => write!(f, "{} in ({})", self.key, join(values)),
            Operator::NotIn(values) => write!(f, "{} notin ({})", self.key, join(values)),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// A conjunction of [`Requirement`]s. The empty selector matches every
/// labeled ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// The empty selector.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Add a requirement. Requirements are kept ordered by key so equal
    /// selectors print identically.
    pub fn with(mut self, requirement: Requirement) -> Self {
        let at = self
            .requirements
            .partition_point(|existing| existing.key <= requirement.key);
        self.requirements.insert(at, requirement);
        self
    }

    pub fn equals(self, key: &str, value: &str) -> Result<Self, LabelError> {
        Ok(self.with(Requirement::new(key, Operator::Equals(value.to_string()))?))
    }

    pub fn not_equals(self, key: &str, value: &str) -> Result<Self, LabelError> {
        Ok(self.with(Requirement::new(key, Operator::NotEquals(value.to_string()))?))
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", requirement)?;
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = LabelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| LabelError::InvalidSelector {
            selector: input.to_string(),
            reason,
        };

        let mut selector = Selector::everything();
        for term in split_terms(input).map_err(invalid)? {
            let requirement = parse_term(term).map_err(|e| match e {
                LabelError::InvalidLabel(reason) => invalid(reason),
                other => other,
            })?;
            selector = selector.with(requirement);
        }
        Ok(selector)
    }
}

/// Split on commas that are not inside a parenthesised value set.
fn split_terms(input: &str) -> Result<Vec<&str>, String> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            ',' if depth == 0 => {
                terms.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    terms.push(input[start..].trim());

    if terms.len() == 1 && terms[0].is_empty() {
        return Ok(Vec::new());
    }
    if terms.iter().any(|t| t.is_empty()) {
        return Err("empty term".to_string());
    }
    Ok(terms)
}

fn parse_term(term: &str) -> Result<Requirement, LabelError> {
    if let Some(open) = term.find('(') {
        let head: Vec<&str> = term[..open].split_whitespace().collect();
        let body = term[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| LabelError::InvalidLabel(format!("{:?} must end with ')'", term)))?;
        let values: BTreeSet<String> = body.split(',').map(|v| v.trim().to_string()).collect();
        return match head.as_slice() {
            [key, "in"] => Requirement::new(*key, Operator::In(values)),
            [key, "notin"] => Requirement::new(*key, Operator::NotIn(values)),
            _ => Err(LabelError::InvalidLabel(format!(
                "{:?} is not a set requirement",
                term
            ))),
        };
    }

    if let Some(key) = term.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist);
    }
    if let Some((key, value)) = term.split_once("!=") {
        return Requirement::new(key.trim(), Operator::NotEquals(value.trim().to_string()));
    }
    if let Some((key, value)) = term.split_once("==") {
        return Requirement::new(key.trim(), Operator::Equals(value.trim().to_string()));
    }
    if let Some((key, value)) = term.split_once('=') {
        return Requirement::new(key.trim(), Operator::Equals(value.trim().to_string()));
    }
    Requirement::new(term, Operator::Exists)
}
