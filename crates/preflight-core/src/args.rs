//! Bound rule arguments
//!
//! A rule attachment binds positional and keyword arguments at definition
//! time. Rules read them back by keyword name first, then by position, so
//! either binding style works.

use crate::error::ArgumentError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments bound to a rule attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleArgs {
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
}

impl RuleArgs {
    /// Create empty argument set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    #[inline]
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Bind a keyword argument
    #[inline]
    #[must_use]
    pub fn kw(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Positional arguments in binding order
    #[inline]
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments in binding order
    #[inline]
    #[must_use]
    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }

    /// Check if no arguments are bound
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Look up a parameter by keyword, then by position
    ///
    /// `null` counts as unbound.
    #[must_use]
    pub fn get(&self, name: &str, position: usize) -> Option<&Value> {
        self.keyword
            .get(name)
            .or_else(|| self.positional.get(position))
            .filter(|v| !v.is_null())
    }

    /// Look up a required parameter
    ///
    /// # Errors
    /// Returns [`ArgumentError::Missing`] if the parameter is unbound
    pub fn require(&self, name: &str, position: usize) -> Result<&Value, ArgumentError> {
        self.get(name, position)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }

    /// Look up a required string parameter
    ///
    /// # Errors
    /// Returns error if the parameter is unbound or not a string
    pub fn require_str(&self, name: &str, position: usize) -> Result<&str, ArgumentError> {
        let value = self.require(name, position)?;
        value
            .as_str()
            .ok_or_else(|| ArgumentError::invalid(name, format!("expected string, got {value}")))
    }

    /// Look up an optional string parameter
    ///
    /// # Errors
    /// Returns error if the parameter is bound but not a string
    pub fn opt_str(&self, name: &str, position: usize) -> Result<Option<&str>, ArgumentError> {
        self.get(name, position)
            .map(|value| {
                value.as_str().ok_or_else(|| {
                    ArgumentError::invalid(name, format!("expected string, got {value}"))
                })
            })
            .transpose()
    }

    /// Look up a boolean parameter with a default
    ///
    /// # Errors
    /// Returns error if the parameter is bound but not a boolean
    pub fn bool_or(
        &self,
        name: &str,
        position: usize,
        default: bool,
    ) -> Result<bool, ArgumentError> {
        match self.get(name, position) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(ArgumentError::invalid(
                name,
                format!("expected boolean, got {other}"),
            )),
        }
    }

    /// Look up a parameter holding one name or a list of names
    ///
    /// # Errors
    /// Returns error if the parameter is unbound or holds anything else
    pub fn str_list(&self, name: &str, position: usize) -> Result<Vec<String>, ArgumentError> {
        match self.require(name, position)? {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ArgumentError::invalid(name, format!("expected string item, got {item}"))
                    })
                })
                .collect(),
            other => Err(ArgumentError::invalid(
                name,
                format!("expected string or list, got {other}"),
            )),
        }
    }

    /// Variadic positional arguments starting at `position`
    #[inline]
    #[must_use]
    pub fn rest_from(&self, position: usize) -> &[Value] {
        self.positional.get(position..).unwrap_or_default()
    }
}
