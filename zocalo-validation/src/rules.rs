// Rule definitions and parsing

use std::fmt;
use std::str::FromStr;

/// A single constraint that can be attached to a field.
///
/// Rules are usually written as strings (`"required"`, `"max:100"`) and
/// parsed with [`str::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Required,
    Email,
    Numeric,
    /// Minimum length in characters
    Min(usize),
    /// Maximum length in characters
    Max(usize),
}

impl Rule {
    /// Rule name as used in custom message overrides.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::Numeric => "numeric",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
        }
    }

    pub fn default_message(&self, field: &str) -> String {
        match self {
            Rule::Required => format!("El campo {} es requerido", field),
            Rule::Email => format!("El campo {} debe ser un email válido", field),
            Rule::Numeric => format!("El campo {} debe ser numérico", field),
            Rule::Min(n) => format!("El campo {} debe tener al menos {} caracteres", field, n),
            Rule::Max(n) => format!("El campo {} no puede exceder los {} caracteres", field, n),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Min(n) | Rule::Max(n) => write!(f, "{}:{}", self.name(), n),
            _ => f.write_str(self.name()),
        }
    }
}

/// Error returned when a rule string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParseError(pub String);

impl fmt::Display for RuleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid validation rule: {}", self.0)
    }
}

impl std::error::Error for RuleParseError {}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, param) = match s.split_once(':') {
            Some((name, param)) => (name.trim(), Some(param.trim())),
            None => (s.trim(), None),
        };

        let length = |param: Option<&str>| -> Result<usize, RuleParseError> {
            param
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| RuleParseError(s.to_string()))
        };

        match (name, param) {
            ("required", None) => Ok(Rule::Required),
            ("email", None) => Ok(Rule::Email),
            ("numeric", None) => Ok(Rule::Numeric),
            ("min", p) => Ok(Rule::Min(length(p)?)),
            ("max", p) => Ok(Rule::Max(length(p)?)),
            _ => Err(RuleParseError(s.to_string())),
        }
    }
}
