// Settings checks run after loading

use crate::{ConfigError, Result};
use std::fmt::Display;

/// Settings that can check themselves once loaded.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Collects every problem with a settings snapshot; `finish` reports them
/// together.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    problems: Vec<String>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` must hold something other than whitespace
    pub fn not_empty(mut self, key: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.problems.push(format!("{key} must not be empty"));
        }
        self
    }

    /// `key` must lie in `min..=max`
    pub fn in_range<T: PartialOrd + Display>(mut self, key: &str, value: T, min: T, max: T) -> Self {
        if value < min || value > max {
            self.problems
                .push(format!("{key}={value} is outside {min}..={max}"));
        }
        self
    }

    /// `key` must be a usable TCP port
    pub fn port(mut self, key: &str, value: u16) -> Self {
        if value == 0 {
            self.problems.push(format!("{key} must be a port between 1 and 65535"));
        }
        self
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub fn finish(self) -> Result<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(self.problems.join("; ")))
        }
    }
}
