// Rule sets and the validation pass

use crate::errors::{ValidationError, ValidationErrors};
use crate::rules::{Rule, RuleParseError};
use crate::validators;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Rules for a set of fields, plus optional message overrides.
///
/// Fields are checked in declaration order and every rule of a field runs,
/// so one field may collect several messages.
///
/// ```
/// use zocalo_validation::RuleSet;
/// use serde_json::json;
///
/// let rules = RuleSet::new()
///     .field("email", &["required", "email"])
///     .unwrap()
///     .message("email", "required", "Indica tu email");
///
/// let data = json!({ "email": "" });
/// let errors = rules.validate(data.as_object().unwrap()).unwrap_err();
/// assert_eq!(errors.get("email").unwrap(), ["Indica tu email"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
    messages: HashMap<String, HashMap<String, String>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach rules written as strings (`"required"`, `"min:3"`) to a field.
    pub fn field(mut self, name: &str, rules: &[&str]) -> Result<Self, RuleParseError> {
        let parsed = rules
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<Rule>, _>>()?;
        self.entry(name).extend(parsed);
        Ok(self)
    }

    /// Attach an already-built rule to a field.
    pub fn rule(mut self, name: &str, rule: Rule) -> Self {
        self.entry(name).push(rule);
        self
    }

    /// Replace the default message of one rule on one field.
    pub fn message(mut self, field: &str, rule: &str, message: impl Into<String>) -> Self {
        self.messages
            .entry(field.to_string())
            .or_default()
            .insert(rule.to_string(), message.into());
        self
    }

    fn entry(&mut self, name: &str) -> &mut Vec<Rule> {
        let index = match self.fields.iter().position(|(f, _)| f == name) {
            Some(index) => index,
            None => {
                self.fields.push((name.to_string(), Vec::new()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }

    pub fn rules_for(&self, field: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, rules)| rules.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn message_for(&self, field: &str, rule: &Rule) -> String {
        self.messages
            .get(field)
            .and_then(|m| m.get(rule.name()))
            .cloned()
            .unwrap_or_else(|| rule.default_message(field))
    }

    /// Check `data` against every rule.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, rules) in &self.fields {
            let value = data.get(field);
            let empty = validators::is_empty(value);

            for rule in rules {
                let failed = match (rule, value) {
                    (Rule::Required, _) => empty,
                    (_, _) if empty => false,
                    (_, None) => false,
                    (Rule::Email, Some(v)) => !validators::is_email(v),
                    (Rule::Numeric, Some(v)) => !validators::is_numeric(v),
                    (Rule::Min(n), Some(v)) => validators::char_len(v) < *n,
                    (Rule::Max(n), Some(v)) => validators::char_len(v) > *n,
                };

                if failed {
                    errors.add(ValidationError::new(
                        field.as_str(),
                        rule.name(),
                        self.message_for(field, rule),
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`validate`](Self::validate), for any JSON value. Non-objects are
    /// treated as an empty payload.
    pub fn validate_value(&self, data: &Value) -> Result<(), ValidationErrors> {
        match data {
            Value::Object(map) => self.validate(map),
            _ => self.validate(&Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(rules: &RuleSet, data: Value) -> Result<(), ValidationErrors> {
        rules.validate_value(&data)
    }

    #[test]
    fn test_required_uses_empty_semantics() {
        let rules = RuleSet::new().field("x", &["required"]).unwrap();

        for value in [json!(null), json!(""), json!("0"), json!(0), json!(false), json!([])] {
            assert!(check(&rules, json!({ "x": value })).is_err());
        }
        assert!(check(&rules, json!({})).is_err());
        assert!(check(&rules, json!({ "x": "a" })).is_ok());
        assert!(check(&rules, json!({ "x": 5 })).is_ok());
    }

    #[test]
    fn test_optional_rules_skip_empty_values() {
        let rules = RuleSet::new()
            .field("email", &["email", "min:5"])
            .unwrap()
            .field("telefono", &["numeric", "max:3"])
            .unwrap();

        assert!(check(&rules, json!({})).is_ok());
        assert!(check(&rules, json!({ "email": "", "telefono": "0" })).is_ok());
    }

    #[test]
    fn test_collects_every_failure_per_field() {
        let rules = RuleSet::new()
            .field("email", &["required", "email", "min:20"])
            .unwrap();

        let errors = check(&rules, json!({ "email": "bad" })).unwrap_err();
        assert_eq!(
            errors.get("email").unwrap(),
            [
                "El campo email debe ser un email válido",
                "El campo email debe tener al menos 20 caracteres",
            ]
        );
    }

    #[test]
    fn test_min_max_count_characters() {
        let rules = RuleSet::new()
            .field("nombre", &["min:3", "max:4"])
            .unwrap();

        assert!(check(&rules, json!({ "nombre": "ñandú" })).is_err());
        assert!(check(&rules, json!({ "nombre": "año" })).is_ok());
        assert!(check(&rules, json!({ "nombre": "ño" })).is_err());
    }

    #[test]
    fn test_numeric() {
        let rules = RuleSet::new().field("total", &["numeric"]).unwrap();

        assert!(check(&rules, json!({ "total": 12.5 })).is_ok());
        assert!(check(&rules, json!({ "total": "12.5" })).is_ok());
        let errors = check(&rules, json!({ "total": "doce" })).unwrap_err();
        assert_eq!(
            errors.get("total").unwrap(),
            ["El campo total debe ser numérico"]
        );
    }

    #[test]
    fn test_message_override_is_per_rule() {
        let rules = RuleSet::new()
            .field("password", &["required", "min:8"])
            .unwrap()
            .message("password", "min", "Contraseña muy corta");

        let errors = check(&rules, json!({ "password": "abc" })).unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["Contraseña muy corta"]);

        let errors = check(&rules, json!({})).unwrap_err();
        assert_eq!(
            errors.get("password").unwrap(),
            ["El campo password es requerido"]
        );
    }

    #[test]
    fn test_repeated_field_appends_rules() {
        let rules = RuleSet::new()
            .field("email", &["required"])
            .unwrap()
            .rule("email", Rule::Email);

        assert_eq!(
            rules.rules_for("email").unwrap(),
            [Rule::Required, Rule::Email]
        );
    }

    #[test]
    fn test_bad_rule_string_is_rejected() {
        assert!(RuleSet::new().field("x", &["required", "between:1,2"]).is_err());
    }
}
