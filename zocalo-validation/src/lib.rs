//! Request payload validation for zocalo.
//!
//! A [`RuleSet`] maps field names to ordered [`Rule`]s and checks a JSON
//! object against them. Failures are collected per field as
//! [`ValidationErrors`], which convert into [`zocalo_core::Error::Validation`]
//! and render as a 400 response.
//!
//! ```
//! use zocalo_validation::RuleSet;
//! use serde_json::json;
//!
//! let rules = RuleSet::new()
//!     .field("nombre", &["required", "max:100"])
//!     .unwrap()
//!     .field("email", &["required", "email"])
//!     .unwrap();
//!
//! let ok = json!({ "nombre": "Ana", "email": "ana@example.com" });
//! assert!(rules.validate_value(&ok).is_ok());
//!
//! let bad = json!({ "nombre": "Ana", "email": "ana" });
//! let errors = rules.validate_value(&bad).unwrap_err();
//! assert_eq!(
//!     errors.get("email").unwrap(),
//!     ["El campo email debe ser un email válido"]
//! );
//! ```

pub mod errors;
pub mod rules;
pub mod validator;
pub mod validators;

pub use errors::{ValidationError, ValidationErrors};
pub use rules::{Rule, RuleParseError};
pub use validator::RuleSet;
