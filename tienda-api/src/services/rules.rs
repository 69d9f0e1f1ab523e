//! Validation tables, one per service action.

use once_cell::sync::Lazy;
use zocalo_validation::{Rule, RuleSet};

use Rule::{Email, Max, Min, Numeric, Required};

fn table(fields: &[(&str, &[Rule])]) -> RuleSet {
    fields.iter().fold(RuleSet::new(), |set, (field, rules)| {
        rules.iter().fold(set, |set, rule| set.rule(field, *rule))
    })
}

pub static LOGIN: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("email", &[Required, Email]),
        ("password", &[Required, Min(3), Max(50)]),
    ])
});

pub static USUARIO_READ: Lazy<RuleSet> =
    Lazy::new(|| table(&[("id_usuario", &[Required, Numeric])]));

pub static USUARIO_CREATE: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("cedula", &[Required, Numeric]),
        ("nombre", &[Required, Min(3), Max(50)]),
        ("apellidos", &[Required, Min(3), Max(50)]),
        ("email", &[Required, Email]),
        ("password", &[Required, Min(6), Max(50)]),
        ("role", &[Required]),
        ("status", &[Required]),
    ])
});

pub static USUARIO_UPDATE: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("id_usuario", &[Required, Numeric]),
        ("cedula", &[Numeric]),
        ("email", &[Email]),
        ("nombre", &[Min(3), Max(50)]),
        ("apellidos", &[Min(3), Max(50)]),
        ("password", &[Min(6), Max(50)]),
    ])
});

pub static USUARIO_DELETE: Lazy<RuleSet> = Lazy::new(|| USUARIO_READ.clone());

pub static CLIENTE_CREATE: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("cedula", &[Required, Numeric]),
        ("nombre", &[Required, Min(3), Max(50)]),
        ("apellidos", &[Required, Min(3), Max(50)]),
        ("direccion", &[Required]),
        ("barrio", &[Required]),
        ("telefono", &[Required, Numeric]),
        ("email", &[Required, Email]),
        ("estado", &[Required]),
    ])
});

pub static CLIENTE_SEARCH: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("nombre", &[Min(3), Max(50)]),
        ("apellidos", &[Min(3), Max(50)]),
        ("cedula", &[Numeric]),
        ("telefono", &[Numeric]),
    ])
});

pub static CLIENTE_READ: Lazy<RuleSet> = Lazy::new(|| table(&[("id", &[Required, Numeric])]));

pub static CLIENTE_UPDATE: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("id", &[Required, Numeric]),
        ("cedula", &[Numeric]),
        ("nombre", &[Min(3), Max(50)]),
        ("apellidos", &[Min(3), Max(50)]),
        ("telefono", &[Numeric]),
        ("email", &[Email]),
    ])
});

pub static CLIENTE_DELETE: Lazy<RuleSet> = Lazy::new(|| CLIENTE_READ.clone());

pub static VENTA_READ: Lazy<RuleSet> = Lazy::new(|| table(&[("id_venta", &[Required, Numeric])]));

pub static VENTA_UPDATE: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("id_venta", &[Required, Numeric]),
        ("status", &[Required, Numeric]),
        ("id_sucursal", &[Required, Numeric]),
        ("descuento", &[Required, Numeric]),
        ("total", &[Required, Numeric]),
        ("metodo_pago", &[Required]),
        ("cajero", &[Required]),
        ("vendedor", &[Required]),
    ])
});

/// Partial updates keep the type checks but require nothing.
pub static VENTA_PATCH: Lazy<RuleSet> = Lazy::new(|| {
    table(&[
        ("id_venta", &[Required, Numeric]),
        ("status", &[Numeric]),
        ("id_sucursal", &[Numeric]),
        ("descuento", &[Numeric]),
        ("total", &[Numeric]),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_rules() {
        assert!(LOGIN.validate_value(&json!({ "email": "a@b.co", "password": "abc" })).is_ok());

        let errors = LOGIN
            .validate_value(&json!({ "email": "nope", "password": "ab" }))
            .unwrap_err();
        assert_eq!(
            errors.get("email").unwrap(),
            ["El campo email debe ser un email válido"]
        );
        assert_eq!(
            errors.get("password").unwrap(),
            ["El campo password debe tener al menos 3 caracteres"]
        );
    }

    #[test]
    fn test_table_keeps_rule_order() {
        assert_eq!(
            USUARIO_CREATE.rules_for("password").unwrap(),
            [Required, Min(6), Max(50)]
        );
        assert!(USUARIO_UPDATE.rules_for("role").is_none());
    }

    #[test]
    fn test_venta_patch_requires_only_id() {
        assert!(VENTA_PATCH.validate_value(&json!({ "id_venta": "4", "nota": "x" })).is_ok());
        assert!(VENTA_UPDATE.validate_value(&json!({ "id_venta": "4", "nota": "x" })).is_err());
    }
}
