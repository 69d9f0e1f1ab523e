// JWT claims structures

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims carried by every token: issue time, expiry and the caller's payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Application payload, e.g. `{"id": 7}`
    pub data: Value,
}

impl Claims {
    /// Claims issued now, expiring `ttl_secs` later
    pub fn new(data: Value, ttl_secs: i64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            iat,
            exp: iat + ttl_secs,
            data,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_follows_ttl() {
        let claims = Claims::new(json!({ "id": 1 }), 3600);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wire_shape() {
        let claims = Claims {
            iat: 10,
            exp: 20,
            data: json!({ "id": 3 }),
        };
        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            json!({ "iat": 10, "exp": 20, "data": { "id": 3 } })
        );
    }
}
