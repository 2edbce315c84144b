use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical body-composition measurement resolved from one payload
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// Calendar date in the reference timezone
    pub date: NaiveDate,
    /// Weight in kilograms, rounded to two decimals
    pub weight_kg: f64,
    /// Body fat as a fraction (0.0 - 1.0), rounded to two decimals
    pub fat_fraction: Option<f64>,
}

/// One date-keyed value for a named Exist attribute
///
/// Serializes to the Exist update shape `{"name", "date", "value"}` with the
/// date formatted as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    pub name: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Attribute names configured for the deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    pub weight: String,
    pub fat: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            weight: "weight".to_string(),
            fat: "body_fat".to_string(),
        }
    }
}

/// Bearer token for the attribute store
///
/// `Debug` is redacted so configuration dumps never print the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_update_serializes_exist_shape() {
        let update = AttributeUpdate {
            name: "weight".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 4).unwrap(),
            value: 84.59,
        };

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "weight", "date": "2025-11-04", "value": 84.59})
        );
    }

    #[test]
    fn test_api_token_debug_is_redacted() {
        let token = ApiToken::new("secret-token");
        assert_eq!(format!("{:?}", token), "ApiToken(***)");
        assert_eq!(token.expose(), "secret-token");
    }

    #[test]
    fn test_api_token_blank() {
        assert!(ApiToken::new("   ").is_blank());
        assert!(!ApiToken::new("abc").is_blank());
    }
}
