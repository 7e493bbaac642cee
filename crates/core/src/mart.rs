//! Names of the warehouse relations the gateway reads.
//!
//! Both marts are produced by the upstream dbt project and are read-only here.

use std::fmt;

use crate::errors::ValidationError;

pub const CUSTOMER_RFM_VIEW: &str = "mart_customer_rfm";
pub const SALES_PERFORMANCE_VIEW: &str = "mart_sales_performance";

/// Schema that holds the marts. Always a plain lowercase SQL identifier, so it can be
/// written into statement text without quoting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalyticsSchema(String);

impl AnalyticsSchema {
    pub const DEFAULT: &'static str = "analytics";

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let name = raw.trim();
        let mut chars = name.chars();
        let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !valid_head || !valid_tail || name.len() > 63 {
            return Err(ValidationError::InvalidIdentifier(raw.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn customer_rfm(&self) -> String {
        self.relation(CUSTOMER_RFM_VIEW)
    }

    pub fn sales_performance(&self) -> String {
        self.relation(SALES_PERFORMANCE_VIEW)
    }

    pub fn relations(&self) -> [String; 2] {
        [self.customer_rfm(), self.sales_performance()]
    }

    fn relation(&self, view: &str) -> String {
        format!("{}.{view}", self.0)
    }
}

impl Default for AnalyticsSchema {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for AnalyticsSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::AnalyticsSchema;
    use crate::errors::ValidationError;

    #[test]
    fn default_schema_resolves_both_marts() {
        let schema = AnalyticsSchema::default();
        assert_eq!(schema.customer_rfm(), "analytics.mart_customer_rfm");
        assert_eq!(schema.sales_performance(), "analytics.mart_sales_performance");
    }

    #[test]
    fn parse_accepts_test_schemas() {
        let schema = AnalyticsSchema::parse("nola_test_0f3a").expect("valid identifier");
        assert_eq!(schema.as_str(), "nola_test_0f3a");
    }

    #[test]
    fn parse_rejects_anything_needing_quotes() {
        for raw in ["", "9analytics", "Analytics", "analytics.public", "a b", "a\"; drop"] {
            assert_eq!(
                AnalyticsSchema::parse(raw),
                Err(ValidationError::InvalidIdentifier(raw.to_string())),
                "`{raw}` should be rejected"
            );
        }
    }
}
