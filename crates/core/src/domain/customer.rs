use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Segment label the RFM mart assigns to customers drifting away.
pub const AT_RISK_SEGMENT: &str = "Em Risco";

/// One row of the customer RFM mart. JSON keys follow the mart's column names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "frequencia")]
    pub frequency: i64,
    #[serde(rename = "recencia")]
    pub recency: i64,
    #[serde(rename = "valor", with = "rust_decimal::serde::float")]
    pub monetary_value: Decimal,
    #[serde(rename = "segmento_cliente")]
    pub segment: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentResponse {
    pub total_count: usize,
    pub segment_name: String,
    pub customers: Vec<CustomerRecord>,
}

impl SegmentResponse {
    pub fn new(segment_name: impl Into<String>, customers: Vec<CustomerRecord>) -> Self {
        Self { total_count: customers.len(), segment_name: segment_name.into(), customers }
    }
}
