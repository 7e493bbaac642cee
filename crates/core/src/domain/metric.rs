//! Whitelisted vocabulary of the custom query endpoint.
//!
//! Callers only ever choose a display name. Each name resolves to a hardcoded SQL
//! fragment, so nothing the caller sends is written into statement text.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalRevenue,
    NumberOfSales,
    AverageTicket,
    TotalDiscount,
    AverageDeliveryTime,
}

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::TotalRevenue,
        Self::NumberOfSales,
        Self::AverageTicket,
        Self::TotalDiscount,
        Self::AverageDeliveryTime,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::TotalRevenue => "Total Revenue",
            Self::NumberOfSales => "Number of Sales",
            Self::AverageTicket => "Average Ticket",
            Self::TotalDiscount => "Total Discount",
            Self::AverageDeliveryTime => "Average Delivery Time",
        }
    }

    pub fn aggregate_sql(self) -> &'static str {
        match self {
            Self::TotalRevenue => "SUM(total_amount)",
            Self::NumberOfSales => "COUNT(*)",
            Self::AverageTicket => "AVG(total_amount)",
            Self::TotalDiscount => "SUM(total_discount)",
            // minutes
            Self::AverageDeliveryTime => "AVG(delivery_seconds) / 60.0",
        }
    }

    /// Rows without a recorded delivery must not dilute the average.
    pub fn requires_delivery_time(self) -> bool {
        matches!(self, Self::AverageDeliveryTime)
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL.into_iter().find(|metric| metric.display_name() == value).ok_or_else(|| {
            ValidationError::UnknownMetric {
                given: value.to_string(),
                expected: join_names(Self::ALL.map(Self::display_name)),
            }
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    Product,
    Channel,
    Store,
    Region,
    HourOfDay,
}

impl Dimension {
    pub const ALL: [Self; 5] =
        [Self::Product, Self::Channel, Self::Store, Self::Region, Self::HourOfDay];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Channel => "Channel",
            Self::Store => "Store",
            Self::Region => "Region",
            Self::HourOfDay => "Hour of Day",
        }
    }

    pub fn column_sql(self) -> &'static str {
        match self {
            Self::Product => "product_name",
            Self::Channel => "channel_name",
            Self::Store => "store_name",
            Self::Region => "region",
            Self::HourOfDay => "sale_hour",
        }
    }
}

impl FromStr for Dimension {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL.into_iter().find(|dimension| dimension.display_name() == value).ok_or_else(
            || ValidationError::UnknownDimension {
                given: value.to_string(),
                expected: join_names(Self::ALL.map(Self::display_name)),
            },
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Optional restriction to a single sales channel.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    #[default]
    Any,
    Only(String),
}

impl ChannelFilter {
    /// Values the frontend sends to mean "every channel".
    pub const ALL_SENTINELS: [&'static str; 2] = ["Todos", "All"];

    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Any,
            Some(value)
                if Self::ALL_SENTINELS
                    .iter()
                    .any(|sentinel| sentinel.eq_ignore_ascii_case(value)) =>
            {
                Self::Any
            }
            Some(value) => Self::Only(value.to_string()),
        }
    }

    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Only(channel) => Some(channel),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub dimension: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub metric: Decimal,
}

impl MetricPoint {
    pub fn new(dimension: impl Into<String>, metric: Decimal) -> Self {
        Self { dimension: dimension.into(), metric }
    }
}

fn join_names<const N: usize>(names: [&'static str; N]) -> String {
    names.join(", ")
}
