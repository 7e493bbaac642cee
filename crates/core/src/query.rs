//! Statement construction for the two marts.
//!
//! Statement text is assembled only from the whitelisted fragments in
//! [`crate::domain::metric`] and a validated [`AnalyticsSchema`]. Caller-controlled values
//! travel separately in [`RenderedQuery::binds`] as positional `$n` parameters.

use crate::domain::customer::AT_RISK_SEGMENT;
use crate::domain::metric::{ChannelFilter, Dimension, Metric, MetricPoint};
use crate::errors::ValidationError;
use crate::mart::AnalyticsSchema;

/// Row cap of the custom query endpoint.
pub const METRIC_ROW_LIMIT: u32 = 20;
/// Row cap of the bare risky-customers listing.
pub const RISKY_CUSTOMERS_ROW_LIMIT: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedQuery {
    pub sql: String,
    pub binds: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentQuery {
    pub segment: String,
    pub limit: Option<u32>,
}

impl SegmentQuery {
    pub fn at_risk() -> Self {
        Self { segment: AT_RISK_SEGMENT.to_string(), limit: None }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn render(&self, schema: &AnalyticsSchema) -> RenderedQuery {
        let mut sql = format!(
            "SELECT customer_name, phone_number, email, \
             CAST(frequencia AS BIGINT) AS frequencia, \
             CAST(recencia AS BIGINT) AS recencia, \
             CAST(valor AS NUMERIC) AS valor, \
             segmento_cliente \
             FROM {} \
             WHERE segmento_cliente = $1 \
             ORDER BY recencia DESC",
            schema.customer_rfm()
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        RenderedQuery { sql, binds: vec![self.segment.clone()] }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricQuery {
    pub metric: Metric,
    pub dimension: Dimension,
    pub channel: ChannelFilter,
}

impl MetricQuery {
    pub fn new(metric: Metric, dimension: Dimension, channel: ChannelFilter) -> Self {
        Self { metric, dimension, channel }
    }

    /// Resolves raw query-string values. Fails before anything touches the database.
    pub fn from_params(
        metric: Option<&str>,
        dimension: Option<&str>,
        channel: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let metric = required(metric, "metric")?.parse::<Metric>()?;
        let dimension = required(dimension, "dimension")?.parse::<Dimension>()?;

        Ok(Self::new(metric, dimension, ChannelFilter::from_param(channel)))
    }

    pub fn render(&self, schema: &AnalyticsSchema) -> RenderedQuery {
        let column = self.dimension.column_sql();
        let mut binds = Vec::new();
        let mut predicates = vec![format!("{column} IS NOT NULL")];

        if let Some(channel) = self.channel.channel() {
            binds.push(channel.to_string());
            predicates.push(format!("channel_name = ${}", binds.len()));
        }
        if self.metric.requires_delivery_time() {
            predicates.push("delivery_seconds IS NOT NULL".to_string());
        }

        let sql = format!(
            "SELECT CAST({column} AS TEXT) AS dimension, \
             COALESCE(CAST({aggregate} AS NUMERIC), 0) AS metric \
             FROM {relation} \
             WHERE {predicates} \
             GROUP BY {column} \
             ORDER BY metric DESC \
             LIMIT {METRIC_ROW_LIMIT}",
            aggregate = self.metric.aggregate_sql(),
            relation = schema.sales_performance(),
            predicates = predicates.join(" AND "),
        );

        RenderedQuery { sql, binds }
    }

    /// Applies ordering that the statement itself does not express.
    pub fn finish(&self, mut points: Vec<MetricPoint>) -> Vec<MetricPoint> {
        if self.dimension == Dimension::HourOfDay {
            sort_by_hour(&mut points);
        }
        points
    }
}

/// Ascending by hour. Labels that are not integers go last, in their original order.
pub fn sort_by_hour(points: &mut [MetricPoint]) {
    points.sort_by_key(|point| match point.dimension.trim().parse::<i64>() {
        Ok(hour) => (0, hour),
        Err(_) => (1, 0),
    });
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingParameter(name))
}
