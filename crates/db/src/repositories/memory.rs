use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use nola_core::domain::customer::CustomerRecord;
use nola_core::domain::metric::MetricPoint;
use nola_core::query::{MetricQuery, SegmentQuery, METRIC_ROW_LIMIT};

use super::{MartRepository, RepositoryError};

/// Failure an [`InMemoryMartRepository`] reports instead of answering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectedFailure {
    SchemaMissing,
    Unavailable,
    Database,
}

/// Mart stand-in that mimics the statements' filtering, ordering and row caps and
/// records every call it receives.
#[derive(Default)]
pub struct InMemoryMartRepository {
    customers: RwLock<Vec<CustomerRecord>>,
    metric_points: RwLock<Vec<MetricPoint>>,
    failure: RwLock<Option<InjectedFailure>>,
    calls: AtomicUsize,
    segment_queries: RwLock<Vec<SegmentQuery>>,
    metric_queries: RwLock<Vec<MetricQuery>>,
}

impl InMemoryMartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_customers(&self, customers: impl IntoIterator<Item = CustomerRecord>) {
        self.customers.write().await.extend(customers);
    }

    /// Rows the sales mart "aggregates" to, whatever metric or dimension is asked for.
    pub async fn set_metric_points(&self, points: Vec<MetricPoint>) {
        *self.metric_points.write().await = points;
    }

    pub async fn fail_with(&self, failure: InjectedFailure) {
        *self.failure.write().await = Some(failure);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn segment_queries(&self) -> Vec<SegmentQuery> {
        self.segment_queries.read().await.clone()
    }

    pub async fn metric_queries(&self) -> Vec<MetricQuery> {
        self.metric_queries.read().await.clone()
    }

    async fn injected_failure(&self, relation: &str) -> Result<(), RepositoryError> {
        match *self.failure.read().await {
            None => Ok(()),
            Some(InjectedFailure::SchemaMissing) => {
                Err(RepositoryError::SchemaMissing { relation: relation.to_string() })
            }
            Some(InjectedFailure::Unavailable) => {
                Err(RepositoryError::Unavailable(sqlx::Error::PoolTimedOut))
            }
            Some(InjectedFailure::Database) => Err(RepositoryError::Database(
                sqlx::Error::Protocol(format!("injected failure reading {relation}")),
            )),
        }
    }
}

#[async_trait::async_trait]
impl MartRepository for InMemoryMartRepository {
    async fn customers_in_segment(
        &self,
        query: &SegmentQuery,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.segment_queries.write().await.push(query.clone());
        self.injected_failure("analytics.mart_customer_rfm").await?;

        let mut matching: Vec<_> = self
            .customers
            .read()
            .await
            .iter()
            .filter(|customer| customer.segment == query.segment)
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.recency.cmp(&left.recency));
        if let Some(limit) = query.limit {
            matching.truncate(limit as usize);
        }

        Ok(matching)
    }

    async fn metric_points(
        &self,
        query: &MetricQuery,
    ) -> Result<Vec<MetricPoint>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.metric_queries.write().await.push(query.clone());
        self.injected_failure("analytics.mart_sales_performance").await?;

        let mut points = self.metric_points.read().await.clone();
        points.sort_by(|left, right| right.metric.cmp(&left.metric));
        points.truncate(METRIC_ROW_LIMIT as usize);

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use nola_core::domain::customer::{CustomerRecord, AT_RISK_SEGMENT};
    use nola_core::domain::metric::{ChannelFilter, Dimension, Metric, MetricPoint};
    use nola_core::query::{MetricQuery, SegmentQuery};

    use super::{InMemoryMartRepository, InjectedFailure};
    use crate::repositories::{MartRepository, RepositoryError};

    fn customer(name: &str, segment: &str, recency: i64) -> CustomerRecord {
        CustomerRecord {
            customer_name: Some(name.to_string()),
            phone_number: None,
            email: None,
            frequency: 3,
            recency,
            monetary_value: Decimal::new(9_990, 2),
            segment: segment.to_string(),
        }
    }

    #[tokio::test]
    async fn segment_lookup_filters_orders_and_caps() {
        let repository = InMemoryMartRepository::new();
        repository
            .insert_customers([
                customer("a", AT_RISK_SEGMENT, 40),
                customer("b", "Campeões", 2),
                customer("c", AT_RISK_SEGMENT, 90),
                customer("d", AT_RISK_SEGMENT, 61),
            ])
            .await;

        let customers = repository
            .customers_in_segment(&SegmentQuery::at_risk().with_limit(2))
            .await
            .expect("lookup");

        let names: Vec<_> =
            customers.iter().filter_map(|customer| customer.customer_name.clone()).collect();
        assert_eq!(names, vec!["c", "d"]);
        assert_eq!(repository.call_count(), 1);
    }

    #[tokio::test]
    async fn metric_lookup_mimics_statement_order_and_limit() {
        let repository = InMemoryMartRepository::new();
        repository
            .set_metric_points(
                (0..30).map(|n| MetricPoint::new(n.to_string(), Decimal::from(n))).collect(),
            )
            .await;

        let points = repository
            .metric_points(&MetricQuery::new(
                Metric::TotalRevenue,
                Dimension::Product,
                ChannelFilter::Any,
            ))
            .await
            .expect("lookup");

        assert_eq!(points.len(), 20);
        assert_eq!(points[0].dimension, "29");
        assert_eq!(repository.metric_queries().await.len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_reported_after_recording_the_call() {
        let repository = InMemoryMartRepository::new();
        repository.fail_with(InjectedFailure::SchemaMissing).await;

        let result = repository.customers_in_segment(&SegmentQuery::at_risk()).await;

        assert!(matches!(result, Err(RepositoryError::SchemaMissing { .. })));
        assert_eq!(repository.call_count(), 1);
        assert_eq!(repository.segment_queries().await, vec![SegmentQuery::at_risk()]);
    }
}
