use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::debug;

use nola_core::domain::customer::CustomerRecord;
use nola_core::domain::metric::MetricPoint;
use nola_core::mart::AnalyticsSchema;
use nola_core::query::{MetricQuery, RenderedQuery, SegmentQuery};

use super::{MartRepository, RepositoryError};
use crate::DbPool;

pub struct PgMartRepository {
    pool: DbPool,
    schema: AnalyticsSchema,
}

/// Whether a mart relation currently resolves in the warehouse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MartStatus {
    pub relation: String,
    pub present: bool,
}

impl PgMartRepository {
    pub fn new(pool: DbPool, schema: AnalyticsSchema) -> Self {
        Self { pool, schema }
    }

    pub fn schema(&self) -> &AnalyticsSchema {
        &self.schema
    }

    /// Checks both marts without reading them, so a fresh warehouse reports which
    /// pipeline outputs are still missing.
    pub async fn mart_status(&self) -> Result<Vec<MartStatus>, RepositoryError> {
        let mut statuses = Vec::with_capacity(2);
        for relation in self.schema.relations() {
            let present: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(&relation)
                .fetch_one(&self.pool)
                .await
                .map_err(|error| RepositoryError::classify(error, &relation))?;
            statuses.push(MartStatus { relation, present });
        }
        Ok(statuses)
    }

    async fn fetch_rows(
        &self,
        rendered: &RenderedQuery,
        relation: &str,
    ) -> Result<Vec<PgRow>, RepositoryError> {
        debug!(
            event_name = "db.mart.query",
            relation = %relation,
            sql = %rendered.sql,
            bind_count = rendered.binds.len(),
            "executing mart query"
        );

        let mut statement = sqlx::query(&rendered.sql);
        for value in &rendered.binds {
            statement = statement.bind(value);
        }

        statement
            .fetch_all(&self.pool)
            .await
            .map_err(|error| RepositoryError::classify(error, relation))
    }
}

#[async_trait]
impl MartRepository for PgMartRepository {
    async fn customers_in_segment(
        &self,
        query: &SegmentQuery,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        let relation = self.schema.customer_rfm();
        let rows = self.fetch_rows(&query.render(&self.schema), &relation).await?;

        rows.iter()
            .map(customer_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|error| RepositoryError::classify(error, &relation))
    }

    async fn metric_points(
        &self,
        query: &MetricQuery,
    ) -> Result<Vec<MetricPoint>, RepositoryError> {
        let relation = self.schema.sales_performance();
        let rows = self.fetch_rows(&query.render(&self.schema), &relation).await?;

        rows.iter()
            .map(metric_point_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|error| RepositoryError::classify(error, &relation))
    }
}

fn customer_from_row(row: &PgRow) -> Result<CustomerRecord, sqlx::Error> {
    Ok(CustomerRecord {
        customer_name: row.try_get("customer_name")?,
        phone_number: row.try_get("phone_number")?,
        email: row.try_get("email")?,
        frequency: row.try_get("frequencia")?,
        recency: row.try_get("recencia")?,
        monetary_value: row.try_get::<Decimal, _>("valor")?,
        segment: row.try_get("segmento_cliente")?,
    })
}

fn metric_point_from_row(row: &PgRow) -> Result<MetricPoint, sqlx::Error> {
    Ok(MetricPoint {
        dimension: row.try_get("dimension")?,
        metric: row.try_get::<Decimal, _>("metric")?,
    })
}
