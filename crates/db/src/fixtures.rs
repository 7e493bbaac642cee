//! Throwaway mart schemas for contract tests against a real warehouse.
//!
//! Each [`MartFixture`] lives in its own `nola_test_*` schema shaped like the dbt
//! outputs, so tests never touch `analytics` and can run side by side.

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use nola_core::domain::customer::CustomerRecord;
use nola_core::mart::{AnalyticsSchema, CUSTOMER_RFM_VIEW, SALES_PERFORMANCE_VIEW};

use crate::DbPool;

/// Environment variable naming the warehouse contract tests run against.
pub const TEST_DATABASE_URL_ENV: &str = "NOLA_TEST_DATABASE_URL";

#[derive(Clone, Debug, Default)]
pub struct SaleFixture {
    pub product_name: Option<String>,
    pub channel_name: Option<String>,
    pub store_name: Option<String>,
    pub region: Option<String>,
    pub sale_hour: Option<i32>,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub delivery_seconds: Option<i32>,
}

pub struct MartFixture {
    pub schema: AnalyticsSchema,
    pool: DbPool,
}

impl MartFixture {
    pub async fn create(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(1).connect(database_url).await?;
        let name = format!("nola_test_{}", Uuid::new_v4().simple());
        let schema = AnalyticsSchema::parse(&name)
            .map_err(|error| sqlx::Error::Configuration(Box::new(error)))?;

        sqlx::query(&format!("CREATE SCHEMA {schema}")).execute(&pool).await?;
        sqlx::query(&format!(
            "CREATE TABLE {} (
                customer_name TEXT,
                phone_number TEXT,
                email TEXT,
                frequencia INTEGER NOT NULL,
                recencia INTEGER NOT NULL,
                valor NUMERIC(14, 2) NOT NULL,
                segmento_cliente TEXT NOT NULL
            )",
            schema.customer_rfm()
        ))
        .execute(&pool)
        .await?;
        sqlx::query(&format!(
            "CREATE TABLE {} (
                sale_id BIGSERIAL PRIMARY KEY,
                product_name TEXT,
                channel_name TEXT,
                store_name TEXT,
                region TEXT,
                sale_hour INTEGER,
                total_amount NUMERIC(14, 2) NOT NULL,
                total_discount NUMERIC(14, 2) NOT NULL DEFAULT 0,
                delivery_seconds INTEGER
            )",
            schema.sales_performance()
        ))
        .execute(&pool)
        .await?;

        Ok(Self { schema, pool })
    }

    pub async fn insert_customer(&self, customer: &CustomerRecord) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "INSERT INTO {} (customer_name, phone_number, email, frequencia, recencia, valor,
             segmento_cliente)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            self.schema.customer_rfm()
        ))
        .bind(&customer.customer_name)
        .bind(&customer.phone_number)
        .bind(&customer.email)
        .bind(i32::try_from(customer.frequency).unwrap_or(i32::MAX))
        .bind(i32::try_from(customer.recency).unwrap_or(i32::MAX))
        .bind(customer.monetary_value)
        .bind(&customer.segment)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_sale(&self, sale: &SaleFixture) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "INSERT INTO {} (product_name, channel_name, store_name, region, sale_hour,
                             total_amount, total_discount, delivery_seconds)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            self.schema.sales_performance()
        ))
        .bind(&sale.product_name)
        .bind(&sale.channel_name)
        .bind(&sale.store_name)
        .bind(&sale.region)
        .bind(sale.sale_hour)
        .bind(sale.total_amount)
        .bind(sale.total_discount)
        .bind(sale.delivery_seconds)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Removes one mart, leaving the warehouse as it looks before `dbt build`.
    pub async fn drop_mart(&self, view: &str) -> Result<(), sqlx::Error> {
        let relation = match view {
            CUSTOMER_RFM_VIEW => self.schema.customer_rfm(),
            SALES_PERFORMANCE_VIEW => self.schema.sales_performance(),
            other => {
                return Err(sqlx::Error::Protocol(format!("unknown mart `{other}`")));
            }
        };
        sqlx::query(&format!("DROP TABLE {relation}")).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn teardown(self) -> Result<(), sqlx::Error> {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema)).execute(&self.pool).await?;
        self.pool.close().await;
        Ok(())
    }
}
