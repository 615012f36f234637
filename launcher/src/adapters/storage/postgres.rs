//! PostgreSQL storage backend with runtime queries

use crate::config::StorageConfig;
use crate::core::{
    InfluencerLaunch, LaunchError, LaunchEvent, LaunchResult, LaunchStore, Pledge, PledgeId, PoolBootstrapRecord,
    StorageError,
};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const LAUNCH_COLUMNS: &str = r#"
    influencer, influencer_name, token_name, token_symbol,
    threshold_eth::text AS threshold_eth, threshold_usdc::text AS threshold_usdc,
    total_pledged_eth::text AS total_pledged_eth, total_pledged_usdc::text AS total_pledged_usdc,
    pledger_count, status, approved_at, approved_by, token_deployment_tx,
    token_address, pool_address, launched_at, version, created_at, updated_at
"#;

const PLEDGE_COLUMNS: &str = r#"
    id, influencer, pledger, amount::text AS amount, currency, tx_hash,
    created_at, withdrawn, withdrawn_at
"#;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(config: &StorageConfig) -> LaunchResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
            info!("Database migrations applied");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn write_launch(
        tx: &mut Transaction<'_, Postgres>,
        launch: &InfluencerLaunch,
        expected_version: u64,
    ) -> LaunchResult<()> {
        let query = r#"
            UPDATE launches SET
                influencer_name = $2,
                token_name = $3,
                token_symbol = $4,
                threshold_eth = $5::numeric,
                threshold_usdc = $6::numeric,
                total_pledged_eth = $7::numeric,
                total_pledged_usdc = $8::numeric,
                pledger_count = $9,
                status = $10,
                approved_at = $11,
                approved_by = $12,
                token_deployment_tx = $13,
                token_address = $14,
                pool_address = $15,
                launched_at = $16,
                version = $17,
                updated_at = $18
            WHERE influencer = $1 AND version = $19
        "#;

        let result = sqlx::query(query)
            .bind(hex_address(&launch.influencer))
            .bind(&launch.influencer_name)
            .bind(&launch.token_name)
            .bind(&launch.token_symbol)
            .bind(launch.threshold_eth.to_string())
            .bind(launch.threshold_usdc.to_string())
            .bind(launch.total_pledged_eth.to_string())
            .bind(launch.total_pledged_usdc.to_string())
            .bind(to_i64(launch.pledger_count)?)
            .bind(launch.status.as_str())
            .bind(launch.approved_at)
            .bind(launch.approved_by.as_ref().map(hex_address))
            .bind(launch.token_deployment_tx.as_ref().map(hex_hash))
            .bind(launch.token_address.as_ref().map(hex_address))
            .bind(launch.pool_address.as_ref().map(hex_address))
            .bind(launch.launched_at)
            .bind(to_i64(launch.version)?)
            .bind(launch.updated_at)
            .bind(to_i64(expected_version)?)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LaunchError::VersionConflict(launch.influencer));
        }
        Ok(())
    }

    async fn fetch_pledges(&self, column: &str, address: &Address) -> LaunchResult<Vec<Pledge>> {
        let query = format!(
            "SELECT {} FROM pledges WHERE {} = $1 ORDER BY created_at ASC",
            PLEDGE_COLUMNS, column
        );
        let rows = sqlx::query(&query)
            .bind(hex_address(address))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(pledge_from_row).collect()
    }
}

#[async_trait]
impl LaunchStore for PostgresStore {
    async fn insert_launch(&self, launch: &InfluencerLaunch) -> LaunchResult<()> {
        let query = r#"
            INSERT INTO launches (
                influencer, influencer_name, token_name, token_symbol,
                threshold_eth, threshold_usdc, total_pledged_eth, total_pledged_usdc,
                pledger_count, status, version, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5::numeric, $6::numeric, $7::numeric, $8::numeric,
                $9, $10, $11, $12, $13
            )
            ON CONFLICT (influencer) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(hex_address(&launch.influencer))
            .bind(&launch.influencer_name)
            .bind(&launch.token_name)
            .bind(&launch.token_symbol)
            .bind(launch.threshold_eth.to_string())
            .bind(launch.threshold_usdc.to_string())
            .bind(launch.total_pledged_eth.to_string())
            .bind(launch.total_pledged_usdc.to_string())
            .bind(to_i64(launch.pledger_count)?)
            .bind(launch.status.as_str())
            .bind(to_i64(launch.version)?)
            .bind(launch.created_at)
            .bind(launch.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LaunchError::AlreadyRegistered(launch.influencer));
        }
        Ok(())
    }

    async fn get_launch(&self, influencer: &Address) -> LaunchResult<Option<InfluencerLaunch>> {
        let query = format!("SELECT {} FROM launches WHERE influencer = $1", LAUNCH_COLUMNS);
        let row = sqlx::query(&query)
            .bind(hex_address(influencer))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(launch_from_row).transpose()
    }

    async fn list_launches(&self) -> LaunchResult<Vec<InfluencerLaunch>> {
        let query = format!("SELECT {} FROM launches ORDER BY created_at ASC", LAUNCH_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(launch_from_row).collect()
    }

    async fn update_launch(&self, launch: &InfluencerLaunch, expected_version: u64) -> LaunchResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::write_launch(&mut tx, launch, expected_version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_pledge(
        &self,
        launch: &InfluencerLaunch,
        expected_version: u64,
        pledge: &Pledge,
    ) -> LaunchResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::write_launch(&mut tx, launch, expected_version).await?;

        let query = r#"
            INSERT INTO pledges (
                id, influencer, pledger, amount, currency, tx_hash,
                created_at, withdrawn, withdrawn_at
            ) VALUES ($1, $2, $3, $4::numeric, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                withdrawn = EXCLUDED.withdrawn,
                withdrawn_at = EXCLUDED.withdrawn_at
        "#;

        sqlx::query(query)
            .bind(pledge.id.0)
            .bind(hex_address(&pledge.influencer))
            .bind(hex_address(&pledge.pledger))
            .bind(pledge.amount.to_string())
            .bind(pledge.currency.as_str())
            .bind(pledge.tx_hash.as_ref().map(hex_hash))
            .bind(pledge.created_at)
            .bind(pledge.withdrawn)
            .bind(pledge.withdrawn_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_pledge(&self, id: &PledgeId) -> LaunchResult<Option<Pledge>> {
        let query = format!("SELECT {} FROM pledges WHERE id = $1", PLEDGE_COLUMNS);
        let row = sqlx::query(&query).bind(id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(pledge_from_row).transpose()
    }

    async fn pledge_by_tx(&self, tx_hash: &B256) -> LaunchResult<Option<Pledge>> {
        let query = format!("SELECT {} FROM pledges WHERE tx_hash = $1", PLEDGE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(hex_hash(tx_hash))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(pledge_from_row).transpose()
    }

    async fn pledges_for(&self, influencer: &Address) -> LaunchResult<Vec<Pledge>> {
        self.fetch_pledges("influencer", influencer).await
    }

    async fn pledges_by(&self, pledger: &Address) -> LaunchResult<Vec<Pledge>> {
        self.fetch_pledges("pledger", pledger).await
    }

    async fn has_pledged(&self, influencer: &Address, pledger: &Address) -> LaunchResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM pledges WHERE influencer = $1 AND pledger = $2) AS found")
            .bind(hex_address(influencer))
            .bind(hex_address(pledger))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("found")?)
    }

    async fn get_bootstrap(&self, influencer: &Address) -> LaunchResult<Option<PoolBootstrapRecord>> {
        let row = sqlx::query("SELECT record FROM pool_bootstraps WHERE influencer = $1")
            .bind(hex_address(influencer))
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let Json(record): Json<PoolBootstrapRecord> = row.try_get("record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn save_bootstrap(&self, record: &PoolBootstrapRecord) -> LaunchResult<()> {
        let query = r#"
            INSERT INTO pool_bootstraps (influencer, step, record, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (influencer) DO UPDATE SET
                step = EXCLUDED.step,
                record = EXCLUDED.record,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(hex_address(&record.influencer))
            .bind(record.step.as_str())
            .bind(Json(record))
            .bind(record.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_event(&self, event: &LaunchEvent) -> LaunchResult<()> {
        let query = r#"
            INSERT INTO launch_events (id, influencer, kind, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(event.id)
            .bind(hex_address(&event.influencer))
            .bind(event.kind.as_str())
            .bind(Json(&event.payload))
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn events_for(&self, influencer: &Address) -> LaunchResult<Vec<LaunchEvent>> {
        let rows = sqlx::query(
            "SELECT id, influencer, kind, payload, created_at FROM launch_events WHERE influencer = $1 ORDER BY created_at ASC",
        )
        .bind(hex_address(influencer))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> LaunchResult<LaunchEvent> {
                let kind: String = row.try_get("kind")?;
                let Json(payload): Json<serde_json::Value> = row.try_get("payload")?;
                Ok(LaunchEvent {
                    id: row.try_get("id")?,
                    influencer: parse_column(row, "influencer")?,
                    kind: kind.parse().map_err(StorageError::Corrupt)?,
                    payload,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> LaunchResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn launch_from_row(row: &PgRow) -> LaunchResult<InfluencerLaunch> {
    let status: String = row.try_get("status")?;
    Ok(InfluencerLaunch {
        influencer: parse_column(row, "influencer")?,
        influencer_name: row.try_get("influencer_name")?,
        token_name: row.try_get("token_name")?,
        token_symbol: row.try_get("token_symbol")?,
        threshold_eth: parse_column(row, "threshold_eth")?,
        threshold_usdc: parse_column(row, "threshold_usdc")?,
        total_pledged_eth: parse_column(row, "total_pledged_eth")?,
        total_pledged_usdc: parse_column(row, "total_pledged_usdc")?,
        pledger_count: to_u64(row.try_get("pledger_count")?)?,
        status: status.parse().map_err(|e| corrupt("status", e))?,
        approved_at: row.try_get::<Option<DateTime<Utc>>, _>("approved_at")?,
        approved_by: parse_optional(row, "approved_by")?,
        token_deployment_tx: parse_optional::<B256>(row, "token_deployment_tx")?,
        token_address: parse_optional(row, "token_address")?,
        pool_address: parse_optional(row, "pool_address")?,
        launched_at: row.try_get("launched_at")?,
        version: to_u64(row.try_get("version")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn pledge_from_row(row: &PgRow) -> LaunchResult<Pledge> {
    let currency: String = row.try_get("currency")?;
    Ok(Pledge {
        id: PledgeId(row.try_get("id")?),
        influencer: parse_column(row, "influencer")?,
        pledger: parse_column(row, "pledger")?,
        amount: parse_column(row, "amount")?,
        currency: currency.parse().map_err(|e| corrupt("currency", e))?,
        tx_hash: parse_optional(row, "tx_hash")?,
        created_at: row.try_get("created_at")?,
        withdrawn: row.try_get("withdrawn")?,
        withdrawn_at: row.try_get("withdrawn_at")?,
    })
}

fn parse_column<T>(row: &PgRow, column: &'static str) -> LaunchResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| corrupt(column, e))
}

fn parse_optional<T>(row: &PgRow, column: &'static str) -> LaunchResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| value.parse().map_err(|e| corrupt(column, e)))
        .transpose()
}

fn corrupt(column: &str, err: impl std::fmt::Display) -> LaunchError {
    LaunchError::Storage(StorageError::Corrupt(format!("{}: {}", column, err)))
}

fn hex_address(address: &Address) -> String {
    format!("{:#x}", address)
}

fn hex_hash(hash: &B256) -> String {
    format!("{:#x}", hash)
}

fn to_i64(value: u64) -> LaunchResult<i64> {
    i64::try_from(value).map_err(|_| corrupt("counter", format!("{} exceeds BIGINT", value)))
}

fn to_u64(value: i64) -> LaunchResult<u64> {
    u64::try_from(value).map_err(|_| corrupt("counter", format!("{} is negative", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_stored_lowercase() {
        let address: Address = "0x4752ba5DBc23f44D87826276BF6Fd6b1C372aD24".parse().unwrap();
        assert_eq!(hex_address(&address), "0x4752ba5dbc23f44d87826276bf6fd6b1c372ad24");
        assert_eq!(hex_address(&address).parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_counter_conversion_bounds() {
        assert_eq!(to_i64(42).unwrap(), 42);
        assert!(to_i64(u64::MAX).is_err());
        assert!(to_u64(-1).is_err());
    }
}
