use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use sqlx::query::QueryAs;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use crate::domain::device::models::device::{
    Device, DeviceId, DeviceState, NewDevice, RepositoryError,
};
use crate::domain::device::ports::DeviceRepository;

const SELECT_ALL: &str =
    "SELECT id, name, brand, state, creation_time FROM devices ORDER BY id";
const SELECT_BY_ID: &str =
    "SELECT id, name, brand, state, creation_time FROM devices WHERE id = $1";
const SELECT_BY_BRAND: &str =
    "SELECT id, name, brand, state, creation_time FROM devices WHERE brand = $1 ORDER BY id";
const SELECT_BY_STATE: &str =
    "SELECT id, name, brand, state, creation_time FROM devices WHERE state = $1 ORDER BY id";

#[derive(Debug, Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(url: &str, max_connections: u32) -> Result<Sqlite, anyhow::Error> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {}", url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database at {}", url))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Sqlite { pool })
    }

    async fn fetch_devices<'q>(
        &self,
        query: QueryAs<'q, sqlx::Sqlite, DeviceRow, SqliteArguments<'q>>,
        what: &str,
    ) -> Result<Vec<Device>, RepositoryError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e).context(format!("failed to fetch {}", what)))?;

        rows.into_iter()
            .map(Device::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)
    }
}

#[derive(Debug, FromRow)]
struct DeviceRow {
    id: i64,
    name: String,
    brand: String,
    state: String,
    creation_time: DateTime<Utc>,
}

impl TryFrom<DeviceRow> for Device {
    type Error = anyhow::Error;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<DeviceState>()
            .with_context(|| format!("corrupt state stored for device {}", row.id))?;

        Ok(Device::new(
            DeviceId::new(row.id),
            row.name,
            row.brand,
            state,
            row.creation_time,
        ))
    }
}

impl DeviceRepository for Sqlite {
    async fn create_device(&self, device: &NewDevice) -> Result<Device, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO devices (name, brand, state, creation_time) VALUES ($1, $2, $3, $4)",
        )
        .bind(device.name())
        .bind(device.brand())
        .bind(device.state().as_str())
        .bind(*device.creation_time())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            anyhow!(e).context(format!("failed to save device with name {:?}", device.name()))
        })?;

        let id = DeviceId::new(result.last_insert_rowid());

        Ok(device.clone().into_device(id))
    }

    async fn update_device(&self, device: &Device) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE devices SET name = $1, brand = $2, state = $3 WHERE id = $4")
                .bind(device.name())
                .bind(device.brand())
                .bind(device.state().as_str())
                .bind(device.id().into_inner())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    anyhow!(e).context(format!("failed to update device {}", device.id()))
                })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_all_devices(&self) -> Result<Vec<Device>, RepositoryError> {
        self.fetch_devices(sqlx::query_as(SELECT_ALL), "devices").await
    }

    async fn get_device_by_id(&self, id: DeviceId) -> Result<Device, RepositoryError> {
        let row: Option<DeviceRow> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e).context(format!("failed to fetch device {}", id)))?;

        match row {
            Some(row) => Ok(Device::try_from(row)?),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn get_devices_by_brand(&self, brand: &str) -> Result<Vec<Device>, RepositoryError> {
        let query = sqlx::query_as(SELECT_BY_BRAND).bind(brand);

        self.fetch_devices(query, "devices by brand").await
    }

    async fn get_devices_by_state(
        &self,
        state: DeviceState,
    ) -> Result<Vec<Device>, RepositoryError> {
        let query = sqlx::query_as(SELECT_BY_STATE).bind(state.as_str());

        self.fetch_devices(query, "devices by state").await
    }

    async fn delete_device(&self, id: DeviceId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e).context(format!("failed to delete device {}", id)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
