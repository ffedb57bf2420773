use std::{borrow::Cow, str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;
use tracing::info;

use petguide_core::types::{City, Country, NewCity, Province};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens a SQLite connection pool for the provided connection string,
    /// creating the database file when it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Opens an existing database without creating the file or changing its
    /// journal mode. Fails when the file does not exist.
    pub async fn open_existing(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(false)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        info!(stage = "storage", "database migrations applied");
        Ok(())
    }

    /// Returns a handle for reading countries.
    pub fn countries(&self) -> CountryRepository {
        CountryRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for reading provinces.
    pub fn provinces(&self) -> ProvinceRepository {
        ProvinceRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for reading and inserting cities.
    pub fn cities(&self) -> CityRepository {
        CityRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository for the `countries` table.
#[derive(Clone)]
pub struct CountryRepository {
    pool: SqlitePool,
}

impl CountryRepository {
    /// Looks up a country by its unique slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Country>, StorageError> {
        let row = sqlx::query_as::<_, CountryRow>(
            "SELECT id, name, slug FROM countries WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CountryRow::into_domain))
    }
}

/// Repository for the `provinces` table.
#[derive(Clone)]
pub struct ProvinceRepository {
    pool: SqlitePool,
}

impl ProvinceRepository {
    /// Looks up a province by slug within a single country.
    pub async fn find_by_slug(
        &self,
        country_id: i64,
        slug: &str,
    ) -> Result<Option<Province>, StorageError> {
        let row = sqlx::query_as::<_, ProvinceRow>(
            "SELECT id, name, slug, country_id FROM provinces WHERE country_id = ? AND slug = ?",
        )
        .bind(country_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProvinceRow::into_domain))
    }
}

/// Repository for the `cities` table.
#[derive(Clone)]
pub struct CityRepository {
    pool: SqlitePool,
}

impl CityRepository {
    /// Looks up a city by slug anywhere within the country, regardless of province.
    pub async fn find_by_slug(
        &self,
        country_id: i64,
        slug: &str,
    ) -> Result<Option<City>, StorageError> {
        let row = sqlx::query_as::<_, CityRow>(
            "SELECT id, name, slug, country_id, province_id, place_count \
             FROM cities WHERE country_id = ? AND slug = ?",
        )
        .bind(country_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CityRow::into_domain))
    }

    /// Inserts a city with a zero place count unless the country already has
    /// a city with the same slug. The existence check and the insert run as
    /// one statement, so no unique index is required on `cities`.
    pub async fn insert(&self, city: NewCity<'_>) -> Result<CityInsertOutcome, CityInsertError> {
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO cities (name, slug, country_id, province_id, place_count) \
             SELECT ?, ?, ?, ?, 0 \
             WHERE NOT EXISTS (SELECT 1 FROM cities WHERE country_id = ? AND slug = ?) \
             RETURNING id",
        )
        .bind(city.name)
        .bind(city.slug)
        .bind(city.country_id)
        .bind(city.province_id)
        .bind(city.country_id)
        .bind(city.slug)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(id)) => Ok(CityInsertOutcome::Inserted(id)),
            Ok(None) => Ok(CityInsertOutcome::Duplicate),
            Err(sqlx::Error::Database(db_err)) => {
                if db_err.code() == Some(Cow::Borrowed("787")) {
                    return Err(CityInsertError::MissingParent);
                }
                Err(CityInsertError::Database(sqlx::Error::Database(db_err)))
            }
            Err(err) => Err(CityInsertError::Database(err)),
        }
    }

    /// Counts the cities recorded for a country.
    pub async fn count_for_country(&self, country_id: i64) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cities WHERE country_id = ?")
            .bind(country_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

/// Result of attempting to insert into `cities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityInsertOutcome {
    Inserted(i64),
    Duplicate,
}

impl CityInsertOutcome {
    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

/// Errors that can occur while inserting a city.
#[derive(Debug, Error)]
pub enum CityInsertError {
    #[error("country or province referenced by the city does not exist")]
    MissingParent,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct CountryRow {
    id: i64,
    name: String,
    slug: String,
}

impl CountryRow {
    fn into_domain(self) -> Country {
        Country {
            id: self.id,
            name: self.name,
            slug: self.slug,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProvinceRow {
    id: i64,
    name: String,
    slug: String,
    country_id: i64,
}

impl ProvinceRow {
    fn into_domain(self) -> Province {
        Province {
            id: self.id,
            name: self.name,
            slug: self.slug,
            country_id: self.country_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CityRow {
    id: i64,
    name: String,
    slug: String,
    country_id: i64,
    province_id: i64,
    place_count: i64,
}

impl CityRow {
    fn into_domain(self) -> City {
        City {
            id: self.id,
            name: self.name,
            slug: self.slug,
            country_id: self.country_id,
            province_id: self.province_id,
            place_count: self.place_count,
        }
    }
}
