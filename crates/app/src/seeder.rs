use std::io;

use thiserror::Error;
use tracing::{info, warn};

use petguide_core::{slugify, types::NewCity, SeedCatalog};
use petguide_storage::{CityInsertError, CityInsertOutcome, Database, StorageError};

/// Whether the seeder writes rows or only reports what it would write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    Apply,
    DryRun,
}

impl SeedMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// What happened to a single city name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityOutcome {
    Added,
    Skipped,
    WouldAdd,
}

/// Per-city line of the seed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityRecord {
    pub province_slug: String,
    pub name: String,
    pub slug: String,
    pub outcome: CityOutcome,
}

/// Totals reported once the run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub mode: SeedMode,
    pub added: usize,
    pub skipped: usize,
    pub would_add: usize,
    pub missing_provinces: usize,
}

/// Progress notifications emitted while the seeder walks the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedEvent {
    Started {
        country_slug: String,
        mode: SeedMode,
    },
    ProvinceStarted {
        slug: String,
        name: String,
        cities: usize,
    },
    ProvinceMissing {
        slug: String,
    },
    City(CityRecord),
    Finished(SeedSummary),
}

/// Receives [`SeedEvent`]s as they happen.
pub trait ProgressSink {
    fn on_event(&mut self, event: &SeedEvent) -> io::Result<()>;
}

impl ProgressSink for Vec<SeedEvent> {
    fn on_event(&mut self, event: &SeedEvent) -> io::Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

/// Full outcome of a seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    pub skipped: usize,
    pub would_add: usize,
    pub missing_provinces: Vec<String>,
    pub cities: Vec<CityRecord>,
}

impl SeedReport {
    fn record(&mut self, record: CityRecord) {
        match record.outcome {
            CityOutcome::Added => self.added += 1,
            CityOutcome::Skipped => self.skipped += 1,
            CityOutcome::WouldAdd => self.would_add += 1,
        }
        self.cities.push(record);
    }

    pub fn summary(&self, mode: SeedMode) -> SeedSummary {
        SeedSummary {
            mode,
            added: self.added,
            skipped: self.skipped,
            would_add: self.would_add,
            missing_provinces: self.missing_provinces.len(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("country '{0}' not found; seed the countries table first")]
    MissingCountry(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to insert city '{name}': {source}")]
    Insert {
        name: String,
        #[source]
        source: CityInsertError,
    },
    #[error("failed to write progress output: {0}")]
    Output(#[from] io::Error),
}

/// Ensures every city of a [`SeedCatalog`] exists exactly once under its country.
///
/// Provinces and cities are visited sequentially in catalog order. A province
/// missing from the database is skipped with a warning; a missing country
/// aborts the run before anything is read or written.
pub struct CitySeeder {
    database: Database,
    mode: SeedMode,
}

impl CitySeeder {
    pub fn new(database: Database, mode: SeedMode) -> Self {
        Self { database, mode }
    }

    pub async fn run(
        &self,
        catalog: &SeedCatalog,
        sink: &mut dyn ProgressSink,
    ) -> Result<SeedReport, SeedError> {
        let country_slug = catalog.country_slug();
        let country = self
            .database
            .countries()
            .find_by_slug(country_slug)
            .await?
            .ok_or_else(|| SeedError::MissingCountry(country_slug.to_string()))?;

        info!(
            stage = "seed",
            country = %country.slug,
            country_id = country.id,
            dry_run = self.mode.is_dry_run(),
            provinces = catalog.provinces().len(),
            cities = catalog.total_cities(),
            "city seed started"
        );
        sink.on_event(&SeedEvent::Started {
            country_slug: country.slug.clone(),
            mode: self.mode,
        })?;

        let provinces = self.database.provinces();
        let cities = self.database.cities();
        let mut report = SeedReport::default();

        for entry in catalog.provinces() {
            let Some(province) = provinces
                .find_by_slug(country.id, &entry.province_slug)
                .await?
            else {
                warn!(
                    stage = "seed",
                    province = %entry.province_slug,
                    skipped_cities = entry.cities.len(),
                    "province not found, skipping its cities"
                );
                report.missing_provinces.push(entry.province_slug.clone());
                sink.on_event(&SeedEvent::ProvinceMissing {
                    slug: entry.province_slug.clone(),
                })?;
                continue;
            };

            sink.on_event(&SeedEvent::ProvinceStarted {
                slug: province.slug.clone(),
                name: province.name.clone(),
                cities: entry.cities.len(),
            })?;

            for name in &entry.cities {
                let slug = slugify(name);
                let outcome = if cities.find_by_slug(country.id, &slug).await?.is_some() {
                    CityOutcome::Skipped
                } else if self.mode.is_dry_run() {
                    CityOutcome::WouldAdd
                } else {
                    let inserted = cities
                        .insert(NewCity {
                            name,
                            slug: &slug,
                            country_id: country.id,
                            province_id: province.id,
                        })
                        .await
                        .map_err(|source| SeedError::Insert {
                            name: name.clone(),
                            source,
                        })?;
                    match inserted {
                        CityInsertOutcome::Inserted(id) => {
                            info!(stage = "seed", city = %slug, city_id = id, province = %province.slug, "city added");
                            CityOutcome::Added
                        }
                        CityInsertOutcome::Duplicate => {
                            warn!(stage = "seed", city = %slug, "city appeared concurrently, skipping");
                            CityOutcome::Skipped
                        }
                    }
                };

                let record = CityRecord {
                    province_slug: province.slug.clone(),
                    name: name.clone(),
                    slug,
                    outcome,
                };
                sink.on_event(&SeedEvent::City(record.clone()))?;
                report.record(record);
            }
        }

        let summary = report.summary(self.mode);
        info!(
            stage = "seed",
            added = summary.added,
            skipped = summary.skipped,
            would_add = summary.would_add,
            missing_provinces = summary.missing_provinces,
            dry_run = self.mode.is_dry_run(),
            "city seed finished"
        );
        sink.on_event(&SeedEvent::Finished(summary))?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petguide_core::ProvinceCities;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        sqlx_exec(
            &db,
            "INSERT INTO countries (id, name, slug) VALUES (1, 'Netherlands', 'netherlands')",
        )
        .await;
        sqlx_exec(
            &db,
            "INSERT INTO provinces (id, name, slug, country_id) VALUES \
             (10, 'Zeeland', 'zeeland', 1), (11, 'Limburg', 'limburg', 1)",
        )
        .await;
        db
    }

    async fn sqlx_exec(db: &Database, sql: &str) {
        sqlx::query(sql).execute(db.pool()).await.expect("exec fixture");
    }

    async fn city_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM cities")
            .fetch_one(db.pool())
            .await
            .expect("count cities")
    }

    fn catalog(provinces: &[(&str, &[&str])]) -> SeedCatalog {
        SeedCatalog::new(
            "netherlands",
            provinces
                .iter()
                .map(|(slug, cities)| ProvinceCities {
                    province_slug: slug.to_string(),
                    cities: cities.iter().map(|name| name.to_string()).collect(),
                })
                .collect(),
        )
        .expect("catalog")
    }

    fn zeeland() -> SeedCatalog {
        catalog(&[("zeeland", &["Middelburg", "Goes"])])
    }

    #[tokio::test]
    async fn adds_all_new_cities() {
        let db = setup_db().await;
        let mut events: Vec<SeedEvent> = Vec::new();

        let report = CitySeeder::new(db.clone(), SeedMode::Apply)
            .run(&zeeland(), &mut events)
            .await
            .expect("seed");

        assert_eq!(report.added, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.would_add, 0);

        let slugs: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM cities WHERE province_id = 10 ORDER BY id")
                .fetch_all(db.pool())
                .await
                .expect("slugs");
        assert_eq!(slugs, ["middelburg", "goes"]);

        let place_counts: Vec<i64> = sqlx::query_scalar("SELECT place_count FROM cities")
            .fetch_all(db.pool())
            .await
            .expect("place counts");
        assert!(place_counts.iter().all(|count| *count == 0));

        assert!(matches!(events.first(), Some(SeedEvent::Started { mode: SeedMode::Apply, .. })));
        assert!(matches!(
            events.last(),
            Some(SeedEvent::Finished(SeedSummary { added: 2, skipped: 0, .. }))
        ));
    }

    #[tokio::test]
    async fn skips_existing_city() {
        let db = setup_db().await;
        sqlx_exec(
            &db,
            "INSERT INTO cities (name, slug, country_id, province_id, place_count, created_at) \
             VALUES ('Goes', 'goes', 1, 10, 4, '2024-01-01T00:00:00Z')",
        )
        .await;

        let report = CitySeeder::new(db.clone(), SeedMode::Apply)
            .run(&zeeland(), &mut Vec::<SeedEvent>::new())
            .await
            .expect("seed");

        assert_eq!(report.added, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.cities[0].outcome, CityOutcome::Added);
        assert_eq!(report.cities[0].slug, "middelburg");
        assert_eq!(report.cities[1].outcome, CityOutcome::Skipped);
        assert_eq!(city_count(&db).await, 2);

        let goes_count: i64 = sqlx::query_scalar("SELECT place_count FROM cities WHERE slug = 'goes'")
            .fetch_one(db.pool())
            .await
            .expect("existing row");
        assert_eq!(goes_count, 4, "existing rows are never mutated");
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let db = setup_db().await;
        let catalog = catalog(&[
            ("zeeland", &["Middelburg", "Goes", "Vlissingen"]),
            ("limburg", &["Maastricht", "Venlo"]),
        ]);
        let seeder = CitySeeder::new(db.clone(), SeedMode::Apply);

        let first = seeder.run(&catalog, &mut Vec::<SeedEvent>::new()).await.expect("first run");
        assert_eq!(first.added, 5);
        let rows_after_first = city_count(&db).await;

        let second = seeder.run(&catalog, &mut Vec::<SeedEvent>::new()).await.expect("second run");
        assert_eq!(second.added, 0);
        assert_eq!(second.skipped, catalog.total_cities());
        assert_eq!(city_count(&db).await, rows_after_first);
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let db = setup_db().await;
        sqlx_exec(
            &db,
            "INSERT INTO cities (name, slug, country_id, province_id, place_count, created_at) \
             VALUES ('Goes', 'goes', 1, 10, 0, '2024-01-01T00:00:00Z')",
        )
        .await;
        let before = city_count(&db).await;

        let mut events: Vec<SeedEvent> = Vec::new();
        let report = CitySeeder::new(db.clone(), SeedMode::DryRun)
            .run(&zeeland(), &mut events)
            .await
            .expect("dry run");

        assert_eq!(report.added, 0);
        assert_eq!(report.would_add, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(city_count(&db).await, before);
        assert!(events.contains(&SeedEvent::City(CityRecord {
            province_slug: "zeeland".to_string(),
            name: "Middelburg".to_string(),
            slug: "middelburg".to_string(),
            outcome: CityOutcome::WouldAdd,
        })));
    }

    #[tokio::test]
    async fn missing_province_is_skipped() {
        let db = setup_db().await;
        let catalog = catalog(&[
            ("zeeland", &["Middelburg"]),
            ("friesland", &["Leeuwarden", "Sneek"]),
            ("limburg", &["Venlo"]),
        ]);

        let mut events: Vec<SeedEvent> = Vec::new();
        let report = CitySeeder::new(db.clone(), SeedMode::Apply)
            .run(&catalog, &mut events)
            .await
            .expect("seed completes");

        assert_eq!(report.added, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.missing_provinces, ["friesland"]);
        assert!(report.cities.iter().all(|city| city.province_slug != "friesland"));
        assert!(events.contains(&SeedEvent::ProvinceMissing {
            slug: "friesland".to_string()
        }));
        assert_eq!(city_count(&db).await, 2);
    }

    #[tokio::test]
    async fn missing_country_aborts_before_any_work() {
        let db = setup_db().await;
        sqlx_exec(&db, "DELETE FROM countries").await;

        let mut events: Vec<SeedEvent> = Vec::new();
        let err = CitySeeder::new(db.clone(), SeedMode::Apply)
            .run(&zeeland(), &mut events)
            .await
            .unwrap_err();

        assert!(matches!(err, SeedError::MissingCountry(slug) if slug == "netherlands"));
        assert!(events.is_empty());
        assert_eq!(city_count(&db).await, 0);
    }

    #[tokio::test]
    async fn existence_check_spans_provinces() {
        let db = setup_db().await;
        let catalog = catalog(&[("zeeland", &["Bergen"]), ("limburg", &["Bergen"])]);

        let report = CitySeeder::new(db.clone(), SeedMode::Apply)
            .run(&catalog, &mut Vec::<SeedEvent>::new())
            .await
            .expect("seed");

        assert_eq!(report.added, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.cities[1].province_slug, "limburg");
        assert_eq!(report.cities[1].outcome, CityOutcome::Skipped);
    }

    #[tokio::test]
    async fn insert_failure_reports_its_cause() {
        let db = setup_db().await;
        sqlx_exec(&db, "DROP TABLE cities").await;
        sqlx_exec(
            &db,
            "CREATE TABLE cities (id INTEGER PRIMARY KEY, name TEXT NOT NULL, slug TEXT NOT NULL, \
             country_id INTEGER NOT NULL, province_id INTEGER NOT NULL, place_count INTEGER NOT NULL, \
             discovered_at TEXT NOT NULL)",
        )
        .await;

        let err = CitySeeder::new(db, SeedMode::Apply)
            .run(&zeeland(), &mut Vec::<SeedEvent>::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SeedError::Insert { ref name, .. } if name == "Middelburg"));
        let message = err.to_string();
        assert!(message.starts_with("failed to insert city 'Middelburg': database error:"));
        assert!(message.contains("discovered_at"), "cause missing from {message:?}");
    }

    #[test]
    fn insert_error_message_includes_source() {
        let err = SeedError::Insert {
            name: "Goes".to_string(),
            source: CityInsertError::MissingParent,
        };
        assert_eq!(
            err.to_string(),
            "failed to insert city 'Goes': country or province referenced by the city does not exist"
        );
    }

    #[tokio::test]
    async fn processes_cities_in_catalog_order() {
        let db = setup_db().await;
        let catalog = catalog(&[("limburg", &["Venlo", "Maastricht"]), ("zeeland", &["Goes"])]);

        let report = CitySeeder::new(db, SeedMode::DryRun)
            .run(&catalog, &mut Vec::<SeedEvent>::new())
            .await
            .expect("seed");

        let order: Vec<&str> = report.cities.iter().map(|city| city.name.as_str()).collect();
        assert_eq!(order, ["Venlo", "Maastricht", "Goes"]);
    }
}
