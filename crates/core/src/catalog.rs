use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::slug::{is_valid_slug, slugify};

/// Slug of the country targeted by the Dutch city catalog.
pub const NETHERLANDS_SLUG: &str = "netherlands";

const DUTCH_CITIES_JSON: &str = include_str!("../data/dutch_cities.json");

/// Errors raised while loading a seed catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid country slug: {0:?}")]
    InvalidCountrySlug(String),
    #[error("invalid province slug: {0:?}")]
    InvalidProvinceSlug(String),
    #[error("province '{0}' is listed more than once")]
    DuplicateProvince(String),
    #[error("city name {name:?} in province '{province}' produces an empty slug")]
    EmptyCitySlug { province: String, name: String },
}

/// Ordered mapping of province slug to the city names seeded under it.
///
/// Provinces and cities keep the order they are declared in the source data;
/// the seeder walks them in exactly that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedCatalog {
    country_slug: String,
    provinces: Vec<ProvinceCities>,
}

/// One province entry of a [`SeedCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceCities {
    pub province_slug: String,
    pub cities: Vec<String>,
}

/// Two city names in the same catalog that map to one slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugCollision {
    pub slug: String,
    pub names: Vec<String>,
}

impl SeedCatalog {
    /// Builds and validates a catalog from already-structured data.
    pub fn new(
        country_slug: impl Into<String>,
        provinces: Vec<ProvinceCities>,
    ) -> Result<Self, CatalogError> {
        let country_slug = country_slug.into();
        if !is_valid_slug(&country_slug) {
            return Err(CatalogError::InvalidCountrySlug(country_slug));
        }

        let mut seen = HashSet::new();
        for entry in &provinces {
            if !is_valid_slug(&entry.province_slug) {
                return Err(CatalogError::InvalidProvinceSlug(
                    entry.province_slug.clone(),
                ));
            }
            if !seen.insert(entry.province_slug.as_str()) {
                return Err(CatalogError::DuplicateProvince(entry.province_slug.clone()));
            }
            if let Some(name) = entry.cities.iter().find(|name| slugify(name).is_empty()) {
                return Err(CatalogError::EmptyCitySlug {
                    province: entry.province_slug.clone(),
                    name: name.clone(),
                });
            }
        }

        Ok(Self {
            country_slug,
            provinces,
        })
    }

    /// Parses a catalog from its JSON representation.
    ///
    /// The expected shape is
    /// `{"country": "<slug>", "provinces": [{"province": "<slug>", "cities": ["Name", ...]}, ...]}`.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        let provinces = document
            .provinces
            .into_iter()
            .map(|entry| ProvinceCities {
                province_slug: entry.province,
                cities: entry.cities,
            })
            .collect();
        Self::new(document.country, provinces)
    }

    /// The built-in catalog of Dutch cities grouped by province.
    pub fn dutch_cities() -> Result<Self, CatalogError> {
        Self::from_json(DUTCH_CITIES_JSON)
    }

    pub fn country_slug(&self) -> &str {
        &self.country_slug
    }

    pub fn provinces(&self) -> &[ProvinceCities] {
        &self.provinces
    }

    /// Total number of city names across all provinces.
    pub fn total_cities(&self) -> usize {
        self.provinces.iter().map(|entry| entry.cities.len()).sum()
    }

    /// Lists slugs that more than one city name maps to, in first-seen order.
    ///
    /// Only the first such name can ever be inserted, since city existence is
    /// checked per country rather than per province.
    pub fn slug_collisions(&self) -> Vec<SlugCollision> {
        let mut order = Vec::new();
        let mut by_slug: HashMap<String, Vec<String>> = HashMap::new();

        for name in self.provinces.iter().flat_map(|entry| entry.cities.iter()) {
            let slug = slugify(name);
            let names = by_slug.entry(slug.clone()).or_insert_with(|| {
                order.push(slug);
                Vec::new()
            });
            names.push(name.clone());
        }

        order
            .into_iter()
            .filter_map(|slug| {
                let names = by_slug.remove(&slug)?;
                (names.len() > 1).then_some(SlugCollision { slug, names })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    country: String,
    provinces: Vec<ProvinceDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProvinceDocument {
    province: String,
    #[serde(default)]
    cities: Vec<String>,
}
