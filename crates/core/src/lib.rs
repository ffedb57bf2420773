//! Domain layer for the pet-services directory: slugs, the city seed catalog,
//! and the row types shared with storage and the seeder binary.

pub mod catalog;
pub mod slug;
pub mod types;

pub use catalog::{CatalogError, ProvinceCities, SeedCatalog, SlugCollision, NETHERLANDS_SLUG};
pub use slug::{is_valid_slug, slugify};
