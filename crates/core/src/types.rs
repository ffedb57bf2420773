/// Country row. Read-only for the seeder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Province row, scoped to exactly one country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Province {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub country_id: i64,
}

/// City row. `(country_id, slug)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub country_id: i64,
    pub province_id: i64,
    /// Number of directory listings referencing this city. Maintained by the
    /// place discovery process; zero at creation.
    pub place_count: i64,
}

/// Data required to create a new city row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCity<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub country_id: i64,
    pub province_id: i64,
}
