//! Read-only business and location catalog
//!
//! The catalog is loaded once at startup (from the embedded table or an
//! external JSON file) and validated as a whole before it is served.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{BusinessRecord, LocationRecord};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    businesses: Vec<BusinessRecord>,
    #[serde(default)]
    locations: Vec<LocationRecord>,
}

/// Businesses keyed by slug, locations keyed by (business slug, location slug)
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    businesses: BTreeMap<String, BusinessRecord>,
    locations: BTreeMap<(String, String), LocationRecord>,
}

impl Catalog {
    /// The table compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_records(file.businesses, file.locations)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        info!(
            "Loaded catalog from {} ({} businesses, {} locations)",
            path.display(),
            catalog.businesses.len(),
            catalog.locations.len()
        );
        Ok(catalog)
    }

    /// Build a catalog, rejecting duplicates, orphans and invalid records
    pub fn from_records(
        businesses: Vec<BusinessRecord>,
        locations: Vec<LocationRecord>,
    ) -> Result<Self> {
        let mut catalog = Catalog::default();

        for business in businesses {
            business.validate()?;
            if catalog.businesses.contains_key(&business.slug) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate business slug '{}'",
                    business.slug
                )));
            }
            catalog.businesses.insert(business.slug.clone(), business);
        }

        let mut primaries = BTreeSet::new();
        for location in locations {
            location.validate()?;
            if !catalog.businesses.contains_key(&location.business_slug) {
                return Err(Error::InvalidCatalog(format!(
                    "location '{}' references unknown business '{}'",
                    location.location_slug(),
                    location.business_slug
                )));
            }
            if location.is_primary && !primaries.insert(location.business_slug.clone()) {
                return Err(Error::InvalidCatalog(format!(
                    "business '{}' has more than one primary location",
                    location.business_slug
                )));
            }

            let key = (
                location.business_slug.clone(),
                location.location_slug().to_string(),
            );
            if catalog.locations.contains_key(&key) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate location '{}/{}'",
                    key.0, key.1
                )));
            }
            catalog.locations.insert(key, location);
        }

        Ok(catalog)
    }

    pub fn business(&self, slug: &str) -> Option<&BusinessRecord> {
        let found = self.businesses.get(slug);
        debug!("Catalog lookup business={} found={}", slug, found.is_some());
        found
    }

    pub fn location(&self, business_slug: &str, location_slug: &str) -> Option<&LocationRecord> {
        let found = self
            .locations
            .get(&(business_slug.to_string(), location_slug.to_string()));
        debug!(
            "Catalog lookup location={}/{} found={}",
            business_slug,
            location_slug,
            found.is_some()
        );
        found
    }

    /// Locations of one business, primary first, then by name
    pub fn locations_for(&self, business_slug: &str) -> Vec<&LocationRecord> {
        let mut locations: Vec<_> = self
            .locations
            .values()
            .filter(|l| l.business_slug == business_slug)
            .collect();
        locations.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then_with(|| a.location_name.cmp(&b.location_name))
        });
        locations
    }

    /// All businesses in slug order
    pub fn businesses(&self) -> impl Iterator<Item = &BusinessRecord> {
        self.businesses.values()
    }

    /// All locations in (business, location) slug order
    pub fn locations(&self) -> impl Iterator<Item = &LocationRecord> {
        self.locations.values()
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.businesses
            .values()
            .map(|b| b.category.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.businesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.businesses.is_empty()
    }
}
