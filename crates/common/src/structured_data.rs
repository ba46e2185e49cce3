//! schema.org JSON-LD projections
//!
//! Every projection is a typed `Serialize` struct, so field order is fixed
//! and the same record always serializes to the same bytes.

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::hours::DayHours;
use crate::models::{BusinessRecord, LocationRecord, WeeklyHours};

const SCHEMA_CONTEXT: &str = "https://schema.org";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBusiness {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub url: String,
    pub telephone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub image: Vec<String>,
    pub price_range: &'static str,
    pub address: PostalAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoCoordinates>,
    pub opening_hours_specification: Vec<OpeningHoursSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_rating: Option<AggregateRating>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub area_served: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amenity_feature: Vec<LocationFeatureSpecification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub same_as: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_of: Option<Organization>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub street_address: String,
    pub address_locality: String,
    pub address_region: String,
    pub postal_code: String,
    pub address_country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoCoordinates {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHoursSpecification {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub day_of_week: &'static str,
    pub opens: String,
    pub closes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRating {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub rating_value: f64,
    pub review_count: u32,
    pub best_rating: u8,
    pub worst_rating: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationFeatureSpecification {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organization {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbList {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub item_list_element: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub position: usize,
    pub name: String,
    pub item: String,
}

/// One step of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

impl Crumb {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Project a business record into a `LocalBusiness` object
pub fn local_business(record: &BusinessRecord, canonical_url: &str) -> LocalBusiness {
    let mut image: Vec<String> = Vec::with_capacity(record.images.len() + 1);
    for url in record.featured_image().into_iter().chain(record.images.iter().map(String::as_str)) {
        if !image.iter().any(|seen| seen == url) {
            image.push(url.to_string());
        }
    }

    let aggregate_rating = (record.review_count > 0).then(|| AggregateRating {
        kind: "AggregateRating",
        rating_value: record.rating,
        review_count: record.review_count,
        best_rating: 5,
        worst_rating: 1,
    });

    LocalBusiness {
        context: SCHEMA_CONTEXT,
        kind: "LocalBusiness",
        id: format!("{canonical_url}#business"),
        name: record.name.clone(),
        description: record.description.clone(),
        url: canonical_url.to_string(),
        telephone: record.contact.phone.clone(),
        email: record.contact.email.clone(),
        image,
        price_range: record.price_range.symbol(),
        address: PostalAddress {
            kind: "PostalAddress",
            street_address: record.address.street.clone(),
            address_locality: record.address.city.clone(),
            address_region: record.address.state.clone(),
            postal_code: record.address.postal_code.clone(),
            address_country: record.address.country.clone(),
        },
        geo: record.geo.map(|g| GeoCoordinates {
            kind: "GeoCoordinates",
            latitude: g.latitude,
            longitude: g.longitude,
        }),
        opening_hours_specification: opening_hours_specification(&record.hours),
        aggregate_rating,
        area_served: record.service_areas.clone(),
        amenity_feature: record
            .amenities
            .iter()
            .map(|name| LocationFeatureSpecification {
                kind: "LocationFeatureSpecification",
                name: name.clone(),
                value: true,
            })
            .collect(),
        same_as: record.contact.website.iter().cloned().collect(),
        branch_of: None,
    }
}

/// Project a location into a `LocalBusiness` that names its parent
pub fn location_business(
    location: &LocationRecord,
    canonical_url: &str,
    parent: &BusinessRecord,
    parent_url: &str,
) -> LocalBusiness {
    let mut business = local_business(&location.record, canonical_url);
    business.name = format!("{} - {}", parent.name, location.location_name);
    business.branch_of = Some(Organization {
        kind: "Organization",
        name: parent.name.clone(),
        url: parent_url.to_string(),
    });
    business
}

/// One entry per opening range, so split days yield several entries
///
/// Closed days are omitted. Text that cannot be parsed is logged and
/// omitted rather than emitted as bogus times.
pub fn opening_hours_specification(hours: &WeeklyHours) -> Vec<OpeningHoursSpecification> {
    let mut entries = Vec::new();
    for (day, text) in hours.iter() {
        for segment in DayHours::parse_segments(text) {
            if segment == DayHours::Unrecognized {
                warn!("Unrecognized hours for {}: {:?}", day, text);
                continue;
            }
            if let Some((opens, closes)) = segment.opening_times() {
                entries.push(OpeningHoursSpecification {
                    kind: "OpeningHoursSpecification",
                    day_of_week: day.name(),
                    opens,
                    closes,
                });
            }
        }
    }
    entries
}

pub fn breadcrumb_list(crumbs: &[Crumb]) -> BreadcrumbList {
    BreadcrumbList {
        context: SCHEMA_CONTEXT,
        kind: "BreadcrumbList",
        item_list_element: crumbs
            .iter()
            .enumerate()
            .map(|(i, crumb)| ListItem {
                kind: "ListItem",
                position: i + 1,
                name: crumb.name.clone(),
                item: crumb.url.clone(),
            })
            .collect(),
    }
}

/// Serialize for embedding in `<script type="application/ld+json">`
///
/// `<`, `>` and `&` are escaped so record text cannot close the script tag.
pub fn to_script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}
