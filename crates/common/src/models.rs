//! Business and location record types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::slug::is_valid_slug;

/// Four-level symbolic price tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Luxury,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid price range '{0}', expected one of $, $$, $$$, $$$$")]
pub struct ParsePriceRangeError(pub String);

impl PriceRange {
    pub const ALL: [PriceRange; 4] = [
        PriceRange::Budget,
        PriceRange::Moderate,
        PriceRange::Upscale,
        PriceRange::Luxury,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            PriceRange::Budget => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Upscale => "$$$",
            PriceRange::Luxury => "$$$$",
        }
    }
}

impl FromStr for PriceRange {
    type Err = ParsePriceRangeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PriceRange::ALL
            .into_iter()
            .find(|p| p.symbol() == s)
            .ok_or_else(|| ParsePriceRangeError(s.to_string()))
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Day of the week, Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Canonical (schema.org) day name
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Free-text opening hours for each of the seven weekdays
///
/// Every field is required and unknown keys are rejected, so a record that
/// deserializes always carries exactly the seven canonical days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeeklyHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl WeeklyHours {
    /// Same hours every day
    pub fn uniform(hours: impl Into<String>) -> Self {
        let hours = hours.into();
        Self {
            monday: hours.clone(),
            tuesday: hours.clone(),
            wednesday: hours.clone(),
            thursday: hours.clone(),
            friday: hours.clone(),
            saturday: hours.clone(),
            sunday: hours,
        }
    }

    pub fn get(&self, day: Weekday) -> &str {
        match day {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = Weekday> {
        Weekday::ALL.into_iter()
    }

    /// Days paired with their hours text, Monday to Sunday
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &str)> + '_ {
        Weekday::ALL.into_iter().map(move |day| (day, self.get(day)))
    }
}

/// Postal address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl Address {
    /// Single-line form, e.g. "12 Elm St, Portland, OR 97201"
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.postal_code
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Frequently asked question shown on landing pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// A business profile, keyed by slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub slug: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,

    /// Average rating, 0 to 5
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub price_range: PriceRange,

    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
    pub contact: Contact,

    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,

    #[serde(default)]
    pub amenities: BTreeSet<String>,
    pub hours: WeeklyHours,

    /// Areas served, emitted as `areaServed`
    #[serde(default)]
    pub service_areas: Vec<String>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

impl BusinessRecord {
    /// Featured image, falling back to the first gallery image
    pub fn featured_image(&self) -> Option<&str> {
        self.featured_image
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// Check the shape constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !is_valid_slug(&self.slug) {
            return Err(Error::invalid_record(&self.slug, "malformed slug"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::invalid_record(&self.slug, "name is empty"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::invalid_record(&self.slug, "category is empty"));
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(Error::invalid_record(
                &self.slug,
                format!("rating {} outside 0-5", self.rating),
            ));
        }
        if self.contact.phone.trim().is_empty() {
            return Err(Error::invalid_record(&self.slug, "phone is empty"));
        }
        Ok(())
    }
}

/// One physical location of a multi-location business
///
/// The embedded record's `slug` is the location slug; `business_slug` points
/// back at the parent business by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub business_slug: String,
    pub location_name: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(flatten)]
    pub record: BusinessRecord,
}

impl LocationRecord {
    pub fn location_slug(&self) -> &str {
        &self.record.slug
    }

    /// Site-relative path of the location page
    pub fn path(&self) -> String {
        format!("/businesses/{}/{}", self.business_slug, self.record.slug)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_slug(&self.business_slug) {
            return Err(Error::invalid_record(
                &self.record.slug,
                format!("malformed parent slug '{}'", self.business_slug),
            ));
        }
        if self.location_name.trim().is_empty() {
            return Err(Error::invalid_record(
                &self.record.slug,
                "location name is empty",
            ));
        }
        self.record.validate()
    }
}
