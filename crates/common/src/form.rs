//! Business creation form schema
//!
//! [`BusinessForm`] is the raw submission (HTML form or JSON). Validation
//! either yields a [`NewBusiness`] ready for the backend or a full set of
//! per-field messages; nothing is sent to the backend until it passes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::models::{Address, BusinessRecord, Contact, PriceRange, WeeklyHours};
use crate::slug::slugify;

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_NAME_CHARS: usize = 100;

/// Raw form fields as submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_range: String,

    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,

    pub phone: String,
    pub website: String,
    pub email: String,

    /// One URL per line
    pub images: String,
    pub featured_image: String,
    /// Comma separated
    pub amenities: String,
    /// Comma separated
    pub service_areas: String,

    pub hours_monday: String,
    pub hours_tuesday: String,
    pub hours_wednesday: String,
    pub hours_thursday: String,
    pub hours_friday: String,
    pub hours_saturday: String,
    pub hours_sunday: String,
}

/// Field name -> message, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message; the first message for a field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FormErrors {}

/// A validated creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewBusiness {
    pub record: BusinessRecord,
}

impl NewBusiness {
    pub fn slug(&self) -> &str {
        &self.record.slug
    }
}

impl BusinessForm {
    pub fn validate(&self) -> Result<NewBusiness, FormErrors> {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        let slug = slugify(name);
        if name.is_empty() {
            errors.add("name", "Business name is required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add(
                "name",
                format!("Business name must be at most {MAX_NAME_CHARS} characters"),
            );
        } else if slug.is_empty() {
            errors.add("name", "Business name must contain letters or digits");
        }

        let category = self.category.trim();
        if category.is_empty() {
            errors.add("category", "Category is required");
        }

        let description = self.description.trim();
        let description_chars = description.chars().count();
        if description_chars < MIN_DESCRIPTION_CHARS {
            errors.add(
                "description",
                format!("Description must be at least {MIN_DESCRIPTION_CHARS} characters"),
            );
        } else if description_chars > MAX_DESCRIPTION_CHARS {
            errors.add(
                "description",
                format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters"),
            );
        }

        let price_range = match self.price_range.trim().parse::<PriceRange>() {
            Ok(p) => Some(p),
            Err(_) => {
                errors.add("price_range", "Choose a price range: $, $$, $$$ or $$$$");
                None
            }
        };

        for (field, value, label) in [
            ("street", &self.street, "Street address"),
            ("city", &self.city, "City"),
            ("state", &self.state, "State"),
            ("postal_code", &self.postal_code, "Postal code"),
            ("phone", &self.phone, "Phone number"),
        ] {
            if value.trim().is_empty() {
                errors.add(field, format!("{label} is required"));
            }
        }

        let website = optional(&self.website);
        if let Some(url) = website {
            if !is_http_url(url) {
                errors.add("website", "Website must start with http:// or https://");
            }
        }

        let email = optional(&self.email);
        if let Some(email) = email {
            if !is_email(email) {
                errors.add("email", "Enter a valid email address");
            }
        }

        let images: Vec<String> = self
            .images
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if images.iter().any(|url| !is_http_url(url)) {
            errors.add("images", "Each image must be an http:// or https:// URL");
        }

        let featured = optional(&self.featured_image);
        if let Some(url) = featured {
            if !is_http_url(url) {
                errors.add("featured_image", "Featured image must be an http:// or https:// URL");
            }
        }

        let (Some(price_range), true) = (price_range, errors.is_empty()) else {
            return Err(errors);
        };

        let country = optional(&self.country).unwrap_or("US");

        let record = BusinessRecord {
            slug,
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            rating: 0.0,
            review_count: 0,
            price_range,
            address: Address {
                street: self.street.trim().to_string(),
                city: self.city.trim().to_string(),
                state: self.state.trim().to_string(),
                postal_code: self.postal_code.trim().to_string(),
                country: country.to_string(),
            },
            geo: None,
            contact: Contact {
                phone: self.phone.trim().to_string(),
                website: website.map(str::to_string),
                email: email.map(str::to_string),
            },
            featured_image: featured
                .map(str::to_string)
                .or_else(|| images.first().cloned()),
            images,
            amenities: split_list(&self.amenities).into_iter().collect::<BTreeSet<_>>(),
            hours: self.weekly_hours(),
            service_areas: split_list(&self.service_areas),
            faqs: Vec::new(),
        };

        Ok(NewBusiness { record })
    }

    /// Submitted hours with blank days treated as closed
    fn weekly_hours(&self) -> WeeklyHours {
        let day = |text: &str| {
            let text = text.trim();
            if text.is_empty() {
                "Closed".to_string()
            } else {
                text.to_string()
            }
        };
        WeeklyHours {
            monday: day(&self.hours_monday),
            tuesday: day(&self.hours_tuesday),
            wednesday: day(&self.hours_wednesday),
            thursday: day(&self.hours_thursday),
            friday: day(&self.hours_friday),
            saturday: day(&self.hours_saturday),
            sunday: day(&self.hours_sunday),
        }
    }
}

fn optional(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Comma-separated list, trimmed, empty and repeated entries dropped
fn split_list(text: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|seen| seen == item) {
            items.push(item.to_string());
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> BusinessForm {
        BusinessForm {
            name: "Maple Street Bakery".to_string(),
            category: "Bakeries".to_string(),
            description: "Sourdough, croissants and custom cakes baked daily.".to_string(),
            price_range: "$$".to_string(),
            street: "45 Maple St".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97205".to_string(),
            phone: "(503) 555-0100".to_string(),
            images: "https://img.example.com/bakery-1.jpg\n\nhttps://img.example.com/bakery-2.jpg\n"
                .to_string(),
            amenities: "Takeout, Catering, Takeout".to_string(),
            hours_monday: "7:00 AM - 3:00 PM".to_string(),
            hours_tuesday: "7:00 AM - 3:00 PM".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_produces_payload() {
        let new = valid_form().validate().expect("form should validate");
        let record = &new.record;

        assert_eq!(new.slug(), "maple-street-bakery");
        assert_eq!(record.price_range, PriceRange::Moderate);
        assert_eq!(record.address.country, "US");
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.amenities.len(), 2);
        assert_eq!(record.hours.monday, "7:00 AM - 3:00 PM");
        assert_eq!(record.hours.sunday, "Closed");
        assert_eq!(record.rating, 0.0);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_featured_image_defaults_to_first_image() {
        let new = valid_form().validate().unwrap();
        assert_eq!(
            new.record.featured_image.as_deref(),
            Some("https://img.example.com/bakery-1.jpg")
        );

        let mut form = valid_form();
        form.featured_image = "https://img.example.com/hero.jpg".to_string();
        let new = form.validate().unwrap();
        assert_eq!(
            new.record.featured_image.as_deref(),
            Some("https://img.example.com/hero.jpg")
        );

        let mut form = valid_form();
        form.images.clear();
        let new = form.validate().unwrap();
        assert_eq!(new.record.featured_image, None);
    }

    #[test]
    fn test_short_description_rejected() {
        let mut form = valid_form();
        form.description = "Too short".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.get("description").unwrap().contains("at least 10"));

        form.description = "  123456789  ".to_string();
        assert!(form.validate().is_err());

        form.description = "1234567890".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_price_range_outside_enum_rejected() {
        for bad in ["", "$$$$$", "cheap", "4", "€"] {
            let mut form = valid_form();
            form.price_range = bad.to_string();
            let errors = form.validate().unwrap_err();
            assert!(errors.get("price_range").is_some(), "{bad:?}");
        }
        for good in ["$", "$$", "$$$", "$$$$"] {
            let mut form = valid_form();
            form.price_range = good.to_string();
            assert!(form.validate().is_ok(), "{good:?}");
        }
    }

    #[test]
    fn test_errors_are_collected() {
        let errors = BusinessForm::default().validate().unwrap_err();
        for field in [
            "name",
            "category",
            "description",
            "price_range",
            "street",
            "city",
            "state",
            "postal_code",
            "phone",
        ] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
        let fields: Vec<_> = errors.iter().map(|(f, _)| f).collect();
        let mut sorted = fields.clone();
        sorted.sort();
        assert_eq!(fields, sorted);
    }

    #[test]
    fn test_contact_fields_checked() {
        let mut form = valid_form();
        form.website = "gardenbistro.example".to_string();
        form.email = "not-an-email".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.get("website").is_some());
        assert!(errors.get("email").is_some());

        form.website = "https://gardenbistro.example".to_string();
        form.email = "owner@gardenbistro.example".to_string();
        let new = form.validate().unwrap();
        assert_eq!(new.record.contact.email.as_deref(), Some("owner@gardenbistro.example"));
    }

    #[test]
    fn test_bad_image_rejected() {
        let mut form = valid_form();
        form.images = "ftp://img.example.com/x.jpg".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.get("images").is_some());
    }

    #[test]
    fn test_free_text_hours_kept_verbatim() {
        let mut form = valid_form();
        form.hours_friday = "11:00 AM - 2:00 PM, 5:00 PM - 10:00 PM".to_string();
        form.hours_saturday = "By appointment".to_string();
        let new = form.validate().unwrap();
        assert_eq!(new.record.hours.friday, "11:00 AM - 2:00 PM, 5:00 PM - 10:00 PM");
        assert_eq!(new.record.hours.saturday, "By appointment");
    }

    #[test]
    fn test_name_without_slug_characters_rejected() {
        let mut form = valid_form();
        form.name = "!!!".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.get("name").unwrap().contains("letters or digits"));
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a@@b.co"));
        assert!(!is_email("a b@c.co"));
        assert!(!is_email("a@.co"));
    }
}
