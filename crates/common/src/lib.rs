pub mod catalog;
pub mod error;
pub mod form;
pub mod hours;
pub mod models;
pub mod slug;
pub mod structured_data;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use form::{BusinessForm, FormErrors, NewBusiness};
pub use hours::DayHours;
pub use models::{
    Address, BusinessRecord, Contact, Faq, GeoPoint, LocationRecord, PriceRange, Weekday,
    WeeklyHours,
};
