//! Structured interpretation of free-text opening hours
//!
//! Records store hours as display strings ("9:00 AM - 5:00 PM", "Closed").
//! Structured data needs real times, so each string is parsed here; anything
//! that does not parse is reported as [`DayHours::Unrecognized`] instead of
//! being guessed at.

use chrono::NaiveTime;

/// Parsed hours for a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayHours {
    Closed,
    AllDay,
    Range { opens: NaiveTime, closes: NaiveTime },
    Unrecognized,
}

const RANGE_SEPARATORS: [&str; 4] = [" to ", "\u{2013}", "\u{2014}", "-"];

impl DayHours {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let lower = text.to_ascii_lowercase();

        match lower.as_str() {
            "closed" => return DayHours::Closed,
            "open 24 hours" | "24 hours" | "24/7" => return DayHours::AllDay,
            _ => {}
        }

        for sep in RANGE_SEPARATORS {
            if let Some((start, end)) = lower.split_once(sep) {
                return match (parse_time(start), parse_time(end)) {
                    (Some(opens), Some(closes)) => DayHours::Range { opens, closes },
                    _ => DayHours::Unrecognized,
                };
            }
        }

        DayHours::Unrecognized
    }

    /// Parse a day that may list several ranges ("11 AM - 2 PM, 5 PM - 10 PM")
    pub fn parse_segments(text: &str) -> Vec<DayHours> {
        let segments: Vec<&str> = text
            .split([',', ';', '&'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return vec![DayHours::Unrecognized];
        }
        segments.into_iter().map(DayHours::parse).collect()
    }

    /// `(opens, closes)` as `HH:MM`, or `None` for days with no opening
    pub fn opening_times(&self) -> Option<(String, String)> {
        match self {
            DayHours::AllDay => Some(("00:00".to_string(), "23:59".to_string())),
            DayHours::Range { opens, closes } => Some((
                opens.format("%H:%M").to_string(),
                closes.format("%H:%M").to_string(),
            )),
            DayHours::Closed | DayHours::Unrecognized => None,
        }
    }
}

/// Parse "9:00 AM", "9 am", "9 a.m.", "9:00am", "17:30", "noon" or "midnight"
fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text
        .trim()
        .to_ascii_uppercase()
        .replace("A.M.", "AM")
        .replace("P.M.", "PM");
    match text.as_str() {
        "" => return None,
        "NOON" => return NaiveTime::from_hms_opt(12, 0, 0),
        "MIDNIGHT" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let (clock, meridiem) = if let Some(clock) = text.strip_suffix("AM") {
        (clock.trim(), Some("AM"))
    } else if let Some(clock) = text.strip_suffix("PM") {
        (clock.trim(), Some("PM"))
    } else {
        (text.as_str(), None)
    };

    let clock = if clock.contains(':') {
        clock.to_string()
    } else {
        format!("{clock}:00")
    };

    match meridiem {
        Some(m) => NaiveTime::parse_from_str(&format!("{clock} {m}"), "%I:%M %p").ok(),
        None => NaiveTime::parse_from_str(&clock, "%H:%M").ok(),
    }
}
