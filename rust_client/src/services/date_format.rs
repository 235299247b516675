//! Localized labels for dates and sample timestamps.
//!
//! Dates arrive as ISO keys (`2024-01-15`) and are shown in a long localized
//! form (`15 de enero de 2024` for `es_ES`). Only the ISO key is ever sent back
//! to the service.

use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::DateOption;

const ISO_DATE: &str = "%Y-%m-%d";
const NAIVE_TIMESTAMPS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Formats date keys and timestamps for display.
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
    long_pattern: &'static str,
}

impl DateFormatter {
    /// Formatter for a POSIX locale name such as `es_ES` or `en_US`. Unknown
    /// names fall back to `es_ES`.
    pub fn new(locale: &str) -> Self {
        match Locale::try_from(locale) {
            Ok(parsed) => Self {
                locale: parsed,
                long_pattern: long_pattern(locale),
            },
            Err(_) => {
                log::warn!("Unknown locale '{}', using es_ES", locale);
                Self::default()
            }
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Long date label, or the raw key when it does not parse.
    pub fn format_date_label(&self, date: &str) -> String {
        match parse_date(date) {
            Some(day) => {
                let midnight = day.and_time(NaiveTime::default()).and_utc();
                midnight
                    .format_localized(self.long_pattern, self.locale)
                    .to_string()
            }
            None => {
                log::warn!("Could not parse date '{}', showing it verbatim", date);
                date.to_string()
            }
        }
    }

    /// One option per date key, order preserved.
    pub fn date_options(&self, dates: &[String]) -> Vec<DateOption> {
        dates
            .iter()
            .map(|d| DateOption::new(d.clone(), self.format_date_label(d)))
            .collect()
    }

    /// Wall-clock `HH:MM:SS` of a sample timestamp; the raw value when it
    /// does not parse.
    pub fn format_time_label(&self, timestamp: &str) -> String {
        match parse_timestamp(timestamp) {
            Some(ts) => ts.format("%H:%M:%S").to_string(),
            None => timestamp.to_string(),
        }
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            locale: Locale::es_ES,
            long_pattern: long_pattern("es_ES"),
        }
    }
}

/// Long date pattern by language.
fn long_pattern(locale: &str) -> &'static str {
    match locale.split(['_', '-']).next().unwrap_or_default() {
        "es" | "pt" | "gl" | "ca" => "%-d de %B de %Y",
        "fr" | "it" => "%-d %B %Y",
        "de" | "nl" | "da" | "nb" | "fi" => "%-d. %B %Y",
        _ => "%B %-d, %Y",
    }
}

/// ISO date key, or the date part of a timestamp.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE)
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date()))
}

/// Naive timestamp, or the local wall time of an RFC 3339 one.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NAIVE_TIMESTAMPS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|ts| ts.naive_local())
        })
}
