//! Configuration access port trait.
//!
//! Implementors provide raw string lookup; typed getters parse on top of it
//! and report unparsable values as `ConfigInvalid` instead of silently
//! falling back to a default.

use chrono::NaiveDate;

use crate::domain::error::QuantError;

pub trait ConfigPort {
    /// Trimmed value, `None` when the key is absent or blank.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, QuantError> {
        parse_value(self.get_string(section, key), section, key, "expected a whole number")
    }

    fn get_f64(&self, section: &str, key: &str) -> Result<Option<f64>, QuantError> {
        let value: Option<f64> =
            parse_value(self.get_string(section, key), section, key, "expected a number")?;
        match value {
            Some(v) if !v.is_finite() => Err(invalid(section, key, "expected a finite number")),
            other => Ok(other),
        }
    }

    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, QuantError> {
        self.get_string(section, key)
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| invalid(section, key, "invalid date format (expected YYYY-MM-DD)"))
            })
            .transpose()
    }
}

fn parse_value<T: std::str::FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, QuantError> {
    raw.map(|s| s.parse::<T>().map_err(|_| invalid(section, key, reason)))
        .transpose()
}

fn invalid(section: &str, key: &str, reason: &str) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
