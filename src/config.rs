use std::{borrow::Cow, env};

use chrono_tz::Tz;
use tracing::info;

pub const TIMEZONE_VAR: &str = "CLUB_TIMEZONE";
pub const LOG_VAR: &str = "CLUB_LOG";

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_LOG_FILTER: &str = "club_attendance=info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Reference timezone for day buckets and month boundaries
    pub timezone: Tz,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Variables that were not set and fell back to their default
    pub defaulted: Vec<&'static str>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: Cow<'static, str>,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut defaulted = Vec::new();
        let mut load = |key: &'static str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                defaulted.push(key);
                default.to_string()
            })
        };

        let timezone = load(TIMEZONE_VAR, DEFAULT_TIMEZONE);
        let log_filter = load(LOG_VAR, DEFAULT_LOG_FILTER);
        let timezone = parse_timezone(&timezone).map_err(|reason| Error::Invalid {
            key: TIMEZONE_VAR,
            value: timezone.clone(),
            reason,
        })?;

        Ok(Self {
            timezone,
            log_filter,
            defaulted,
        })
    }

    /// Log the resolved configuration
    ///
    /// Loading happens before the subscriber exists, so this is called once logging is up.
    pub fn log_summary(&self) {
        for key in &self.defaulted {
            info!("{key} not set, using default");
        }
        info!(timezone = %self.timezone, log_filter = %self.log_filter, "configuration loaded");
    }
}

/// Parse an IANA timezone name such as `Europe/Paris`
pub fn parse_timezone(value: &str) -> Result<Tz, Cow<'static, str>> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|e| format!("expected an IANA timezone name: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::collections::HashMap;

    #[rstest]
    #[case("UTC", Tz::UTC)]
    #[case("Europe/Paris", Tz::Europe__Paris)]
    #[case(" America/New_York ", Tz::America__New_York)]
    fn test_parse_timezone(#[case] input: &str, #[case] expected: Tz) {
        assert_that!(parse_timezone(input)).is_ok().is_equal_to(expected);
    }

    #[rstest]
    #[case("+02:00")]
    #[case("Europe/Atlantis")]
    #[case("")]
    fn test_parse_timezone_invalid(#[case] input: &str) {
        assert_that!(parse_timezone(input)).is_err();
    }

    #[test]
    fn test_defaults() {
        let res = Config::from_lookup(|_| None);

        assert_that!(res).is_ok().is_equal_to(Config {
            timezone: Tz::UTC,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            defaulted: vec![TIMEZONE_VAR, LOG_VAR],
        });
    }

    #[test]
    fn test_from_vars() {
        let vars = HashMap::from([
            (TIMEZONE_VAR, "Europe/Paris".to_string()),
            (LOG_VAR, "debug".to_string()),
        ]);

        let res = Config::from_lookup(|key| vars.get(key).cloned());

        assert_that!(res).is_ok().is_equal_to(Config {
            timezone: Tz::Europe__Paris,
            log_filter: "debug".to_string(),
            defaulted: vec![],
        });
    }

    #[test]
    fn test_invalid_timezone() {
        let res =
            Config::from_lookup(|key| (key == TIMEZONE_VAR).then(|| "Mars/Olympus".to_string()));

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Invalid { key, .. } if *key == TIMEZONE_VAR));
    }
}
