//! # Environment Variables
//!
//! Utilities for reading and parsing environment variables.

use std::env;
use std::str::FromStr;

/// Get an environment variable by name.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnv(name))
}

/// Get an environment variable, treating unset and blank values as absent.
pub fn get_env_opt(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when it is unset.
///
/// A value that is present but malformed is still an error.
pub fn get_env_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
    match get_env_opt(name) {
        Some(val) => val.trim().parse::<T>().map_err(|_| Error::WrongFormat(name)),
        None => Ok(default),
    }
}

// region:    --- Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingEnv(&'static str),
    WrongFormat(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MissingEnv(name) => write!(fmt, "{name} must be set in environment"),
            Error::WrongFormat(name) => write!(fmt, "{name} has an invalid format"),
        }
    }
}

impl std::error::Error for Error {}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        let value: u32 = get_env_parse_or("LIB_UTILS_TEST_UNSET_VAR", 3000).unwrap();
        assert_eq!(value, 3000);
    }

    #[test]
    fn test_missing_env_is_reported_by_name() {
        let err = get_env("LIB_UTILS_TEST_MISSING_VAR").unwrap_err();
        assert_eq!(err, Error::MissingEnv("LIB_UTILS_TEST_MISSING_VAR"));
        assert_eq!(err.to_string(), "LIB_UTILS_TEST_MISSING_VAR must be set in environment");
    }
}
