//! Store Contract Module
//!
//! The single interface every backend satisfies, plus the arithmetic and
//! lazy-deletion helpers the backends share.

use std::time::Duration;

use tracing::warn;

use crate::error::{CacheError, Result};

// == Store Trait ==
/// Key-value cache contract with lazy TTL expiration.
///
/// Calls are synchronous and may block on backend I/O. Any expired entry
/// discovered by a call is reported as [`CacheError::NotFound`] and purged
/// on a best-effort basis before returning.
pub trait Store: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Stores a value, fully replacing any previous value, timestamp and TTL.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Time to live, None = never expires
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Returns the value of a live entry.
    fn get(&self, key: &str) -> Result<String>;

    /// Reports whether a live entry exists. Never fails with `NotFound`.
    fn has(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Removes a live entry. Fails with `NotFound` if absent or expired.
    fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry.
    fn delete_all(&self) -> Result<()>;

    /// Adds a signed delta to an integer value, keeping its TTL and timestamp.
    fn adjust(&self, key: &str, delta: i64) -> Result<()>;

    /// Increments an integer value by `by`.
    fn increase(&self, key: &str, by: i64) -> Result<()> {
        self.adjust(key, by)
    }

    /// Decrements an integer value by `by`. Results may go negative.
    fn decrease(&self, key: &str, by: i64) -> Result<()> {
        let delta = by
            .checked_neg()
            .ok_or_else(|| CacheError::Overflow(key.to_string()))?;
        self.adjust(key, delta)
    }

    /// Remaining lifetime of a live entry, None = never expires.
    fn ttl(&self, key: &str) -> Result<Option<Duration>>;
}

// == Arithmetic ==
/// Parses a stored value as a canonical base-10 integer and applies `delta`.
///
/// Canonical means what `i64::to_string` produces: an optional `-`, no `+`,
/// no leading zeros. The relational dialects enforce the same shape in SQL.
/// Returns the new textual value; the caller writes it back.
pub fn apply_delta(key: &str, value: &str, delta: i64) -> Result<String> {
    let current = parse_integer(value).ok_or_else(|| CacheError::NotAnInteger {
        key: key.to_string(),
        value: value.to_string(),
    })?;

    current
        .checked_add(delta)
        .map(|next| next.to_string())
        .ok_or_else(|| CacheError::Overflow(key.to_string()))
}

/// Parses a canonical base-10 integer.
pub fn parse_integer(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|parsed| parsed.to_string() == value)
}

// == Lazy Deletion ==
/// Logs and discards a failed purge of an expired entry.
///
/// The caller is already returning `NotFound`; a cleanup failure must not
/// replace that result.
pub(crate) fn purge_outcome(backend: &str, key: &str, outcome: Result<()>) {
    if let Err(err) = outcome {
        if !err.is_not_found() {
            warn!(backend, key, error = %err, "Failed to purge expired entry");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta_increase() {
        assert_eq!(apply_delta("k", "10", 5).unwrap(), "15");
    }

    #[test]
    fn test_apply_delta_goes_negative() {
        assert_eq!(apply_delta("k", "15", -20).unwrap(), "-5");
    }

    #[test]
    fn test_apply_delta_not_a_number() {
        let result = apply_delta("k", "not-a-number", 1);
        assert!(matches!(result, Err(CacheError::NotAnInteger { .. })));
    }

    #[test]
    fn test_apply_delta_rejects_float() {
        assert!(apply_delta("k", "1.5", 1).is_err());
    }

    #[test]
    fn test_non_canonical_integers_rejected() {
        assert!(parse_integer("+5").is_none());
        assert!(parse_integer("007").is_none());
        assert!(parse_integer("-0").is_none());
        assert!(parse_integer(" 5").is_none());
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("-42"), Some(-42));
    }

    #[test]
    fn test_apply_delta_overflow() {
        let result = apply_delta("k", &i64::MAX.to_string(), 1);
        assert!(matches!(result, Err(CacheError::Overflow(_))));
    }
}
