//! Typed lookups over a resource's annotations.
//!
//! Every lookup follows the same rule: an absent key yields `Ok(None)`, a present key that parses
//! yields `Ok(Some(value))`, and a present key that fails to parse yields an [`AnnotationError`].
//! Lookups never fail because a key is missing.

use base64::{engine::general_purpose::STANDARD, Engine};
use ipnet::IpNet;
use regex::Regex;
use std::{collections::BTreeMap, ops::RangeInclusive};

/// A view over an annotation map, scoped to a key prefix.
#[derive(Clone, Debug)]
pub struct Annotations<'a> {
    map: &'a BTreeMap<String, String>,
    prefix: String,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AnnotationError {
    #[error("annotation {key}: invalid integer {value:?}: {source}")]
    InvalidInt {
        key: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("annotation {key}: {value} is not within {min}..={max}")]
    OutOfRange {
        key: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("annotation {key}: invalid boolean {value:?}")]
    InvalidBool { key: String, value: String },

    #[error("annotation {key}: entry {index} is not valid base64: {source}")]
    InvalidBase64 {
        key: String,
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("annotation {key}: entry {index} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        key: String,
        index: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("annotation {key}: invalid network {value:?}: {source}")]
    InvalidNetwork {
        key: String,
        value: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    #[error("annotation {key}: {value:?} does not match {pattern}")]
    Constraint {
        key: String,
        value: String,
        pattern: String,
    },

    #[error("annotation {key}: malformed entry {value:?}: {reason}")]
    Malformed {
        key: String,
        value: String,
        reason: &'static str,
    },
}

// === impl Annotations ===

impl<'a> Annotations<'a> {
    pub fn new(map: &'a BTreeMap<String, String>, prefix: impl Into<String>) -> Self {
        Self {
            map,
            prefix: prefix.into(),
        }
    }

    /// Returns a view whose keys are nested under `scope` (e.g. `ssl.` or `ssl.hsts.`).
    pub fn scoped(&self, scope: &str) -> Self {
        Self {
            map: self.map,
            prefix: format!("{}{}", self.prefix, scope),
        }
    }

    /// The fully-qualified annotation key for `key`.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Returns the raw value for `key`, verbatim.
    pub fn string(&self, key: &str) -> Option<&'a str> {
        self.map.get(&self.key(key)).map(String::as_str)
    }

    /// Returns the raw value for `key` if it matches `pattern`.
    pub fn constrained(
        &self,
        key: &str,
        pattern: &Regex,
    ) -> Result<Option<&'a str>, AnnotationError> {
        match self.string(key) {
            Some(value) if !pattern.is_match(value) => Err(AnnotationError::Constraint {
                key: self.key(key),
                value: value.to_string(),
                pattern: pattern.as_str().to_string(),
            }),
            value => Ok(value),
        }
    }

    /// Parses `key` as a base-10 integer. Surrounding whitespace is not accepted.
    pub fn int(&self, key: &str) -> Result<Option<i64>, AnnotationError> {
        let Some(value) = self.string(key) else {
            return Ok(None);
        };
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|source| AnnotationError::InvalidInt {
                key: self.key(key),
                value: value.to_string(),
                source,
            })
    }

    /// Parses `key` as a base-10 integer that must fall within `range`.
    pub fn int_within(
        &self,
        key: &str,
        range: RangeInclusive<i64>,
    ) -> Result<Option<i64>, AnnotationError> {
        match self.int(key)? {
            Some(value) if !range.contains(&value) => Err(AnnotationError::OutOfRange {
                key: self.key(key),
                value,
                min: *range.start(),
                max: *range.end(),
            }),
            value => Ok(value),
        }
    }

    /// Parses `key` as a boolean.
    ///
    /// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True`, `0`, `f`, `F`, `FALSE`, `false` and `False`.
    pub fn bool(&self, key: &str) -> Result<Option<bool>, AnnotationError> {
        let Some(value) = self.string(key) else {
            return Ok(None);
        };
        match value {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(Some(true)),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(Some(false)),
            _ => Err(AnnotationError::InvalidBool {
                key: self.key(key),
                value: value.to_string(),
            }),
        }
    }

    /// Splits `key` on commas, ignoring surrounding whitespace and empty entries.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.string(key).map(|value| {
            split_list(value)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        })
    }

    /// Splits `key` on commas and base64-decodes each entry to text.
    ///
    /// A single malformed entry fails the whole lookup.
    pub fn base64_list(&self, key: &str) -> Result<Option<Vec<String>>, AnnotationError> {
        let Some(value) = self.string(key) else {
            return Ok(None);
        };

        let mut decoded = Vec::new();
        for (index, entry) in split_list(value).enumerate() {
            let bytes =
                STANDARD
                    .decode(entry)
                    .map_err(|source| AnnotationError::InvalidBase64 {
                        key: self.key(key),
                        index,
                        source,
                    })?;
            let text = String::from_utf8(bytes).map_err(|source| AnnotationError::InvalidUtf8 {
                key: self.key(key),
                index,
                source,
            })?;
            decoded.push(text);
        }

        Ok(Some(decoded))
    }

    /// Splits `key` on commas and parses each entry as a CIDR network.
    pub fn networks(&self, key: &str) -> Result<Option<Vec<IpNet>>, AnnotationError> {
        let Some(value) = self.string(key) else {
            return Ok(None);
        };
        split_list(value)
            .map(|net| {
                net.parse::<IpNet>()
                    .map_err(|source| AnnotationError::InvalidNetwork {
                        key: self.key(key),
                        value: net.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Splits `key` on commas into `left:right` pairs.
    pub fn pairs(&self, key: &str) -> Result<Option<Vec<(String, String)>>, AnnotationError> {
        let Some(value) = self.string(key) else {
            return Ok(None);
        };
        split_list(value)
            .map(|pair| match pair.split_once(':') {
                Some((left, right)) if !left.trim().is_empty() && !right.trim().is_empty() => {
                    Ok((left.trim().to_string(), right.trim().to_string()))
                }
                _ => Err(AnnotationError::Malformed {
                    key: self.key(key),
                    value: pair.to_string(),
                    reason: "expected <name>:<value>",
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}
