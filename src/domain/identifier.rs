//! ISBN identity for shelves.
//!
//! A shelf directory is named after the book it holds; the ISBN embedded in
//! that name is the only identity contract at the filesystem boundary.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::DexError;

/// Why a string is not an ISBN
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsbnError {
    #[error("expected 10 or 13 digits, found {0}")]
    Length(usize),

    #[error("invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("checksum mismatch")]
    Checksum,

    #[error("ISBN-13 must start with 978 or 979")]
    Prefix,
}

/// A validated ISBN, stored in canonical ISBN-13 form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookIdentifier(String);

impl BookIdentifier {
    /// Parse an ISBN-10 or ISBN-13, tolerating hyphen and space separators.
    ///
    /// ISBN-10 input is converted to its ISBN-13 equivalent so the same book
    /// always maps to the same identifier.
    pub fn parse(input: &str) -> Result<Self, IsbnError> {
        let compact: String = input
            .chars()
            .filter(|c| *c != '-' && *c != ' ')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        match compact.len() {
            10 => {
                validate_isbn10(&compact)?;
                Ok(Self(isbn10_to_isbn13(&compact)))
            }
            13 => {
                validate_isbn13(&compact)?;
                Ok(Self(compact))
            }
            n => Err(IsbnError::Length(n)),
        }
    }

    /// Canonical ISBN-13 digits
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ISBN-10 form, only defined for the 978 prefix
    pub fn isbn10(&self) -> Option<String> {
        let body = self.0.strip_prefix("978")?;
        let stem = &body[..9];
        let sum: u32 = stem
            .chars()
            .zip((2..=10).rev())
            .map(|(c, w)| c.to_digit(10).unwrap_or(0) * w)
            .sum();
        let check = (11 - sum % 11) % 11;
        let check = if check == 10 {
            'X'
        } else {
            char::from_digit(check, 10).unwrap_or('0')
        };
        Some(format!("{}{}", stem, check))
    }
}

impl std::fmt::Display for BookIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookIdentifier {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BookIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BookIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn validate_isbn10(digits: &str) -> Result<(), IsbnError> {
    let mut sum = 0;
    for (idx, c) in digits.chars().enumerate() {
        let value = match c {
            '0'..='9' => c.to_digit(10).unwrap_or(0),
            'X' if idx == 9 => 10,
            other => return Err(IsbnError::InvalidCharacter(other)),
        };
        sum += value * (10 - idx as u32);
    }
    if sum % 11 == 0 {
        Ok(())
    } else {
        Err(IsbnError::Checksum)
    }
}

fn validate_isbn13(digits: &str) -> Result<(), IsbnError> {
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(IsbnError::InvalidCharacter(bad));
    }
    if !(digits.starts_with("978") || digits.starts_with("979")) {
        return Err(IsbnError::Prefix);
    }
    if isbn13_checksum(digits) % 10 == 0 {
        Ok(())
    } else {
        Err(IsbnError::Checksum)
    }
}

fn isbn13_checksum(digits: &str) -> u32 {
    digits
        .chars()
        .enumerate()
        .map(|(idx, c)| {
            let d = c.to_digit(10).unwrap_or(0);
            if idx % 2 == 0 {
                d
            } else {
                d * 3
            }
        })
        .sum()
}

fn isbn10_to_isbn13(isbn10: &str) -> String {
    let stem = format!("978{}", &isbn10[..9]);
    let check = (10 - isbn13_checksum(&stem) % 10) % 10;
    format!("{}{}", stem, check)
}

/// Runs of digits joined by hyphens, optionally ending in an ISBN-10 check `X`
fn candidate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[0-9](?:-?[0-9])*(?:-?[Xx])?").expect("static ISBN pattern is valid")
    })
}

/// Extract the book identifier from a shelf directory name.
///
/// Candidate runs are scanned left to right and the first one holding a
/// valid ISBN wins. Only hyphens count as separators inside a candidate.
pub fn resolve_identifier(name: &str) -> Result<BookIdentifier, DexError> {
    candidate_pattern()
        .find_iter(name)
        .find_map(|m| first_isbn_in(m.as_str()))
        .ok_or_else(|| DexError::IdentifierNotFound {
            name: name.to_string(),
        })
}

/// Leftmost valid 13-character window of a run, else its leftmost valid
/// 10-character window. Runs may be longer than an ISBN ("9780141439518-2").
fn first_isbn_in(run: &str) -> Option<BookIdentifier> {
    let compact: String = run.chars().filter(|c| *c != '-').collect();

    [13, 10]
        .into_iter()
        .filter(|width| compact.len() >= *width)
        .find_map(|width| {
            (0..=compact.len() - width)
                .find_map(|start| BookIdentifier::parse(&compact[start..start + width]).ok())
        })
}
