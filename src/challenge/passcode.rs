//! Passcode generation and metadata encoding.

use rand::Rng;
use std::fmt;

/// Inclusive bounds keep every generated code at exactly 6 decimal digits.
pub const MIN: u32 = 100_000;
pub const MAX: u32 = 999_999;

const METADATA_PREFIX: &str = "CODE";

/// A 6-digit one-time passcode, kept as the exact string the user must echo
/// back. Comparison is plain string equality, no normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passcode(String);

impl Passcode {
    /// Draw a fresh passcode, uniform in [`MIN`, `MAX`].
    #[must_use]
    pub fn generate() -> Self {
        Self(rand::thread_rng().gen_range(MIN..=MAX).to_string())
    }

    /// Recover the live passcode from a previous attempt's metadata tag
    /// (`CODE-<6 digits>`): split on `-`, take the second token, verbatim.
    #[must_use]
    pub fn from_metadata(metadata: &str) -> Option<Self> {
        metadata
            .split('-')
            .nth(1)
            .filter(|code| !code.is_empty())
            .map(|code| Self(code.to_string()))
    }

    /// Metadata tag recorded on the attempt so the code survives the round
    /// trip through the provider's session store.
    #[must_use]
    pub fn metadata_tag(&self) -> String {
        format!("{METADATA_PREFIX}-{self}")
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
