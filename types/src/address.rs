//! Wallet-style identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A wallet-style identifier used for users, claim owners, voters and payout
/// addresses.
///
/// Identifiers compare case-insensitively: the canonical form is trimmed and
/// lower-cased at construction, so `0xABC` and `0xabc` are the same wallet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletId(String);

impl WalletId {
    /// Parse and canonicalise a raw identifier.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, TypesError> {
        let canonical = raw.as_ref().trim().to_lowercase();
        if canonical.is_empty() || canonical.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidWallet(raw.as_ref().to_string()));
        }
        Ok(Self(canonical))
    }

    /// Return the canonical (lower-cased) identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WalletId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<WalletId> for String {
    fn from(id: WalletId) -> Self {
        id.0
    }
}
