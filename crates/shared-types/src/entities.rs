//! # Core Entities
//!
//! Account identities and authorities.
//!
//! ## Clusters
//!
//! - **Identity**: `AccountName`, `PermissionName`, `Authority`
//! - **Time**: `Timestamp`

use crate::errors::NameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Maximum length of an account or permission name.
const MAX_NAME_LEN: usize = 12;

fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong {
            name: name.to_string(),
        });
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '1'..='5' | '.'))
    {
        return Err(NameError::InvalidCharacter {
            name: name.to_string(),
            ch,
        });
    }
    if name.ends_with('.') {
        return Err(NameError::TrailingDot {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// An on-chain account name.
///
/// 1 to 12 characters drawn from `a-z`, `1-5` and `.`, not ending in `.`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    /// Builds a validated account name.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    /// Builds an account name from a literal known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid account name.
    #[must_use]
    pub fn from_static(name: &'static str) -> Self {
        match validate_name(name) {
            Ok(()) => Self(name.to_string()),
            Err(err) => panic!("invalid static account name: {err}"),
        }
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

/// A named permission of an account (`active`, `owner`, `oracle`, ...).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    /// The default permission used by accounts to sign actions.
    pub const ACTIVE: &'static str = "active";

    /// Builds a validated permission name.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    /// The `active` permission.
    #[must_use]
    pub fn active() -> Self {
        Self(Self::ACTIVE.to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.0
    }
}

/// An `actor@permission` pair: the unit of signing authority.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Authority {
    /// Signing account.
    pub actor: AccountName,
    /// Permission of `actor` that signed.
    pub permission: PermissionName,
}

impl Authority {
    /// Creates an authority from its parts.
    #[must_use]
    pub fn new(actor: AccountName, permission: PermissionName) -> Self {
        Self { actor, permission }
    }

    /// Shorthand for `actor@active`.
    #[must_use]
    pub fn active(actor: AccountName) -> Self {
        Self::new(actor, PermissionName::active())
    }
}

impl fmt::Debug for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}

/// Parses `actor@permission`, or a bare `actor` meaning `actor@active`.
impl FromStr for Authority {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((actor, permission)) => Ok(Self::new(
                AccountName::new(actor)?,
                PermissionName::new(permission)?,
            )),
            None => Ok(Self::active(AccountName::new(s)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_account_names() {
        for name in ["alice", "a", "fairbet.bank", "abcdefghijk1", "x.y.z"] {
            assert!(AccountName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_account_names() {
        assert_eq!(AccountName::new(""), Err(NameError::Empty));
        assert!(matches!(
            AccountName::new("abcdefghijklm"),
            Err(NameError::TooLong { .. })
        ));
        assert!(matches!(
            AccountName::new("Alice"),
            Err(NameError::InvalidCharacter { ch: 'A', .. })
        ));
        assert!(matches!(
            AccountName::new("bob9"),
            Err(NameError::InvalidCharacter { ch: '9', .. })
        ));
        assert!(matches!(
            AccountName::new("bob."),
            Err(NameError::TrailingDot { .. })
        ));
    }

    #[test]
    fn test_authority_from_str() {
        let owner: Authority = "alice@owner".parse().unwrap();
        assert_eq!(owner.to_string(), "alice@owner");
        let active: Authority = "bob".parse().unwrap();
        assert_eq!(active, Authority::active(AccountName::from_static("bob")));
        assert!("Bob@active".parse::<Authority>().is_err());
    }

    #[test]
    #[should_panic(expected = "invalid static account name")]
    fn test_from_static_rejects_invalid_literal() {
        let _ = AccountName::from_static("Nope");
    }

    #[test]
    fn test_account_name_serde_validates() {
        let ok: AccountName = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
        assert!(serde_json::from_str::<AccountName>("\"NOPE\"").is_err());
    }

    #[test]
    fn test_authority_display() {
        let auth = Authority::active(AccountName::new("witness").unwrap());
        assert_eq!(auth.to_string(), "witness@active");
    }
}
