//! User directory contract.

use std::collections::HashMap;

use crate::error::DirectoryError;

/// A user record as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Account email, also the Basic-auth username.
    pub email: String,
    /// Whether the account completed email verification.
    pub verified: bool,
}

impl UserRecord {
    /// Creates a record.
    pub fn new(email: impl Into<String>, verified: bool) -> Self {
        Self {
            email: email.into(),
            verified,
        }
    }
}

/// Lookup of user records by email.
///
/// `Ok(None)` means "no such user". `Err` is reserved for the lookup itself
/// failing.
pub trait UserDirectory: Send + Sync {
    /// Finds the record whose email equals `email`.
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;
}

/// Directory backed by a `HashMap`, populated up front.
///
/// # Examples
///
/// ```
/// use admission_gate::{InMemoryDirectory, UserDirectory, UserRecord};
///
/// let directory = InMemoryDirectory::new()
///     .with_user(UserRecord::new("alice@example.com", true));
///
/// assert!(directory.find_by_email("alice@example.com").unwrap().is_some());
/// assert!(directory.find_by_email("bob@example.com").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: HashMap<String, UserRecord>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record, keyed by its email.
    pub fn with_user(mut self, record: UserRecord) -> Self {
        self.users.insert(record.email.clone(), record);
        self
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if the directory holds no records.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.get(email).cloned())
    }
}
