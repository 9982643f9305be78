//! Basic credential extraction.
//!
//! The extractor never fails: any malformed header yields `None`, which the
//! directory rule reports as an invalid `Authorization` header.

use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::Secret;

const BASIC_PREFIX: &str = "Basic ";

/// Standard alphabet; trailing `=` padding is accepted but not required.
const BASIC_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Username/password pair decoded from a `Basic` header.
///
/// The gateway only reads the username (an email address used for the
/// directory lookup); the password is kept behind [`Secret`] and never logged.
pub struct Credential {
    username: String,
    password: Secret<String>,
}

impl Credential {
    /// The part of the decoded header before the first `:`.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The part of the decoded header after the first `:`.
    pub fn password(&self) -> &Secret<String> {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &self.password)
            .finish()
    }
}

/// Parses a raw `Authorization` header value into a [`Credential`].
///
/// Returns `None` when the header is absent, lacks the `"Basic "` prefix, is
/// not valid base64, does not decode to UTF-8, or has no `:` separator.
///
/// # Examples
///
/// ```
/// use admission_gate::extract_credential;
///
/// // "alice@example.com:hunter2"
/// let header = "Basic YWxpY2VAZXhhbXBsZS5jb206aHVudGVyMg==";
/// let credential = extract_credential(Some(header)).unwrap();
/// assert_eq!(credential.username(), "alice@example.com");
///
/// assert!(extract_credential(Some("Bearer token")).is_none());
/// assert!(extract_credential(None).is_none());
/// ```
pub fn extract_credential(header: Option<&str>) -> Option<Credential> {
    let encoded = header?.strip_prefix(BASIC_PREFIX)?;
    let decoded = match BASIC_ENGINE.decode(encoded) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "authorization header is not valid base64");
            return None;
        }
    };
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;

    Some(Credential {
        username: username.to_string(),
        password: Secret::new(password.to_string()),
    })
}
