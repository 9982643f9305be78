use std::fmt;

/// A wrapper that keeps credential material out of logs.
///
/// The gateway handles two kinds of sensitive values: the raw `Authorization`
/// header carried by a [`RequestSnapshot`](crate::RequestSnapshot) and the
/// password half of a decoded [`Credential`](crate::Credential). Both are
/// stored as `Secret<String>` so that a stray `{:?}` in a `tracing` event
/// cannot leak them.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - Access requires the explicit [`expose_secret`](Self::expose_secret) call
///
/// # Examples
///
/// ```
/// use admission_gate::Secret;
///
/// let header = Secret::new("Basic YWxpY2VAZXhhbXBsZS5jb206aHVudGVyMg==".to_string());
///
/// assert_eq!(format!("{:?}", header), "[REDACTED]");
/// assert!(header.expose_secret().starts_with("Basic "));
/// ```
// Do NOT add Clone, Copy, or Default derives: they would let credentials be
// duplicated past the redaction boundary.
pub struct Secret<T> {
    // MUST remain private (CWE-532).
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    ///
    /// Callers must not log or echo the returned reference.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    /// MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    /// MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
