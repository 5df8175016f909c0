use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use zeroize::Zeroize;

/// A sensitive string that must never be logged or cloned.
///
/// - Not `Clone`: ownership of a credential moves, it is never duplicated
/// - `Debug` / `Display` never print the real content
/// - The buffer is zeroed on drop
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Create a new SecretString.
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// An empty secret, used for flows that complete without a credential.
    pub fn empty() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Borrow the inner secret as &str.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consume and return the inner String.
    ///
    /// Only for handing the credential across the host boundary.
    pub fn into_inner(mut self) -> String {
        let mut tmp = String::new();
        std::mem::swap(&mut self.inner, &mut tmp);
        tmp
    }
}

/* ===========================
 * Trait implementations
 * ===========================
 */

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.expose()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

/// Deserialize an optional credential straight into a [`SecretString`].
///
/// `SecretString` deliberately has no `Deserialize` impl; page messages that
/// carry a password opt in field by field with
/// `#[serde(default, deserialize_with = "deserialize_optional_secret")]`.
///
/// Anything other than a string reads as no credential rather than failing
/// the surrounding message.
pub fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(Some(SecretString::new(value))),
        _ => Ok(None),
    }
}
