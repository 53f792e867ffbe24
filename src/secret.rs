//! Opaque credential wrapper and redacted rendering.
//!
//! [`Secret`] has no `Display` implementation and its `Debug` output is a
//! fixed mask, so a secret can only reach a string through an explicit call
//! to [`Secret::expose`] at the point where it is handed to a client library.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// Mask rendered in place of secret material.
pub const MASK: &str = "**********";

/// A credential value that is never printed.
pub struct Secret(SecretString);

impl Secret {
    /// Reveal the secret for use in an outbound call.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(SecretString::from(value))
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self::from(self.expose())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret::from)
    }
}

/// Configurations that can be rendered without their credentials.
pub trait Redact {
    /// Human-readable rendering with every credential masked.
    fn redacted(&self) -> String;

    /// Secrets held by this value, used to scrub free-form error text.
    fn secrets(&self) -> Vec<&Secret> {
        Vec::new()
    }
}
