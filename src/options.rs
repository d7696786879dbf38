//! Options accepted by [`atomic_write`](crate::atomic_write).

use serde::{Deserialize, Serialize};

/// Per-call configuration for an atomic write.
///
/// Deserializes from `camelCase` keys with every field optional, so it can be
/// embedded directly in a host application's config file:
///
/// ```
/// let opts: planck::AtomicWriteOptions =
///     serde_json::from_str(r#"{"preserveMode": true}"#).expect("should parse options");
/// assert!(opts.preserve_mode);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtomicWriteOptions {
    /// Copy the existing target's permission bits onto the new content.
    pub preserve_mode: bool,
}

impl AtomicWriteOptions {
    /// Options with every field at its default.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            preserve_mode: false,
        }
    }

    /// Set whether the existing target's mode is carried over.
    #[must_use]
    pub const fn preserve_mode(mut self, preserve: bool) -> Self {
        self.preserve_mode = preserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_does_not_preserve() {
        assert!(!AtomicWriteOptions::default().preserve_mode);
        assert_eq!(AtomicWriteOptions::new(), AtomicWriteOptions::default());
    }

    #[test]
    fn test_builder() {
        assert!(AtomicWriteOptions::new().preserve_mode(true).preserve_mode);
    }
}
