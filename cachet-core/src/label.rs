//! Driver label type for identifying cache drivers.
//!
//! `DriverLabel` wraps a `SmolStr` so driver names used in logs, metrics
//! and tier paths can't be mixed up with cache keys.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying a cache driver.
///
/// Used for:
/// - Driver identification in `Driver::label()`
/// - Tier paths inside a chain (e.g., "chain.memory")
/// - Metrics and tracing fields
///
/// # Example
/// ```
/// use cachet_core::DriverLabel;
///
/// let label = DriverLabel::new("chain");
/// let tier = label.compose(&DriverLabel::new("file"));
/// assert_eq!(tier.as_str(), "chain.file");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DriverLabel(SmolStr);

impl DriverLabel {
    /// Creates a new driver label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a driver label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Composes two labels with a dot separator: "self.other".
    #[inline]
    pub fn compose(&self, other: &DriverLabel) -> Self {
        Self(SmolStr::from(format!("{}.{}", self.0, other.0)))
    }
}

impl fmt::Display for DriverLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DriverLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for DriverLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for DriverLabel {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_static() {
        let label = DriverLabel::new_static("redis");
        assert_eq!(label.as_str(), "redis");
    }

    #[test]
    fn test_compose_nested() {
        let outer = DriverLabel::new("chain");
        let inner = DriverLabel::new("chain");
        let leaf = DriverLabel::new("memory");

        let composed = outer.compose(&inner).compose(&leaf);
        assert_eq!(composed.as_str(), "chain.chain.memory");
    }

    #[test]
    fn test_display() {
        let label: DriverLabel = "file".into();
        assert_eq!(format!("{}", label), "file");
    }
}
