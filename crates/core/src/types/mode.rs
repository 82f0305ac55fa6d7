//! Store operating mode.

use serde::{Deserialize, Serialize};

/// How a store does business: selling from a catalog, or taking bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    #[default]
    Products,
    Bookings,
}

impl StoreMode {
    /// Stable string form, as stored in the database and sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Bookings => "bookings",
        }
    }

    /// Parse a mode, returning `None` for anything but the two known values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "products" => Some(Self::Products),
            "bookings" => Some(Self::Bookings),
            _ => None,
        }
    }

    /// Parse a mode, falling back to [`StoreMode::Products`] when the value is
    /// missing or unrecognized.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for StoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default() {
        assert_eq!(StoreMode::parse_or_default(None), StoreMode::Products);
        assert_eq!(StoreMode::parse_or_default(Some("bookings")), StoreMode::Bookings);
        assert_eq!(StoreMode::parse_or_default(Some("catalog")), StoreMode::Products);
    }

    #[test]
    fn test_parse_is_strict() {
        assert_eq!(StoreMode::parse("Bookings"), None);
        assert_eq!(StoreMode::parse(" products "), Some(StoreMode::Products));
    }
}
