/// Location recorded when no geolocation is available.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Best-effort geolocation for an access event.
pub trait Locator: Send + Sync + 'static {
    /// Returns a human-readable location, or `None` if it can't be determined.
    fn locate(&self, referrer: &str) -> Option<String>;
}

/// Reports the same location for every access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLocator {
    location: String,
}

impl FixedLocator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl Default for FixedLocator {
    fn default() -> Self {
        Self::new(UNKNOWN_LOCATION)
    }
}

impl Locator for FixedLocator {
    fn locate(&self, _referrer: &str) -> Option<String> {
        Some(self.location.clone())
    }
}
