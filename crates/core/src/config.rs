//! Store configuration with environment overrides.

use crate::SortOrder;

/// Configuration consumed by the storage and service layers.
///
/// Owned by the embedding application; `from_env` provides the usual
/// deployment knobs with warn-on-invalid fallbacks.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Default page size when a request does not ask for one.
    pub items_per_page: u32,
    /// Hard cap on requested page sizes.
    pub items_per_page_max: u32,
    /// Sort direction for unread-only listings.
    pub unread_order: SortOrder,
    /// Age-based retention window in days. Zero disables age-based cleanup;
    /// orphan cleanup always runs.
    pub retention_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            items_per_page: 50,
            items_per_page_max: 200,
            unread_order: SortOrder::Desc,
            retention_days: 30,
        }
    }
}

impl StoreConfig {
    /// Build a config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let unread_order =
            match std::env::var("FEEDSTORE_UNREAD_ORDER").as_deref().map(str::to_lowercase) {
                Ok(v) if v == "asc" => SortOrder::Asc,
                Ok(v) if v == "desc" => SortOrder::Desc,
                Ok(v) => {
                    tracing::warn!(value = %v, "invalid FEEDSTORE_UNREAD_ORDER, using desc");
                    SortOrder::Desc
                },
                Err(_) => defaults.unread_order,
            };
        Self {
            items_per_page: env_parse_with_default(
                "FEEDSTORE_ITEMS_PER_PAGE",
                defaults.items_per_page,
            ),
            items_per_page_max: env_parse_with_default(
                "FEEDSTORE_ITEMS_PER_PAGE_MAX",
                defaults.items_per_page_max,
            ),
            unread_order,
            retention_days: env_parse_with_default(
                "FEEDSTORE_RETENTION_DAYS",
                defaults.retention_days,
            ),
        }
    }
}

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns
///   `default`, so a typo in deployment config never silently zeroes a knob.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}
