//! Store-wide policy knobs passed in by the embedding application.
//!
//! # Invariants
//! - `StoreConfig::default()` matches the layout shipped by the migrations:
//!   `SDMM` tag prefix and `TP` as the landline phone type code.

/// What happens to an item's audit trail when the item is deleted.
///
/// Either way the archive row keeps a JSON copy of the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteHistoryPolicy {
    /// Remove the item's `item_audit` rows together with the live row.
    #[default]
    Purge,
    /// Keep `item_audit` rows keyed by the removed id.
    Retain,
}

/// Configuration for the item store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Leading segment of every asset tag (`<prefix>-<code>-0001`).
    pub tag_prefix: String,
    /// Hardware type code whose items may carry a phone extension.
    pub landline_type_code: String,
    pub delete_history_policy: DeleteHistoryPolicy,
    /// Row cap applied by `list` when the caller passes no limit.
    pub default_list_limit: u32,
    /// Upper bound for any caller-supplied list limit.
    pub max_list_limit: u32,
    /// Entry cap applied by `history_for_item` when the caller passes none.
    pub history_default_limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tag_prefix: "SDMM".to_string(),
            landline_type_code: "TP".to_string(),
            delete_history_policy: DeleteHistoryPolicy::default(),
            default_list_limit: 500,
            max_list_limit: 5000,
            history_default_limit: 50,
        }
    }
}

impl StoreConfig {
    /// Resolves a caller-supplied list limit against the configured bounds.
    pub fn list_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_list_limit,
            Some(value) if value > self.max_list_limit => self.max_list_limit,
            Some(value) => value,
        }
    }

    /// Resolves a caller-supplied history limit.
    pub fn history_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.history_default_limit,
            Some(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteHistoryPolicy, StoreConfig};

    #[test]
    fn defaults_match_shipped_schema() {
        let config = StoreConfig::default();
        assert_eq!(config.tag_prefix, "SDMM");
        assert_eq!(config.landline_type_code, "TP");
        assert_eq!(config.delete_history_policy, DeleteHistoryPolicy::Purge);
    }

    #[test]
    fn list_limit_defaults_and_clamps() {
        let config = StoreConfig::default();
        assert_eq!(config.list_limit(None), 500);
        assert_eq!(config.list_limit(Some(0)), 500);
        assert_eq!(config.list_limit(Some(20)), 20);
        assert_eq!(config.list_limit(Some(1_000_000)), 5000);
    }
}
