//! Tradable universe service.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use sirocco_core::types::Symbol;

/// Read-only universe catalog.
///
/// Holds dated snapshots of the tradable symbol set; a query returns the
/// snapshot in effect at the requested date (the latest snapshot at or
/// before it).
#[derive(Debug, Clone, Default)]
pub struct Universe {
    snapshots: BTreeMap<NaiveDate, HashSet<Symbol>>,
}

impl Universe {
    /// Creates a universe with one snapshot effective from `as_of`.
    #[must_use]
    pub fn with_snapshot(as_of: NaiveDate, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut universe = Self::default();
        universe.add_snapshot(as_of, symbols);
        universe
    }

    /// Adds a snapshot effective from `as_of`.
    pub fn add_snapshot(&mut self, as_of: NaiveDate, symbols: impl IntoIterator<Item = Symbol>) {
        self.snapshots.insert(as_of, symbols.into_iter().collect());
    }

    /// Returns the symbol set in effect at `as_of`. Empty when no
    /// snapshot is effective yet.
    #[must_use]
    pub fn as_of(&self, as_of: NaiveDate) -> HashSet<Symbol> {
        self.snapshots
            .range(..=as_of)
            .next_back()
            .map(|(_, symbols)| symbols.clone())
            .unwrap_or_default()
    }

    /// Returns true if no snapshot is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
