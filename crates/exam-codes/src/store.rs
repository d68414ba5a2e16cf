//! Shared holder of the current catalog snapshot.
//!
//! Readers take an `Arc` to a complete snapshot and keep using it for as
//! long as they like. Writers build a new catalog and swap it in; nothing
//! mutates a published snapshot.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::catalog::CodeCatalog;
use crate::table::CodeTable;

/// A pending locale refresh. Applying it only succeeds while its locale is
/// still the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRefresh {
    locale: String,
}

impl LocaleRefresh {
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

#[derive(Debug)]
struct State {
    catalog: Arc<CodeCatalog>,
    locale: Option<String>,
}

#[derive(Debug)]
pub struct CatalogStore {
    state: RwLock<State>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(CodeCatalog::with_builtin_tables())
    }
}

impl CatalogStore {
    pub fn new(catalog: CodeCatalog) -> Self {
        Self {
            state: RwLock::new(State {
                catalog: Arc::new(catalog),
                locale: None,
            }),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CodeCatalog> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.catalog)
    }

    pub fn locale(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.locale.clone()
    }

    /// Swaps in a whole new catalog.
    pub fn replace(&self, catalog: CodeCatalog) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.catalog = Arc::new(catalog);
    }

    /// Makes `locale` current and hands out the token for its refresh.
    pub fn begin_locale_refresh(&self, locale: impl Into<String>) -> LocaleRefresh {
        let locale = locale.into();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.locale = Some(locale.clone());
        debug!(%locale, "locale refresh started");
        LocaleRefresh { locale }
    }

    /// Registers translated tables and labels fetched for `refresh`. Returns
    /// false, leaving the catalog untouched, when the locale has changed
    /// since the refresh began.
    pub fn apply_locale_refresh(
        &self,
        refresh: &LocaleRefresh,
        tables: BTreeMap<String, CodeTable>,
        labels: BTreeMap<String, String>,
    ) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.locale.as_deref() != Some(refresh.locale.as_str()) {
            info!(
                stale = %refresh.locale,
                current = state.locale.as_deref().unwrap_or(""),
                "locale changed, discarding fetched codes"
            );
            return false;
        }
        let mut next = state.catalog.extended(tables);
        next.set_labels(labels);
        state.catalog = Arc::new(next);
        true
    }

    /// Adds user defined tables over the current catalog.
    pub fn apply_user_codes(&self, tables: BTreeMap<String, CodeTable>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let tables: BTreeMap<_, _> = tables
            .into_iter()
            .filter(|(name, _)| name != "errors")
            .collect();
        debug!(tables = tables.len(), "applying user defined codes");
        state.catalog = Arc::new(state.catalog.extended(tables));
    }
}
