//! Resource lookups for location-style intents
//!
//! [`LocationQueryRouter`] maps an intent and the user's location onto one
//! store query. The outcome is typed so callers branch on it explicitly
//! instead of catching store errors.

mod format;

pub use format::format_results;

use crate::db::{DbError, LocationLookup, LocationRecord};
use crate::intent::Intent;
use std::sync::Arc;

/// Which store query a lookup intent maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    FoodBank,
    SoupKitchen,
    SnapStores,
    Halal,
    Kosher,
    Location,
}

impl LookupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::FoodBank => "food_bank",
            LookupKind::SoupKitchen => "soup_kitchen",
            LookupKind::SnapStores => "snap_stores",
            LookupKind::Halal => "halal",
            LookupKind::Kosher => "kosher",
            LookupKind::Location => "location",
        }
    }
}

/// A resolved lookup: what to ask and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub kind: LookupKind,
    pub location: Option<String>,
}

impl LookupQuery {
    /// Pick the query for `intent`. City is preferred over state. Returns
    /// `None` for intents that don't read the store, and for
    /// `general_resources` without any location.
    pub fn for_intent(intent: Intent, city: Option<&str>, state: Option<&str>) -> Option<Self> {
        let location = city.or(state).map(String::from);
        let kind = match intent {
            Intent::FindFoodBank => LookupKind::FoodBank,
            Intent::FindSoupKitchen => LookupKind::SoupKitchen,
            Intent::FindSnapStore => LookupKind::SnapStores,
            Intent::FindHalal => LookupKind::Halal,
            Intent::FindKosher => LookupKind::Kosher,
            Intent::GeneralResources if location.is_some() => LookupKind::Location,
            _ => return None,
        };
        Some(Self { kind, location })
    }
}

#[derive(Debug)]
pub enum LookupOutcome {
    Found {
        kind: LookupKind,
        records: Vec<LocationRecord>,
    },
    Empty,
    /// The intent has no store query (or lacks the location it needs)
    NotApplicable,
    Unavailable(DbError),
}

pub struct LocationQueryRouter {
    lookup: Arc<dyn LocationLookup>,
}

impl LocationQueryRouter {
    pub fn new(lookup: Arc<dyn LocationLookup>) -> Self {
        Self { lookup }
    }

    pub async fn route(&self, intent: Intent, city: Option<&str>, state: Option<&str>) -> LookupOutcome {
        let Some(query) = LookupQuery::for_intent(intent, city, state) else {
            return LookupOutcome::NotApplicable;
        };
        tracing::debug!(kind = query.kind.as_str(), location = ?query.location, "Resource lookup");

        let location = query.location.as_deref();
        let result = match query.kind {
            LookupKind::FoodBank => self.lookup.search_by_type("food bank", location).await,
            LookupKind::SoupKitchen => self.lookup.search_by_type("kitchen", location).await,
            LookupKind::SnapStores => self.lookup.search_snap_accepting(location).await,
            LookupKind::Halal => self.lookup.search_by_dietary("halal", location).await,
            LookupKind::Kosher => self.lookup.search_by_dietary("kosher", location).await,
            LookupKind::Location => match location {
                Some(location) => self.lookup.all_by_location(location).await,
                None => return LookupOutcome::NotApplicable,
            },
        };

        match result {
            Ok(records) if records.is_empty() => LookupOutcome::Empty,
            Ok(records) => LookupOutcome::Found {
                kind: query.kind,
                records,
            },
            Err(e) => {
                tracing::error!(error = %e, kind = query.kind.as_str(), "Resource lookup failed");
                LookupOutcome::Unavailable(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded_database, FailingLookup};

    #[test]
    fn test_query_prefers_city_over_state() {
        let query = LookupQuery::for_intent(Intent::FindFoodBank, Some("Pittsburgh"), Some("PA")).unwrap();
        assert_eq!(query.kind, LookupKind::FoodBank);
        assert_eq!(query.location.as_deref(), Some("Pittsburgh"));

        let query = LookupQuery::for_intent(Intent::FindKosher, None, Some("PA")).unwrap();
        assert_eq!(query.location.as_deref(), Some("PA"));

        let query = LookupQuery::for_intent(Intent::FindSnapStore, None, None).unwrap();
        assert_eq!(query.location, None);
    }

    #[test]
    fn test_general_resources_needs_location() {
        assert_eq!(LookupQuery::for_intent(Intent::GeneralResources, None, None), None);
        let query = LookupQuery::for_intent(Intent::GeneralResources, None, Some("OH")).unwrap();
        assert_eq!(query.kind, LookupKind::Location);
    }

    #[test]
    fn test_non_lookup_intents_have_no_query() {
        for intent in Intent::ALL.into_iter().filter(|i| !i.is_lookup()) {
            assert_eq!(LookupQuery::for_intent(intent, Some("Erie"), Some("PA")), None, "{intent}");
        }
    }

    #[tokio::test]
    async fn test_route_food_bank_in_city() {
        let router = LocationQueryRouter::new(Arc::new(seeded_database()));
        match router.route(Intent::FindFoodBank, Some("Pittsburgh"), None).await {
            LookupOutcome::Found { kind, records } => {
                assert_eq!(kind, LookupKind::FoodBank);
                assert_eq!(records.len(), 1);
            }
            other => panic!("expected records, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_route_empty_and_not_applicable() {
        let router = LocationQueryRouter::new(Arc::new(seeded_database()));
        assert!(matches!(
            router.route(Intent::FindSoupKitchen, Some("Boise"), None).await,
            LookupOutcome::Empty
        ));
        assert!(matches!(
            router.route(Intent::Greeting, Some("Boise"), None).await,
            LookupOutcome::NotApplicable
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_a_value() {
        let router = LocationQueryRouter::new(Arc::new(FailingLookup));
        assert!(matches!(
            router.route(Intent::FindHalal, None, None).await,
            LookupOutcome::Unavailable(_)
        ));
    }
}
