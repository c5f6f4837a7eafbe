//! Ordered search plans
//!
//! A plan is a list of concrete queries with an optional pause after each
//! one, so upstream throttling is expressed as data rather than inline
//! sleeps.

use super::SearchRequest;
use crate::intent::Intent;
use chrono::{Datelike, NaiveDate};
use std::time::Duration;

/// Pause between consecutive queries to stay under the provider's rate limit
pub const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStep {
    pub request: SearchRequest,
    pub pause_after: Option<Duration>,
}

impl SearchStep {
    pub fn new(request: SearchRequest) -> Self {
        Self {
            request,
            pause_after: None,
        }
    }

    pub fn then_pause(mut self, pause: Duration) -> Self {
        self.pause_after = Some(pause);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub steps: Vec<SearchStep>,
}

impl SearchPlan {
    pub fn single(request: SearchRequest) -> Self {
        Self {
            steps: vec![SearchStep::new(request)],
        }
    }

    /// Build the plan for an intent.
    ///
    /// Benefit-status questions get an executive/governor query followed by a
    /// schedule/court-order query; application questions get one templated
    /// query; anything else searches `query` as given.
    pub fn for_intent(intent: Intent, query: &str, state: Option<&str>, today: NaiveDate) -> Self {
        let year = today.year();
        match intent {
            Intent::SnapApplication => Self::single(
                SearchRequest::new(application_query(state, year))
                    .with_location(state)
                    .with_type(intent.as_str()),
            ),
            Intent::SnapBenefitStatus => {
                let executive = match state {
                    Some(state) => format!(
                        "{state} governor SNAP food stamps executive order {year} site:.gov"
                    ),
                    None => format!("SNAP food stamps executive order {year} site:.gov"),
                };
                let schedule = format!(
                    "{} SNAP benefits {} {year} disbursement schedule court order site:.gov",
                    state.unwrap_or("United States"),
                    today.format("%B"),
                );
                Self {
                    steps: vec![
                        SearchStep::new(SearchRequest::new(executive).with_location(state))
                            .then_pause(RATE_LIMIT_PAUSE),
                        SearchStep::new(SearchRequest::new(schedule).with_location(state)),
                    ],
                }
            }
            _ => Self::single(
                SearchRequest::new(query)
                    .with_location(state)
                    .with_type(intent.as_str()),
            ),
        }
    }
}

pub fn application_query(state: Option<&str>, year: i32) -> String {
    match state {
        Some(state) => format!("how to apply for SNAP benefits {state} {year}"),
        None => format!("how to apply for SNAP benefits {year}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn test_application_plan() {
        let plan = SearchPlan::for_intent(Intent::SnapApplication, "ignored", Some("PA"), date());
        assert_eq!(plan.steps.len(), 1);
        let request = &plan.steps[0].request;
        assert_eq!(request.query, "how to apply for SNAP benefits PA 2025");
        assert_eq!(request.location_hint.as_deref(), Some("PA"));
        assert_eq!(request.type_hint.as_deref(), Some("snap_application"));
        assert_eq!(plan.steps[0].pause_after, None);
    }

    #[test]
    fn test_status_plan_with_state() {
        let plan = SearchPlan::for_intent(Intent::SnapBenefitStatus, "ignored", Some("PA"), date());
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(
            plan.steps[0].request.query,
            "PA governor SNAP food stamps executive order 2025 site:.gov"
        );
        assert_eq!(plan.steps[0].pause_after, Some(RATE_LIMIT_PAUSE));
        assert_eq!(
            plan.steps[1].request.query,
            "PA SNAP benefits November 2025 disbursement schedule court order site:.gov"
        );
        assert_eq!(plan.steps[1].pause_after, None);
    }

    #[test]
    fn test_status_plan_without_state_is_national() {
        let plan = SearchPlan::for_intent(Intent::SnapBenefitStatus, "ignored", None, date());
        assert_eq!(
            plan.steps[0].request.query,
            "SNAP food stamps executive order 2025 site:.gov"
        );
        assert!(plan.steps[1].request.query.starts_with("United States SNAP benefits"));
    }

    #[test]
    fn test_other_intents_search_the_query() {
        let plan = SearchPlan::for_intent(Intent::GeneralQuestion, "snap income limits", None, date());
        assert_eq!(plan, SearchPlan::single(
            SearchRequest::new("snap income limits").with_type("general_question")
        ));
    }
}
