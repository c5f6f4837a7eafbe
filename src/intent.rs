//! Intent classification
//!
//! Every chat message is assigned exactly one [`Intent`] from a closed set.
//! The LLM classifier is authoritative; keyword matching stands in when the
//! LLM is unreachable.

mod classifier;
mod keyword;

pub use classifier::IntentClassifier;
pub use keyword::classify_by_keywords;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of conversational intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    SnapApplication,
    SnapBenefitStatus,
    FindFoodBank,
    FindSoupKitchen,
    FindSnapStore,
    FindHalal,
    FindKosher,
    GeneralResources,
    GeneralQuestion,
    Other,
}

impl Intent {
    pub const ALL: [Intent; 11] = [
        Intent::Greeting,
        Intent::SnapApplication,
        Intent::SnapBenefitStatus,
        Intent::FindFoodBank,
        Intent::FindSoupKitchen,
        Intent::FindSnapStore,
        Intent::FindHalal,
        Intent::FindKosher,
        Intent::GeneralResources,
        Intent::GeneralQuestion,
        Intent::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::SnapApplication => "snap_application",
            Intent::SnapBenefitStatus => "snap_benefit_status",
            Intent::FindFoodBank => "find_food_bank",
            Intent::FindSoupKitchen => "find_soup_kitchen",
            Intent::FindSnapStore => "find_snap_store",
            Intent::FindHalal => "find_halal",
            Intent::FindKosher => "find_kosher",
            Intent::GeneralResources => "general_resources",
            Intent::GeneralQuestion => "general_question",
            Intent::Other => "other",
        }
    }

    /// Map a raw classifier reply onto the closed set.
    ///
    /// The reply is trimmed, lower-cased and stripped of surrounding quotes or
    /// punctuation. Anything that still isn't a known label becomes `Other`.
    pub fn from_reply(reply: &str) -> Self {
        let token = reply
            .trim()
            .to_lowercase()
            .trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .to_string();
        token.parse().unwrap_or(Intent::Other)
    }

    /// Intents answered by an LLM call grounded in web search results
    pub fn is_search_augmented(self) -> bool {
        matches!(self, Intent::SnapApplication | Intent::SnapBenefitStatus)
    }

    /// Intents answered from the resource database
    pub fn is_lookup(self) -> bool {
        matches!(
            self,
            Intent::FindFoodBank
                | Intent::FindSoupKitchen
                | Intent::FindSnapStore
                | Intent::FindHalal
                | Intent::FindKosher
                | Intent::GeneralResources
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for labels outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent: {0}")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
            assert_eq!(
                serde_json::to_value(intent).unwrap(),
                serde_json::Value::String(intent.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_from_reply_normalizes() {
        assert_eq!(Intent::from_reply("  Find_Halal \n"), Intent::FindHalal);
        assert_eq!(Intent::from_reply("\"greeting\"."), Intent::Greeting);
        assert_eq!(Intent::from_reply("SNAP_BENEFIT_STATUS"), Intent::SnapBenefitStatus);
    }

    #[test]
    fn test_from_reply_clamps_unknown_to_other() {
        assert_eq!(Intent::from_reply("weather_report"), Intent::Other);
        assert_eq!(Intent::from_reply(""), Intent::Other);
        assert_eq!(
            Intent::from_reply("The category is find_halal"),
            Intent::Other
        );
    }

    #[test]
    fn test_branch_predicates_are_disjoint() {
        for intent in Intent::ALL {
            assert!(!(intent.is_lookup() && intent.is_search_augmented()));
        }
        assert_eq!(Intent::ALL.iter().filter(|i| i.is_lookup()).count(), 6);
    }
}
