//! Keyword fallback classifier
//!
//! Ordered regex tests, first match wins. Store and resource vocabulary
//! overlap, so the order below is significant.

use super::Intent;
use regex::Regex;
use std::sync::LazyLock;

struct KeywordPatterns {
    greeting: Regex,
    apply_verb: Regex,
    benefit_term: Regex,
    benefit_status: Regex,
    halal: Regex,
    kosher: Regex,
    food_bank: Regex,
    soup_kitchen: Regex,
    store_verb: Regex,
    snap_term: Regex,
    resources: Regex,
}

static PATTERNS: LazyLock<KeywordPatterns> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("Invalid keyword regex");

    KeywordPatterns {
        greeting: re(r"(?i)\b(hi|hello|hey|good morning|good afternoon|thanks|thank you)\b"),
        apply_verb: re(r"(?i)\b(apply|application|sign up|register|enroll)"),
        benefit_term: re(r"(?i)\b(snap|ebt|benefit)"),
        benefit_status: re(
            r"(?i)\b(status|disbursement|cancel|shutdown)|\bwhen\b.*\bbenefit|\bwhere\b.*\bmoney\b",
        ),
        halal: re(r"(?i)halal"),
        kosher: re(r"(?i)kosher"),
        food_bank: re(r"(?i)food bank|\bpantry\b|\bpantries\b"),
        soup_kitchen: re(r"(?i)soup kitchen|hot meal|free meal"),
        store_verb: re(r"(?i)\b(store|shop|market|grocery)|\bwhere\b.*\bbuy\b"),
        snap_term: re(r"(?i)\b(snap|ebt)\b"),
        resources: re(r"(?i)\b(resource|help|food|assistance)"),
    }
});

/// Guess an intent from keywords alone. Pure and total.
pub fn classify_by_keywords(message: &str) -> Intent {
    let p = &*PATTERNS;

    if p.greeting.is_match(message) {
        Intent::Greeting
    } else if p.apply_verb.is_match(message) && p.benefit_term.is_match(message) {
        Intent::SnapApplication
    } else if p.benefit_status.is_match(message) {
        Intent::SnapBenefitStatus
    } else if p.halal.is_match(message) {
        Intent::FindHalal
    } else if p.kosher.is_match(message) {
        Intent::FindKosher
    } else if p.food_bank.is_match(message) {
        Intent::FindFoodBank
    } else if p.soup_kitchen.is_match(message) {
        Intent::FindSoupKitchen
    } else if p.store_verb.is_match(message) && p.snap_term.is_match(message) {
        Intent::FindSnapStore
    } else if p.resources.is_match(message) {
        Intent::GeneralResources
    } else {
        Intent::GeneralQuestion
    }
}
