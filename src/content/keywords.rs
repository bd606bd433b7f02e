//! Built-in keyword lists used by the content checker.

use serde::{Deserialize, Serialize};

const LUXURY: &[&str] = &[
    "luxury",
    "luxurious",
    "yacht",
    "mansion",
    "penthouse",
    "designer bag",
    "rolex",
    "ferrari",
    "lamborghini",
    "porsche",
    "private jet",
    "first class",
    "sports car",
    "vacation",
    "jewelry",
    "jewellery",
    "gucci",
    "louis vuitton",
    "champagne",
];

const INAPPROPRIATE: &[&str] = &[
    "hate speech",
    "racist",
    "nazi",
    "terrorist",
    "murder",
    "assassinate",
    "firearm",
    "ammunition",
    "explosives",
    "cocaine",
    "heroin",
    "methamphetamine",
    "illegal drugs",
    "casino",
    "gambling debt",
    "porn",
    "escort service",
];

const SUSPICIOUS: &[&str] = &[
    "guaranteed return",
    "guaranteed profit",
    "double your money",
    "investment opportunity",
    "wire transfer",
    "western union",
    "moneygram",
    "gift card",
    "bitcoin only",
    "crypto only",
    "cash only",
    "send money",
    "no questions asked",
    "ponzi",
    "pyramid scheme",
    "scam",
    "act now",
    "urgent",
    "last chance",
    "limited time",
    "before it's too late",
];

const TRUST: &[&str] = &[
    "transparent",
    "transparency",
    "documented",
    "documentation",
    "receipt",
    "invoice",
    "verified",
    "audited",
    "accountability",
    "accountable",
    "progress report",
    "budget breakdown",
    "itemized",
    "registered charity",
    "financial statement",
];

/// Keyword lists for each screening category.
///
/// Terms are matched case-insensitively on word boundaries; a trailing
/// plural `s`/`es` is accepted, and spaces inside a term match any run
/// of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLists {
    /// Luxury spending terms.
    pub luxury: Vec<String>,
    /// Hateful, violent, or illegal-goods terms.
    pub inappropriate: Vec<String>,
    /// Fraud, scam, and urgency-pressure terms.
    pub suspicious: Vec<String>,
    /// Transparency and accountability signals.
    pub trust: Vec<String>,
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| (*t).to_string()).collect()
}

impl Default for KeywordLists {
    fn default() -> Self {
        Self {
            luxury: owned(LUXURY),
            inappropriate: owned(INAPPROPRIATE),
            suspicious: owned(SUSPICIOUS),
            trust: owned(TRUST),
        }
    }
}
