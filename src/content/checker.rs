//! Keyword screening of campaign text.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use super::KeywordLists;
use crate::domain::ContentFlag;

/// Which categories matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentChecks {
    /// Luxury spending language found.
    pub has_luxury: bool,
    /// Hateful, violent, or illegal-goods language found.
    pub has_inappropriate: bool,
    /// Fraud, scam, or urgency-pressure language found.
    pub has_suspicious: bool,
    /// Transparency signals found.
    pub has_trust: bool,
}

/// The distinct terms matched per category, lower-cased and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContentMatches {
    /// Matched luxury terms.
    pub luxury: Vec<String>,
    /// Matched inappropriate terms.
    pub inappropriate: Vec<String>,
    /// Matched suspicious terms.
    pub suspicious: Vec<String>,
    /// Matched trust terms.
    pub trust: Vec<String>,
}

/// Result of screening a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContentCheck {
    /// `true` iff no negative category matched.
    pub passed: bool,
    /// Per-category match flags.
    pub checks: ContentChecks,
    /// Terms that triggered each category.
    pub matches: ContentMatches,
}

impl ContentCheck {
    /// Negative categories that matched, in a stable order.
    #[must_use]
    pub fn flags(&self) -> Vec<ContentFlag> {
        let mut flags = Vec::new();
        if self.checks.has_luxury {
            flags.push(ContentFlag::Luxury);
        }
        if self.checks.has_inappropriate {
            flags.push(ContentFlag::Inappropriate);
        }
        if self.checks.has_suspicious {
            flags.push(ContentFlag::Suspicious);
        }
        flags
    }
}

/// Compiled keyword matcher.
///
/// Each category compiles to one case-insensitive alternation. An empty
/// list never matches. Build once at startup and share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ContentChecker {
    luxury: Option<Regex>,
    inappropriate: Option<Regex>,
    suspicious: Option<Regex>,
    trust: Option<Regex>,
}

impl ContentChecker {
    /// Compiles the given keyword lists.
    ///
    /// # Errors
    ///
    /// Returns a [`regex::Error`] if a compiled pattern exceeds the regex
    /// size limit.
    pub fn new(lists: &KeywordLists) -> Result<Self, regex::Error> {
        Ok(Self {
            luxury: compile(&lists.luxury)?,
            inappropriate: compile(&lists.inappropriate)?,
            suspicious: compile(&lists.suspicious)?,
            trust: compile(&lists.trust)?,
        })
    }

    /// Screens `text`. Empty text passes with every flag cleared.
    #[must_use]
    pub fn check(&self, text: &str) -> ContentCheck {
        let matches = ContentMatches {
            luxury: find_terms(self.luxury.as_ref(), text),
            inappropriate: find_terms(self.inappropriate.as_ref(), text),
            suspicious: find_terms(self.suspicious.as_ref(), text),
            trust: find_terms(self.trust.as_ref(), text),
        };
        let checks = ContentChecks {
            has_luxury: !matches.luxury.is_empty(),
            has_inappropriate: !matches.inappropriate.is_empty(),
            has_suspicious: !matches.suspicious.is_empty(),
            has_trust: !matches.trust.is_empty(),
        };
        ContentCheck {
            passed: !(checks.has_luxury || checks.has_inappropriate || checks.has_suspicious),
            checks,
            matches,
        }
    }

    /// Screens several fragments as one document.
    #[must_use]
    pub fn check_all<'a, I>(&self, fragments: I) -> ContentCheck
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = fragments.into_iter().collect::<Vec<_>>().join("\n");
        self.check(&joined)
    }
}

fn compile(terms: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternation = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>();
    if alternation.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})(?:e?s)?\b", alternation.join("|"));
    Regex::new(&pattern).map(Some)
}

fn find_terms(re: Option<&Regex>, text: &str) -> Vec<String> {
    let Some(re) = re else {
        return Vec::new();
    };
    re.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn checker() -> ContentChecker {
        let Ok(checker) = ContentChecker::new(&KeywordLists::default()) else {
            panic!("default keyword lists must compile");
        };
        checker
    }

    #[test]
    fn fraud_language_fails() {
        let result = checker().check("guaranteed returns, wire transfer now");
        assert!(!result.passed);
        assert!(result.checks.has_suspicious);
        assert!(!result.checks.has_luxury);
        assert!(!result.checks.has_inappropriate);
        assert_eq!(
            result.matches.suspicious,
            vec!["guaranteed returns".to_string(), "wire transfer".to_string()]
        );
    }

    #[test]
    fn transparency_language_passes_with_trust() {
        let result = checker().check("Here is our transparent, documented budget with receipts");
        assert!(result.passed);
        assert!(result.checks.has_trust);
        assert!(result.flags().is_empty());
    }

    #[test]
    fn empty_text_is_all_false() {
        let result = checker().check("");
        assert!(result.passed);
        assert_eq!(result.checks, ContentChecks::default());
    }

    #[test]
    fn matching_is_case_insensitive_and_word_bounded() {
        let c = checker();
        assert!(c.check("A new YACHT for the family").checks.has_luxury);
        // "scampi" must not trip the "scam" term.
        assert!(c.check("Fundraising dinner with scampi").passed);
        assert!(c.check("Wire   Transfer details below").checks.has_suspicious);
    }

    #[test]
    fn flags_follow_category_order() {
        let result = checker().check("URGENT: fund my luxury vacation, cocaine not included");
        assert_eq!(
            result.flags(),
            vec![
                ContentFlag::Luxury,
                ContentFlag::Inappropriate,
                ContentFlag::Suspicious
            ]
        );
    }

    #[test]
    fn empty_lists_never_match() {
        let lists = KeywordLists {
            luxury: Vec::new(),
            inappropriate: vec!["   ".to_string()],
            suspicious: Vec::new(),
            trust: Vec::new(),
        };
        let Ok(c) = ContentChecker::new(&lists) else {
            panic!("empty lists compile");
        };
        assert_eq!(c.check("yacht scam").checks, ContentChecks::default());
    }

    #[test]
    fn check_all_joins_fragments() {
        let result = checker().check_all(["Medical bills", "Send money via western union"]);
        assert!(result.checks.has_suspicious);
    }
}
