//! Content fingerprinting for the fare-rule table.
//!
//! A fingerprint is a SHA-256 digest over the rule table in canonical order.
//! It changes iff the table's content changes, independent of row order or
//! storage representation, and lets the reload path skip flushing caches when
//! an administrative action turned out to be a no-op.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::fare::FareRule;

/// Order-independent digest of the full rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTableFingerprint(String);

impl RuleTableFingerprint {
    /// Digest the rule table in canonical (normalized-pair ascending) order.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{RuleTableFingerprint, FareRule, Zone};
    ///
    /// let a = FareRule::new(Zone(1), Zone(2), 55.0).expect("valid rule");
    /// let b = FareRule::new(Zone(2), Zone(3), 45.0).expect("valid rule");
    /// let forward = RuleTableFingerprint::of(&[a, b]);
    /// let reversed = RuleTableFingerprint::of(&[b, a]);
    /// assert_eq!(forward, reversed);
    /// ```
    #[must_use]
    pub fn of(rules: &[FareRule]) -> Self {
        let mut sorted: Vec<&FareRule> = rules.iter().collect();
        sorted.sort_by_key(|rule| rule.pair);

        let mut hasher = Sha256::new();
        for rule in sorted {
            hasher.update(rule.pair.lower().value().to_be_bytes());
            hasher.update(rule.pair.upper().value().to_be_bytes());
            hasher.update(rule.fare.amount().to_be_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex rendering of the digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RuleTableFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated for logs; full digest stays available via as_str.
        let prefix: String = self.0.chars().take(16).collect();
        f.write_str(&prefix)
    }
}
