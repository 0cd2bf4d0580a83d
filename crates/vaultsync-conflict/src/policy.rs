//! Orphan policy
//!
//! Evaluates the `orphans` section of the configuration to decide what
//! happens to a remote object that has no local counterpart. Rules are
//! matched with glob patterns in first-match-wins order.
//!
//! A decision of `ask` evaluates to `None`: the caller must consult a
//! human (or treat it as skip when nobody is there to answer).

use glob::Pattern;
use tracing::{debug, trace};

use vaultsync_core::config::{OrphanRule, OrphansConfig};
use vaultsync_core::domain::OrphanDecision;

use crate::error::ConflictError;

/// Decision name meaning "prompt the user"
const ASK: &str = "ask";

/// Parses a decision name; `Ok(None)` means ask
fn parse_decision(s: &str) -> Result<Option<OrphanDecision>, ConflictError> {
    if s.eq_ignore_ascii_case(ASK) {
        return Ok(None);
    }
    match s.to_ascii_lowercase().as_str() {
        "skip" => Ok(Some(OrphanDecision::Skip)),
        "delete" => Ok(Some(OrphanDecision::Delete)),
        "download" => Ok(Some(OrphanDecision::Download)),
        _ => Err(ConflictError::InvalidDecision(s.to_string())),
    }
}

/// Validates a single rule's pattern and decision
pub fn validate_rule(rule: &OrphanRule) -> Result<(), ConflictError> {
    Pattern::new(&rule.pattern).map_err(|e| ConflictError::InvalidPattern {
        pattern: rule.pattern.clone(),
        reason: e.to_string(),
    })?;
    parse_decision(&rule.decision)?;
    Ok(())
}

/// Compiled orphan rules plus a default
#[derive(Debug, Clone)]
pub struct OrphanPolicy {
    rules: Vec<(Pattern, Option<OrphanDecision>)>,
    default_decision: Option<OrphanDecision>,
}

impl OrphanPolicy {
    /// Compiles the policy from configuration
    ///
    /// Invalid rules are logged and skipped; an invalid default means ask.
    pub fn new(config: &OrphansConfig) -> Self {
        let default_decision = parse_decision(&config.default_decision).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid default orphan decision, asking instead");
            None
        });

        let rules: Vec<(Pattern, Option<OrphanDecision>)> = config
            .rules
            .iter()
            .filter_map(|rule| {
                let pattern = match Pattern::new(&rule.pattern) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(
                            pattern = %rule.pattern,
                            error = %e,
                            "Skipping invalid orphan rule pattern"
                        );
                        return None;
                    }
                };
                match parse_decision(&rule.decision) {
                    Ok(decision) => Some((pattern, decision)),
                    Err(e) => {
                        tracing::warn!(
                            pattern = %rule.pattern,
                            error = %e,
                            "Skipping invalid orphan rule decision"
                        );
                        None
                    }
                }
            })
            .collect();

        debug!(
            rules_count = rules.len(),
            default = ?default_decision,
            "OrphanPolicy initialized"
        );

        Self {
            rules,
            default_decision,
        }
    }

    /// Policy that asks about everything
    pub fn ask_always() -> Self {
        Self {
            rules: Vec::new(),
            default_decision: None,
        }
    }

    /// Evaluates the policy for a vault-relative path
    ///
    /// Returns `None` when the matching rule (or the default) is `ask`.
    pub fn evaluate(&self, path: &str) -> Option<OrphanDecision> {
        for (pattern, decision) in &self.rules {
            if pattern.matches(path) {
                trace!(path = %path, pattern = %pattern, decision = ?decision, "Orphan rule matched");
                return *decision;
            }
        }
        trace!(path = %path, default = ?self.default_decision, "No orphan rule matched");
        self.default_decision
    }

    /// Returns true if no path can ever evaluate to ask
    pub fn is_unattended(&self) -> bool {
        self.default_decision.is_some() && self.rules.iter().all(|(_, d)| d.is_some())
    }

    /// Returns the number of compiled rules
    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }
}
