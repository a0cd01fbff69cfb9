//! Rule and schedule evaluation.
//!
//! Rules are polled every cycle: each query that returns a non-empty
//! instant vector counts as "condition true", and the first true rule in
//! file order wins. Schedule entries fire on their own cron timers and only
//! consult the optional size guard here.

use std::sync::Arc;

use tracing::debug;

use vscale_core::{MetricsError, MetricsSource, ScaleRule, ScaleSchedule};

use crate::error::ScaleError;

/// The rule that fired this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Position in the rules file.
    pub index: usize,
    pub query: String,
    pub action: i32,
}

pub struct DecisionEngine {
    metrics: Arc<dyn MetricsSource>,
}

impl DecisionEngine {
    pub fn new(metrics: Arc<dyn MetricsSource>) -> Self {
        Self { metrics }
    }

    /// Whether `rule`'s query currently returns any samples.
    pub async fn evaluate_rule(&self, rule: &ScaleRule) -> Result<bool, ScaleError> {
        let samples = self
            .metrics
            .query_vector(&rule.query)
            .await
            .map_err(|e| match e {
                MetricsError::UnexpectedResultShape(kind) => ScaleError::UnexpectedResultShape {
                    query: rule.query.clone(),
                    kind,
                },
                other => ScaleError::QueryFailed {
                    query: rule.query.clone(),
                    message: other.to_string(),
                },
            })?;

        debug!(query = %rule.query, samples = samples.len(), "evaluated rule");
        Ok(!samples.is_empty())
    }

    /// First rule whose condition holds, in order. Stops at the first
    /// query error; the cycle is abandoned rather than treating it as false.
    pub async fn evaluate_rules(&self, rules: &[ScaleRule]) -> Result<Option<RuleMatch>, ScaleError> {
        for (index, rule) in rules.iter().enumerate() {
            if !self.evaluate_rule(rule).await? {
                debug!(query = %rule.query, "rule not met");
                continue;
            }
            return Ok(Some(RuleMatch {
                index,
                query: rule.query.clone(),
                action: rule.action,
            }));
        }
        Ok(None)
    }

    /// Whether a fired schedule entry may proceed at ladder position
    /// `current_index`. Entries without a guard always may.
    pub fn evaluate_schedule(entry: &ScaleSchedule, current_index: usize) -> bool {
        entry
            .if_size
            .as_ref()
            .is_none_or(|guard| guard.matches(current_index))
    }
}
