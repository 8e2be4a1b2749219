//! Readiness-gate convergence.
//!
//! A PackageRevision that declares the `foo` readiness gate must also declare
//! `bar` and must report a `foo` condition with status `True`. [`evaluate`]
//! computes the smallest change that makes a snapshot satisfy that rule and
//! reports whether anything changed, so the caller only writes when needed.
//!
//! The evaluator is pure: it never talks to a store and keeps no state, so it
//! can be re-run on any snapshot, stale or not, as often as the loop likes.

use crate::types::{Condition, ConditionStatus, PackageRevision, ReadinessGate};

/// Gate whose presence puts a resource in scope.
pub const TRIGGER_GATE: &str = "foo";
/// Gate added alongside [`TRIGGER_GATE`].
pub const COMPANION_GATE: &str = "bar";
/// Condition forced to `True` for in-scope resources.
pub const READY_CONDITION: &str = "foo";

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub resource: PackageRevision,
    /// True when the readiness gates or the conditions differ from the input.
    pub changed: bool,
}

/// Bring `subject` into line with the readiness-gate rule.
///
/// Only ever appends gates or conditions, or flips a condition to `True`.
/// Calling it again on its own output returns `changed == false`.
pub fn evaluate(mut subject: PackageRevision) -> Evaluation {
    if !has_readiness_gate(&subject.spec.readiness_gates, TRIGGER_GATE) {
        return Evaluation {
            resource: subject,
            changed: false,
        };
    }

    let original_gates = subject.spec.readiness_gates.clone();
    let original_conditions = subject.status.conditions.clone();

    if !has_readiness_gate(&subject.spec.readiness_gates, COMPANION_GATE) {
        subject
            .spec
            .readiness_gates
            .push(ReadinessGate::new(COMPANION_GATE));
    }

    match find_condition_mut(&mut subject.status.conditions, READY_CONDITION) {
        Some(condition) => {
            if !condition.status.is_true() {
                condition.status = ConditionStatus::TRUE;
            }
        }
        None => subject
            .status
            .conditions
            .push(Condition::new(READY_CONDITION, ConditionStatus::TRUE)),
    }

    let changed = original_gates != subject.spec.readiness_gates
        || original_conditions != subject.status.conditions;

    Evaluation {
        resource: subject,
        changed,
    }
}

pub fn has_readiness_gate(gates: &[ReadinessGate], condition_type: &str) -> bool {
    gates.iter().any(|g| g.condition_type == condition_type)
}

/// First condition of the given type. Later duplicates are never looked at,
/// so a resource carrying two `foo` conditions only has the first one fixed.
fn find_condition_mut<'a>(
    conditions: &'a mut [Condition],
    condition_type: &str,
) -> Option<&'a mut Condition> {
    conditions.iter_mut().find(|c| c.r#type == condition_type)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
