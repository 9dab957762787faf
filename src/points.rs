//! Skill point accounting.
//!
//! A skill costs `cost × level` points. `cost` defaults to 0 and `level`
//! to 1 when missing, non-finite or out of range, so the result is never
//! negative. Points count as spent only while a skill is `unlocked` or
//! `completed`.

use serde::{Deserialize, Serialize};

use crate::types::{SkillData, SkillNode, SkillStatus};

/// Points needed to unlock a skill, regardless of its status.
pub fn required_points<S>(data: Option<&SkillData<S>>) -> f64 {
    let Some(data) = data else {
        return 0.0;
    };

    let cost = data
        .cost
        .filter(|cost| cost.is_finite() && *cost >= 0.0)
        .unwrap_or(0.0);
    let level = data
        .level
        .filter(|level| level.is_finite() && *level > 0.0)
        .unwrap_or(1.0);

    cost * level
}

/// Points a skill currently consumes.
pub fn spent_points(data: Option<&SkillData<SkillStatus>>) -> f64 {
    match data {
        Some(d) if d.status.consumes_points() => required_points(Some(d)),
        _ => 0.0,
    }
}

/// Sum of [`spent_points`] over all nodes.
pub fn total_spent(nodes: &[SkillNode]) -> f64 {
    nodes.iter().map(|node| spent_points(Some(&node.data))).sum()
}

/// Points left in the budget.
pub fn available_points(points_total: u64, nodes: &[SkillNode]) -> f64 {
    points_total as f64 - total_spent(nodes)
}

/// Unlocking would exceed the point budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("Not enough skill points. Need {required}, but only {available} available.")]
pub struct BudgetShortfall {
    /// Points the skill requires.
    pub required: f64,
    /// Points left in the budget.
    pub available: f64,
}

/// Check whether `node` fits in the remaining budget.
///
/// The node's own spend is excluded from the total so a skill is never
/// counted against itself. Returns the required points on success.
pub fn check_unlock_budget(
    node: &SkillNode,
    nodes: &[SkillNode],
    points_total: u64,
) -> Result<f64, BudgetShortfall> {
    let required = required_points(Some(&node.data));
    let spent_elsewhere: f64 = nodes
        .iter()
        .filter(|other| other.id != node.id)
        .map(|other| spent_points(Some(&other.data)))
        .sum();
    let available = points_total as f64 - spent_elsewhere;

    if required > available {
        return Err(BudgetShortfall { required, available });
    }
    Ok(required)
}

/// Outcome of setting a new point budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAdjustment {
    /// The budget actually applied.
    pub total: u64,
    /// True when the request was raised to cover spent points.
    pub clamped: bool,
}

/// Repair a requested budget.
///
/// The request is floored and clamped at 0. A budget below `spent` is
/// raised to `ceil(spent)` and flagged. Non-finite requests yield `None`.
pub fn clamp_points_total(requested: f64, spent: f64) -> Option<PointsAdjustment> {
    if !requested.is_finite() {
        return None;
    }

    let total = requested.floor().max(0.0) as u64;
    if (total as f64) < spent {
        return Some(PointsAdjustment {
            total: spent.ceil() as u64,
            clamped: true,
        });
    }

    Some(PointsAdjustment { total, clamped: false })
}
