//! Goal CRUD against `/health-goals`.

use chrono::Utc;
use serde_json::{Value, json};

use super::Api;
use crate::client::RequestOptions;
use crate::model::{Goal, GoalStatus, Priority};

/// Fields a caller supplies when creating a goal.
#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub category: String,
    pub target_value: f64,
    pub unit: String,
    pub priority: Priority,
}

impl NewGoal {
    /// Fill the server-side defaults: id, creation time, zero progress,
    /// active status, no milestones.
    pub fn into_goal(self) -> Goal {
        let now = Utc::now();
        Goal {
            id: now.timestamp_millis().to_string(),
            title: self.title,
            description: self.description,
            category: self.category,
            target_value: self.target_value,
            current_value: 0.0,
            unit: self.unit,
            deadline: None,
            priority: self.priority,
            status: GoalStatus::Active,
            created_at: now,
            milestones: Vec::new(),
        }
    }
}

impl Api {
    pub fn list_goals(&self) -> anyhow::Result<Vec<Goal>> {
        let endpoint = "/health-goals";
        self.executor
            .execute(endpoint, &RequestOptions::get())
            .into_result(endpoint)
    }

    /// Create or update a goal. The service upserts by id.
    pub fn save_goal(&self, goal: &Goal, created: bool) -> anyhow::Result<()> {
        let endpoint = "/health-goals";
        let body = serde_json::to_value(goal)?;
        self.executor
            .execute::<Value>(endpoint, &RequestOptions::post(body))
            .into_result(endpoint)?;

        let action = if created { "created" } else { "updated" };
        self.record("goal_saved", json!({ "goalId": goal.id, "action": action }));
        Ok(())
    }

    /// Apply progress locally, then push the new value.
    ///
    /// Returns `true` when this update completed the goal.
    pub fn update_progress(&self, goal: &mut Goal, value: f64) -> anyhow::Result<bool> {
        let completed = goal.apply_progress(value, Utc::now());

        let endpoint = format!("/health-goals/{}/progress", goal.id);
        self.executor
            .execute::<Value>(&endpoint, &RequestOptions::put(json!({ "currentValue": value })))
            .into_result(&endpoint)?;

        if completed {
            self.record(
                "goal_completed",
                json!({ "goalId": goal.id, "title": goal.title }),
            );
        }
        Ok(completed)
    }

    pub fn delete_goal(&self, goal_id: &str) -> anyhow::Result<()> {
        let endpoint = format!("/health-goals/{goal_id}");
        self.executor
            .execute::<Value>(&endpoint, &RequestOptions::delete())
            .into_result(&endpoint)?;

        self.record("goal_deleted", json!({ "goalId": goal_id }));
        Ok(())
    }

    /// Find a goal by id in the current list.
    pub fn find_goal(&self, goal_id: &str) -> anyhow::Result<Goal> {
        self.list_goals()?
            .into_iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| anyhow::anyhow!("no goal with id {goal_id}"))
    }
}
