//! Preferences and profile.

use chrono::Utc;
use serde_json::{Value, json};

use super::Api;
use crate::client::RequestOptions;
use crate::model::Profile;

impl Api {
    /// Preferences are an opaque JSON object owned by the service.
    pub fn get_preferences(&self) -> anyhow::Result<Value> {
        let endpoint = "/preferences";
        self.executor
            .execute(endpoint, &RequestOptions::get())
            .into_result(endpoint)
    }

    pub fn put_preferences(&self, preferences: &Value) -> anyhow::Result<()> {
        let endpoint = "/preferences";
        if !preferences.is_object() {
            anyhow::bail!("preferences must be a JSON object");
        }
        self.executor
            .execute::<Value>(endpoint, &RequestOptions::put(preferences.clone()))
            .into_result(endpoint)?;

        let sections: Vec<&String> = preferences
            .as_object()
            .map(|map| map.keys().collect())
            .unwrap_or_default();
        self.record(
            "preferences_updated",
            json!({ "sections": sections, "timestamp": Utc::now().to_rfc3339() }),
        );
        Ok(())
    }

    pub fn get_profile(&self) -> anyhow::Result<Profile> {
        let endpoint = "/profile";
        let profile: Option<Profile> = self
            .executor
            .execute(endpoint, &RequestOptions::get())
            .into_result(endpoint)?;
        Ok(profile.unwrap_or_default())
    }

    pub fn put_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        let endpoint = "/profile";
        let body = serde_json::to_value(profile)?;
        self.executor
            .execute::<Value>(endpoint, &RequestOptions::put(body))
            .into_result(endpoint)?;

        self.record("profile_updated", json!({ "timestamp": Utc::now().to_rfc3339() }));
        Ok(())
    }
}
