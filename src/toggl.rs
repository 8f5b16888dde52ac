//! Toggl Track API v9 client.
//!
//! Authenticates with the account API token (basic auth, password
//! `api_token`). Entries are created running (`duration: -1`) and closed
//! by a later stop. All calls are workspace-scoped.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProjectRule;
use crate::error::Result;
use crate::render;

const TOGGL_API_BASE: &str = "https://api.track.toggl.com/api/v9";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

/// Handle to a created entry; the full payload is never kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEntry {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct TimeEntryResponse {
    id: u64,
}

#[async_trait]
pub trait TimeTracker {
    async fn projects(&self) -> Result<Vec<Project>>;
    async fn start(&self, description: &str, project_id: Option<u64>) -> Result<TimeEntry>;
    /// Stop, then tag the entry `finished`; `override_secs` replaces the
    /// measured duration when the run had no timer.
    async fn finish(&self, entry: TimeEntry, override_secs: Option<i64>) -> Result<()>;
    /// Stop, then delete the entry.
    async fn remove(&self, entry: TimeEntry) -> Result<()>;
}

pub struct Toggl {
    http: Client,
    token: String,
    workspace_id: u64,
}

impl Toggl {
    pub fn new(token: &str, workspace_id: u64) -> Self {
        Toggl {
            http: Client::new(),
            token: token.to_string(),
            workspace_id,
        }
    }

    fn url(&self, tail: &str) -> String {
        format!("{TOGGL_API_BASE}/workspaces/{}/{tail}", self.workspace_id)
    }

    async fn stop(&self, entry: TimeEntry) -> Result<()> {
        self.http
            .patch(self.url(&format!("time_entries/{}/stop", entry.id)))
            .basic_auth(&self.token, Some("api_token"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl TimeTracker for Toggl {
    async fn projects(&self) -> Result<Vec<Project>> {
        let projects = self
            .http
            .get(self.url("projects"))
            .basic_auth(&self.token, Some("api_token"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(projects)
    }

    async fn start(&self, description: &str, project_id: Option<u64>) -> Result<TimeEntry> {
        let start = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let body = start_body(description, self.workspace_id, project_id, &start);
        let entry: TimeEntryResponse = self
            .http
            .post(self.url("time_entries"))
            .basic_auth(&self.token, Some("api_token"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(TimeEntry { id: entry.id })
    }

    async fn finish(&self, entry: TimeEntry, override_secs: Option<i64>) -> Result<()> {
        // An already-stopped entry makes the stop call fail; the update
        // below still has to run.
        if let Err(e) = self.stop(entry).await {
            render::warn(&format!("Could not stop the Toggl entry: {e}"));
        }
        self.http
            .put(self.url(&format!("time_entries/{}", entry.id)))
            .basic_auth(&self.token, Some("api_token"))
            .json(&finish_body(override_secs))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn remove(&self, entry: TimeEntry) -> Result<()> {
        if let Err(e) = self.stop(entry).await {
            render::warn(&format!("Could not stop the Toggl entry: {e}"));
        }
        self.http
            .delete(self.url(&format!("time_entries/{}", entry.id)))
            .basic_auth(&self.token, Some("api_token"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn start_body(
    description: &str,
    workspace_id: u64,
    project_id: Option<u64>,
    start: &str,
) -> serde_json::Value {
    let mut body = json!({
        "created_with": "zaetomat",
        "description": description,
        "tags": [],
        "billable": false,
        "workspace_id": workspace_id,
        "duration": -1,
        "start": start,
    });
    if let Some(id) = project_id {
        body["project_id"] = json!(id);
    }
    body
}

fn finish_body(override_secs: Option<i64>) -> serde_json::Value {
    let mut body = json!({ "tags": ["finished"] });
    if let Some(secs) = override_secs {
        body["duration"] = json!(secs);
    }
    body
}

pub struct Resolution<'a> {
    pub project: Option<&'a Project>,
    /// Set when no rule produced a usable project and the default had to
    /// stand in (or nothing did).
    pub fallback: bool,
}

/// Picks the project for a task name: first rule whose pattern matches,
/// in rule order, mapped to the workspace project of the same name.
/// Unparseable patterns are skipped.
pub fn resolve_project<'a>(
    task: &str,
    available: &'a [Project],
    rules: &[ProjectRule],
    default_name: &str,
) -> Resolution<'a> {
    let matched = rules
        .iter()
        .filter_map(|rule| Regex::new(&rule.pattern).ok().map(|re| (rule, re)))
        .find(|(_, re)| re.is_match(task))
        .and_then(|(rule, _)| available.iter().find(|p| p.name == rule.name));

    match matched {
        Some(project) => Resolution {
            project: Some(project),
            fallback: false,
        },
        None => Resolution {
            project: available.iter().find(|p| p.name == default_name),
            fallback: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str) -> ProjectRule {
        ProjectRule {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }

    fn project(id: u64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let available = vec![project(1, "alpha"), project(2, "beta")];
        let rules = vec![rule("alpha", "^X-"), rule("beta", "^X")];
        let resolved = resolve_project("X-123", &available, &rules, "beta");
        assert_eq!(resolved.project.unwrap().name, "alpha");
        assert!(!resolved.fallback);
    }

    #[test]
    fn pattern_matches_anywhere() {
        let available = vec![project(1, "alpha")];
        let rules = vec![rule("alpha", "X-")];
        let resolved = resolve_project("prefix X-1 suffix", &available, &rules, "alpha");
        assert_eq!(resolved.project.unwrap().id, 1);
        assert!(!resolved.fallback);
    }

    #[test]
    fn no_match_falls_back_to_default() {
        let available = vec![project(1, "alpha"), project(2, "beta")];
        let rules = vec![rule("alpha", "^X-")];
        let resolved = resolve_project("Z-1", &available, &rules, "beta");
        assert_eq!(resolved.project.unwrap().name, "beta");
        assert!(resolved.fallback);
    }

    #[test]
    fn matched_rule_without_project_falls_back() {
        let available = vec![project(2, "beta")];
        let rules = vec![rule("alpha", "^X-")];
        let resolved = resolve_project("X-1", &available, &rules, "beta");
        assert_eq!(resolved.project.unwrap().name, "beta");
        assert!(resolved.fallback);
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let available = vec![project(1, "alpha"), project(2, "beta")];
        let rules = vec![rule("alpha", "("), rule("beta", "X-")];
        let resolved = resolve_project("X-1", &available, &rules, "alpha");
        assert_eq!(resolved.project.unwrap().name, "beta");
        assert!(!resolved.fallback);
    }

    #[test]
    fn missing_default_yields_no_project() {
        let available = vec![];
        let rules = vec![rule("alpha", "^X-")];
        let resolved = resolve_project("Z-1", &available, &rules, "beta");
        assert!(resolved.project.is_none());
        assert!(resolved.fallback);
    }

    #[test]
    fn default_rules_route_csssr_tasks() {
        let config = crate::config::Config::default();
        let available = vec![project(10, "9_18ok"), project(11, "Relef")];
        let resolved =
            resolve_project("CSSSR-42", &available, &config.projects, &config.default_project);
        assert_eq!(resolved.project.unwrap().name, "9_18ok");
        assert!(!resolved.fallback);
    }

    #[test]
    fn start_body_is_running_and_unbillable() {
        let body = start_body("CSSSR-42", 671896, Some(10), "2024-03-01T10:00:00Z");
        assert_eq!(body["created_with"], json!("zaetomat"));
        assert_eq!(body["description"], json!("CSSSR-42"));
        assert_eq!(body["billable"], json!(false));
        assert_eq!(body["workspace_id"], json!(671896));
        assert_eq!(body["duration"], json!(-1));
        assert_eq!(body["project_id"], json!(10));
    }

    #[test]
    fn start_body_omits_missing_project() {
        let body = start_body("CSSSR-42", 671896, None, "2024-03-01T10:00:00Z");
        assert!(body.get("project_id").is_none());
    }

    #[test]
    fn finish_body_tags_and_overrides() {
        let body = finish_body(Some(1800));
        assert_eq!(body["tags"], json!(["finished"]));
        assert_eq!(body["duration"], json!(1800));
    }

    #[test]
    fn finish_body_keeps_measured_duration() {
        let body = finish_body(None);
        assert_eq!(body["tags"], json!(["finished"]));
        assert!(body.get("duration").is_none());
    }
}
