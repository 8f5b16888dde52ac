use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Maps task names to a Toggl project: the first rule whose pattern
/// matches wins, in file order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectRule {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub toggl_token: String,
    pub slack_token: String,
    pub toggl_workspace: String,
    pub bar_width: u16,
    pub kitchen_message: String,
    pub kitchen_icon: String,
    pub display_name: String,
    pub default_project: String,
    pub projects: Vec<ProjectRule>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            toggl_token: String::new(),
            slack_token: String::new(),
            toggl_workspace: String::new(),
            bar_width: 40,
            kitchen_message: "dinner".to_string(),
            kitchen_icon: ":fork_and_knife:".to_string(),
            display_name: "anonymous".to_string(),
            default_project: "9_18ok".to_string(),
            projects: vec![
                ProjectRule { name: "9_18ok".to_string(), pattern: "CSSSR-".to_string() },
                ProjectRule { name: "Relef".to_string(), pattern: "RO-".to_string() },
                ProjectRule { name: "s7_cabinet".to_string(), pattern: "S7-".to_string() },
                ProjectRule { name: "chocolate".to_string(), pattern: "CHOC-".to_string() },
                ProjectRule { name: "Zaetool".to_string(), pattern: "zaetool-".to_string() },
            ],
        }
    }
}

/// Written on first run; must stay in sync with `Config::default()`.
const TEMPLATE: &str = r#"# zaetomat configuration

# Toggl API token, from https://track.toggl.com/profile
toggl_token = ""

# Slack token with users.profile:write, users:write, chat:write and channels:read
slack_token = ""

# Numeric Toggl workspace id
toggl_workspace = ""

bar_width = 40
kitchen_message = "dinner"
kitchen_icon = ":fork_and_knife:"
display_name = "anonymous"
default_project = "9_18ok"

# Task names are matched against the patterns in order; the first match
# picks the Toggl project the entry lands in.
[[projects]]
name = "9_18ok"
pattern = "CSSSR-"

[[projects]]
name = "Relef"
pattern = "RO-"

[[projects]]
name = "s7_cabinet"
pattern = "S7-"

[[projects]]
name = "chocolate"
pattern = "CHOC-"

[[projects]]
name = "Zaetool"
pattern = "zaetool-"
"#;

impl Config {
    /// Reads the config file, writing a starter template first if there
    /// is none yet. Keys missing from the file keep their defaults.
    pub fn load() -> Result<Config> {
        let path = Self::config_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, TEMPLATE)?;
            return Ok(Config::default());
        }
        Ok(toml::from_str(&std::fs::read_to_string(&path)?)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zaetomat")
            .join("config.toml")
    }

    /// The workspace id as Toggl v9 wants it in URL paths.
    pub fn workspace_id(&self) -> Result<u64> {
        self.toggl_workspace.parse().map_err(|_| {
            Error::Config(format!(
                "toggl_workspace must be a numeric workspace id, got '{}'",
                self.toggl_workspace
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_tokens_empty() {
        let config = Config::default();
        assert!(config.toggl_token.is_empty());
        assert!(config.slack_token.is_empty());
        assert!(config.toggl_workspace.is_empty());
    }

    #[test]
    fn defaults_have_kitchen_and_bar() {
        let config = Config::default();
        assert_eq!(config.bar_width, 40);
        assert_eq!(config.kitchen_message, "dinner");
        assert_eq!(config.kitchen_icon, ":fork_and_knife:");
    }

    #[test]
    fn defaults_have_five_project_rules() {
        let config = Config::default();
        assert_eq!(config.projects.len(), 5);
        assert_eq!(config.projects[0].name, "9_18ok");
        assert_eq!(config.projects[0].pattern, "CSSSR-");
        assert_eq!(config.default_project, "9_18ok");
    }

    #[test]
    fn template_matches_defaults() {
        let parsed: Config = toml::from_str(TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
toggl_token = "abc123"
bar_width = 20
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.toggl_token, "abc123");
        assert_eq!(config.bar_width, 20);
        assert_eq!(config.kitchen_message, "dinner");
        assert_eq!(config.projects.len(), 5);
    }

    #[test]
    fn parse_project_rules() {
        let toml_str = r#"
[[projects]]
name = "internal"
pattern = "^INT-"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.projects[0].name, "internal");
        assert_eq!(config.projects[0].pattern, "^INT-");
    }

    #[test]
    fn config_path_under_zaetomat() {
        assert!(Config::config_path().ends_with("zaetomat/config.toml"));
    }

    #[test]
    fn workspace_id_parses_numeric() {
        let config = Config {
            toggl_workspace: "671896".to_string(),
            ..Config::default()
        };
        assert_eq!(config.workspace_id().unwrap(), 671896);
    }

    #[test]
    fn workspace_id_rejects_garbage() {
        let config = Config {
            toggl_workspace: "my-team".to_string(),
            ..Config::default()
        };
        assert!(config.workspace_id().is_err());
    }
}
