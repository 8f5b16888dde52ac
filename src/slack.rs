//! Slack Web API client: profile status, presence and channel messages.
//!
//! Every method is a JSON POST with a bearer token; Slack always answers
//! 200 with an `{ok, error?}` envelope, so the envelope is checked before
//! the payload is decoded.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::render;

const SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence {
    Away,
    Auto,
}

impl Presence {
    fn as_str(self) -> &'static str {
        match self {
            Presence::Away => "away",
            Presence::Auto => "auto",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    profile: Profile,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    status_text: String,
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    channels: Vec<Channel>,
}

#[derive(Debug, Clone, Deserialize)]
struct Channel {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PostedMessage {
    ts: String,
}

#[derive(Debug, Deserialize)]
struct Ack {}

#[async_trait]
pub trait Chat {
    async fn set_status(&self, text: &str, icon: &str) -> Result<()>;
    async fn set_presence(&self, presence: Presence) -> Result<()>;
    /// Posts to a channel by name; returns the message timestamp, which
    /// threads later replies.
    async fn post(&self, channel: &str, text: &str, thread_ts: Option<&str>) -> Result<String>;
}

pub struct Slack {
    http: Client,
    token: String,
}

impl Slack {
    pub fn new(token: &str) -> Self {
        Slack {
            http: Client::new(),
            token: token.to_string(),
        }
    }

    async fn api_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<T> {
        let value: serde_json::Value = self
            .http
            .post(format!("{SLACK_API_BASE}/{method}"))
            .bearer_auth(&self.token)
            .json(params)
            .send()
            .await?
            .json()
            .await?;

        let envelope: Envelope = serde_json::from_value(value.clone())?;
        if !envelope.ok {
            return Err(Error::Api {
                service: "Slack",
                message: envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn channel_id(&self, name: &str) -> Result<String> {
        let list: ChannelList = self
            .api_call(
                "conversations.list",
                &json!({ "exclude_archived": true, "limit": 1000 }),
            )
            .await?;
        find_channel(&list.channels, name)
            .map(|c| c.id.clone())
            .ok_or_else(|| Error::ChannelNotFound(name.to_string()))
    }
}

fn find_channel<'a>(channels: &'a [Channel], name: &str) -> Option<&'a Channel> {
    channels.iter().find(|c| c.name == name)
}

#[async_trait]
impl Chat for Slack {
    async fn set_status(&self, text: &str, icon: &str) -> Result<()> {
        let resp: ProfileResponse = self
            .api_call(
                "users.profile.set",
                &json!({ "profile": { "status_text": text, "status_emoji": icon } }),
            )
            .await?;
        // Slack acknowledges with the stored profile; a silent rewrite of
        // the text is worth knowing about.
        if resp.profile.status_text != text {
            render::warn(&format!(
                "Slack kept a different status text: '{}'",
                resp.profile.status_text
            ));
        }
        Ok(())
    }

    async fn set_presence(&self, presence: Presence) -> Result<()> {
        let _: Ack = self
            .api_call(
                "users.setPresence",
                &json!({ "presence": presence.as_str() }),
            )
            .await?;
        Ok(())
    }

    async fn post(&self, channel: &str, text: &str, thread_ts: Option<&str>) -> Result<String> {
        let id = self.channel_id(channel).await?;
        let mut params = json!({
            "channel": id,
            "text": text,
            "as_user": true,
            "parse": "full",
            "unfurl_links": true,
        });
        if let Some(ts) = thread_ts {
            params["thread_ts"] = serde_json::Value::String(ts.to_string());
        }
        let posted: PostedMessage = self.api_call("chat.postMessage", &params).await?;
        Ok(posted.ts)
    }
}
