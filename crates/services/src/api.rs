use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quest_core::model::{HelpMode, QuestId};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuestApiError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl QuestApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `SGXP_API_BASE_URL` and `SGXP_API_TIMEOUT_SECS`, falling back to
    /// the local development server.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("SGXP_API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let timeout = env::var("SGXP_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            timeout: Duration::from_secs(timeout),
        }
    }
}

/// What the player typed into the mission form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissionDraft {
    pub mission_idea: String,
    pub help_mode: HelpMode,
    pub nickname: String,
    pub age_range: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingAnswer {
    pub question: String,
    pub answer: String,
}

/// Backend endpoints used by the quest session.
///
/// Quest bodies come back as raw JSON; callers run them through the
/// normalizer.
#[async_trait]
pub trait QuestApi: Send + Sync {
    /// `POST /clarify-mission`; an empty list means no questions.
    async fn clarify_mission(
        &self,
        client_id: &str,
        mission: &MissionDraft,
    ) -> Result<Vec<String>, QuestApiError>;

    /// `POST /generate-quest`.
    async fn generate_quest(
        &self,
        client_id: &str,
        mission: &MissionDraft,
        answers: &[ClarifyingAnswer],
    ) -> Result<Value, QuestApiError>;

    /// `GET /quests`.
    async fn list_quests(&self, client_id: &str) -> Result<Vec<Value>, QuestApiError>;

    /// `GET /quests/{id}`.
    async fn get_quest(&self, client_id: &str, id: QuestId) -> Result<Value, QuestApiError>;

    /// `DELETE /quests/{id}`; a 404 counts as already deleted.
    async fn delete_quest(&self, client_id: &str, id: QuestId) -> Result<(), QuestApiError>;

    /// `DELETE /quests`.
    async fn clear_quests(&self, client_id: &str) -> Result<(), QuestApiError>;
}

#[derive(Clone)]
pub struct HttpQuestApi {
    client: Client,
    base_url: String,
}

impl HttpQuestApi {
    /// Build a client for the given backend.
    ///
    /// # Errors
    ///
    /// Returns `QuestApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: QuestApiConfig) -> Result<Self, QuestApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl QuestApi for HttpQuestApi {
    async fn clarify_mission(
        &self,
        client_id: &str,
        mission: &MissionDraft,
    ) -> Result<Vec<String>, QuestApiError> {
        tracing::debug!(mission = %mission.mission_idea, "requesting clarifying questions");
        let response = self
            .client
            .post(self.url("/clarify-mission"))
            .json(&MissionRequest { mission, client_id })
            .send()
            .await?;
        let body: ClarifyResponse = decode(ensure_success(response)?).await?;
        Ok(body.questions)
    }

    async fn generate_quest(
        &self,
        client_id: &str,
        mission: &MissionDraft,
        answers: &[ClarifyingAnswer],
    ) -> Result<Value, QuestApiError> {
        tracing::debug!(answers = answers.len(), "requesting quest generation");
        let response = self
            .client
            .post(self.url("/generate-quest"))
            .json(&GenerateRequest {
                mission,
                client_id,
                clarifying_answers: answers,
            })
            .send()
            .await?;
        let body: Value = decode(ensure_success(response)?).await?;
        expect_object(body)
    }

    async fn list_quests(&self, client_id: &str) -> Result<Vec<Value>, QuestApiError> {
        let response = self
            .client
            .get(self.url("/quests"))
            .query(&[("client_id", client_id)])
            .send()
            .await?;
        match decode::<Value>(ensure_success(response)?).await? {
            Value::Array(items) => Ok(items),
            other => Err(QuestApiError::MalformedResponse(format!(
                "expected a list of quests, got {other}"
            ))),
        }
    }

    async fn get_quest(&self, client_id: &str, id: QuestId) -> Result<Value, QuestApiError> {
        let response = self
            .client
            .get(self.url(&format!("/quests/{id}")))
            .query(&[("client_id", client_id)])
            .send()
            .await?;
        let body: Value = decode(ensure_success(response)?).await?;
        expect_object(body)
    }

    async fn delete_quest(&self, client_id: &str, id: QuestId) -> Result<(), QuestApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/quests/{id}")))
            .query(&[("client_id", client_id)])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(quest_id = %id, "quest already deleted on the backend");
            return Ok(());
        }
        ensure_success(response)?;
        Ok(())
    }

    async fn clear_quests(&self, client_id: &str) -> Result<(), QuestApiError> {
        let response = self
            .client
            .delete(self.url("/quests"))
            .query(&[("client_id", client_id)])
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }
}

fn ensure_success(response: Response) -> Result<Response, QuestApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(QuestApiError::HttpStatus(response.status()))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, QuestApiError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| QuestApiError::MalformedResponse(e.to_string()))
}

fn expect_object(body: Value) -> Result<Value, QuestApiError> {
    if body.is_object() {
        Ok(body)
    } else {
        Err(QuestApiError::MalformedResponse(
            "expected a quest object".into(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct MissionRequest<'a> {
    #[serde(flatten)]
    mission: &'a MissionDraft,
    client_id: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    #[serde(flatten)]
    mission: &'a MissionDraft,
    client_id: &'a str,
    clarifying_answers: &'a [ClarifyingAnswer],
}

#[derive(Debug, Deserialize)]
struct ClarifyResponse {
    #[serde(default)]
    questions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_request_is_flat() {
        let mission = MissionDraft {
            mission_idea: "Collect coats".into(),
            help_mode: HelpMode::Awareness,
            nickname: "Nova".into(),
            age_range: "9-11".into(),
        };
        let body = serde_json::to_value(MissionRequest {
            mission: &mission,
            client_id: "abc",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "mission_idea": "Collect coats",
                "help_mode": "awareness",
                "nickname": "Nova",
                "age_range": "9-11",
                "client_id": "abc"
            })
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpQuestApi::new(QuestApiConfig::new("http://example.test/api/")).unwrap();
        assert_eq!(api.url("/quests"), "http://example.test/api/quests");
    }
}
