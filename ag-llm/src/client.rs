use crate::error::{LlmError, Result};
use crate::types::{AgentSelector, Completion, CompletionRequest};
use serde::{Deserialize, Serialize};

#[async_trait::async_trait]
pub trait CompletionApi: Send + Sync {
    async fn create(&self, request: &CompletionRequest) -> Result<Completion>;
}

#[derive(Clone)]
pub struct ResponsesClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    project: Option<String>,
}

impl ResponsesClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project: None,
        }
    }

    /// Scope requests to a project/folder where the gateway requires one.
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToOwned::to_owned);
        self
    }
}

#[async_trait::async_trait]
impl CompletionApi for ResponsesClient {
    #[tracing::instrument(level = "info", skip_all)]
    async fn create(&self, request: &CompletionRequest) -> Result<Completion> {
        if request.input.trim().is_empty() {
            return Err(LlmError::InvalidInput("input is empty".to_string()));
        }

        let req = ResponsesApiRequest::new(request);
        let url = format!("{}/responses", self.base_url);
        let mut builder = self.http.post(url).bearer_auth(&self.api_key).json(&req);
        if let Some(project) = self.project.as_deref() {
            builder = builder.header("OpenAI-Project", project);
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http(format!(
                "responses status={status} body={body}"
            )));
        }

        let parsed: ResponsesApiResponse = serde_json::from_str(&body)?;
        parsed.try_into()
    }
}

#[derive(Debug, Serialize)]
struct ResponsesApiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<PromptRef<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PromptRef<'a> {
    id: &'a str,
}

impl<'a> ResponsesApiRequest<'a> {
    fn new(request: &'a CompletionRequest) -> Self {
        let (prompt, model, instructions) = match &request.selector {
            AgentSelector::Prompt { id } => (Some(PromptRef { id }), None, None),
            AgentSelector::Inline {
                model,
                instructions,
            } => (None, Some(model.as_str()), Some(instructions.as_str())),
        };
        Self {
            prompt,
            model,
            instructions,
            input: &request.input,
            previous_response_id: request.previous_response_id.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    id: String,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutputItem {
    #[serde(default)]
    content: Vec<ResponsesContentPart>,
}

#[derive(Debug, Deserialize)]
struct ResponsesContentPart {
    #[serde(default)]
    r#type: String,
    #[serde(default)]
    text: Option<String>,
}

impl TryFrom<ResponsesApiResponse> for Completion {
    type Error = LlmError;

    fn try_from(v: ResponsesApiResponse) -> Result<Self> {
        if let Some(text) = v.output_text.filter(|t| !t.is_empty()) {
            return Ok(Completion {
                id: v.id,
                output_text: text,
            });
        }

        // Older gateways omit the output_text convenience field.
        let assembled: Vec<String> = v
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.r#type.is_empty() || part.r#type == "output_text")
            .filter_map(|part| part.text.clone())
            .collect();
        if assembled.is_empty() {
            return Err(LlmError::ResponseFormat(
                "response carries no output text".to_string(),
            ));
        }
        Ok(Completion {
            id: v.id,
            output_text: assembled.join(""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_prompt_id_for_agent_selector() {
        let request = CompletionRequest {
            selector: AgentSelector::Prompt {
                id: "a1".to_string(),
            },
            input: "hello".to_string(),
            previous_response_id: Some("t1".to_string()),
        };
        let wire = serde_json::to_value(ResponsesApiRequest::new(&request)).expect("serialize");
        assert_eq!(wire["prompt"]["id"], "a1");
        assert_eq!(wire["input"], "hello");
        assert_eq!(wire["previous_response_id"], "t1");
        assert!(wire.get("model").is_none());
        assert!(wire.get("instructions").is_none());
    }

    #[test]
    fn request_uses_model_and_instructions_for_inline_selector() {
        let request = CompletionRequest {
            selector: AgentSelector::Inline {
                model: "gpt://folder/model".to_string(),
                instructions: "be brief".to_string(),
            },
            input: "hi".to_string(),
            previous_response_id: None,
        };
        let wire = serde_json::to_value(ResponsesApiRequest::new(&request)).expect("serialize");
        assert_eq!(wire["model"], "gpt://folder/model");
        assert_eq!(wire["instructions"], "be brief");
        assert!(wire.get("prompt").is_none());
        assert!(wire.get("previous_response_id").is_none());
    }

    #[test]
    fn response_prefers_output_text_field() {
        let parsed: ResponsesApiResponse = serde_json::from_str(
            r#"{"id":"t2","output_text":"answer","output":[{"content":[{"type":"output_text","text":"ignored"}]}]}"#,
        )
        .expect("parse");
        let completion: Completion = parsed.try_into().expect("convert");
        assert_eq!(completion.id, "t2");
        assert_eq!(completion.output_text, "answer");
    }

    #[test]
    fn response_assembles_output_items_when_convenience_field_is_absent() {
        let parsed: ResponsesApiResponse = serde_json::from_str(
            r#"{"id":"t3","output":[{"content":[{"type":"output_text","text":"part one "},{"type":"output_text","text":"part two"}]}]}"#,
        )
        .expect("parse");
        let completion: Completion = parsed.try_into().expect("convert");
        assert_eq!(completion.output_text, "part one part two");
    }

    #[test]
    fn response_without_any_text_is_a_format_error() {
        let parsed: ResponsesApiResponse =
            serde_json::from_str(r#"{"id":"t4","output":[]}"#).expect("parse");
        let err = Completion::try_from(parsed).expect_err("no text");
        assert!(matches!(err, LlmError::ResponseFormat(_)));
    }
}
