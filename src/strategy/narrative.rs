use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{fmt_stat, Comparison};
use crate::config::Config;
use crate::error::Result;
use crate::types::{Format, Role};

const SYSTEM_PROMPT: &str = "You are a professional cricket performance strategist.";

/// Outcome of one narrative request. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Narrative {
    Generated(String),
    Unavailable(Unavailable),
}

impl Narrative {
    pub fn text(&self) -> Option<&str> {
        match self {
            Narrative::Generated(s) => Some(s.as_str()),
            Narrative::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No API key configured.
    MissingCredential,
    Transport(String),
    Status(u16),
    Malformed(String),
    /// 2xx with no usable text after sanitizing.
    Empty,
    TimedOut(Duration),
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::MissingCredential => write!(f, "no narrative API key configured"),
            Unavailable::Transport(e) => write!(f, "transport error: {e}"),
            Unavailable::Status(s) => write!(f, "service returned status {s}"),
            Unavailable::Malformed(e) => write!(f, "malformed response: {e}"),
            Unavailable::Empty => write!(f, "empty response"),
            Unavailable::TimedOut(d) => write!(f, "timed out after {}ms", d.as_millis()),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct NarrativeAdvisor {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    site_url: String,
    site_title: String,
}

impl NarrativeAdvisor {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.narrative_timeout)
            .build()?;
        Ok(Self {
            http,
            url: cfg.narrative_url.clone(),
            api_key: cfg.narrative_api_key.clone(),
            model: cfg.narrative_model.clone(),
            max_tokens: cfg.narrative_max_tokens,
            site_url: cfg.site_url.clone(),
            site_title: cfg.site_title.clone(),
        })
    }

    /// Request a strategy paragraph. Any failure is logged and returned as `Unavailable`.
    pub async fn generate(&self, role: Role, format: Format, cmp: &Comparison) -> Narrative {
        match self.request(&build_prompt(role, format, cmp)).await {
            Ok(text) => {
                debug!(%role, %format, chars = text.len(), "narrative generated");
                Narrative::Generated(text)
            }
            Err(reason) => {
                warn!(%role, %format, "narrative unavailable, using rule-based advice: {reason}");
                Narrative::Unavailable(reason)
            }
        }
    }

    async fn request(&self, prompt: &str) -> std::result::Result<String, Unavailable> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Unavailable::MissingCredential);
        };

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_title)
            .json(&body)
            .send()
            .await
            .map_err(|e| Unavailable::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "narrative service error body: {detail}");
            return Err(Unavailable::Status(status.as_u16()));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Unavailable::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(Unavailable::Empty)?;

        let cleaned = sanitize(&content);
        if cleaned.is_empty() {
            return Err(Unavailable::Empty);
        }
        Ok(cleaned)
    }
}

/// Prompt embedding role, format and the actual-vs-forecast comparison.
pub fn build_prompt(role: Role, format: Format, cmp: &Comparison) -> String {
    format!(
        "You are an expert cricket analyst.\n\
         Write 3 specific, personalised strategy insights for a {role} playing {format} cricket, \
         based on how their forecast compares with their current numbers.\n\
         \n\
         Rules:\n\
         - Output only the strategy points, nothing else.\n\
         - Quote the player's actual numbers so the advice is player specific.\n\
         - One bullet point (•) per insight, each on its own line.\n\
         - Professional, direct and concise.\n\
         - Tailor every point to the {role} role in the {format} format; avoid generic advice.\n\
         - Plain text only, no markdown.\n\
         \n\
         Actual:\n\
         Runs: {}\n\
         Strike Rate: {}\n\
         Wickets: {}\n\
         Economy: {}\n\
         Predicted:\n\
         Runs: {}\n\
         Strike Rate: {}\n\
         Wickets: {}\n\
         Economy: {}\n",
        fmt_stat(cmp.runs.actual),
        fmt_stat(cmp.strike_rate.actual),
        fmt_stat(cmp.wickets.actual),
        fmt_stat(cmp.economy.actual),
        fmt_stat(cmp.runs.predicted),
        fmt_stat(cmp.strike_rate.predicted),
        fmt_stat(cmp.wickets.predicted),
        fmt_stat(cmp.economy.predicted),
    )
}

/// Strip emphasis markers, normalise bullets to "• " at line start, drop blank
/// lines and carriage returns, trim.
pub fn sanitize(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace('\r', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| match strip_bullet(l) {
            Some(rest) => format!("• {rest}"),
            None => l.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_bullet(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix('•') {
        return Some(rest.trim_start());
    }
    for marker in ['-', '*'] {
        if let Some(rest) = line.strip_prefix(marker) {
            if rest.starts_with(char::is_whitespace) {
                return Some(rest.trim_start());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::strategy::MetricPair;
    use crate::test_support::serve;

    fn sample_cmp() -> Comparison {
        Comparison {
            runs: MetricPair::new(500.0, 45.0),
            strike_rate: MetricPair::new(104.17, 90.0),
            wickets: MetricPair::new(0.0, 0.0),
            economy: MetricPair::new(0.0, 0.0),
        }
    }

    fn cfg_for(url: String, key: Option<&str>) -> Config {
        Config {
            narrative_url: url,
            narrative_api_key: key.map(str::to_string),
            ..Config::default()
        }
    }

    #[test]
    fn sanitize_strips_emphasis_and_normalises_bullets() {
        let raw = "**Plan**\r\n\r\n- Rotate strike early\n* Attack spin\n\n•Target gaps\n  • Stay well-set  \n";
        assert_eq!(
            sanitize(raw),
            "Plan\n• Rotate strike early\n• Attack spin\n• Target gaps\n• Stay well-set"
        );
    }

    #[test]
    fn sanitize_keeps_hyphenated_words() {
        assert_eq!(sanitize("Use a well-timed T20-style finish."), "Use a well-timed T20-style finish.");
        assert_eq!(sanitize("   \n\r\n  "), "");
    }

    #[test]
    fn prompt_embeds_role_format_and_numbers() {
        let p = build_prompt(Role::AllRounder, Format::T20, &sample_cmp());
        assert!(p.contains("All-rounder"));
        assert!(p.contains("T20"));
        assert!(p.contains("Runs: 500"));
        assert!(p.contains("Runs: 45"));
        assert!(p.contains("Strike Rate: 104.17"));
        assert!(p.contains("Strike Rate: 90"));
    }

    #[tokio::test]
    async fn missing_credential_is_unavailable_without_network() {
        let advisor = NarrativeAdvisor::new(&cfg_for("http://127.0.0.1:1/chat".to_string(), None)).unwrap();
        let n = advisor.generate(Role::Batsman, Format::Odi, &sample_cmp()).await;
        assert_eq!(n, Narrative::Unavailable(Unavailable::MissingCredential));
        assert!(n.text().is_none());
    }

    #[tokio::test]
    async fn generated_text_is_sanitized_and_request_is_authenticated() {
        let seen = Arc::new(Mutex::new(None::<(String, serde_json::Value)>));
        let seen_in = seen.clone();
        let app = Router::new().route(
            "/chat",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let seen_in = seen_in.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *seen_in.lock().unwrap() = Some((auth, body));
                    Json(json!({
                        "choices": [{ "message": { "content": "**Focus**\n- Rotate strike\n- Attack short balls" } }]
                    }))
                }
            }),
        );
        let base = serve(app).await;
        let advisor = NarrativeAdvisor::new(&cfg_for(format!("{base}/chat"), Some("sk-test"))).unwrap();

        let n = advisor.generate(Role::Batsman, Format::Odi, &sample_cmp()).await;
        assert_eq!(n, Narrative::Generated("Focus\n• Rotate strike\n• Attack short balls".to_string()));

        let (auth, body) = seen.lock().unwrap().clone().expect("request recorded");
        assert_eq!(auth, "Bearer sk-test");
        assert_eq!(body["model"], "openai/gpt-4o-mini");
        assert_eq!(body["max_tokens"], 180);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][1]["content"].as_str().unwrap().contains("Runs: 500"));
    }

    #[tokio::test]
    async fn error_status_is_unavailable() {
        let app = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = serve(app).await;
        let advisor = NarrativeAdvisor::new(&cfg_for(format!("{base}/chat"), Some("sk-test"))).unwrap();
        let n = advisor.generate(Role::Bowler, Format::Test, &sample_cmp()).await;
        assert_eq!(n, Narrative::Unavailable(Unavailable::Status(401)));
    }

    #[tokio::test]
    async fn malformed_and_empty_responses_are_unavailable() {
        let app = Router::new()
            .route("/garbage", post(|| async { "not json" }))
            .route("/empty", post(|| async { Json(json!({ "choices": [] })) }));
        let base = serve(app).await;

        let advisor = NarrativeAdvisor::new(&cfg_for(format!("{base}/garbage"), Some("k"))).unwrap();
        let n = advisor.generate(Role::Bowler, Format::Test, &sample_cmp()).await;
        assert!(matches!(n, Narrative::Unavailable(Unavailable::Malformed(_))));

        let advisor = NarrativeAdvisor::new(&cfg_for(format!("{base}/empty"), Some("k"))).unwrap();
        let n = advisor.generate(Role::Bowler, Format::Test, &sample_cmp()).await;
        assert_eq!(n, Narrative::Unavailable(Unavailable::Empty));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let advisor = NarrativeAdvisor::new(&cfg_for("http://127.0.0.1:1/chat".to_string(), Some("k"))).unwrap();
        let n = advisor.generate(Role::Batsman, Format::T20, &sample_cmp()).await;
        assert!(matches!(n, Narrative::Unavailable(Unavailable::Transport(_))));
    }
}
