//! Remote intent parser
//!
//! Slow path: when no quick keyword matched, the transcript tail is sent to an
//! OpenAI-compatible chat completion endpoint which answers with JSON
//! commands from the closed grammar. Every failure degrades to "no commands".

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::command::{Command, CommandKind};
use crate::config::Config;

pub const SYSTEM_PROMPT: &str = "You parse voice commands and return ONLY JSON.";

/// Transport for one chat completion; returns the assistant message content
pub trait CompletionClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// `POST {api_base}/chat/completions` with a bearer key
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
        })
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let Some(key) = &self.api_key else {
            bail!("{} is not set", self.api_key_env);
        };

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .context("Completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!("Completion endpoint returned {}: {}", status, text.trim());
        }

        let reply: Value = response.json().context("Completion response is not JSON")?;
        reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Completion response has no message content"))
    }
}

pub struct RemoteIntentParser {
    client: Box<dyn CompletionClient + Send>,
}

impl RemoteIntentParser {
    pub fn new(client: Box<dyn CompletionClient + Send>) -> Self {
        Self { client }
    }

    /// Commands in the transcript; empty on any failure
    pub fn parse(&self, transcript: &str) -> Vec<Command> {
        let prompt = build_prompt(transcript);
        let content = match self.client.complete(SYSTEM_PROMPT, &prompt) {
            Ok(content) => content,
            Err(e) => {
                warn!("Remote intent parse failed: {:#}", e);
                return Vec::new();
            }
        };
        debug!("completion: {}", content.trim());

        match parse_completion(&content, transcript) {
            Ok(commands) => commands,
            Err(e) => {
                warn!("Could not read commands from completion: {:#}", e);
                Vec::new()
            }
        }
    }
}

/// User prompt listing the whole command grammar
pub fn build_prompt(transcript: &str) -> String {
    let mut prompt = String::from(
        "You are Jarvis, a desktop voice assistant on Linux.\n\
         Extract the commands the user asked for from the transcript below.\n\n\
         Available commands:\n",
    );
    for kind in CommandKind::ALL {
        prompt.push_str("- ");
        prompt.push_str(&kind.signature());
        if let Some(hint) = kind.hint() {
            prompt.push_str("  // ");
            prompt.push_str(hint);
        }
        prompt.push('\n');
    }
    prompt.push_str(
        "\nRules:\n\
         - Reply with null if the transcript contains no command.\n\
         - Otherwise reply with one object or an array of objects:\n\
         \x20 {\"name\": \"<command>\", \"args\": {...}, \"raw_text\": \"<words that asked for it>\"}\n\
         - Use only the commands listed above and only their listed args.\n\
         - Do not invent URLs. Convert spoken addresses: \"youtube dot com\" -> \"youtube.com\".\n\
         - Preserve raw_text exactly as it appears in the transcript.\n\
         - Return JSON only, no explanations.\n\n\
         Transcript:\n",
    );
    prompt.push_str(transcript);
    prompt
}

/// Read commands from completion text
///
/// Accepts `null`, one object, or an array; JSON wrapped in a code fence or
/// prose is recovered from its first `{` or `[`.
pub fn parse_completion(content: &str, transcript: &str) -> Result<Vec<Command>> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => v,
        Err(_) => extract_json(trimmed).ok_or_else(|| anyhow!("no JSON value in completion"))?,
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(obj) => Ok(command_from_object(&obj, transcript).into_iter().collect()),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|obj| command_from_object(obj, transcript))
            .collect()),
        other => bail!("expected object or array, got {}", other),
    }
}

fn extract_json(text: &str) -> Option<Value> {
    let start = text.find(['{', '['])?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

fn command_from_object(obj: &Map<String, Value>, transcript: &str) -> Option<Command> {
    let name = obj.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let raw_text = obj
        .get("raw_text")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(transcript);

    let mut command = Command::new(name, raw_text);
    if let Some(args) = obj.get("args").and_then(Value::as_object) {
        for (key, value) in args {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            command.args.insert(key.clone(), value);
        }
    }
    Some(command)
}


#[cfg(test)]
mod tests {
    use super::testing::FakeCompletion;
    use super::*;

    #[test]
    fn test_null_is_empty() {
        assert!(parse_completion("null", "hi").unwrap().is_empty());
        assert!(parse_completion("  null\n", "hi").unwrap().is_empty());
    }

    #[test]
    fn test_single_object() {
        let out = parse_completion(
            r#"{"name":"open_url","args":{"url":"youtube.com"},"raw_text":"open youtube dot com"}"#,
            "jarvis open youtube dot com",
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "open_url");
        assert_eq!(out[0].arg("url"), Some("youtube.com"));
        assert_eq!(out[0].raw_text, "open youtube dot com");
    }

    #[test]
    fn test_array_skips_bad_items() {
        let out = parse_completion(
            r#"[{"name":"media_next"}, 42, {"args":{}}, {"name":""}, {"name":"system_lock","args":{}}]"#,
            "next and lock",
        )
        .unwrap();
        let names: Vec<_> = out.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["media_next", "system_lock"]);
        // raw_text falls back to the transcript
        assert_eq!(out[0].raw_text, "next and lock");
    }

    #[test]
    fn test_non_string_args_are_serialized() {
        let out = parse_completion(
            r#"{"name":"window_focus","args":{"id":12,"name":null,"flag":true}}"#,
            "t",
        )
        .unwrap();
        assert_eq!(out[0].arg("id"), Some("12"));
        assert_eq!(out[0].arg("flag"), Some("true"));
        assert_eq!(out[0].args.get("name").map(String::as_str), Some("null"));
    }

    #[test]
    fn test_null_arg_is_kept_as_text() {
        let out = parse_completion(r#"{"name":"window_focus","args":{"name":null,"id":"0x1"}}"#, "t").unwrap();
        assert_eq!(out[0].arg("name"), Some("null"));
        assert_eq!(out[0].arg("id"), Some("0x1"));
    }

    #[test]
    fn test_fenced_and_wrapped_json() {
        let fenced = "```json\n[{\"name\":\"media_play_pause\"}]\n```";
        assert_eq!(parse_completion(fenced, "t").unwrap()[0].name, "media_play_pause");

        let prose = "Sure! Here you go: {\"name\":\"wifi_off\",\"args\":{}} Hope that helps.";
        assert_eq!(parse_completion(prose, "t").unwrap()[0].name, "wifi_off");
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(parse_completion("I can't help with that", "t").is_err());
        assert!(parse_completion("\"open_url\"", "t").is_err());
        assert!(parse_completion("{\"name\": ", "t").is_err());
    }

    #[test]
    fn test_prompt_covers_grammar() {
        let prompt = build_prompt("jarvis close it");
        for kind in CommandKind::ALL {
            assert!(prompt.contains(&kind.signature()), "missing {}", kind);
        }
        assert!(prompt.contains("youtube dot com"));
        assert!(prompt.ends_with("jarvis close it"));
    }

    #[test]
    fn test_parser_swallows_transport_errors() {
        let fake = FakeCompletion::failing();
        let parser = RemoteIntentParser::new(Box::new(fake.clone()));
        assert!(parser.parse("open something").is_empty());
        assert_eq!(fake.calls(), 1);
    }

    #[test]
    fn test_parser_swallows_garbage() {
        let parser = RemoteIntentParser::new(Box::new(FakeCompletion::replying("no commands here")));
        assert!(parser.parse("hello").is_empty());
    }

    #[test]
    fn test_parser_returns_commands() {
        let fake = FakeCompletion::replying(r#"[{"name":"open_app","args":{"name":"gimp"}}]"#);
        let parser = RemoteIntentParser::new(Box::new(fake.clone()));
        let out = parser.parse("open gimp");
        assert_eq!(out[0].arg("name"), Some("gimp"));
        assert!(fake.prompts.lock().unwrap()[0].contains("open gimp"));
    }

    #[test]
    fn test_client_without_key_fails() {
        let config = Config {
            api_key_env: "JARVIS_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Config::default()
        };
        let client = OpenAiClient::new(&config).unwrap();
        let err = client.complete(SYSTEM_PROMPT, "x").unwrap_err();
        assert!(err.to_string().contains("JARVIS_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
