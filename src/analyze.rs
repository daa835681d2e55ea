//! Summarises the plan text for the target class via the OpenAI chat
//! completion API.
//!
//! One request per run, no retry. The formatting rules live in the
//! instruction template below; the model's output is only as reliable
//! as that prompt, so the template spells out every rule explicitly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::CheckConfig;
use crate::contract::Analyzer;
use crate::error::{body_snippet, AnalysisError, ConfigError};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const MODEL: &str = "gpt-4";

const TEMPERATURE: f32 = 0.3;

/// The completion can take a while on long plans.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The class this deployment reports on.
const TARGET_CLASS: &str = "9b";

const SYSTEM_MESSAGE: &str = "Du bist ein Assistent, der Vertretungspläne präzise analysiert.";

/// Returned instead of an error when the API answers with no choices,
/// so the recipient still gets a notification.
const NO_ANSWER_SUMMARY: &str = "Die Analyse hat keine Antwort geliefert.";

/// The instruction the model receives together with the plan text.
///
/// The wording is fixed apart from the interpolated class; the reply
/// templates in rules 2 and 3 feed the weekday resolution.
fn instruction_for(class: &str) -> String {
    format!(
        r#"Bitte schaue ob es Vertretungen für die Klasse {class} gibt.

Formatiere die Antwort mit folgenden Kriterien:

1. Beginne immer mit "Für [Wochentag]..." - WICHTIG: NUR den Wochentag (Montag, Dienstag, usw.), KEIN Datum.
2. Wenn es keine Vertretungen gibt, schreibe: "Für [Wochentag] gibt es keine Vertretungen für die Klasse {class}."
3. Wenn es Vertretungen gibt, schreibe: "Für [Wochentag] gibt es folgende Vertretungen: [Vertretungen]"
4. Bei Änderungen beachte folgende Regeln:
   - Wenn es die ersten beiden Stunden sind, sage "in den ersten beiden Stunden"
   - Bei 3. und 4. Stunde sage "in der dritten und vierten Stunde"
   - Bei 5. und 6. Stunde sage "in der fünften und sechsten Stunde"
   - Bei Nachmittagsunterricht:
     * Wenn der gesamte Nachmittagsunterricht ausfällt, sage nur "der Nachmittagsunterricht fällt aus"
     * Wenn nur ein Fach ausfällt, gib das genau an
5. Bei Verlegungen:
   - Sage welches Fach ausgefallen ist, in welchen Stunden es jetzt Vertretung gibt, in welchem Fach, bei welchem Lehrer

WICHTIG: Verwende NUR den Wochentag, niemals das Datum."#
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Requests plan summaries from the OpenAI completion API.
pub struct OpenAiAnalyzer {
    client: Client,
    api_key: String,
    instruction: String,
}

impl OpenAiAnalyzer {
    /// Builds an analyzer for the deployment's target class.
    pub fn new(config: &CheckConfig) -> Result<Self, ConfigError> {
        Self::for_class(config, TARGET_CLASS)
    }

    /// Builds an analyzer scoped to `class`.
    ///
    /// Fails before any network access when the API credential is
    /// blank.
    pub fn for_class(config: &CheckConfig, class: &str) -> Result<Self, ConfigError> {
        if config.openai_api_key.trim().is_empty() {
            error!("analyzer is not configured");
            return Err(ConfigError::missing("OPENAI_API_KEY"));
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            instruction: instruction_for(class),
        })
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn summarise(&self, plan_text: &str) -> Result<String, AnalysisError> {
        info!(model = MODEL, plan_chars = plan_text.len(), "requesting plan summary");

        let prompt = format!("{}\n\nVertretungsplan:\n\n{}", self.instruction, plan_text);
        let request = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, "completion API refused the request");
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body_snippet: body_snippet(&body),
            });
        }

        let completion: ChatResponse = response.json().await?;
        Ok(summary_from(completion))
    }
}

/// The first choice's content, or the no-answer sentinel.
fn summary_from(completion: ChatResponse) -> String {
    match completion.choices.into_iter().next() {
        Some(choice) => choice.message.content,
        None => {
            warn!("completion API returned no choices");
            NO_ANSWER_SUMMARY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> CheckConfig {
        CheckConfig {
            openai_api_key: key.to_string(),
            email_username: "sender@example.com".to_string(),
            email_password: "secret".to_string(),
            recipient_email: "recipient@example.com".to_string(),
            auth_username: "user".to_string(),
            auth_password: "pass".to_string(),
            plan_url: "https://school.example/plan.pdf".to_string(),
            mode: crate::config::RunMode::Email,
            scheduled: false,
        }
    }

    #[test]
    fn blank_api_key_is_rejected_before_any_request() {
        let err = OpenAiAnalyzer::new(&config_with_key("  "))
            .err()
            .expect("A blank key should be rejected");
        assert_eq!(err.missing, vec!["OPENAI_API_KEY".to_string()]);
    }

    #[test]
    fn instruction_spells_out_the_formatting_rules() {
        let instruction = instruction_for("9b");
        assert!(instruction.contains("Bitte schaue ob es Vertretungen für die Klasse 9b gibt."));
        assert!(instruction.contains(r#"Beginne immer mit "Für [Wochentag]...""#));
        let no_changes = r#""Für [Wochentag] gibt es keine Vertretungen für die Klasse 9b.""#;
        assert!(instruction.contains(no_changes));
        let with_changes = r#""Für [Wochentag] gibt es folgende Vertretungen: [Vertretungen]""#;
        assert!(instruction.contains(with_changes));
        assert!(instruction.contains("in den ersten beiden Stunden"));
        assert!(instruction.contains("in der dritten und vierten Stunde"));
        assert!(instruction.contains("in der fünften und sechsten Stunde"));
        assert!(instruction.contains("der Nachmittagsunterricht fällt aus"));
        assert!(instruction.contains("Wenn nur ein Fach ausfällt, gib das genau an"));
        assert!(instruction.contains("niemals das Datum"));
    }

    #[test]
    fn instruction_is_scoped_to_the_requested_class() {
        let instruction = instruction_for("7c");
        assert!(instruction.contains("Vertretungen für die Klasse 7c gibt."));
        assert!(instruction.contains("keine Vertretungen für die Klasse 7c."));
        assert!(!instruction.contains("9b"));
    }

    #[test]
    fn first_choice_becomes_the_summary() {
        let completion: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Für Montag gibt es keine Vertretungen für die Klasse 9b."}}]}"#,
        )
        .unwrap();
        assert_eq!(
            summary_from(completion),
            "Für Montag gibt es keine Vertretungen für die Klasse 9b."
        );
    }

    #[test]
    fn zero_choices_become_the_no_answer_sentinel() {
        let completion: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(summary_from(completion), NO_ANSWER_SUMMARY);
    }
}
