// Model availability check: one minimal request per profile

use crate::ai::{AiError, Completion, CompletionRequest, ModelProfile};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const CHECK_PROMPT: &str = "Respond with only the word \"OK\"";
const CHECK_MAX_TOKENS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    /// The model answered.
    Available { reply: String },
    /// The API is overloaded (529); the model id itself is valid.
    Overloaded,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct ModelCheck {
    pub profile: ModelProfile,
    pub status: ModelStatus,
    pub latency: Duration,
}

impl ModelCheck {
    pub fn is_usable(&self) -> bool {
        !matches!(self.status, ModelStatus::Failed { .. })
    }
}

/// Explain an API failure in terms of what the operator should fix.
pub fn describe_failure(error: &AiError) -> String {
    match error {
        AiError::Api { status: 404, .. } => {
            "Model not found (404): the model version is deprecated or invalid".to_string()
        }
        AiError::Api { status: 401, .. } => {
            "Authentication error (401): invalid or missing ANTHROPIC_API_KEY".to_string()
        }
        AiError::Api { status, .. } if *status >= 500 => {
            format!("Server error ({}): try again later", status)
        }
        AiError::EmptyResponse => "Empty response from API".to_string(),
        other => other.to_string(),
    }
}

pub async fn check_model(completion: &dyn Completion, profile: ModelProfile) -> ModelCheck {
    debug!("Checking {} ({})", profile.family(), profile.model_id());
    let start = Instant::now();
    let result = completion
        .complete(CHECK_PROMPT, CompletionRequest::new(profile, CHECK_MAX_TOKENS))
        .await;
    let latency = start.elapsed();

    let status = match result {
        Ok(reply) => ModelStatus::Available {
            reply: reply.trim().to_string(),
        },
        Err(AiError::Api { status: 529, .. }) => ModelStatus::Overloaded,
        Err(e) => {
            warn!("Model check failed for {}: {}", profile.model_id(), e);
            ModelStatus::Failed {
                reason: describe_failure(&e),
            }
        }
    };

    ModelCheck {
        profile,
        status,
        latency,
    }
}

/// Check every profile in order, pausing between requests.
pub async fn check_models(completion: &dyn Completion, pause: Duration) -> Vec<ModelCheck> {
    let mut checks = Vec::with_capacity(ModelProfile::ALL.len());
    for (i, profile) in ModelProfile::ALL.into_iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        checks.push(check_model(completion, profile).await);
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_failure() {
        let not_found = AiError::Api {
            status: 404,
            body: String::new(),
        };
        assert!(describe_failure(&not_found).contains("deprecated"));

        let unauthorized = AiError::Api {
            status: 401,
            body: String::new(),
        };
        assert!(describe_failure(&unauthorized).contains("ANTHROPIC_API_KEY"));

        let server = AiError::Api {
            status: 503,
            body: String::new(),
        };
        assert!(describe_failure(&server).contains("503"));
    }

    #[test]
    fn test_overloaded_is_usable() {
        let check = ModelCheck {
            profile: ModelProfile::Opus,
            status: ModelStatus::Overloaded,
            latency: Duration::from_millis(5),
        };
        assert!(check.is_usable());
    }
}
