//! Request gate deciding whether a webhook invocation may reach the sync pipeline.

use crate::config::Config;

/// Authorization and activation inputs extracted from an inbound request.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateRequest<'a> {
    /// Value of the `key` query parameter, if supplied.
    pub key: Option<&'a str>,
    /// Declared caller identity (the `User-Agent` header).
    pub caller: Option<&'a str>,
}

/// Outcome of evaluating a request against the [`GatePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The request may continue into the pipeline.
    Proceed,
    /// Bad key or unexpected caller.
    Unauthorized,
    /// Synchronization is switched off; the request is a no-op.
    NotActivated,
}

/// Static policy derived from configuration.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    secret: Option<String>,
    require_key: bool,
    enabled: bool,
    expected_caller: String,
}

impl GatePolicy {
    /// Build a policy from explicit values.
    pub fn new(
        secret: Option<String>,
        require_key: bool,
        enabled: bool,
        expected_caller: impl Into<String>,
    ) -> Self {
        Self {
            secret,
            require_key,
            enabled,
            expected_caller: expected_caller.into(),
        }
    }

    /// Build the policy described by the service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.webhook_key.clone(),
            config.require_webhook_key,
            config.algolia_active,
            config.expected_caller.clone(),
        )
    }

    /// Apply the gate rules in order; the first failing rule decides.
    ///
    /// 1. A supplied key must match the configured secret.
    /// 2. The feature must be enabled.
    /// 3. The caller identity must contain the expected substring.
    ///
    /// Requests without a key skip rule 1 unless the policy requires a key.
    pub fn evaluate(&self, request: &GateRequest<'_>) -> GateDecision {
        match request.key.filter(|key| !key.is_empty()) {
            Some(key) if self.secret.as_deref() != Some(key) => {
                tracing::warn!("Rejected webhook with mismatched key");
                return GateDecision::Unauthorized;
            }
            Some(_) => {}
            None if self.require_key => {
                tracing::warn!("Rejected webhook without key");
                return GateDecision::Unauthorized;
            }
            None => {
                // TODO: make the key mandatory once every Ghost integration sends it.
                tracing::warn!("Webhook received without key; accepting for compatibility");
            }
        }

        if !self.enabled {
            return GateDecision::NotActivated;
        }

        let caller_matches = request
            .caller
            .is_some_and(|caller| caller.contains(&self.expected_caller));
        if !caller_matches {
            tracing::warn!(caller = ?request.caller, "Rejected webhook from unexpected caller");
            return GateDecision::Unauthorized;
        }

        GateDecision::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GHOST_UA: &str = "Ghost/5.0 (https://github.com/TryGhost/Ghost)";

    fn policy(enabled: bool) -> GatePolicy {
        GatePolicy::new(
            Some("secret".into()),
            false,
            enabled,
            crate::config::DEFAULT_EXPECTED_CALLER,
        )
    }

    #[test]
    fn proceeds_with_matching_key_and_caller() {
        let request = GateRequest {
            key: Some("secret"),
            caller: Some(GHOST_UA),
        };
        assert_eq!(policy(true).evaluate(&request), GateDecision::Proceed);
    }

    #[test]
    fn bad_key_wins_over_deactivation() {
        let request = GateRequest {
            key: Some("wrong"),
            caller: Some(GHOST_UA),
        };
        assert_eq!(policy(false).evaluate(&request), GateDecision::Unauthorized);
    }

    #[test]
    fn deactivated_feature_is_not_an_authorization_failure() {
        let request = GateRequest {
            key: None,
            caller: Some("curl/8.0"),
        };
        assert_eq!(policy(false).evaluate(&request), GateDecision::NotActivated);
    }

    #[test]
    fn unexpected_or_missing_caller_is_unauthorized() {
        let curl = GateRequest {
            key: Some("secret"),
            caller: Some("curl/8.0"),
        };
        assert_eq!(policy(true).evaluate(&curl), GateDecision::Unauthorized);

        let anonymous = GateRequest {
            key: None,
            caller: None,
        };
        assert_eq!(policy(true).evaluate(&anonymous), GateDecision::Unauthorized);
    }

    #[test]
    fn key_is_optional_unless_required() {
        let request = GateRequest {
            key: None,
            caller: Some(GHOST_UA),
        };
        assert_eq!(policy(true).evaluate(&request), GateDecision::Proceed);

        let strict = GatePolicy::new(Some("secret".into()), true, true, "TryGhost");
        assert_eq!(strict.evaluate(&request), GateDecision::Unauthorized);

        let empty_key = GateRequest {
            key: Some(""),
            caller: Some(GHOST_UA),
        };
        assert_eq!(strict.evaluate(&empty_key), GateDecision::Unauthorized);
    }

    #[test]
    fn supplied_key_without_configured_secret_is_rejected() {
        let open = GatePolicy::new(None, false, true, "TryGhost");
        let request = GateRequest {
            key: Some("anything"),
            caller: Some(GHOST_UA),
        };
        assert_eq!(open.evaluate(&request), GateDecision::Unauthorized);
    }
}
