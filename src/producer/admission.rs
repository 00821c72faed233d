//! Admission policy for subscription attempts

use crate::context::{Context, ContextError};
use crate::producer::error::SubscribeError;
use serde::{Deserialize, Serialize};

/// Who may subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Any number of concurrent subscribers
    #[default]
    Open,
    /// At most one live subscriber; others are told it is already subscribed
    Exclusive,
    /// Nobody; every attempt is rejected as unsupported
    Closed,
}

/// Admission rules evaluated once per subscription attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Admission {
    policy: AdmissionPolicy,
    max_subscribers: Option<usize>,
    required_context: Vec<String>,
    rejection_message: Option<String>,
}

impl Admission {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn exclusive() -> Self {
        Self {
            policy: AdmissionPolicy::Exclusive,
            ..Self::default()
        }
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self {
            policy: AdmissionPolicy::Closed,
            rejection_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_subscribers(mut self, max_subscribers: usize) -> Self {
        self.max_subscribers = Some(max_subscribers);
        self
    }

    /// Keys every subscriber must supply in its context
    pub fn with_required_context<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.required_context = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rejection_message(mut self, message: impl Into<String>) -> Self {
        self.rejection_message = Some(message.into());
        self
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    pub fn max_subscribers(&self) -> Option<usize> {
        self.max_subscribers
    }

    pub fn required_context(&self) -> &[String] {
        &self.required_context
    }

    /// Decide an attempt given the number of live subscriptions
    pub fn evaluate(&self, active: usize, ctx: &Context) -> Result<(), SubscribeError> {
        match self.policy {
            AdmissionPolicy::Closed => {
                return Err(SubscribeError::Unsupported {
                    message: self
                        .rejection_message
                        .clone()
                        .unwrap_or_else(|| "producer is closed to subscribers".to_string()),
                });
            }
            AdmissionPolicy::Exclusive if active > 0 => {
                return Err(SubscribeError::AlreadySubscribed);
            }
            _ => {}
        }

        if let Some(max_subscribers) = self.max_subscribers {
            if active >= max_subscribers {
                return Err(SubscribeError::CapacityExceeded { max_subscribers });
            }
        }

        for key in &self.required_context {
            if let Err(ContextError::NotFound { key }) = ctx.get(key) {
                return Err(SubscribeError::MissingContext { key });
            }
        }

        Ok(())
    }
}
