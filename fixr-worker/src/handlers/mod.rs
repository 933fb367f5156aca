/// Task handlers
///
/// A handler owns one task type. The pool looks the type up in the
/// [`HandlerRegistry`]; tasks whose type has no handler are archived.
///
/// # Outcome mapping
///
/// ```text
/// Ok(())                          -> ack
/// Err(e) if e.is_retryable()      -> retry with backoff (until maxRetry)
/// Err(e)                          -> archive
/// ```
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use fixr_shared::jobs::TaskMessage;
/// use fixr_worker::handlers::{HandlerRegistry, HandlerResult, TaskHandler};
/// use std::sync::Arc;
///
/// struct Noop;
///
/// #[async_trait]
/// impl TaskHandler for Noop {
///     fn task_type(&self) -> &str {
///         "noop"
///     }
///
///     async fn handle(&self, _task: &TaskMessage) -> HandlerResult<()> {
///         Ok(())
///     }
/// }
///
/// let mut registry = HandlerRegistry::new();
/// registry.register(Arc::new(Noop));
/// assert!(registry.get("noop").is_some());
/// ```

pub mod welcome_email;

use async_trait::async_trait;
use fixr_shared::jobs::TaskMessage;
use std::collections::HashMap;
use std::sync::Arc;

use crate::email::EmailError;

pub use welcome_email::WelcomeEmailHandler;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Payload does not match the handler's type
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Whether running the task again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            HandlerError::InvalidPayload(_) => false,
            HandlerError::Email(e) => !e.is_permanent(),
            HandlerError::Failed(_) => true,
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Task type this handler consumes, e.g. `email:welcome`
    fn task_type(&self) -> &str;

    async fn handle(&self, task: &TaskMessage) -> HandlerResult<()>;
}

/// Task type → handler
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, replacing any handler for the same type
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        let task_type = handler.task_type().to_string();
        tracing::info!(task_type = %task_type, "Registering task handler");
        self.handlers.insert(task_type, handler);
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(task_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl TaskHandler for Fixed {
        fn task_type(&self) -> &str {
            self.0
        }

        async fn handle(&self, _task: &TaskMessage) -> HandlerResult<()> {
            Err(HandlerError::Failed(self.0.to_string()))
        }
    }

    #[test]
    fn test_register_replaces_same_type() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(Fixed("a")));
        registry.register(Arc::new(Fixed("a")));
        registry.register(Arc::new(Fixed("b")));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_retryable_classification() {
        let bad_payload = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        assert!(!HandlerError::from(bad_payload).is_retryable());
        assert!(HandlerError::Failed("boom".into()).is_retryable());
        assert!(!HandlerError::Email(EmailError::Rejected { status: 400, body: String::new() })
            .is_retryable());
        assert!(HandlerError::Email(EmailError::Rejected { status: 503, body: String::new() })
            .is_retryable());
    }
}
