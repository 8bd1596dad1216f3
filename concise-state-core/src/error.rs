//! Errors synthesized by the store machinery
//!
//! Actions and middleware report failures through `anyhow::Error`, so user
//! errors reach the caller untouched. The types here are the only errors the
//! crate itself produces; callers recover them with `downcast_ref`.

/// A store was used without a mounted provider.
///
/// The display text names the attempted action or value and is stable:
/// code may match on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoProviderError {
    /// An action of the default store was invoked.
    #[error("can't invoke action '{action}' because provider does not exist")]
    Action { action: String },
    /// `set_state` was called on a reference that has no live state cell.
    #[error("can't invoke 'setState' with {attempted} because provider does not exist")]
    SetState { attempted: String },
}

impl NoProviderError {
    /// Name of the action that was invoked, if the failure came from one.
    pub fn action_name(&self) -> Option<&str> {
        match self {
            NoProviderError::Action { action } => Some(action),
            NoProviderError::SetState { .. } => None,
        }
    }
}

/// Errors raised by the store, resolver and host plumbing.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("action '{0}' is not defined on this store")]
    UnknownAction(String),

    #[error("store '{0}' was not injected")]
    UnknownStore(String),

    #[error("injected store '{name}' is not a {expected}")]
    StoreTypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("missing argument at position {0}")]
    MissingArgument(usize),

    #[error("invalid argument at position {index}: {source}")]
    InvalidArgument {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("action returned a pending result; await it with `Outcome::resolve`")]
    Pending,

    #[error("action result could not be decoded: {0}")]
    InvalidResult(#[source] serde_json::Error),

    #[error("render did not settle after {0} passes")]
    RenderLimit(usize),

    #[error("max_render_passes must be at least 1")]
    NoRenderPasses,
}
