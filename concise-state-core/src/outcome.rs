//! Result of invoking an action or middleware stage

use std::fmt;
use std::future::Future;

use futures::future::{FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::value::decode;

/// Future produced by an asynchronous action or middleware stage.
pub type PendingValue = LocalBoxFuture<'static, anyhow::Result<Value>>;

/// What an action invocation produced.
///
/// Synchronous actions return [`Outcome::Ready`]. Asynchronous ones, or any
/// middleware stage that awaits, return [`Outcome::Pending`] and the caller
/// awaits it with [`Outcome::resolve`]. The overall outcome of a dispatch
/// mirrors whatever the deepest executed stage produced.
pub enum Outcome {
    Ready(Value),
    Pending(PendingValue),
}

impl Outcome {
    /// Ready outcome carrying `null`
    pub fn unit() -> Self {
        Outcome::Ready(Value::Null)
    }

    /// Ready outcome from any serializable value.
    pub fn from_serialize<T: Serialize>(value: T) -> anyhow::Result<Self> {
        Ok(Outcome::Ready(serde_json::to_value(value)?))
    }

    /// Wrap a future as a pending outcome.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Value>> + 'static,
    {
        Outcome::Pending(future.boxed_local())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    /// The value of a ready outcome, or [`StoreError::Pending`].
    pub fn into_ready(self) -> Result<Value, StoreError> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Pending(_) => Err(StoreError::Pending),
        }
    }

    /// Decode a ready outcome into `T`.
    pub fn ready_as<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        Ok(decode(self.into_ready()?)?)
    }

    /// Wait for the value, whether ready or pending.
    pub async fn resolve(self) -> anyhow::Result<Value> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Pending(future) => future.await,
        }
    }

    /// Wait for the value and decode it into `T`.
    pub async fn resolve_as<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        Ok(decode(self.resolve().await?)?)
    }

    /// Post-process the value once it is available.
    ///
    /// Ready outcomes are transformed immediately; pending ones stay pending
    /// and run `f` after the inner future completes.
    pub fn then<F>(self, f: F) -> anyhow::Result<Self>
    where
        F: FnOnce(Value) -> anyhow::Result<Value> + 'static,
    {
        match self {
            Outcome::Ready(value) => f(value).map(Outcome::Ready),
            Outcome::Pending(future) => Ok(Outcome::pending(async move { f(future.await?) })),
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::unit()
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Ready(value)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Outcome::Pending(_) => f.write_str("Pending"),
        }
    }
}
