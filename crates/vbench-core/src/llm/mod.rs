//! Model service integration.
//!
//! Provides the client abstraction the sweep calls through, the Vertex AI
//! implementation, and the single-retry policy for rate-limited calls.

pub(crate) mod provider;
pub(crate) mod retry;
pub(crate) mod vertex;

pub use provider::{resolve_env_var, ImageInput, ModelClient, ModelRequest, ModelResponse};
pub use retry::{AttemptState, RetryPolicy, MAX_ATTEMPTS};
pub use vertex::{VertexClient, VertexSettings, DEFAULT_LOCATION};
