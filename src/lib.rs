//! A session-aware chat service that lets a language model invoke
//! server-side tools mid-conversation.
//!
//! The crate provides:
//! - A model client abstraction (`ModelClient`) with an Anthropic-backed
//!   implementation and a scripted stub for tests.
//! - A tool interface (`Tool`, `ToolRegistry`) dispatched by name, where
//!   tool failures become structured results instead of errors.
//! - An `Agent` that loops between the model and tools until the model
//!   stops asking for them, bounded by an iteration cap.
//! - An axum HTTP surface with per-session transcripts.

mod agent;
mod config;
mod error;
mod llm;
mod message;
mod server;
mod session;
mod tool;
mod tools;

pub use agent::{Agent, AgentOutcome, DEFAULT_MAX_ITERATIONS};
pub use config::{AgentConfig, AppConfig, ModelConfig, ServerConfig};
pub use error::{ColloquyError, Result};
pub use llm::{AnthropicClient, ModelClient, ScriptedModel};
pub use message::{ContentBlock, ModelResponse, Speaker, StopReason, Turn, TurnContent, Usage};
pub use server::{router, serve, ChatReply, ChatService};
pub use session::{InMemorySessionStore, SessionGates, SessionStore, Transcript};
pub use tool::{Tool, ToolRegistry, ToolSpec};
pub use tools::{default_toolkit, CalculatorTool, CurrentTimeTool};
