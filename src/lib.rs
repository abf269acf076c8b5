//! # interview-engine: a graph-driven interview orchestration engine
//!
//! `interview-engine` turns one input event — a candidate's utterance, a
//! code submission, a reconnect, a timer tick — into the next interviewer
//! action and a checkpointed state update. Each turn walks a small,
//! strictly sequential graph (spec §4.6) over a single mutable
//! [`state::InterviewState`], the way the teacher's own graph runtime
//! walks a versioned state through a node DAG, generalized to a domain
//! with no fan-out.
//!
//! ## Core Concepts
//!
//! - **State**: one [`state::InterviewState`] per interview, made of
//!   channels (spec §3) with single-writer, append-only, and
//!   structured-replace merge semantics (see [`channels`] and
//!   [`reducers`]).
//! - **Nodes**: async units of work ([`node::Node`]) that take a
//!   read-only [`state::InterviewSnapshot`] and return a
//!   [`node::StateDelta`] — see [`nodes`] for the full library and
//!   [`nodes::NodeRegistry`] for handler lookup.
//! - **Graph**: [`graph::GraphRuntime`] drives one turn end to end.
//! - **Coordinator**: [`coordinator::SessionCoordinator`] owns the
//!   per-interview lock, checkpoint round-trip, and external API
//!   surface ([`coordinator::SessionCoordinator::execute_step`]).
//! - **Checkpoints**: [`checkpoint::CheckpointStore`] persists versioned
//!   snapshots of state between steps.
//! - **Language model and sandbox adapters**: [`lm::LmClient`] and
//!   [`sandbox::SandboxClient`] isolate nodes from the concrete LM/code
//!   execution backends behind trait objects, swappable for tests.
//!
//! ## Quick Start
//!
//! ### Building a state and running one turn
//!
//! ```
//! use interview_engine::config::Config;
//! use interview_engine::event_bus::EventHub;
//! use interview_engine::graph::GraphRuntime;
//! use interview_engine::lm::mock::MockLmBackend;
//! use interview_engine::lm::LmClient;
//! use interview_engine::nodes::NodeRegistry;
//! use interview_engine::sandbox::mock::MockSandboxBackend;
//! use interview_engine::sandbox::SandboxClient;
//! use interview_engine::state::InterviewState;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let config = Config::default();
//! let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config));
//! let sandbox = Arc::new(SandboxClient::new(Arc::new(MockSandboxBackend::default()), &config));
//! let runtime = GraphRuntime::new(NodeRegistry::new(lm, sandbox, &config));
//!
//! let hub = Arc::new(EventHub::new(64));
//! let mut state = InterviewState::new("interview-123");
//!
//! let outcome = runtime.run(&mut state, hub.emitter()).await.unwrap();
//! assert!(outcome.next_message.is_some());
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run());
//! ```
//!
//! ### Writing a node
//!
//! ```
//! use async_trait::async_trait;
//! use interview_engine::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
//! use interview_engine::state::InterviewSnapshot;
//!
//! struct EchoNode;
//!
//! #[async_trait]
//! impl Node for EchoNode {
//!     async fn run(&self, _snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
//!         ctx.emit("echo: nothing to say yet")?;
//!         Ok(StateDelta::new().with_control(ControlDelta {
//!             next_message: Some("hello".to_string()),
//!             ..ControlDelta::default()
//!         }))
//!     }
//! }
//! ```
//!
//! ### Configuration
//!
//! ```
//! use interview_engine::config::Config;
//!
//! // Defaults match spec §6; override selectively via env vars.
//! let config = Config::default();
//! assert_eq!(config.intent_confidence_threshold, 0.7);
//! ```
//!
//! ## Module Guide
//!
//! - [`state`] - the per-interview state object and its channels
//! - [`channels`] - single-writer / append-only / structured-replace storage
//! - [`records`] - the wire-shaped value types state and nodes move around
//! - [`reducers`] - applies a node's delta onto state, by merge class
//! - [`node`] - the `Node` trait, `NodeContext`, `StateDelta`
//! - [`nodes`] - the node library plus `NodeRegistry`
//! - [`graph`] - the sequential per-turn graph runtime
//! - [`policy`] - the intent/decision overrides layered on the LM's routing
//! - [`checkpoint`] - versioned state persistence
//! - [`coordinator`] - per-interview locking, the external step API
//! - [`lm`] - language model adapter, schema validation, retries
//! - [`sandbox`] - code execution adapter
//! - [`config`] - runtime configuration
//! - [`errors`] - the diagnostic error-event envelope
//! - [`event_bus`] - the broadcast event stream nodes emit onto
//! - [`telemetry`] - structured logging setup
//! - [`backoff`] - shared retry/backoff helper
//! - [`types`] - `NodeKind` and other small shared enums

pub mod backoff;
pub mod channels;
pub mod checkpoint;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod event_bus;
pub mod graph;
pub mod lm;
pub mod node;
pub mod nodes;
pub mod policy;
pub mod records;
pub mod reducers;
pub mod sandbox;
pub mod state;
pub mod telemetry;
pub mod types;
