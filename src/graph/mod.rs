//! Graph Runtime (spec §4.6, C6): a single entry (`ingest_input`), single
//! terminal (`finalize_turn`) DAG, with two conditional edges — one after
//! `ingest_input` deciding whether this input needs intent detection at
//! all, one after `decide_next_action` reading its routing decision.
//!
//! Unlike the teacher's bulk-synchronous-superstep scheduler (concurrent
//! frontier, `petgraph`, versions-seen bookkeeping across fan-out
//! branches), this graph has no fan-out: spec §4.6 describes a strictly
//! sequential walk, so the runtime here is a straight-line driver over a
//! [`crate::nodes::NodeRegistry`] rather than the teacher's `GraphBuilder`
//! machinery (spec §9 re-architecture: "graph is declared as data").

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::event_bus::EventEmitter;
use crate::node::{NodeContext, NodeError};
use crate::nodes::NodeRegistry;
use crate::reducers::ReducerRegistry;
use crate::state::InterviewState;
use crate::types::NodeKind;

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node {node} failed during a graph run")]
    #[diagnostic(code(interview_engine::graph::node_failed))]
    NodeFailed {
        node: &'static str,
        #[source]
        source: NodeError,
    },

    #[error("node registry has no handler registered for {kind}")]
    #[diagnostic(code(interview_engine::graph::missing_handler))]
    MissingHandler { kind: NodeKind },
}

/// What one graph run produced, for the coordinator to act on.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub next_message: Option<String>,
    pub nodes_executed: Vec<NodeKind>,
    /// Control fields written by more than one node in this run (spec
    /// §4.1/§7 `DuplicateWriterWarning`): tolerated, logged, last write
    /// wins (the reducer already applies deltas in execution order).
    pub duplicate_writers: Vec<&'static str>,
}

/// `route_from_ingest` (spec §4.6): an empty conversation always greets
/// first; a pending code submission always goes straight to review,
/// bypassing intent detection; everything else is classified.
#[must_use]
pub fn route_from_ingest(state: &InterviewState) -> NodeKind {
    if state.turns.items.is_empty() {
        NodeKind::Greeting
    } else if state
        .control
        .fields
        .current_code
        .as_deref()
        .is_some_and(|c| !c.is_empty())
    {
        NodeKind::CodeReview
    } else {
        NodeKind::DetectIntent
    }
}

/// `route_from_decide` (spec §4.6): reads `next_node` off control state.
/// Anything that doesn't parse to a known action node — corrupt state, a
/// checkpoint from an older schema, a bug upstream — defaults to
/// `question` and is logged as an anomaly rather than failing the run.
#[must_use]
pub fn route_from_decide(state: &InterviewState, emitter: &Arc<dyn EventEmitter>) -> NodeKind {
    let stored = state.control.fields.next_node.as_deref();
    match stored.and_then(NodeKind::parse_action_node) {
        Some(kind) => kind,
        None => {
            tracing::warn!(observed = ?stored, "decide_next_action produced an unrecognized route, defaulting to question");
            let _ = emitter.emit(crate::event_bus::Event::diagnostic(
                "routing",
                format!("unknown next_node {stored:?}, defaulting to question"),
            ));
            NodeKind::Question
        }
    }
}

/// Drives one full turn through the graph: `initialize` → `ingest_input`
/// → (conditional) → `finalize_turn`.
pub struct GraphRuntime {
    registry: NodeRegistry,
    reducers: ReducerRegistry,
}

impl GraphRuntime {
    #[must_use]
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            registry,
            reducers: ReducerRegistry::new(),
        }
    }

    #[tracing::instrument(skip_all, fields(interview_id = %state.interview_id))]
    pub async fn run(
        &self,
        state: &mut InterviewState,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<RunOutcome, GraphError> {
        let mut outcome = RunOutcome::default();
        let mut seen_fields: Vec<&'static str> = Vec::new();
        let mut step = 0u64;

        self.execute(NodeKind::Initialize, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
            .await?;
        self.execute(NodeKind::IngestInput, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
            .await?;

        match route_from_ingest(state) {
            NodeKind::Greeting => {
                self.execute(NodeKind::Greeting, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
                    .await?;
            }
            NodeKind::CodeReview => {
                self.execute(NodeKind::CodeReview, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
                    .await?;
            }
            _ => {
                self.execute(NodeKind::DetectIntent, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
                    .await?;
                self.execute(NodeKind::DecideNextAction, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
                    .await?;
                let next = route_from_decide(state, &emitter);
                self.execute(next, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
                    .await?;
            }
        }

        self.execute(NodeKind::FinalizeTurn, state, &emitter, &mut step, &mut outcome, &mut seen_fields)
            .await?;

        outcome.next_message = state.control.fields.next_message.clone();
        Ok(outcome)
    }

    async fn execute(
        &self,
        kind: NodeKind,
        state: &mut InterviewState,
        emitter: &Arc<dyn EventEmitter>,
        step: &mut u64,
        outcome: &mut RunOutcome,
        seen_fields: &mut Vec<&'static str>,
    ) -> Result<(), GraphError> {
        let node = self
            .registry
            .get(kind)
            .ok_or(GraphError::MissingHandler { kind })?;
        let snapshot = state.snapshot();
        let ctx = NodeContext::new(kind, *step, emitter.clone());
        *step += 1;

        let delta = node
            .run(&snapshot, &ctx)
            .await
            .map_err(|source| GraphError::NodeFailed { node: kind.as_str(), source })?;

        let applied = self.reducers.apply_all(state, &delta);
        state.control.fields.last_node = Some(kind.as_str().to_string());

        for field in &applied.fields_written {
            if seen_fields.contains(field) {
                tracing::warn!(node = kind.as_str(), field, "duplicate control-field writer this run");
                if !outcome.duplicate_writers.contains(field) {
                    outcome.duplicate_writers.push(field);
                }
            } else {
                seen_fields.push(field);
            }
        }

        outcome.nodes_executed.push(kind);
        Ok(())
    }
}
