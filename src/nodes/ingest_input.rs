//! `ingest_input` (spec §4.3, control node): the graph's sole entry point
//! for external data. Reads exactly one of the transient fields carried on
//! the snapshot — `last_response`, `current_code`/`current_language`, or
//! neither (a timer tick) — and never calls the language model.

use async_trait::async_trait;
use chrono::Utc;

use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::TurnRecord;
use crate::state::InterviewSnapshot;

#[derive(Debug, Default)]
pub struct IngestInputNode;

#[async_trait]
impl Node for IngestInputNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let mut delta = StateDelta::new();

        if let Some(text) = &snapshot.control.last_response {
            delta = delta.with_turn(TurnRecord::user(text.clone(), Utc::now()));
            delta.control = ControlDelta {
                turn_count: Some(snapshot.control.turn_count + 1),
                ..ControlDelta::default()
            };
        }

        ctx.emit("ingest_input: external input absorbed")?;
        Ok(delta)
    }
}
