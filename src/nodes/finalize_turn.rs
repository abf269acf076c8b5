//! `finalize_turn` (spec §4.3, control node): the graph's sole terminal
//! node. Appends the assistant's spoken `next_message` to the conversation
//! history and clears the transient per-input fields so they never leak
//! into the next turn.

use async_trait::async_trait;
use chrono::Utc;

use crate::node::{ControlDelta, Node, NodeContext, NodeError, StateDelta};
use crate::records::TurnRecord;
use crate::state::InterviewSnapshot;

#[derive(Debug, Default)]
pub struct FinalizeTurnNode;

#[async_trait]
impl Node for FinalizeTurnNode {
    async fn run(&self, snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let mut delta = StateDelta::new();

        if let Some(message) = &snapshot.control.next_message {
            delta = delta.with_turn(TurnRecord::assistant(message.clone(), Utc::now()));
        }

        delta.control = ControlDelta {
            clear_last_response: true,
            clear_current_code: true,
            ..ControlDelta::default()
        };

        ctx.emit("finalize_turn: turn closed out")?;
        Ok(delta)
    }
}
