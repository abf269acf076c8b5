//! `initialize` (spec §4.3, control node): the graph's fixed first step.
//! Every field in this typed schema already has a default (spec §9:
//! closed, typed record rather than an open-ended dictionary), so there
//! are no missing fields left for this node to populate; it writes no
//! delta and is trivially idempotent.

use async_trait::async_trait;

use crate::node::{Node, NodeContext, NodeError, StateDelta};
use crate::state::InterviewSnapshot;

#[derive(Debug, Default)]
pub struct InitializeNode;

#[async_trait]
impl Node for InitializeNode {
    async fn run(&self, _snapshot: &InterviewSnapshot, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        // `phase` is never absent in this typed schema (it defaults to
        // `Intro` at construction) and `greeting` is its sole declared
        // writer for a fresh interview (spec §4.1: single-writer fields
        // have one statically assigned writer per run). `initialize` emits
        // no delta of its own; it exists as the graph's fixed first step,
        // trivially idempotent because it writes nothing.
        ctx.emit("initialize: no-op, schema defaults already cover every field")?;
        Ok(StateDelta::new())
    }
}
