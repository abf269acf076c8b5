//! Field-specific merge rules for combining a node's [`StateDelta`] into a
//! base [`InterviewState`] (spec §4.1).
//!
//! Append-only channels concatenate in delta order (associative, so branch
//! merge order cannot matter — though this runtime only ever merges one
//! delta at a time, see [`crate::graph`]). The control channel applies
//! "delta wins when present" per field and reports which fields were
//! written, so the caller (the graph runtime) can detect a node writing a
//! field another node already wrote this run (`DuplicateWriterWarning`,
//! spec §4.1/§7) without baking run-scoped state into the reducer itself.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::channels::Channel;
use crate::node::StateDelta;
use crate::state::InterviewState;
use crate::types::ChannelType;

/// The outcome of applying one reducer: whether its channel's contents
/// changed, and (control only) which single-writer fields this delta set.
#[derive(Debug, Clone, Default)]
pub struct ReducerOutcome {
    pub changed: bool,
    pub fields_written: Vec<&'static str>,
}

pub trait Reducer: Send + Sync {
    fn channel_type(&self) -> ChannelType;
    fn apply(&self, state: &mut InterviewState, delta: &StateDelta) -> ReducerOutcome;
}

macro_rules! append_reducer {
    ($reducer:ident, $channel_type:expr, $field:ident) => {
        pub struct $reducer;

        impl Reducer for $reducer {
            fn channel_type(&self) -> ChannelType {
                $channel_type
            }

            fn apply(&self, state: &mut InterviewState, delta: &StateDelta) -> ReducerOutcome {
                if delta.$field.is_empty() {
                    return ReducerOutcome::default();
                }
                state.$field.items.extend(delta.$field.iter().cloned());
                let next_version = state.$field.version().saturating_add(1);
                state.$field.set_version(next_version);
                ReducerOutcome {
                    changed: true,
                    fields_written: Vec::new(),
                }
            }
        }
    };
}

append_reducer!(TurnsReducer, ChannelType::Turns, turns);
append_reducer!(QuestionsReducer, ChannelType::Questions, questions);
append_reducer!(IntentsReducer, ChannelType::Intents, intents);
append_reducer!(SubmissionsReducer, ChannelType::Submissions, submissions);

/// Merges the single-writer / structured-replace control fields.
pub struct ControlReducer;

impl Reducer for ControlReducer {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Control
    }

    fn apply(&self, state: &mut InterviewState, delta: &StateDelta) -> ReducerOutcome {
        if !delta.touches_control() {
            return ReducerOutcome::default();
        }
        let c = &delta.control;
        let fields = &mut state.control.fields;
        let mut written = Vec::new();

        if let Some(v) = &c.next_message {
            fields.next_message = Some(v.clone());
            written.push("next_message");
        }
        if let Some(v) = c.phase {
            fields.phase = v;
            written.push("phase");
        }
        if let Some(v) = &c.next_node {
            fields.next_node = Some(v.clone());
            written.push("next_node");
        }
        if let Some(v) = c.turn_count {
            fields.turn_count = v;
            written.push("turn_count");
        }
        if let Some(v) = c.answer_quality {
            fields.answer_quality = Some(v);
            written.push("answer_quality");
        }
        if let Some(v) = &c.active_user_request {
            fields.active_user_request = Some(v.clone());
            written.push("active_user_request");
        }
        if c.clear_active_user_request {
            fields.active_user_request = None;
        }
        if let Some(v) = &c.sandbox {
            fields.sandbox = v.clone();
            written.push("sandbox");
        }
        if let Some(v) = &c.resume_context {
            fields.resume_context = v.clone();
            written.push("resume_context");
        }
        if let Some(v) = &c.topics_covered {
            for topic in v {
                if !fields.topics_covered.contains(topic) {
                    fields.topics_covered.push(topic.clone());
                }
            }
            written.push("topics_covered");
        }
        if let Some(v) = &c.evaluation {
            fields.evaluation = Some(v.clone());
            written.push("evaluation");
        }
        if let Some(v) = &c.last_response {
            fields.last_response = Some(v.clone());
            written.push("last_response");
        }
        if c.clear_last_response {
            fields.last_response = None;
        }
        if let Some(v) = &c.current_code {
            fields.current_code = Some(v.clone());
            written.push("current_code");
        }
        if c.clear_current_code {
            fields.current_code = None;
            fields.current_language = None;
        }
        if let Some(v) = &c.current_language {
            fields.current_language = Some(v.clone());
        }

        let next_version = state.control.version().saturating_add(1);
        state.control.set_version(next_version);

        ReducerOutcome {
            changed: true,
            fields_written: written,
        }
    }
}

/// Channel-keyed lookup of reducers, mirroring the teacher's
/// `ReducerRegistry`, generalized from the `{messages, extra, errors}`
/// channel set to this domain's six channels.
pub struct ReducerRegistry {
    reducers: FxHashMap<ChannelType, Arc<dyn Reducer>>,
}

impl ReducerRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut reducers: FxHashMap<ChannelType, Arc<dyn Reducer>> = FxHashMap::default();
        reducers.insert(ChannelType::Turns, Arc::new(TurnsReducer));
        reducers.insert(ChannelType::Questions, Arc::new(QuestionsReducer));
        reducers.insert(ChannelType::Intents, Arc::new(IntentsReducer));
        reducers.insert(ChannelType::Submissions, Arc::new(SubmissionsReducer));
        reducers.insert(ChannelType::Control, Arc::new(ControlReducer));
        Self { reducers }
    }

    /// Apply every registered reducer's slice of `delta` to `state`,
    /// returning the channels that changed and any control fields written
    /// by this delta (for duplicate-writer detection across a run).
    #[tracing::instrument(skip_all)]
    pub fn apply_all(&self, state: &mut InterviewState, delta: &StateDelta) -> AppliedChanges {
        let mut changed = Vec::new();
        let mut fields_written = Vec::new();
        for (channel_type, reducer) in &self.reducers {
            let outcome = reducer.apply(state, delta);
            if outcome.changed {
                changed.push(*channel_type);
            }
            fields_written.extend(outcome.fields_written);
        }
        AppliedChanges {
            changed_channels: changed,
            fields_written,
        }
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppliedChanges {
    pub changed_channels: Vec<ChannelType>,
    pub fields_written: Vec<&'static str>,
}
