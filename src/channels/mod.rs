//! The versioned state slices that make up [`crate::state::InterviewState`].
//!
//! Each channel owns one mutation class from spec §3/§4.1: append-only
//! sequences, the single-writer/structured "control" slice, and the
//! diagnostic errors log. A channel tracks its own version counter so the
//! graph runtime can tell, after a barrier, which slices actually changed
//! (mirrors the teacher's `Channel` trait in shape, generalized from
//! `messages`/`extra`/`errors` to this domain's six slices).

use serde::{Deserialize, Serialize};

use crate::errors::ErrorEvent;
use crate::records::{CodeSubmission, IntentRecord, QuestionRecord, TurnRecord};
use crate::types::ChannelType;

/// Common behavior every state slice exposes to the reducer registry and
/// the barrier step.
pub trait Channel {
    fn version(&self) -> u32;
    fn set_version(&mut self, version: u32);
    fn get_channel_type(&self) -> ChannelType;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! append_channel {
    ($name:ident, $item:ty, $channel_type:expr) => {
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub items: Vec<$item>,
            #[serde(default)]
            pub version: u32,
        }

        impl $name {
            #[must_use]
            pub fn new(items: Vec<$item>) -> Self {
                Self { items, version: 0 }
            }

            #[must_use]
            pub fn snapshot(&self) -> Vec<$item> {
                self.items.clone()
            }
        }

        impl Channel for $name {
            fn version(&self) -> u32 {
                self.version
            }

            fn set_version(&mut self, version: u32) {
                self.version = version;
            }

            fn get_channel_type(&self) -> ChannelType {
                $channel_type
            }

            fn len(&self) -> usize {
                self.items.len()
            }
        }
    };
}

append_channel!(TurnsChannel, TurnRecord, ChannelType::Turns);
append_channel!(QuestionsChannel, QuestionRecord, ChannelType::Questions);
append_channel!(IntentsChannel, IntentRecord, ChannelType::Intents);
append_channel!(SubmissionsChannel, CodeSubmission, ChannelType::Submissions);
append_channel!(ErrorsChannel, ErrorEvent, ChannelType::Errors);

/// The single-writer and structured-replace fields of spec §3, gathered
/// into one channel since they share the same merge rule shape ("delta
/// wholesale-replaces base when present") and the same single-writer
/// discipline the runtime enforces per graph run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ControlChannel {
    pub fields: crate::state::ControlFields,
    #[serde(default)]
    pub version: u32,
}

impl ControlChannel {
    #[must_use]
    pub fn new(fields: crate::state::ControlFields) -> Self {
        Self { fields, version: 0 }
    }
}

impl Channel for ControlChannel {
    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn get_channel_type(&self) -> ChannelType {
        ChannelType::Control
    }

    fn len(&self) -> usize {
        1
    }

    fn is_empty(&self) -> bool {
        false
    }
}
