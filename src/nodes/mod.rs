//! The Node Library (spec §4.3, C3): one submodule per handler, plus a
//! [`NodeRegistry`] the graph runtime uses to look up the handler for a
//! given [`crate::types::NodeKind`] without a giant `match` at the call
//! site (spec §9's "registry of named handlers" re-architecture note).

pub mod closing;
pub mod code_review;
pub mod decide_next_action;
pub mod dedup;
pub mod detect_intent;
pub mod evaluation;
pub mod finalize_turn;
pub mod followup;
pub mod greeting;
pub mod ingest_input;
pub mod initialize;
pub mod question;
pub mod sandbox_guidance;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::lm::LmClient;
use crate::node::Node;
use crate::sandbox::SandboxClient;
use crate::types::NodeKind;

use closing::ClosingNode;
use code_review::CodeReviewNode;
use decide_next_action::DecideNextActionNode;
use detect_intent::DetectIntentNode;
use evaluation::EvaluationNode;
use finalize_turn::FinalizeTurnNode;
use followup::FollowupNode;
use greeting::GreetingNode;
use ingest_input::IngestInputNode;
use initialize::InitializeNode;
use question::QuestionNode;
use sandbox_guidance::SandboxGuidanceNode;

/// Lookup from [`NodeKind`] to the handler that implements it. Built once
/// per [`crate::coordinator::SessionCoordinator`] and shared across every
/// run for an interview (spec §9: explicit dependency, not a singleton).
pub struct NodeRegistry {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new(lm: Arc<LmClient>, sandbox: Arc<SandboxClient>, config: &Config) -> Self {
        let mut nodes: FxHashMap<NodeKind, Arc<dyn Node>> = FxHashMap::default();
        nodes.insert(NodeKind::Initialize, Arc::new(InitializeNode));
        nodes.insert(NodeKind::IngestInput, Arc::new(IngestInputNode));
        nodes.insert(
            NodeKind::DetectIntent,
            Arc::new(DetectIntentNode::new(lm.clone(), config.intent_confidence_threshold)),
        );
        nodes.insert(
            NodeKind::DecideNextAction,
            Arc::new(DecideNextActionNode::new(lm.clone(), config.evaluation_turn_threshold)),
        );
        nodes.insert(NodeKind::FinalizeTurn, Arc::new(FinalizeTurnNode));
        nodes.insert(NodeKind::Greeting, Arc::new(GreetingNode::new(lm.clone())));
        nodes.insert(
            NodeKind::Question,
            Arc::new(QuestionNode::new(lm.clone(), config.dup_question_overlap_threshold)),
        );
        nodes.insert(NodeKind::Followup, Arc::new(FollowupNode::new(lm.clone())));
        nodes.insert(
            NodeKind::SandboxGuidance,
            Arc::new(SandboxGuidanceNode::new(lm.clone())),
        );
        nodes.insert(
            NodeKind::CodeReview,
            Arc::new(CodeReviewNode::new(lm.clone(), sandbox, config)),
        );
        nodes.insert(NodeKind::Evaluation, Arc::new(EvaluationNode::new(lm.clone())));
        nodes.insert(NodeKind::Closing, Arc::new(ClosingNode::new(lm)));
        Self { nodes }
    }

    #[must_use]
    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn Node>> {
        self.nodes.get(&kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::mock::MockLmBackend;
    use crate::sandbox::mock::MockSandboxBackend;

    #[test]
    fn registry_resolves_every_real_node_kind() {
        let config = Config::default();
        let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config));
        let sandbox = Arc::new(SandboxClient::new(Arc::new(MockSandboxBackend::default()), &config));
        let registry = NodeRegistry::new(lm, sandbox, &config);

        for kind in [
            NodeKind::Initialize,
            NodeKind::IngestInput,
            NodeKind::DetectIntent,
            NodeKind::DecideNextAction,
            NodeKind::FinalizeTurn,
            NodeKind::Greeting,
            NodeKind::Question,
            NodeKind::Followup,
            NodeKind::SandboxGuidance,
            NodeKind::CodeReview,
            NodeKind::Evaluation,
            NodeKind::Closing,
        ] {
            assert!(registry.get(kind).is_some());
        }
    }

    #[test]
    fn registry_has_no_handler_for_virtual_endpoints() {
        let config = Config::default();
        let lm = Arc::new(LmClient::new(Arc::new(MockLmBackend::default()), &config));
        let sandbox = Arc::new(SandboxClient::new(Arc::new(MockSandboxBackend::default()), &config));
        let registry = NodeRegistry::new(lm, sandbox, &config);

        assert!(registry.get(NodeKind::Start).is_none());
        assert!(registry.get(NodeKind::End).is_none());
    }
}
