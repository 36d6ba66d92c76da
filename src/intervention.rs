//! Intervention mapper: issue -> intervention, total and side-effect free.
//!
//! The match over [`IssueKind`] is exhaustive, so adding a kind without a
//! mapping is a compile error rather than a runtime fallback. Dispatching
//! the result (notification, queue submission) is the supervisor's job.

use crate::models::intervention::{
    Intervention, Notification, Priority, QueueTask, ResponseKind,
};
use crate::models::issue::{Issue, IssueKind};
use crate::rules::RuleViolation;
use crate::utils::truncate;

/// Agent kinds for automated remediation, keyed by what went wrong.
const AGENT_TDD: &str = "tdd-remediator";
const AGENT_CHAIN: &str = "workflow-repair";
const AGENT_PROGRESS: &str = "progress-auditor";
const AGENT_OUTPUTS: &str = "output-auditor";

/// Map an issue to its intervention.
pub fn generate(issue: &Issue) -> Intervention {
    let response = response_for(issue.kind);
    let notification = notification_for(issue, response);
    let queue_task = queue_task_for(issue);

    Intervention {
        response,
        notification,
        queue_task,
    }
}

fn response_for(kind: IssueKind) -> ResponseKind {
    match kind {
        IssueKind::TddViolation
        | IssueKind::OutOfOrder
        | IssueKind::ChainBroken
        | IssueKind::MissingMilestones
        | IssueKind::IncompleteOutputs => ResponseKind::AutoRemediate,

        IssueKind::ExplicitFailure
        | IssueKind::AgentFailed
        | IssueKind::AbandonedAgent
        | IssueKind::AbruptStop => ResponseKind::Escalate,

        IssueKind::LoopDetected
        | IssueKind::PhaseStuck
        | IssueKind::PartialCompletion
        | IssueKind::Regression
        | IssueKind::Silence
        | IssueKind::DecliningVelocity
        | IssueKind::AgentSilence => ResponseKind::NotifyOnly,
    }
}

fn notification_for(issue: &Issue, response: ResponseKind) -> Notification {
    let title = match issue.kind {
        IssueKind::LoopDetected => "Workflow looping",
        IssueKind::PhaseStuck => "Phase never finished",
        IssueKind::AbruptStop => "Workflow stopped abruptly",
        IssueKind::PartialCompletion => "Partial completion",
        IssueKind::ExplicitFailure => "Workflow failure",
        IssueKind::AgentFailed => "Agent failure",
        IssueKind::Regression => "Completed step restarted",
        IssueKind::TddViolation => "TDD order violated",
        IssueKind::OutOfOrder => "Phases out of order",
        IssueKind::ChainBroken => "Chain order broken",
        IssueKind::MissingMilestones => "No milestones recorded",
        IssueKind::IncompleteOutputs => "Outputs missing",
        IssueKind::Silence => "Workflow gone quiet",
        IssueKind::DecliningVelocity => "Progress slowing down",
        IssueKind::AgentSilence => "Agent gone quiet",
        IssueKind::AbandonedAgent => "Agent abandoned",
    };

    let sound = match response {
        ResponseKind::Escalate => "critical",
        ResponseKind::AutoRemediate => "warning",
        ResponseKind::NotifyOnly => "default",
    };

    Notification {
        title: format!("vigil: {title}"),
        message: truncate(&issue.message, 200),
        sound: sound.to_string(),
    }
}

/// Remediation task for the issue kinds that support one.
fn queue_task_for(issue: &Issue) -> Option<QueueTask> {
    let (agent_kind, prompt) = match issue.kind {
        IssueKind::TddViolation | IssueKind::OutOfOrder => (
            AGENT_TDD,
            format!(
                "The build workflow violated phase ordering: {}. \
                 Re-establish the RED -> GREEN -> REFACTOR cycle, starting \
                 from a failing test for the current change.",
                issue.message
            ),
        ),
        IssueKind::ChainBroken => (
            AGENT_CHAIN,
            format!(
                "The workflow chain is broken: {}. Verify the skipped step's \
                 outputs exist and backfill whatever is missing before \
                 continuing.",
                issue.message
            ),
        ),
        IssueKind::MissingMilestones => (
            AGENT_PROGRESS,
            format!(
                "A command finished without milestones: {}. Reconstruct the \
                 milestone trail from the work actually done and record it.",
                issue.message
            ),
        ),
        IssueKind::IncompleteOutputs => (
            AGENT_OUTPUTS,
            format!(
                "A command finished without its expected outputs: {}. \
                 Identify the missing artifacts and produce them.",
                issue.message
            ),
        ),
        _ => return None,
    };

    Some(QueueTask {
        priority: Priority::from_confidence(issue.confidence),
        prompt,
        agent_kind: agent_kind.to_string(),
    })
}

/// Map a rule violation to its intervention. Violations always notify;
/// ones carrying a corrective action also queue a high-priority task.
pub fn generate_for_violation(violation: &RuleViolation) -> Intervention {
    let queue_task = violation.corrective_action.as_ref().map(|action| QueueTask {
        priority: Priority::High,
        prompt: format!("[{}] {}", violation.law, action),
        agent_kind: AGENT_CHAIN.to_string(),
    });

    Intervention {
        response: if queue_task.is_some() {
            ResponseKind::AutoRemediate
        } else {
            ResponseKind::NotifyOnly
        },
        notification: Notification {
            title: format!("vigil: rule {} violated", violation.law),
            message: truncate(&violation.message, 200),
            sound: "critical".to_string(),
        },
        queue_task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(kind: IssueKind, confidence: f64) -> Issue {
        Issue::new(kind, "something happened", confidence)
    }

    #[test]
    fn test_every_kind_maps() {
        let kinds = [
            IssueKind::LoopDetected,
            IssueKind::PhaseStuck,
            IssueKind::AbruptStop,
            IssueKind::PartialCompletion,
            IssueKind::ExplicitFailure,
            IssueKind::AgentFailed,
            IssueKind::Regression,
            IssueKind::TddViolation,
            IssueKind::OutOfOrder,
            IssueKind::ChainBroken,
            IssueKind::MissingMilestones,
            IssueKind::IncompleteOutputs,
            IssueKind::Silence,
            IssueKind::DecliningVelocity,
            IssueKind::AgentSilence,
            IssueKind::AbandonedAgent,
        ];
        for kind in kinds {
            let intervention = generate(&issue(kind, 0.7));
            assert!(!intervention.notification.title.is_empty());
            assert!(!intervention.notification.message.is_empty());
        }
    }

    #[test]
    fn test_remediable_kinds_get_queue_tasks() {
        for kind in [
            IssueKind::TddViolation,
            IssueKind::OutOfOrder,
            IssueKind::ChainBroken,
            IssueKind::MissingMilestones,
            IssueKind::IncompleteOutputs,
        ] {
            let intervention = generate(&issue(kind, 0.95));
            assert_eq!(intervention.response, ResponseKind::AutoRemediate);
            let task = intervention.queue_task.expect("remediable kind needs a task");
            assert_eq!(task.priority, Priority::High);
            assert!(!task.agent_kind.is_empty());
        }
    }

    #[test]
    fn test_tdd_issues_route_to_tdd_agent() {
        let intervention = generate(&issue(IssueKind::TddViolation, 0.95));
        assert_eq!(intervention.queue_task.unwrap().agent_kind, AGENT_TDD);
        let intervention = generate(&issue(IssueKind::OutOfOrder, 0.92));
        assert_eq!(intervention.queue_task.unwrap().agent_kind, AGENT_TDD);
    }

    #[test]
    fn test_priority_follows_confidence() {
        let high = generate(&issue(IssueKind::ChainBroken, 0.95));
        let medium = generate(&issue(IssueKind::ChainBroken, 0.7));
        let low = generate(&issue(IssueKind::ChainBroken, 0.4));
        assert_eq!(high.queue_task.unwrap().priority, Priority::High);
        assert_eq!(medium.queue_task.unwrap().priority, Priority::Medium);
        assert_eq!(low.queue_task.unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_failures_escalate_without_tasks() {
        let intervention = generate(&issue(IssueKind::ExplicitFailure, 1.0));
        assert_eq!(intervention.response, ResponseKind::Escalate);
        assert!(intervention.queue_task.is_none());
        assert_eq!(intervention.notification.sound, "critical");
    }

    #[test]
    fn test_violation_with_corrective_action() {
        let violation = RuleViolation {
            law: "no-direct-push".to_string(),
            kind: "process".to_string(),
            message: "pushed to main without review".to_string(),
            corrective_action: Some("revert and open a PR".to_string()),
        };
        let intervention = generate_for_violation(&violation);
        assert_eq!(intervention.response, ResponseKind::AutoRemediate);
        let task = intervention.queue_task.unwrap();
        assert_eq!(task.priority, Priority::High);
        assert!(task.prompt.contains("no-direct-push"));
    }

    #[test]
    fn test_violation_without_corrective_action() {
        let violation = RuleViolation {
            law: "commit-style".to_string(),
            kind: "process".to_string(),
            message: "commit message too vague".to_string(),
            corrective_action: None,
        };
        let intervention = generate_for_violation(&violation);
        assert_eq!(intervention.response, ResponseKind::NotifyOnly);
        assert!(intervention.queue_task.is_none());
    }
}
