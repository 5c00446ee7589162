//! Status transition tables
//!
//! Pure lookups from (current status, trigger) to the next status. `None`
//! means the transition is not defined and must be treated as a failure.

use approval_types::{GcrDecision, GcrStatus, TrainingDecision, TrainingStatus};

/// What moves an application out of its current status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger<D> {
    /// Single-path step; carries no decision
    Advance,
    /// Branching step
    Decide(D),
}

pub fn next_training_status(
    current: TrainingStatus,
    trigger: Trigger<TrainingDecision>,
) -> Option<TrainingStatus> {
    use TrainingDecision as D;
    use TrainingStatus as S;

    match (current, trigger) {
        (S::PendingHod, Trigger::Decide(D::Recommended)) => Some(S::PendingHr),
        (S::PendingHod, Trigger::Decide(D::NotRecommended)) => Some(S::Rejected),
        (S::PendingHr, Trigger::Advance) => Some(S::PendingGm),
        (S::PendingGm, Trigger::Decide(D::Approved)) => Some(S::Approved),
        (S::PendingGm, Trigger::Decide(D::Rejected)) => Some(S::Rejected),
        _ => None,
    }
}

pub fn next_gcr_status(current: GcrStatus, trigger: Trigger<GcrDecision>) -> Option<GcrStatus> {
    use GcrDecision as D;
    use GcrStatus as S;

    match (current, trigger) {
        (S::PendingHr1, Trigger::Advance) => Some(S::PendingGm),
        (S::PendingGm, Trigger::Decide(D::Approved)) => Some(S::PendingHr2),
        (S::PendingGm, Trigger::Decide(D::Rejected)) => Some(S::Rejected),
        (S::PendingHr2, Trigger::Advance) => Some(S::PendingHr3),
        (S::PendingHr3, Trigger::Advance) => Some(S::PendingGmFinal),
        (S::PendingGmFinal, Trigger::Advance) => Some(S::Approved),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAINING_DECISIONS: [TrainingDecision; 4] = [
        TrainingDecision::Recommended,
        TrainingDecision::NotRecommended,
        TrainingDecision::Approved,
        TrainingDecision::Rejected,
    ];

    fn training_triggers() -> Vec<Trigger<TrainingDecision>> {
        let mut triggers = vec![Trigger::Advance];
        triggers.extend(TRAINING_DECISIONS.iter().map(|d| Trigger::Decide(*d)));
        triggers
    }

    fn gcr_triggers() -> Vec<Trigger<GcrDecision>> {
        vec![
            Trigger::Advance,
            Trigger::Decide(GcrDecision::Approved),
            Trigger::Decide(GcrDecision::Rejected),
        ]
    }

    #[test]
    fn test_training_happy_path() {
        let mut status = TrainingStatus::PendingHod;
        status = next_training_status(status, Trigger::Decide(TrainingDecision::Recommended)).unwrap();
        assert_eq!(status, TrainingStatus::PendingHr);
        status = next_training_status(status, Trigger::Advance).unwrap();
        assert_eq!(status, TrainingStatus::PendingGm);
        status = next_training_status(status, Trigger::Decide(TrainingDecision::Approved)).unwrap();
        assert_eq!(status, TrainingStatus::Approved);
    }

    #[test]
    fn test_training_branching_requires_matching_decision() {
        // HOD vocabulary is not accepted at the GM step and vice versa
        assert_eq!(
            next_training_status(TrainingStatus::PendingHod, Trigger::Decide(TrainingDecision::Approved)),
            None
        );
        assert_eq!(
            next_training_status(TrainingStatus::PendingGm, Trigger::Decide(TrainingDecision::Recommended)),
            None
        );
        assert_eq!(next_training_status(TrainingStatus::PendingHod, Trigger::Advance), None);
        assert_eq!(
            next_training_status(TrainingStatus::PendingHod, Trigger::Decide(TrainingDecision::NotRecommended)),
            Some(TrainingStatus::Rejected)
        );
    }

    #[test]
    fn test_gcr_full_chain() {
        let mut status = GcrStatus::PendingHr1;
        let steps = [
            (Trigger::Advance, GcrStatus::PendingGm),
            (Trigger::Decide(GcrDecision::Approved), GcrStatus::PendingHr2),
            (Trigger::Advance, GcrStatus::PendingHr3),
            (Trigger::Advance, GcrStatus::PendingGmFinal),
            (Trigger::Advance, GcrStatus::Approved),
        ];

        for (trigger, expected) in steps {
            status = next_gcr_status(status, trigger).unwrap();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_gcr_gm_rejection_and_missing_decision() {
        assert_eq!(
            next_gcr_status(GcrStatus::PendingGm, Trigger::Decide(GcrDecision::Rejected)),
            Some(GcrStatus::Rejected)
        );
        assert_eq!(next_gcr_status(GcrStatus::PendingGm, Trigger::Advance), None);
        // No rejection path after Lampiran A
        assert_eq!(
            next_gcr_status(GcrStatus::PendingGmFinal, Trigger::Decide(GcrDecision::Rejected)),
            None
        );
    }

    #[test]
    fn test_terminal_statuses_have_no_successor() {
        for status in [TrainingStatus::Approved, TrainingStatus::Rejected] {
            for trigger in training_triggers() {
                assert_eq!(next_training_status(status, trigger), None);
            }
        }
        for status in [GcrStatus::Approved, GcrStatus::Rejected] {
            for trigger in gcr_triggers() {
                assert_eq!(next_gcr_status(status, trigger), None);
            }
        }
    }

    #[test]
    fn test_transitions_never_revisit_a_status() {
        let order = |s: GcrStatus| GcrStatus::ALL.iter().position(|x| *x == s).unwrap();
        for status in GcrStatus::ALL {
            for trigger in gcr_triggers() {
                if let Some(next) = next_gcr_status(status, trigger) {
                    assert!(order(next) > order(status), "{} -> {} moves backwards", status, next);
                }
            }
        }

        let order = |s: TrainingStatus| TrainingStatus::ALL.iter().position(|x| *x == s).unwrap();
        for status in TrainingStatus::ALL {
            for trigger in training_triggers() {
                if let Some(next) = next_training_status(status, trigger) {
                    assert!(order(next) > order(status), "{} -> {} moves backwards", status, next);
                }
            }
        }
    }
}
