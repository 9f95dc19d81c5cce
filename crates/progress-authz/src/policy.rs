//! Progress-report decision table.
//!
//! # Purpose
//! Decides whether an actor may read, create, update or delete a progress
//! report. The caller supplies the target snapshot and an ownership lookup;
//! nothing here touches storage or shared state.
//!
//! # Rules
//! | actor        | read            | create / update        | delete          |
//! |--------------|-----------------|------------------------|-----------------|
//! | anonymous    | non-draft only  | unauthenticated        | unauthenticated |
//! | guest        | non-draft only  | forbidden              | forbidden       |
//! | contributor  | always          | manages the indicator  | forbidden       |
//! | manager      | always          | always                 | always          |
//!
//! A hidden draft read is denied with `unauthenticated` for anonymous actors
//! and `forbidden` for guests.
use crate::{Action, Actor, Decision, DenyReason, IndicatorId, IndicatorOwnership, Role};

/// The parts of an existing progress report the policy depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRef {
    pub indicator_id: IndicatorId,
    pub draft: bool,
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The indicator a new report would be filed under (create).
    Indicator(IndicatorId),
    /// An existing report (read, update, delete).
    Report(ReportRef),
}

impl Target {
    pub fn indicator_id(&self) -> IndicatorId {
        match self {
            Target::Indicator(id) => *id,
            Target::Report(report) => report.indicator_id,
        }
    }

    /// Indicators carry no draft state, so only reports can be hidden.
    fn is_draft(&self) -> bool {
        match self {
            Target::Indicator(_) => false,
            Target::Report(report) => report.draft,
        }
    }
}

/// Decide `action` for `actor` when the answer does not depend on the target.
///
/// Returns `None` for the target-dependent rows: reads by anonymous or guest
/// actors, and contributor creates/updates. Handlers call this before loading
/// a target so an anonymous delete of a missing report is still rejected as
/// unauthenticated.
pub fn decide_by_role(actor: &Actor, action: Action) -> Option<Decision> {
    let role = match actor {
        Actor::Anonymous => {
            return if action.is_mutation() {
                Some(Decision::Deny(DenyReason::Unauthenticated))
            } else {
                None
            };
        }
        Actor::User { role, .. } => *role,
    };
    match (role, action) {
        (Role::Manager, _) => Some(Decision::Allow),
        (Role::Contributor, Action::Read) => Some(Decision::Allow),
        (Role::Contributor, Action::Delete) => Some(Decision::Deny(DenyReason::Forbidden)),
        (Role::Contributor, Action::Create | Action::Update) => None,
        (Role::Guest, Action::Read) => None,
        (Role::Guest, _) => Some(Decision::Deny(DenyReason::Forbidden)),
    }
}

/// Evaluate the decision table for a single request.
pub fn authorize<O>(actor: &Actor, action: Action, target: &Target, ownership: &O) -> Decision
where
    O: IndicatorOwnership + ?Sized,
{
    if let Some(decision) = decide_by_role(actor, action) {
        return decision;
    }
    match (actor, action) {
        (Actor::Anonymous, Action::Read) => {
            visible_unless_draft(target, DenyReason::Unauthenticated)
        }
        (Actor::User { role: Role::Guest, .. }, Action::Read) => {
            visible_unless_draft(target, DenyReason::Forbidden)
        }
        (
            Actor::User {
                id,
                role: Role::Contributor,
            },
            Action::Create | Action::Update,
        ) => {
            if ownership.manager_of(target.indicator_id()) == Some(*id) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Forbidden)
            }
        }
        // `decide_by_role` answers every other combination.
        _ => Decision::Deny(DenyReason::Forbidden),
    }
}

fn visible_unless_draft(target: &Target, hidden: DenyReason) -> Decision {
    if target.is_draft() {
        Decision::Deny(hidden)
    } else {
        Decision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OwnershipMap, UserId};

    const OWNED: IndicatorId = IndicatorId::new(1);
    const OTHER: IndicatorId = IndicatorId::new(2);

    fn owners(contributor: UserId) -> OwnershipMap {
        [(OWNED, contributor), (OTHER, UserId::new(99))]
            .into_iter()
            .collect()
    }

    fn report(indicator_id: IndicatorId, draft: bool) -> Target {
        Target::Report(ReportRef {
            indicator_id,
            draft,
        })
    }

    fn all_targets() -> Vec<Target> {
        vec![
            Target::Indicator(OWNED),
            Target::Indicator(OTHER),
            Target::Indicator(IndicatorId::new(404)),
            report(OWNED, true),
            report(OWNED, false),
            report(OTHER, true),
            report(OTHER, false),
        ]
    }

    #[test]
    fn manager_is_allowed_everything() {
        let manager = Actor::user(UserId::new(5), Role::Manager);
        let map = owners(UserId::new(7));
        for action in Action::ALL {
            for target in all_targets() {
                assert_eq!(authorize(&manager, action, &target, &map), Decision::Allow);
            }
        }
    }

    #[test]
    fn anonymous_reads_only_published_reports() {
        let map = owners(UserId::new(7));
        assert_eq!(
            authorize(&Actor::Anonymous, Action::Read, &report(OWNED, false), &map),
            Decision::Allow
        );
        assert_eq!(
            authorize(&Actor::Anonymous, Action::Read, &report(OWNED, true), &map),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn anonymous_mutations_are_unauthenticated_regardless_of_draft() {
        let map = owners(UserId::new(7));
        for action in [Action::Create, Action::Update, Action::Delete] {
            for target in all_targets() {
                assert_eq!(
                    authorize(&Actor::Anonymous, action, &target, &map),
                    Decision::Deny(DenyReason::Unauthenticated)
                );
            }
        }
    }

    #[test]
    fn guest_reads_published_and_is_forbidden_otherwise() {
        let guest = Actor::user(UserId::new(3), Role::Guest);
        let map = owners(UserId::new(3));
        assert_eq!(
            authorize(&guest, Action::Read, &report(OTHER, false), &map),
            Decision::Allow
        );
        assert_eq!(
            authorize(&guest, Action::Read, &report(OTHER, true), &map),
            Decision::Deny(DenyReason::Forbidden)
        );
        for action in [Action::Create, Action::Update, Action::Delete] {
            // Owning the indicator does not help a guest.
            assert_eq!(
                authorize(&guest, action, &report(OWNED, false), &map),
                Decision::Deny(DenyReason::Forbidden)
            );
        }
    }

    #[test]
    fn contributor_reads_drafts() {
        let contributor = Actor::user(UserId::new(7), Role::Contributor);
        let map = owners(UserId::new(7));
        assert_eq!(
            authorize(&contributor, Action::Read, &report(OTHER, true), &map),
            Decision::Allow
        );
    }

    #[test]
    fn contributor_writes_only_owned_indicators() {
        let contributor = Actor::user(UserId::new(7), Role::Contributor);
        let map = owners(UserId::new(7));
        assert_eq!(
            authorize(&contributor, Action::Create, &Target::Indicator(OWNED), &map),
            Decision::Allow
        );
        assert_eq!(
            authorize(&contributor, Action::Update, &report(OWNED, true), &map),
            Decision::Allow
        );
        assert_eq!(
            authorize(&contributor, Action::Create, &Target::Indicator(OTHER), &map),
            Decision::Deny(DenyReason::Forbidden)
        );
        assert_eq!(
            authorize(&contributor, Action::Update, &report(OTHER, false), &map),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[test]
    fn contributor_is_forbidden_on_unknown_indicator() {
        let contributor = Actor::user(UserId::new(7), Role::Contributor);
        let map = OwnershipMap::new();
        assert_eq!(
            authorize(
                &contributor,
                Action::Create,
                &Target::Indicator(IndicatorId::new(404)),
                &map
            ),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[test]
    fn contributor_never_deletes() {
        let contributor = Actor::user(UserId::new(7), Role::Contributor);
        let map = owners(UserId::new(7));
        for target in all_targets() {
            assert_eq!(
                authorize(&contributor, Action::Delete, &target, &map),
                Decision::Deny(DenyReason::Forbidden)
            );
        }
    }

    #[test]
    fn authorize_is_deterministic() {
        let map = owners(UserId::new(7));
        let actors = [
            Actor::Anonymous,
            Actor::user(UserId::new(3), Role::Guest),
            Actor::user(UserId::new(7), Role::Contributor),
            Actor::user(UserId::new(5), Role::Manager),
        ];
        for actor in actors {
            for action in Action::ALL {
                for target in all_targets() {
                    let first = authorize(&actor, action, &target, &map);
                    let second = authorize(&actor, action, &target, &map);
                    assert_eq!(first, second);
                }
            }
        }
    }

    #[test]
    fn decide_by_role_agrees_with_authorize() {
        let map = owners(UserId::new(7));
        let actors = [
            Actor::Anonymous,
            Actor::user(UserId::new(3), Role::Guest),
            Actor::user(UserId::new(7), Role::Contributor),
            Actor::user(UserId::new(5), Role::Manager),
        ];
        for actor in actors {
            for action in Action::ALL {
                let Some(early) = decide_by_role(&actor, action) else {
                    continue;
                };
                for target in all_targets() {
                    assert_eq!(authorize(&actor, action, &target, &map), early);
                }
            }
        }
    }

    #[test]
    fn decide_by_role_defers_target_dependent_rows() {
        let guest = Actor::user(UserId::new(3), Role::Guest);
        let contributor = Actor::user(UserId::new(7), Role::Contributor);
        assert_eq!(decide_by_role(&Actor::Anonymous, Action::Read), None);
        assert_eq!(decide_by_role(&guest, Action::Read), None);
        assert_eq!(decide_by_role(&contributor, Action::Create), None);
        assert_eq!(decide_by_role(&contributor, Action::Update), None);
    }
}
