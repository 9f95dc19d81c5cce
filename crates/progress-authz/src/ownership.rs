//! Indicator ownership lookup used by the contributor rules.
//!
//! # Purpose
//! Replaces association traversal (`report.indicator.manager`) with an
//! explicit lookup the caller injects, so the policy can be exercised without
//! a database.
//!
//! # Key invariants
//! - An indicator missing from the lookup has no manager, so no contributor
//!   owns it.
use crate::{IndicatorId, UserId};
use std::collections::HashMap;

pub trait IndicatorOwnership {
    /// Return the managing user of `indicator`, if the indicator is known.
    fn manager_of(&self, indicator: IndicatorId) -> Option<UserId>;
}

impl IndicatorOwnership for HashMap<IndicatorId, UserId> {
    fn manager_of(&self, indicator: IndicatorId) -> Option<UserId> {
        self.get(&indicator).copied()
    }
}

/// Snapshot of indicator → manager assignments.
///
/// # Example
/// ```rust
/// use progress_authz::{IndicatorId, IndicatorOwnership, OwnershipMap, UserId};
///
/// let mut owners = OwnershipMap::new();
/// owners.insert(IndicatorId::new(1), UserId::new(5));
/// assert_eq!(owners.manager_of(IndicatorId::new(1)), Some(UserId::new(5)));
/// assert_eq!(owners.manager_of(IndicatorId::new(2)), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipMap {
    managers: HashMap<IndicatorId, UserId>,
}

impl OwnershipMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `manager` as the owner of `indicator`, replacing any previous owner.
    pub fn insert(&mut self, indicator: IndicatorId, manager: UserId) -> Option<UserId> {
        self.managers.insert(indicator, manager)
    }
}

impl IndicatorOwnership for OwnershipMap {
    fn manager_of(&self, indicator: IndicatorId) -> Option<UserId> {
        self.managers.get(&indicator).copied()
    }
}

impl FromIterator<(IndicatorId, UserId)> for OwnershipMap {
    fn from_iter<I: IntoIterator<Item = (IndicatorId, UserId)>>(iter: I) -> Self {
        Self {
            managers: iter.into_iter().collect(),
        }
    }
}

impl Extend<(IndicatorId, UserId)> for OwnershipMap {
    fn extend<I: IntoIterator<Item = (IndicatorId, UserId)>>(&mut self, iter: I) {
        self.managers.extend(iter);
    }
}
