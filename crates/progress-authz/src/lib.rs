//! Authorization primitives for progress reports.
//!
//! # Purpose
//! Centralizes the role model, the progress-report decision table, the
//! indicator ownership seam, and verification of bearer tokens issued by the
//! external identity provider.
//!
//! # How it fits
//! The API service resolves an [`Actor`] from the request, looks up the
//! indicator owners it needs, and asks [`authorize`] for a [`Decision`] before
//! touching the entity store.
//!
//! # Key invariants
//! - [`authorize`] is a pure function of its inputs; calling it twice with the
//!   same inputs yields the same decision.
//! - Denial is a normal outcome carried by [`Decision::Deny`], never an error.
//! - Bearer tokens are EdDSA/Ed25519 only; RSA/HS algorithms are rejected.
//!
//! # Examples
//! ```rust
//! use progress_authz::{
//!     Action, Actor, Decision, DenyReason, IndicatorId, OwnershipMap, Role, Target, UserId,
//!     authorize,
//! };
//!
//! let owners: OwnershipMap = [(IndicatorId::new(1), UserId::new(7))].into_iter().collect();
//! let contributor = Actor::user(UserId::new(7), Role::Contributor);
//! let target = Target::Indicator(IndicatorId::new(1));
//! assert_eq!(
//!     authorize(&contributor, Action::Create, &target, &owners),
//!     Decision::Allow
//! );
//! assert_eq!(
//!     authorize(&Actor::Anonymous, Action::Create, &target, &owners),
//!     Decision::Deny(DenyReason::Unauthenticated)
//! );
//! ```

mod action;
mod decision;
mod errors;
mod ownership;
mod policy;
mod role;
mod token;
mod types;

pub use action::Action;
pub use decision::{Decision, DenyReason};
pub use errors::{AuthzError, AuthzResult};
pub use ownership::{IndicatorOwnership, OwnershipMap};
pub use policy::{ReportRef, Target, authorize, decide_by_role};
pub use role::{Actor, Role};
pub use token::{ActorClaims, ActorTokenVerifier, VerificationKey};
pub use types::{DueDateId, IndicatorId, ProgressReportId, UserId};
