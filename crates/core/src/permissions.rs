//! Capability table (role → permitted actions) and ownership checks.
//!
//! Every lifecycle, billing and reminder operation consults [`authorize`]
//! before touching the store. Hiding controls in a client is never enough.

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, UserId};

/// Every operation that is subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    CreateRequest,
    EditRequest,
    AssignEducator,
    ContactEducator,
    RecordClassDate,
    Promote,
    AcceptOffer,
    DeclineOffer,
    RemoveRequest,
    ViewRequest,
    ViewQueue,
    EstimateCost,
    ReleaseLock,
    UpdateBilling,
    MarkBilled,
    SendRosterReminder,
    SendClassReminder,
    SubmitReview,
    Reconcile,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateRequest => "create class request",
            Self::EditRequest => "edit class request",
            Self::AssignEducator => "assign educator",
            Self::ContactEducator => "contact educator",
            Self::RecordClassDate => "record class date",
            Self::Promote => "confirm class",
            Self::AcceptOffer => "accept offer",
            Self::DeclineOffer => "decline offer",
            Self::RemoveRequest => "remove class request",
            Self::ViewRequest => "view class request",
            Self::ViewQueue => "view work queue",
            Self::EstimateCost => "estimate cost",
            Self::ReleaseLock => "release lock",
            Self::UpdateBilling => "update billing",
            Self::MarkBilled => "mark billed",
            Self::SendRosterReminder => "send roster reminder",
            Self::SendClassReminder => "send class reminder",
            Self::SubmitReview => "submit review",
            Self::Reconcile => "reconcile promotions",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/* --------------------------------------------------------------------------
Capability table
-------------------------------------------------------------------------- */

const STAFF_ACTIONS: &[Action] = &[
    Action::CreateRequest,
    Action::EditRequest,
    Action::AssignEducator,
    Action::ContactEducator,
    Action::RecordClassDate,
    Action::Promote,
    Action::AcceptOffer,
    Action::DeclineOffer,
    Action::RemoveRequest,
    Action::ViewRequest,
    Action::ViewQueue,
    Action::EstimateCost,
    Action::ReleaseLock,
    Action::UpdateBilling,
    Action::MarkBilled,
    Action::SendRosterReminder,
    Action::SendClassReminder,
    Action::SubmitReview,
    Action::Reconcile,
];

const EDUCATOR_ACTIONS: &[Action] = &[
    Action::AcceptOffer,
    Action::DeclineOffer,
    Action::ViewRequest,
    Action::ViewQueue,
    Action::ReleaseLock,
];

const CLIENT_ACTIONS: &[Action] = &[
    Action::CreateRequest,
    Action::RemoveRequest,
    Action::ViewRequest,
    Action::ViewQueue,
    Action::EstimateCost,
    Action::ReleaseLock,
    Action::SubmitReview,
];

/// Actions a role may attempt. Ownership rules are applied on top.
pub fn permitted_actions(role: Role) -> &'static [Action] {
    match role {
        Role::Admin | Role::Staff => STAFF_ACTIONS,
        Role::Educator => EDUCATOR_ACTIONS,
        Role::ClientAdmin | Role::ClientSite => CLIENT_ACTIONS,
        Role::User => &[],
    }
}

pub fn role_permits(role: Role, action: Action) -> bool {
    permitted_actions(role).contains(&action)
}

/* --------------------------------------------------------------------------
Ownership
-------------------------------------------------------------------------- */

/// The ownership facts of the record an action targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ownership {
    /// User that owns the record (the request's coordinator).
    pub coordinator_id: Option<UserId>,
    /// Educator currently assigned to the record.
    pub educator_id: Option<DbId>,
}

/// Check role capability, then ownership.
///
/// - Removal is limited to the owning coordinator, whatever the role.
/// - Offer responses are limited to the assigned educator; staff may override.
/// - Viewing a single request is open to staff, its owner and its educator.
/// - Clients may only review classes they coordinated.
pub fn authorize(actor: &Actor, action: Action, ownership: &Ownership) -> Result<(), CoreError> {
    if !role_permits(actor.role, action) {
        return Err(CoreError::Forbidden(format!(
            "Role '{}' may not {action}",
            actor.role
        )));
    }

    let owns = ownership.coordinator_id == Some(actor.user_id);
    let is_assigned_educator =
        actor.educator_id.is_some() && actor.educator_id == ownership.educator_id;

    match action {
        Action::RemoveRequest if !owns => Err(CoreError::Forbidden(
            "Only the coordinator who owns this request may remove it".to_string(),
        )),
        Action::AcceptOffer | Action::DeclineOffer
            if !actor.role.is_staff() && !is_assigned_educator =>
        {
            Err(CoreError::Forbidden(
                "Only the assigned educator may respond to this offer".to_string(),
            ))
        }
        Action::ViewRequest if !actor.role.is_staff() && !owns && !is_assigned_educator => {
            Err(CoreError::Forbidden(
                "Not permitted to view this class request".to_string(),
            ))
        }
        Action::SubmitReview if actor.role.is_client() && !owns => Err(CoreError::Forbidden(
            "Only the client who requested this class may review it".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Role-only check for actions that do not target a single owned record.
pub fn authorize_role(actor: &Actor, action: Action) -> Result<(), CoreError> {
    authorize(actor, action, &Ownership::default())
}
