//! Class request status lifecycle: statuses, the transition table, and the
//! fields each status requires.
//!
//! This is the single authority for which status changes are legal. The
//! lifecycle manager looks every transition up here instead of comparing
//! status strings at call sites.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::permissions::Action;
use crate::types::Date;

/* --------------------------------------------------------------------------
Statuses
-------------------------------------------------------------------------- */

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRM_EDUCATOR_DATES: &str = "Confirm Educator Dates";
pub const STATUS_AWAITING_DATE: &str = "Awaiting Date";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_FINAL_CONFIRMATION: &str = "Final Confirmation";

/// Legacy spelling used by client-submitted requests.
const LEGACY_PENDING_REVIEW: &str = "Pending Review";
/// Legacy spelling written by the old educator-assignment screen.
const LEGACY_OFFERED: &str = "offered";

/// Status of a class request that has not yet been promoted or removed.
///
/// Promotion and removal delete the row, so they have no stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassRequestStatus {
    /// Freshly submitted, not yet reviewed.
    Pending,
    /// Staff matched an educator; waiting on the educator's availability.
    ConfirmEducatorDates,
    /// An offer/contact notice went out to the educator.
    AwaitingDate,
    /// The educator accepted the offer but has not supplied a date.
    Accepted,
    /// The educator supplied a concrete date; staff must finalize.
    FinalConfirmation,
}

impl ClassRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::ConfirmEducatorDates => STATUS_CONFIRM_EDUCATOR_DATES,
            Self::AwaitingDate => STATUS_AWAITING_DATE,
            Self::Accepted => STATUS_ACCEPTED,
            Self::FinalConfirmation => STATUS_FINAL_CONFIRMATION,
        }
    }

    /// Parse a stored status, accepting legacy spellings.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_PENDING | LEGACY_PENDING_REVIEW => Ok(Self::Pending),
            STATUS_CONFIRM_EDUCATOR_DATES | LEGACY_OFFERED => Ok(Self::ConfirmEducatorDates),
            STATUS_AWAITING_DATE => Ok(Self::AwaitingDate),
            STATUS_ACCEPTED => Ok(Self::Accepted),
            STATUS_FINAL_CONFIRMATION => Ok(Self::FinalConfirmation),
            other => Err(CoreError::Validation(format!(
                "Unknown class request status '{other}'"
            ))),
        }
    }

    /// Fields that must be populated while a request sits in this status.
    pub fn required_fields(&self) -> &'static [RequestField] {
        match self {
            Self::Pending => &[RequestField::ClassTypes, RequestField::PreferredWindow],
            Self::ConfirmEducatorDates => &[RequestField::Educator],
            Self::AwaitingDate => &[RequestField::Educator, RequestField::OfferSentAt],
            Self::Accepted => &[RequestField::Educator, RequestField::EducatorResponseAt],
            Self::FinalConfirmation => &[
                RequestField::Educator,
                RequestField::ClassDate,
                RequestField::EducatorResponseAt,
            ],
        }
    }
}

impl std::fmt::Display for ClassRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/* --------------------------------------------------------------------------
Required fields
-------------------------------------------------------------------------- */

/// A class request field that a status or an operation may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    ClassTypes,
    PreferredWindow,
    Educator,
    Site,
    ClassDate,
    OfferSentAt,
    EducatorResponseAt,
}

impl RequestField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClassTypes => "class_types",
            Self::PreferredWindow => "preferred_date_start/preferred_date_end",
            Self::Educator => "educator_id",
            Self::Site => "site_id",
            Self::ClassDate => "class_date",
            Self::OfferSentAt => "offer_sent_at",
            Self::EducatorResponseAt => "educator_response_at",
        }
    }
}

/// Which fields of a class request are populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldPresence {
    pub class_types: bool,
    pub preferred_window: bool,
    pub educator: bool,
    pub site: bool,
    pub class_date: bool,
    pub offer_sent_at: bool,
    pub educator_response_at: bool,
}

impl FieldPresence {
    pub fn has(&self, field: RequestField) -> bool {
        match field {
            RequestField::ClassTypes => self.class_types,
            RequestField::PreferredWindow => self.preferred_window,
            RequestField::Educator => self.educator,
            RequestField::Site => self.site,
            RequestField::ClassDate => self.class_date,
            RequestField::OfferSentAt => self.offer_sent_at,
            RequestField::EducatorResponseAt => self.educator_response_at,
        }
    }
}

/// Fields promotion requires beyond the Final Confirmation status itself.
pub const PROMOTION_REQUIRED_FIELDS: &[RequestField] =
    &[RequestField::ClassDate, RequestField::Site];

/// Return the names of every field in `required` that `presence` lacks.
pub fn missing_fields(required: &[RequestField], presence: &FieldPresence) -> Vec<&'static str> {
    required
        .iter()
        .filter(|f| !presence.has(**f))
        .map(RequestField::name)
        .collect()
}

/// Fail with a validation error naming every missing field.
pub fn ensure_fields(
    operation: &str,
    required: &[RequestField],
    presence: &FieldPresence,
) -> Result<(), CoreError> {
    let missing = missing_fields(required, presence);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::missing_fields(operation, &missing))
    }
}

/// Verify a request that is about to be promoted.
pub fn ensure_promotable(presence: &FieldPresence) -> Result<(), CoreError> {
    ensure_fields(Action::Promote.as_str(), PROMOTION_REQUIRED_FIELDS, presence)
}

/* --------------------------------------------------------------------------
Transition table
-------------------------------------------------------------------------- */

/// Where a transition leaves the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionTarget {
    /// The request stays stored with this status.
    Status(ClassRequestStatus),
    /// The request row is consumed by promotion into a confirmed class.
    Promoted,
    /// The request row is deleted.
    Removed,
    /// Field edits that keep the current status.
    Unchanged,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: ClassRequestStatus,
    pub action: Action,
    pub to: TransitionTarget,
}

use ClassRequestStatus as S;
use TransitionTarget as T;

/// Every legal status change. Remove and edit are allowed from any status
/// and are handled by [`next_target`] directly.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        from: S::Pending,
        action: Action::AssignEducator,
        to: T::Status(S::ConfirmEducatorDates),
    },
    Transition {
        from: S::ConfirmEducatorDates,
        action: Action::ContactEducator,
        to: T::Status(S::AwaitingDate),
    },
    Transition {
        from: S::AwaitingDate,
        action: Action::RecordClassDate,
        to: T::Status(S::FinalConfirmation),
    },
    Transition {
        from: S::Accepted,
        action: Action::RecordClassDate,
        to: T::Status(S::FinalConfirmation),
    },
    Transition {
        from: S::ConfirmEducatorDates,
        action: Action::AcceptOffer,
        to: T::Status(S::Accepted),
    },
    Transition {
        from: S::AwaitingDate,
        action: Action::AcceptOffer,
        to: T::Status(S::Accepted),
    },
    Transition {
        from: S::ConfirmEducatorDates,
        action: Action::DeclineOffer,
        to: T::Status(S::Pending),
    },
    Transition {
        from: S::AwaitingDate,
        action: Action::DeclineOffer,
        to: T::Status(S::Pending),
    },
    Transition {
        from: S::FinalConfirmation,
        action: Action::Promote,
        to: T::Promoted,
    },
];

/// Look up where `action` takes a request currently in `from`.
///
/// Returns a validation error when the table has no such transition.
pub fn next_target(from: ClassRequestStatus, action: Action) -> Result<TransitionTarget, CoreError> {
    match action {
        Action::RemoveRequest => return Ok(T::Removed),
        Action::EditRequest => return Ok(T::Unchanged),
        _ => {}
    }

    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.action == action)
        .map(|t| t.to)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Cannot {action} a class request in status '{from}'"
            ))
        })
}

/// Like [`next_target`] but for transitions that must land on a stored status.
pub fn next_status(
    from: ClassRequestStatus,
    action: Action,
) -> Result<ClassRequestStatus, CoreError> {
    match next_target(from, action)? {
        T::Status(status) => Ok(status),
        T::Unchanged => Ok(from),
        other => Err(CoreError::Internal(format!(
            "Transition {action} from '{from}' ends in {other:?}, not a stored status"
        ))),
    }
}

/* --------------------------------------------------------------------------
Creation validation
-------------------------------------------------------------------------- */

/// Validate the preferred date window supplied with a new or edited request.
pub fn validate_preferred_window(start: Date, end: Date) -> Result<(), CoreError> {
    if end < start {
        return Err(CoreError::Validation(format!(
            "preferred_date_end ({end}) must not be before preferred_date_start ({start})"
        )));
    }
    Ok(())
}
