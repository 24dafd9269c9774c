//! Billing rules for confirmed classes.

use crate::error::CoreError;
use crate::types::{Date, Timestamp};

/// Maximum length of a client's post-class review.
pub const MAX_REVIEW_LENGTH: usize = 4_000;

/// A class is pending bill once its date has passed and no bill date is set.
pub fn is_pending_bill(date_of_class: Date, bill_date: Option<Timestamp>, today: Date) -> bool {
    bill_date.is_none() && date_of_class < today
}

/// Billed classes are closed for billing edits and cannot be billed again.
pub fn ensure_not_billed(bill_date: Option<Timestamp>) -> Result<(), CoreError> {
    match bill_date {
        Some(billed) => Err(CoreError::Conflict(format!(
            "Class was already billed on {}",
            billed.format("%Y-%m-%d")
        ))),
        None => Ok(()),
    }
}

/// A class becomes billable the day after it is held, the same day it
/// starts showing in [`is_pending_bill`].
pub fn ensure_class_held(date_of_class: Date, today: Date) -> Result<(), CoreError> {
    if date_of_class >= today {
        return Err(CoreError::Validation(format!(
            "Class on {date_of_class} is not billable before {}",
            date_of_class + chrono::Duration::days(1)
        )));
    }
    Ok(())
}

/// Validate editable billing fields. Every supplied amount must be non-negative.
pub fn validate_billing_fields(
    student_count: Option<i32>,
    billable: Option<f64>,
    hours: Option<f64>,
    expenses: Option<f64>,
) -> Result<(), CoreError> {
    if let Some(count) = student_count {
        if count < 0 {
            return Err(CoreError::Validation(format!(
                "student_count must be non-negative, got {count}"
            )));
        }
    }
    for (name, value) in [("billable", billable), ("hours", hours), ("expenses", expenses)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(CoreError::Validation(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
    }
    Ok(())
}

/// The roster reminder only makes sense while the student count is unknown.
pub fn ensure_roster_missing(student_count: Option<i32>) -> Result<(), CoreError> {
    match student_count {
        Some(count) => Err(CoreError::Validation(format!(
            "Roster already received ({count} students)"
        ))),
        None => Ok(()),
    }
}

/// Checks the review as it will be stored, with surrounding whitespace trimmed.
pub fn validate_review(review: &str) -> Result<(), CoreError> {
    let review = review.trim();
    if review.is_empty() {
        return Err(CoreError::Validation("Review must not be empty".to_string()));
    }
    if review.chars().count() > MAX_REVIEW_LENGTH {
        return Err(CoreError::Validation(format!(
            "Review exceeds maximum length of {MAX_REVIEW_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn past_unbilled_class_is_pending_bill() {
        let today = date(2025, 6, 10);
        assert!(is_pending_bill(date(2025, 6, 9), None, today));
        assert!(!is_pending_bill(date(2025, 6, 10), None, today));
        assert!(!is_pending_bill(date(2025, 6, 1), Some(Utc::now()), today));
    }

    #[test]
    fn billed_class_is_closed() {
        assert!(ensure_not_billed(None).is_ok());
        assert_matches!(ensure_not_billed(Some(Utc::now())), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn class_is_billable_once_pending() {
        let today = date(2025, 6, 10);
        assert!(ensure_class_held(date(2025, 6, 9), today).is_ok());
        assert_matches!(ensure_class_held(today, today), Err(CoreError::Validation(_)));
        assert_matches!(
            ensure_class_held(date(2025, 6, 11), today),
            Err(CoreError::Validation(_))
        );
        for day in [date(2025, 6, 9), today, date(2025, 6, 11)] {
            assert_eq!(
                ensure_class_held(day, today).is_ok(),
                is_pending_bill(day, None, today)
            );
        }
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_billing_fields(Some(12), Some(300.0), Some(4.0), Some(0.0)).is_ok());
        assert!(validate_billing_fields(Some(-1), None, None, None).is_err());
        assert!(validate_billing_fields(None, Some(-0.01), None, None).is_err());
        assert!(validate_billing_fields(None, None, None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn roster_reminder_needs_missing_count() {
        assert!(ensure_roster_missing(None).is_ok());
        assert!(ensure_roster_missing(Some(8)).is_err());
    }

    #[test]
    fn review_length_is_bounded() {
        assert!(validate_review("Great class").is_ok());
        assert!(validate_review("   ").is_err());
        assert!(validate_review(&"x".repeat(MAX_REVIEW_LENGTH + 1)).is_err());
    }

    #[test]
    fn review_length_ignores_surrounding_whitespace() {
        let padded = format!("  {}\n\n", "x".repeat(MAX_REVIEW_LENGTH));
        assert!(validate_review(&padded).is_ok());
    }
}
