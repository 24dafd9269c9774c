//! Upcoming-class reminder window.

use crate::types::Date;

/// How many days ahead the class reminder list looks.
pub const REMINDER_LOOKAHEAD_DAYS: i64 = 5;

/// Inclusive date range of classes due a reminder, starting today.
pub fn reminder_window(today: Date) -> (Date, Date) {
    (today, today + chrono::Duration::days(REMINDER_LOOKAHEAD_DAYS))
}
