/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Identity-provider user ids (profiles, coordinators, lock holders).
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (class dates, preferred windows) carry no time zone.
pub type Date = chrono::NaiveDate;
