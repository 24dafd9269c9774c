//! In-process [`ClassStore`] with failure injection.
//!
//! Applies the same guard rules as the Postgres repositories. Each
//! [`FailPoint`] armed with [`MemoryStore::fail_on`] makes the matching
//! operation return [`StoreError::Unavailable`] until cleared.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use lifesafe_core::billing::is_pending_bill;
use lifesafe_core::locking::LockClaim;
use lifesafe_core::types::{Date, DbId, Timestamp, UserId};
use lifesafe_db::models::class_request::{ClassRequest, NewClassRequest};
use lifesafe_db::models::company::Company;
use lifesafe_db::models::confirmed_class::{ConfirmedClass, NewConfirmedClass};
use lifesafe_db::models::educator::Educator;
use lifesafe_db::models::profile::Profile;
use lifesafe_db::models::site::Site;
use tokio::sync::Mutex;

use super::{guard_rejection, ClassStore, Guarded};
use crate::error::StoreError;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertRequest,
    UpdateRequest,
    DeleteRequest,
    InsertConfirmed,
    UpdateConfirmed,
    DeleteConfirmed,
    Read,
}

#[derive(Default)]
struct Tables {
    requests: BTreeMap<DbId, ClassRequest>,
    confirmed: BTreeMap<DbId, ConfirmedClass>,
    educators: HashMap<DbId, Educator>,
    sites: HashMap<DbId, Site>,
    companies: HashMap<DbId, Company>,
    profiles: HashMap<UserId, Profile>,
    next_request_id: DbId,
    next_class_id: DbId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failures: Mutex<HashSet<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_on(&self, point: FailPoint) {
        self.failures.lock().await.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.failures.lock().await.clear();
    }

    async fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.failures.lock().await.contains(&point) {
            return Err(StoreError::Unavailable(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    /* ---- seeding and inspection ---- */

    pub async fn add_educator(&self, educator: Educator) {
        self.tables.lock().await.educators.insert(educator.id, educator);
    }

    pub async fn add_site(&self, site: Site) {
        self.tables.lock().await.sites.insert(site.id, site);
    }

    pub async fn add_company(&self, company: Company) {
        self.tables.lock().await.companies.insert(company.id, company);
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.tables.lock().await.profiles.insert(profile.id, profile);
    }

    /// Store a request row as-is, bypassing guards.
    pub async fn put_request(&self, row: ClassRequest) {
        let mut tables = self.tables.lock().await;
        tables.next_request_id = tables.next_request_id.max(row.id);
        tables.requests.insert(row.id, row);
    }

    /// Store a confirmed class row as-is, bypassing guards.
    pub async fn put_confirmed(&self, row: ConfirmedClass) {
        let mut tables = self.tables.lock().await;
        tables.next_class_id = tables.next_class_id.max(row.id);
        tables.confirmed.insert(row.id, row);
    }

    pub async fn requests(&self) -> Vec<ClassRequest> {
        self.tables.lock().await.requests.values().cloned().collect()
    }

    pub async fn confirmed_classes(&self) -> Vec<ConfirmedClass> {
        self.tables.lock().await.confirmed.values().cloned().collect()
    }
}

impl ClassStore for MemoryStore {
    async fn find_request(&self, id: DbId) -> Result<Option<ClassRequest>, StoreError> {
        self.check(FailPoint::Read).await?;
        Ok(self.tables.lock().await.requests.get(&id).cloned())
    }

    async fn insert_request(&self, input: &NewClassRequest) -> Result<ClassRequest, StoreError> {
        self.check(FailPoint::InsertRequest).await?;
        let mut tables = self.tables.lock().await;
        tables.next_request_id += 1;
        let now = Utc::now();
        let row = ClassRequest {
            id: tables.next_request_id,
            company_id: input.company_id,
            site_id: input.site_id,
            class_types: input.class_types.clone(),
            preferred_date_start: input.preferred_date_start,
            preferred_date_end: input.preferred_date_end,
            status: input.status.clone(),
            educator_id: None,
            coordinator_id: input.coordinator_id,
            assignee_id: None,
            class_date: None,
            offer_sent_at: None,
            educator_response_at: None,
            notes: input.notes.clone(),
            locked_by_user_id: None,
            locked_at: None,
            version: 1,
            created_at: now,
            last_modified: now,
        };
        tables.requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_request(
        &self,
        row: &ClassRequest,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> Result<Guarded<ClassRequest>, StoreError> {
        self.check(FailPoint::UpdateRequest).await?;
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.requests.get_mut(&row.id) else {
            return Ok(Guarded::Missing);
        };
        if let Some(rejected) = guard_rejection(
            stored.version,
            stored.locked_by_user_id,
            stored.locked_at,
            expected_version,
            claim.actor,
            now,
        ) {
            return Ok(rejected);
        }

        let (locked_by, locked_at) = claim.lock_fields(now);
        let mut next = row.clone();
        next.locked_by_user_id = locked_by;
        next.locked_at = locked_at;
        next.version = stored.version + 1;
        next.created_at = stored.created_at;
        next.last_modified = now;
        *stored = next.clone();
        Ok(Guarded::Applied(next))
    }

    async fn delete_request(
        &self,
        id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Guarded<()>, StoreError> {
        self.check(FailPoint::DeleteRequest).await?;
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.requests.get(&id) else {
            return Ok(Guarded::Missing);
        };
        if let Some(rejected) = guard_rejection(
            stored.version,
            stored.locked_by_user_id,
            stored.locked_at,
            expected_version,
            actor,
            now,
        ) {
            return Ok(rejected);
        }
        tables.requests.remove(&id);
        Ok(Guarded::Applied(()))
    }

    async fn purge_request(&self, id: DbId) -> Result<bool, StoreError> {
        self.check(FailPoint::DeleteRequest).await?;
        Ok(self.tables.lock().await.requests.remove(&id).is_some())
    }

    async fn release_request_lock(
        &self,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.requests.get_mut(&id) {
            Some(row)
                if row.locked_by_user_id.is_some()
                    && (force || row.locked_by_user_id == Some(user_id)) =>
            {
                row.locked_by_user_id = None;
                row.locked_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_queue(&self, assignee_id: UserId) -> Result<Vec<ClassRequest>, StoreError> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<ClassRequest> = tables
            .requests
            .values()
            .filter(|r| r.assignee_id == Some(assignee_id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.class_date.is_none(), r.class_date, r.created_at));
        Ok(rows)
    }

    async fn list_for_educator(&self, educator_id: DbId) -> Result<Vec<ClassRequest>, StoreError> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.educator_id == Some(educator_id))
            .cloned()
            .collect())
    }

    async fn find_confirmed(&self, id: DbId) -> Result<Option<ConfirmedClass>, StoreError> {
        self.check(FailPoint::Read).await?;
        Ok(self.tables.lock().await.confirmed.get(&id).cloned())
    }

    async fn insert_confirmed(
        &self,
        input: &NewConfirmedClass,
    ) -> Result<ConfirmedClass, StoreError> {
        self.check(FailPoint::InsertConfirmed).await?;
        let mut tables = self.tables.lock().await;
        if let Some(source) = input.source_request_id {
            if tables
                .confirmed
                .values()
                .any(|c| c.source_request_id == Some(source))
            {
                return Err(StoreError::Unavailable(format!(
                    "duplicate confirmed class for request {source}"
                )));
            }
        }
        tables.next_class_id += 1;
        let now = Utc::now();
        let row = ConfirmedClass {
            id: tables.next_class_id,
            site_id: input.site_id,
            educator_id: input.educator_id,
            subjects: input.subjects.clone(),
            date_of_class: input.date_of_class,
            coordinator_id: input.coordinator_id,
            notes: input.notes.clone(),
            billable: None,
            hours: None,
            expenses: None,
            student_count: None,
            bill_date: None,
            review: None,
            source_request_id: input.source_request_id,
            locked_by_user_id: None,
            locked_at: None,
            version: 1,
            created_at: now,
            last_modified: now,
        };
        tables.confirmed.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_confirmed(&self, id: DbId) -> Result<bool, StoreError> {
        self.check(FailPoint::DeleteConfirmed).await?;
        Ok(self.tables.lock().await.confirmed.remove(&id).is_some())
    }

    async fn update_confirmed(
        &self,
        row: &ConfirmedClass,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> Result<Guarded<ConfirmedClass>, StoreError> {
        self.check(FailPoint::UpdateConfirmed).await?;
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.confirmed.get_mut(&row.id) else {
            return Ok(Guarded::Missing);
        };
        if let Some(rejected) = guard_rejection(
            stored.version,
            stored.locked_by_user_id,
            stored.locked_at,
            expected_version,
            claim.actor,
            now,
        ) {
            return Ok(rejected);
        }

        let (locked_by, locked_at) = claim.lock_fields(now);
        // Only the columns the repository writes may change.
        let mut next = stored.clone();
        next.educator_id = row.educator_id;
        next.notes = row.notes.clone();
        next.billable = row.billable;
        next.hours = row.hours;
        next.expenses = row.expenses;
        next.student_count = row.student_count;
        next.bill_date = row.bill_date;
        next.review = row.review.clone();
        next.locked_by_user_id = locked_by;
        next.locked_at = locked_at;
        next.version = stored.version + 1;
        next.last_modified = now;
        *stored = next.clone();
        Ok(Guarded::Applied(next))
    }

    async fn release_confirmed_lock(
        &self,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.confirmed.get_mut(&id) {
            Some(row)
                if row.locked_by_user_id.is_some()
                    && (force || row.locked_by_user_id == Some(user_id)) =>
            {
                row.locked_by_user_id = None;
                row.locked_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_pending_bills(&self, today: Date) -> Result<Vec<ConfirmedClass>, StoreError> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<ConfirmedClass> = tables
            .confirmed
            .values()
            .filter(|c| is_pending_bill(c.date_of_class, c.bill_date, today))
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.date_of_class, c.id));
        Ok(rows)
    }

    async fn list_classes_between(
        &self,
        from: Date,
        to: Date,
    ) -> Result<Vec<ConfirmedClass>, StoreError> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<ConfirmedClass> = tables
            .confirmed
            .values()
            .filter(|c| c.date_of_class >= from && c.date_of_class <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.date_of_class, c.id));
        Ok(rows)
    }

    async fn list_promotion_leftovers(&self) -> Result<Vec<ConfirmedClass>, StoreError> {
        self.check(FailPoint::Read).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .confirmed
            .values()
            .filter(|c| {
                c.source_request_id
                    .is_some_and(|id| tables.requests.contains_key(&id))
            })
            .cloned()
            .collect())
    }

    async fn find_educator(&self, id: DbId) -> Result<Option<Educator>, StoreError> {
        self.check(FailPoint::Read).await?;
        Ok(self.tables.lock().await.educators.get(&id).cloned())
    }

    async fn find_site(&self, id: DbId) -> Result<Option<Site>, StoreError> {
        self.check(FailPoint::Read).await?;
        Ok(self.tables.lock().await.sites.get(&id).cloned())
    }

    async fn find_company(&self, id: DbId) -> Result<Option<Company>, StoreError> {
        self.check(FailPoint::Read).await?;
        Ok(self.tables.lock().await.companies.get(&id).cloned())
    }

    async fn find_profile(&self, id: UserId) -> Result<Option<Profile>, StoreError> {
        self.check(FailPoint::Read).await?;
        Ok(self.tables.lock().await.profiles.get(&id).cloned())
    }
}
