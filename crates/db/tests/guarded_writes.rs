//! Integration tests for the guarded write SQL.
//!
//! Exercises the class request and confirmed class repositories against a
//! real database:
//! - Version and edit-lock guards on update and delete
//! - The 30-minute stale-lock cutoff
//! - Transactional promotion and its rollback
//! - Promotion leftovers, pending bills and schema constraints

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use lifesafe_core::locking::LockClaim;
use lifesafe_core::types::{DbId, UserId};
use lifesafe_db::models::class_request::{ClassRequest, NewClassRequest};
use lifesafe_db::models::confirmed_class::NewConfirmedClass;
use lifesafe_db::repositories::{ClassRequestRepo, ConfirmedClassRepo};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 15, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

/// Insert a company and one of its sites, returning the site id.
async fn seed_site(pool: &PgPool) -> DbId {
    let company_id: DbId =
        sqlx::query_scalar("INSERT INTO companies (name) VALUES ('Acme Logistics') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    sqlx::query_scalar(
        "INSERT INTO sites (company_id, name, email) \
         VALUES ($1, 'Acme Warehouse', 'warehouse@acme.example') RETURNING id",
    )
    .bind(company_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn new_request(pool: &PgPool, site_id: DbId, coordinator: UserId) -> ClassRequest {
    ClassRequestRepo::create(
        pool,
        &NewClassRequest {
            company_id: None,
            site_id: Some(site_id),
            class_types: vec!["CPR".into(), "AED".into()],
            preferred_date_start: day(20),
            preferred_date_end: day(27),
            status: "pending".into(),
            coordinator_id: coordinator,
            notes: Some("Loading dock entrance".into()),
        },
    )
    .await
    .unwrap()
}

async fn lock_request(pool: &PgPool, id: DbId, holder: UserId, at: DateTime<Utc>) {
    sqlx::query("UPDATE class_requests SET locked_by_user_id = $2, locked_at = $3 WHERE id = $1")
        .bind(id)
        .bind(holder)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
}

fn promotion(site_id: DbId, request: &ClassRequest) -> NewConfirmedClass {
    NewConfirmedClass {
        site_id,
        educator_id: None,
        subjects: request.class_types.join(", "),
        date_of_class: day(24),
        coordinator_id: Some(request.coordinator_id),
        notes: request.notes.clone(),
        source_request_id: Some(request.id),
    }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: version and lock guards
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_update_bumps_version_and_holds_lock(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let editor = Uuid::new_v4();
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;
    assert_eq!(row.version, 1);

    let mut next = row.clone();
    next.notes = Some("Call ahead".into());
    let updated = ClassRequestRepo::update_guarded(&pool, &next, 1, LockClaim::hold(editor), now())
        .await
        .unwrap()
        .expect("guard should pass");
    assert_eq!(updated.version, 2);
    assert_eq!(updated.notes.as_deref(), Some("Call ahead"));
    assert_eq!(updated.locked_by_user_id, Some(editor));
    assert_eq!(updated.locked_at, Some(now()));

    let released = ClassRequestRepo::update_guarded(
        &pool,
        &updated,
        2,
        LockClaim::release(editor),
        now(),
    )
    .await
    .unwrap()
    .expect("holder may write");
    assert_eq!(released.version, 3);
    assert_eq!(released.locked_by_user_id, None);
    assert_eq!(released.locked_at, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_with_old_version_matches_nothing(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;
    let actor = Uuid::new_v4();

    ClassRequestRepo::update_guarded(&pool, &row, 1, LockClaim::release(actor), now())
        .await
        .unwrap()
        .expect("first write");

    let mut stale = row.clone();
    stale.notes = Some("lost update".into());
    let result = ClassRequestRepo::update_guarded(&pool, &stale, 1, LockClaim::release(actor), now())
        .await
        .unwrap();
    assert!(result.is_none());

    let stored = ClassRequestRepo::find_by_id(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.notes.as_deref(), Some("Loading dock entrance"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_live_foreign_lock_blocks_update_and_delete(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;
    let holder = Uuid::new_v4();
    let other = Uuid::new_v4();
    lock_request(&pool, row.id, holder, now() - Duration::minutes(29)).await;

    let result = ClassRequestRepo::update_guarded(&pool, &row, 1, LockClaim::hold(other), now())
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(!ClassRequestRepo::delete_guarded(&pool, row.id, 1, other, now())
        .await
        .unwrap());

    // The holder is not blocked by its own lock.
    assert!(ClassRequestRepo::delete_guarded(&pool, row.id, 1, holder, now())
        .await
        .unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lock_expires_at_thirty_minutes(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;
    let other = Uuid::new_v4();
    lock_request(&pool, row.id, Uuid::new_v4(), now() - Duration::minutes(30)).await;

    let updated = ClassRequestRepo::update_guarded(&pool, &row, 1, LockClaim::hold(other), now())
        .await
        .unwrap()
        .expect("a 30-minute-old lock is stale");
    assert_eq!(updated.locked_by_user_id, Some(other));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_release_lock_is_limited_to_holder(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;
    let holder = Uuid::new_v4();
    lock_request(&pool, row.id, holder, now()).await;

    assert!(!ClassRequestRepo::release_lock(&pool, row.id, Uuid::new_v4(), false)
        .await
        .unwrap());
    assert!(ClassRequestRepo::release_lock(&pool, row.id, Uuid::new_v4(), true)
        .await
        .unwrap());
    // Nothing left to release.
    assert!(!ClassRequestRepo::release_lock(&pool, row.id, holder, false)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: promotion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_promote_moves_request_into_confirmed_classes(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;

    let class = ConfirmedClassRepo::promote(
        &pool,
        &promotion(site_id, &row),
        row.id,
        row.version,
        Uuid::new_v4(),
        now(),
    )
    .await
    .unwrap()
    .expect("promotion should apply");

    assert_eq!(class.source_request_id, Some(row.id));
    assert_eq!(class.subjects, "CPR, AED");
    assert_eq!(class.version, 1);
    assert!(ClassRequestRepo::find_by_id(&pool, row.id).await.unwrap().is_none());
    assert_eq!(count(&pool, "confirmed_classes").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_promote_with_stale_version_changes_nothing(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;

    let result = ConfirmedClassRepo::promote(
        &pool,
        &promotion(site_id, &row),
        row.id,
        row.version + 1,
        Uuid::new_v4(),
        now(),
    )
    .await
    .unwrap();

    assert!(result.is_none());
    assert_eq!(
        ClassRequestRepo::find_by_id(&pool, row.id).await.unwrap(),
        Some(row)
    );
    assert_eq!(count(&pool, "confirmed_classes").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_promote_locked_request_changes_nothing(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;
    lock_request(&pool, row.id, Uuid::new_v4(), now()).await;

    let result = ConfirmedClassRepo::promote(
        &pool,
        &promotion(site_id, &row),
        row.id,
        row.version,
        Uuid::new_v4(),
        now(),
    )
    .await
    .unwrap();

    assert!(result.is_none());
    assert_eq!(count(&pool, "class_requests").await, 1);
    assert_eq!(count(&pool, "confirmed_classes").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_live_source_lists_half_finished_promotions(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let leftover = new_request(&pool, site_id, Uuid::new_v4()).await;
    let promoted = new_request(&pool, site_id, Uuid::new_v4()).await;

    let stuck = ConfirmedClassRepo::create(&pool, &promotion(site_id, &leftover))
        .await
        .unwrap();
    ConfirmedClassRepo::promote(
        &pool,
        &promotion(site_id, &promoted),
        promoted.id,
        promoted.version,
        Uuid::new_v4(),
        now(),
    )
    .await
    .unwrap()
    .unwrap();

    let found = ConfirmedClassRepo::list_with_live_source(&pool).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, stuck.id);
}

// ---------------------------------------------------------------------------
// Test: billing queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_pending_bills_excludes_today_and_billed(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let mut classes = Vec::new();
    for date_of_class in [day(9), day(10), day(2)] {
        let class = ConfirmedClassRepo::create(
            &pool,
            &NewConfirmedClass {
                site_id,
                educator_id: None,
                subjects: "CPR".into(),
                date_of_class,
                coordinator_id: None,
                notes: None,
                source_request_id: None,
            },
        )
        .await
        .unwrap();
        classes.push(class);
    }

    let mut billed = classes[2].clone();
    billed.bill_date = Some(now());
    ConfirmedClassRepo::update_guarded(&pool, &billed, 1, LockClaim::release(Uuid::new_v4()), now())
        .await
        .unwrap()
        .unwrap();

    let pending = ConfirmedClassRepo::list_pending_bills(&pool, day(10)).await.unwrap();
    let pending_ids: Vec<DbId> = pending.iter().map(|c| c.id).collect();
    assert_eq!(pending_ids, vec![classes[0].id]);
}

// ---------------------------------------------------------------------------
// Test: schema constraints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_one_confirmed_class_per_source_request(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let row = new_request(&pool, site_id, Uuid::new_v4()).await;

    ConfirmedClassRepo::create(&pool, &promotion(site_id, &row))
        .await
        .unwrap();
    let err = ConfirmedClassRepo::create(&pool, &promotion(site_id, &row))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reversed_window_violates_check(pool: PgPool) {
    let err = ClassRequestRepo::create(
        &pool,
        &NewClassRequest {
            company_id: None,
            site_id: None,
            class_types: vec!["CPR".into()],
            preferred_date_start: day(20),
            preferred_date_end: day(19),
            status: "pending".into(),
            coordinator_id: Uuid::new_v4(),
            notes: None,
        },
    )
    .await
    .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23514"));
    assert_eq!(db_err.constraint(), Some("chk_class_requests_window"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_negative_billing_violates_check(pool: PgPool) {
    let site_id = seed_site(&pool).await;
    let class = ConfirmedClassRepo::create(
        &pool,
        &NewConfirmedClass {
            site_id,
            educator_id: None,
            subjects: "CPR".into(),
            date_of_class: day(9),
            coordinator_id: None,
            notes: None,
            source_request_id: None,
        },
    )
    .await
    .unwrap();

    let mut next = class.clone();
    next.billable = Some(-1.0);
    let err = ConfirmedClassRepo::update_guarded(&pool, &next, 1, LockClaim::hold(Uuid::new_v4()), now())
        .await
        .unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.code()).as_deref(),
        Some("23514")
    );
}
