//! End-to-end class request lifecycle against the in-memory store.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use lifesafe_core::class_request::{
    STATUS_ACCEPTED, STATUS_AWAITING_DATE, STATUS_CONFIRM_EDUCATOR_DATES,
    STATUS_FINAL_CONFIRMATION, STATUS_PENDING,
};
use lifesafe_core::error::CoreError;
use lifesafe_core::roles::Role;
use lifesafe_db::models::class_request::UpdateClassRequest;
use lifesafe_events::{Composer, NoticeOutcome};
use lifesafe_lifecycle::{LifecycleConfig, LifecycleError, LifecycleManager, MemoryStore};
use uuid::Uuid;

use common::*;

#[tokio::test]
async fn full_scenario_create_to_confirmed_class() {
    let mgr = manager().await;
    let (owner, staff) = (client(), staff());

    let created = mgr
        .create_request(&owner, request_input(&["CPR", "AED"]))
        .await
        .unwrap();
    assert_eq!(created.record.status, STATUS_PENDING);
    assert_eq!(created.record.coordinator_id, owner.user_id);
    assert_eq!(created.record.assignee_id, None);
    assert_eq!(created.notice, NoticeOutcome::Sent);
    let id = created.record.id;

    let assigned = mgr.assign_educator(&staff, id, EDUCATOR_ID).await.unwrap();
    assert_eq!(assigned.status, STATUS_CONFIRM_EDUCATOR_DATES);
    assert_eq!(assigned.educator_id, Some(EDUCATOR_ID));

    let contacted = mgr.contact_educator(&staff, id).await.unwrap();
    assert_eq!(contacted.record.status, STATUS_AWAITING_DATE);
    assert!(contacted.record.offer_sent_at.is_some());
    assert_eq!(contacted.notice, NoticeOutcome::Sent);

    let class_date = days_from_today(14);
    let dated = mgr
        .record_class_date(&staff, id, Some(class_date))
        .await
        .unwrap();
    assert_eq!(dated.status, STATUS_FINAL_CONFIRMATION);
    assert_eq!(dated.class_date, Some(class_date));
    assert!(dated.educator_response_at.is_some());

    let class = mgr.confirm_class(&staff, id).await.unwrap();
    assert_eq!(class.subjects, "CPR, AED");
    assert_eq!(class.date_of_class, class_date);
    assert_eq!(class.site_id, SITE_ID);
    assert_eq!(class.educator_id, Some(EDUCATOR_ID));
    assert_eq!(class.coordinator_id, Some(owner.user_id));
    assert_eq!(class.source_request_id, Some(id));
    assert_eq!(class.notes.as_deref(), Some("Loading dock entrance"));

    assert!(mgr.store().requests().await.is_empty());
    assert_eq!(mgr.store().confirmed_classes().await, vec![class]);

    let sent = mgr.notifier().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, STAFF_INBOX);
    assert_eq!(sent[1].to, "dana@lifesafe.example");
}

#[tokio::test]
async fn record_date_assigns_creation_coordinator() {
    let mgr = manager().await;
    let owner = client();
    let (staff_a, staff_b, staff_c) = (staff(), staff(), staff());

    let request = pending_request(&mgr, &owner).await;
    mgr.assign_educator(&staff_a, request.id, EDUCATOR_ID)
        .await
        .unwrap();
    mgr.contact_educator(&staff_b, request.id).await.unwrap();
    let dated = mgr
        .record_class_date(&staff_c, request.id, Some(days_from_today(9)))
        .await
        .unwrap();

    assert_eq!(dated.assignee_id, Some(owner.user_id));
    assert_eq!(dated.coordinator_id, owner.user_id);

    let queue = mgr.work_queue(&owner).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, request.id);
    assert!(mgr.work_queue(&staff_c).await.unwrap().is_empty());
}

#[tokio::test]
async fn record_date_without_date_names_field() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();
    let before = mgr.contact_educator(&staff, request.id).await.unwrap().record;

    let err = mgr
        .record_class_date(&staff, request.id, None)
        .await
        .unwrap_err();
    assert_matches!(err, LifecycleError::Core(CoreError::Validation(ref msg)) if msg.contains("class_date"));

    let after = mgr.get_request(&staff, request.id).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn unauthorized_actor_leaves_status_unchanged() {
    let mgr = manager().await;
    let owner = client();
    let request = pending_request(&mgr, &owner).await;

    assert_matches!(
        mgr.assign_educator(&owner, request.id, EDUCATOR_ID).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        mgr.assign_educator(&educator(), request.id, EDUCATOR_ID)
            .await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        mgr.confirm_class(&owner, request.id).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );

    let stored = mgr.get_request(&owner, request.id).await.unwrap();
    assert_eq!(stored.status, STATUS_PENDING);
    assert_eq!(stored.version, request.version);
}

#[tokio::test]
async fn out_of_order_transitions_are_rejected() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;

    assert_matches!(
        mgr.contact_educator(&staff, request.id).await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        mgr.record_class_date(&staff, request.id, Some(days_from_today(3)))
            .await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        mgr.confirm_class(&staff, request.id).await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );
    assert_eq!(mgr.store().requests().await, vec![request]);
}

#[tokio::test]
async fn assigning_unknown_educator_is_not_found() {
    let mgr = manager().await;
    let request = pending_request(&mgr, &client()).await;
    assert_matches!(
        mgr.assign_educator(&staff(), request.id, 999).await,
        Err(LifecycleError::Core(CoreError::NotFound { entity: "Educator", id: 999 }))
    );
}

#[tokio::test]
async fn educator_accepts_then_staff_records_date() {
    let mgr = manager().await;
    let (staff, instructor) = (staff(), educator());
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();
    mgr.contact_educator(&staff, request.id).await.unwrap();

    let accepted = mgr.accept_offer(&instructor, request.id).await.unwrap();
    assert_eq!(accepted.status, STATUS_ACCEPTED);
    assert!(accepted.educator_response_at.is_some());

    let offers = mgr.educator_offers(&instructor).await.unwrap();
    assert_eq!(offers.len(), 1);

    let dated = mgr
        .record_class_date(&staff, request.id, Some(days_from_today(5)))
        .await
        .unwrap();
    assert_eq!(dated.status, STATUS_FINAL_CONFIRMATION);
}

#[tokio::test]
async fn decline_returns_request_to_pending() {
    let mgr = manager().await;
    let (staff, instructor) = (staff(), educator());
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();
    mgr.contact_educator(&staff, request.id).await.unwrap();

    let declined = mgr.decline_offer(&instructor, request.id).await.unwrap();
    assert_eq!(declined.status, STATUS_PENDING);
    assert_eq!(declined.educator_id, None);
    assert_eq!(declined.offer_sent_at, None);
    assert!(declined.educator_response_at.is_some());

    // Back in pending, a new educator can be assigned.
    let reassigned = mgr
        .assign_educator(&staff, request.id, NO_EMAIL_EDUCATOR_ID)
        .await
        .unwrap();
    assert_eq!(reassigned.educator_id, Some(NO_EMAIL_EDUCATOR_ID));
}

#[tokio::test]
async fn other_educator_cannot_respond() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();

    let stranger =
        lifesafe_core::actor::Actor::new(Uuid::new_v4(), lifesafe_core::roles::Role::Educator)
            .with_educator(NO_EMAIL_EDUCATOR_ID);
    assert_matches!(
        mgr.accept_offer(&stranger, request.id).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        mgr.get_request(&stranger, request.id).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
}

#[tokio::test]
async fn contact_notice_failure_does_not_roll_back() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();

    mgr.notifier().set_failing(true);
    let contacted = mgr.contact_educator(&staff, request.id).await.unwrap();
    assert_matches!(contacted.notice, NoticeOutcome::Failed(_));
    assert_eq!(contacted.record.status, STATUS_AWAITING_DATE);

    let stored = mgr.get_request(&staff, request.id).await.unwrap();
    assert_eq!(stored.status, STATUS_AWAITING_DATE);
}

#[tokio::test]
async fn contact_notice_skipped_without_educator_email() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, NO_EMAIL_EDUCATOR_ID)
        .await
        .unwrap();

    let contacted = mgr.contact_educator(&staff, request.id).await.unwrap();
    assert_matches!(contacted.notice, NoticeOutcome::Skipped(_));
    assert_eq!(contacted.record.status, STATUS_AWAITING_DATE);
}

#[tokio::test]
async fn only_owner_may_remove() {
    let mgr = manager().await;
    let owner = client();
    let request = pending_request(&mgr, &owner).await;

    assert_matches!(
        mgr.remove_request(&staff(), request.id).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        mgr.remove_request(&client(), request.id).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
    assert_eq!(mgr.store().requests().await.len(), 1);

    mgr.remove_request(&owner, request.id).await.unwrap();
    assert!(mgr.store().requests().await.is_empty());
    assert_matches!(
        mgr.get_request(&owner, request.id).await,
        Err(LifecycleError::Core(CoreError::NotFound { .. }))
    );
}

#[tokio::test]
async fn create_validates_catalog_and_window() {
    let mgr = manager().await;
    let owner = client();

    assert_matches!(
        mgr.create_request(&owner, request_input(&[])).await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        mgr.create_request(&owner, request_input(&["OSHA 10"])).await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );

    let mut backwards = request_input(&["CPR"]);
    backwards.preferred_date_end = backwards.preferred_date_start - Duration::days(1);
    assert_matches!(
        mgr.create_request(&owner, backwards).await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );

    let mut bad_site = request_input(&["CPR"]);
    bad_site.site_id = Some(404);
    assert_matches!(
        mgr.create_request(&owner, bad_site).await,
        Err(LifecycleError::Core(CoreError::NotFound { entity: "Site", .. }))
    );

    assert!(mgr.store().requests().await.is_empty());
    assert!(mgr.notifier().sent().is_empty());
}

#[tokio::test]
async fn educators_cannot_create_requests() {
    let mgr = manager().await;
    assert_matches!(
        mgr.create_request(&educator(), request_input(&["CPR"])).await,
        Err(LifecycleError::Core(CoreError::Forbidden(_)))
    );
}

#[tokio::test]
async fn edit_holds_lock_against_other_writers() {
    let mgr = manager().await;
    let (editor, other) = (staff(), staff());
    let request = pending_request(&mgr, &client()).await;

    let edited = mgr
        .edit_request(
            &editor,
            request.id,
            UpdateClassRequest {
                class_types: Some(vec!["CPR".into(), "AED".into(), "BBP".into()]),
                version: request.version,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.status, STATUS_PENDING);
    assert_eq!(edited.class_types.len(), 3);
    assert_eq!(edited.locked_by_user_id, Some(editor.user_id));
    assert_eq!(edited.version, request.version + 1);

    // Another staff member is blocked while the lock is live.
    assert_matches!(
        mgr.assign_educator(&other, request.id, EDUCATOR_ID).await,
        Err(LifecycleError::Core(CoreError::Conflict(_)))
    );

    // The holder's own transition goes through and releases the lock.
    let assigned = mgr
        .assign_educator(&editor, request.id, EDUCATOR_ID)
        .await
        .unwrap();
    assert_eq!(assigned.locked_by_user_id, None);
    mgr.contact_educator(&other, request.id).await.unwrap();
}

#[tokio::test]
async fn stale_lock_does_not_block() {
    let mgr = manager().await;
    let mut request = pending_request(&mgr, &client()).await;
    request.locked_by_user_id = Some(Uuid::new_v4());
    request.locked_at = Some(Utc::now() - Duration::minutes(45));
    mgr.store().put_request(request.clone()).await;

    let assigned = mgr
        .assign_educator(&staff(), request.id, EDUCATOR_ID)
        .await
        .unwrap();
    assert_eq!(assigned.locked_by_user_id, None);
}

#[tokio::test]
async fn edit_with_old_version_is_conflict() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;
    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();

    let result = mgr
        .edit_request(
            &staff,
            request.id,
            UpdateClassRequest {
                notes: Some("stale write".into()),
                version: request.version,
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(LifecycleError::Core(CoreError::Conflict(_))));

    let stored = mgr.get_request(&staff, request.id).await.unwrap();
    assert_eq!(stored.notes.as_deref(), Some("Loading dock entrance"));
}

#[tokio::test]
async fn release_lock_lets_others_write() {
    let mgr = manager().await;
    let (editor, other) = (staff(), staff());
    let request = pending_request(&mgr, &client()).await;
    mgr.edit_request(
        &editor,
        request.id,
        UpdateClassRequest {
            notes: Some("call ahead".into()),
            version: request.version,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(mgr.release_request_lock(&editor, request.id).await.unwrap());
    assert!(!mgr.release_request_lock(&editor, request.id).await.unwrap());
    mgr.assign_educator(&other, request.id, EDUCATOR_ID)
        .await
        .unwrap();
}

#[tokio::test]
async fn cpr_and_aed_at_twenty_five_costs_125() {
    let mgr = manager().await;
    let estimate = mgr
        .estimate_cost(&client(), vec!["CPR".into(), "AED".into()], EDUCATOR_ID)
        .await
        .unwrap();
    assert_eq!(estimate.total_hours, 5);
    assert_eq!(estimate.hourly_rate, 25.0);
    assert_eq!(estimate.total, 125.00);

    assert_matches!(
        mgr.estimate_cost(&client(), vec!["CPR".into()], NO_EMAIL_EDUCATOR_ID)
            .await,
        Err(LifecycleError::Core(CoreError::Validation(_)))
    );
}

#[tokio::test]
async fn new_request_notice_skipped_without_inbox() {
    let mgr = LifecycleManager::new(
        MemoryStore::new(),
        RecordingNotifier::default(),
        Composer::default(),
        LifecycleConfig::default(),
    );
    let mut input = request_input(&["BBP"]);
    input.company_id = None;
    input.site_id = None;

    let created = mgr.create_request(&client(), input).await.unwrap();
    assert_matches!(created.notice, NoticeOutcome::Skipped(_));
    assert_eq!(created.record.status, STATUS_PENDING);
    assert!(mgr.notifier().sent().is_empty());
}

#[tokio::test]
async fn edit_rejects_coordinator_without_profile() {
    let mgr = manager().await;
    let owner = client();
    let request = pending_request(&mgr, &owner).await;

    let result = mgr
        .edit_request(
            &staff(),
            request.id,
            UpdateClassRequest {
                coordinator_id: Some(Uuid::new_v4()),
                version: request.version,
                ..Default::default()
            },
        )
        .await;
    assert_matches!(
        result,
        Err(LifecycleError::Core(CoreError::Validation(ref msg))) if msg.contains("coordinator_id")
    );
    assert_eq!(mgr.store().requests().await, vec![request]);
}

#[tokio::test]
async fn edit_rejects_non_staff_coordinator() {
    let mgr = manager().await;
    let request = pending_request(&mgr, &client()).await;
    let site_user = registered(&mgr, Role::ClientSite).await;

    let result = mgr
        .edit_request(
            &staff(),
            request.id,
            UpdateClassRequest {
                coordinator_id: Some(site_user.user_id),
                version: request.version,
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(LifecycleError::Core(CoreError::Validation(_))));
    assert_eq!(mgr.store().requests().await, vec![request]);
}

#[tokio::test]
async fn reassigned_coordinator_becomes_assignee_and_owner() {
    let mgr = manager().await;
    let staff = staff();
    let request = pending_request(&mgr, &client()).await;
    let coordinator = registered(&mgr, Role::Staff).await;

    let edited = mgr
        .edit_request(
            &staff,
            request.id,
            UpdateClassRequest {
                coordinator_id: Some(coordinator.user_id),
                version: request.version,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.coordinator_id, coordinator.user_id);

    mgr.assign_educator(&staff, request.id, EDUCATOR_ID)
        .await
        .unwrap();
    mgr.contact_educator(&staff, request.id).await.unwrap();
    let dated = mgr
        .record_class_date(&staff, request.id, Some(days_from_today(4)))
        .await
        .unwrap();
    assert_eq!(dated.assignee_id, Some(coordinator.user_id));

    mgr.remove_request(&coordinator, request.id).await.unwrap();
    assert!(mgr.store().requests().await.is_empty());
}
