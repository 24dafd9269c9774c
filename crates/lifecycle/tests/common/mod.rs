//! Shared fixtures for lifecycle integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{Duration, Utc};
use lifesafe_core::actor::Actor;
use lifesafe_core::roles::Role;
use lifesafe_core::types::{Date, DbId};
use lifesafe_db::models::class_request::{ClassRequest, CreateClassRequest};
use lifesafe_db::models::company::Company;
use lifesafe_db::models::educator::Educator;
use lifesafe_db::models::profile::Profile;
use lifesafe_db::models::site::Site;
use lifesafe_events::{Composer, EmailError, Notifier, NotifyError, OutboundEmail};
use lifesafe_lifecycle::{LifecycleConfig, LifecycleManager, MemoryStore};
use uuid::Uuid;

pub const EDUCATOR_ID: DbId = 7;
pub const NO_EMAIL_EDUCATOR_ID: DbId = 8;
pub const SITE_ID: DbId = 2;
pub const COMPANY_ID: DbId = 1;
pub const STAFF_INBOX: &str = "scheduling@lifesafe.example";

/// Records every email and optionally fails delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Email(EmailError::Build(
                "connection refused".to_string(),
            )));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub type TestManager = LifecycleManager<MemoryStore, RecordingNotifier>;

pub async fn manager() -> TestManager {
    let store = MemoryStore::new();
    store
        .add_company(Company {
            id: COMPANY_ID,
            name: "Acme Logistics".into(),
        })
        .await;
    store
        .add_site(Site {
            id: SITE_ID,
            company_id: COMPANY_ID,
            name: "Acme Warehouse".into(),
            address: Some("1 Dock Rd".into()),
            city: Some("Oakland".into()),
            state: Some("CA".into()),
            zip: Some("94607".into()),
            email: Some("warehouse@acme.example".into()),
        })
        .await;
    store
        .add_educator(Educator {
            id: EDUCATOR_ID,
            first_name: "Dana".into(),
            last_name: "Lee".into(),
            email: Some("dana@lifesafe.example".into()),
            teach_state: Some("CA".into()),
            rate1: Some(25.0),
        })
        .await;
    store
        .add_educator(Educator {
            id: NO_EMAIL_EDUCATOR_ID,
            first_name: "Sam".into(),
            last_name: "Ortiz".into(),
            email: None,
            teach_state: None,
            rate1: None,
        })
        .await;

    LifecycleManager::new(
        store,
        RecordingNotifier::default(),
        Composer::default(),
        LifecycleConfig {
            staff_inbox: Some(STAFF_INBOX.into()),
            reconcile_repair: true,
        },
    )
}

pub fn staff() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Staff)
}

pub fn client() -> Actor {
    Actor::new(Uuid::new_v4(), Role::ClientAdmin)
}

pub fn educator() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Educator).with_educator(EDUCATOR_ID)
}

/// A user with a stored profile in the given role.
pub async fn registered(mgr: &TestManager, role: Role) -> Actor {
    let actor = Actor::new(Uuid::new_v4(), role);
    mgr.store()
        .add_profile(Profile {
            id: actor.user_id,
            first_name: "Jordan".into(),
            last_name: "Park".into(),
            email: Some("jordan@lifesafe.example".into()),
            role: role.as_str().to_string(),
            educator_id: None,
        })
        .await;
    actor
}

pub fn today() -> Date {
    Utc::now().date_naive()
}

pub fn days_from_today(days: i64) -> Date {
    today() + Duration::days(days)
}

pub fn request_input(types: &[&str]) -> CreateClassRequest {
    CreateClassRequest {
        company_id: Some(COMPANY_ID),
        site_id: Some(SITE_ID),
        class_types: types.iter().map(|t| t.to_string()).collect(),
        preferred_date_start: days_from_today(10),
        preferred_date_end: days_from_today(20),
        notes: Some("Loading dock entrance".into()),
    }
}

/// Create a pending CPR + AED request owned by `owner`.
pub async fn pending_request(mgr: &TestManager, owner: &Actor) -> ClassRequest {
    mgr.create_request(owner, request_input(&["CPR", "AED"]))
        .await
        .expect("create request")
        .record
}

/// Drive a new request to `Final Confirmation` with the given class date.
pub async fn final_confirmation(
    mgr: &TestManager,
    owner: &Actor,
    staff: &Actor,
    class_date: Date,
) -> ClassRequest {
    let request = pending_request(mgr, owner).await;
    mgr.assign_educator(staff, request.id, EDUCATOR_ID)
        .await
        .expect("assign");
    mgr.contact_educator(staff, request.id)
        .await
        .expect("contact");
    mgr.record_class_date(staff, request.id, Some(class_date))
        .await
        .expect("record date")
}
