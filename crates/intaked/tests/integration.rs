//! Integration tests for intaked
//!
//! These tests drive the engine/coordinator API the way the transport
//! boundary does, end to end against a real store.

use chrono::{NaiveDate, NaiveTime, Utc};
use intake_config::parse_config;
use intake_core::{ApplicationCoordinator, SlotReservationEngine};
use intake_store::{ApplicantProfile, ApplicationStatus, SqliteStore, Store};
use intake_util::{ApplicationId, ConflictReason, IntakeError, Modality, SessionId, SlotId};
use std::sync::Arc;
use std::time::Duration;

fn build_service(store: Arc<SqliteStore>) -> (SlotReservationEngine, ApplicationCoordinator) {
    let engine = SlotReservationEngine::new(store.clone(), Duration::from_secs(300));
    let coordinator = ApplicationCoordinator::new(store, engine.clone(), 2);
    (engine, coordinator)
}

fn make_slot(engine: &SlotReservationEngine, day: u32, hour: u32) -> SlotId {
    engine
        .create_slot(
            NaiveDate::from_ymd_opt(2026, 4, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 30, 0).unwrap(),
            Modality::InPerson,
        )
        .unwrap()
        .id
}

fn profile(name: &str) -> ApplicantProfile {
    ApplicantProfile {
        full_name: name.into(),
        phone: "12345678".into(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        age: "24".into(),
        job_position: "barista".into(),
    }
}

#[test]
fn full_applicant_journey() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (engine, coordinator) = build_service(store);
    let now = Utc::now();

    let slot_a = make_slot(&engine, 22, 8);
    let slot_b = make_slot(&engine, 22, 10);
    let session = SessionId::new("browser-tab-1");

    // Browse and tentatively reserve while choosing
    let ttl = engine.reserve(&slot_a, &session, now).unwrap();
    assert_eq!(ttl.as_millis(), 300_000);

    // Submit the application nominating both slots
    let app = ApplicationId::generate();
    let submission = coordinator
        .submit(
            app.clone(),
            profile("Anna Jensen"),
            vec![slot_a.clone(), slot_b.clone()],
            now,
        )
        .unwrap();
    assert_eq!(submission.accepted_slots.len(), 2);

    // The hold superseded the browsing reservation
    let record = engine.get_slot(&slot_a).unwrap();
    assert_eq!(record.held_by, Some(app.clone()));
    assert!(record.reserved_by.is_none());

    // Commit to one time
    coordinator.confirm_slot(&app, &slot_a, now).unwrap();

    let booked = engine.get_slot(&slot_a).unwrap();
    assert!(booked.booked);
    assert_eq!(booked.booked_by, Some(app.clone()));
    assert!(booked.held_by.is_none());

    // The other nomination went back to the pool
    let freed = engine.get_slot(&slot_b).unwrap();
    assert!(!freed.booked && freed.held_by.is_none());

    let application = coordinator.get(&app).unwrap();
    assert_eq!(application.status, ApplicationStatus::InterviewScheduled);
    assert_eq!(application.confirmed_slot.unwrap().id, slot_a);
}

#[test]
fn reservation_expiry_allows_takeover() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (engine, _) = build_service(store);
    let now = Utc::now();

    let slot = make_slot(&engine, 22, 8);

    engine.reserve(&slot, &SessionId::new("sess1"), now).unwrap();

    // Immediate takeover attempt fails
    let result = engine.reserve(&slot, &SessionId::new("sess2"), now);
    assert!(matches!(
        result,
        Err(IntakeError::Conflict {
            reason: ConflictReason::Reserved,
            ..
        })
    ));

    // 301 seconds later the reservation is stale and reclaimable
    let later = now + chrono::Duration::seconds(301);
    engine.reserve(&slot, &SessionId::new("sess2"), later).unwrap();
    assert_eq!(
        engine.get_slot(&slot).unwrap().reserved_by,
        Some(SessionId::new("sess2"))
    );
}

#[test]
fn submission_accepts_only_free_candidates() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (engine, coordinator) = build_service(store);
    let now = Utc::now();

    let slot_a = make_slot(&engine, 22, 8);
    let slot_b = make_slot(&engine, 22, 10);

    coordinator
        .submit(
            ApplicationId::new("app2"),
            profile("Bo Holm"),
            vec![slot_b.clone()],
            now,
        )
        .unwrap();

    let submission = coordinator
        .submit(
            ApplicationId::new("app1"),
            profile("Anna Jensen"),
            vec![slot_a.clone(), slot_b.clone()],
            now,
        )
        .unwrap();

    assert_eq!(submission.accepted_slots, vec![slot_a]);
}

#[test]
fn hr_can_unwind_a_confirmation() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (engine, coordinator) = build_service(store);
    let now = Utc::now();

    let slot_a = make_slot(&engine, 22, 8);
    let slot_b = make_slot(&engine, 22, 10);
    let app = ApplicationId::new("app1");

    coordinator
        .submit(
            app.clone(),
            profile("Anna Jensen"),
            vec![slot_a.clone(), slot_b.clone()],
            now,
        )
        .unwrap();
    coordinator.confirm_slot(&app, &slot_a, now).unwrap();
    coordinator.release_confirmed_slot(&app, now).unwrap();

    // Both nominations are held again, nothing is booked
    assert_eq!(engine.get_slot(&slot_a).unwrap().held_by, Some(app.clone()));
    assert_eq!(engine.get_slot(&slot_b).unwrap().held_by, Some(app.clone()));
    assert!(!engine.get_slot(&slot_a).unwrap().booked);

    let application = coordinator.get(&app).unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);

    // The applicant can confirm the other time instead
    coordinator.confirm_slot(&app, &slot_b, now).unwrap();
    assert!(engine.get_slot(&slot_b).unwrap().booked);
}

#[test]
fn force_release_spares_bookings() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (engine, coordinator) = build_service(store);
    let now = Utc::now();

    let slot = make_slot(&engine, 22, 8);
    let app = ApplicationId::new("app1");

    coordinator
        .submit(app.clone(), profile("Anna Jensen"), vec![slot.clone()], now)
        .unwrap();
    coordinator.confirm_slot(&app, &slot, now).unwrap();

    engine.force_release(&slot).unwrap();

    let record = engine.get_slot(&slot).unwrap();
    assert!(record.booked);
    assert_eq!(record.booked_by, Some(app));
    assert!(record.held_by.is_none());
    assert!(record.reserved_by.is_none());
}

#[test]
fn deleting_application_frees_all_its_slots() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (engine, coordinator) = build_service(store);
    let now = Utc::now();

    let slot_x = make_slot(&engine, 22, 8);
    let slot_y = make_slot(&engine, 22, 10);
    let slot_z = make_slot(&engine, 23, 9);
    let app = ApplicationId::new("app1");

    coordinator
        .submit(
            app.clone(),
            profile("Anna Jensen"),
            vec![slot_x.clone(), slot_y.clone()],
            now,
        )
        .unwrap();
    engine.book(&slot_z, &app).unwrap();

    coordinator.delete(&app).unwrap();

    for slot in [&slot_x, &slot_y, &slot_z] {
        let record = engine.get_slot(slot).unwrap();
        assert!(!record.booked);
        assert!(record.held_by.is_none());
        assert!(record.booked_by.is_none());
    }

    // A new applicant can immediately take the slots over
    let submission = coordinator
        .submit(
            ApplicationId::new("app2"),
            profile("Bo Holm"),
            vec![slot_x.clone(), slot_z.clone()],
            now,
        )
        .unwrap();
    assert_eq!(submission.accepted_slots.len(), 2);
}

#[test]
fn state_survives_restart_and_resweep() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intaked.db");
    let now = Utc::now();

    let (slot_held, slot_reserved, app) = {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let (engine, coordinator) = build_service(store);

        let slot_held = make_slot(&engine, 22, 8);
        let slot_reserved = make_slot(&engine, 22, 10);
        let app = ApplicationId::new("app1");

        coordinator
            .submit(
                app.clone(),
                profile("Anna Jensen"),
                vec![slot_held.clone()],
                now,
            )
            .unwrap();
        engine
            .reserve(&slot_reserved, &SessionId::new("sess1"), now)
            .unwrap();

        (slot_held, slot_reserved, app)
    };

    // "Restart": reopen the same database
    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let (engine, coordinator) = build_service(store);

    // Holds are non-expiring and survive
    assert_eq!(engine.get_slot(&slot_held).unwrap().held_by, Some(app.clone()));
    assert_eq!(coordinator.get(&app).unwrap().selected_slots, vec![slot_held]);

    // The reservation is wall-clock based; the first sweep past the TTL
    // clears it without any timer recovery
    let later = now + chrono::Duration::seconds(301);
    assert_eq!(engine.sweep_expired(later).unwrap(), 1);
    assert!(engine.get_slot(&slot_reserved).unwrap().reserved_by.is_none());
}

#[test]
fn settings_wire_into_service_components() {
    let settings = parse_config(
        r#"
        config_version = 1

        [service]
        reservation_ttl_seconds = 120
        max_candidate_slots = 3

        [[seed_slots]]
        date = "2026-04-22"
        time = "08:30"
        modality = "in_person"
    "#,
    )
    .unwrap();

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = SlotReservationEngine::new(store.clone(), settings.reservation_ttl);
    assert_eq!(engine.reservation_ttl(), Duration::from_secs(120));

    // Seed the way the daemon does on first start
    for seed in &settings.seed_slots {
        engine.create_slot(seed.date, seed.time, seed.modality).unwrap();
    }
    assert_eq!(store.slot_count().unwrap(), 1);

    let slots = engine.list_slots(Utc::now()).unwrap();
    assert_eq!(slots[0].modality, Modality::InPerson);

    // A reservation under the shorter TTL expires accordingly
    let now = Utc::now();
    let slot = slots[0].id.clone();
    engine.reserve(&slot, &SessionId::new("sess1"), now).unwrap();

    let result = engine.reserve(&slot, &SessionId::new("sess2"), now + chrono::Duration::seconds(60));
    assert!(result.is_err());
    engine
        .reserve(&slot, &SessionId::new("sess2"), now + chrono::Duration::seconds(121))
        .unwrap();
}
