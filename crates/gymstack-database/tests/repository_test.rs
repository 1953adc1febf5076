//! Integration tests for repository behavior: soft deletes, domain
//! lookups, pagination, and constraint mapping.

mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use gymstack_core::error::ErrorKind;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::PageRequest;
use gymstack_entity::payment::{CreatePayment, PaymentMethod, PaymentStatus};
use gymstack_entity::plan::{PlanFilter, UpdatePlan};
use gymstack_entity::subscription::{CreateSubscription, SubscriptionStatus};
use gymstack_entity::token::CreateRefreshToken;
use gymstack_entity::user::{UpdateUser, UserFilter, UserRole};

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_find_by_email_absent_is_none() {
    let db = helpers::TestDb::new().await;

    let found = db
        .users()
        .find_by_email(&helpers::unique_email("nobody"), None)
        .await
        .expect("Lookup should succeed");
    assert!(found.is_none());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_repeated_reads_are_stable() {
    let db = helpers::TestDb::new().await;
    let users = db.users();
    let user = db.seed_user("idem").await;

    let first = users
        .find_by_id(&user.id, None)
        .await
        .expect("Lookup should succeed")
        .expect("User should exist");
    let second = users
        .find_by_id(&user.id, None)
        .await
        .expect("Lookup should succeed")
        .expect("User should exist");
    assert_eq!(first.id, second.id);
    assert_eq!(first.email, second.email);
    assert_eq!(first.updated_at, second.updated_at);

    let filter = UserFilter {
        email: Some(user.email.clone()),
        ..Default::default()
    };
    let exists_once = users
        .exists(&filter, None)
        .await
        .expect("Existence check should succeed");
    let exists_again = users
        .exists(&filter, None)
        .await
        .expect("Existence check should succeed");
    assert!(exists_once);
    assert_eq!(exists_once, exists_again);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_duplicate_email_is_conflict() {
    let db = helpers::TestDb::new().await;
    let user = db.seed_user("dup-email").await;

    let mut duplicate = helpers::new_user("dup-email");
    duplicate.email = user.email.clone();

    let err = db
        .users()
        .create(&duplicate, None)
        .await
        .expect_err("Second insert should conflict");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains(&user.email));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_find_by_role_lists_matching_users() {
    let db = helpers::TestDb::new().await;
    let users = db.users();

    let mut staff = helpers::new_user("role-staff");
    staff.role = UserRole::Staff;
    let created = users
        .create(&staff, None)
        .await
        .expect("Insert should succeed");

    let listed = users
        .find_by_role(UserRole::Staff, None)
        .await
        .expect("Listing should succeed");
    assert!(listed.iter().any(|u| u.id == created.id));
    assert!(listed.iter().all(|u| u.role == UserRole::Staff));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_update_missing_user_is_not_found() {
    let db = helpers::TestDb::new().await;

    let err = db
        .users()
        .update(
            &Uuid::new_v4(),
            &UpdateUser {
                full_name: Some("Ghost".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .expect_err("Updating a missing row should fail");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_soft_delete_hides_user() {
    let db = helpers::TestDb::new().await;
    let users = db.users();
    let user = db.seed_user("soft-delete").await;

    let deleted = users
        .soft_delete(&user.id, None)
        .await
        .expect("Soft delete should succeed");
    assert!(deleted.deleted_at.is_some());

    let found = users
        .find_by_id(&user.id, None)
        .await
        .expect("Lookup should succeed");
    assert!(found.is_none(), "Soft-deleted rows are invisible by default");

    let filter = UserFilter {
        email: Some(user.email.clone()),
        include_deleted: true,
        ..Default::default()
    };
    assert_eq!(
        users.count(&filter, None).await.expect("Count should succeed"),
        1
    );

    let live_filter = UserFilter {
        email: Some(user.email.clone()),
        ..Default::default()
    };
    assert!(
        !users
            .exists(&live_filter, None)
            .await
            .expect("Existence check should succeed")
    );

    let err = users
        .soft_delete(&user.id, None)
        .await
        .expect_err("Soft delete is not repeatable");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_refresh_token_lifecycle() {
    let db = helpers::TestDb::new().await;
    let tokens = db.tokens();
    let user = db.seed_user("token-life").await;

    let hash = format!("tok-{}", Uuid::new_v4().simple());
    let token = tokens
        .create(
            &CreateRefreshToken {
                user_id: user.id,
                token_hash: hash.clone(),
                expires_at: Utc::now() + Duration::hours(1),
            },
            None,
        )
        .await
        .expect("Token insert should succeed");

    let valid = tokens
        .find_valid(&hash, None)
        .await
        .expect("Lookup should succeed");
    assert_eq!(valid.map(|t| t.id), Some(token.id));

    tokens
        .revoke(&token.id, None)
        .await
        .expect("Revoke should succeed");
    let after_revoke = tokens
        .find_valid(&hash, None)
        .await
        .expect("Lookup should succeed");
    assert!(after_revoke.is_none(), "Revoked tokens are no longer valid");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_revoke_all_and_purge_expired() {
    let db = helpers::TestDb::new().await;
    let tokens = db.tokens();
    let user = db.seed_user("token-revoke-all").await;

    for _ in 0..2 {
        tokens
            .create(
                &CreateRefreshToken {
                    user_id: user.id,
                    token_hash: format!("tok-{}", Uuid::new_v4().simple()),
                    expires_at: Utc::now() + Duration::hours(1),
                },
                None,
            )
            .await
            .expect("Token insert should succeed");
    }
    let expired = tokens
        .create(
            &CreateRefreshToken {
                user_id: user.id,
                token_hash: format!("tok-{}", Uuid::new_v4().simple()),
                expires_at: Utc::now() - Duration::hours(1),
            },
            None,
        )
        .await
        .expect("Token insert should succeed");

    let revoked = tokens
        .revoke_all_for_user(&user.id, None)
        .await
        .expect("Revoke-all should succeed");
    assert_eq!(revoked, 3);

    let purged = tokens
        .purge_expired(None)
        .await
        .expect("Purge should succeed");
    assert!(purged >= 1);

    let found = tokens
        .find_by_id(&expired.id, None)
        .await
        .expect("Lookup should succeed");
    assert!(found.is_none(), "Expired tokens are hard-deleted");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_academy_radius_search_orders_by_distance() {
    let db = helpers::TestDb::new().await;
    let owner = db.seed_user("radius-owner").await;

    // Remote open-ocean coordinates so rows from other tests stay out of
    // the search radius.
    let center = db.seed_academy(owner.id, -47.1000, 165.3000).await;
    let near = db.seed_academy(owner.id, -47.1300, 165.3000).await;
    let far = db.seed_academy(owner.id, -44.0000, 165.3000).await;

    let results = db
        .academies()
        .search_by_location(-47.1000, 165.3000, 10.0, None)
        .await
        .expect("Search should succeed");

    let ids: Vec<Uuid> = results.iter().map(|a| a.id).collect();
    assert!(ids.contains(&center.id));
    assert!(ids.contains(&near.id));
    assert!(!ids.contains(&far.id), "Academies beyond the radius are excluded");

    let center_pos = ids.iter().position(|id| *id == center.id);
    let near_pos = ids.iter().position(|id| *id == near.id);
    assert!(center_pos < near_pos, "Nearest academies come first");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_plan_catalog_and_unique_name() {
    let db = helpers::TestDb::new().await;
    let plans = db.plans();
    let owner = db.seed_user("plan-owner").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;

    let monthly = db.seed_plan(academy.id).await;
    db.seed_plan(academy.id).await;
    let retired = db.seed_plan(academy.id).await;

    plans
        .update(
            &retired.id,
            &UpdatePlan {
                active: Some(false),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("Deactivation should succeed");

    assert_eq!(
        plans
            .find_by_academy(&academy.id, None)
            .await
            .expect("Listing should succeed")
            .len(),
        3
    );
    assert_eq!(
        plans
            .find_active_by_academy(&academy.id, None)
            .await
            .expect("Listing should succeed")
            .len(),
        2
    );

    let clash = gymstack_entity::plan::CreatePlan {
        academy_id: academy.id,
        name: monthly.name.clone(),
        description: None,
        price_cents: 1_000,
        currency: "EUR".to_string(),
        duration_days: 7,
    };
    let err = plans
        .create(&clash, None)
        .await
        .expect_err("Duplicate plan name should conflict");
    assert_eq!(err.kind, ErrorKind::Conflict);

    // The same name is free again once the original plan is soft-deleted.
    plans
        .soft_delete(&monthly.id, None)
        .await
        .expect("Soft delete should succeed");
    plans
        .create(&clash, None)
        .await
        .expect("Name of a soft-deleted plan is reusable");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_plan_pagination() {
    let db = helpers::TestDb::new().await;
    let plans = db.plans();
    let owner = db.seed_user("page-owner").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;

    for _ in 0..3 {
        db.seed_plan(academy.id).await;
    }

    let filter = PlanFilter {
        academy_id: Some(academy.id),
        ..Default::default()
    };

    let first = plans
        .find_many(&filter, &PageRequest::new(1, 2), None)
        .await
        .expect("First page should load");
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total_items, 3);
    assert_eq!(first.total_pages, 2);
    assert!(first.has_next());

    let second = plans
        .find_many(&filter, &PageRequest::new(2, 2), None)
        .await
        .expect("Second page should load");
    assert_eq!(second.items.len(), 1);
    assert!(second.has_previous());
    assert!(!second.has_next());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_duplicate_active_subscription_is_conflict() {
    let db = helpers::TestDb::new().await;
    let owner = db.seed_user("sub-owner").await;
    let member = db.seed_user("sub-member").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;
    let plan = db.seed_plan(academy.id).await;

    db.seed_subscription(member.id, plan.id).await;

    let now = Utc::now();
    let err = db
        .subscriptions()
        .create(
            &CreateSubscription {
                user_id: member.id,
                plan_id: plan.id,
                starts_at: now,
                ends_at: now + Duration::days(30),
            },
            None,
        )
        .await
        .expect_err("Second active subscription should conflict");
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_expire_due_flips_lapsed_subscriptions() {
    let db = helpers::TestDb::new().await;
    let subscriptions = db.subscriptions();
    let owner = db.seed_user("expire-owner").await;
    let member = db.seed_user("expire-member").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;
    let plan = db.seed_plan(academy.id).await;

    let now = Utc::now();
    let lapsed = subscriptions
        .create(
            &CreateSubscription {
                user_id: member.id,
                plan_id: plan.id,
                starts_at: now - Duration::days(60),
                ends_at: now - Duration::days(30),
            },
            None,
        )
        .await
        .expect("Insert should succeed");

    let flipped = subscriptions
        .expire_due(now, None)
        .await
        .expect("Expiry sweep should succeed");
    assert!(flipped >= 1);

    let after = subscriptions
        .find_by_id(&lapsed.id, None)
        .await
        .expect("Lookup should succeed")
        .expect("Subscription should still exist");
    assert_eq!(after.status, SubscriptionStatus::Expired);

    let active = subscriptions
        .find_active_for_user(&member.id, None)
        .await
        .expect("Listing should succeed");
    assert!(active.is_empty());

    // History still lists the expired subscription.
    let history = subscriptions
        .find_by_user(&member.id, None)
        .await
        .expect("Listing should succeed");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_payment_settlement() {
    let db = helpers::TestDb::new().await;
    let payments = db.payments();
    let owner = db.seed_user("pay-owner").await;
    let member = db.seed_user("pay-member").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;
    let plan = db.seed_plan(academy.id).await;
    let subscription = db.seed_subscription(member.id, plan.id).await;

    let payment = payments
        .create(
            &CreatePayment {
                subscription_id: subscription.id,
                amount_cents: 4_990,
                currency: "EUR".to_string(),
                method: PaymentMethod::Card,
                reference: None,
            },
            None,
        )
        .await
        .expect("Payment insert should succeed");
    assert_eq!(payment.status, PaymentStatus::Pending);

    let paid_at = Utc::now();
    let settled = payments
        .mark_paid(&payment.id, paid_at, None)
        .await
        .expect("Settlement should succeed");
    assert_eq!(settled.status, PaymentStatus::Paid);
    assert!(settled.paid_at.is_some());

    let err = payments
        .mark_paid(&payment.id, paid_at, None)
        .await
        .expect_err("Settlement is not repeatable");
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert_eq!(
        payments
            .total_paid_for_subscription(&subscription.id, None)
            .await
            .expect("Sum should succeed"),
        4_990
    );
    assert_eq!(
        payments
            .find_by_subscription(&subscription.id, None)
            .await
            .expect("Listing should succeed")
            .len(),
        1
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_duplicate_payment_reference_is_conflict() {
    let db = helpers::TestDb::new().await;
    let payments = db.payments();
    let owner = db.seed_user("ref-owner").await;
    let member = db.seed_user("ref-member").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;
    let plan = db.seed_plan(academy.id).await;
    let subscription = db.seed_subscription(member.id, plan.id).await;

    let reference = format!("ref-{}", Uuid::new_v4().simple());
    let data = CreatePayment {
        subscription_id: subscription.id,
        amount_cents: 4_990,
        currency: "EUR".to_string(),
        method: PaymentMethod::BankTransfer,
        reference: Some(reference.clone()),
    };

    payments
        .create(&data, None)
        .await
        .expect("First payment should succeed");
    let err = payments
        .create(&data, None)
        .await
        .expect_err("Reused reference should conflict");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains(&reference));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_open_visit_uniqueness_is_store_enforced() {
    let db = helpers::TestDb::new().await;
    let attendance = db.attendance();
    let owner = db.seed_user("race-owner").await;
    let member = db.seed_user("race-member").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;

    let check_in = gymstack_entity::attendance::CheckIn {
        user_id: member.id,
        academy_id: academy.id,
        checked_in_at: None,
    };
    let visit = attendance
        .check_in(&check_in, None)
        .await
        .expect("Check-in should succeed");

    // Insert directly, skipping check_in's pre-check the way a concurrent
    // check-in that lost the race would; the partial index still refuses.
    let err = attendance
        .create(&check_in, None)
        .await
        .expect_err("The open-visit index should reject a second insert");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains("open visit"));

    // Checking out frees the slot for the next visit.
    attendance
        .check_out(&visit.id, None)
        .await
        .expect("Check-out should succeed");
    attendance
        .check_in(&check_in, None)
        .await
        .expect("A closed visit no longer blocks check-in");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_attendance_check_in_and_out() {
    let db = helpers::TestDb::new().await;
    let attendance = db.attendance();
    let owner = db.seed_user("visit-owner").await;
    let member = db.seed_user("visit-member").await;
    let academy = db.seed_academy(owner.id, 40.0, -3.0).await;

    let check_in = gymstack_entity::attendance::CheckIn {
        user_id: member.id,
        academy_id: academy.id,
        checked_in_at: None,
    };
    let visit = attendance
        .check_in(&check_in, None)
        .await
        .expect("Check-in should succeed");
    assert!(visit.checked_out_at.is_none());

    let err = attendance
        .check_in(&check_in, None)
        .await
        .expect_err("A second open visit should be rejected");
    assert_eq!(err.kind, ErrorKind::Conflict);

    let open = attendance
        .find_open_for_user(&member.id, None)
        .await
        .expect("Lookup should succeed");
    assert_eq!(open.map(|a| a.id), Some(visit.id));

    let closed = attendance
        .check_out(&visit.id, None)
        .await
        .expect("Check-out should succeed");
    assert!(closed.checked_out_at.is_some());

    let err = attendance
        .check_out(&visit.id, None)
        .await
        .expect_err("Check-out is not repeatable");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let open_after = attendance
        .find_open_for_user(&member.id, None)
        .await
        .expect("Lookup should succeed");
    assert!(open_after.is_none());

    let window_start = Utc::now() - Duration::hours(1);
    let window_end = Utc::now() + Duration::hours(1);
    assert_eq!(
        attendance
            .count_for_academy_between(&academy.id, window_start, window_end, None)
            .await
            .expect("Count should succeed"),
        1
    );
    assert_eq!(
        attendance
            .find_for_user_between(&member.id, window_start, window_end, None)
            .await
            .expect("Listing should succeed")
            .len(),
        1
    );
}
