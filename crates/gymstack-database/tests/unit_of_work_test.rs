//! Integration tests for unit-of-work semantics: atomicity, scope
//! threading, time budgets, and misuse detection.

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::sleep;
use uuid::Uuid;

use gymstack_core::error::ErrorKind;
use gymstack_core::traits::Repository;
use gymstack_database::{IsolationLevel, TransactionScope, TxOptions};
use gymstack_entity::plan::PlanFilter;
use gymstack_entity::token::CreateRefreshToken;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_commit_applies_all_writes() {
    let db = helpers::TestDb::new().await;
    let data = helpers::new_user("uow-commit");

    let (user_id, token_id) = db
        .uow
        .execute(|scope| {
            let users = db.users();
            let tokens = db.tokens();
            let data = &data;
            async move {
                let user = users.create(data, Some(&scope)).await?;
                let token = tokens
                    .create(
                        &CreateRefreshToken {
                            user_id: user.id,
                            token_hash: format!("tok-{}", Uuid::new_v4().simple()),
                            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
                        },
                        Some(&scope),
                    )
                    .await?;
                Ok((user.id, token.id))
            }
        })
        .await
        .expect("Unit of work should commit");

    let user = db
        .users()
        .find_by_email(&data.email, None)
        .await
        .expect("Lookup should succeed")
        .expect("User should be committed");
    assert_eq!(user.id, user_id);

    let token = db
        .tokens()
        .find_by_id(&token_id, None)
        .await
        .expect("Lookup should succeed")
        .expect("Token should be committed");
    assert_eq!(token.user_id, user_id);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_error_rolls_back_every_write() {
    let db = helpers::TestDb::new().await;
    let data = helpers::new_user("uow-rollback");

    let err = db
        .uow
        .execute(|scope| {
            let users = db.users();
            let data = &data;
            async move {
                users.create(data, Some(&scope)).await?;
                Err::<(), _>(gymstack_core::error::AppError::validation(
                    "Simulated business failure",
                ))
            }
        })
        .await
        .expect_err("Unit of work should propagate the error");
    assert_eq!(err.kind, ErrorKind::Validation);

    let found = db
        .users()
        .find_by_email(&data.email, None)
        .await
        .expect("Lookup should succeed");
    assert!(found.is_none(), "Rollback should discard the insert");

    let raw_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&data.email)
        .fetch_one(&db.pool)
        .await
        .expect("Raw count should succeed");
    assert_eq!(raw_count, 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_writes_visible_in_scope_before_commit() {
    let db = helpers::TestDb::new().await;
    let data = helpers::new_user("uow-visibility");

    db.uow
        .execute(|scope| {
            let users = db.users();
            let data = &data;
            async move {
                let user = users.create(data, Some(&scope)).await?;

                // Same scope sees the uncommitted row.
                let in_scope = users.find_by_id(&user.id, Some(&scope)).await?;
                assert!(in_scope.is_some());

                // A pool connection does not, under read committed.
                let outside = users.find_by_id(&user.id, None).await?;
                assert!(outside.is_none());

                Ok(())
            }
        })
        .await
        .expect("Unit of work should commit");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_concurrent_units_do_not_observe_uncommitted_writes() {
    let db = helpers::TestDb::new().await;
    let data = helpers::new_user("uow-concurrent");
    let email = data.email.clone();

    // The writer inserts and then holds its transaction open until the
    // reader has looked; the reader runs an entire unit of work in
    // between, on its own task.
    let (inserted_tx, inserted_rx) = oneshot::channel();
    let (checked_tx, checked_rx) = oneshot::channel();

    let writer_uow = db.uow.clone();
    let writer_users = db.users();
    let writer = tokio::spawn(async move {
        writer_uow
            .execute(|scope| {
                let users = writer_users;
                let data = data;
                async move {
                    users.create(&data, Some(&scope)).await?;
                    let _ = inserted_tx.send(());
                    let _ = checked_rx.await;
                    Ok(())
                }
            })
            .await
    });

    let reader_uow = db.uow.clone();
    let reader_users = db.users();
    let reader_email = email.clone();
    let reader = tokio::spawn(async move {
        let _ = inserted_rx.await;
        let seen = reader_uow
            .execute(|scope| {
                let users = reader_users;
                let email = reader_email;
                async move { users.find_by_email(&email, Some(&scope)).await }
            })
            .await;
        let _ = checked_tx.send(());
        seen
    });

    let (writer_result, reader_result) = tokio::join!(writer, reader);
    writer_result
        .expect("Writer task should finish")
        .expect("Writer should commit");
    let seen = reader_result
        .expect("Reader task should finish")
        .expect("Reader should commit");
    assert!(
        seen.is_none(),
        "Read committed must hide the writer's uncommitted row"
    );

    let committed = db
        .users()
        .find_by_email(&email, None)
        .await
        .expect("Lookup should succeed");
    assert!(committed.is_some(), "The row appears once the writer commits");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_time_budget_expiry_rolls_back() {
    let db = helpers::TestDb::new().await;
    let data = helpers::new_user("uow-timeout");

    let err = db
        .uow
        .execute_with_options(
            |scope| {
                let users = db.users();
                let data = &data;
                async move {
                    users.create(data, Some(&scope)).await?;
                    sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            },
            TxOptions::default().timeout(Duration::from_millis(200)),
        )
        .await
        .expect_err("Budget expiry should surface an error");
    assert_eq!(err.kind, ErrorKind::Timeout);

    let found = db
        .users()
        .find_by_email(&data.email, None)
        .await
        .expect("Lookup should succeed");
    assert!(found.is_none(), "Expired work should leave no partial writes");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_nested_execute_is_rejected() {
    let db = helpers::TestDb::new().await;

    let err = db
        .uow
        .execute(|_scope| {
            let uow = db.uow.clone();
            async move { uow.execute(|_inner| async move { Ok(()) }).await }
        })
        .await
        .expect_err("Nested execution should be rejected");
    assert_eq!(err.kind, ErrorKind::InvalidScopeUse);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_stale_scope_use_fails_loudly() {
    let db = helpers::TestDb::new().await;
    let user = db.seed_user("uow-stale").await;

    let leaked: Mutex<Option<Arc<TransactionScope>>> = Mutex::new(None);
    db.uow
        .execute(|scope| {
            let leaked = &leaked;
            async move {
                *leaked.lock().unwrap() = Some(Arc::clone(&scope));
                Ok(())
            }
        })
        .await
        .expect("Unit of work should commit");

    let scope = leaked
        .lock()
        .unwrap()
        .take()
        .expect("Scope should have been captured");
    assert!(!scope.is_open().await);

    let err = db
        .users()
        .find_by_id(&user.id, Some(&scope))
        .await
        .expect_err("Using a consumed scope should fail");
    assert_eq!(err.kind, ErrorKind::InvalidScopeUse);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_batch_preserves_input_order() {
    let db = helpers::TestDb::new().await;
    let users = db.users();

    let taken = db.seed_user("batch-taken").await;
    let first = helpers::new_user("batch-first");
    let mut duplicate = helpers::new_user("batch-duplicate");
    duplicate.email = taken.email.clone();
    let third = helpers::new_user("batch-third");

    let results = db
        .uow
        .batch(vec![
            users.create(&first, None).boxed(),
            users.create(&duplicate, None).boxed(),
            users.create(&third, None).boxed(),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].as_ref().expect("First insert should succeed").email,
        first.email
    );
    assert_eq!(
        results[1].as_ref().expect_err("Duplicate should conflict").kind,
        ErrorKind::Conflict
    );
    assert_eq!(
        results[2].as_ref().expect("Third insert should succeed").email,
        third.email
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_batch_returns_counts_in_input_order() {
    let db = helpers::TestDb::new().await;
    let plans = db.plans();
    let owner = db.seed_user("batch-count").await;
    let academy_a = db.seed_academy(owner.id, 40.0, -3.0).await;
    let academy_b = db.seed_academy(owner.id, 41.0, -3.0).await;
    db.seed_plan(academy_a.id).await;
    db.seed_plan(academy_a.id).await;
    db.seed_plan(academy_b.id).await;

    let filter_a = PlanFilter {
        academy_id: Some(academy_a.id),
        ..Default::default()
    };
    let filter_b = PlanFilter {
        academy_id: Some(academy_b.id),
        ..Default::default()
    };

    let results = db
        .uow
        .batch(vec![
            plans.count(&filter_a, None).boxed(),
            plans.count(&filter_b, None).boxed(),
        ])
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(*results[0].as_ref().expect("First count should succeed"), 2);
    assert_eq!(*results[1].as_ref().expect("Second count should succeed"), 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_serializable_isolation_commits() {
    let db = helpers::TestDb::new().await;
    let data = helpers::new_user("uow-serializable");

    let user = db
        .uow
        .execute_with_options(
            |scope| {
                let users = db.users();
                let data = &data;
                async move { users.create(data, Some(&scope)).await }
            },
            TxOptions::default().isolation(IsolationLevel::Serializable),
        )
        .await
        .expect("Serializable unit of work should commit");

    let found = db
        .users()
        .find_by_id(&user.id, None)
        .await
        .expect("Lookup should succeed");
    assert!(found.is_some());
}
