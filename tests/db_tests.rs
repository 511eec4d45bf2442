//! Database and schema tests
//!
//! Tests SQLite migrations, entity storage, and schema constraints

mod common;

use chrono::Utc;
use common::setup_test_db;
use uuid::Uuid;
use valentine_proposal_bot::infrastructure::entities::{Payment, PaymentStatus, Proposal};

async fn insert_payment(pool: &sqlx::SqlitePool, chat_id: i64, status: &str) -> sqlx::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO payments (id, chat_id, user_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(chat_id)
    .bind(chat_id)
    .bind(status)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(id)
}

#[tokio::test]
async fn test_database_migrations_work() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('proposals', 'payments') ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let names: Vec<_> = tables.into_iter().map(|(name,)| name).collect();
    assert_eq!(names, ["payments", "proposals"]);
}

#[tokio::test]
async fn test_proposal_row_decodes_into_entity() {
    let pool = setup_test_db().await;
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO proposals (id, name, photo_url, expires_at, created_at, chat_id) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind("Riya")
    .bind(Option::<String>::None)
    .bind(Option::<chrono::DateTime<Utc>>::None)
    .bind(Utc::now())
    .bind(99_i64)
    .execute(&pool)
    .await
    .unwrap();

    let proposal: Proposal = sqlx::query_as("SELECT * FROM proposals WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(proposal.id, id);
    assert_eq!(proposal.name, "Riya");
    assert!(proposal.expires_at.is_none());
    assert_eq!(proposal.chat_id, 99);
}

#[tokio::test]
async fn test_payment_status_stored_lowercase() {
    let pool = setup_test_db().await;
    let id = insert_payment(&pool, 5, "pending").await.unwrap();

    sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
        .bind(PaymentStatus::Used)
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let (raw,): (String,) = sqlx::query_as("SELECT status FROM payments WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(raw, "used");

    let payment: Payment = sqlx::query_as("SELECT * FROM payments WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Used);
    assert!(payment.username.is_none());
}

#[tokio::test]
async fn test_status_defaults_to_pending() {
    let pool = setup_test_db().await;
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO payments (id, chat_id, user_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(1_i64)
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

    let (raw,): (String,) = sqlx::query_as("SELECT status FROM payments WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(raw, "pending");
}

#[tokio::test]
async fn test_one_approved_payment_per_chat() {
    let pool = setup_test_db().await;

    insert_payment(&pool, 7, "approved").await.unwrap();
    let second = insert_payment(&pool, 7, "approved").await;
    assert!(second.is_err());

    // other chats and other statuses are unaffected
    insert_payment(&pool, 8, "approved").await.unwrap();
    insert_payment(&pool, 7, "used").await.unwrap();
    insert_payment(&pool, 7, "used").await.unwrap();
    insert_payment(&pool, 7, "pending").await.unwrap();
    insert_payment(&pool, 7, "pending").await.unwrap();
}
