//! Integration tests for credential provisioning

use promo_common::db::init::init_database;
use promo_common::db::{Area, Role};
use promo_ingest::credentials::{provision, verify_secret, Identity, ProvisionAction};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("promo.db")).await.unwrap();
    (dir, pool)
}

fn identity(email: &str, secret: &str, role: Role, area: Option<Area>) -> Identity {
    Identity {
        email: email.to_string(),
        name: "Test User".to_string(),
        secret: secret.to_string(),
        role,
        area,
        sator: None,
    }
}

async fn stored_hash(pool: &SqlitePool, email: &str) -> String {
    sqlx::query_scalar("SELECT secret_hash FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_failure_does_not_stop_remaining_identities() {
    let (_dir, pool) = setup_db().await;
    let identities = vec![
        identity("Manager.Kupang@Promo.Local ", "rahasia123", Role::AreaManager, Some(Area::Kupang)),
        identity("kpg099@promo.local", "12ab", Role::Promoter, Some(Area::Kupang)),
        identity("", "rahasia123", Role::TopAdmin, None),
        identity("admin@promo.local", "rahasia123", Role::TopAdmin, None),
    ];

    let outcomes = provision(&pool, &identities, 4).await;

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].email, "manager.kupang@promo.local");
    assert_eq!(outcomes[0].action, Some(ProvisionAction::Created));
    assert!(!outcomes[1].success);
    assert!(outcomes[1].message.contains("PIN"));
    assert!(!outcomes[2].success);
    assert!(outcomes[3].success);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_reprovision_updates_role_area_and_hash() {
    let (_dir, pool) = setup_db().await;
    let email = "spv.sumba@promo.local";

    let first = provision(&pool, &[identity(email, "rahasia123", Role::AreaSupervisor, Some(Area::Kupang))], 4).await;
    assert_eq!(first[0].action, Some(ProvisionAction::Created));
    let original = stored_hash(&pool, email).await;
    assert_ne!(original, "rahasia123");
    assert!(verify_secret("rahasia123", &original));

    let second = provision(&pool, &[identity(email, "baru45678", Role::AreaSupervisor, Some(Area::Sumba))], 4).await;
    assert_eq!(second[0].action, Some(ProvisionAction::Updated));

    let updated = stored_hash(&pool, email).await;
    assert!(verify_secret("baru45678", &updated));
    assert!(!verify_secret("rahasia123", &updated));

    let (count, area): (i64, String) = sqlx::query_as("SELECT COUNT(*), MAX(area) FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(area, "SUMBA");
}

#[tokio::test]
async fn test_promoter_pin_accepted() {
    let (_dir, pool) = setup_db().await;

    let outcomes = provision(&pool, &[identity("kpg001@promo.local", "0420", Role::Promoter, Some(Area::Kupang))], 4).await;
    assert!(outcomes[0].success, "{}", outcomes[0]);

    let hash = stored_hash(&pool, "kpg001@promo.local").await;
    assert!(verify_secret("0420", &hash));
}
