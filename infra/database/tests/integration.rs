use fhub_database::*;

#[tokio::test]
async fn connect_in_memory_and_health_check() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    // Health should be OK for mem://
    db.health().await.expect("health check");
    db.use_ns("test_ns").use_db("test_db").await.expect("session switch");
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn migrations_populate_bookkeeping() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    let slices: Vec<String> = db
        .query("SELECT VALUE slice FROM migration")
        .await
        .expect("query bookkeeping")
        .take(0)
        .expect("take slices");

    for expected in ["engine", "tenancy", "identity", "pages", "content", "billing"] {
        assert!(slices.iter().any(|s| s == expected), "missing slice {expected}");
    }
}

#[tokio::test]
async fn schema_accepts_slice_records() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    // Unique slug index defined by the tenancy script must reject duplicates.
    db.query("CREATE site SET name = 'Acme', slug = 'acme', hosts = ['acme.test']")
        .await
        .expect("first insert")
        .check()
        .expect("first insert succeeds");

    let duplicate = db
        .query("CREATE site SET name = 'Other', slug = 'acme'")
        .await
        .expect("second insert")
        .check();
    assert!(duplicate.is_err(), "duplicate slug must be rejected");
}
