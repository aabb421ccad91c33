#![cfg(feature = "server")]

use fhub_billing::BillingError;
use fhub_billing::models::{PaymentMode, PaymentProvider, UpsertPaymentConfig};
use fhub_billing::repository::PaymentConfigRepository;
use fhub_billing::sealing::SecretSealer;
use fhub_database::Database;

async fn repo(db_name: &str) -> PaymentConfigRepository {
    let db =
        Database::builder().url("mem://").session("fhub", db_name).init().await.expect("db");
    PaymentConfigRepository::new(db)
}

fn sealer() -> SecretSealer {
    SecretSealer::new("test-sealing-key").expect("sealer")
}

fn stripe_req() -> UpsertPaymentConfig {
    UpsertPaymentConfig {
        publishable_key: "pk_test_51H8".to_owned(),
        secret_key: "sk_test_4eC39HqLyjWDarjtT1zdp7dc".to_owned(),
        mode: PaymentMode::Test,
        currency: "usd".to_owned(),
    }
}

#[tokio::test]
async fn upsert_returns_a_masked_config() {
    let payments = repo("billing_upsert").await;
    let sealer = sealer();

    let config = payments
        .upsert("site:one", PaymentProvider::Stripe, stripe_req(), &sealer)
        .await
        .expect("upsert");
    assert_eq!(config.site_id, "site:one");
    assert_eq!(config.provider, PaymentProvider::Stripe);
    assert_eq!(config.publishable_key, "pk_test_51H8");
    assert_eq!(config.mode, PaymentMode::Test);
    assert_eq!(config.currency, "usd");
    assert_eq!(config.secret_last4, "p7dc");

    // Replacing flips the mode and keeps the creation date.
    let live = UpsertPaymentConfig {
        secret_key: "sk_live_9zX8wY7vU6tS5rQ4".to_owned(),
        mode: PaymentMode::Live,
        ..stripe_req()
    };
    let replaced = payments
        .upsert("site:one", PaymentProvider::Stripe, live, &sealer)
        .await
        .expect("replace");
    assert_eq!(replaced.mode, PaymentMode::Live);
    assert_eq!(replaced.secret_last4, "3rQ4");
    assert_eq!(replaced.created_at, config.created_at);
}

#[tokio::test]
async fn configs_are_scoped_per_site_and_provider() {
    let payments = repo("billing_scope").await;
    let sealer = sealer();

    payments
        .upsert("site:one", PaymentProvider::Stripe, stripe_req(), &sealer)
        .await
        .expect("stripe");
    let paypal = UpsertPaymentConfig {
        publishable_key: "client-id-2VX".to_owned(),
        secret_key: "paypal-secret-9f8e7d6c".to_owned(),
        mode: PaymentMode::Live,
        currency: "eur".to_owned(),
    };
    payments
        .upsert("site:one", PaymentProvider::Paypal, paypal, &sealer)
        .await
        .expect("paypal");
    payments
        .upsert("site:two", PaymentProvider::Stripe, stripe_req(), &sealer)
        .await
        .expect("other site");

    let all = payments.list("site:one").await.expect("list");
    let providers: Vec<PaymentProvider> = all.iter().map(|c| c.provider).collect();
    assert_eq!(providers, vec![PaymentProvider::Paypal, PaymentProvider::Stripe]);
    assert_eq!(payments.list("site:two").await.expect("list").len(), 1);
    assert!(payments.list("site:three").await.expect("list").is_empty());

    let fetched = payments.get("site:one", PaymentProvider::Paypal).await.expect("get");
    assert_eq!(fetched.currency, "eur");
    assert!(matches!(
        payments.get("site:two", PaymentProvider::Paypal).await.unwrap_err(),
        BillingError::NotFound { .. }
    ));
}

#[tokio::test]
async fn invalid_payloads_never_reach_storage() {
    let payments = repo("billing_validation").await;
    let sealer = sealer();

    let short = UpsertPaymentConfig { secret_key: "sk_1".to_owned(), ..stripe_req() };
    let err =
        payments.upsert("site:one", PaymentProvider::Stripe, short, &sealer).await.unwrap_err();
    assert!(matches!(err, BillingError::Validation { .. }));

    let bad_currency = UpsertPaymentConfig { currency: "US".to_owned(), ..stripe_req() };
    let err = payments
        .upsert("site:one", PaymentProvider::Stripe, bad_currency, &sealer)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Validation { .. }));

    assert!(payments.list("site:one").await.expect("list").is_empty());
}

#[tokio::test]
async fn delete_removes_one_provider() {
    let payments = repo("billing_delete").await;
    let sealer = sealer();

    payments
        .upsert("site:one", PaymentProvider::Stripe, stripe_req(), &sealer)
        .await
        .expect("stripe");
    let paypal = UpsertPaymentConfig {
        publishable_key: "client-id-2VX".to_owned(),
        secret_key: "paypal-secret-9f8e7d6c".to_owned(),
        mode: PaymentMode::Test,
        currency: "usd".to_owned(),
    };
    payments
        .upsert("site:one", PaymentProvider::Paypal, paypal, &sealer)
        .await
        .expect("paypal");

    let deleted = payments.delete("site:one", PaymentProvider::Stripe).await.expect("delete");
    assert_eq!(deleted.provider, PaymentProvider::Stripe);
    assert!(matches!(
        payments.delete("site:one", PaymentProvider::Stripe).await.unwrap_err(),
        BillingError::NotFound { .. }
    ));

    let remaining = payments.list("site:one").await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].provider, PaymentProvider::Paypal);
}
