use fhub_domain::config::{ApiConfig, DatabaseConfig, ServerConfig, StorefrontConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4460);
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "fhub");
    assert_eq!(db.database, "core");
    assert!(db.credentials.is_some());

    let api = ApiConfig::default();
    assert_eq!(api.security.jwt.issuer, "fhub");
    assert!(api.security.webhook.signing_secret.starts_with("whsec_"));
    assert_eq!(api.security.preview.ttl_seconds, 1800);
    assert!(api.revalidation.enabled);
    assert_eq!(api.revalidation.targets.len(), 1);
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
        "revalidation": {
            "enabled": false,
            "targets": [{ "base_url": "https://shop.example", "key": "k1" }]
        }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.namespace, "n");
    assert!(!cfg.revalidation.enabled);
    assert_eq!(cfg.revalidation.targets[0].base_url, "https://shop.example");
}

#[test]
fn storefront_defaults_pair_with_api() {
    let cfg = StorefrontConfig::default();
    assert_eq!(cfg.server.port, 4461);
    assert_eq!(cfg.api.base_url, "http://localhost:4460");
    assert_eq!(cfg.cache.capacity, 1024);
    assert_eq!(cfg.revalidate_key, "dev-revalidate-key");
}
