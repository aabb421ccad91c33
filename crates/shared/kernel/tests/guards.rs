use fhub_kernel::domain::capabilities::{Capabilities, Role, Tier};
use fhub_kernel::security::ct_eq;
use fhub_kernel::security::guards::{
    Baseline, FeatureGuard, RoleGuard, TierGuard, explicit_flag, feature_enabled,
};
use serde_json::json;

#[test]
fn dotted_path_requires_exact_true() {
    let features = json!({
        "blog": { "comments": true, "likes": false },
        "truthy_string": "true",
        "numeric": 1,
    });

    assert!(feature_enabled(&features, "blog.comments"));
    assert!(!feature_enabled(&features, "blog.likes"));
    // No coercion: strings and numbers never count as enabled.
    assert!(!feature_enabled(&features, "truthy_string"));
    assert!(!feature_enabled(&features, "numeric"));
    assert!(!feature_enabled(&features, "blog.missing"));
    assert!(!feature_enabled(&features, "blog"));
}

#[test]
fn dotted_path_is_case_sensitive() {
    let features = json!({ "Blog": { "comments": true } });

    assert!(!feature_enabled(&features, "blog.comments"));
    assert!(feature_enabled(&features, "Blog.comments"));
}

#[test]
fn explicit_flag_distinguishes_false_from_missing() {
    let features = json!({ "payments": { "providers": false } });

    assert_eq!(explicit_flag(&features, "payments.providers"), Some(false));
    assert_eq!(explicit_flag(&features, "payments.refunds"), None);
}

#[test]
fn explicit_flag_overrides_tier_in_both_directions() {
    let granted = json!({ "premiumBlocks": true });
    let revoked = json!({ "premiumBlocks": false });
    let silent = json!({});
    let baseline = Baseline::Capability(Capabilities::PREMIUM_BLOCKS);

    // Free tier has no premium blocks, but the explicit flag grants them.
    assert!(FeatureGuard::require(&granted, Tier::Free, "premiumBlocks", baseline).is_ok());
    // Scale tier has everything, but the explicit flag revokes it.
    assert!(FeatureGuard::require(&revoked, Tier::Scale, "premiumBlocks", baseline).is_err());
    // No flag: the tier baseline decides.
    assert!(FeatureGuard::require(&silent, Tier::Free, "premiumBlocks", baseline).is_err());
    assert!(FeatureGuard::require(&silent, Tier::Pro, "premiumBlocks", baseline).is_ok());
}

#[test]
fn min_tier_baseline() {
    let silent = json!({});
    let baseline = Baseline::MinTier(Tier::Pro);

    assert!(FeatureGuard::require(&silent, Tier::Starter, "payments.providers", baseline).is_err());
    assert!(FeatureGuard::require(&silent, Tier::Pro, "payments.providers", baseline).is_ok());
    assert!(FeatureGuard::require(&silent, Tier::Scale, "payments.providers", baseline).is_ok());
}

#[test]
fn denied_baseline_requires_explicit_flag() {
    let silent = json!({});
    let granted = json!({ "labs": { "ai": true } });

    assert!(FeatureGuard::require(&silent, Tier::Scale, "labs.ai", Baseline::Denied).is_err());
    assert!(FeatureGuard::require(&granted, Tier::Free, "labs.ai", Baseline::Denied).is_ok());
}

#[test]
fn tier_ladder_ordering() {
    assert!(TierGuard::require_at_least(Tier::Pro, Tier::Starter).is_ok());
    assert!(TierGuard::require_at_least(Tier::Pro, Tier::Pro).is_ok());
    assert!(TierGuard::require_at_least(Tier::Starter, Tier::Pro).is_err());
    assert!(TierGuard::require_at_least(Tier::Free, Tier::Scale).is_err());
}

#[test]
fn role_ladder_ordering() {
    assert!(RoleGuard::require(Some(Role::Owner), Role::Admin).is_ok());
    assert!(RoleGuard::require(Some(Role::Editor), Role::Editor).is_ok());
    assert!(RoleGuard::require(Some(Role::Viewer), Role::Editor).is_err());
}

#[test]
fn missing_membership_is_denied() {
    assert!(RoleGuard::require(None, Role::Viewer).is_err());
}

#[test]
fn constant_time_compare() {
    assert!(ct_eq("secret", "secret"));
    assert!(!ct_eq("secret", "Secret"));
    assert!(!ct_eq("secret", "secret-but-longer"));
    assert!(!ct_eq("", "x"));
    assert!(ct_eq("", ""));
}
