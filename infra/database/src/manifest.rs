use crate::migrations::Migration;

/// SurrealQL scripts shipped by the workspace slices, in application order.
///
/// The engine bootstrap runs first: it defines the bookkeeping tables and
/// the `fn::ensure_slice` / `fn::confirm_migration` helpers every other
/// script relies on. Tenancy precedes the slices that link records to
/// `site`, honoring the `depends_on` declarations in each slice manifest.
pub(crate) fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            "engine",
            "Engine",
            Some("Migration bookkeeping tables and helper functions"),
            "0001",
            include_str!("../migrations/0001_bootstrap.surql"),
            true,
        ),
        Migration::new(
            "tenancy",
            "Tenancy",
            Some("Sites with hosts, tiers, and feature flags"),
            "0001",
            include_str!("../../../crates/features/tenancy/migrations/0001_sites.surql"),
            false,
        ),
        Migration::new(
            "identity",
            "Identity",
            Some("Mirrored users and per-site memberships"),
            "0001",
            include_str!("../../../crates/features/identity/migrations/0001_identities.surql"),
            false,
        ),
        Migration::new(
            "pages",
            "Pages",
            Some("Pages, published snapshots, and version history"),
            "0001",
            include_str!("../../../crates/features/pages/migrations/0001_pages.surql"),
            false,
        ),
        Migration::new(
            "content",
            "Content",
            Some("Posts, menus, and header/footer layouts"),
            "0001",
            include_str!("../../../crates/features/content/migrations/0001_content.surql"),
            false,
        ),
        Migration::new(
            "billing",
            "Billing",
            Some("Payment provider configuration with sealed secrets"),
            "0001",
            include_str!("../../../crates/features/billing/migrations/0001_billing.surql"),
            false,
        ),
    ]
}
