//! Shared string constants and product limits.

// OpenAPI tags
pub const SYSTEM_TAG: &str = "System";
pub const TENANCY_TAG: &str = "Tenancy";
pub const IDENTITY_TAG: &str = "Identity";
pub const PAGES_TAG: &str = "Pages";
pub const CONTENT_TAG: &str = "Content";
pub const BILLING_TAG: &str = "Billing";
pub const PUBLISHING_TAG: &str = "Publishing";

// Entity table names
pub const SITE: &str = "site";
pub const USER: &str = "user";
pub const MEMBERSHIP: &str = "membership";
pub const PAGE: &str = "page";
pub const PAGE_VERSION: &str = "page_version";
pub const POST: &str = "post";
pub const MENU: &str = "menu";
pub const LAYOUT: &str = "layout";
pub const PAYMENT_CONFIG: &str = "payment_config";

// Capability flag names
pub const CUSTOM_DOMAINS: &str = "custom_domains";
pub const REMOVE_BRANDING: &str = "remove_branding";
pub const VERSION_HISTORY: &str = "version_history";
pub const PREMIUM_BLOCKS: &str = "premium_blocks";
pub const AB_TESTING: &str = "ab_testing";
pub const API_ACCESS: &str = "api_access";
pub const UNLIMITED_PAGES: &str = "unlimited_pages";
pub const DEDICATED_SUPPORT: &str = "dedicated_support";

/// Feature flag gating payment-provider configuration.
pub const PAYMENT_PROVIDERS: &str = "payments.providers";

/// Upper viewport widths (px) for the two override breakpoints.
pub const TABLET_MAX_WIDTH: u32 = 1024;
pub const MOBILE_MAX_WIDTH: u32 = 640;

/// Newest snapshots kept per page; older ones are pruned on save.
pub const MAX_VERSIONS: usize = 10;

/// Pages per site for plans without the `unlimited_pages` capability.
pub const BASELINE_PAGE_LIMIT: usize = 20;

/// Draft-mode cookie carrying the preview token.
pub const PREVIEW_COOKIE: &str = "fhub_preview";

/// Shared-secret header for storefront cache revalidation.
pub const REVALIDATE_HEADER: &str = "x-revalidate-key";
