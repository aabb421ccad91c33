use fhub_kernel::security::resource::ResourceGuard;

#[test]
fn resource_guard_validates_and_prefixes() {
    assert_eq!(ResourceGuard::verify("page:123", "page").unwrap(), "page:123");

    assert_eq!(ResourceGuard::verify("123", "page").unwrap(), "page:123");

    assert!(ResourceGuard::verify("site:123", "page").is_err());
}
