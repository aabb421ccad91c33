#![cfg(feature = "server")]

use fhub_database::Database;
use fhub_domain::blocks::{Block, BlockKind, Container, PageTree, Section, Styles};
use fhub_pages::PagesError;
use fhub_pages::models::{CreatePage, UpdatePage};
use fhub_pages::repository::PageRepository;
use serde_json::json;

async fn repo(db_name: &str) -> PageRepository {
    let db =
        Database::builder().url("mem://").session("fhub", db_name).init().await.expect("db");
    PageRepository::new(db)
}

fn create_req(title: &str, slug: &str, path: &str) -> CreatePage {
    CreatePage {
        title: title.to_owned(),
        slug: slug.to_owned(),
        path: path.to_owned(),
        seo: json!({}),
    }
}

/// One section per id, each holding a single heading block.
fn tree(section_ids: &[&str]) -> PageTree {
    PageTree {
        sections: section_ids
            .iter()
            .map(|id| Section {
                id: (*id).to_owned(),
                label: Some(format!("Section {id}")),
                anchor: None,
                styles: Styles::default(),
                containers: vec![Container {
                    id: format!("{id}-main"),
                    styles: Styles::default(),
                    blocks: vec![Block {
                        id: format!("{id}-heading"),
                        styles: Styles::default(),
                        kind: BlockKind::Heading { text: format!("Hello from {id}"), level: 2 },
                    }],
                }],
            })
            .collect(),
    }
}

fn section_order(tree: &PageTree) -> Vec<&str> {
    tree.sections.iter().map(|s| s.id.as_str()).collect()
}

#[tokio::test]
async fn create_get_list_and_count() {
    let pages = repo("pages_create").await;

    let home = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");
    assert!(home.id.starts_with("page:"));
    assert_eq!(home.site_id, "site:one");
    assert_eq!(home.path, "/");
    assert_eq!(home.version_seq, 0);
    assert!(home.draft.sections.is_empty());
    assert!(home.published.is_none());
    assert!(home.published_at.is_none());

    let about =
        pages.create("site:one", create_req("About", "about", "about/")).await.expect("create");
    assert_eq!(about.path, "/about");

    let fetched = pages.get(&home.id).await.expect("get");
    assert_eq!(fetched, home);
    let bare = home.id.trim_start_matches("page:");
    assert_eq!(pages.get(bare).await.expect("bare get").id, home.id);

    let listed = pages.list("site:one").await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].path, "/");
    assert_eq!(listed[1].path, "/about");
    assert!(pages.list("site:other").await.expect("list").is_empty());

    assert_eq!(pages.count_for_site("site:one").await.expect("count"), 2);
    assert_eq!(pages.count_for_site("site:other").await.expect("count"), 0);
}

#[tokio::test]
async fn slug_and_path_are_unique_per_site() {
    let pages = repo("pages_unique").await;

    pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");

    let err = pages.create("site:one", create_req("Other", "home", "/other")).await.unwrap_err();
    assert!(matches!(err, PagesError::Conflict { .. }));

    // Paths collide after normalization: `//` is the root.
    let err = pages.create("site:one", create_req("Other", "other", "//")).await.unwrap_err();
    assert!(matches!(err, PagesError::Conflict { .. }));

    // A different site is free to reuse both.
    pages.create("site:two", create_req("Home", "home", "/")).await.expect("create");
}

#[tokio::test]
async fn metadata_update_patches_fields() {
    let pages = repo("pages_update").await;

    let home = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");
    pages.create("site:one", create_req("About", "about", "/about")).await.expect("create");

    let patch = UpdatePage { title: Some("Landing".to_owned()), ..UpdatePage::default() };
    let updated = pages.update(&home.id, patch).await.expect("update");
    assert_eq!(updated.title, "Landing");
    assert_eq!(updated.slug, "home");
    assert_eq!(updated.path, "/");
    assert!(updated.updated_at >= home.updated_at);

    let moved = pages
        .update(&home.id, UpdatePage { path: Some("start/".to_owned()), ..UpdatePage::default() })
        .await
        .expect("move");
    assert_eq!(moved.path, "/start");

    // Keeping your own slug is not a conflict; taking a neighbour's is.
    pages
        .update(&home.id, UpdatePage { slug: Some("home".to_owned()), ..UpdatePage::default() })
        .await
        .expect("self slug");
    let err = pages
        .update(&home.id, UpdatePage { slug: Some("about".to_owned()), ..UpdatePage::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, PagesError::Conflict { .. }));

    let patch = UpdatePage { slug: Some("Bad Slug".to_owned()), ..UpdatePage::default() };
    let err = pages.update(&home.id, patch).await.unwrap_err();
    assert!(matches!(err, PagesError::Validation { .. }));

    let err = pages.update("page:ghost", UpdatePage::default()).await.unwrap_err();
    assert!(matches!(err, PagesError::NotFound { .. }));
}

#[tokio::test]
async fn draft_saves_snapshot_the_outgoing_content() {
    let pages = repo("pages_versions").await;
    let page = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");

    let one = pages.save_content(&page.id, tree(&["a"])).await.expect("save");
    assert_eq!(one.version_seq, 1);
    assert_eq!(section_order(&one.draft), ["a"]);

    let two = pages.save_content(&page.id, tree(&["a", "b"])).await.expect("save");
    assert_eq!(two.version_seq, 2);

    let history = pages.list_versions(&page.id).await.expect("history");
    let numbers: Vec<i64> = history.iter().map(|v| v.number).collect();
    assert_eq!(numbers, [2, 1]);

    // Version 1 is the empty draft the first save replaced.
    let first = pages.get_version(&page.id, 1).await.expect("version 1");
    assert!(first.tree.sections.is_empty());
    let second = pages.get_version(&page.id, 2).await.expect("version 2");
    assert_eq!(section_order(&second.tree), ["a"]);

    let err = pages.get_version(&page.id, 99).await.unwrap_err();
    assert!(matches!(err, PagesError::NotFound { .. }));
}

#[tokio::test]
async fn invalid_trees_never_reach_storage() {
    let pages = repo("pages_tree_validation").await;
    let page = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");

    let err = pages.save_content(&page.id, tree(&["a", "a"])).await.unwrap_err();
    assert!(matches!(err, PagesError::Tree { .. }));

    // The failed save neither bumped the counter nor left a snapshot.
    let page = pages.get(&page.id).await.expect("get");
    assert_eq!(page.version_seq, 0);
    assert!(pages.list_versions(&page.id).await.expect("history").is_empty());
}

#[tokio::test]
async fn history_is_capped() {
    let pages = repo("pages_prune").await;
    let page = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");

    for i in 1..=12 {
        let label = format!("rev-{i}");
        pages.save_content(&page.id, tree(&[label.as_str()])).await.expect("save");
    }

    let history = pages.list_versions(&page.id).await.expect("history");
    let numbers: Vec<i64> = history.iter().map(|v| v.number).collect();
    assert_eq!(numbers, (3..=12).rev().collect::<Vec<i64>>());

    assert!(matches!(
        pages.get_version(&page.id, 2).await.unwrap_err(),
        PagesError::NotFound { .. }
    ));
    // Version N holds the draft that save N replaced.
    let oldest = pages.get_version(&page.id, 3).await.expect("version 3");
    assert_eq!(section_order(&oldest.tree), ["rev-2"]);
}

#[tokio::test]
async fn reorder_permutes_without_snapshotting() {
    let pages = repo("pages_reorder").await;
    let page = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");
    pages.save_content(&page.id, tree(&["a", "b", "c"])).await.expect("save");

    let order = ["c".to_owned(), "a".to_owned(), "b".to_owned()];
    let reordered = pages.reorder_sections(&page.id, &order).await.expect("reorder");
    assert_eq!(section_order(&reordered.draft), ["c", "a", "b"]);
    assert_eq!(reordered.version_seq, 1);
    assert_eq!(pages.list_versions(&page.id).await.expect("history").len(), 1);

    // Blocks travel with their section.
    assert_eq!(reordered.draft.sections[0].containers[0].blocks[0].id, "c-heading");

    let short = ["c".to_owned(), "a".to_owned()];
    assert!(matches!(
        pages.reorder_sections(&page.id, &short).await.unwrap_err(),
        PagesError::Validation { .. }
    ));
    let unknown = ["c".to_owned(), "a".to_owned(), "x".to_owned()];
    assert!(matches!(
        pages.reorder_sections(&page.id, &unknown).await.unwrap_err(),
        PagesError::Validation { .. }
    ));
    let doubled = ["c".to_owned(), "c".to_owned(), "a".to_owned()];
    assert!(matches!(
        pages.reorder_sections(&page.id, &doubled).await.unwrap_err(),
        PagesError::Validation { .. }
    ));
}

#[tokio::test]
async fn restore_snapshots_the_draft_it_replaces() {
    let pages = repo("pages_restore").await;
    let page = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");
    pages.save_content(&page.id, tree(&["a"])).await.expect("save");
    pages.save_content(&page.id, tree(&["b"])).await.expect("save");

    // Version 2 holds the `a` draft; restoring it snapshots the `b` draft.
    let restored = pages.restore_version(&page.id, 2).await.expect("restore");
    assert_eq!(section_order(&restored.draft), ["a"]);
    assert_eq!(restored.version_seq, 3);

    let redo = pages.get_version(&page.id, 3).await.expect("version 3");
    assert_eq!(section_order(&redo.tree), ["b"]);

    assert!(matches!(
        pages.restore_version(&page.id, 42).await.unwrap_err(),
        PagesError::NotFound { .. }
    ));
    assert!(matches!(
        pages.restore_version("page:ghost", 1).await.unwrap_err(),
        PagesError::NotFound { .. }
    ));
}

#[tokio::test]
async fn publish_freezes_a_snapshot_for_the_storefront() {
    let pages = repo("pages_publish").await;
    let page = pages
        .create("site:one", create_req("Pricing", "pricing", "/pricing"))
        .await
        .expect("create");
    pages.save_content(&page.id, tree(&["hero"])).await.expect("save");

    assert!(pages.find_published("site:one", "/pricing").await.expect("lookup").is_none());

    let live = pages.publish(&page.id).await.expect("publish");
    let snapshot = live.published.clone().expect("snapshot");
    assert_eq!(section_order(&snapshot.tree), ["hero"]);
    assert!(live.published_at.is_some());

    // Draft edits after publish do not leak to the storefront.
    pages.save_content(&page.id, tree(&["hero", "faq"])).await.expect("save");
    let found = pages
        .find_published("site:one", "pricing/")
        .await
        .expect("lookup")
        .expect("published");
    let view = found.published_view().expect("view");
    assert_eq!(section_order(&view.tree), ["hero"]);
    assert_eq!(view.title, "Pricing");

    // Preview lookup sees the page regardless of publish state.
    let drafted =
        pages.find_by_path("site:one", "/pricing").await.expect("lookup").expect("page");
    assert_eq!(section_order(&drafted.draft_view().tree), ["hero", "faq"]);

    let gone = pages.unpublish(&page.id).await.expect("unpublish");
    assert!(gone.published.is_none());
    assert!(gone.published_at.is_none());
    assert!(pages.find_published("site:one", "/pricing").await.expect("lookup").is_none());
    assert!(pages.find_by_path("site:one", "/pricing").await.expect("lookup").is_some());

    assert!(matches!(pages.publish("page:ghost").await.unwrap_err(), PagesError::NotFound { .. }));
}

#[tokio::test]
async fn delete_drops_the_page_and_its_history() {
    let pages = repo("pages_delete").await;
    let page = pages.create("site:one", create_req("Home", "home", "/")).await.expect("create");
    pages.save_content(&page.id, tree(&["a"])).await.expect("save");
    pages.save_content(&page.id, tree(&["b"])).await.expect("save");

    let deleted = pages.delete(&page.id).await.expect("delete");
    assert_eq!(deleted.id, page.id);
    assert!(matches!(pages.get(&page.id).await.unwrap_err(), PagesError::NotFound { .. }));
    assert!(pages.list_versions(&page.id).await.expect("history").is_empty());
    assert!(matches!(pages.delete(&page.id).await.unwrap_err(), PagesError::NotFound { .. }));

    // Slug and path free up for reuse.
    pages.create("site:one", create_req("Home again", "home", "/")).await.expect("create");
}
