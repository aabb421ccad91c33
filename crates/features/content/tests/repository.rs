#![cfg(feature = "server")]

use fhub_content::ContentError;
use fhub_content::models::{
    CreatePost, LayoutKind, MenuItem, UpdatePost, UpsertLayout, UpsertMenu,
};
use fhub_content::repository::{LayoutRepository, MenuRepository, PostRepository};
use fhub_database::Database;
use fhub_domain::blocks::{Section, Styles};

async fn db(db_name: &str) -> Database {
    Database::builder().url("mem://").session("fhub", db_name).init().await.expect("db")
}

fn post_req(title: &str, slug: &str, tags: &[&str]) -> CreatePost {
    CreatePost {
        title: title.to_owned(),
        slug: slug.to_owned(),
        markdown: format!("# {title}"),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        cover_image: None,
    }
}

fn item(label: &str, href: &str) -> MenuItem {
    MenuItem { label: label.to_owned(), href: href.to_owned(), children: Vec::new() }
}

fn section(id: &str) -> Section {
    Section {
        id: id.to_owned(),
        label: None,
        anchor: None,
        styles: Styles::default(),
        containers: Vec::new(),
    }
}

#[tokio::test]
async fn post_create_list_and_tag_filter() {
    let posts = PostRepository::new(db("content_posts").await);

    let intro = posts
        .create("site:alpha", post_req("Intro", "intro", &["news"]))
        .await
        .expect("create");
    assert!(intro.id.starts_with("post:"));
    assert_eq!(intro.site_id, "site:alpha");
    assert!(!intro.published);
    assert!(intro.published_at.is_none());
    assert_eq!(intro.tags, vec!["news"]);

    posts
        .create("site:alpha", post_req("Launch", "launch", &["news", "product"]))
        .await
        .expect("create");
    posts.create("site:alpha", post_req("Recap", "recap", &[])).await.expect("create");
    posts.create("site:beta", post_req("Other", "intro", &["news"])).await.expect("create");

    let all = posts.list("site:alpha", None).await.expect("list");
    let slugs: Vec<&str> = all.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["recap", "launch", "intro"], "newest first");
    assert_eq!(posts.list("site:beta", None).await.expect("list").len(), 1);

    let news = posts.list("site:alpha", Some("news")).await.expect("list");
    let slugs: Vec<&str> = news.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["launch", "intro"]);
    assert!(posts.list("site:alpha", Some("nope")).await.expect("list").is_empty());

    let loaded = posts.get(&intro.id).await.expect("get");
    assert_eq!(loaded.markdown, "# Intro");
}

#[tokio::test]
async fn post_slugs_are_unique_per_site() {
    let posts = PostRepository::new(db("content_post_slugs").await);

    let first = posts.create("site:one", post_req("First", "hello", &[])).await.expect("create");
    let second = posts.create("site:one", post_req("Second", "world", &[])).await.expect("create");

    let err = posts.create("site:one", post_req("Dup", "hello", &[])).await.unwrap_err();
    assert!(matches!(err, ContentError::Conflict { .. }));
    posts.create("site:two", post_req("Elsewhere", "hello", &[])).await.expect("other site");

    let err = posts.create("site:one", post_req("Bad", "Bad Slug", &[])).await.unwrap_err();
    assert!(matches!(err, ContentError::Validation { .. }));

    // Keeping your own slug is fine; taking a neighbour's is not.
    let same = UpdatePost { slug: Some("hello".to_owned()), ..UpdatePost::default() };
    posts.update(&first.id, same).await.expect("self slug");
    let stolen = UpdatePost { slug: Some("hello".to_owned()), ..UpdatePost::default() };
    let err = posts.update(&second.id, stolen).await.unwrap_err();
    assert!(matches!(err, ContentError::Conflict { .. }));

    let err = posts.update("post:ghost", UpdatePost::default()).await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound { .. }));
}

#[tokio::test]
async fn post_update_patches_and_clears_cover() {
    let posts = PostRepository::new(db("content_post_update").await);
    let post = posts.create("site:one", post_req("Draft", "draft", &["a"])).await.expect("create");

    let patch = UpdatePost {
        markdown: Some("updated body".to_owned()),
        cover_image: Some("https://cdn.example.com/cover.png".to_owned()),
        ..UpdatePost::default()
    };
    let post = posts.update(&post.id, patch).await.expect("update");
    assert_eq!(post.markdown, "updated body");
    assert_eq!(post.cover_image.as_deref(), Some("https://cdn.example.com/cover.png"));
    assert_eq!(post.title, "Draft", "untouched fields survive");
    assert_eq!(post.tags, vec!["a"]);

    // An absent cover leaves the image alone; an empty string clears it.
    let post = posts
        .update(&post.id, UpdatePost { tags: Some(vec![]), ..UpdatePost::default() })
        .await
        .expect("update");
    assert!(post.cover_image.is_some());
    assert!(post.tags.is_empty());

    let clear = UpdatePost { cover_image: Some(String::new()), ..UpdatePost::default() };
    let post = posts.update(&post.id, clear).await.expect("update");
    assert!(post.cover_image.is_none());
}

#[tokio::test]
async fn post_publish_keeps_the_first_publish_date() {
    let posts = PostRepository::new(db("content_post_publish").await);
    let post = posts.create("site:one", post_req("News", "news", &[])).await.expect("create");

    let published = posts.publish(&post.id).await.expect("publish");
    assert!(published.published);
    let first_date = published.published_at.expect("publish date set");

    let hidden = posts.unpublish(&post.id).await.expect("unpublish");
    assert!(!hidden.published);
    assert_eq!(hidden.published_at, Some(first_date), "date survives unpublish");

    let again = posts.publish(&post.id).await.expect("republish");
    assert_eq!(again.published_at, Some(first_date), "date survives republish");

    let err = posts.publish("post:ghost").await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound { .. }));
}

#[tokio::test]
async fn post_delete_frees_the_slug() {
    let posts = PostRepository::new(db("content_post_delete").await);
    let post = posts.create("site:one", post_req("Gone", "gone", &[])).await.expect("create");

    let deleted = posts.delete(&post.id).await.expect("delete");
    assert_eq!(deleted.id, post.id);
    assert!(matches!(posts.get(&post.id).await.unwrap_err(), ContentError::NotFound { .. }));
    assert!(matches!(posts.delete(&post.id).await.unwrap_err(), ContentError::NotFound { .. }));

    posts.create("site:one", post_req("Back", "gone", &[])).await.expect("slug is free again");
}

#[tokio::test]
async fn menus_upsert_replace_and_delete() {
    let menus = MenuRepository::new(db("content_menus").await);

    let req = UpsertMenu {
        items: vec![item("Home", "/"), MenuItem {
            children: vec![item("Pricing", "/pricing")],
            ..item("More", "/more")
        }],
    };
    let menu = menus.upsert("site:one", "main", req).await.expect("upsert");
    assert_eq!(menu.site_id, "site:one");
    assert_eq!(menu.key, "main");
    assert_eq!(menu.items.len(), 2);
    assert_eq!(menu.items[1].children[0].label, "Pricing");

    // A second upsert replaces the items but keeps the creation date.
    let replaced = menus
        .upsert("site:one", "main", UpsertMenu { items: vec![item("Only", "/only")] })
        .await
        .expect("replace");
    assert_eq!(replaced.items.len(), 1);
    assert_eq!(replaced.created_at, menu.created_at);

    menus
        .upsert("site:one", "footer", UpsertMenu { items: vec![] })
        .await
        .expect("second menu");
    let all = menus.list("site:one").await.expect("list");
    let keys: Vec<&str> = all.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, vec!["footer", "main"]);

    let fetched = menus.get("site:one", "main").await.expect("get");
    assert_eq!(fetched.items[0].label, "Only");
    assert!(matches!(
        menus.get("site:one", "missing").await.unwrap_err(),
        ContentError::NotFound { .. }
    ));

    let deleted = menus.delete("site:one", "footer").await.expect("delete");
    assert_eq!(deleted.key, "footer");
    assert!(matches!(
        menus.delete("site:one", "footer").await.unwrap_err(),
        ContentError::NotFound { .. }
    ));
    assert_eq!(menus.list("site:one").await.expect("list").len(), 1);
}

#[tokio::test]
async fn menus_reject_bad_keys_and_shapes() {
    let menus = MenuRepository::new(db("content_menu_limits").await);

    let err =
        menus.upsert("site:one", "Main Menu", UpsertMenu { items: vec![] }).await.unwrap_err();
    assert!(matches!(err, ContentError::Validation { .. }));

    // Six levels of nesting is one past the cap.
    let mut nested = item("leaf", "/leaf");
    for depth in (1..=5).rev() {
        nested = MenuItem { children: vec![nested], ..item("level", &format!("/l{depth}")) };
    }
    let err =
        menus.upsert("site:one", "main", UpsertMenu { items: vec![nested] }).await.unwrap_err();
    assert!(matches!(err, ContentError::Validation { .. }));

    let blank = UpsertMenu { items: vec![item("", "/nowhere")] };
    let err = menus.upsert("site:one", "main", blank).await.unwrap_err();
    assert!(matches!(err, ContentError::Validation { .. }));
}

#[tokio::test]
async fn layouts_are_singletons_per_kind() {
    let layouts = LayoutRepository::new(db("content_layouts").await);

    let header = layouts
        .upsert("site:one", LayoutKind::Header, UpsertLayout {
            sections: vec![section("nav"), section("banner")],
        })
        .await
        .expect("upsert header");
    assert_eq!(header.kind, LayoutKind::Header);
    assert_eq!(header.sections.len(), 2);

    let footer = layouts
        .upsert("site:one", LayoutKind::Footer, UpsertLayout { sections: vec![section("legal")] })
        .await
        .expect("upsert footer");
    assert_eq!(footer.kind, LayoutKind::Footer);

    // Replacing the header leaves the footer alone.
    let replaced = layouts
        .upsert("site:one", LayoutKind::Header, UpsertLayout { sections: vec![section("nav")] })
        .await
        .expect("replace");
    assert_eq!(replaced.sections.len(), 1);
    assert_eq!(replaced.created_at, header.created_at);
    let footer = layouts.get("site:one", LayoutKind::Footer).await.expect("get footer");
    assert_eq!(footer.sections[0].id, "legal");

    let err = layouts.get("site:two", LayoutKind::Header).await.unwrap_err();
    assert!(matches!(err, ContentError::NotFound { .. }));

    let deleted = layouts.delete("site:one", LayoutKind::Footer).await.expect("delete");
    assert_eq!(deleted.kind, LayoutKind::Footer);
    assert!(matches!(
        layouts.delete("site:one", LayoutKind::Footer).await.unwrap_err(),
        ContentError::NotFound { .. }
    ));
}

#[tokio::test]
async fn layout_sections_are_validated_as_a_tree() {
    let layouts = LayoutRepository::new(db("content_layout_tree").await);

    let dup = UpsertLayout { sections: vec![section("nav"), section("nav")] };
    let err = layouts.upsert("site:one", LayoutKind::Header, dup).await.unwrap_err();
    assert!(matches!(err, ContentError::Tree { .. }));

    let blank = UpsertLayout { sections: vec![section("")] };
    let err = layouts.upsert("site:one", LayoutKind::Header, blank).await.unwrap_err();
    assert!(matches!(err, ContentError::Tree { .. }));
}
