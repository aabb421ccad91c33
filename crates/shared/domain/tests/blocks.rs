use fhub_domain::blocks::{
    Block, BlockKind, Breakpoint, Container, PageTree, Section, StyleProps, Styles, TreeError,
    TreeLimits,
};
use serde_json::json;

fn block(id: &str, kind: BlockKind) -> Block {
    Block { id: id.to_owned(), styles: Styles::default(), kind }
}

fn single_container_tree(blocks: Vec<Block>) -> PageTree {
    PageTree {
        sections: vec![Section {
            id: "s1".to_owned(),
            label: None,
            anchor: None,
            styles: Styles::default(),
            containers: vec![Container { id: "c1".to_owned(), styles: Styles::default(), blocks }],
        }],
    }
}

#[test]
fn tree_serializes_with_type_tags() {
    let tree = single_container_tree(vec![
        block("b1", BlockKind::Heading { text: "Welcome".to_owned(), level: 1 }),
        block("b2", BlockKind::Spacer { height: 24 }),
    ]);

    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(
        value,
        json!({
            "sections": [{
                "id": "s1",
                "styles": { "desktop": {} },
                "containers": [{
                    "id": "c1",
                    "styles": { "desktop": {} },
                    "blocks": [
                        {
                            "id": "b1",
                            "styles": { "desktop": {} },
                            "kind": { "type": "heading", "text": "Welcome", "level": 1 }
                        },
                        {
                            "id": "b2",
                            "styles": { "desktop": {} },
                            "kind": { "type": "spacer", "height": 24 }
                        },
                    ]
                }]
            }]
        })
    );

    let parsed: PageTree = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, tree);
}

#[test]
fn unknown_style_fields_are_rejected() {
    let raw = json!({ "desktop": { "zIndex": "5" } });
    let parsed: Result<Styles, _> = serde_json::from_value(raw);
    assert!(parsed.is_err());
}

#[test]
fn heading_level_defaults_to_two() {
    let raw = json!({ "type": "heading", "text": "T" });
    let kind: BlockKind = serde_json::from_value(raw).unwrap();
    assert!(matches!(kind, BlockKind::Heading { level: 2, .. }));
}

#[test]
fn empty_tree_is_valid() {
    PageTree::default().validate(&TreeLimits::default()).unwrap();
}

#[test]
fn duplicate_ids_are_rejected() {
    let tree = single_container_tree(vec![
        block("dup", BlockKind::Divider {}),
        block("dup", BlockKind::Divider {}),
    ]);
    let err = tree.validate(&TreeLimits::default()).unwrap_err();
    assert_eq!(err, TreeError::DuplicateId { id: "dup".to_owned() });
}

#[test]
fn empty_ids_are_rejected() {
    let tree = single_container_tree(vec![block("", BlockKind::Divider {})]);
    assert_eq!(tree.validate(&TreeLimits::default()).unwrap_err(), TreeError::EmptyId);
}

#[test]
fn heading_level_is_range_checked() {
    let tree = single_container_tree(vec![block(
        "h",
        BlockKind::Heading { text: "T".to_owned(), level: 7 },
    )]);
    let err = tree.validate(&TreeLimits::default()).unwrap_err();
    assert_eq!(err, TreeError::HeadingLevel { id: "h".to_owned(), level: 7 });
}

#[test]
fn grid_columns_are_range_checked() {
    let tree = single_container_tree(vec![block(
        "g",
        BlockKind::Grid { columns: 13, blocks: vec![] },
    )]);
    let err = tree.validate(&TreeLimits::default()).unwrap_err();
    assert_eq!(err, TreeError::GridColumns { id: "g".to_owned(), columns: 13 });
}

#[test]
fn grid_nesting_depth_is_capped() {
    let limits = TreeLimits { max_grid_depth: 2, ..TreeLimits::default() };
    let nested = block(
        "g1",
        BlockKind::Grid {
            columns: 2,
            blocks: vec![block(
                "g2",
                BlockKind::Grid {
                    columns: 2,
                    blocks: vec![block("g3", BlockKind::Grid { columns: 2, blocks: vec![] })],
                },
            )],
        },
    );
    let err = single_container_tree(vec![nested]).validate(&limits).unwrap_err();
    assert_eq!(err, TreeError::GridTooDeep { id: "g3".to_owned(), limit: 2 });
}

#[test]
fn section_count_is_limited() {
    let limits = TreeLimits { max_sections: 1, ..TreeLimits::default() };
    let tree = PageTree {
        sections: vec![
            Section {
                id: "s1".to_owned(),
                label: None,
                anchor: None,
                styles: Styles::default(),
                containers: vec![],
            },
            Section {
                id: "s2".to_owned(),
                label: None,
                anchor: None,
                styles: Styles::default(),
                containers: vec![],
            },
        ],
    };
    let err = tree.validate(&limits).unwrap_err();
    assert_eq!(err, TreeError::TooManySections { count: 2, limit: 1 });
}

#[test]
fn collect_ids_walks_grid_children() {
    let tree = single_container_tree(vec![block(
        "g",
        BlockKind::Grid { columns: 2, blocks: vec![block("inner", BlockKind::Divider {})] },
    )]);
    assert_eq!(tree.collect_ids(), vec!["s1", "c1", "g", "inner"]);
}

#[test]
fn find_block_reaches_nested_grids() {
    let tree = single_container_tree(vec![block(
        "g",
        BlockKind::Grid {
            columns: 2,
            blocks: vec![block("deep", BlockKind::Spacer { height: 8 })],
        },
    )]);
    let found = tree.find_block("deep").unwrap();
    assert!(matches!(found.kind, BlockKind::Spacer { height: 8 }));
    assert!(tree.find_block("missing").is_none());
}

#[test]
fn style_cascade_resolves_per_breakpoint() {
    let styles = Styles {
        desktop: StyleProps {
            gap: Some("24px".to_owned()),
            color: Some("#111".to_owned()),
            ..StyleProps::default()
        },
        tablet: Some(StyleProps { gap: Some("16px".to_owned()), ..StyleProps::default() }),
        mobile: Some(StyleProps { color: Some("#222".to_owned()), ..StyleProps::default() }),
    };

    let desktop = styles.resolve(Breakpoint::Desktop);
    assert_eq!(desktop.gap.as_deref(), Some("24px"));

    let tablet = styles.resolve(Breakpoint::Tablet);
    assert_eq!(tablet.gap.as_deref(), Some("16px"));
    assert_eq!(tablet.color.as_deref(), Some("#111"));

    // Mobile keeps the tablet gap override and applies its own color.
    let mobile = styles.resolve(Breakpoint::Mobile);
    assert_eq!(mobile.gap.as_deref(), Some("16px"));
    assert_eq!(mobile.color.as_deref(), Some("#222"));
}
