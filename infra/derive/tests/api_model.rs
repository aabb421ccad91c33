use fhub_derive::api_model;
use serde_json::json;

#[api_model]
#[derive(Clone, PartialEq)]
pub struct SiteMeta {
    pub site_id: String,
    pub page_count: u32,
}

#[api_model(tag = "type")]
#[derive(Clone, PartialEq)]
pub enum Node {
    Heading { text: String, level: u8 },
    RichGrid { column_count: u8, children: Vec<Node> },
    Divider {},
}

#[api_model]
#[derive(Clone, Copy, PartialEq)]
pub enum DemoTier {
    Free,
    ScaleUp,
}

#[test]
fn struct_fields_are_camel_case() {
    let meta = SiteMeta { site_id: "s1".to_owned(), page_count: 3 };
    let value = serde_json::to_value(&meta).unwrap();
    assert_eq!(value, json!({ "siteId": "s1", "pageCount": 3 }));
}

#[test]
fn struct_rejects_unknown_fields() {
    let raw = r#"{ "siteId": "s1", "pageCount": 3, "extra": true }"#;
    let result: Result<SiteMeta, _> = serde_json::from_str(raw);
    assert!(result.is_err());
}

#[test]
fn tagged_enum_uses_camel_case_tags() {
    let node = Node::RichGrid {
        column_count: 2,
        children: vec![Node::Heading { text: "Hi".to_owned(), level: 1 }, Node::Divider {}],
    };
    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "richGrid",
            "columnCount": 2,
            "children": [
                { "type": "heading", "text": "Hi", "level": 1 },
                { "type": "divider" },
            ],
        })
    );

    let parsed: Node = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, node);
}

#[test]
fn unit_enum_variants_are_camel_case() {
    assert_eq!(serde_json::to_value(DemoTier::ScaleUp).unwrap(), json!("scaleUp"));
    let parsed: DemoTier = serde_json::from_value(json!("free")).unwrap();
    assert_eq!(parsed, DemoTier::Free);
}
