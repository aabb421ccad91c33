use fhub_derive::api_model;

#[api_model]
pub struct SiteSummary {
    pub id: String,
    pub display_name: String,
}

#[api_model(rename_all = "snake_case", deny_unknown_fields = false)]
pub struct LooseSummary {
    pub id: String,
    pub site_name: String,
}

#[api_model(tag = "type")]
pub enum DemoPayload {
    Heading { text: String, level: u8 },
    Divider {},
}

#[api_model]
pub enum DemoTier {
    Free,
    Starter,
}

fn main() {}
