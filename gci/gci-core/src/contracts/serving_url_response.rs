use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingUrlResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_url: Option<String>,
}

impl ServingUrlResponse {
    pub fn ok(serving_url: impl Into<String>) -> Self {
        Self {
            success: true,
            serving_url: Some(serving_url.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            serving_url: None,
        }
    }
}
