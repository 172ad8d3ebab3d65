use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
}

impl ServiceAccountResponse {
    pub fn ok(service_account: impl Into<String>) -> Self {
        Self {
            success: true,
            service_account: Some(service_account.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            service_account: None,
        }
    }
}
