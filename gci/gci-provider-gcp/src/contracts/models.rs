use serde::{Serialize, Deserialize};

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GoogleAccessToken {
    pub access_token:String,
    #[serde(default = "bearer")]
    pub token_type:String,
    pub expires_in:u64
}

fn bearer() -> String {
    "Bearer".to_string()
}

/// Claims of the self-signed assertion exchanged for an access token.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct JwtBearerClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// `{"error": {"code": 403, "message": "..."}}` as returned by Google JSON APIs.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GoogleErrorResponse {
    pub error: GoogleError,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GoogleError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Subset of the Cloud Storage object resource.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GcsObject {
    pub bucket: String,
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Decimal string, as the JSON API sends it.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImagesServingUrlRequest {
    pub blob_key: String,
    pub secure_url: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ImagesServingUrlResponse {
    pub url: String,
}
