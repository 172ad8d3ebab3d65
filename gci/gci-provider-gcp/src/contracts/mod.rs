pub mod service_account;
pub use service_account::ServiceAccount;

pub mod models;
pub use models::{
    GoogleAccessToken,
    JwtBearerClaims,
    GoogleErrorResponse,
    GcsObject,
    ImagesServingUrlRequest,
    ImagesServingUrlResponse
};
