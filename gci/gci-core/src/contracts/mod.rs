pub mod gcs_path;
pub use gcs_path::GcsPath;

pub mod blob_key;
pub use blob_key::{BlobKey, ServingUrlOptions};

pub mod serving_url_response;
pub use serving_url_response::ServingUrlResponse;

pub mod service_account_response;
pub use service_account_response::ServiceAccountResponse;
