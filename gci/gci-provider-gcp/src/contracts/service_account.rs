use std::path::Path;

use serde::{Serialize, Deserialize};

/// The parts of a service-account key file we need.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceAccount {
    pub private_key: String,
    pub client_email: String,
}

impl ServiceAccount {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read Service Account file {}: {}", path.display(), e))?;
        let sa: ServiceAccount = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse Service Account file {}: {}", path.display(), e))?;
        Ok(sa)
    }
}
