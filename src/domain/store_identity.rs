use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_NAME: &str = "AS Mart";

/// Store name and contact details stamped onto orders when they are synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreIdentity {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl Default for StoreIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            phone: String::new(),
            address: String::new(),
        }
    }
}

impl StoreIdentity {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            address: address.into(),
        }
    }
}
