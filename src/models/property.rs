use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub rooms: u32,
    pub bathrooms: u32,
    /// Free text, e.g. "120 m²".
    pub area: String,
    pub address: String,
}
