use serde::{Deserialize, Serialize};

/// Who is calling, on behalf of which contract, and the state they observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationContext {
    /// Authenticated identity of the caller
    pub originator_id: String,

    /// Identifier of the acting contract
    pub contract_id: String,

    /// Hash of the contract state immediately before this call.
    /// Only ledger-gated operations look at it.
    #[serde(default, with = "hex_bytes")]
    pub state_hash: Vec<u8>,
}

impl InvocationContext {
    pub fn new(originator_id: impl Into<String>, contract_id: impl Into<String>) -> Self {
        Self {
            originator_id: originator_id.into(),
            contract_id: contract_id.into(),
            state_hash: Vec::new(),
        }
    }

    pub fn with_state_hash(mut self, state_hash: impl AsRef<[u8]>) -> Self {
        self.state_hash = state_hash.as_ref().to_vec();
        self
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}
