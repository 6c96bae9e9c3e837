use serde::Serialize;

/// Deep links into a block explorer (BaseScan-compatible URL scheme).
#[derive(Debug, Clone)]
pub struct Explorer {
    base_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerLink {
    pub label: String,
    pub url: String,
}

impl Explorer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn tx_link(&self, hash: &str) -> ExplorerLink {
        ExplorerLink {
            label: format!("Transaction {}", short_hash(hash)),
            url: format!("{}/tx/{hash}", self.base_url),
        }
    }

    pub fn address_link(&self, address: &str) -> ExplorerLink {
        ExplorerLink {
            label: format!("Address {}", short_hash(address)),
            url: format!("{}/address/{address}", self.base_url),
        }
    }

    pub fn token_link(&self, contract: &str, token_id: u64) -> ExplorerLink {
        ExplorerLink {
            label: format!("Token #{token_id}"),
            url: format!("{}/token/{contract}?a={token_id}", self.base_url),
        }
    }
}

fn short_hash(value: &str) -> String {
    if value.len() <= 12 {
        value.to_string()
    } else {
        format!("{}…{}", &value[..8], &value[value.len() - 4..])
    }
}
