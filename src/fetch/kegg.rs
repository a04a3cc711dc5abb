// src/fetch/kegg.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{parse_cid, PubChem};
use crate::process::lookup::{Attempt, Lookup, Record};

static KEGG_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"kegg\.jp/entry/(\w+)").expect("KEGG link regex should compile"));

/// First KEGG entry id linked from a PUG-View record.
pub fn extract_kegg_id(body: &str) -> Option<String> {
    KEGG_LINK
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl PubChem {
    /// Full PUG-View record for a compound, as raw JSON text.
    pub async fn compound_view(&self, cid: u64) -> Result<String, Attempt> {
        let cid = cid.to_string();
        let url = self.endpoint(&["rest", "pug_view", "data", "compound", &cid, "JSON", ""]);
        let body = self.get_text(url).await?;
        serde_json::from_str::<serde_json::Value>(&body)
            .map_err(|e| Attempt::Terminal(format!("malformed PUG-View response: {e}")))?;
        Ok(body)
    }
}

/// `CID` → KEGG id from PubChem's cross-references.
pub struct KeggByCid {
    pubchem: PubChem,
}

impl KeggByCid {
    pub const COLUMNS: [&'static str; 1] = ["kegg"];

    pub fn new(pubchem: PubChem) -> Self {
        Self { pubchem }
    }
}

#[async_trait]
impl Lookup for KeggByCid {
    fn columns(&self) -> &[&'static str] {
        &Self::COLUMNS
    }

    fn key_column(&self) -> &str {
        "CID"
    }

    async fn lookup(&self, key: &str) -> Attempt {
        let Some(cid) = parse_cid(key) else {
            return Attempt::Terminal(format!("'{key}' is not a CID"));
        };
        match self.pubchem.compound_view(cid).await {
            Ok(body) => match extract_kegg_id(&body) {
                Some(id) => Attempt::Found(Record::new().with("kegg", id)),
                None => Attempt::NotFound,
            },
            Err(attempt) => attempt,
        }
    }
}
