// src/fetch/pubchem.rs

use async_trait::async_trait;
use reqwest::Request;
use serde::Deserialize;
use tracing::debug;

use super::PubChem;
use crate::process::lookup::{Attempt, Lookup, Record};

/// Properties requested for a name search. `IsomericSMILES` is the legacy
/// name; newer responses carry `SMILES`.
const NAME_PROPERTIES: &str = "SMILES,IsomericSMILES,InChI,InChIKey,IUPACName";

/// Exports from the instrument software leak their header row as a key.
const PLACEHOLDER_MARKER: &str = "Analyte";

#[derive(Debug, Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    table: PropertyTable,
}

#[derive(Debug, Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<Properties>,
}

/// One compound's properties from a PUG-REST property query.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Properties {
    #[serde(rename = "CID")]
    pub cid: u64,
    #[serde(rename = "SMILES", default)]
    pub smiles: Option<String>,
    #[serde(rename = "IsomericSMILES", default)]
    pub isomeric_smiles: Option<String>,
    #[serde(rename = "InChI", default)]
    pub inchi: Option<String>,
    #[serde(rename = "InChIKey", default)]
    pub inchikey: Option<String>,
    #[serde(rename = "IUPACName", default)]
    pub iupac_name: Option<String>,
}

impl Properties {
    pub fn smiles(&self) -> &str {
        non_empty(&self.smiles)
            .or_else(|| non_empty(&self.isomeric_smiles))
            .unwrap_or_default()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct SynonymResponse {
    #[serde(rename = "InformationList")]
    list: InformationList,
}

#[derive(Debug, Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<Information>,
}

#[derive(Debug, Deserialize)]
struct Information {
    #[serde(rename = "Synonym", default)]
    synonyms: Vec<String>,
}

/// First compound of a property response, `NotFound` when there is none.
pub fn parse_properties(body: &str) -> Result<Properties, Attempt> {
    let resp: PropertyResponse = serde_json::from_str(body)
        .map_err(|e| Attempt::Terminal(format!("malformed property response: {e}")))?;
    resp.table
        .properties
        .into_iter()
        .next()
        .ok_or(Attempt::NotFound)
}

pub fn parse_synonyms(body: &str) -> Result<Vec<String>, Attempt> {
    let resp: SynonymResponse = serde_json::from_str(body)
        .map_err(|e| Attempt::Terminal(format!("malformed synonym response: {e}")))?;
    Ok(resp
        .list
        .information
        .into_iter()
        .flat_map(|info| info.synonyms)
        .collect())
}

impl PubChem {
    /// Name search request. The name travels in the form body so that
    /// slashes and other reserved characters survive.
    pub(crate) fn name_property_request(&self, name: &str) -> Result<Request, Attempt> {
        let url = self.endpoint(&[
            "rest",
            "pug",
            "compound",
            "name",
            "property",
            NAME_PROPERTIES,
            "JSON",
        ]);
        self.post_form(url, &[("name", name)])
    }

    /// Best match for a compound name.
    pub async fn properties_by_name(&self, name: &str) -> Result<Properties, Attempt> {
        let request = self.name_property_request(name)?;
        parse_properties(&self.execute_text(request).await?)
    }

    pub async fn synonyms(&self, cid: u64) -> Result<Vec<String>, Attempt> {
        let cid = cid.to_string();
        let url = self.endpoint(&["rest", "pug", "compound", "cid", &cid, "synonyms", "JSON"]);
        parse_synonyms(&self.get_text(url).await?)
    }
}

/// `Compound` → SMILES, InChI and a human-readable full name.
pub struct CompoundByName {
    pubchem: PubChem,
}

impl CompoundByName {
    pub const COLUMNS: [&'static str; 3] = ["SMILES", "InChI", "Full Name"];

    pub fn new(pubchem: PubChem) -> Self {
        Self { pubchem }
    }

    /// IUPAC name, else the first synonym. A failed synonym fetch only costs
    /// the full name, not the row.
    async fn full_name(&self, props: &Properties) -> Option<String> {
        if let Some(name) = non_empty(&props.iupac_name) {
            return Some(name.to_string());
        }
        match self.pubchem.synonyms(props.cid).await {
            Ok(synonyms) => synonyms.into_iter().next(),
            Err(attempt) => {
                debug!(cid = props.cid, ?attempt, "no synonyms");
                None
            }
        }
    }
}

#[async_trait]
impl Lookup for CompoundByName {
    fn columns(&self) -> &[&'static str] {
        &Self::COLUMNS
    }

    fn key_column(&self) -> &str {
        "Compound"
    }

    fn is_placeholder(&self, key: &str) -> bool {
        key.contains(PLACEHOLDER_MARKER)
    }

    async fn lookup(&self, key: &str) -> Attempt {
        let props = match self.pubchem.properties_by_name(key).await {
            Ok(props) => props,
            Err(attempt) => return attempt,
        };
        let full_name = self.full_name(&props).await.unwrap_or_default();

        Attempt::Found(
            Record::new()
                .with("SMILES", props.smiles())
                .with("InChI", props.inchi.clone().unwrap_or_default())
                .with("Full Name", full_name),
        )
    }
}

/// Headerless name list → CID, SMILES and InChIKey.
pub struct IdentifiersByName {
    pubchem: PubChem,
    key_column: String,
}

impl IdentifiersByName {
    pub const COLUMNS: [&'static str; 3] = ["CID", "SMILES", "InChIKey"];

    pub fn new(pubchem: PubChem, key_column: impl Into<String>) -> Self {
        Self {
            pubchem,
            key_column: key_column.into(),
        }
    }
}

#[async_trait]
impl Lookup for IdentifiersByName {
    fn columns(&self) -> &[&'static str] {
        &Self::COLUMNS
    }

    fn key_column(&self) -> &str {
        &self.key_column
    }

    fn is_placeholder(&self, key: &str) -> bool {
        key.contains(PLACEHOLDER_MARKER)
    }

    async fn lookup(&self, key: &str) -> Attempt {
        match self.pubchem.properties_by_name(key).await {
            Ok(props) => Attempt::Found(
                Record::new()
                    .with("CID", props.cid.to_string())
                    .with("SMILES", props.smiles())
                    .with("InChIKey", props.inchikey.clone().unwrap_or_default()),
            ),
            Err(attempt) => attempt,
        }
    }
}
