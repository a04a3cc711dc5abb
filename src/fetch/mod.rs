// src/fetch/mod.rs

use reqwest::{Client, Request, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    config::Settings,
    error::{PipelineError, Result},
    process::lookup::Attempt,
};

pub mod kegg;
pub mod pubchem;

pub use kegg::KeggByCid;
pub use pubchem::{CompoundByName, IdentifiersByName};

/// Thin PubChem HTTP client. Every call returns either the body text or the
/// `Attempt` the failure maps onto.
#[derive(Clone, Debug)]
pub struct PubChem {
    client: Client,
    base: Url,
}

#[derive(Deserialize)]
struct FaultBody {
    #[serde(rename = "Fault")]
    fault: Fault,
}

#[derive(Deserialize)]
struct Fault {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

impl PubChem {
    pub fn new(settings: &Settings) -> Result<Self> {
        let base = Url::parse(&settings.base_url)
            .map_err(|e| PipelineError::Config(format!("base URL {}: {e}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(PipelineError::Config(format!(
                "base URL {} cannot carry a path",
                settings.base_url
            )));
        }
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client, base })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) async fn get_text(&self, url: Url) -> std::result::Result<String, Attempt> {
        let request = self
            .client
            .get(url.clone())
            .build()
            .map_err(|e| Attempt::Terminal(format!("building GET {url}: {e}")))?;
        self.execute_text(request).await
    }

    /// Build a form POST. PubChem takes identifiers with reserved characters
    /// this way; in the path they would be rejected.
    pub(crate) fn post_form(
        &self,
        url: Url,
        form: &[(&str, &str)],
    ) -> std::result::Result<Request, Attempt> {
        self.client
            .post(url.clone())
            .form(form)
            .build()
            .map_err(|e| Attempt::Terminal(format!("building POST {url}: {e}")))
    }

    pub(crate) async fn execute_text(
        &self,
        request: Request,
    ) -> std::result::Result<String, Attempt> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "request");
        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| Attempt::Terminal(format!("{method} {url}: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Attempt::Terminal(format!("reading body from {url}: {e}")))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_failure(status, &body))
        }
    }
}

/// Map a non-success response onto an attempt. PubChem's fault code takes
/// precedence over the status line.
pub fn classify_failure(status: StatusCode, body: &str) -> Attempt {
    if let Ok(FaultBody { fault }) = serde_json::from_str::<FaultBody>(body) {
        match fault.code.as_str() {
            "PUGREST.NotFound" => return Attempt::NotFound,
            "PUGREST.ServerBusy" => return Attempt::Retryable(fault.code.clone()),
            _ => {
                return match status {
                    StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                        Attempt::Retryable(format!("{}: {}", fault.code, fault.message))
                    }
                    _ => Attempt::Terminal(format!("{} ({status}): {}", fault.code, fault.message)),
                };
            }
        }
    }

    match status {
        StatusCode::NOT_FOUND => Attempt::NotFound,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            Attempt::Retryable(format!("HTTP {status}"))
        }
        _ => Attempt::Terminal(format!("HTTP {status}")),
    }
}

/// Parse a CID cell. Spreadsheet exports sometimes write integers as `2244.0`.
pub fn parse_cid(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    raw.strip_suffix(".0").unwrap_or(raw).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_busy_fault_is_retryable() {
        let body = r#"{"Fault":{"Code":"PUGREST.ServerBusy","Message":"Too many requests or server too busy"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, body),
            Attempt::Retryable(_)
        ));
    }

    #[test]
    fn test_not_found_fault() {
        let body = r#"{"Fault":{"Code":"PUGREST.NotFound","Message":"No CID found","Details":["No CID found that matches the given name"]}}"#;
        assert_eq!(classify_failure(StatusCode::NOT_FOUND, body), Attempt::NotFound);
    }

    #[test]
    fn test_plain_status_codes() {
        assert_eq!(classify_failure(StatusCode::NOT_FOUND, ""), Attempt::NotFound);
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Attempt::Retryable(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, "<html>"),
            Attempt::Terminal(_)
        ));
    }

    #[test]
    fn test_bad_request_fault_is_terminal() {
        let body = r#"{"Fault":{"Code":"PUGREST.BadRequest","Message":"Invalid property"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            Attempt::Terminal(_)
        ));
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let pubchem = PubChem::new(&Settings::default()).unwrap();
        let url = pubchem.endpoint(&["rest", "pug_view", "data", "compound", "2244", "JSON", ""]);
        assert_eq!(
            url.as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug_view/data/compound/2244/JSON/"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let settings = Settings {
            base_url: "http://localhost:8080/mirror".to_string(),
            ..Settings::default()
        };
        let pubchem = PubChem::new(&settings).unwrap();
        let url = pubchem.endpoint(&["rest", "pug", "compound", "cid", "702", "synonyms", "JSON"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/mirror/rest/pug/compound/cid/702/synonyms/JSON"
        );
    }

    #[test]
    fn test_parse_cid() {
        assert_eq!(parse_cid("2244"), Some(2244));
        assert_eq!(parse_cid(" 2244.0 "), Some(2244));
        assert_eq!(parse_cid("xxxxxx"), None);
    }
}
