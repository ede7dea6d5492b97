//! Remote SPARQL endpoint transport (blocking HTTP).

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use sparqlmap_core::{PrefixTable, TemplateConfig, TransportError, Triple, TripleSource};
use tracing::{debug, warn};
use url::Url;

use crate::parse::{parse_triples, RdfFormat};

/// Media types we can parse, best first.
const ACCEPT_RDF: &str = "application/n-triples, text/turtle;q=0.9";

/// Longest response body quoted in a status error.
const MAX_ERROR_BODY: usize = 512;

/// `CONSTRUCT` query returning every triple of `subject`, with the table's
/// prefixes declared up front.
pub fn construct_query(subject: &str, prefixes: &PrefixTable) -> String {
    let subject = prefixes.expand(subject);
    format!("{prefixes}CONSTRUCT {{ <{subject}> ?p ?o }} WHERE {{ <{subject}> ?p ?o }}")
}

/// A SPARQL 1.1 protocol endpoint queried with `CONSTRUCT` over HTTP GET.
#[derive(Debug, Clone)]
pub struct SparqlEndpoint {
    url: Url,
    client: Client,
}

impl SparqlEndpoint {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Self::with_client_options(endpoint, &TemplateConfig::default())
    }

    /// Endpoint URL, timeout and user agent from `config`.
    pub fn from_config(config: &TemplateConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| TransportError::Request {
            endpoint: String::new(),
            message: "no SPARQL endpoint configured".to_string(),
        })?;
        Self::with_client_options(endpoint, config)
    }

    fn with_client_options(endpoint: &str, config: &TemplateConfig) -> Result<Self, TransportError> {
        let url = Url::parse(endpoint).map_err(|e| TransportError::Request {
            endpoint: endpoint.to_string(),
            message: format!("invalid endpoint URL: {e}"),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("sparqlmap")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_RDF));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Request {
                endpoint: endpoint.to_string(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn request_error(&self, err: impl std::fmt::Display) -> TransportError {
        TransportError::Request {
            endpoint: self.url.to_string(),
            message: err.to_string(),
        }
    }
}

impl TripleSource for SparqlEndpoint {
    fn fetch_triples(&self, subject: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError> {
        let query = construct_query(subject, prefixes);
        debug!(endpoint = %self.url, subject, "sending CONSTRUCT query");

        let resp = self
            .client
            .get(self.url.clone())
            .query(&[("query", query.as_str())])
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().map_err(|e| self.request_error(e))?;

        let triples = read_response(self.url.as_str(), status, content_type.as_deref(), &body)?;
        debug!(endpoint = %self.url, triples = triples.len(), "parsed CONSTRUCT response");
        Ok(triples)
    }
}

/// Turn a `CONSTRUCT` response into triples. A non-success status becomes
/// [`TransportError::Status`] quoting the start of the body; otherwise the
/// body is parsed in the format named by `content_type` (N-Triples when
/// absent or unknown).
fn read_response(
    endpoint: &str,
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Vec<Triple>, TransportError> {
    if !status.is_success() {
        warn!(endpoint, status = status.as_u16(), "SPARQL endpoint returned an error");
        return Err(TransportError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).chars().take(MAX_ERROR_BODY).collect(),
        });
    }

    let format = content_type
        .and_then(RdfFormat::from_media_type)
        .unwrap_or(RdfFormat::NTriples);
    parse_triples(body, format)
}
