//! BioPortal REST client.
//!
//! Blocking HTTP client for the ontology catalog and exact-match term search.
//! Any non-200 answer is [`ConvertError::UpstreamUnavailable`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{OntologyCatalog, OntologyLookup, TermRecord};
use crate::config::BioPortalConfig;
use crate::error::ConvertError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct OntologyEntry {
    acronym: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    collection: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(default)]
    pref_label: String,
    links: SearchLinks,
}

#[derive(Debug, Deserialize)]
struct SearchLinks {
    ontology: String,
}

/// Blocking BioPortal client.
pub struct BioPortalClient {
    client: Client,
    base_url: String,
    ontologies_endpoint: String,
    search_endpoint: String,
    api_key: String,
}

impl BioPortalClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &BioPortalConfig) -> Result<Self, ConvertError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConvertError::transport(&config.base_url, e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            ontologies_endpoint: config.ontologies_endpoint.clone(),
            search_endpoint: config.search_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, ConvertError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("apikey token={}", self.api_key))
            .query(query)
            .send()
            .map_err(|e| ConvertError::transport(&url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConvertError::UpstreamUnavailable {
                endpoint: url,
                status: status.as_u16(),
            });
        }
        response.text().map_err(|e| ConvertError::transport(&url, e))
    }
}

impl OntologyLookup for BioPortalClient {
    fn catalog(&self) -> Result<OntologyCatalog, ConvertError> {
        let body = self.get(
            &self.ontologies_endpoint,
            &[("no_links", "true"), ("no_context", "true")],
        )?;
        let entries: Vec<OntologyEntry> = serde_json::from_str(&body)
            .map_err(|source| ConvertError::Format { what: "ontology catalog", source })?;
        let catalog: OntologyCatalog = entries
            .into_iter()
            .map(|entry| {
                let name = entry.name.unwrap_or_else(|| entry.acronym.clone());
                (entry.acronym, name)
            })
            .collect();
        debug!(ontologies = catalog.len(), "fetched ontology catalog");
        Ok(catalog)
    }

    fn find_term(&self, term_id: &str) -> Result<Option<TermRecord>, ConvertError> {
        let body = self.get(
            &self.search_endpoint,
            &[
                ("q", term_id),
                ("require_exact_match", "true"),
                ("no_context", "true"),
            ],
        )?;
        let response: SearchResponse = serde_json::from_str(&body)
            .map_err(|source| ConvertError::Format { what: "term search response", source })?;
        Ok(best_match(response))
    }
}

fn best_match(response: SearchResponse) -> Option<TermRecord> {
    if response.total_count == 0 {
        return None;
    }
    response.collection.into_iter().next().map(|hit| TermRecord {
        pref_label: hit.pref_label,
        ontology_link: hit.links.ontology,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_picks_first_hit() {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "totalCount": 2,
                "collection": [
                    {"prefLabel": "assay", "links": {"ontology": "https://data.bioontology.org/ontologies/BAO"}},
                    {"prefLabel": "other", "links": {"ontology": "https://data.bioontology.org/ontologies/NCIT"}}
                ]
            }"#,
        )
        .expect("parses");
        let record = best_match(response).expect("has a match");
        assert_eq!(record.pref_label, "assay");
        assert_eq!(record.acronym(), "BAO");
    }

    #[test]
    fn zero_total_count_is_no_match() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"totalCount": 0, "collection": []}"#).expect("parses");
        assert!(best_match(response).is_none());
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(BioPortalClient::new(&BioPortalConfig::default()).is_ok());
    }
}
