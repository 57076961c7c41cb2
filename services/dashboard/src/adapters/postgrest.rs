//! services/dashboard/src/adapters/postgrest.rs
//!
//! Profile store backed by the hosted REST gateway (PostgREST).
//! Implements the `ProfileStore` port from the `core` crate.

use crate::adapters::gotrue::{backend_message, unexpected};
use async_trait::async_trait;
use dashboard_core::domain::ProfileRecord;
use dashboard_core::ports::{PortError, PortResult, ProfileLookup, ProfileStore};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Returned when a single-object request matched zero (or several) rows.
const NO_ROWS_CODE: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Deserialize)]
struct GatewayError {
    code: Option<String>,
}

/// Maps a failed single-row lookup onto the tagged result.
fn classify_lookup_error(status: StatusCode, body: &str) -> ProfileLookup {
    let code = serde_json::from_str::<GatewayError>(body)
        .ok()
        .and_then(|e| e.code);
    if code.as_deref() == Some(NO_ROWS_CODE) {
        return ProfileLookup::NotFound;
    }
    ProfileLookup::Failed(PortError::Backend(backend_message(status, body)))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct PostgrestProfileStore {
    http: Client,
    table_url: String,
    api_key: String,
}

impl PostgrestProfileStore {
    pub fn new(http: Client, base_url: &str, api_key: String, table: &str) -> Self {
        Self {
            http,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for PostgrestProfileStore {
    async fn find_by_email(&self, email: &str) -> ProfileLookup {
        let filter = format!("eq.{}", email);
        let sent = self
            .authorized(self.http.get(&self.table_url))
            .query(&[("select", "id,email,username"), ("email", filter.as_str())])
            .header(header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => return ProfileLookup::Failed(unexpected(e)),
        };

        let status = response.status();
        if !status.is_success() {
            return match response.text().await {
                Ok(body) => classify_lookup_error(status, &body),
                Err(e) => ProfileLookup::Failed(unexpected(e)),
            };
        }

        match response.json::<ProfileRecord>().await {
            Ok(record) => {
                debug!(profile_id = %record.id, "Profile found for email");
                ProfileLookup::Found(record)
            }
            Err(e) => ProfileLookup::Failed(unexpected(e)),
        }
    }

    async fn insert(&self, profile: &ProfileRecord) -> PortResult<()> {
        let response = self
            .authorized(self.http.post(&self.table_url))
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()
            .await
            .map_err(unexpected)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(unexpected)?;
            return Err(PortError::Backend(backend_message(status, &body)));
        }
        debug!(profile_id = %profile.id, "Profile inserted");
        Ok(())
    }
}
