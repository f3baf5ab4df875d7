use anyhow::Result;
use async_trait::async_trait;
use subway_delay_report::fetch::BasicClient;

use crate::services::catalog_api::{CatalogApi, Resource};

/// CKAN-backed open-data portal client.
pub struct OpenDataClient {
    base_url: String,
    http: BasicClient,
}

impl OpenDataClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: BasicClient::new()?,
        })
    }
}

/// Extracts the resource list from a CKAN `package_show` response body.
fn parse_package(json: &serde_json::Value) -> Result<Vec<Resource>> {
    if json["success"].as_bool() != Some(true) {
        let message = json["error"]["message"].as_str().unwrap_or("unknown error");
        return Err(anyhow::anyhow!("Catalog request was not successful: {}", message));
    }

    let resources = json["result"]["resources"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Catalog response has no resource list"))?;

    Ok(resources
        .iter()
        .filter_map(|item| {
            let id = item["id"].as_str()?.to_string();
            let name = item["name"].as_str().unwrap_or("").to_string();
            let format = item["format"].as_str().map(|s| s.to_string());
            let url = item["url"].as_str().map(|s| s.to_string());
            let last_modified = item["last_modified"].as_str().map(|s| s.to_string());

            Some(Resource {
                id,
                name,
                format,
                url,
                last_modified,
            })
        })
        .collect())
}

#[async_trait]
impl CatalogApi for OpenDataClient {
    async fn list_resources(&self, package: &str) -> Result<Vec<Resource>> {
        let url = format!("{}/api/3/action/package_show", self.base_url);

        let response = self
            .http
            .inner()
            .get(&url)
            .query(&[("id", package)])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("API returned status {}: {}", status, body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))?;

        parse_package(&json)
    }
}
