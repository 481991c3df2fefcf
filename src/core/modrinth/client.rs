use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::model::{Project, SearchResponse, Version};
use super::search::SearchParams;
use crate::core::config::SyncConfig;
use crate::core::error::{SyncError, SyncResult};
use crate::core::http::build_http_client;
use crate::core::registry::Registry;

/// Modrinth v2 JSON API client.
#[derive(Debug, Clone)]
pub struct ModrinthClient {
    base: String,
    client: Client,
}

impl ModrinthClient {
    pub fn new(base: impl Into<String>, client: Client) -> Self {
        Self {
            base: base.into(),
            client,
        }
    }

    /// Client for `config.api_base` with the metadata timeout applied.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        let client = build_http_client(config.api_timeout)?;
        Ok(Self::new(config.api_base.clone(), client))
    }

    /// `base` joined with `segments`, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> SyncResult<Url> {
        let invalid = || SyncError::InvalidApiBase(self.base.clone());
        let mut url = Url::parse(&self.base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> SyncResult<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {} {:?}", url, query);

        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::RegistryStatus {
                path: segments.join("/"),
                status: status.as_u16(),
            });
        }

        Ok(resp.json::<T>().await?)
    }

    /// Full-text project search.
    pub async fn search(&self, params: &SearchParams) -> SyncResult<SearchResponse> {
        self.get_json(&["search"], &params.to_query()).await
    }
}

#[async_trait]
impl Registry for ModrinthClient {
    async fn project_versions(
        &self,
        slug: &str,
        game_version: Option<&str>,
        loader: Option<&str>,
    ) -> SyncResult<Vec<Version>> {
        let mut query = Vec::new();
        if let Some(v) = game_version.filter(|v| !v.is_empty()) {
            query.push(("game_versions", format!("[\"{v}\"]")));
        }
        if let Some(l) = loader.filter(|l| !l.is_empty()) {
            query.push(("loaders", format!("[\"{l}\"]")));
        }

        self.get_json(&["project", slug, "version"], &query).await
    }

    async fn version(&self, version_id: &str) -> SyncResult<Version> {
        self.get_json(&["version", version_id], &[]).await
    }

    async fn project(&self, slug_or_id: &str) -> SyncResult<Project> {
        self.get_json(&["project", slug_or_id], &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ModrinthClient {
        ModrinthClient::new(base, Client::new())
    }

    #[test]
    fn path_segments_are_escaped() {
        let api = client("https://api.modrinth.com/v2/");
        assert_eq!(
            api.endpoint(&["project", "sodium", "version"]).unwrap().as_str(),
            "https://api.modrinth.com/v2/project/sodium/version"
        );
        assert_eq!(
            api.endpoint(&["project", "a/b c"]).unwrap().as_str(),
            "https://api.modrinth.com/v2/project/a%2Fb%20c"
        );
    }

    #[test]
    fn unusable_base_is_rejected() {
        assert!(matches!(
            client("not a url").endpoint(&["search"]),
            Err(SyncError::InvalidApiBase(ref b)) if b == "not a url"
        ));
    }
}
