use super::SupabaseClient;
use crate::abstractions::DealPersistence;
use crate::board::{Deal, DealDraft, DealField, DealId};
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

impl SupabaseClient {
    /// `<table>?id=eq.<id>`
    fn row_url(&self, id: &DealId) -> RemoteResult<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }
}

#[async_trait]
impl DealPersistence for SupabaseClient {
    async fn list(&self) -> RemoteResult<Vec<Deal>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("select", "*");

        let request = self.request(Method::GET, url).await;
        let response = self.send(request).await?;
        response.json().await.map_err(RemoteError::serialization)
    }

    async fn insert(&self, draft: &DealDraft) -> RemoteResult<Vec<Deal>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("select", "*");

        let request = self
            .request(Method::POST, url)
            .await
            .header("Prefer", "return=representation")
            .json(&[draft]);
        let response = self.send(request).await?;
        response.json().await.map_err(RemoteError::serialization)
    }

    async fn update(
        &self,
        id: &DealId,
        field: DealField,
        value: Option<&str>,
    ) -> RemoteResult<()> {
        let mut patch = Map::new();
        patch.insert(
            field.as_str().to_string(),
            value.map_or(Value::Null, |v| Value::String(v.to_string())),
        );

        let request = self
            .request(Method::PATCH, self.row_url(id)?)
            .await
            .json(&patch);
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, id: &DealId) -> RemoteResult<()> {
        let request = self.request(Method::DELETE, self.row_url(id)?).await;
        self.send(request).await?;
        Ok(())
    }
}
