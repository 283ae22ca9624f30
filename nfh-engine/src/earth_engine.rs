//! Google Earth Engine REST client.

use crate::{
    error::{EngineError, Result},
    expression::{image_count_expression, index_band_expression, reduce_mean_expression},
    query::{CollectionQuery, CompositeImage, ReduceParams, TileLayer, VisParams},
    service::ImageQueryService,
};
use async_trait::async_trait;
use log::debug;
use nfh_geo::AreaOfInterest;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Public Earth Engine REST endpoint.
pub const EE_API_BASE: &str = "https://earthengine.googleapis.com/v1";

/// Deadline for a single request, including large region reductions.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Error envelope of Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    name: String,
}

/// Extract the human-readable message from a Google API error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}

/// XYZ tile template for a map created through `projects/*/maps`.
fn tile_template(base_url: &str, map_name: &str) -> String {
    format!("{base_url}/{map_name}/tiles/{{z}}/{{x}}/{{y}}")
}

/// [`ImageQueryService`] backed by Earth Engine.
///
/// Requests are billed to `project_id` and authorised with an OAuth access
/// token (for example from `gcloud auth print-access-token`).
#[derive(Debug, Clone)]
pub struct EarthEngineClient {
    client: Client,
    base_url: String,
    project_id: String,
    access_token: String,
}

impl EarthEngineClient {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(project_id, access_token, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        project_id: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(EarthEngineClient {
            client,
            base_url: EE_API_BASE.to_string(),
            project_id: project_id.into(),
            access_token: access_token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn project_url(&self, method: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project_id, method)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .header("x-goog-user-project", &self.project_id)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(EngineError::Service {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        serde_json::from_str(&text).map_err(|e| EngineError::ResponseParse(e.to_string()))
    }

    /// Evaluate an expression and return its `result` value.
    async fn compute(&self, expression: Value) -> Result<Value> {
        let url = self.project_url("value:compute");
        let response = self.post(&url, &json!({ "expression": expression })).await?;
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ImageQueryService for EarthEngineClient {
    async fn image_count(&self, query: &CollectionQuery) -> Result<u64> {
        let value = self.compute(image_count_expression(query)).await?;
        value
            .as_u64()
            .ok_or_else(|| EngineError::ResponseParse(format!("expected image count, got {value}")))
    }

    /// Earth Engine evaluates lazily: the composite is only a description
    /// until it is reduced or rendered.
    async fn composite(&self, query: &CollectionQuery) -> Result<CompositeImage> {
        Ok(CompositeImage {
            query: query.clone(),
        })
    }

    async fn reduce_mean(
        &self,
        image: &CompositeImage,
        area: &AreaOfInterest,
        params: &ReduceParams,
    ) -> Result<Option<f64>> {
        let value = self
            .compute(reduce_mean_expression(image, area, params))
            .await?;
        match value {
            Value::Null => Ok(None),
            other => other
                .as_f64()
                .map(Some)
                .ok_or_else(|| EngineError::ResponseParse(format!("expected mean, got {other}"))),
        }
    }

    async fn tile_layer(
        &self,
        image: &CompositeImage,
        vis: &VisParams,
        name: &str,
    ) -> Result<TileLayer> {
        let body = json!({
            "expression": index_band_expression(image),
            "fileFormat": "AUTO_JPEG_PNG",
            "bandIds": [image.index_band()],
            "visualizationOptions": {
                "ranges": [{ "min": vis.min, "max": vis.max }],
                "paletteColors": vis.palette,
            },
        });
        let response = self.post(&self.project_url("maps"), &body).await?;
        let map: MapResponse = serde_json::from_value(response)
            .map_err(|e| EngineError::ResponseParse(e.to_string()))?;
        Ok(TileLayer {
            name: name.to_string(),
            url_template: tile_template(&self.base_url, &map.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_envelope() {
        let body = r#"{"error": {"code": 403, "message": "Permission denied on project", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "Permission denied on project");
        assert_eq!(error_message(" upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_tile_template() {
        assert_eq!(
            tile_template(EE_API_BASE, "projects/my-project/maps/abc123"),
            "https://earthengine.googleapis.com/v1/projects/my-project/maps/abc123/tiles/{z}/{x}/{y}"
        );
    }

    #[test]
    fn test_project_url() {
        let client = EarthEngineClient::new("forest-monitor", "token")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            client.project_url("value:compute"),
            "http://localhost:8080/v1/projects/forest-monitor/value:compute"
        );
        assert_eq!(client.project_id(), "forest-monitor");
    }

    #[tokio::test]
    async fn test_stalled_backend_times_out() {
        // Accepts the connection but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = EarthEngineClient::with_timeout(
            "forest-monitor",
            "token",
            Duration::from_millis(200),
        )
        .unwrap()
        .with_base_url(format!("http://{addr}/v1"));
        let query = CollectionQuery::sentinel2_ndvi(
            AreaOfInterest::new(nfh_geo::NEPAL_CENTER, 5.0).unwrap(),
            nfh_geo::DateRange::season(2023, 1, 3).unwrap(),
        );
        match client.image_count(&query).await {
            Err(EngineError::HttpRequest(e)) => assert!(e.is_timeout(), "{e}"),
            other => panic!("expected timeout, got {other:?}"),
        }
        drop(listener);
    }
}
