use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Extension, Router};
use gallery_backend::{
    catalog::{CatalogPipeline, DEFAULT_PRESIGNED_URL_EXPIRY_SECS},
    ingest::IngestionPipeline,
    media_storage::{mock::InMemoryObjectStore, ObjectStore},
    routes,
    thumbnail::ThumbnailGenerator,
    types::Environment,
};
use tower::ServiceExt;

pub const TEST_BUCKET: &str = "test-bucket";

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to an in-memory object store
pub struct TestSetup {
    pub router: Router,
    pub environment: Environment,
    pub store: Arc<InMemoryObjectStore>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryObjectStore::new(TEST_BUCKET)))
    }

    pub fn with_store(store: Arc<InMemoryObjectStore>) -> Self {
        setup_test_env();

        let environment = Environment::Development {
            presign_expiry_override: None,
        };

        let object_store: Arc<dyn ObjectStore> = store.clone();
        let ingestion = Arc::new(IngestionPipeline::new(
            object_store.clone(),
            ThumbnailGenerator::default(),
        ));
        let catalog = Arc::new(CatalogPipeline::new(
            object_store,
            DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
        ));

        let router = routes::handler()
            .layer(Extension(environment.clone()))
            .layer(Extension(ingestion))
            .layer(Extension(catalog))
            .into();

        Self {
            router,
            environment,
            store,
        }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method("POST");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn parse_response_body(
        &self,
        response: Response,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        use http_body_util::BodyExt;

        let body = response.into_body().collect().await?.to_bytes();
        let json = serde_json::from_slice(&body)?;
        Ok(json)
    }

    /// Uploads `data` under `filename` and returns the stored key
    pub async fn upload(&self, filename: &str, content_type: &str, data: Vec<u8>) -> String {
        let response = self
            .send_post_request(
                "/v1/uploads",
                data,
                &[("content-type", content_type), ("x-filename", filename)],
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = self.parse_response_body(response).await.unwrap();
        body["key"].as_str().unwrap().to_string()
    }
}
