use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use gallery_backend::{
    catalog::CatalogPipeline,
    ingest::IngestionPipeline,
    media_storage::{ObjectStore, S3ObjectStore},
    server,
    thumbnail::ThumbnailGenerator,
    types::Environment,
};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // JSON logs for staging/production, human-readable for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(env_filter).init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(env_filter).init();
        }
    }

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let store: Arc<dyn ObjectStore> =
        Arc::new(S3ObjectStore::new(s3_client, environment.s3_bucket()));

    let ingestion = Arc::new(IngestionPipeline::new(
        store.clone(),
        ThumbnailGenerator::new(environment.thumbnail_max_dimension()),
    ));
    let catalog = Arc::new(CatalogPipeline::new(
        store,
        environment.presigned_url_expiry_secs(),
    ));

    server::start(environment, ingestion, catalog).await
}
