//! S3-compatible object store backend.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use chrono::DateTime;
use cm_error::{classify_backend_error, StoreError, StoreResult};
use cm_types::ObjectMeta;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ObjectPage, ObjectStore};

/// Configuration for S3 access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3StoreConfig {
    /// AWS region
    pub region: Option<String>,

    /// Custom endpoint URL (for LocalStack or S3-compatible stores)
    pub endpoint: Option<String>,

    /// Explicit AWS access key (optional)
    pub access_key: Option<String>,

    /// Explicit AWS secret key (optional)
    pub secret_key: Option<String>,

    /// AWS session token for temporary credentials (optional)
    pub session_token: Option<String>,

    /// AWS profile name (optional)
    pub profile: Option<String>,
}

impl S3StoreConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set explicit credentials.
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self.session_token = session_token;
        self
    }

    /// Set the AWS profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Object store backed by an S3-compatible service.
///
/// Holds one pooled SDK client shared across every call; construct it once
/// and pass it around behind an `Arc`.
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Connect using the given configuration.
    pub async fn connect(config: &S3StoreConfig) -> StoreResult<Self> {
        use aws_config::Region;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = aws_sdk_s3::config::Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "cm-store",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }

        let aws_config = loader.load().await;
        let builder = aws_sdk_s3::config::Builder::from(&aws_config);

        // Path-style access is required by LocalStack and most S3-compatible
        // stores behind a custom endpoint.
        let s3_config = if config.endpoint.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }

    /// Wrap an existing SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(&self, bucket: &str, page_token: Option<&str>) -> StoreResult<ObjectPage> {
        let mut req = self.client.list_objects_v2().bucket(bucket);

        if let Some(token) = page_token {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| map_sdk_error("list_page", bucket, &e))?;

        let mut objects = Vec::new();
        if let Some(contents) = resp.contents {
            for obj in contents {
                let name = obj.key.unwrap_or_default();
                if name.is_empty() {
                    continue;
                }

                let updated = obj
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

                objects.push(ObjectMeta {
                    bucket: bucket.to_string(),
                    name,
                    updated,
                    storage_class: obj
                        .storage_class
                        .map(|c| c.as_str().to_string())
                        .unwrap_or_else(|| "STANDARD".to_string()),
                });
            }
        }

        let next_page_token = if resp.is_truncated == Some(true) {
            resp.next_continuation_token
        } else {
            None
        };

        debug!(bucket, count = objects.len(), "Listed page");

        Ok(ObjectPage {
            objects,
            next_page_token,
        })
    }

    async fn get_metadata(&self, bucket: &str, name: &str) -> StoreResult<Option<ObjectMeta>> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
        {
            Ok(out) => {
                let updated = out
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

                Ok(Some(ObjectMeta {
                    bucket: bucket.to_string(),
                    name: name.to_string(),
                    updated,
                    storage_class: out
                        .storage_class
                        .map(|c| c.as_str().to_string())
                        .unwrap_or_else(|| "STANDARD".to_string()),
                }))
            }
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(None),
            Err(err) => Err(map_sdk_error("get_metadata", name, &err)),
        }
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        name: &str,
        destination_bucket: &str,
    ) -> StoreResult<()> {
        self.client
            .copy_object()
            .copy_source(format!("{}/{}", source_bucket, name))
            .bucket(destination_bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("copy_object", name, &e))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("delete_object", name, &e))?;
        Ok(())
    }
}

/// Map an SDK error onto the store error taxonomy.
fn map_sdk_error<E>(operation: &str, target: &str, err: &SdkError<E>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.meta().code())
        .unwrap_or_default();
    let message = format!("{} {}: {}", operation, target, DisplayErrorContext(err));
    classify_backend_error(code, &message)
}
