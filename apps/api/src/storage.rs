use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
pub async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "ats-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

/// Object key for a newly stored resume: `resumes/<uuid><ext>`.
/// `extension` includes its leading dot, or is empty.
pub fn resume_object_key(extension: &str) -> String {
    format!("resumes/{}{}", Uuid::new_v4(), extension)
}

pub async fn put_resume(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    data: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(data))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Resume upload failed: {e}")))?;

    info!("Stored resume at s3://{}/{}", bucket, key);
    Ok(())
}

/// Best-effort removal used to undo a store whose database insert failed.
pub async fn discard_resume(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) {
    if let Err(e) = s3.delete_object().bucket(bucket).key(key).send().await {
        warn!("Failed to remove orphaned resume s3://{}/{}: {}", bucket, key, e);
    }
}
