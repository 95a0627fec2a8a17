use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::LengthLimitError;
use http_body_util::Limited;

use super::Body;
use crate::error::RequestError;

/// Collects `body`, failing once more than `limit` bytes came in.
pub(crate) async fn read_limited(body: Body, limit: usize) -> Result<Bytes, RequestError> {
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                RequestError::PayloadTooLarge { limit }
            } else {
                RequestError::BodyRead {
                    reason: err.to_string(),
                }
            }
        })
}

#[cfg(test)]
pub(crate) async fn into_bytes(body: Body) -> Result<Bytes, axum::Error> {
    Ok(body.collect().await?.to_bytes())
}
