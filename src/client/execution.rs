//! Single-attempt request execution. The retry loop lives in the caller.

use super::core::FetchEngine;
use super::policy::{parse_document, rate_limit_error, Outcome};
use crate::request::RequestSpec;
use crate::resilience::DelayEstimator;
use crate::{Error, Result};
use bytes::Bytes;
use tracing::debug;
use url::Url;

impl FetchEngine {
    /// Wait out the pacing delay, issue one GET and classify the result.
    ///
    /// On success returns the parsed value together with the raw body so the
    /// caller can cache it.
    pub(crate) async fn execute_once<R: RequestSpec>(
        &self,
        spec: &R,
        url: &Url,
        params: &[(String, String)],
        estimator: &DelayEstimator,
        request_id: &str,
    ) -> Result<(R::Output, Bytes)> {
        estimator.limit().await;

        let resp = self.transport.get(url, params).await?;
        debug!(
            request_id,
            resource_class = spec.resource_class(),
            http_status = resp.status,
            bytes = resp.body.len(),
            "response received"
        );

        match Outcome::of(resp.status) {
            Outcome::Ok => {
                estimator.success();
                let value = parse_document(&resp.body, |root| spec.parse(root))?;
                Ok((value, resp.body))
            }
            Outcome::RateLimited => {
                estimator.fail();
                Err(rate_limit_error(&resp))
            }
            Outcome::BadGateway => Err(Error::TransientServer),
            Outcome::Unexpected(status) => Err(Error::FatalProtocol { status }),
        }
    }
}
