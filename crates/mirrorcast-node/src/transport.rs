//! HTTP transport -- reqwest client behind the pipeline's Transport
//! seam. Downloads stream the body; uploads are multipart form fields
//! (content/name/type) on the peer upload port; notifications are
//! JSON posts whose responses are ignored.

use futures::TryStreamExt;
use mirrorcast_pipeline::{Download, Transport, TransportError};
use mirrorcast_protocol::{Peer, ReplicationStatus, UploadPayload};

pub struct HttpTransport {
    client: reqwest::Client,
    upload_port: u16,
}

impl HttpTransport {
    pub fn new(upload_port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_port,
        }
    }
}

fn http_err(e: reqwest::Error) -> TransportError {
    TransportError::Http(e.to_string())
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn download(&self, link: &str) -> Result<Download, TransportError> {
        let resp = self
            .client
            .get(link)
            .send()
            .await
            .map_err(http_err)?
            .error_for_status()
            .map_err(http_err)?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Download {
            content_type,
            stream: Box::pin(stream),
        })
    }

    async fn upload(&self, peer: &Peer, payload: UploadPayload) -> Result<u16, TransportError> {
        let url = format!("http://{}:{}", peer.ip, self.upload_port);
        let form = reqwest::multipart::Form::new()
            .part(
                "content",
                reqwest::multipart::Part::bytes(payload.content.to_vec())
                    .file_name(payload.name.clone()),
            )
            .text("name", payload.name)
            .text("type", payload.kind);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(http_err)?;
        Ok(resp.status().as_u16())
    }

    async fn notify(&self, url: &str, status: &ReplicationStatus) -> Result<(), TransportError> {
        // Only dispatch success matters; the response body is dropped.
        self.client
            .post(url)
            .json(status)
            .send()
            .await
            .map_err(http_err)?;
        Ok(())
    }
}
