use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{ContentStore, IpfsError, PinEntry, PinnedContent, Result, parse_cid};

/// Delay between pin-list pages, keeps us under the service's rate limit
pub const PAGE_DELAY: Duration = Duration::from_millis(300);
pub const PAGE_LIMIT: usize = 1000;

#[derive(Deserialize)]
struct PinListPage {
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    rows: Vec<PinEntry>,
}

/// Client for a Pinata-compatible pinning API.
///
/// No retries are attempted; a failed call surfaces directly to the caller.
#[derive(Clone)]
pub struct PinataClient {
    http: reqwest::Client,
    api_url: Url,
    gateway_url: Url,
    jwt: String,
    page_limit: usize,
    page_delay: Duration,
}

impl PinataClient {
    pub fn new(api_url: &str, gateway_url: &str, jwt: impl Into<String>) -> Result<Self> {
        let jwt = jwt.into();
        if jwt.trim().is_empty() {
            return Err(IpfsError::Config("pinning service JWT is empty".to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: base_url(api_url)?,
            gateway_url: base_url(gateway_url)?,
            jwt,
            page_limit: PAGE_LIMIT,
            page_delay: PAGE_DELAY,
        })
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| IpfsError::Config(format!("bad endpoint {}: {}", path, e)))
    }

    async fn pin_response(response: reqwest::Response) -> Result<PinnedContent> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Pinning service returned {}: {}", status, body);
            return Err(IpfsError::Upload(format!("{}: {}", status, body)));
        }
        response
            .json::<PinnedContent>()
            .await
            .map_err(|e| IpfsError::InvalidResponse(e.to_string()))
    }

    async fn fetch_pin_page(&self, offset: usize) -> Result<PinListPage> {
        let url = self.endpoint("data/pinList")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.jwt)
            .query(&[
                ("status", "pinned".to_string()),
                ("pageLimit", self.page_limit.to_string()),
                ("pageOffset", offset.to_string()),
            ])
            .send()
            .await
            .map_err(|e| IpfsError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IpfsError::Fetch(format!("{}: {}", status, body)));
        }
        response
            .json::<PinListPage>()
            .await
            .map_err(|e| IpfsError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn upload(&self, bytes: &[u8], name: &str) -> Result<PinnedContent> {
        debug!("Pinning file {} ({} bytes)", name, bytes.len());
        let part = Part::bytes(bytes.to_vec())
            .file_name(name.to_string())
            .mime_str("application/json")
            .map_err(|e| IpfsError::Upload(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": name }).to_string());

        let response = self
            .http
            .post(self.endpoint("pinning/pinFileToIPFS")?)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IpfsError::Upload(e.to_string()))?;

        let pinned = Self::pin_response(response).await?;
        info!("Pinned {} as {}", name, pinned.ipfs_hash);
        Ok(pinned)
    }

    async fn upload_json(&self, value: &Value, name: &str) -> Result<PinnedContent> {
        debug!("Pinning JSON document {}", name);
        let body = json!({
            "pinataContent": value,
            "pinataMetadata": { "name": name },
        });
        let response = self
            .http
            .post(self.endpoint("pinning/pinJSONToIPFS")?)
            .bearer_auth(&self.jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| IpfsError::Upload(e.to_string()))?;

        let pinned = Self::pin_response(response).await?;
        info!("Pinned JSON {} as {}", name, pinned.ipfs_hash);
        Ok(pinned)
    }

    async fn fetch(&self, cid: &str) -> Result<Vec<u8>> {
        let cid = parse_cid(cid)?;
        let url = self
            .gateway_url
            .join(&format!("ipfs/{}", cid))
            .map_err(|e| IpfsError::Fetch(format!("bad CID {}: {}", cid, e)))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| IpfsError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IpfsError::Fetch(format!("gateway returned {} for {}", status, cid)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IpfsError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_pins(&self) -> Result<Vec<PinEntry>> {
        let mut pins = Vec::new();
        let mut offset = 0;

        loop {
            if offset > 0 {
                tokio::time::sleep(self.page_delay).await;
            }

            let page = match self.fetch_pin_page(offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Pin listing stopped at offset {} after {} pins: {}", offset, pins.len(), e);
                    break;
                }
            };

            let fetched = page.rows.len();
            pins.extend(page.rows);
            debug!("Fetched {} pins at offset {}", fetched, offset);

            if fetched < self.page_limit {
                break;
            }
            if page.count.is_some_and(|total| pins.len() >= total) {
                break;
            }
            offset += fetched;
        }

        info!("Fetched {} pins", pins.len());
        Ok(pins)
    }

    async fn unpin(&self, cid: &str) -> Result<()> {
        let cid = parse_cid(cid)?;
        let response = self
            .http
            .delete(self.endpoint(&format!("pinning/unpin/{}", cid))?)
            .bearer_auth(&self.jwt)
            .send()
            .await
            .map_err(|e| IpfsError::Unpin(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IpfsError::Unpin(format!("{}: {}", status, body)));
        }
        info!("Unpinned {}", cid);
        Ok(())
    }

    fn gateway_url(&self, cid: &str) -> String {
        format!("{}ipfs/{}", self.gateway_url, cid)
    }
}

/// Parse a base URL and make sure relative joins append to its path
fn base_url(value: &str) -> Result<Url> {
    let mut normalized = value.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| IpfsError::Config(format!("bad URL {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PinataClient {
        PinataClient::new(&server.uri(), &server.uri(), "test-jwt").unwrap()
    }

    fn rows(start: usize, count: usize) -> Value {
        let rows: Vec<Value> = (start..start + count)
            .map(|i| json!({ "ipfs_pin_hash": format!("cid-{}", i), "size": i, "metadata": { "name": null } }))
            .collect();
        Value::Array(rows)
    }

    #[tokio::test]
    async fn test_upload_sends_bearer_and_parses_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinFileToIPFS"))
            .and(header("authorization", "Bearer test-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "IpfsHash": "bafkreiexample",
                "PinSize": 10,
                "Timestamp": "2024-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pinned = client(&server).upload(b"ciphertext", "record.json").await.unwrap();
        assert_eq!(pinned.ipfs_hash, "bafkreiexample");
        assert_eq!(pinned.pin_size, 10);
        assert!(!pinned.is_duplicate);
    }

    #[tokio::test]
    async fn test_upload_non_2xx_is_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinFileToIPFS"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = client(&server).upload(b"x", "x").await.unwrap_err();
        match err {
            IpfsError::Upload(msg) => assert!(msg.contains("invalid token")),
            other => panic!("expected upload error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_network_failure() {
        let pinata = PinataClient::new("http://127.0.0.1:1", "http://127.0.0.1:1", "jwt").unwrap();
        assert!(matches!(pinata.upload(b"x", "x").await, Err(IpfsError::Upload(_))));
    }

    #[tokio::test]
    async fn test_upload_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinJSONToIPFS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "IpfsHash": "bafyjson",
                "PinSize": 3,
                "Timestamp": "2024-01-01T00:00:00Z",
                "isDuplicate": true
            })))
            .mount(&server)
            .await;

        let pinned = client(&server).upload_json(&json!({"a": 1}), "doc").await.unwrap();
        assert_eq!(pinned.ipfs_hash, "bafyjson");
        assert!(pinned.is_duplicate);
    }

    #[tokio::test]
    async fn test_fetch_pins_paginates_with_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/pinList"))
            .and(query_param("pageOffset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 5, "rows": rows(0, 2) })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/pinList"))
            .and(query_param("pageOffset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 5, "rows": rows(2, 2) })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/pinList"))
            .and(query_param("pageOffset", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 5, "rows": rows(4, 1) })))
            .mount(&server)
            .await;

        let started = Instant::now();
        let pins = client(&server).with_page_limit(2).fetch_pins().await.unwrap();
        assert_eq!(pins.len(), 5);
        assert_eq!(pins[4].cid, "cid-4");
        // Two page transitions, 300 ms each
        assert!(started.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_fetch_pins_returns_partial_on_page_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/pinList"))
            .and(query_param("pageOffset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 10, "rows": rows(0, 2) })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/pinList"))
            .and(query_param("pageOffset", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let pins = client(&server)
            .with_page_limit(2)
            .with_page_delay(Duration::from_millis(1))
            .fetch_pins()
            .await
            .unwrap();
        assert_eq!(pins.len(), 2);
    }

    #[tokio::test]
    async fn test_unpin() {
        let server = MockServer::start().await;
        let pinned = crate::cid_for(b"pinned").unwrap();
        let missing = crate::cid_for(b"missing").unwrap();
        Mock::given(method("DELETE"))
            .and(path(format!("/pinning/unpin/{}", pinned)))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/pinning/unpin/{}", missing)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let pinata = client(&server);
        pinata.unpin(&pinned).await.unwrap();
        assert!(matches!(pinata.unpin(&missing).await, Err(IpfsError::Unpin(_))));
    }

    #[tokio::test]
    async fn test_path_segments_never_reach_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let pinata = client(&server);
        assert!(matches!(
            pinata.unpin("../../data/pinList").await,
            Err(IpfsError::InvalidCid(_))
        ));
        assert!(matches!(
            pinata.fetch("../pinning/pinJSONToIPFS").await,
            Err(IpfsError::InvalidCid(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_from_gateway() {
        let server = MockServer::start().await;
        let cid = crate::cid_for(b"stored").unwrap();
        Mock::given(method("GET"))
            .and(path(format!("/ipfs/{}", cid)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"stored".to_vec()))
            .mount(&server)
            .await;

        let pinata = client(&server);
        assert_eq!(pinata.fetch(&cid).await.unwrap(), b"stored");
        assert!(pinata.gateway_url(&cid).ends_with(&format!("/ipfs/{}", cid)));
    }

    #[test]
    fn test_empty_jwt_rejected() {
        assert!(PinataClient::new("https://api.pinata.cloud", "https://gateway.pinata.cloud", " ").is_err());
    }
}
