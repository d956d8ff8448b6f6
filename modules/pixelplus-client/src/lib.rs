pub mod error;
pub mod types;

pub use error::{PixelPlusError, Result};
pub use types::{CreateTaskRequest, CreateTaskResponse, QueryRanking, ReportBody, ReportResponse};

use std::time::Duration;

use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://tools.pixelplus.ru/api";

/// Fast-check endpoint family. Both take the same request shape; the Google
/// one additionally honours `search_engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Yandex rankings.
    FastCheck,
    /// Google rankings.
    FastCheckGoogle,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::FastCheck => "fastcheck",
            Endpoint::FastCheckGoogle => "fastcheckgoogle",
        }
    }
}

pub struct PixelPlusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    endpoint: Endpoint,
}

impl PixelPlusClient {
    pub fn new(base_url: &str, api_key: &str, endpoint: Endpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn endpoint_url(&self, extra: &[(&str, &str)]) -> Result<url::Url> {
        let mut params = vec![("key", self.api_key.as_str())];
        params.extend_from_slice(extra);
        let base = format!("{}/{}", self.base_url, self.endpoint.path());
        Ok(url::Url::parse_with_params(&base, &params)?)
    }

    /// Submit a rank-check task. Returns whatever the provider answered on a
    /// success status; the caller decides whether a report id is present.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse> {
        let url = self.endpoint_url(&[])?;
        tracing::debug!(
            target_url = %request.url,
            queries = request.queries.len(),
            body = %serde_json::to_string(request).unwrap_or_default(),
            "Sending task to provider"
        );

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        self.read_json(resp).await
    }

    /// Read a report by id. A missing `response` field means "not ready yet".
    pub async fn get_report(&self, report_id: &str) -> Result<ReportResponse> {
        let url = self.endpoint_url(&[("report_id", report_id)])?;
        tracing::debug!(report_id, "Requesting report");

        let resp = self.client.get(url).send().await?;
        self.read_json(resp).await
    }

    async fn read_json<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T> {
        let endpoint = self.endpoint.path();
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(endpoint, status = status.as_u16(), body = %body, "Received from provider");

        if !status.is_success() {
            return Err(PixelPlusError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| PixelPlusError::MalformedBody {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_carries_key_and_params() {
        let client =
            PixelPlusClient::new("https://tools.pixelplus.ru/api/", "secret", Endpoint::FastCheck)
                .unwrap();
        let url = client.endpoint_url(&[("report_id", "r 1")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://tools.pixelplus.ru/api/fastcheck?key=secret&report_id=r+1"
        );
    }

    #[test]
    fn google_endpoint_path() {
        let client =
            PixelPlusClient::new(DEFAULT_BASE_URL, "k", Endpoint::FastCheckGoogle).unwrap();
        let url = client.endpoint_url(&[]).unwrap();
        assert_eq!(url.path(), "/api/fastcheckgoogle");
    }

    mod http {
        use super::*;
        use wiremock::matchers::{body_partial_json, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn request() -> CreateTaskRequest {
            CreateTaskRequest {
                url: "example.com".into(),
                region_code: 213,
                queries: vec!["buy shoes".into()],
                search_engine: Some("google.ru".into()),
            }
        }

        fn client(server: &MockServer, endpoint: Endpoint) -> PixelPlusClient {
            PixelPlusClient::new(&server.uri(), "secret", endpoint).unwrap()
        }

        #[tokio::test]
        async fn create_task_posts_json_and_reads_report_id() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/fastcheckgoogle"))
                .and(query_param("key", "secret"))
                .and(body_partial_json(serde_json::json!({
                    "url": "example.com",
                    "lr": 213,
                    "requests": ["buy shoes"],
                    "search_engine": "google.ru"
                })))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"report_id": "r-1"})),
                )
                .expect(1)
                .mount(&server)
                .await;

            let resp = client(&server, Endpoint::FastCheckGoogle)
                .create_task(&request())
                .await
                .unwrap();
            assert_eq!(resp.report_id.as_deref(), Some("r-1"));
        }

        #[tokio::test]
        async fn server_error_maps_to_status() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/fastcheck"))
                .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
                .mount(&server)
                .await;

            let err = client(&server, Endpoint::FastCheck)
                .create_task(&request())
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(500));
            assert!(matches!(
                err,
                PixelPlusError::Status { endpoint: "fastcheck", ref body, .. } if body == "quota exceeded"
            ));
        }

        #[tokio::test]
        async fn get_report_reads_rankings() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/fastcheck"))
                .and(query_param("key", "secret"))
                .and(query_param("report_id", "r-9"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "response": {"queries": {"buy shoes": {"position": 4}}}
                })))
                .mount(&server)
                .await;

            let report = client(&server, Endpoint::FastCheck)
                .get_report("r-9")
                .await
                .unwrap();
            let queries = report.response.unwrap().queries;
            assert_eq!(queries["buy shoes"].position, Some(4));
        }

        #[tokio::test]
        async fn non_json_success_body_is_malformed() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/fastcheckgoogle"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
                .mount(&server)
                .await;

            let err = client(&server, Endpoint::FastCheckGoogle)
                .get_report("r-1")
                .await
                .unwrap_err();
            assert_eq!(err.status(), None);
            assert!(matches!(
                err,
                PixelPlusError::MalformedBody { endpoint: "fastcheckgoogle", .. }
            ));
        }
    }
}
