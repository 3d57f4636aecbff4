use std::time::Duration;

use profiler_config::{ClusterConfig, CollectorConfig};
use profiler_domain::entities::ComponentKind;
use profiler_errors::{ProfilerError, ProfilerResult};
use tracing::debug;

/// HTTP client for one component kind.
///
/// The scheme mirrors the cluster TLS configuration: a TLS-enabled cluster
/// serves its pprof endpoints over https.
#[derive(Clone)]
pub struct ComponentHttpClient {
    client: reqwest::Client,
    tls_enabled: bool,
}

impl ComponentHttpClient {
    pub fn new(connect_timeout: Duration, tls_enabled: bool) -> ProfilerResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ProfilerError::internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            tls_enabled,
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls_enabled {
            "https"
        } else {
            "http"
        }
    }

    /// Issues the GET and buffers the whole body. Transport errors and
    /// non-2xx statuses are reported with the underlying error text kept
    /// intact so callers can diagnose unreachable responders.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> ProfilerResult<Vec<u8>> {
        debug!("fetching profile from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProfilerError::Fetch(format!("failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProfilerError::Fetch(format!(
                "failed to fetch {url}: unexpected status code {status}: {body}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProfilerError::Fetch(format!("failed to read body from {url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Per-component-kind HTTP clients. Any subset may be absent; a profile whose
/// target kind has no client terminates skipped instead of errored, so that a
/// deployment which chose not to probe a component does not taint bundles.
#[derive(Clone, Default)]
pub struct HttpClientBundle {
    pd: Option<ComponentHttpClient>,
    tidb: Option<ComponentHttpClient>,
    tikv: Option<ComponentHttpClient>,
    tiflash: Option<ComponentHttpClient>,
}

impl HttpClientBundle {
    /// Builds one client per component kind declared in the cluster config.
    /// A kind with no declared endpoints gets no client, so targets of that
    /// kind terminate skipped instead of errored.
    pub fn from_config(config: &CollectorConfig, cluster: &ClusterConfig) -> ProfilerResult<Self> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_seconds);
        let client = |enabled: bool| -> ProfilerResult<Option<ComponentHttpClient>> {
            if enabled {
                Ok(Some(ComponentHttpClient::new(
                    connect_timeout,
                    cluster.tls_enabled,
                )?))
            } else {
                Ok(None)
            }
        };
        Ok(Self {
            pd: client(!cluster.pd.is_empty())?,
            tidb: client(!cluster.tidb.is_empty())?,
            tikv: client(!cluster.tikv.is_empty())?,
            tiflash: client(!cluster.tiflash.is_empty())?,
        })
    }

    pub fn with_pd(mut self, client: ComponentHttpClient) -> Self {
        self.pd = Some(client);
        self
    }

    pub fn with_tidb(mut self, client: ComponentHttpClient) -> Self {
        self.tidb = Some(client);
        self
    }

    pub fn with_tikv(mut self, client: ComponentHttpClient) -> Self {
        self.tikv = Some(client);
        self
    }

    pub fn with_tiflash(mut self, client: ComponentHttpClient) -> Self {
        self.tiflash = Some(client);
        self
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&ComponentHttpClient> {
        match kind {
            ComponentKind::Pd => self.pd.as_ref(),
            ComponentKind::Tidb => self.tidb.as_ref(),
            ComponentKind::Tikv => self.tikv.as_ref(),
            ComponentKind::Tiflash => self.tiflash.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ComponentHttpClient {
        ComponentHttpClient::new(Duration::from_secs(2), false).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_buffers_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/debug/pprof/profile"))
            .and(query_param("seconds", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"foobar".to_vec()))
            .mount(&server)
            .await;

        let url = format!("{}/debug/pprof/profile?seconds=20", server.uri());
        let body = client().fetch(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(body, b"foobar");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/debug/pprof/heap"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let url = format!("{}/debug/pprof/heap", server.uri());
        let err = client()
            .fetch(&url, Duration::from_secs(5))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("503"), "unexpected message: {msg}");
        assert!(msg.contains("overloaded"), "unexpected message: {msg}");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_keeps_transport_error() {
        // nothing listens on this port
        let err = client()
            .fetch("http://127.0.0.1:1/debug/pprof/profile", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfilerError::Fetch(_)));
        assert!(err.to_string().contains("http://127.0.0.1:1"));
    }

    #[test]
    fn test_bundle_lookup_and_absence() {
        let bundle = HttpClientBundle::default().with_tidb(client());
        assert!(bundle.get(ComponentKind::Tidb).is_some());
        assert!(bundle.get(ComponentKind::Tiflash).is_none());
        assert!(bundle.get(ComponentKind::Pd).is_none());
    }

    #[test]
    fn test_scheme_follows_tls() {
        assert_eq!(client().scheme(), "http");
        let tls_client = ComponentHttpClient::new(Duration::from_secs(2), true).unwrap();
        assert_eq!(tls_client.scheme(), "https");
    }

    #[test]
    fn test_from_config_only_builds_declared_kinds() {
        use profiler_config::{AppConfig, ComponentEndpoint};

        let config = AppConfig::default();
        let mut cluster = config.cluster.clone();
        cluster.tidb = vec![ComponentEndpoint {
            ip: "tidb-1.internal".to_string(),
            port: 4000,
            status_port: 10080,
        }];
        cluster.pd = vec![ComponentEndpoint {
            ip: "pd-1.internal".to_string(),
            port: 2379,
            status_port: 0,
        }];

        // a deployment that declares no TiKV/TiFlash nodes gets no clients
        // for them, which routes their profiles to the skipped state
        let bundle = HttpClientBundle::from_config(&config.collector, &cluster).unwrap();
        assert!(bundle.get(ComponentKind::Pd).is_some());
        assert!(bundle.get(ComponentKind::Tidb).is_some());
        assert!(bundle.get(ComponentKind::Tikv).is_none());
        assert!(bundle.get(ComponentKind::Tiflash).is_none());
    }
}
