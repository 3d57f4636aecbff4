use std::sync::Arc;
use std::time::Duration;

use profiler_domain::entities::{Profile, ProfileState};
use profiler_domain::repositories::ProfileRepository;
use profiler_errors::ProfilerError;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::clients::HttpClientBundle;
use crate::recipes::resolve_recipe;

const PROGRESS_TICK: Duration = Duration::from_secs(1);
/// The ticker never reports completion; only the terminal write sets 1.0.
const PROGRESS_CEILING: f64 = 0.99;

/// Drives one profile row from running to a terminal state.
///
/// State machine per profile:
/// running -> succeeded (fetch ok)
/// running -> error     (fetch failed; message recorded verbatim)
/// running -> skipped   (no recipe or no client; no request issued)
pub struct ProfileTaskExecutor {
    profiles: Arc<dyn ProfileRepository>,
    clients: HttpClientBundle,
    request_timeout_margin: Duration,
}

impl ProfileTaskExecutor {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        clients: HttpClientBundle,
        request_timeout_margin: Duration,
    ) -> Self {
        Self {
            profiles,
            clients,
            request_timeout_margin,
        }
    }

    /// Executes the fetch for one profile row. Never returns an error: fetch
    /// failures are recorded in the row, not raised.
    pub async fn execute(
        &self,
        profile: Profile,
        duration_secs: u32,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let Some(recipe) = resolve_recipe(profile.target.kind, profile.kind) else {
            debug!(
                "profile {}: {} does not support {} profiling, skipping",
                profile.id, profile.target.kind, profile.kind
            );
            self.finish(profile.id, ProfileState::Skipped, None, None).await;
            return;
        };

        let Some(client) = self.clients.get(profile.target.kind) else {
            debug!(
                "profile {}: no http client configured for {}, skipping",
                profile.id, profile.target.kind
            );
            self.finish(profile.id, ProfileState::Skipped, None, None).await;
            return;
        };

        let expected_secs = recipe.expected_duration_secs(duration_secs).max(1);
        let ticker = {
            let profiles = Arc::clone(&self.profiles);
            let profile_id = profile.id;
            tokio::spawn(async move {
                let started = Instant::now();
                let mut tick = interval(PROGRESS_TICK);
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // the first tick completes immediately; skip it so the row
                // keeps its initial progress of 0 for the first second
                tick.tick().await;
                loop {
                    tick.tick().await;
                    let progress = (started.elapsed().as_secs_f64() / expected_secs as f64)
                        .min(PROGRESS_CEILING);
                    if let Err(e) = profiles.update_progress(profile_id, progress).await {
                        warn!("profile {} progress update failed: {}", profile_id, e);
                    }
                }
            })
        };

        let mut url = format!(
            "{}://{}:{}{}",
            client.scheme(),
            profile.target.ip,
            recipe.select_port(&profile.target),
            recipe.path
        );
        if let Some(query) = recipe.query(duration_secs) {
            url.push('?');
            url.push_str(&query);
        }

        let timeout = Duration::from_secs(duration_secs as u64) + self.request_timeout_margin;

        // The fetch races against process shutdown; an interrupted fetch is
        // recorded as an error so the bundle still reaches a terminal state.
        let result = tokio::select! {
            result = client.fetch(&url, timeout) => result,
            _ = shutdown_rx.recv() => {
                Err(ProfilerError::Fetch("profiling is interrupted".to_string()))
            }
        };

        ticker.abort();

        match result {
            Ok(data) => {
                debug!("profile {} succeeded, {} bytes", profile.id, data.len());
                self.finish(profile.id, ProfileState::Succeeded, None, Some(data))
                    .await;
            }
            Err(e) => {
                warn!("profile {} failed: {}", profile.id, e);
                self.finish(profile.id, ProfileState::Error, Some(e.to_string()), None)
                    .await;
            }
        }
    }

    async fn finish(
        &self,
        profile_id: i64,
        state: ProfileState,
        error_message: Option<String>,
        data: Option<Vec<u8>>,
    ) {
        if let Err(e) = self
            .profiles
            .finish(profile_id, state, error_message, data)
            .await
        {
            error!("profile {} terminal write failed: {}", profile_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ComponentHttpClient;
    use profiler_domain::entities::{ComponentDescriptor, ComponentKind, ProfileKind};
    use profiler_testing_utils::MemoryProfileRepository;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor(repo: &MemoryProfileRepository, clients: HttpClientBundle) -> ProfileTaskExecutor {
        ProfileTaskExecutor::new(Arc::new(repo.clone()), clients, Duration::from_secs(10))
    }

    fn client() -> ComponentHttpClient {
        ComponentHttpClient::new(Duration::from_secs(2), false).unwrap()
    }

    async fn seed(repo: &MemoryProfileRepository, target: ComponentDescriptor, kind: ProfileKind) -> Profile {
        repo.create_batch(&[Profile::new(1, target, kind)])
            .await
            .unwrap()
            .remove(0)
    }

    fn descriptor(kind: ComponentKind, status_port: u16) -> ComponentDescriptor {
        ComponentDescriptor {
            ip: "127.0.0.1".to_string(),
            port: 1,
            status_port,
            kind,
        }
    }

    #[tokio::test]
    async fn test_unsupported_pair_skips_without_request() {
        let repo = MemoryProfileRepository::new();
        let profile = seed(&repo, descriptor(ComponentKind::Tikv, 1), ProfileKind::Mutex).await;
        let (_tx, rx) = broadcast::channel(1);

        executor(&repo, HttpClientBundle::default().with_tikv(client()))
            .execute(profile.clone(), 10, rx)
            .await;

        let row = repo.get_by_id(profile.id).await.unwrap().unwrap();
        assert_eq!(row.state, ProfileState::Skipped);
        assert_eq!(row.progress, 1.0);
        assert!(row.error.is_none());
        assert!(row.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_client_skips() {
        let repo = MemoryProfileRepository::new();
        let profile = seed(&repo, descriptor(ComponentKind::Tiflash, 1), ProfileKind::Cpu).await;
        let (_tx, rx) = broadcast::channel(1);

        executor(&repo, HttpClientBundle::default())
            .execute(profile.clone(), 10, rx)
            .await;

        let row = repo.get_by_id(profile.id).await.unwrap().unwrap();
        assert_eq!(row.state, ProfileState::Skipped);
        assert_eq!(row.progress, 1.0);
    }

    #[tokio::test]
    async fn test_successful_fetch_stores_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/debug/pprof/profile"))
            .and(query_param("seconds", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"foobar".to_vec()))
            .mount(&server)
            .await;

        let repo = MemoryProfileRepository::new();
        let profile = seed(
            &repo,
            descriptor(ComponentKind::Tidb, server.address().port()),
            ProfileKind::Cpu,
        )
        .await;
        let (_tx, rx) = broadcast::channel(1);

        executor(&repo, HttpClientBundle::default().with_tidb(client()))
            .execute(profile.clone(), 10, rx)
            .await;

        let row = repo.get_by_id(profile.id).await.unwrap().unwrap();
        assert_eq!(row.state, ProfileState::Succeeded);
        assert_eq!(row.progress, 1.0);
        assert_eq!(row.data.as_deref(), Some(b"foobar".as_ref()));
    }

    #[tokio::test]
    async fn test_failed_fetch_records_message() {
        let repo = MemoryProfileRepository::new();
        // nothing listens on port 1
        let profile = seed(&repo, descriptor(ComponentKind::Tidb, 1), ProfileKind::Cpu).await;
        let (_tx, rx) = broadcast::channel(1);

        executor(&repo, HttpClientBundle::default().with_tidb(client()))
            .execute(profile.clone(), 10, rx)
            .await;

        let row = repo.get_by_id(profile.id).await.unwrap().unwrap();
        assert_eq!(row.state, ProfileState::Error);
        assert_eq!(row.progress, 1.0);
        let message = row.error.unwrap();
        assert!(message.contains("failed to fetch"), "{message}");
        assert!(message.contains("127.0.0.1:1"), "{message}");
        assert!(row.data.is_none());
    }
}
