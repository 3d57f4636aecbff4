//! Mock implementations for repository and topology traits
//!
//! This module provides in-memory implementations that can be used for unit
//! testing without requiring an actual database or a live cluster.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use profiler_domain::entities::{Bundle, ComponentDescriptor, Profile, ProfileState};
use profiler_domain::ports::TopologyProvider;
use profiler_domain::repositories::{BundleRepository, ProfileRepository};
use profiler_errors::{ProfilerError, ProfilerResult};

/// In-memory implementation of BundleRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MemoryBundleRepository {
    bundles: Arc<Mutex<HashMap<i64, Bundle>>>,
    next_id: Arc<Mutex<i64>>,
}

impl MemoryBundleRepository {
    pub fn new() -> Self {
        Self {
            bundles: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    pub fn count(&self) -> usize {
        self.bundles.lock().unwrap().len()
    }
}

#[async_trait]
impl BundleRepository for MemoryBundleRepository {
    async fn create(&self, bundle: &Bundle) -> ProfilerResult<Bundle> {
        let mut next_id = self.next_id.lock().unwrap();
        let mut created = bundle.clone();
        created.id = *next_id;
        *next_id += 1;
        self.bundles
            .lock()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ProfilerResult<Option<Bundle>> {
        Ok(self.bundles.lock().unwrap().get(&id).cloned())
    }

    async fn list_newest_first(&self) -> ProfilerResult<Vec<Bundle>> {
        let mut bundles: Vec<Bundle> = self.bundles.lock().unwrap().values().cloned().collect();
        bundles.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(bundles)
    }
}

/// In-memory implementation of ProfileRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileRepository {
    profiles: Arc<Mutex<HashMap<i64, Profile>>>,
    next_id: Arc<Mutex<i64>>,
}

impl MemoryProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    pub fn count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn create_batch(&self, profiles: &[Profile]) -> ProfilerResult<Vec<Profile>> {
        let mut next_id = self.next_id.lock().unwrap();
        let mut map = self.profiles.lock().unwrap();
        let mut created = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let mut row = profile.clone();
            row.id = *next_id;
            *next_id += 1;
            map.insert(row.id, row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ProfilerResult<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_bundle(&self, bundle_id: i64) -> ProfilerResult<Vec<Profile>> {
        let mut rows: Vec<Profile> = self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.bundle_id == bundle_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(rows)
    }

    async fn update_progress(&self, id: i64, progress: f64) -> ProfilerResult<()> {
        let mut map = self.profiles.lock().unwrap();
        if let Some(row) = map.get_mut(&id) {
            // same discipline as the on-disk store: heartbeats never touch
            // rows that already reached a terminal state
            if row.state == ProfileState::Running {
                row.progress = progress;
            }
        }
        Ok(())
    }

    async fn finish(
        &self,
        id: i64,
        state: ProfileState,
        error: Option<String>,
        data: Option<Vec<u8>>,
    ) -> ProfilerResult<()> {
        let mut map = self.profiles.lock().unwrap();
        let row = map
            .get_mut(&id)
            .ok_or(ProfilerError::ProfileNotFound { id })?;
        row.state = state;
        row.error = error;
        row.data = data;
        row.progress = 1.0;
        row.finished_at = Some(Utc::now());
        Ok(())
    }

    async fn fail_all_running(&self, error: &str) -> ProfilerResult<u64> {
        let mut map = self.profiles.lock().unwrap();
        let mut affected = 0;
        for row in map.values_mut() {
            if row.state == ProfileState::Running {
                row.state = ProfileState::Error;
                row.error = Some(error.to_string());
                row.progress = 1.0;
                row.finished_at = Some(Utc::now());
                affected += 1;
            }
        }
        Ok(affected)
    }
}

/// Topology provider returning canned component lists
#[derive(Debug, Clone, Default)]
pub struct MockTopologyProvider {
    pd: Vec<ComponentDescriptor>,
    tidb: Vec<ComponentDescriptor>,
    tikv: Vec<ComponentDescriptor>,
    tiflash: Vec<ComponentDescriptor>,
}

impl MockTopologyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pd(mut self, descriptors: Vec<ComponentDescriptor>) -> Self {
        self.pd = descriptors;
        self
    }

    pub fn with_tidb(mut self, descriptors: Vec<ComponentDescriptor>) -> Self {
        self.tidb = descriptors;
        self
    }

    pub fn with_tikv(mut self, descriptors: Vec<ComponentDescriptor>) -> Self {
        self.tikv = descriptors;
        self
    }

    pub fn with_tiflash(mut self, descriptors: Vec<ComponentDescriptor>) -> Self {
        self.tiflash = descriptors;
        self
    }
}

#[async_trait]
impl TopologyProvider for MockTopologyProvider {
    async fn get_pd(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.pd.clone())
    }

    async fn get_tidb(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.tidb.clone())
    }

    async fn get_tikv(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.tikv.clone())
    }

    async fn get_tiflash(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.tiflash.clone())
    }
}
