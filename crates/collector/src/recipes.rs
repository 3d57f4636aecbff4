//! Static capability table: for each (component kind, profile kind) pair,
//! either a fetch recipe or nothing. A missing entry means the profile must
//! terminate in the skipped state without issuing any request.

use profiler_domain::entities::{ComponentDescriptor, ComponentKind, ProfileKind};

/// Which port of the target the profiling endpoint listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPort {
    /// PD exposes pprof on its service port.
    Port,
    /// TiDB / TiKV / TiFlash expose pprof on the status port.
    StatusPort,
}

/// How to fetch one (component kind, profile kind) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRecipe {
    pub path: &'static str,
    pub host_port: HostPort,
    /// Timed profiles sample for `duration_secs` and carry `?seconds=`;
    /// snapshot profiles return immediately and ignore the duration.
    pub timed: bool,
}

/// Progress estimate for snapshot kinds; they normally return within a second.
const SNAPSHOT_EXPECTED_SECS: u32 = 2;

impl FetchRecipe {
    pub fn query(&self, duration_secs: u32) -> Option<String> {
        self.timed.then(|| format!("seconds={duration_secs}"))
    }

    /// Used only for progress estimation, never as a deadline.
    pub fn expected_duration_secs(&self, duration_secs: u32) -> u32 {
        if self.timed {
            duration_secs
        } else {
            SNAPSHOT_EXPECTED_SECS
        }
    }

    pub fn select_port(&self, target: &ComponentDescriptor) -> u16 {
        match self.host_port {
            HostPort::Port => target.port,
            HostPort::StatusPort => target.status_port,
        }
    }
}

const fn pprof(path: &'static str, host_port: HostPort, timed: bool) -> Option<FetchRecipe> {
    Some(FetchRecipe {
        path,
        host_port,
        timed,
    })
}

/// The capability table. TiKV and TiFlash only support CPU profiling; the
/// Go-runtime components (PD, TiDB) additionally expose heap, mutex and
/// goroutine snapshots.
pub fn resolve_recipe(component: ComponentKind, kind: ProfileKind) -> Option<FetchRecipe> {
    use ComponentKind::*;
    use ProfileKind::*;

    match (component, kind) {
        (Pd, Cpu) => pprof("/debug/pprof/profile", HostPort::Port, true),
        (Pd, Heap) => pprof("/debug/pprof/heap", HostPort::Port, false),
        (Pd, Mutex) => pprof("/debug/pprof/mutex", HostPort::Port, false),
        (Pd, Goroutine) => pprof("/debug/pprof/goroutine", HostPort::Port, false),

        (Tidb, Cpu) => pprof("/debug/pprof/profile", HostPort::StatusPort, true),
        (Tidb, Heap) => pprof("/debug/pprof/heap", HostPort::StatusPort, false),
        (Tidb, Mutex) => pprof("/debug/pprof/mutex", HostPort::StatusPort, false),
        (Tidb, Goroutine) => pprof("/debug/pprof/goroutine", HostPort::StatusPort, false),

        (Tikv, Cpu) => pprof("/debug/pprof/profile", HostPort::StatusPort, true),
        (Tiflash, Cpu) => pprof("/debug/pprof/profile", HostPort::StatusPort, true),

        (Tikv, _) | (Tiflash, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pd_uses_service_port() {
        let recipe = resolve_recipe(ComponentKind::Pd, ProfileKind::Cpu).unwrap();
        assert_eq!(recipe.host_port, HostPort::Port);
        assert_eq!(recipe.path, "/debug/pprof/profile");
        assert_eq!(recipe.query(20).as_deref(), Some("seconds=20"));
        assert_eq!(recipe.expected_duration_secs(20), 20);
    }

    #[test]
    fn test_tidb_uses_status_port() {
        let recipe = resolve_recipe(ComponentKind::Tidb, ProfileKind::Heap).unwrap();
        assert_eq!(recipe.host_port, HostPort::StatusPort);
        assert_eq!(recipe.path, "/debug/pprof/heap");
        // snapshot kinds ignore the duration
        assert_eq!(recipe.query(20), None);
        assert_eq!(recipe.expected_duration_secs(20), 2);
    }

    #[test]
    fn test_tikv_and_tiflash_are_cpu_only() {
        assert!(resolve_recipe(ComponentKind::Tikv, ProfileKind::Cpu).is_some());
        assert!(resolve_recipe(ComponentKind::Tiflash, ProfileKind::Cpu).is_some());

        for kind in [ProfileKind::Heap, ProfileKind::Mutex, ProfileKind::Goroutine] {
            assert!(resolve_recipe(ComponentKind::Tikv, kind).is_none());
            assert!(resolve_recipe(ComponentKind::Tiflash, kind).is_none());
        }
    }

    #[test]
    fn test_port_selection() {
        let target = ComponentDescriptor {
            ip: "pd-1.internal".to_string(),
            port: 2379,
            status_port: 2380,
            kind: ComponentKind::Pd,
        };
        let pd_cpu = resolve_recipe(ComponentKind::Pd, ProfileKind::Cpu).unwrap();
        assert_eq!(pd_cpu.select_port(&target), 2379);

        let target = ComponentDescriptor {
            ip: "tidb-1.internal".to_string(),
            port: 4000,
            status_port: 10080,
            kind: ComponentKind::Tidb,
        };
        let tidb_cpu = resolve_recipe(ComponentKind::Tidb, ProfileKind::Cpu).unwrap();
        assert_eq!(tidb_cpu.select_port(&target), 10080);
    }
}
