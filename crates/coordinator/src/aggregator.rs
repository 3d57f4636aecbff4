//! Bundle 聚合状态推导

use profiler_domain::entities::{BundleState, Profile, ProfileState};

/// 由子 Profile 的实时状态推导 Bundle 状态。
///
/// Skipped 与 Succeeded 同组：部署层面主动放弃的抓取不算 Bundle 级失败，
/// 全部 Skipped 的 Bundle 报告为 AllSucceeded。
pub fn bundle_state(profiles: &[Profile]) -> BundleState {
    if profiles.iter().any(|p| p.state == ProfileState::Running) {
        return BundleState::Running;
    }

    let total = profiles.len();
    let succeeded = profiles.iter().filter(|p| p.counts_as_success()).count();
    let errored = profiles
        .iter()
        .filter(|p| p.state == ProfileState::Error)
        .count();

    if succeeded == total {
        BundleState::AllSucceeded
    } else if errored == total {
        BundleState::AllFailed
    } else {
        BundleState::PartialSucceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profiler_domain::entities::{ComponentDescriptor, ComponentKind, ProfileKind};

    fn profile_in(state: ProfileState) -> Profile {
        let mut profile = Profile::new(
            1,
            ComponentDescriptor {
                ip: "tidb-1.internal".to_string(),
                port: 4000,
                status_port: 10080,
                kind: ComponentKind::Tidb,
            },
            ProfileKind::Cpu,
        );
        profile.state = state;
        profile
    }

    #[test]
    fn test_any_running_wins() {
        let profiles = vec![
            profile_in(ProfileState::Succeeded),
            profile_in(ProfileState::Error),
            profile_in(ProfileState::Running),
        ];
        assert_eq!(bundle_state(&profiles), BundleState::Running);
    }

    #[test]
    fn test_all_succeeded() {
        let profiles = vec![
            profile_in(ProfileState::Succeeded),
            profile_in(ProfileState::Succeeded),
        ];
        assert_eq!(bundle_state(&profiles), BundleState::AllSucceeded);
    }

    #[test]
    fn test_skipped_counts_toward_success() {
        let profiles = vec![
            profile_in(ProfileState::Succeeded),
            profile_in(ProfileState::Skipped),
        ];
        assert_eq!(bundle_state(&profiles), BundleState::AllSucceeded);

        // 全部 Skipped 也算全部成功
        let profiles = vec![
            profile_in(ProfileState::Skipped),
            profile_in(ProfileState::Skipped),
        ];
        assert_eq!(bundle_state(&profiles), BundleState::AllSucceeded);
    }

    #[test]
    fn test_all_failed() {
        let profiles = vec![profile_in(ProfileState::Error), profile_in(ProfileState::Error)];
        assert_eq!(bundle_state(&profiles), BundleState::AllFailed);
    }

    #[test]
    fn test_mixed_terminal_states_are_partial() {
        let profiles = vec![
            profile_in(ProfileState::Error),
            profile_in(ProfileState::Succeeded),
        ];
        assert_eq!(bundle_state(&profiles), BundleState::PartialSucceeded);

        // 有 Error 时哪怕其余全是 Skipped 也是部分成功
        let profiles = vec![
            profile_in(ProfileState::Error),
            profile_in(ProfileState::Skipped),
        ];
        assert_eq!(bundle_state(&profiles), BundleState::PartialSucceeded);
    }
}
