//! Shared test utilities for integration tests
//!
//! Builders for an API over each replica kind, plus isolation of the environment
//! variables the configuration loader reads.

use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uprtcl::consistency::ReadPolicy;
use uprtcl::content::Content;
use uprtcl::provenance::AcceptAll;
use uprtcl::store::{LaggingReplica, MemoryReplica, SledReplica};
use uprtcl::{Address, VersionControlApi};

/// Serializes every test that touches process-wide environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "UPRTCL_ENV",
    "UPRTCL_AGENT__CREATOR_ID",
    "UPRTCL_CONSISTENCY__MAX_ATTEMPTS",
];

/// Re-reads without sleeping, enough to drain any lag used in these tests
pub fn fast_policy() -> ReadPolicy {
    ReadPolicy::immediate(16)
}

pub fn memory_api(creator: &str) -> VersionControlApi {
    VersionControlApi::new(
        Arc::new(MemoryReplica::new()),
        Arc::new(AcceptAll),
        creator,
        fast_policy(),
    )
}

/// API over a replica that hides every write from the next `lag` reads of its key
pub fn lagging_api(
    creator: &str,
    lag: u32,
    policy: ReadPolicy,
) -> (VersionControlApi, Arc<LaggingReplica<MemoryReplica>>) {
    let replica = Arc::new(LaggingReplica::new(MemoryReplica::new(), lag));
    let api = VersionControlApi::new(replica.clone(), Arc::new(AcceptAll), creator, policy);
    (api, replica)
}

/// Second API over the same replica, as another client would see it
pub fn peer_api(replica: Arc<LaggingReplica<MemoryReplica>>, creator: &str) -> VersionControlApi {
    VersionControlApi::new(replica, Arc::new(AcceptAll), creator, fast_policy())
}

pub fn sled_api(dir: &TempDir, creator: &str) -> (VersionControlApi, Arc<SledReplica>) {
    let replica = Arc::new(SledReplica::new(dir.path().join("store")).unwrap());
    let api = VersionControlApi::new(replica.clone(), Arc::new(AcceptAll), creator, fast_policy());
    (api, replica)
}

/// Store a leaf content object and return its address
pub async fn leaf(api: &VersionControlApi, payload: &str) -> Address {
    api.put_content(&Content::leaf(payload)).await.unwrap()
}

/// Run `f` with HOME and XDG directories pointing into `test_dir` and no uprtcl variables set
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }
    let home = test_dir.path().join("home");
    let data = test_dir.path().join("data");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&data).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());
    std::env::set_var("XDG_DATA_HOME", &data);

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    result
}
