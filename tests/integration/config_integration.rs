//! Layered configuration: global file, workspace files, environment

use super::test_utils::with_isolated_env;
use tempfile::TempDir;
use uprtcl::config::{global_config_path, ConfigLoader, StorageBackend};

#[test]
fn test_defaults_without_any_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.agent.creator_id, "anonymous");
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert!(config
            .storage
            .resolved_path()
            .starts_with(test_dir.path().join("data")));
    });
}

#[test]
fn test_global_then_workspace_then_environment() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let global = global_config_path().unwrap();
        assert_eq!(global, test_dir.path().join("uprtcl").join("config.toml"));
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(
            &global,
            "[agent]\ncreator_id = \"global\"\n[storage]\nbackend = \"memory\"\n[consistency]\nmax_attempts = 3\n",
        )
        .unwrap();

        std::fs::create_dir_all(workspace.path().join("config")).unwrap();
        std::fs::write(
            workspace.path().join("config").join("config.toml"),
            "[agent]\ncreator_id = \"workspace\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.agent.creator_id, "workspace");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.consistency.max_attempts, 3);

        std::env::set_var("UPRTCL_AGENT__CREATOR_ID", "from-env");
        std::env::set_var("UPRTCL_CONSISTENCY__MAX_ATTEMPTS", "5");
        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.agent.creator_id, "from-env");
        assert_eq!(config.read_policy().max_attempts, 5);
    });
}

#[test]
fn test_invalid_layered_config_is_rejected() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        std::fs::create_dir_all(workspace.path().join("config")).unwrap();
        std::fs::write(
            workspace.path().join("config").join("config.toml"),
            "[consistency]\ninitial_backoff_ms = 900\nmax_backoff_ms = 100\n",
        )
        .unwrap();
        let err = ConfigLoader::load(workspace.path()).unwrap_err();
        assert!(err.to_string().contains("initial_backoff_ms"));
    });
}
