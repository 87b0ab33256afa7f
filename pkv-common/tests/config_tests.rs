//! Tests for configuration loading and root folder resolution
//!
//! Tests that manipulate PKV_ROOT_FOLDER or PKV_ROOT are marked with #[serial]
//! so they never race on the process environment.

use pkv_common::config::{
    load_toml_config, locate_config_file, write_toml_config, CompiledDefaults, ProbeMode,
    RootFolderInitializer, RootFolderResolver, TomlConfig, ROOT_ENV, ROOT_FOLDER_ENV,
};
use pkv_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    env::remove_var(ROOT_ENV);
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.port, 5740);

    #[cfg(target_os = "linux")]
    assert!(defaults.root_folder.ends_with("pkv"));
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_env();
    let root_folder = RootFolderResolver::new("test").resolve();
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/pkv-env");
    let root_folder = RootFolderResolver::new("test")
        .with_cli_arg(Some(PathBuf::from("/tmp/pkv-cli")))
        .resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/pkv-cli"));
    clear_env();
}

#[test]
#[serial]
fn test_resolver_env_priority() {
    clear_env();
    env::set_var(ROOT_ENV, "/tmp/pkv-short");
    assert_eq!(
        RootFolderResolver::new("test").resolve(),
        PathBuf::from("/tmp/pkv-short")
    );

    env::set_var(ROOT_FOLDER_ENV, "/tmp/pkv-long");
    assert_eq!(
        RootFolderResolver::new("test").resolve(),
        PathBuf::from("/tmp/pkv-long")
    );
    clear_env();
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    clear_env();
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/pkv-toml")),
        ..Default::default()
    };

    let resolver = RootFolderResolver::new("test").with_config(&config);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/pkv-toml"));

    env::set_var(ROOT_ENV, "/tmp/pkv-env");
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/pkv-env"));
    clear_env();
}

#[test]
#[serial]
fn test_resolver_ignores_blank_env() {
    clear_env();
    env::set_var(ROOT_FOLDER_ENV, "   ");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/pkv-toml")),
        ..Default::default()
    };
    assert_eq!(
        RootFolderResolver::new("test").with_config(&config).resolve(),
        PathBuf::from("/tmp/pkv-toml")
    );
    clear_env();
}

#[test]
fn test_initializer_creates_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("nested").join("pkv");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();
    assert!(root.is_dir());
    assert_eq!(initializer.contact_dir(), root.join("contact"));

    // Second call is a no-op
    initializer.ensure_directory_exists().unwrap();
}

#[test]
fn test_missing_config_gives_defaults() {
    let temp = TempDir::new().unwrap();
    let config = load_toml_config(Some(&temp.path().join("absent.toml"))).unwrap();
    assert_eq!(config, TomlConfig::default());

    assert_eq!(load_toml_config(None).unwrap(), TomlConfig::default());
}

#[test]
fn test_malformed_config_is_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    match load_toml_config(Some(&path)) {
        Err(Error::Config(message)) => assert!(message.contains("config.toml")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[listing]\npage_size = 0\n").unwrap();
    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_write_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("etc").join("config.toml");

    let mut config = TomlConfig::default();
    config.server.port = 9001;
    config.images.probe = ProbeMode::Http;
    config
        .images
        .category_placeholders
        .insert("cafes".to_string(), "/static/cafe.svg".to_string());
    config.root_folder = Some(PathBuf::from("/srv/pkv"));

    write_toml_config(&config, &path).unwrap();
    assert!(!path.with_extension("toml.tmp").exists());

    let loaded = load_toml_config(Some(&path)).unwrap();
    assert_eq!(loaded, config);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_explicit_config_path_is_used() {
    let path = PathBuf::from("/nonexistent/pkv.toml");
    assert_eq!(locate_config_file(Some(&path)), Some(path));
}
