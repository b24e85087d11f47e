use super::*;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.scan.archive_extension, "jar");
    assert_eq!(config.scan.library_dir, "lib");
    assert_eq!(config.scan.excluded_archives, vec!["executors.jar"]);
    assert_eq!(config.scan.module_descriptor, "module-info");
    assert!(config.scan.scan_loose_classes);
    assert_eq!(config.scan.jobs, 0);
    assert!(!config.output.pretty);
}

#[test]
fn test_validate_valid_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_empty_extension() {
    let mut config = Config::default();
    config.scan.archive_extension = ".".to_string();
    assert!(matches!(
        config.validate(),
        Err(IndexError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn test_validate_library_dir() {
    let mut config = Config::default();
    config.scan.library_dir = String::new();
    assert!(config.validate().is_err());

    config.scan.library_dir = "lib/ext".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_module_descriptor() {
    let mut config = Config::default();
    config.scan.module_descriptor = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_partial_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[scan]\nexcluded_archives = [\"executors.jar\", \"agent.jar\"]\njobs = 2\n"
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.scan.excluded_archives, vec!["executors.jar", "agent.jar"]);
    assert_eq!(config.scan.jobs, 2);
    assert_eq!(config.scan.archive_extension, "jar");
    assert!(!config.output.pretty);
}

#[test]
fn test_toml_round_trip() {
    let mut config = Config::default();
    config.output.pretty = true;
    config.scan.scan_loose_classes = false;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml::to_string(&config).unwrap().as_bytes())
        .unwrap();
    assert_eq!(Config::from_file(file.path()).unwrap(), config);
}

#[test]
fn test_load_nonexistent_file() {
    let result = Config::from_file(Path::new("/nonexistent/config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        IndexError::Config(ConfigError::FileNotFound(_))
    ));
}

#[test]
fn test_load_invalid_toml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[scan\njobs = ").unwrap();
    assert!(matches!(
        Config::from_file(file.path()).unwrap_err(),
        IndexError::Config(ConfigError::ParseFailed(_))
    ));
}

#[test]
fn test_load_without_path_uses_defaults() {
    assert_eq!(Config::load(None).unwrap(), Config::default());
}

#[test]
fn test_env_overrides() {
    let mut config = Config::default();
    config.apply_overrides_from(env(&[
        ("CLASSPATH_INDEX_JOBS", "4"),
        ("CLASSPATH_INDEX_EXCLUDE", "agent.jar, executors.jar,,tools.jar"),
        ("CLASSPATH_INDEX_PRETTY", "true"),
    ]));
    assert_eq!(config.scan.jobs, 4);
    assert_eq!(
        config.scan.excluded_archives,
        vec!["executors.jar", "agent.jar", "tools.jar"]
    );
    assert!(config.output.pretty);
}

#[test]
fn test_invalid_env_values_ignored() {
    let mut config = Config::default();
    config.apply_overrides_from(env(&[
        ("CLASSPATH_INDEX_JOBS", "many"),
        ("CLASSPATH_INDEX_PRETTY", "maybe"),
    ]));
    assert_eq!(config, Config::default());
}
