//! Configuration file loading tests

#![cfg(all(feature = "config", feature = "hooks"))]

use refrain::{ConfigError, RefrainConfig, ServiceCollection, ViewContext};
use rstest::*;
use std::io::Write;
use std::sync::Arc;

#[rstest]
fn test_file_configures_registry() {
	// Arrange
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(
		file,
		"[hooks]\nstrict_hook_order = true\n\n[hooks.effect_queue]\nname = \"checkout\"\nauto_drain = false"
	)
	.unwrap();

	// Act
	let config = RefrainConfig::from_toml_file(file.path()).unwrap();
	let view = ViewContext::builder(Arc::new(ServiceCollection::new()))
		.config(config.hook_config())
		.build();

	// Assert
	assert!(view.config().strict_hook_order());
	assert_eq!(view.effect_queue().config().name(), "checkout");
	assert!(!view.effect_queue().config().auto_drain());
	assert!(view.effect_queue().config().yield_between_effects());
}

#[rstest]
fn test_missing_file_reports_path() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("absent.toml");

	// Act
	let result = RefrainConfig::from_toml_file(&path);

	// Assert
	match result {
		Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
		other => panic!("expected an I/O error, got {other:?}"),
	}
}
