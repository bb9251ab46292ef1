//! Router settings for Trellis.
//!
//! Settings start from defaults and can be loaded from a TOML or JSON file
//! and overridden from the environment:
//!
//! | Key | Env var | Default |
//! |-----|---------|---------|
//! | `base_path` | `TRELLIS_BASE_PATH` | `/` |
//! | `rsc_base` | `TRELLIS_RSC_BASE` | `RSC` |
//! | `skip_header` | `TRELLIS_SKIP_HEADER` | `X-Trellis-Router-Skip` |
//! | `max_redirects` | `TRELLIS_MAX_REDIRECTS` | `8` |
//!
//! ## Example
//!
//! ```
//! use trellis_conf::RouterSettings;
//!
//! let settings = RouterSettings::from_toml_str("base_path = \"/app/\"").unwrap();
//! assert_eq!(settings.base_path, "/app/");
//! assert_eq!(settings.rsc_base, "RSC");
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The settings file could not be read.
	#[error("File error: {0}")]
	FileError(String),

	/// The settings file could not be parsed.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// The file extension is not supported.
	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),

	/// A value is out of range or malformed.
	#[error("Invalid value for '{key}': {message}")]
	InvalidValue {
		/// Settings key.
		key: String,
		/// What is wrong with it.
		message: String,
	},
}

/// Settings shared by the server resolver and the client router.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
	/// Public path the application is mounted at; starts and ends with `/`.
	pub base_path: String,
	/// Path segment under which component fetches are served.
	pub rsc_base: String,
	/// Name of the skip-list request header.
	pub skip_header: String,
	/// Redirect hops a single client navigation may follow.
	pub max_redirects: u32,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			base_path: "/".to_string(),
			rsc_base: "RSC".to_string(),
			skip_header: "X-Trellis-Router-Skip".to_string(),
			max_redirects: 8,
		}
	}
}

impl RouterSettings {
	/// Parses settings from a TOML document; missing keys keep their defaults.
	pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
		toml::from_str(contents)
			.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))
	}

	/// Loads settings from a `.toml` or `.json` file.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => serde_json::from_str(&contents)
				.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e))),
			_ => Err(SettingsError::UnsupportedFormat(
				"Supported formats: .toml, .json".to_string(),
			)),
		}
	}

	/// Loads defaults overridden by environment variables.
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::default().with_env_overrides()
	}

	/// Applies `TRELLIS_*` environment overrides.
	pub fn with_env_overrides(mut self) -> Result<Self, SettingsError> {
		if let Ok(base_path) = std::env::var("TRELLIS_BASE_PATH") {
			self.base_path = base_path;
		}
		if let Ok(rsc_base) = std::env::var("TRELLIS_RSC_BASE") {
			self.rsc_base = rsc_base;
		}
		if let Ok(header) = std::env::var("TRELLIS_SKIP_HEADER") {
			self.skip_header = header;
		}
		if let Ok(max) = std::env::var("TRELLIS_MAX_REDIRECTS") {
			self.max_redirects = max.parse().map_err(|_| SettingsError::InvalidValue {
				key: "max_redirects".to_string(),
				message: format!("not a number: {}", max),
			})?;
		}
		Ok(self)
	}

	/// Sets the base path.
	pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
		self.base_path = base_path.into();
		self
	}

	/// Sets the RSC base segment.
	pub fn with_rsc_base(mut self, rsc_base: impl Into<String>) -> Self {
		self.rsc_base = rsc_base.into();
		self
	}

	/// Checks that the settings can produce well-formed wire paths.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if !self.base_path.starts_with('/') || !self.base_path.ends_with('/') {
			return Err(SettingsError::InvalidValue {
				key: "base_path".to_string(),
				message: format!("must start and end with `/`: {}", self.base_path),
			});
		}
		if self.rsc_base.is_empty() || self.rsc_base.contains('/') {
			return Err(SettingsError::InvalidValue {
				key: "rsc_base".to_string(),
				message: format!("must be a single non-empty segment: {}", self.rsc_base),
			});
		}
		if self.skip_header.trim().is_empty() {
			return Err(SettingsError::InvalidValue {
				key: "skip_header".to_string(),
				message: "must not be empty".to_string(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::io::Write;

	#[rstest]
	fn test_defaults_are_valid() {
		let settings = RouterSettings::default();
		assert!(settings.validate().is_ok());
		assert_eq!(settings.max_redirects, 8);
	}

	#[rstest]
	#[case("base_path = \"app/\"")]
	#[case("base_path = \"/app\"")]
	#[case("rsc_base = \"a/b\"")]
	#[case("rsc_base = \"\"")]
	fn test_validate_rejects(#[case] toml_src: &str) {
		let settings = RouterSettings::from_toml_str(toml_src).unwrap();
		assert!(matches!(
			settings.validate(),
			Err(SettingsError::InvalidValue { .. })
		));
	}

	#[rstest]
	fn test_from_toml_partial() {
		let settings = RouterSettings::from_toml_str("max_redirects = 2").unwrap();
		assert_eq!(settings.max_redirects, 2);
		assert_eq!(settings.base_path, "/");
	}

	#[rstest]
	fn test_from_toml_invalid() {
		assert!(matches!(
			RouterSettings::from_toml_str("max_redirects = \"many\""),
			Err(SettingsError::ParseError(_))
		));
	}

	#[rstest]
	fn test_from_file() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "rsc_base = \"_rsc\"").unwrap();
		let settings = RouterSettings::from_file(file.path()).unwrap();
		assert_eq!(settings.rsc_base, "_rsc");

		let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
		assert!(matches!(
			RouterSettings::from_file(file.path()),
			Err(SettingsError::UnsupportedFormat(_))
		));
	}

	#[rstest]
	#[serial(trellis_env)]
	fn test_env_overrides() {
		// SAFETY: serialized with every other test touching TRELLIS_* vars.
		unsafe {
			std::env::set_var("TRELLIS_BASE_PATH", "/shop/");
			std::env::set_var("TRELLIS_MAX_REDIRECTS", "3");
		}
		let settings = RouterSettings::from_env().unwrap();
		unsafe {
			std::env::remove_var("TRELLIS_BASE_PATH");
			std::env::remove_var("TRELLIS_MAX_REDIRECTS");
		}
		assert_eq!(settings.base_path, "/shop/");
		assert_eq!(settings.max_redirects, 3);
	}

	#[rstest]
	#[serial(trellis_env)]
	fn test_env_override_rejects_bad_number() {
		unsafe {
			std::env::set_var("TRELLIS_MAX_REDIRECTS", "lots");
		}
		let result = RouterSettings::from_env();
		unsafe {
			std::env::remove_var("TRELLIS_MAX_REDIRECTS");
		}
		assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
	}
}
