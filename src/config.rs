//! Build-time endpoint configuration.

const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
const DEFAULT_STREAM_URL: &str = "ws://localhost:6789";

/// Where the REST collaborator and the event stream live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
	pub api_base_url: String,
	pub stream_url: String,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base_url: DEFAULT_API_BASE_URL.into(),
			stream_url: DEFAULT_STREAM_URL.into(),
		}
	}
}

impl AppConfig {
	/// Defaults overridden by `GRAPH_EDITOR_API_URL` / `GRAPH_EDITOR_STREAM_URL`
	/// captured when the crate was compiled.
	pub fn from_build_env() -> Self {
		Self::with_overrides(
			option_env!("GRAPH_EDITOR_API_URL"),
			option_env!("GRAPH_EDITOR_STREAM_URL"),
		)
	}

	fn with_overrides(api: Option<&str>, stream: Option<&str>) -> Self {
		let defaults = Self::default();
		Self {
			api_base_url: api
				.filter(|s| !s.trim().is_empty())
				.map(|s| s.trim_end_matches('/').to_string())
				.unwrap_or(defaults.api_base_url),
			stream_url: stream
				.filter(|s| !s.trim().is_empty())
				.map(str::to_string)
				.unwrap_or(defaults.stream_url),
		}
	}
}
