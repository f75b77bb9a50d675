//! Error taxonomy shared by the REST client, the event stream and the editor page.

use thiserror::Error;

/// Every failure the editor can surface. None of them are fatal to the running view.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditorError {
	/// Transport failure or a non-2xx response.
	#[error("network error: {0}")]
	Network(String),
	/// The collaborator answered with an `{error}` body.
	#[error("request rejected: {0}")]
	Api(String),
	/// Malformed JSON payload from the API or the stream.
	#[error("malformed payload: {0}")]
	Parse(String),
	/// Missing or unsafe user input; no request was issued.
	#[error("{0}")]
	Validation(String),
	/// A frame was sent while the stream was not open.
	#[error("event stream is not connected")]
	Disconnected,
}

impl From<reqwest::Error> for EditorError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			Self::Parse(err.to_string())
		} else {
			Self::Network(err.to_string())
		}
	}
}

impl From<serde_json::Error> for EditorError {
	fn from(err: serde_json::Error) -> Self {
		Self::Parse(err.to_string())
	}
}
