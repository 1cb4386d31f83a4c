//! Nesting restoration tokens inside host view state.

use perch_presenter::{RestorationToken, TokenError};
use perch_state::StateBundle;

/// Reads the token nested under `key`, if the host saved one.
pub fn read_token(host_state: &StateBundle, key: &str) -> Result<Option<RestorationToken>, TokenError> {
	if !host_state.contains_key(key) {
		return Ok(None);
	}
	let nested = host_state.require_bundle(key)?;
	RestorationToken::from_bundle(nested).map(Some)
}

/// Nests `token` under `key`, replacing any previous token.
pub fn write_token(host_state: &mut StateBundle, key: &str, token: &RestorationToken) {
	host_state.put(key, token.to_bundle());
}
