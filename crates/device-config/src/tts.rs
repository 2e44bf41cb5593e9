//! TTS entry derivation
//!
//! The server lists every TTS system known for the device, e.g.
//!
//! ```json
//! [
//!   {"@type": "mimic", "active": false, "voice": "ap"},
//!   {"@type": "google", "active": true, "lang": "en-us"}
//! ]
//! ```
//!
//! and the local config wants the active one keyed by its module name:
//!
//! ```json
//! {"module": "google", "google": {"lang": "en-us"}}
//! ```

use serde_json::{Map, Value};
use tracing::warn;

/// Build the `tts` config entry from the server's `ttsSettings` list
///
/// Returns `None` when no entry is active or the active one has no type.
pub fn parse_tts(tts_settings: &[Value]) -> Option<Value> {
    let active = tts_settings
        .iter()
        .filter_map(Value::as_object)
        .find(|system| system.get("active").and_then(Value::as_bool) == Some(true))?;

    let Some(module) = active.get("@type").and_then(Value::as_str) else {
        warn!("Active TTS system has no @type, skipping");
        return None;
    };

    // Server-only keys
    let options: Map<String, Value> = active
        .iter()
        .filter(|(key, _)| key.as_str() != "@type" && key.as_str() != "active")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut tts = Map::new();
    tts.insert("module".to_string(), Value::String(module.to_string()));
    tts.insert(module.to_string(), Value::Object(options));
    Some(Value::Object(tts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_active_system_is_selected() {
        let settings = vec![
            json!({"@type": "mimic", "active": false, "voice": "ap"}),
            json!({"@type": "google", "active": true, "lang": "en-us"}),
        ];

        assert_eq!(
            parse_tts(&settings),
            Some(json!({"module": "google", "google": {"lang": "en-us"}}))
        );
    }

    #[test]
    fn test_first_active_system_wins() {
        let settings = vec![
            json!({"@type": "espeak", "active": true}),
            json!({"@type": "google", "active": true}),
        ];

        assert_eq!(
            parse_tts(&settings),
            Some(json!({"module": "espeak", "espeak": {}}))
        );
    }

    #[test]
    fn test_input_is_not_modified() {
        let settings = vec![json!({"@type": "mimic", "active": true, "voice": "ap"})];
        let _ = parse_tts(&settings);
        assert_eq!(settings[0]["@type"], "mimic");
        assert_eq!(settings[0]["active"], true);
    }

    #[test]
    fn test_no_active_system() {
        let settings = vec![json!({"@type": "mimic", "active": false})];
        assert_eq!(parse_tts(&settings), None);
        assert_eq!(parse_tts(&[]), None);
    }

    #[test]
    fn test_active_system_without_type() {
        let settings = vec![json!({"active": true, "voice": "ap"})];
        assert_eq!(parse_tts(&settings), None);
    }
}
