#![cfg(target_arch = "wasm32")]

use js_sys::{Map as JsMap, Reflect};
use mosaic_grids_wasm::{MosaicSession, decode_params, decode_token, hex_to_alphabet, resolve_location_js};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::wasm_bindgen_test;

fn field(value: &JsValue, name: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(name)).unwrap()
}

#[wasm_bindgen_test]
fn decoded_token_carries_verdicts() {
    let decoded = decode_token("5!32!0000!____").unwrap();
    assert_eq!(field(&decoded, "count").as_f64(), Some(5.0));
    assert_eq!(field(&decoded, "foreColor").as_string().as_deref(), Some("#000000"));
    assert_eq!(field(&decoded, "isValid").as_bool(), Some(true));
    assert_eq!(field(&decoded, "isDefault").as_bool(), Some(false));

    assert!(field(&decoded, "parseError").is_undefined());

    let broken = decode_token("5!32!0000!____!*").unwrap();
    assert_eq!(field(&broken, "isValid").as_bool(), Some(false));
    assert!(field(&broken, "parseError").as_string().is_some());
}

#[wasm_bindgen_test]
fn oversized_count_stays_in_band() {
    let decoded = decode_token("fffffffffffffff!32!0000!____").unwrap();
    assert_eq!(field(&decoded, "isValid").as_bool(), Some(false));
    assert_eq!(field(&decoded, "count").as_f64(), Some(9.0));

    let map = JsMap::new();
    map.set(&"count".into(), &"99999999999999999".into());
    let decoded = decode_params(&map).unwrap();
    assert_eq!(field(&decoded, "isValid").as_bool(), Some(false));
    assert!(field(&decoded, "parseError").as_string().is_some());
}

#[wasm_bindgen_test]
fn params_map_lowercases_colors() {
    let map = JsMap::new();
    map.set(&"count".into(), &"3".into());
    map.set(&"fore-color".into(), &"#ABCDEF".into());
    let decoded = decode_params(&map).unwrap();
    assert_eq!(field(&decoded, "foreColor").as_string().as_deref(), Some("#abcdef"));
    assert_eq!(field(&decoded, "count").as_f64(), Some(3.0));
}

#[wasm_bindgen_test]
fn location_outcome_is_tagged() {
    let outcome = resolve_location_js("https://example.test/?count=65").unwrap();
    assert_eq!(field(&outcome, "kind").as_string().as_deref(), Some("invalid"));
    assert_eq!(field(&outcome, "recoveryUrl").as_string().as_deref(), Some("https://example.test/"));
}

#[wasm_bindgen_test]
fn session_share_round_trip() {
    let mut session = MosaicSession::new();
    assert_eq!(session.share_url("https://example.test/").unwrap(), "https://example.test/");
    assert!(session.toggle(0, 0).unwrap());
    let url = session.share_url("https://example.test/").unwrap();
    let restored = MosaicSession::from_location(&url).unwrap();
    assert!(restored.cell_state(0, 0).unwrap());
    assert_eq!(restored.to_token().unwrap(), session.to_token().unwrap());
    assert!(session.cell_state(9, 9).is_err());
}

#[wasm_bindgen_test]
fn codec_errors_surface_as_strings() {
    let err = hex_to_alphabet("xyz").unwrap_err();
    assert!(err.as_string().unwrap().starts_with("Hex Encoding Error"));
}
