// This is src/lib.rs
use wasm_bindgen::prelude::*;
use js_sys::Map as JsMap;
use log::LevelFilter;
use serde::Serialize;

pub mod config;
pub mod logging;
pub mod params;
pub mod radix64;
pub mod session;

pub use config::{GridsConfig, ParseOutcome, StatesField, StatesMatrix};
pub use params::ParamMap;
pub use session::{GridSession, PageOutcome, resolve_location};

use config::{MAX_COUNT, MAX_SIZE, MIN_COUNT, MIN_SIZE};

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::Info);
}

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, e))
}

// flattened structs go through serialize_map; JS callers expect plain objects
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).map_err(|e| js_error("Failed to serialize", e))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Limits {
    min_count: i64,
    max_count: i64,
    min_size: i64,
    max_size: i64,
}

/// Bounds for the settings form inputs.
#[wasm_bindgen]
pub fn limits() -> Result<JsValue, JsValue> {
    to_js(&Limits { min_count: MIN_COUNT, max_count: MAX_COUNT, min_size: MIN_SIZE, max_size: MAX_SIZE })
}

#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let level = logging::parse_level(level).map_err(|e| js_error("Log level error", e))?;
    logging::init(level);
    Ok(())
}

#[wasm_bindgen(js_name = isValidSymbolString)]
pub fn is_valid_symbol_string(s: &str) -> bool {
    radix64::is_valid_symbol_string(s)
}

#[wasm_bindgen(js_name = binToAlphabet)]
pub fn bin_to_alphabet(bits: &str) -> Result<String, JsValue> {
    radix64::bin_to_alphabet(bits).map_err(|e| js_error("Binary Encoding Error", e))
}

#[wasm_bindgen(js_name = alphabetToBin)]
pub fn alphabet_to_bin(s: &str, target_len: Option<u32>) -> Result<String, JsValue> {
    radix64::alphabet_to_bin(s, target_len.map(|n| n as usize)).map_err(|e| js_error("Radix-64 Decoding Error", e))
}

#[wasm_bindgen(js_name = hexToAlphabet)]
pub fn hex_to_alphabet(s: &str) -> Result<String, JsValue> {
    radix64::hex_to_alphabet(s).map_err(|e| js_error("Hex Encoding Error", e))
}

#[wasm_bindgen(js_name = alphabetToHex)]
pub fn alphabet_to_hex(s: &str, target_len: Option<u32>) -> Result<String, JsValue> {
    radix64::alphabet_to_hex(s, target_len.map(|n| n as usize)).map_err(|e| js_error("Radix-64 Decoding Error", e))
}

/// Decodes a compact token. The result may be invalid; check `isValid`, and
/// `parseError` for why parsing stopped.
#[wasm_bindgen(js_name = decodeToken)]
pub fn decode_token(token: &str) -> Result<JsValue, JsValue> {
    to_js(&ConfigView::from(GridsConfig::from_token(token)))
}

/// Decodes a map of query parameters (`cfg` wins over named parameters).
#[wasm_bindgen(js_name = decodeParams)]
pub fn decode_params(map: &JsMap) -> Result<JsValue, JsValue> {
    let mut params = ParamMap::new();
    map.for_each(&mut |value, key| {
        if let (Some(key), Some(value)) = (key.as_string(), value.as_string()) {
            params.insert(key, value);
        }
    });
    let outcome = match params.get(params::TOKEN_KEY) {
        Some(token) => GridsConfig::from_token(token),
        None => GridsConfig::from_map(&params),
    };
    to_js(&ConfigView::from(outcome))
}

#[wasm_bindgen(js_name = resolveLocation)]
pub fn resolve_location_js(url: &str) -> Result<JsValue, JsValue> {
    to_js(&resolve_location(url))
}

/// A decoded configuration together with its verdicts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigView {
    #[serde(flatten)]
    config: GridsConfig,
    is_valid: bool,
    is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_error: Option<String>,
}

impl From<ParseOutcome> for ConfigView {
    fn from(outcome: ParseOutcome) -> Self {
        let (config, parse_error) = match outcome {
            ParseOutcome::Parsed(config) => (config, None),
            ParseOutcome::Failed { partial, reason } => (partial, Some(reason)),
        };
        ConfigView { is_valid: config.is_valid(), is_default: config.is_default(), config, parse_error }
    }
}

fn open_session(config: GridsConfig) -> Result<GridSession, JsValue> {
    GridSession::new(config).map_err(|e| js_error("Session Error", e))
}

#[wasm_bindgen]
pub struct MosaicSession {
    inner: GridSession,
}

#[wasm_bindgen]
impl MosaicSession {
    /// Session over the default grid.
    #[wasm_bindgen(constructor)]
    pub fn new() -> MosaicSession {
        MosaicSession { inner: GridSession::default() }
    }

    #[wasm_bindgen(js_name = fromToken)]
    pub fn from_token(token: &str) -> Result<MosaicSession, JsValue> {
        let config = match GridsConfig::from_token(token) {
            ParseOutcome::Parsed(config) => config,
            ParseOutcome::Failed { reason, .. } => return Err(js_error("Token Decoding Error", reason)),
        };
        Ok(MosaicSession { inner: open_session(config)? })
    }

    /// Session for a page URL. Fails when the URL should redirect or is invalid;
    /// call `resolveLocation` first to tell those apart.
    #[wasm_bindgen(js_name = fromLocation)]
    pub fn from_location(url: &str) -> Result<MosaicSession, JsValue> {
        match resolve_location(url) {
            PageOutcome::Render { config } => Ok(MosaicSession { inner: open_session(config)? }),
            PageOutcome::Redirect { url } => Err(js_error("Location Error", format!("redirect to {}", url))),
            PageOutcome::Invalid { .. } => Err(js_error("Location Error", "invalid configuration")),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> u32 {
        self.inner.config().count as u32
    }

    #[wasm_bindgen(getter)]
    pub fn size(&self) -> u32 {
        self.inner.config().size as u32
    }

    #[wasm_bindgen(getter, js_name = foreColor)]
    pub fn fore_color(&self) -> String {
        self.inner.config().fore_color.clone()
    }

    #[wasm_bindgen(getter, js_name = backColor)]
    pub fn back_color(&self) -> String {
        self.inner.config().back_color.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn inverse(&self) -> bool {
        self.inner.config().inverse
    }

    #[wasm_bindgen(getter, js_name = isDefault)]
    pub fn is_default(&self) -> bool {
        self.inner.config().is_default()
    }

    #[wasm_bindgen(js_name = cellState)]
    pub fn cell_state(&self, row: u32, col: u32) -> Result<bool, JsValue> {
        self.inner
            .config()
            .states
            .get(row as usize, col as usize)
            .ok_or_else(|| js_error("Cell Error", format!("({}, {}) is outside the grid", row, col)))
    }

    #[wasm_bindgen(js_name = cellColor)]
    pub fn cell_color(&self, row: u32, col: u32) -> Result<String, JsValue> {
        self.inner.cell_color(row as usize, col as usize).map(str::to_string).map_err(|e| js_error("Cell Error", e))
    }

    pub fn toggle(&mut self, row: u32, col: u32) -> Result<bool, JsValue> {
        self.inner.toggle(row as usize, col as usize).map_err(|e| js_error("Cell Error", e))
    }

    #[wasm_bindgen(js_name = setCell)]
    pub fn set_cell(&mut self, row: u32, col: u32, on: bool) -> Result<(), JsValue> {
        self.inner.set_cell(row as usize, col as usize, on).map_err(|e| js_error("Cell Error", e))
    }

    #[wasm_bindgen(js_name = invertAll)]
    pub fn invert_all(&mut self) {
        self.inner.invert_all();
    }

    #[wasm_bindgen(js_name = useDefault)]
    pub fn use_default(&mut self) {
        self.inner.use_default();
    }

    #[wasm_bindgen(js_name = allForeground)]
    pub fn all_foreground(&mut self) {
        self.inner.all_foreground();
    }

    #[wasm_bindgen(js_name = allBackground)]
    pub fn all_background(&mut self) {
        self.inner.all_background();
    }

    #[wasm_bindgen(js_name = toToken)]
    pub fn to_token(&self) -> Result<String, JsValue> {
        self.inner.config().to_token().map_err(|e| js_error("Token Encoding Error", e))
    }

    #[wasm_bindgen(js_name = shareUrl)]
    pub fn share_url(&self, bare_url: &str) -> Result<String, JsValue> {
        self.inner.share_url(bare_url).map_err(|e| js_error("Share Error", e))
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.config())
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.config()).map_err(|e| js_error("JSON Error", e))
    }
}

impl Default for MosaicSession {
    fn default() -> Self {
        Self::new()
    }
}
