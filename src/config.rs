//! Grid configuration and its two textual forms: the compact `!`-delimited
//! token carried in a single `cfg` query value, and the human-editable named
//! query parameters.
//!
//! Parsing never fails outright. A malformed field leaves the configuration
//! with the empty states sentinel, which [`GridsConfig::is_valid`] rejects;
//! fields parsed before the failure are kept as they are.

use anyhow::{Result, anyhow, bail};
use log::debug;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use crate::params::ParamMap;
use crate::radix64::{alphabet_to_bin, alphabet_to_hex, bin_to_alphabet, hex_to_alphabet, is_valid_symbol_string};

pub const MIN_COUNT: i64 = 1;
pub const MAX_COUNT: i64 = 64;
pub const MIN_SIZE: i64 = 15;
pub const MAX_SIZE: i64 = 150;

pub const DEFAULT_COUNT: i64 = 9;
pub const DEFAULT_SIZE: i64 = 50;
pub const DEFAULT_FORE_COLOR: &str = "#000000";
pub const DEFAULT_BACK_COLOR: &str = "#ffffff";
pub const DEFAULT_INVERSE: bool = false;

/// Largest integer a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

const FIELD_DELIMITER: char = '!';
const INVERSE_MARKER: char = '~';
const MAX_TOKEN_FIELDS: usize = 5;

const COUNT_KEY: &str = "count";
const SIZE_KEY: &str = "size";
const FORE_COLOR_KEY: &str = "fore-color";
const BACK_COLOR_KEY: &str = "back-color";
const INVERSE_KEY: &str = "inverse";
const STATES_KEY: &str = "states";

/// Square on/off matrix stored row-major. A matrix with zero rows is the
/// sentinel left behind by a failed parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatesMatrix {
    count: usize,
    cells: Vec<bool>,
}

impl StatesMatrix {
    pub fn invalid() -> Self {
        StatesMatrix { count: 0, cells: Vec::new() }
    }

    pub fn filled(count: usize, on: bool) -> Self {
        StatesMatrix { count, cells: vec![on; count * count] }
    }

    /// Checkerboard with cell (0, 0) off.
    pub fn checkerboard(count: usize) -> Self {
        let cells = (0..count * count).map(|i| (i / count + i % count) % 2 != 0).collect();
        StatesMatrix { count, cells }
    }

    /// Default states for a configured `count`; the sentinel when `count` is
    /// outside the accepted range.
    pub fn default_for(count: i64) -> Self {
        if (MIN_COUNT..=MAX_COUNT).contains(&count) {
            Self::checkerboard(count as usize)
        } else {
            Self::invalid()
        }
    }

    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let count = rows.len();
        let mut cells = Vec::with_capacity(count * count);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != count {
                bail!("Row {} has {} cells, expected {}.", i, row.len(), count);
            }
            cells.extend(row);
        }
        Ok(StatesMatrix { count, cells })
    }

    /// Builds a `count x count` matrix from a string of binary digits. Short
    /// input is zero-padded at the front as long as it still fills `count` rows.
    pub fn from_bits(bits: &str, count: usize) -> Result<Self> {
        if count == 0 {
            bail!("A states matrix needs at least one row.");
        }
        let total = count * count;
        let rows = (bits.len() + count - 1) / count;
        if rows != count {
            bail!("{} bits make {} rows, expected {}.", bits.len(), rows, count);
        }
        let mut cells = vec![false; total - bits.len()];
        for (pos, ch) in bits.chars().enumerate() {
            match ch {
                '0' => cells.push(false),
                '1' => cells.push(true),
                _ => bail!("Character '{}' at pos {} is not a binary digit.", ch, pos),
            }
        }
        Ok(StatesMatrix { count, cells })
    }

    /// Number of rows (and of cells per row).
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_sentinel(&self) -> bool {
        self.count == 0
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.count || col >= self.count {
            bail!("Cell ({}, {}) is outside a {}x{} grid.", row, col, self.count, self.count);
        }
        Ok(row * self.count + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        self.index(row, col).ok().map(|i| self.cells[i])
    }

    pub fn set(&mut self, row: usize, col: usize, on: bool) -> Result<()> {
        let i = self.index(row, col)?;
        self.cells[i] = on;
        Ok(())
    }

    /// Flips one cell and returns its new state.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<bool> {
        let i = self.index(row, col)?;
        self.cells[i] = !self.cells[i];
        Ok(self.cells[i])
    }

    pub fn fill(&mut self, on: bool) {
        self.cells.iter_mut().for_each(|cell| *cell = on);
    }

    pub fn invert(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = !*cell);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        // chunks() rejects 0; the sentinel has no cells anyway
        self.cells.chunks(self.count.max(1))
    }

    /// Row-major `'1'`/`'0'` flattening.
    pub fn to_bits(&self) -> String {
        self.cells.iter().map(|&on| if on { '1' } else { '0' }).collect()
    }
}

impl Serialize for StatesMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.count))?;
        for row in self.rows() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

/// Outcome of decoding a states string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatesField {
    /// No states given; the checkerboard for the configured count applies.
    Unspecified,
    Invalid,
    Parsed(StatesMatrix),
}

impl StatesField {
    fn resolve(self, count: i64) -> StatesMatrix {
        match self {
            StatesField::Unspecified => StatesMatrix::default_for(count),
            StatesField::Invalid => StatesMatrix::invalid(),
            StatesField::Parsed(matrix) => matrix,
        }
    }
}

/// Decodes an alphabet string into a `count x count` matrix. `count` falls
/// back to [`DEFAULT_COUNT`] when unknown.
pub fn decode_states(s: Option<&str>, count: Option<i64>) -> StatesField {
    let s = match s {
        None | Some("") => return StatesField::Unspecified,
        Some(s) => s,
    };
    if !is_valid_symbol_string(s) {
        return StatesField::Invalid;
    }
    let count = count.unwrap_or(DEFAULT_COUNT);
    if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
        return StatesField::Invalid;
    }
    let count = count as usize;
    let matrix = alphabet_to_bin(s, Some(count * count)).and_then(|bits| StatesMatrix::from_bits(&bits, count));
    match matrix {
        Ok(matrix) => StatesField::Parsed(matrix),
        Err(e) => {
            debug!("States string '{}' rejected: {}", s, e);
            StatesField::Invalid
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridsConfig {
    pub count: i64,
    pub size: i64,
    pub fore_color: String,
    pub back_color: String,
    pub inverse: bool,
    pub states: StatesMatrix,
}

impl Default for GridsConfig {
    fn default() -> Self {
        GridsConfig {
            count: DEFAULT_COUNT,
            size: DEFAULT_SIZE,
            fore_color: DEFAULT_FORE_COLOR.to_string(),
            back_color: DEFAULT_BACK_COLOR.to_string(),
            inverse: DEFAULT_INVERSE,
            states: StatesMatrix::checkerboard(DEFAULT_COUNT as usize),
        }
    }
}

/// Result of parsing either textual form.
///
/// `Failed` still carries a configuration: the fields read before the failure,
/// defaults for the rest, and the empty states sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(GridsConfig),
    Failed { partial: GridsConfig, reason: String },
}

impl ParseOutcome {
    pub fn into_config(self) -> GridsConfig {
        match self {
            ParseOutcome::Parsed(config) | ParseOutcome::Failed { partial: config, .. } => config,
        }
    }
}

/// Fields collected while parsing; anything left unset takes its default.
#[derive(Default)]
struct Fields {
    count: Option<i64>,
    size: Option<i64>,
    fore_color: Option<String>,
    back_color: Option<String>,
    inverse: Option<bool>,
    states: Option<StatesField>,
}

impl Fields {
    fn finish(mut self, read: Result<()>) -> ParseOutcome {
        match read {
            Ok(()) => ParseOutcome::Parsed(self.build()),
            Err(e) => {
                self.states = Some(StatesField::Invalid);
                ParseOutcome::Failed { partial: self.build(), reason: e.to_string() }
            }
        }
    }

    fn build(self) -> GridsConfig {
        let count = self.count.unwrap_or(DEFAULT_COUNT);
        GridsConfig {
            count,
            size: self.size.unwrap_or(DEFAULT_SIZE),
            fore_color: self.fore_color.unwrap_or_else(|| DEFAULT_FORE_COLOR.to_string()),
            back_color: self.back_color.unwrap_or_else(|| DEFAULT_BACK_COLOR.to_string()),
            inverse: self.inverse.unwrap_or(DEFAULT_INVERSE),
            states: self.states.unwrap_or(StatesField::Unspecified).resolve(count),
        }
    }
}

/// Integer parsing with `parseInt` leniency: surrounding whitespace, an
/// optional sign, then the longest run of digits in `radix`.
fn parse_int(s: &str, radix: u32) -> Result<i64> {
    let trimmed = s.trim();
    let (negative, unsigned) = match trimmed.chars().next() {
        Some('-') => (true, &trimmed[1..]),
        Some('+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = if radix == 16 {
        unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")).unwrap_or(unsigned)
    } else {
        unsigned
    };
    let end = digits.find(|c: char| !c.is_digit(radix)).unwrap_or(digits.len());
    if end == 0 {
        bail!("'{}' is not a base-{} integer.", s, radix);
    }
    let magnitude = i64::from_str_radix(&digits[..end], radix)
        .map_err(|e| anyhow!("'{}' does not fit a base-{} integer: {}", s, radix, e))?;
    if magnitude > MAX_SAFE_INTEGER {
        bail!("'{}' is beyond the integer range of a JavaScript number.", s);
    }
    Ok(if negative { -magnitude } else { magnitude })
}

fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn read_states(fields: &mut Fields, s: Option<&str>) -> Result<()> {
    let decoded = decode_states(s, fields.count);
    let invalid = decoded == StatesField::Invalid;
    fields.states = Some(decoded);
    if invalid {
        let count = fields.count.unwrap_or(DEFAULT_COUNT);
        bail!("States '{}' do not describe a {}x{} grid.", s.unwrap_or_default(), count, count);
    }
    Ok(())
}

fn read_token(token: &str, fields: &mut Fields) -> Result<()> {
    let data: Vec<&str> = token.split(FIELD_DELIMITER).collect();
    if data.len() > MAX_TOKEN_FIELDS {
        bail!("Token has {} fields, at most {} are allowed.", data.len(), MAX_TOKEN_FIELDS);
    }
    if let Some(s) = data.first() { fields.count = Some(parse_int(s, 16)?); }
    if let Some(s) = data.get(1) { fields.size = Some(parse_int(s, 16)?); }
    if let Some(s) = data.get(2) { fields.fore_color = Some(format!("#{}", alphabet_to_hex(s, None)?)); }
    if let Some(s) = data.get(3) { fields.back_color = Some(format!("#{}", alphabet_to_hex(s, None)?)); }
    if let Some(s) = data.get(4) {
        let (inverse, states) = match s.strip_prefix(INVERSE_MARKER) {
            Some(rest) => (true, rest),
            None => (false, *s),
        };
        fields.inverse = Some(inverse);
        read_states(fields, Some(states))?;
    }
    Ok(())
}

fn read_map(map: &ParamMap, fields: &mut Fields) -> Result<()> {
    let get = |key: &str| map.get(key).map(String::as_str).filter(|v| !v.is_empty());

    // colors are case-insensitive hex
    fields.fore_color = get(FORE_COLOR_KEY).map(str::to_lowercase);
    fields.back_color = get(BACK_COLOR_KEY).map(str::to_lowercase);
    fields.inverse = Some(map.contains_key(INVERSE_KEY));
    if let Some(s) = get(COUNT_KEY) { fields.count = Some(parse_int(s, 10)?); }
    if let Some(s) = get(SIZE_KEY) { fields.size = Some(parse_int(s, 10)?); }
    read_states(fields, get(STATES_KEY))
}

impl GridsConfig {
    pub fn new(count: i64, size: i64, fore_color: &str, back_color: &str, inverse: bool, states: StatesMatrix) -> Self {
        GridsConfig {
            count,
            size,
            fore_color: fore_color.to_string(),
            back_color: back_color.to_string(),
            inverse,
            states,
        }
    }

    /// Parses a compact token. Count and size are hexadecimal here.
    pub fn from_token(token: &str) -> ParseOutcome {
        let mut fields = Fields::default();
        let read = read_token(token, &mut fields);
        if let Err(e) = &read {
            debug!("Token '{}' failed to parse: {}", token, e);
        }
        fields.finish(read)
    }

    /// Parses named query parameters. Count and size are decimal here, unlike
    /// the token form.
    pub fn from_map(map: &ParamMap) -> ParseOutcome {
        let mut fields = Fields::default();
        let read = read_map(map, &mut fields);
        if let Err(e) = &read {
            debug!("Named parameters failed to parse: {}", e);
        }
        fields.finish(read)
    }

    /// Encodes into the compact token. Only valid configurations can be encoded.
    pub fn to_token(&self) -> Result<String> {
        if !self.is_valid() {
            bail!("Cannot encode an invalid configuration.");
        }
        let fore_color = hex_to_alphabet(&self.fore_color[1..])?;
        let back_color = hex_to_alphabet(&self.back_color[1..])?;
        let states = if self.has_default_states() {
            String::new()
        } else {
            bin_to_alphabet(&self.states.to_bits())?
        };
        let marker = if self.inverse { INVERSE_MARKER.to_string() } else { String::new() };

        let mut token = format!(
            "{:x}{d}{:x}{d}{}{d}{}{d}{}{}",
            self.count, self.size, fore_color, back_color, marker, states,
            d = FIELD_DELIMITER
        );
        if token.ends_with(FIELD_DELIMITER) {
            token.pop();
        }
        Ok(token)
    }

    pub fn has_default_states(&self) -> bool {
        !self.states.is_sentinel() && self.states == StatesMatrix::default_for(self.count)
    }

    pub fn is_valid(&self) -> bool {
        (MIN_COUNT..=MAX_COUNT).contains(&self.count)
            && (MIN_SIZE..=MAX_SIZE).contains(&self.size)
            && is_valid_color(&self.fore_color)
            && is_valid_color(&self.back_color)
            && self.states.count() as i64 == self.count
    }

    pub fn is_default(&self) -> bool {
        *self == GridsConfig::default()
    }
}
