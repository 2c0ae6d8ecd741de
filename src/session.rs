//! Page-view lifecycle: deciding what a loaded URL shows, and the session that
//! owns the configuration while the grid is on screen.

use anyhow::{Result, bail};
use log::{info, warn};
use serde::Serialize;

use crate::config::{GridsConfig, StatesMatrix};
use crate::params::{TOKEN_KEY, encode_component, parse_query, split_url};

/// What the page should do with the URL it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageOutcome {
    Render { config: GridsConfig },
    /// Parameters decode to the default configuration; go to the bare URL.
    #[serde(rename_all = "camelCase")]
    Redirect { url: String },
    #[serde(rename_all = "camelCase")]
    Invalid { recovery_url: String },
}

/// Decodes the configuration carried by `url`. A `cfg` token takes precedence
/// over named parameters.
pub fn config_from_url(url: &str) -> Option<GridsConfig> {
    let (_, query) = split_url(url);
    if query.is_empty() {
        return None;
    }
    let params = parse_query(query);
    let outcome = match params.get(TOKEN_KEY) {
        Some(token) => GridsConfig::from_token(token),
        None => GridsConfig::from_map(&params),
    };
    Some(outcome.into_config())
}

pub fn resolve_location(url: &str) -> PageOutcome {
    let (bare, _) = split_url(url);
    let config = match config_from_url(url) {
        Some(config) => config,
        None => return PageOutcome::Render { config: GridsConfig::default() },
    };
    if config.is_default() {
        info!("Parameters describe the default grid, redirecting to {}", bare);
        return PageOutcome::Redirect { url: bare.to_string() };
    }
    if !config.is_valid() {
        warn!("Invalid configuration in {}", url);
        return PageOutcome::Invalid { recovery_url: bare.to_string() };
    }
    PageOutcome::Render { config }
}

/// Owns the configuration for one page view. Built once from a configuration
/// that has already passed validation.
#[derive(Debug, Clone)]
pub struct GridSession {
    config: GridsConfig,
}

impl Default for GridSession {
    fn default() -> Self {
        GridSession { config: GridsConfig::default() }
    }
}

impl GridSession {
    pub fn new(config: GridsConfig) -> Result<Self> {
        if !config.is_valid() {
            bail!("A session needs a valid configuration.");
        }
        Ok(GridSession { config })
    }

    pub fn config(&self) -> &GridsConfig {
        &self.config
    }

    pub fn toggle(&mut self, row: usize, col: usize) -> Result<bool> {
        self.config.states.toggle(row, col)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, on: bool) -> Result<()> {
        self.config.states.set(row, col, on)
    }

    pub fn invert_all(&mut self) {
        self.config.states.invert();
    }

    pub fn use_default(&mut self) {
        self.config.states = StatesMatrix::checkerboard(self.config.states.count());
    }

    pub fn all_foreground(&mut self) {
        self.config.states.fill(true);
    }

    pub fn all_background(&mut self) {
        self.config.states.fill(false);
    }

    /// Color a cell is painted with; `inverse` swaps the two.
    pub fn cell_color(&self, row: usize, col: usize) -> Result<&str> {
        let on = match self.config.states.get(row, col) {
            Some(on) => on,
            None => bail!("Cell ({}, {}) is outside the grid.", row, col),
        };
        let color = if on != self.config.inverse { &self.config.fore_color } else { &self.config.back_color };
        Ok(color.as_str())
    }

    /// URL reproducing the current grid: the bare URL itself for the default
    /// configuration, otherwise with a `cfg` token.
    pub fn share_url(&self, bare_url: &str) -> Result<String> {
        if self.config.is_default() {
            return Ok(bare_url.to_string());
        }
        let token = self.config.to_token()?;
        Ok(format!("{}?{}={}", bare_url, TOKEN_KEY, encode_component(&token)))
    }
}
