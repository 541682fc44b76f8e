/**
 * CONFIGURATION - Chargement de estacao.yaml
 *
 * RÔLE :
 * Paramètres de démarrage de la station : adresse d'écoute, cadence du
 * monitoring, tailles des tampons HTTP, base des capteurs simulés.
 *
 * FONCTIONNEMENT :
 * - Chemin via ESTACAO_CONFIG (défaut : estacao.yaml)
 * - Fichier absent, vide ou invalide -> valeurs par défaut + warning
 * - ESTACAO_LISTEN remplace l'adresse d'écoute du fichier
 *
 * Les offsets et limites ne sont pas ici : ils ne changent qu'au runtime,
 * via l'API HTTP.
 */

use serde::Deserialize;
use std::{path::Path, time::Duration};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::response::DEFAULT_RESPONSE_CAPACITY;

pub const CONFIG_PATH_ENV: &str = "ESTACAO_CONFIG";
pub const LISTEN_ENV: &str = "ESTACAO_LISTEN";
pub const DEFAULT_CONFIG_PATH: &str = "estacao.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StationConfig {
    pub listen: String,
    pub monitor: MonitorConf,
    pub http: HttpConf,
    pub simulation: SimulationConf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConf {
    pub tick_interval_ms: u64,
    pub alert_duration_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConf {
    pub response_capacity: usize,
    pub request_capacity: usize,
    pub connection_slots: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConf {
    pub temperature_c: f32,
    pub pressure_pa: f32,
    pub humidity_pct: f32,
    pub drift: f32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            monitor: MonitorConf::default(),
            http: HttpConf::default(),
            simulation: SimulationConf::default(),
        }
    }
}

impl Default for MonitorConf {
    fn default() -> Self {
        Self { tick_interval_ms: 500, alert_duration_ms: 500 }
    }
}

impl Default for HttpConf {
    fn default() -> Self {
        Self {
            response_capacity: DEFAULT_RESPONSE_CAPACITY,
            request_capacity: 2048,
            connection_slots: 4,
        }
    }
}

impl Default for SimulationConf {
    fn default() -> Self {
        Self {
            temperature_c: 25.0,
            pressure_pa: 101_325.0,
            humidity_pct: 55.0,
            drift: 0.5,
        }
    }
}

impl MonitorConf {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(self.alert_duration_ms)
    }
}

/// Parse un document YAML ; un document vide donne la config par défaut
pub fn parse_config(txt: &str) -> Result<StationConfig, ConfigError> {
    if txt.trim().is_empty() {
        return Ok(StationConfig::default());
    }
    Ok(serde_yaml::from_str(txt)?)
}

pub async fn read_config(path: impl AsRef<Path>) -> Result<StationConfig, ConfigError> {
    let txt = fs::read_to_string(path).await?;
    parse_config(&txt)
}

/// Charge la config depuis `path`, retombe sur les défauts en cas de problème
pub async fn load_config_from(path: impl AsRef<Path>) -> StationConfig {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "no config file, using defaults");
        return StationConfig::default();
    }

    match read_config(path).await {
        Ok(cfg) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            StationConfig::default()
        }
    }
}

pub async fn load_config() -> StationConfig {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut cfg = load_config_from(&path).await;

    if let Ok(listen) = std::env::var(LISTEN_ENV) {
        cfg.listen = listen;
    }
    cfg
}
