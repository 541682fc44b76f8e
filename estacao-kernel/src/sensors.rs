//! Acquisition des mesures.
//!
//! [`ReadingSource`] livre un [`RawSample`] par cycle ; la conversion en
//! [`Readings`] applique les offsets du moment.

use crate::config::SimulationConf;
use crate::models::{RawSample, Readings};
use crate::state::ConfigStore;

/// Source d'échantillons bruts, interrogée une fois par cycle
pub trait ReadingSource {
    fn sample(&mut self) -> RawSample;
}

impl Readings {
    /// Lectures d'un cycle à partir de l'échantillon brut.
    ///
    /// Température : moyenne des deux thermomètres, ou le principal seul si
    /// le secondaire a échoué. Pression convertie de Pa en hPa. Humidité à 0,
    /// sans offset, quand le capteur a échoué.
    pub fn from_sample(sample: &RawSample, store: &ConfigStore) -> Self {
        let temperature = match sample.secondary_temp_c {
            Some(secondary) => (sample.primary_temp_c + secondary) / 2.0,
            None => sample.primary_temp_c,
        };

        Self {
            temperature: temperature + store.offset_temp,
            pressure: sample.pressure_pa / 100.0 + store.offset_pressure,
            humidity: sample
                .humidity_pct
                .map_or(0.0, |h| h + store.offset_humidity),
        }
    }
}

/// Capteurs simulés pour la version hôte : valeurs de base + dérive lente
#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    base: SimulationConf,
    cycle: u64,
}

impl SimulatedSensors {
    pub fn new(base: SimulationConf) -> Self {
        Self { base, cycle: 0 }
    }
}

impl ReadingSource for SimulatedSensors {
    fn sample(&mut self) -> RawSample {
        // dérive déterministe, même séquence à chaque démarrage
        let phase = self.cycle as f32 * 0.1;
        let drift = self.base.drift;
        self.cycle += 1;

        let primary = self.base.temperature_c + drift * phase.sin();
        RawSample {
            primary_temp_c: primary,
            secondary_temp_c: Some(primary + drift * 0.4 * phase.cos()),
            pressure_pa: self.base.pressure_pa + drift * 100.0 * (phase / 2.0).sin(),
            humidity_pct: Some(self.base.humidity_pct + drift * 4.0 * phase.cos()),
        }
    }
}
