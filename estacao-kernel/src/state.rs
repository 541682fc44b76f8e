use crate::models::{Metric, Readings};

/// Calibration et plages acceptables des trois métriques.
///
/// Écrit uniquement par le routeur, lu par le moteur d'alertes à chaque cycle.
/// Aucune validation : un `min > max` est conservé tel quel.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    pub offset_temp: f32,
    pub offset_pressure: f32,
    pub offset_humidity: f32,
    pub min_temp: f32,
    pub max_temp: f32,
    pub min_pressure: f32,
    pub max_pressure: f32,
    pub min_humidity: f32,
    pub max_humidity: f32,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            offset_temp: 0.0,
            offset_pressure: 0.0,
            offset_humidity: 0.0,
            min_temp: -50.0,
            max_temp: 50.0,
            min_pressure: 900.0,
            max_pressure: 1100.0,
            min_humidity: 0.0,
            max_humidity: 100.0,
        }
    }
}

impl ConfigStore {
    pub fn get(&self) -> &ConfigStore {
        self
    }

    pub fn offset(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Temperature => self.offset_temp,
            Metric::Pressure => self.offset_pressure,
            Metric::Humidity => self.offset_humidity,
        }
    }

    /// (min, max) courant pour la métrique
    pub fn limits(&self, metric: Metric) -> (f32, f32) {
        match metric {
            Metric::Temperature => (self.min_temp, self.max_temp),
            Metric::Pressure => (self.min_pressure, self.max_pressure),
            Metric::Humidity => (self.min_humidity, self.max_humidity),
        }
    }

    pub fn set_offset(&mut self, metric: Metric, value: f32) {
        match metric {
            Metric::Temperature => self.offset_temp = value,
            Metric::Pressure => self.offset_pressure = value,
            Metric::Humidity => self.offset_humidity = value,
        }
    }

    pub fn set_limits(&mut self, metric: Metric, min: f32, max: f32) {
        match metric {
            Metric::Temperature => {
                self.min_temp = min;
                self.max_temp = max;
            }
            Metric::Pressure => {
                self.min_pressure = min;
                self.max_pressure = max;
            }
            Metric::Humidity => {
                self.min_humidity = min;
                self.max_humidity = max;
            }
        }
    }
}

/// État unique de la station, possédé par la boucle d'événements.
/// Passé en `&mut` au routeur et en `&` au moteur d'alertes, jamais partagé entre threads.
#[derive(Debug, Clone, Default)]
pub struct StationState {
    pub store: ConfigStore,
    pub readings: Readings,
    /// Adresse réseau, affichage seulement
    pub network_label: String,
}

impl StationState {
    pub fn new(network_label: impl Into<String>) -> Self {
        Self {
            network_label: network_label.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let store = ConfigStore::default();
        assert_eq!(store.limits(Metric::Temperature), (-50.0, 50.0));
        assert_eq!(store.limits(Metric::Pressure), (900.0, 1100.0));
        assert_eq!(store.limits(Metric::Humidity), (0.0, 100.0));
        for metric in Metric::ALL {
            assert_eq!(store.offset(metric), 0.0);
        }
    }

    #[test]
    fn test_set_offset_only_touches_one_metric() {
        let mut store = ConfigStore::default();
        store.set_offset(Metric::Pressure, 12.25);

        assert_eq!(store.offset(Metric::Pressure), 12.25);
        assert_eq!(store.offset(Metric::Temperature), 0.0);
        assert_eq!(store.offset(Metric::Humidity), 0.0);
        assert_eq!(store.limits(Metric::Pressure), (900.0, 1100.0));
    }

    #[test]
    fn test_set_limits_keeps_inverted_bounds() {
        let mut store = ConfigStore::default();
        store.set_limits(Metric::Humidity, 80.0, 20.0);
        assert_eq!(store.limits(Metric::Humidity), (80.0, 20.0));

        // Dernier écrivain gagne
        store.set_limits(Metric::Humidity, 10.0, 90.0);
        assert_eq!(store.get().min_humidity, 10.0);
        assert_eq!(store.get().max_humidity, 90.0);
    }
}
