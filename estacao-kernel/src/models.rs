use serde::Serialize;

/// Les trois grandeurs surveillées par la station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Pressure,
    Humidity,
}

impl Metric {
    /// Ordre d'évaluation fixe du moteur d'alertes
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Pressure, Metric::Humidity];

    /// LED témoin associée à la métrique
    pub fn indicator(self) -> Indicator {
        match self {
            Metric::Temperature => Indicator::Red,
            Metric::Pressure => Indicator::Green,
            Metric::Humidity => Indicator::Blue,
        }
    }
}

/// LEDs indicatrices (une par métrique)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Red,
    Green,
    Blue,
}

/// Échantillon brut tel que livré par les capteurs.
/// `None` = capteur humidité/température secondaire en échec sur ce cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub primary_temp_c: f32,
    pub secondary_temp_c: Option<f32>,
    pub pressure_pa: f32,
    pub humidity_pct: Option<f32>,
}

/// Dernières lectures (offsets déjà appliqués) : °C, hPa, %
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Readings {
    pub temperature: f32,
    pub pressure: f32,
    pub humidity: f32,
}

impl Readings {
    pub fn new(temperature: f32, pressure: f32, humidity: f32) -> Self {
        Self { temperature, pressure, humidity }
    }

    pub fn get(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Pressure => self.pressure,
            Metric::Humidity => self.humidity,
        }
    }
}
