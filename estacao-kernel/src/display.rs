use tracing::info;

use crate::models::{RawSample, Readings};

/// En-tête des colonnes capteurs
pub const SENSOR_HEADER: &str = "BMP280  AHT20";

/// Contenu d'un écran d'état, une chaîne par ligne
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPanel {
    pub lines: Vec<String>,
}

impl StatusPanel {
    pub fn boot() -> Self {
        Self {
            lines: vec!["Iniciando...".into()],
        }
    }

    pub fn network_ready(label: &str) -> Self {
        Self {
            lines: vec!["Rede => OK".into(), label.to_string()],
        }
    }

    /// Écran de cycle : température brute du capteur principal, pression et
    /// humidité corrigées, `--` pour un capteur secondaire en échec
    pub fn from_sample(label: &str, sample: &RawSample, readings: &Readings) -> Self {
        let secondary = sample
            .secondary_temp_c
            .map(|t| format!("{t:.1}C"))
            .unwrap_or_else(|| "--".into());
        let humidity = match sample.humidity_pct {
            Some(_) => format!("{:.1}%", readings.humidity),
            None => "--".into(),
        };

        Self {
            lines: vec![
                label.to_string(),
                SENSOR_HEADER.into(),
                format!("{:.1}C  {}", sample.primary_temp_c, secondary),
                format!("{:.0}hPa  {}", readings.pressure, humidity),
            ],
        }
    }
}

/// Afficheur local ; `show` remplace tout l'écran
pub trait Screen {
    fn show(&mut self, panel: &StatusPanel);
}

/// Afficheur de la version hôte
#[derive(Debug, Default, Clone)]
pub struct LogScreen;

impl Screen for LogScreen {
    fn show(&mut self, panel: &StatusPanel) {
        info!(panel = %panel.lines.join(" | "), "display");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_panels() {
        assert_eq!(StatusPanel::boot().lines, vec!["Iniciando..."]);
        assert_eq!(
            StatusPanel::network_ready("192.168.0.10:8080").lines,
            vec!["Rede => OK", "192.168.0.10:8080"]
        );
    }

    #[test]
    fn test_cycle_panel_format() {
        let sample = RawSample {
            primary_temp_c: 23.46,
            secondary_temp_c: Some(24.04),
            pressure_pa: 101_325.0,
            humidity_pct: Some(55.0),
        };
        let readings = Readings::new(23.75, 1013.25, 56.3);
        let panel = StatusPanel::from_sample("10.0.0.2", &sample, &readings);

        assert_eq!(
            panel.lines,
            vec!["10.0.0.2", "BMP280  AHT20", "23.5C  24.0C", "1013hPa  56.3%"]
        );
    }

    #[test]
    fn test_cycle_panel_failed_sensor() {
        let sample = RawSample {
            primary_temp_c: 19.0,
            secondary_temp_c: None,
            pressure_pa: 95_000.0,
            humidity_pct: None,
        };
        let panel = StatusPanel::from_sample("-", &sample, &Readings::new(19.0, 950.0, 0.0));
        assert_eq!(panel.lines[2], "19.0C  --");
        assert_eq!(panel.lines[3], "950hPa  --");
    }
}
