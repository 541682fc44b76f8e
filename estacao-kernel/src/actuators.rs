//! Actionneurs locaux : buzzer, LEDs témoins, matrice 5x5.
//!
//! Le moteur d'alertes ne parle qu'au trait [`Actuators`] ; les pilotes
//! matériels (PWM, PIO) restent hors du noyau.

use tracing::info;

use crate::models::Indicator;

/// Luminosité par défaut de la matrice, en pourcent
pub const DEFAULT_BRIGHTNESS: u8 = 50;

const RED: u32 = 0xFF_00_00;

/// Motifs affichables sur la matrice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixPattern {
    Blank,
    /// Motif distinct affiché quand plusieurs métriques sont hors limites
    MultiAlert,
}

impl MatrixPattern {
    /// Image 5x5 en 0xRRGGBB, ligne par ligne depuis le haut
    pub fn frame(self) -> [u32; 25] {
        match self {
            MatrixPattern::Blank => [0; 25],
            MatrixPattern::MultiAlert => {
                let mut frame = [0; 25];
                for i in 0..5 {
                    frame[i * 5 + i] = RED;
                    frame[i * 5 + (4 - i)] = RED;
                }
                frame
            }
        }
    }
}

/// Applique une luminosité (0-100 %) à une couleur 0xRRGGBB
pub fn scale_color(color: u32, brightness: u8) -> u32 {
    let pct = u32::from(brightness.min(100));
    let channel = |shift: u32| (((color >> shift) & 0xFF) * pct / 100) << shift;
    channel(16) | channel(8) | channel(0)
}

/// Commandes envoyées aux actionneurs, sans acquittement
pub trait Actuators {
    fn set_buzzer(&mut self, on: bool);
    fn set_indicator(&mut self, indicator: Indicator, on: bool);
    fn show_pattern(&mut self, pattern: MatrixPattern);
}

/// Actionneurs de la version hôte : tout passe dans les logs
#[derive(Debug, Clone)]
pub struct LogActuators {
    brightness: u8,
}

impl Default for LogActuators {
    fn default() -> Self {
        Self { brightness: DEFAULT_BRIGHTNESS }
    }
}

impl Actuators for LogActuators {
    fn set_buzzer(&mut self, on: bool) {
        info!(on, "buzzer");
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        info!(?indicator, on, "indicator");
    }

    fn show_pattern(&mut self, pattern: MatrixPattern) {
        let lit = pattern.frame().iter().filter(|&&c| c != 0).count();
        let color = scale_color(RED, self.brightness);
        info!(?pattern, lit, color = format_args!("{color:06X}"), "matrix");
    }
}
