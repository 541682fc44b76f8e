/**
 * MOTEUR D'ALERTES - Surveillance des seuils et pilotage des actionneurs
 *
 * RÔLE :
 * À chaque cycle, compare les trois lectures aux bornes du ConfigStore et
 * décide quoi actionner : rien, une alerte simple (buzzer + LED de la
 * métrique) ou une alerte multiple (buzzer seul, puis motif sur la matrice).
 *
 * FONCTIONNEMENT :
 * - Ordre fixe température -> pression -> humidité, comparaisons strictes
 * - Chaque métrique hors limites écrase la LED retenue (la dernière gagne)
 * - L'actionnement est une machine à états à échéances, pilotée par la
 *   boucle d'événements : le réseau reste servi pendant une alerte
 *
 * ÉTATS :
 * Idle -> Single(LED) -> Idle
 * Idle -> MultiSounding -> MultiPattern -> Idle
 */

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::actuators::{Actuators, MatrixPattern};
use crate::models::{Indicator, Metric, Readings};
use crate::state::ConfigStore;

/// Durée d'actionnement par défaut
pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_millis(500);

/// Résultat de l'évaluation d'un cycle, non conservé d'un cycle à l'autre
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    pub active: bool,
    pub count: u8,
    /// LED de la dernière métrique hors limites évaluée
    pub indicator: Option<Indicator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    Idle,
    Single(Indicator),
    Multi,
}

impl AlertState {
    pub fn evaluate(readings: &Readings, store: &ConfigStore) -> Self {
        let mut state = AlertState::default();

        for metric in Metric::ALL {
            let value = readings.get(metric);
            let (min, max) = store.limits(metric);
            if value < min || value > max {
                state.active = true;
                state.count += 1;
                state.indicator = Some(metric.indicator());
            }
        }

        state
    }

    pub fn decision(&self) -> AlertDecision {
        match (self.count, self.indicator) {
            (0, _) | (_, None) => AlertDecision::Idle,
            (1, Some(indicator)) => AlertDecision::Single(indicator),
            _ => AlertDecision::Multi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStage {
    Single(Indicator),
    MultiSounding,
    MultiPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Idle,
    Actuating { stage: AlertStage, deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct AlertEngine {
    duration: Duration,
    phase: AlertPhase,
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_DURATION)
    }
}

impl AlertEngine {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            phase: AlertPhase::Idle,
        }
    }

    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == AlertPhase::Idle
    }

    /// Prochaine échéance d'actionnement, si une alerte est en cours
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            AlertPhase::Idle => None,
            AlertPhase::Actuating { deadline, .. } => Some(deadline),
        }
    }

    /// Démarre l'actionnement correspondant à l'évaluation du cycle.
    /// Sans effet si un actionnement est déjà en cours.
    pub fn start<A>(&mut self, alert: &AlertState, now: Instant, actuators: &mut A) -> AlertDecision
    where
        A: Actuators + ?Sized,
    {
        let decision = alert.decision();
        if !self.is_idle() {
            return decision;
        }

        match decision {
            AlertDecision::Idle => {}
            AlertDecision::Single(indicator) => {
                info!(?indicator, "single alert");
                actuators.set_buzzer(true);
                actuators.set_indicator(indicator, true);
                self.enter(AlertStage::Single(indicator), now);
            }
            AlertDecision::Multi => {
                info!(count = alert.count, "multiple alerts");
                actuators.set_buzzer(true);
                self.enter(AlertStage::MultiSounding, now);
            }
        }

        decision
    }

    /// Fait avancer la machine si l'échéance est atteinte
    pub fn advance<A>(&mut self, now: Instant, actuators: &mut A) -> AlertPhase
    where
        A: Actuators + ?Sized,
    {
        let AlertPhase::Actuating { stage, deadline } = self.phase else {
            return self.phase;
        };
        if now < deadline {
            return self.phase;
        }

        match stage {
            AlertStage::Single(indicator) => {
                actuators.set_buzzer(false);
                actuators.set_indicator(indicator, false);
                self.phase = AlertPhase::Idle;
            }
            AlertStage::MultiSounding => {
                actuators.set_buzzer(false);
                actuators.show_pattern(MatrixPattern::MultiAlert);
                self.enter(AlertStage::MultiPattern, now);
            }
            AlertStage::MultiPattern => {
                actuators.show_pattern(MatrixPattern::Blank);
                self.phase = AlertPhase::Idle;
            }
        }

        if self.is_idle() {
            info!("alert cleared");
        }
        self.phase
    }

    /// Coupe immédiatement l'actionnement en cours
    pub fn cancel<A>(&mut self, actuators: &mut A)
    where
        A: Actuators + ?Sized,
    {
        let AlertPhase::Actuating { stage, .. } = self.phase else {
            return;
        };

        match stage {
            AlertStage::Single(indicator) => {
                actuators.set_buzzer(false);
                actuators.set_indicator(indicator, false);
            }
            AlertStage::MultiSounding => actuators.set_buzzer(false),
            AlertStage::MultiPattern => actuators.show_pattern(MatrixPattern::Blank),
        }
        self.phase = AlertPhase::Idle;
        info!("alert cancelled");
    }

    fn enter(&mut self, stage: AlertStage, now: Instant) {
        self.phase = AlertPhase::Actuating {
            stage,
            deadline: now + self.duration,
        };
    }
}
