/**
 * STATION - Boucle d'événements unique
 *
 * RÔLE :
 * Possède l'état de la station et sérialise tout ce qui le touche : cycles de
 * monitoring, échéances d'alerte, requêtes du plan de contrôle.
 *
 * FONCTIONNEMENT :
 * - select! biaisé : arrêt > échéance d'alerte > requête prête > accept > cycle
 * - Chaque connexion acceptée vit dans sa propre tâche (lecture + envoi), mais
 *   le routage et le rendu passent par la boucle via ControlRequest
 * - Un cycle n'est lancé que moteur au repos ; le suivant est planifié
 *   `tick_interval` après le retour au repos
 * - À l'arrêt, l'actionnement en cours est coupé
 */

use std::io;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::actuators::Actuators;
use crate::alerts::{AlertEngine, AlertState};
use crate::config::StationConfig;
use crate::connection::{serve_connection, ConnectionError, ConnectionLimits, ControlRequest, ResponseSlots};
use crate::display::{Screen, StatusPanel};
use crate::models::Readings;
use crate::router::RequestRouter;
use crate::sensors::ReadingSource;
use crate::state::StationState;

/// Requêtes en attente de routage
const CONTROL_QUEUE: usize = 32;

pub struct Station<S, A, D> {
    config: StationConfig,
    state: StationState,
    router: RequestRouter,
    engine: AlertEngine,
    sensors: S,
    actuators: A,
    screen: D,
}

impl<S, A, D> Station<S, A, D>
where
    S: ReadingSource,
    A: Actuators,
    D: Screen,
{
    pub fn new(config: StationConfig, sensors: S, actuators: A, screen: D) -> Self {
        let engine = AlertEngine::new(config.monitor.alert_duration());
        Self {
            config,
            state: StationState::default(),
            router: RequestRouter::new(),
            engine,
            sensors,
            actuators,
            screen,
        }
    }

    pub fn with_network_label(mut self, label: impl Into<String>) -> Self {
        self.state.network_label = label.into();
        self
    }

    pub fn state(&self) -> &StationState {
        &self.state
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    /// Un cycle de monitoring : lecture, affichage, évaluation, actionnement
    pub fn tick(&mut self, now: Instant) -> AlertState {
        let sample = self.sensors.sample();
        self.state.readings = Readings::from_sample(&sample, &self.state.store);
        self.screen.show(&StatusPanel::from_sample(
            &self.state.network_label,
            &sample,
            &self.state.readings,
        ));

        let alert = AlertState::evaluate(&self.state.readings, &self.state.store);
        debug!(readings = ?self.state.readings, count = alert.count, "tick");
        self.engine.start(&alert, now, &mut self.actuators);
        alert
    }

    /// Route la requête, rend la réponse dans le tampon de la connexion et le lui rend
    pub fn handle_request(&mut self, request: ControlRequest) {
        let ControlRequest { raw, mut lifecycle, reply } = request;
        let kind = self.router.handle(&raw, &mut self.state);
        lifecycle.load(&kind);

        if reply.send(lifecycle).is_err() {
            debug!("connection gone before response");
        }
    }

    /// Sert jusqu'à ce que `shutdown` passe à `true` (ou que l'émetteur disparaisse).
    /// Retourne l'état final.
    pub async fn run(
        mut self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> io::Result<StationState> {
        let local = listener.local_addr()?;
        if self.state.network_label.is_empty() {
            self.state.network_label = local.to_string();
        }
        self.screen.show(&StatusPanel::network_ready(&self.state.network_label));
        info!(%local, "station listening");

        let http = &self.config.http;
        let slots = ResponseSlots::new(http.connection_slots);
        let limits = ConnectionLimits {
            request_capacity: http.request_capacity,
            response_capacity: http.response_capacity,
        };
        let tick_interval = self.config.monitor.tick_interval();
        let (control_tx, mut control_rx) = mpsc::channel::<ControlRequest>(CONTROL_QUEUE);
        let mut next_tick = Instant::now();

        loop {
            let deadline = self.engine.deadline();

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutdown requested");
                        break;
                    }
                }

                _ = sleep_until(deadline.unwrap_or(next_tick)), if deadline.is_some() => {
                    let now = Instant::now();
                    self.engine.advance(now, &mut self.actuators);
                    if self.engine.is_idle() {
                        next_tick = now + tick_interval;
                    }
                }

                Some(request) = control_rx.recv() => self.handle_request(request),

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let slots = slots.clone();
                        let control = control_tx.clone();
                        tokio::spawn(async move {
                            match serve_connection(stream, slots, limits, control).await {
                                Ok(sent) => debug!(%peer, sent, "response sent"),
                                Err(ConnectionError::Allocation(what)) => {
                                    warn!(%peer, what, "allocation failed, connection dropped")
                                }
                                Err(e) => warn!(%peer, error = %e, "connection failed"),
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },

                _ = sleep_until(next_tick), if self.engine.is_idle() => {
                    let now = Instant::now();
                    self.tick(now);
                    if self.engine.is_idle() {
                        next_tick = now + tick_interval;
                    }
                }
            }
        }

        self.engine.cancel(&mut self.actuators);
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuators::MatrixPattern;
    use crate::models::{Indicator, Metric, RawSample};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    struct Fixed(RawSample);

    impl ReadingSource for Fixed {
        fn sample(&mut self) -> RawSample {
            self.0
        }
    }

    #[derive(Default)]
    struct Counter {
        buzzer_on: usize,
        leds: Vec<(Indicator, bool)>,
        patterns: Vec<MatrixPattern>,
    }

    impl Actuators for Counter {
        fn set_buzzer(&mut self, on: bool) {
            if on {
                self.buzzer_on += 1;
            }
        }
        fn set_indicator(&mut self, indicator: Indicator, on: bool) {
            self.leds.push((indicator, on));
        }
        fn show_pattern(&mut self, pattern: MatrixPattern) {
            self.patterns.push(pattern);
        }
    }

    struct Blind;

    impl Screen for Blind {
        fn show(&mut self, _panel: &StatusPanel) {}
    }

    fn nominal() -> RawSample {
        RawSample {
            primary_temp_c: 22.0,
            secondary_temp_c: Some(22.0),
            pressure_pa: 101_300.0,
            humidity_pct: Some(50.0),
        }
    }

    fn fast_config() -> StationConfig {
        let mut cfg = StationConfig::default();
        cfg.monitor.tick_interval_ms = 20;
        cfg.monitor.alert_duration_ms = 20;
        cfg
    }

    async fn get(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(format!("GET {path} HTTP/1.1\r\nHost: station\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_tick_applies_offsets_and_starts_alert() {
        let mut station = Station::new(fast_config(), Fixed(nominal()), Counter::default(), Blind);
        let alert = station.tick(Instant::now());
        assert!(!alert.active);
        assert!(station.engine().is_idle());
        assert_eq!(station.state().readings.temperature, 22.0);

        station.state.store.set_offset(Metric::Humidity, 100.0);
        let alert = station.tick(Instant::now());
        assert_eq!(alert.count, 1);
        assert_eq!(station.state().readings.humidity, 150.0);
        assert!(!station.engine().is_idle());
        assert_eq!(station.actuators().buzzer_on, 1);
        assert_eq!(station.actuators().leds, vec![(Indicator::Blue, true)]);
    }

    #[tokio::test]
    async fn test_control_plane_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = watch::channel(false);
        let station = Station::new(fast_config(), Fixed(nominal()), Counter::default(), Blind);
        let running = tokio::spawn(station.run(listener, stopped));

        let ack = get(addr, "/offset/temp/-2.5").await;
        assert!(ack.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(ack.ends_with("Offset de temperatura atualizado"));

        let ack = get(addr, "/limites/press/min/950/max/1050").await;
        assert!(ack.ends_with("Limites de pressão atualizados"));

        let page = get(addr, "/").await;
        assert!(page.contains("Content-Type: text/html"));

        stop.send(true).unwrap();
        let state = running.await.unwrap().unwrap();
        assert_eq!(state.store.offset_temp, -2.5);
        assert_eq!(state.store.limits(Metric::Pressure), (950.0, 1050.0));
        assert_eq!(state.network_label, addr.to_string());
    }

    #[tokio::test]
    async fn test_requests_served_while_alert_is_actuating() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = watch::channel(false);

        let mut cfg = fast_config();
        cfg.monitor.alert_duration_ms = 5_000;
        let mut hot = nominal();
        hot.primary_temp_c = 90.0;
        hot.secondary_temp_c = Some(90.0);
        let station = Station::new(cfg, Fixed(hot), Counter::default(), Blind);
        let running = tokio::spawn(station.run(listener, stopped));

        // premier cycle passé, l'alerte dure 5 s ; la requête doit répondre bien avant
        tokio::time::sleep(Duration::from_millis(50)).await;
        let reply = tokio::time::timeout(Duration::from_secs(2), get(addr, "/estado"))
            .await
            .expect("request blocked by alert");
        assert!(reply.contains("\"x\":90.00"));

        stop.send(true).unwrap();
        running.await.unwrap().unwrap();
    }
}
