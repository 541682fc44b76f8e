/*!
Mocks matériels pour tester la station sans carte

Capteurs scriptables, actionneurs et écran enregistreurs, transport qui
n'accepte que des écritures partielles. Tous clonables : une copie part dans
la station, l'autre reste dans le test pour piloter et vérifier.
*/

use estacao_kernel::actuators::{Actuators, MatrixPattern};
use estacao_kernel::display::{Screen, StatusPanel};
use estacao_kernel::models::{Indicator, RawSample};
use estacao_kernel::sensors::ReadingSource;
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorEvent {
    Buzzer(bool),
    Indicator(Indicator, bool),
    Pattern(MatrixPattern),
}

/// Actionneurs qui enregistrent chaque commande reçue
#[derive(Debug, Clone, Default)]
pub struct RecordingActuators {
    events: Arc<Mutex<Vec<ActuatorEvent>>>,
}

impl RecordingActuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActuatorEvent> {
        self.events.lock().clone()
    }

    pub fn contains(&self, event: ActuatorEvent) -> bool {
        self.events.lock().contains(&event)
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Actuators for RecordingActuators {
    fn set_buzzer(&mut self, on: bool) {
        self.events.lock().push(ActuatorEvent::Buzzer(on));
        log::debug!("🔔 [MOCK] buzzer {}", on);
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        self.events.lock().push(ActuatorEvent::Indicator(indicator, on));
        log::debug!("💡 [MOCK] {:?} {}", indicator, on);
    }

    fn show_pattern(&mut self, pattern: MatrixPattern) {
        self.events.lock().push(ActuatorEvent::Pattern(pattern));
        log::debug!("🟥 [MOCK] matrix {:?}", pattern);
    }
}

/// Capteurs dont la valeur courante est fixée par le test
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    current: Arc<Mutex<RawSample>>,
    samples: Arc<Mutex<usize>>,
}

impl ScriptedSensors {
    pub fn new(initial: RawSample) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
            samples: Arc::new(Mutex::new(0)),
        }
    }

    /// Conditions nominales : 25 °C, 1013.25 hPa, 55 %
    pub fn nominal() -> Self {
        Self::new(nominal_sample())
    }

    pub fn set(&self, sample: RawSample) {
        *self.current.lock() = sample;
    }

    pub fn update(&self, f: impl FnOnce(&mut RawSample)) {
        f(&mut self.current.lock());
    }

    /// Nombre de cycles ayant lu les capteurs
    pub fn samples_taken(&self) -> usize {
        *self.samples.lock()
    }
}

impl ReadingSource for ScriptedSensors {
    fn sample(&mut self) -> RawSample {
        *self.samples.lock() += 1;
        *self.current.lock()
    }
}

pub fn nominal_sample() -> RawSample {
    RawSample {
        primary_temp_c: 25.0,
        secondary_temp_c: Some(25.0),
        pressure_pa: 101_325.0,
        humidity_pct: Some(55.0),
    }
}

/// Écran qui garde tous les panneaux affichés
#[derive(Debug, Clone, Default)]
pub struct RecordingScreen {
    panels: Arc<Mutex<Vec<StatusPanel>>>,
}

impl RecordingScreen {
    pub fn panels(&self) -> Vec<StatusPanel> {
        self.panels.lock().clone()
    }

    pub fn last(&self) -> Option<StatusPanel> {
        self.panels.lock().last().cloned()
    }
}

impl Screen for RecordingScreen {
    fn show(&mut self, panel: &StatusPanel) {
        self.panels.lock().push(panel.clone());
    }
}

/// Transport en mémoire : livre une requête fixe, n'accepte que `chunk`
/// octets par écriture et compte les écritures
#[derive(Debug)]
pub struct ChunkedTransport {
    request: Vec<u8>,
    read_pos: usize,
    chunk: usize,
    pub written: Vec<u8>,
    pub writes: usize,
    pub shut_down: bool,
}

impl ChunkedTransport {
    pub fn new(request: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            request: request.into(),
            read_pos: 0,
            chunk,
            written: Vec::new(),
            writes: 0,
            shut_down: false,
        }
    }
}

impl AsyncRead for ChunkedTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let rest = &self.request[self.read_pos..];
        let n = rest.len().min(buf.remaining());
        buf.put_slice(&rest[..n]);
        self.read_pos += n;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ChunkedTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let n = buf.len().min(self.chunk);
        self.written.extend_from_slice(&buf[..n]);
        self.writes += 1;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shut_down = true;
        Poll::Ready(Ok(()))
    }
}
