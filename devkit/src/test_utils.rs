/*!
Test Harness pour la station

Démarre une station complète sur 127.0.0.1 (port libre) avec les mocks du
devkit, et fournit :
- un client HTTP minimal (une requête par connexion, lecture jusqu'à EOF)
- l'attente d'événements actionneurs avec timeout
- un arrêt propre qui rend l'état final
*/

use crate::mocks::{ActuatorEvent, RecordingActuators, RecordingScreen, ScriptedSensors};
use anyhow::{Context, Result};
use estacao_kernel::state::StationState;
use estacao_kernel::{Station, StationConfig};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Réponse HTTP découpée
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub raw: Vec<u8>,
    pub head: String,
    pub body: String,
}

impl HttpReply {
    fn parse(raw: Vec<u8>) -> Self {
        let text = String::from_utf8_lossy(&raw).into_owned();
        let (head, body) = match text.split_once("\r\n\r\n") {
            Some((head, body)) => (head.to_string(), body.to_string()),
            None => (text, String::new()),
        };
        Self { raw, head, body }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("body is not JSON")
    }
}

/// Config rapide pour les tests : cycles et alertes de 20 ms
pub fn fast_config() -> StationConfig {
    let mut cfg = StationConfig::default();
    cfg.listen = "127.0.0.1:0".into();
    cfg.monitor.tick_interval_ms = 20;
    cfg.monitor.alert_duration_ms = 20;
    cfg
}

/// Station en cours d'exécution + poignées sur ses mocks
pub struct TestHarness {
    pub addr: SocketAddr,
    pub sensors: ScriptedSensors,
    pub actuators: RecordingActuators,
    pub screen: RecordingScreen,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<std::io::Result<StationState>>,
}

impl TestHarness {
    pub async fn start() -> Result<Self> {
        Self::start_with(fast_config(), ScriptedSensors::nominal()).await
    }

    pub async fn start_with(config: StationConfig, sensors: ScriptedSensors) -> Result<Self> {
        env_logger::try_init().ok(); // Init logging pour tests

        let listener = TcpListener::bind(&config.listen)
            .await
            .with_context(|| format!("bind {}", config.listen))?;
        let addr = listener.local_addr()?;

        let actuators = RecordingActuators::new();
        let screen = RecordingScreen::default();
        let station = Station::new(config, sensors.clone(), actuators.clone(), screen.clone());
        let (shutdown, stopped) = watch::channel(false);
        let task = tokio::spawn(station.run(listener, stopped));

        log::info!("🧪 Test station on {}", addr);
        Ok(Self { addr, sensors, actuators, screen, shutdown, task })
    }

    /// Envoie des octets bruts, retourne tout ce que la station renvoie avant fermeture
    pub async fn send_raw(&self, request: &[u8]) -> Result<Vec<u8>> {
        let exchange = async {
            let mut stream = TcpStream::connect(self.addr).await?;
            stream.write_all(request).await?;
            let mut out = Vec::new();
            stream.read_to_end(&mut out).await?;
            Ok::<_, std::io::Error>(out)
        };
        let out = timeout(IO_TIMEOUT, exchange).await.context("request timed out")??;
        Ok(out)
    }

    pub async fn get(&self, path: &str) -> Result<HttpReply> {
        let request = format!("GET {path} HTTP/1.1\r\nHost: estacao\r\n\r\n");
        let raw = self.send_raw(request.as_bytes()).await?;
        Ok(HttpReply::parse(raw))
    }

    /// Snapshot JSON de `/estado`
    pub async fn estado(&self) -> Result<Value> {
        self.get("/estado").await?.json()
    }

    /// Attend qu'un cycle de monitoring ait lu les capteurs
    pub async fn wait_for_ticks(&self, count: usize) -> Result<()> {
        let target = self.sensors.samples_taken() + count;
        self.wait_until(|| self.sensors.samples_taken() >= target)
            .await
            .with_context(|| format!("{count} ticks did not happen"))
    }

    /// Attend qu'un événement actionneur soit enregistré
    pub async fn wait_for_event(&self, event: ActuatorEvent) -> Result<()> {
        self.wait_until(|| self.actuators.contains(event))
            .await
            .with_context(|| format!("no {event:?} within {IO_TIMEOUT:?}"))
    }

    async fn wait_until(&self, mut done: impl FnMut() -> bool) -> Result<()> {
        let deadline = Instant::now() + IO_TIMEOUT;
        while !done() {
            if Instant::now() >= deadline {
                anyhow::bail!("condition not met");
            }
            sleep(Duration::from_millis(5)).await;
        }
        Ok(())
    }

    /// Arrête la station et retourne son état final
    pub async fn shutdown(self) -> Result<StationState> {
        self.shutdown.send(true).ok();
        let state = timeout(IO_TIMEOUT, self.task)
            .await
            .context("station did not stop")??
            .context("station failed")?;
        log::info!("✅ Test station stopped");
        Ok(state)
    }
}
