/**
 * ESTAÇÃO KERNEL - Point d'entrée de la station météo
 *
 * RÔLE : Bootstrap : env, logs, config, écoute TCP, puis boucle d'événements.
 * Ctrl-C déclenche un arrêt propre (actionneurs coupés).
 *
 * ARCHITECTURE : Capteurs simulés + actionneurs et afficheur journalisés ;
 * les pilotes matériels se branchent via les traits du noyau.
 */

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use estacao_kernel::actuators::LogActuators;
use estacao_kernel::display::{LogScreen, Screen, StatusPanel};
use estacao_kernel::sensors::SimulatedSensors;
use estacao_kernel::{load_config, Station};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("estacao_kernel=info")),
        )
        .init();

    let mut screen = LogScreen;
    screen.show(&StatusPanel::boot());

    let cfg = load_config().await;
    let listener = TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("bind {}", cfg.listen))?;
    info!("🌦️  estacao-kernel sur http://{}", listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!(error = %e, "ctrl-c handler unavailable");
                // la tâche garde l'émetteur : la station tourne jusqu'au kill
                std::future::pending::<()>().await;
            }
        }
    });

    let sensors = SimulatedSensors::new(cfg.simulation.clone());
    let station = Station::new(cfg, sensors, LogActuators::default(), screen);
    let last = station.run(listener, shutdown_rx).await.context("event loop")?;

    info!(offsets = ?(last.store.offset_temp, last.store.offset_pressure, last.store.offset_humidity), "station stopped");
    Ok(())
}
