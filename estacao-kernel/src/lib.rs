//! Noyau de la station météo : monitoring des capteurs, alertes locales et
//! plan de contrôle HTTP, le tout sérialisé sur une boucle d'événements.

pub mod actuators;
pub mod alerts;
pub mod config;
pub mod connection;
pub mod display;
pub mod models;
pub mod response;
pub mod router;
pub mod sensors;
pub mod server;
pub mod state;

pub use config::{load_config, StationConfig};
pub use server::Station;
