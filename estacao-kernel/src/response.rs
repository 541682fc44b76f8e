//! Construction des réponses HTTP dans un tampon de capacité fixe.
//!
//! Trois formes : accusé texte, snapshot JSON, page par défaut.
//! Le tampon ne grandit jamais : ce qui dépasse est tronqué en silence.

use std::collections::TryReserveError;
use std::fmt::{self, Write as _};

use tracing::debug;

use crate::models::Metric;
use crate::state::StationState;

/// Capacité du tampon de réponse par connexion
pub const DEFAULT_RESPONSE_CAPACITY: usize = 12_000;

/// Page servie pour toute requête non reconnue
pub const DEFAULT_PAGE: &str = include_str!("../static/index.html");

/// Tampon borné ; l'écriture au-delà de la capacité est ignorée
#[derive(Debug)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    truncated: bool,
}

impl ResponseBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    /// Variante faillible : l'allocation est réservée d'un coup, sans panique
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity)?;
        Ok(Self {
            bytes,
            capacity,
            truncated: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.truncated = false;
    }

    /// Copie ce qui tient encore, marque la troncature sinon
    pub fn push_bytes(&mut self, data: &[u8]) {
        let room = self.capacity - self.bytes.len();
        if data.len() > room {
            self.truncated = true;
        }
        let take = data.len().min(room);
        self.bytes.extend_from_slice(&data[..take]);
    }
}

impl fmt::Write for ResponseBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_bytes(s.as_bytes());
        Ok(())
    }
}

/// Réglage modifié, pour le texte de confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Offset(Metric),
    Limits(Metric),
}

impl Acknowledgement {
    pub fn text(self) -> &'static str {
        match self {
            Acknowledgement::Offset(Metric::Temperature) => "Offset de temperatura atualizado",
            Acknowledgement::Offset(Metric::Pressure) => "Offset de pressão atualizado",
            Acknowledgement::Offset(Metric::Humidity) => "Offset de umidade atualizado",
            Acknowledgement::Limits(Metric::Temperature) => "Limites de temperatura atualizados",
            Acknowledgement::Limits(Metric::Pressure) => "Limites de pressão atualizados",
            Acknowledgement::Limits(Metric::Humidity) => "Limites de umidade atualizados",
        }
    }
}

/// Photo de l'état servie par `GET /estado`
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub offset_temp: f32,
    pub offset_pressao: f32,
    pub offset_umidade: f32,
    pub min_temp: f32,
    pub max_temp: f32,
    pub min_press: f32,
    pub max_press: f32,
    pub min_umid: f32,
    pub max_umid: f32,
}

impl Snapshot {
    pub fn capture(state: &StationState) -> Self {
        let store = &state.store;
        Self {
            x: state.readings.temperature,
            y: state.readings.pressure,
            z: state.readings.humidity,
            offset_temp: store.offset_temp,
            offset_pressao: store.offset_pressure,
            offset_umidade: store.offset_humidity,
            min_temp: store.min_temp,
            max_temp: store.max_temp,
            min_press: store.min_pressure,
            max_press: store.max_pressure,
            min_umid: store.min_humidity,
            max_umid: store.max_humidity,
        }
    }

    /// JSON compact, clés dans l'ordre du protocole, deux décimales partout
    pub fn to_json(&self) -> String {
        format!(
            "{{\"x\":{:.2},\"y\":{:.2},\"z\":{:.2},\
             \"offset_temp\":{:.2},\"offset_pressao\":{:.2},\"offset_umidade\":{:.2},\
             \"min_temp\":{:.2},\"max_temp\":{:.2},\
             \"min_press\":{:.2},\"max_press\":{:.2},\
             \"min_umid\":{:.2},\"max_umid\":{:.2}}}",
            self.x,
            self.y,
            self.z,
            self.offset_temp,
            self.offset_pressao,
            self.offset_umidade,
            self.min_temp,
            self.max_temp,
            self.min_press,
            self.max_press,
            self.min_umid,
            self.max_umid,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    Acknowledgement(Acknowledgement),
    Snapshot(Snapshot),
    DefaultPage,
}

impl ResponseKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseKind::Acknowledgement(_) => "text/plain",
            ResponseKind::Snapshot(_) => "application/json",
            ResponseKind::DefaultPage => "text/html",
        }
    }

    /// Écrit la réponse complète dans `buf` (vidé au préalable)
    pub fn render(&self, buf: &mut ResponseBuffer) {
        buf.clear();
        match self {
            ResponseKind::Acknowledgement(ack) => write_response(buf, self.content_type(), ack.text()),
            ResponseKind::Snapshot(snapshot) => {
                write_response(buf, self.content_type(), &snapshot.to_json())
            }
            ResponseKind::DefaultPage => write_response(buf, self.content_type(), DEFAULT_PAGE),
        }

        if buf.is_truncated() {
            debug!(capacity = buf.capacity(), "response truncated to buffer capacity");
        }
    }
}

fn write_response(buf: &mut ResponseBuffer, content_type: &str, body: &str) {
    // L'écriture dans ResponseBuffer ne peut pas échouer
    let _ = write!(
        buf,
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        content_type,
        body.len()
    );
    buf.push_bytes(body.as_bytes());
}
