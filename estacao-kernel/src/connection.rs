/**
 * CYCLE DE VIE DES CONNEXIONS - Envoi borné des réponses HTTP
 *
 * RÔLE :
 * Réserve les ressources d'une réponse (slot + tampon), compte les octets
 * acquittés par le transport et libère tout exactement une fois.
 *
 * FONCTIONNEMENT :
 * - AwaitingResponse : requête reçue, ressources réservées, tampon vide
 * - Sending : réponse rendue, écrite par morceaux (écritures partielles)
 * - Closed : octets acquittés == longueur totale, transport fermé
 * - Échec d'allocation : requête jetée, transport fermé sans réponse
 *
 * La tâche de connexion ne touche jamais l'état de la station : elle passe la
 * requête à la boucle d'événements via `ControlRequest` et attend le tampon rempli.
 */

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};

use crate::response::{ResponseBuffer, ResponseKind};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("response allocation failed: {0}")]
    Allocation(&'static str),
    #[error("transport accepted zero bytes before the response was complete")]
    WriteZero,
    #[error("station event loop is not running")]
    StationClosed,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    AwaitingResponse,
    Sending,
    Closed,
}

/// Tailles maximales côté requête et côté réponse
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub request_capacity: usize,
    pub response_capacity: usize,
}

/// Pool de slots de réponse ; un slot par connexion en cours
#[derive(Debug, Clone)]
pub struct ResponseSlots {
    semaphore: Arc<Semaphore>,
}

impl ResponseSlots {
    pub fn new(slots: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(slots)),
        }
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Réserve slot + tampon, sans attente ni nouvel essai
    pub fn allocate(&self, response_capacity: usize) -> Result<ConnectionLifecycle, ConnectionError> {
        let slot = self
            .semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| ConnectionError::Allocation("no free response slot"))?;
        let buffer = ResponseBuffer::try_with_capacity(response_capacity)
            .map_err(|_| ConnectionError::Allocation("response buffer"))?;

        Ok(ConnectionLifecycle {
            buffer,
            sent: 0,
            phase: ConnectionPhase::AwaitingResponse,
            _slot: slot,
        })
    }
}

/// État d'une connexion ; le slot est rendu quand la valeur est détruite
#[derive(Debug)]
pub struct ConnectionLifecycle {
    buffer: ResponseBuffer,
    sent: usize,
    phase: ConnectionPhase,
    _slot: OwnedSemaphorePermit,
}

impl ConnectionLifecycle {
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn total(&self) -> usize {
        self.buffer.len()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn response(&self) -> &ResponseBuffer {
        &self.buffer
    }

    /// Rend la réponse dans le tampon de la connexion
    pub fn load(&mut self, kind: &ResponseKind) {
        kind.render(&mut self.buffer);
        self.sent = 0;
        self.phase = ConnectionPhase::Sending;
    }

    /// Octets restant à envoyer
    pub fn pending(&self) -> &[u8] {
        let bytes = self.buffer.as_bytes();
        &bytes[self.sent.min(bytes.len())..]
    }

    /// Cumule un acquittement du transport ; `true` quand tout est parti
    pub fn acknowledge(&mut self, len: usize) -> bool {
        self.sent += len;
        if self.sent >= self.buffer.len() {
            self.phase = ConnectionPhase::Closed;
        }
        self.phase == ConnectionPhase::Closed
    }

    /// Écrit toute la réponse puis ferme le transport.
    /// Consomme le cycle de vie : le slot est libéré une seule fois, en sortie.
    pub async fn transmit<W>(mut self, io: &mut W) -> Result<usize, ConnectionError>
    where
        W: AsyncWrite + Unpin,
    {
        let total = self.total();
        let mut done = total == 0;

        while !done {
            let written = io.write(self.pending()).await?;
            if written == 0 {
                return Err(ConnectionError::WriteZero);
            }
            done = self.acknowledge(written);
        }

        io.flush().await?;
        io.shutdown().await?;
        self.phase = ConnectionPhase::Closed;
        Ok(total)
    }
}

/// Message envoyé à la boucle d'événements pour une requête reçue
#[derive(Debug)]
pub struct ControlRequest {
    pub raw: Vec<u8>,
    pub lifecycle: ConnectionLifecycle,
    pub reply: oneshot::Sender<ConnectionLifecycle>,
}

/// Lit la requête jusqu'à la fin des en-têtes, EOF ou capacité atteinte
pub async fn read_request<R>(io: &mut R, capacity: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; capacity];
    let mut total = 0usize;

    while total < capacity {
        let n = io.read(&mut buf[total..]).await?;
        if n == 0 {
            break;
        }
        total += n;
        if buf[..total].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    buf.truncate(total);
    Ok(buf)
}

/// Traite une connexion de bout en bout. Retourne le nombre d'octets envoyés.
pub async fn serve_connection<S>(
    mut stream: S,
    slots: ResponseSlots,
    limits: ConnectionLimits,
    control: mpsc::Sender<ControlRequest>,
) -> Result<usize, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = read_request(&mut stream, limits.request_capacity).await?;
    if raw.is_empty() {
        // Fermé par le client sans requête
        stream.shutdown().await?;
        return Ok(0);
    }

    let lifecycle = match slots.allocate(limits.response_capacity) {
        Ok(lifecycle) => lifecycle,
        Err(e) => {
            drop(raw);
            let _ = stream.shutdown().await;
            return Err(e);
        }
    };

    let (reply, filled) = oneshot::channel();
    control
        .send(ControlRequest { raw, lifecycle, reply })
        .await
        .map_err(|_| ConnectionError::StationClosed)?;
    let lifecycle = filled.await.map_err(|_| ConnectionError::StationClosed)?;

    lifecycle.transmit(&mut stream).await
}
