/**
 * ROUTEUR DE REQUÊTES - Plan de contrôle de la station
 *
 * RÔLE :
 * Interprète le tampon brut d'une requête entrante contre une liste ordonnée
 * de matchers. Le premier qui matche gagne et court-circuite les suivants.
 *
 * FONCTIONNEMENT :
 * - Chaque matcher = préfixe littéral + charge numérique (1 ou 2 flottants)
 * - Le préfixe est cherché n'importe où dans le tampon (pas d'ancrage)
 * - Échec préfixe ou nombre => on passe au matcher suivant, jamais d'erreur
 * - Offset / limites => mutation synchrone du ConfigStore avant la réponse
 *
 * COMPATIBILITÉ FIL :
 * Les limites utilisent `press` et `umid` alors que les offsets utilisent
 * `pressao` et `umidade`. L'asymétrie fait partie du protocole existant.
 */

use std::borrow::Cow;

use tracing::{debug, info};

use crate::models::Metric;
use crate::response::{Acknowledgement, ResponseKind, Snapshot};
use crate::state::StationState;

/// Résultat du routage d'une requête
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route {
    OffsetUpdate { metric: Metric, value: f32 },
    LimitsUpdate { metric: Metric, min: f32, max: f32 },
    StateQuery,
    Unmatched,
}

#[derive(Debug, Clone, Copy)]
enum Payload {
    /// `<prefix><f>`
    Offset(Metric),
    /// `<prefix><f>/max/<f>`
    Limits(Metric),
    /// préfixe seul
    StateQuery,
}

/// Règle de routage : préfixe littéral + forme de la charge numérique
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    pub name: &'static str,
    pub prefix: &'static str,
    payload: Payload,
}

impl Matcher {
    const fn new(name: &'static str, prefix: &'static str, payload: Payload) -> Self {
        Self { name, prefix, payload }
    }

    /// Tente le matcher sur la requête ; `None` = on passe au suivant
    pub fn try_match(&self, request: &str) -> Option<Route> {
        let start = request.find(self.prefix)? + self.prefix.len();
        let rest = &request[start..];

        match self.payload {
            Payload::Offset(metric) => {
                let (value, _) = scan_f32(rest)?;
                Some(Route::OffsetUpdate { metric, value })
            }
            Payload::Limits(metric) => {
                let (min, used) = scan_f32(rest)?;
                let rest = rest[used..].strip_prefix(LIMITS_SEPARATOR)?;
                let (max, _) = scan_f32(rest)?;
                Some(Route::LimitsUpdate { metric, min, max })
            }
            Payload::StateQuery => Some(Route::StateQuery),
        }
    }
}

const LIMITS_SEPARATOR: &str = "/max/";

/// Table de routage, dans l'ordre de priorité du protocole
pub const MATCHERS: [Matcher; 7] = [
    Matcher::new("offset_temp", "GET /offset/temp/", Payload::Offset(Metric::Temperature)),
    Matcher::new("offset_pressao", "GET /offset/pressao/", Payload::Offset(Metric::Pressure)),
    Matcher::new("offset_umidade", "GET /offset/umidade/", Payload::Offset(Metric::Humidity)),
    Matcher::new("limites_temp", "GET /limites/temp/min/", Payload::Limits(Metric::Temperature)),
    // Jeton court `press`, distinct de `pressao` côté offsets
    Matcher::new("limites_press", "GET /limites/press/min/", Payload::Limits(Metric::Pressure)),
    // Jeton court `umid`, distinct de `umidade` côté offsets
    Matcher::new("limites_umid", "GET /limites/umid/min/", Payload::Limits(Metric::Humidity)),
    Matcher::new("estado", "GET /estado", Payload::StateQuery),
];

#[derive(Debug, Clone, Copy)]
pub struct RequestRouter {
    matchers: &'static [Matcher],
}

impl Default for RequestRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestRouter {
    pub fn new() -> Self {
        Self { matchers: &MATCHERS }
    }

    pub fn matchers(&self) -> &'static [Matcher] {
        self.matchers
    }

    /// Routage pur, sans effet de bord
    pub fn route(&self, request: &str) -> Route {
        self.matchers
            .iter()
            .find_map(|m| {
                let route = m.try_match(request)?;
                debug!(matcher = m.name, "request matched");
                Some(route)
            })
            .unwrap_or(Route::Unmatched)
    }

    /// Route la requête brute, applique la mutation éventuelle et choisit la réponse
    pub fn handle(&self, raw: &[u8], state: &mut StationState) -> ResponseKind {
        let request: Cow<'_, str> = String::from_utf8_lossy(raw);

        match self.route(&request) {
            Route::OffsetUpdate { metric, value } => {
                state.store.set_offset(metric, value);
                info!(?metric, value, "offset updated");
                ResponseKind::Acknowledgement(Acknowledgement::Offset(metric))
            }
            Route::LimitsUpdate { metric, min, max } => {
                state.store.set_limits(metric, min, max);
                info!(?metric, min, max, "limits updated");
                ResponseKind::Acknowledgement(Acknowledgement::Limits(metric))
            }
            Route::StateQuery => ResponseKind::Snapshot(Snapshot::capture(state)),
            Route::Unmatched => ResponseKind::DefaultPage,
        }
    }
}

/// Lit un flottant décimal en tête de `input`, à la manière d'un `%f` :
/// blancs initiaux ignorés, signe optionnel, chiffres avec fraction optionnelle,
/// exposant optionnel. Retourne la valeur et le nombre d'octets consommés.
/// Les formes `inf`/`nan` et les valeurs non finies sont refusées.
pub fn scan_f32(input: &str) -> Option<(f32, usize)> {
    let bytes = input.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let start = i;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_end = digits_from(i);
    let mut digits = int_end - i;
    i = int_end;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_end = digits_from(i + 1);
        digits += frac_end - (i + 1);
        i = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // Exposant pris seulement s'il est complet ("1e" reste "1")
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }

    let value: f32 = input[start..i].parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value, i))
}
