//! Scénarios de bout en bout : une station réelle sur TCP, mocks du devkit.

use estacao_devkit::{fast_config, ActuatorEvent, ChunkedTransport, RecordingActuators, RecordingScreen, ScriptedSensors, TestHarness};
use estacao_kernel::actuators::MatrixPattern;
use estacao_kernel::connection::{serve_connection, ConnectionLimits, ResponseSlots};
use estacao_kernel::models::Indicator;
use estacao_kernel::state::ConfigStore;
use estacao_kernel::Station;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_humidity_offset_triggers_blue_alert() {
    let harness = TestHarness::start().await.unwrap();
    harness.wait_for_ticks(1).await.unwrap();
    assert!(harness.actuators.events().is_empty());

    let reply = harness.get("/offset/umidade/95").await.unwrap();
    assert!(reply.head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.body, "Offset de umidade atualizado");

    harness.wait_for_event(ActuatorEvent::Indicator(Indicator::Blue, true)).await.unwrap();
    harness.wait_for_event(ActuatorEvent::Indicator(Indicator::Blue, false)).await.unwrap();

    let estado = harness.estado().await.unwrap();
    assert_eq!(estado["z"], 150.0);
    assert_eq!(estado["offset_umidade"], 95.0);

    let events = harness.actuators.events();
    assert_eq!(events[0], ActuatorEvent::Buzzer(true));
    assert!(!events.contains(&ActuatorEvent::Indicator(Indicator::Red, true)));

    let state = harness.shutdown().await.unwrap();
    assert_eq!(state.store.offset_humidity, 95.0);
}

#[tokio::test]
async fn test_inverted_limits_are_stored_and_alert() {
    let harness = TestHarness::start().await.unwrap();

    let reply = harness.get("/limites/temp/min/30/max/10").await.unwrap();
    assert_eq!(reply.body, "Limites de temperatura atualizados");

    let estado = harness.estado().await.unwrap();
    assert_eq!(estado["min_temp"], 30.0);
    assert_eq!(estado["max_temp"], 10.0);

    // 25 °C est hors de [30, 10] quelle que soit la valeur
    harness.wait_for_event(ActuatorEvent::Indicator(Indicator::Red, true)).await.unwrap();
    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_asymmetric_path_tokens() {
    let harness = TestHarness::start().await.unwrap();

    assert_eq!(
        harness.get("/limites/press/min/950/max/1050").await.unwrap().body,
        "Limites de pressão atualizados"
    );
    assert_eq!(
        harness.get("/offset/pressao/1.5").await.unwrap().body,
        "Offset de pressão atualizado"
    );
    // les tokens croisés ne matchent pas : page par défaut
    let crossed = harness.get("/limites/pressao/min/1/max/2").await.unwrap();
    assert_eq!(crossed.header("Content-Type"), Some("text/html"));
    let crossed = harness.get("/offset/umid/3").await.unwrap();
    assert_eq!(crossed.header("Content-Type"), Some("text/html"));

    let state = harness.shutdown().await.unwrap();
    assert_eq!(state.store.min_pressure, 950.0);
    assert_eq!(state.store.max_pressure, 1050.0);
    assert_eq!(state.store.offset_pressure, 1.5);
    assert_eq!(state.store.offset_humidity, 0.0);
    assert_eq!((state.store.min_humidity, state.store.max_humidity), (0.0, 100.0));
}

#[tokio::test]
async fn test_multi_alert_shows_pattern_without_indicator() {
    let harness = TestHarness::start().await.unwrap();
    harness.wait_for_ticks(1).await.unwrap();

    harness.sensors.update(|s| {
        s.primary_temp_c = 80.0;
        s.secondary_temp_c = Some(80.0);
        s.pressure_pa = 50_000.0;
    });

    harness.wait_for_event(ActuatorEvent::Pattern(MatrixPattern::MultiAlert)).await.unwrap();
    harness.wait_for_event(ActuatorEvent::Pattern(MatrixPattern::Blank)).await.unwrap();

    let events = harness.actuators.events();
    assert_eq!(events[0], ActuatorEvent::Buzzer(true));
    assert_eq!(events[1], ActuatorEvent::Buzzer(false));
    assert_eq!(events[2], ActuatorEvent::Pattern(MatrixPattern::MultiAlert));
    assert!(!events.iter().any(|e| matches!(e, ActuatorEvent::Indicator(..))));

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_estado_is_idempotent() {
    let harness = TestHarness::start().await.unwrap();
    harness.wait_for_ticks(2).await.unwrap();

    let first = harness.get("/estado").await.unwrap();
    let second = harness.get("/estado").await.unwrap();
    assert_eq!(first.body, second.body);
    assert_eq!(first.header("Content-Type"), Some("application/json"));
    assert_eq!(
        first.header("Content-Length"),
        Some(first.body.len().to_string().as_str())
    );

    let json = first.json().unwrap();
    assert_eq!(json.as_object().unwrap().len(), 12);
    assert_eq!(json["y"], 1013.25);

    let state = harness.shutdown().await.unwrap();
    assert_eq!(state.store, ConfigStore::default());
}

#[tokio::test]
async fn test_unparseable_requests_get_default_page() {
    let harness = TestHarness::start().await.unwrap();

    for path in ["/offset/temp/abc", "/limites/temp/min/1/max/", "/nada", "/offset/temp/inf"] {
        let reply = harness.get(path).await.unwrap();
        assert_eq!(reply.header("Content-Type"), Some("text/html"), "{path}");
        assert!(reply.body.contains("<html"), "{path}");
    }

    let raw = harness.send_raw(b"GET /\xff\xfe HTTP/1.1\r\n\r\n").await.unwrap();
    assert!(raw.starts_with(b"HTTP/1.1 200 OK\r\n"));

    let state = harness.shutdown().await.unwrap();
    assert_eq!(state.store, ConfigStore::default());
}

#[tokio::test]
async fn test_failed_humidity_sensor_reads_zero() {
    let harness = TestHarness::start().await.unwrap();
    harness.sensors.update(|s| s.humidity_pct = None);
    harness.wait_for_ticks(2).await.unwrap();

    let estado = harness.estado().await.unwrap();
    assert_eq!(estado["z"], 0.0);
    // 0 n'est pas strictement sous la borne 0
    assert!(harness.actuators.events().is_empty());

    let panel = harness.screen.last().unwrap();
    assert!(panel.lines[3].ends_with("--"), "{:?}", panel.lines);

    // l'offset ne s'applique pas à un capteur en échec
    let reply = harness.get("/offset/umidade/-5").await.unwrap();
    assert_eq!(reply.body, "Offset de umidade atualizado");
    harness.wait_for_ticks(2).await.unwrap();

    let estado = harness.estado().await.unwrap();
    assert_eq!(estado["offset_umidade"], -5.0);
    assert_eq!(estado["z"], 0.0);
    assert!(harness.actuators.events().is_empty());

    let state = harness.shutdown().await.unwrap();
    assert_eq!(state.readings.humidity, 0.0);
}

#[tokio::test]
async fn test_no_response_slot_closes_without_reply() {
    let mut cfg = fast_config();
    cfg.http.connection_slots = 0;
    let harness = TestHarness::start_with(cfg, ScriptedSensors::nominal()).await.unwrap();

    let raw = harness.send_raw(b"GET /offset/temp/7 HTTP/1.1\r\n\r\n").await.unwrap();
    assert!(raw.is_empty());

    // requête jetée : le store n'a pas bougé
    let state = harness.shutdown().await.unwrap();
    assert_eq!(state.store.offset_temp, 0.0);
}

#[tokio::test]
async fn test_small_response_buffer_truncates() {
    let mut cfg = fast_config();
    cfg.http.response_capacity = 64;
    let harness = TestHarness::start_with(cfg, ScriptedSensors::nominal()).await.unwrap();

    let raw = harness.send_raw(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    assert_eq!(raw.len(), 64);
    assert!(raw.starts_with(b"HTTP/1.1 200 OK\r\n"));
    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_partial_writes_send_whole_response() {
    let mut station = Station::new(
        fast_config(),
        ScriptedSensors::nominal(),
        RecordingActuators::new(),
        RecordingScreen::default(),
    );
    let slots = ResponseSlots::new(1);
    let limits = ConnectionLimits {
        request_capacity: 2048,
        response_capacity: 12_000,
    };
    let (control, mut requests) = mpsc::channel(1);
    let mut transport = ChunkedTransport::new("GET /offset/temp/1.25 HTTP/1.1\r\n\r\n", 7);

    let (sent, ()) = tokio::join!(
        serve_connection(&mut transport, slots.clone(), limits, control),
        async {
            let request = requests.recv().await.unwrap();
            station.handle_request(request);
        }
    );

    let sent = sent.unwrap();
    assert_eq!(sent, transport.written.len());
    assert_eq!(transport.writes, sent.div_ceil(7));
    assert!(transport.shut_down);
    assert!(transport.written.ends_with("Offset de temperatura atualizado".as_bytes()));
    assert_eq!(station.state().store.offset_temp, 1.25);
    assert_eq!(slots.available(), 1);
}
