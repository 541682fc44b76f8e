/*!
# Estação DevKit - Mocks et harness de test

Bibliothèque facilitant les tests de la station sans matériel :
- Capteurs scriptables, actionneurs et écran enregistreurs
- Transport à écritures partielles
- Harness qui démarre une station réelle sur un port libre
*/

pub mod mocks;
pub mod test_utils;

pub use mocks::{ActuatorEvent, ChunkedTransport, RecordingActuators, RecordingScreen, ScriptedSensors};
pub use test_utils::{fast_config, HttpReply, TestHarness};
