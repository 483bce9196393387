//! Routing of decoded inbound messages onto the console state.
//!
//! Each message kind has exactly one handler. Handlers are synchronous and
//! run to completion, so a caller that applies messages one at a time gets
//! arrival-order processing for free.

use tracing::{debug, trace};

use dmxnode_api::{
    ApStatusPayload, ConfigPayload, InboundMessage, PixelTestPayload, StatusPayload,
};

use crate::format::{format_bytes, format_rssi, format_uptime};
use crate::state::{ApRunState, ConsoleState, PixelTestIndicator};

/// Stateless router from [`InboundMessage`] to its handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageDispatcher;

impl MessageDispatcher {
    pub fn dispatch(self, state: &mut ConsoleState, message: &InboundMessage) {
        match message {
            InboundMessage::Status(status) => apply_status(state, status),
            InboundMessage::Config(config) => apply_config(state, config),
            InboundMessage::ApStatus(ap) => apply_ap_status(state, ap),
            InboundMessage::PixelTest(result) => apply_pixel_test(state, *result),
            InboundMessage::Unknown { kind } => {
                debug!(kind = %kind, "ignoring unknown message type");
            }
        }
    }
}

/// Partial merge: absent fields keep their previous readout.
fn apply_status(state: &mut ConsoleState, status: &StatusPayload) {
    if let Some(uptime) = status.uptime {
        state.status.uptime = Some(format_uptime(uptime));
    }
    if let Some(rssi) = status.rssi {
        state.status.signal = Some(format_rssi(rssi));
    }
    if let Some(free_heap) = status.free_heap {
        state.status.memory = Some(format_bytes(free_heap));
    }

    // Only the flag is forwarded; AP statistics come from ap_status alone.
    if let Some(ap_enabled) = status.ap_enabled {
        apply_ap_status(
            state,
            &ApStatusPayload {
                ap_enabled,
                ..ApStatusPayload::default()
            },
        );
    }
}

fn apply_config(state: &mut ConsoleState, config: &ConfigPayload) {
    let written = state.fields.apply_config(config.iter());
    trace!(keys = config.len(), written, "config snapshot applied");

    state.derive_static_ip_visibility();
    state.config_received = true;
}

fn apply_ap_status(state: &mut ConsoleState, ap: &ApStatusPayload) {
    state.ap.panel_visible = ap.ap_enabled;

    if ap.ap_enabled {
        state.ap.run_state = Some(ApRunState::Running);
        state.ap.ip = Some(ap.ap_ip.clone().unwrap_or_else(|| "-".into()));
        state.ap.stations = Some(ap.ap_stations.unwrap_or(0));
    } else {
        state.ap.run_state = Some(ApRunState::Stopped);
    }
}

fn apply_pixel_test(state: &mut ConsoleState, result: PixelTestPayload) {
    state.pixel_test = if result.success {
        PixelTestIndicator::Running
    } else {
        PixelTestIndicator::Failed
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::FieldValue;
    use pretty_assertions::assert_eq;

    fn dispatch_raw(state: &mut ConsoleState, raw: &str) {
        let message = InboundMessage::decode(raw).unwrap();
        MessageDispatcher.dispatch(state, &message);
    }

    #[test]
    fn status_formats_all_readouts() {
        let mut state = ConsoleState::new();
        dispatch_raw(
            &mut state,
            r#"{"type":"status","uptime":90061,"rssi":-61,"freeHeap":1048576}"#,
        );
        assert_eq!(state.status.uptime.as_deref(), Some("1天 1小时 1分 1秒"));
        assert_eq!(state.status.signal.as_deref(), Some("-61 dBm"));
        assert_eq!(state.status.memory.as_deref(), Some("1.00 MB"));
    }

    #[test]
    fn status_merges_partially() {
        let mut state = ConsoleState::new();
        dispatch_raw(&mut state, r#"{"type":"status","uptime":60,"rssi":-50,"freeHeap":0}"#);
        dispatch_raw(&mut state, r#"{"type":"status","rssi":-72}"#);

        assert_eq!(state.status.uptime.as_deref(), Some("0天 0小时 1分 0秒"));
        assert_eq!(state.status.signal.as_deref(), Some("-72 dBm"));
        assert_eq!(state.status.memory.as_deref(), Some("0 B"));
    }

    #[test]
    fn status_forwards_only_ap_flag() {
        let mut state = ConsoleState::new();
        dispatch_raw(
            &mut state,
            r#"{"type":"ap_status","ap_enabled":true,"ap_ip":"192.168.4.1","ap_stations":3}"#,
        );
        dispatch_raw(&mut state, r#"{"type":"status","ap_enabled":true}"#);

        // Statistics are reset to their defaults by the forwarded flag.
        assert!(state.ap.panel_visible);
        assert_eq!(state.ap.ip.as_deref(), Some("-"));
        assert_eq!(state.ap.stations, Some(0));
    }

    #[test]
    fn config_writes_fields_and_derives_visibility() {
        let mut state = ConsoleState::new();
        dispatch_raw(
            &mut state,
            r#"{"type":"config","dhcpEnabled":true,"artnetUniverse":"7","unknownKey":1}"#,
        );

        assert!(state.config_received);
        assert!(!state.static_ip_visible);
        assert_eq!(
            state.fields.get("artnetUniverse").unwrap().value,
            FieldValue::Number(Some(7))
        );
    }

    #[test]
    fn partial_config_leaves_other_fields_alone() {
        let mut state = ConsoleState::new();
        dispatch_raw(
            &mut state,
            r#"{"type":"config","deviceName":"truss-left","dhcpEnabled":false,
                "artnetUniverse":3,"pixelEnabled":true,"apSsid":"dmx-node"}"#,
        );
        let before = state.fields.clone();

        dispatch_raw(&mut state, r#"{"type":"config","artnetUniverse":9}"#);

        assert_eq!(
            state.fields.get("artnetUniverse").unwrap().value,
            FieldValue::Number(Some(9))
        );
        for binding in before.iter().filter(|b| b.key != "artnetUniverse") {
            assert_eq!(
                state.fields.get(binding.key).unwrap().value,
                binding.value,
                "{} changed",
                binding.key
            );
        }
        assert_eq!(
            state.fields.get("deviceName").unwrap().value,
            FieldValue::Text("truss-left".into())
        );
    }

    #[test]
    fn config_rederives_visibility_even_without_dhcp_key() {
        let mut state = ConsoleState::new();
        dispatch_raw(&mut state, r#"{"type":"config","dhcpEnabled":true}"#);
        state.static_ip_visible = true;

        dispatch_raw(&mut state, r#"{"type":"config","deviceName":"node-2"}"#);
        assert!(!state.static_ip_visible);
    }

    #[test]
    fn ap_status_disabled_keeps_statistics() {
        let mut state = ConsoleState::new();
        dispatch_raw(
            &mut state,
            r#"{"type":"ap_status","ap_enabled":true,"ap_ip":"192.168.4.1","ap_stations":2}"#,
        );
        dispatch_raw(&mut state, r#"{"type":"ap_status","ap_enabled":false}"#);

        assert!(!state.ap.panel_visible);
        assert_eq!(state.ap.run_state, Some(ApRunState::Stopped));
        assert_eq!(state.ap.ip.as_deref(), Some("192.168.4.1"));
        assert_eq!(state.ap.stations, Some(2));
    }

    #[test]
    fn ap_status_enabled_defaults() {
        let mut state = ConsoleState::new();
        dispatch_raw(&mut state, r#"{"type":"ap_status","ap_enabled":true}"#);
        assert_eq!(state.ap.run_state, Some(ApRunState::Running));
        assert_eq!(state.ap.ip.as_deref(), Some("-"));
        assert_eq!(state.ap.stations, Some(0));
    }

    #[test]
    fn pixel_test_indicator() {
        let mut state = ConsoleState::new();
        dispatch_raw(&mut state, r#"{"type":"pixel_test","success":true}"#);
        assert_eq!(state.pixel_test, PixelTestIndicator::Running);
        dispatch_raw(&mut state, r#"{"type":"pixel_test","success":false}"#);
        assert_eq!(state.pixel_test, PixelTestIndicator::Failed);
    }

    #[test]
    fn unknown_message_changes_nothing() {
        let mut state = ConsoleState::new();
        let before = state.clone();
        dispatch_raw(&mut state, r#"{"type":"firmware_progress","percent":40}"#);
        assert_eq!(state, before);
    }
}
