//! Integration tests for association and session supervision.

use sunstrip::config::{MqttConfig, WifiConfig};
use sunstrip::connectivity::{
    AssociationStatus, ConnectivitySupervisor, SessionError, SessionStatus, AP_PASSWORD, AP_SSID,
    ASSOCIATION_TIMEOUT_MS,
};
use sunstrip::hal::{MockClock, MockMqtt, MockWifi};
use sunstrip::traits::Clock;
use sunstrip::DeviceConfig;

fn config(ssid: &str, host: &str) -> DeviceConfig {
    DeviceConfig::default()
        .with_wifi(WifiConfig::default().with_ssid(ssid).with_password("secret"))
        .with_mqtt(MqttConfig::default().with_host(host).with_client_id("test-node"))
}

// ============================================================================
// Association
// ============================================================================

#[test]
fn no_ssid_goes_straight_to_fallback() {
    let mut clock = MockClock::new();
    let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("", "broker"));

    let state = sup.ensure(&mut clock);

    assert_eq!(state.association, AssociationStatus::FallbackAP);
    assert_eq!(sup.wifi().station_attempts, 0);
    assert_eq!(
        sup.wifi().access_point,
        Some((AP_SSID.to_string(), AP_PASSWORD.to_string()))
    );
    assert_eq!(clock.now_ms(), 0);
}

#[test]
fn unreachable_network_times_out_into_fallback() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::unreachable(), MockMqtt::new(), &config("garden", ""));

    let state = sup.ensure(&mut clock);

    assert_eq!(state.association, AssociationStatus::FallbackAP);
    assert_eq!(sup.wifi().station_attempts, 1);
    assert!(clock.now_ms() >= ASSOCIATION_TIMEOUT_MS);
    assert!(clock.now_ms() < ASSOCIATION_TIMEOUT_MS + 1_000);
}

#[test]
fn fallback_promoted_when_station_associates() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::unreachable(), MockMqtt::new(), &config("garden", ""));
    sup.ensure(&mut clock);
    let waited = clock.now_ms();

    // next ticks do not block again
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::FallbackAP);
    assert_eq!(clock.now_ms(), waited);

    sup.wifi_mut().associated = true;
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::Connected);
}

#[test]
fn access_point_restarted_after_later_link_loss() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::unreachable(), MockMqtt::new(), &config("garden", ""));
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::FallbackAP);

    sup.wifi_mut().associated = true;
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::Connected);

    // re-association reconfigures the radio and stops the access point
    sup.wifi_mut().drop_link();
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::FallbackAP);
    assert_eq!(
        sup.wifi().access_point,
        Some((AP_SSID.to_string(), AP_PASSWORD.to_string()))
    );
    assert_eq!(sup.wifi().ap_starts, 2);

    for _ in 0..5 {
        sup.ensure(&mut clock);
    }
    assert_eq!(sup.wifi().ap_starts, 2);
    assert!(sup.wifi().access_point.is_some());
}

#[test]
fn link_loss_reassociates() {
    let mut clock = MockClock::new();
    let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("garden", ""));
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::Connected);

    sup.wifi_mut().drop_link();
    assert_eq!(sup.ensure(&mut clock).association, AssociationStatus::Connected);
    assert_eq!(sup.wifi().station_attempts, 2);
}

#[test]
fn connected_state_is_stable() {
    let mut clock = MockClock::new();
    let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("garden", ""));
    for _ in 0..5 {
        sup.ensure(&mut clock);
    }
    assert_eq!(sup.wifi().station_attempts, 1);
    assert!(sup.wifi().access_point.is_none());
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn session_subscribes_and_announces() {
    let mut clock = MockClock::new();
    let cfg = config("garden", "broker");
    let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &cfg);

    let state = sup.ensure(&mut clock);

    assert_eq!(state.session, SessionStatus::Connected);
    assert!(sup.mqtt().is_subscribed("esp/sensors/light/ws2812/set"));
    assert_eq!(sup.command_topic(), "esp/sensors/light/ws2812/set");

    let status = sup.mqtt().published_to("esp/sensors/status");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].1, b"online".to_vec());
    assert!(status[0].2, "presence must be retained");
    assert_eq!(sup.mqtt().connect_attempts, vec!["test-node".to_string()]);
}

#[test]
fn session_runs_in_fallback_mode() {
    let mut clock = MockClock::new();
    let mut sup = ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("", "broker"));
    let state = sup.ensure(&mut clock);
    assert_eq!(state.association, AssociationStatus::FallbackAP);
    assert_eq!(state.session, SessionStatus::Connected);
}

#[test]
fn refused_connect_retried_every_tick() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::refusing(), &config("garden", "broker"));

    for _ in 0..3 {
        assert_eq!(sup.ensure(&mut clock).session, SessionStatus::Disconnected);
    }
    assert_eq!(sup.mqtt().connect_attempts.len(), 3);

    sup.mqtt_mut().accept_connect = true;
    assert_eq!(sup.ensure(&mut clock).session, SessionStatus::Connected);
}

#[test]
fn lost_session_resubscribes() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("garden", "broker"));
    sup.ensure(&mut clock);

    sup.mqtt_mut().connected = false;
    sup.mqtt_mut().subscriptions.clear();
    assert_eq!(sup.ensure(&mut clock).session, SessionStatus::Connected);
    assert!(sup.mqtt().is_subscribed("esp/sensors/light/ws2812/set"));
    assert_eq!(sup.mqtt().published_to("esp/sensors/status").len(), 2);
}

#[test]
fn publish_requires_session() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::refusing(), &config("garden", "broker"));
    sup.ensure(&mut clock);

    assert_eq!(
        sup.publish("esp/sensors/sunlight/1/uv", b"0.12", true),
        Err(SessionError::NotConnected)
    );
    assert!(sup.mqtt().published.is_empty());
}

#[test]
fn messages_pass_through() {
    let mut clock = MockClock::new();
    let mut sup =
        ConnectivitySupervisor::new(MockWifi::new(), MockMqtt::new(), &config("garden", "broker"));
    sup.ensure(&mut clock);

    sup.mqtt_mut().queue_message("esp/sensors/light/ws2812/set", b"rainbow".to_vec());
    let msg = sup.try_recv().unwrap();
    assert_eq!(msg.payload, b"rainbow".to_vec());
    assert!(sup.try_recv().is_none());
}
