//! Publishing: wire payloads, addressing, and the publish-address
//! precondition.

mod common;

use common::*;
use meshnode::stack::Opcode;
use meshnode::{
    BatteryConfig, LevelConfig, MeshError, ModelConfig, ModelKind, OnOffConfig, SensorConfig,
    SensorSpec, VendorConfig,
};

#[tokio::test]
async fn publish_without_an_address_keeps_the_value_and_sends_nothing() {
    let (node, stack) = node_with(vec![ModelConfig::OnOff(OnOffConfig::new(false))]).await;
    provision(&node);

    let err = node.set_onoff(0, true, true).await.unwrap_err();
    assert!(matches!(err, MeshError::PublicationNotConfigured));
    assert_eq!(stack.sent_count(), 0);
    // The local set already happened; only the transmission was skipped.
    assert!(node.onoff(0).unwrap());
}

#[tokio::test]
async fn onoff_status_is_one_byte_to_the_publish_address() {
    let (node, stack) = node_with(vec![ModelConfig::OnOff(OnOffConfig::new(false))]).await;
    provision(&node);
    set_publish_addr(&node, ModelKind::OnOff, 0, GROUP);

    node.publish_onoff(0, true).await.unwrap();

    let sent = stack.last_sent().unwrap();
    assert_eq!(sent.opcode, Opcode::GEN_ONOFF_STATUS);
    assert_eq!(sent.payload, vec![0x01]);
    assert_eq!(sent.model, node.find(ModelKind::OnOff, 0).unwrap());
    assert_eq!(sent.ctx.addr, GROUP);
    assert_eq!(sent.ctx.net_idx, 0);
    assert_eq!(sent.ctx.app_idx, 0);
    assert_eq!(sent.ctx.send_ttl, 7);
    assert!(!sent.ctx.send_rel);
    // Publishing a value also makes it the local state.
    assert!(node.onoff(0).unwrap());
}

#[tokio::test]
async fn level_status_is_little_endian() {
    let (node, stack) = node_with(vec![ModelConfig::Level(LevelConfig::new(0))]).await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Level, 0, GROUP);

    node.publish_level(0, -1000).await.unwrap();

    let sent = stack.last_sent().unwrap();
    assert_eq!(sent.opcode, Opcode::GEN_LEVEL_STATUS);
    assert_eq!(sent.payload, (-1000i16).to_le_bytes().to_vec());
    assert_eq!(node.level(0).unwrap(), -1000);
}

#[tokio::test]
async fn battery_status_reads_fresh_and_marks_times_unknown() {
    let (node, stack) = node_with(vec![ModelConfig::Battery(
        BatteryConfig::new().with_reader(|| Ok(87)),
    )])
    .await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Battery, 0, GROUP);

    node.publish_battery(0).await.unwrap();

    let sent = stack.last_sent().unwrap();
    assert_eq!(sent.opcode, Opcode::GEN_BATTERY_STATUS);
    assert_eq!(sent.payload, vec![87, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
    assert_eq!(node.battery(0).unwrap(), 87);
}

#[tokio::test]
async fn battery_status_without_reader_uses_the_set_level() {
    let (node, stack) = node_with(vec![ModelConfig::Battery(BatteryConfig::new())]).await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Battery, 0, GROUP);

    node.set_battery(0, 30).unwrap();
    node.publish_battery(0).await.unwrap();

    assert_eq!(stack.last_sent().unwrap().payload[0], 30);
}

#[tokio::test]
async fn sensor_status_is_marshalled_format_b() {
    let (node, stack) = node_with(vec![ModelConfig::Sensor(SensorConfig::new(vec![
        SensorSpec::new(0x5001, |_| Ok(80)),
    ]))])
    .await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Sensor, 0, GROUP);

    node.publish_sensor(0, 0x5001).await.unwrap();

    let sent = stack.last_sent().unwrap();
    assert_eq!(sent.opcode, Opcode::SENSOR_STATUS);
    assert_eq!(sent.payload, vec![0x09, 0x01, 0x50, 0x50, 0x00, 0x00, 0x00]);
}

#[tokio::test]
async fn sensor_publish_rejects_unknown_properties() {
    let (node, stack) = node_with(vec![ModelConfig::Sensor(SensorConfig::new(vec![
        SensorSpec::new(0x004F, |_| Ok(0)),
    ]))])
    .await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Sensor, 0, GROUP);

    let err = node.publish_sensor(0, 0x9999).await.unwrap_err();
    assert!(matches!(err, MeshError::SensorNotFound { property_id: 0x9999 }));
    assert_eq!(stack.sent_count(), 0);
}

#[tokio::test]
async fn sensor_callback_failure_aborts_the_publish() {
    let (node, stack) = node_with(vec![ModelConfig::Sensor(SensorConfig::new(vec![
        SensorSpec::new(0x004F, |_| Err(MeshError::InvalidState("i2c bus stuck"))),
    ]))])
    .await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Sensor, 0, GROUP);

    let err = node.publish_sensor(0, 0x004F).await.unwrap_err();
    assert!(matches!(err, MeshError::InvalidState(_)));
    assert_eq!(stack.sent_count(), 0);
}

#[tokio::test]
async fn set_with_publish_sends_one_status() {
    let (node, stack) = node_with(vec![ModelConfig::OnOff(OnOffConfig::new(false))]).await;
    provision(&node);
    set_publish_addr(&node, ModelKind::OnOff, 0, GROUP);

    node.set_onoff(0, true, true).await.unwrap();

    assert_eq!(stack.sent_count(), 1);
    assert_eq!(stack.last_sent().unwrap().opcode, Opcode::GEN_ONOFF_STATUS);
}

#[tokio::test]
async fn transport_failure_surfaces_but_state_sticks() {
    let (node, stack) = node_with(vec![ModelConfig::Level(LevelConfig::new(0))]).await;
    provision(&node);
    set_publish_addr(&node, ModelKind::Level, 0, GROUP);
    stack.fail_sends();

    let err = node.set_level(0, 500, true).await.unwrap_err();
    assert!(matches!(err, MeshError::Stack(_)));
    // The local set already happened; only the transmission failed.
    assert_eq!(node.level(0).unwrap(), 500);
}

#[tokio::test]
async fn vendor_send_targets_an_explicit_address() {
    let (node, stack) = node_with(vec![ModelConfig::Vendor(
        VendorConfig::new(0x0001, 0x0001).with_opcode(Opcode::vendor(0xC0, 0x0001)),
    )])
    .await;
    provision(&node);

    let payload = [0x10, 0x27, 0x05, 0xFB, 0x32, 0x01, 0xFF, 0x00];
    node.send_vendor(0, Opcode::vendor(0xC0, 0x0001), &payload, 0x0001).await.unwrap();

    let sent = stack.last_sent().unwrap();
    assert_eq!(sent.opcode.raw(), 0x00C0_0001);
    assert_eq!(sent.payload, payload.to_vec());
    assert_eq!(sent.ctx.addr, 0x0001);
    assert_eq!(sent.model, node.find(ModelKind::Vendor, 0).unwrap());
}

#[tokio::test]
async fn vendor_publish_uses_the_configured_address() {
    let (node, stack) = node_with(vec![ModelConfig::Vendor(
        VendorConfig::new(0x0001, 0x0001).with_opcode(Opcode::vendor(0xC1, 0x0001)),
    )])
    .await;
    provision(&node);

    let err = node.publish_vendor(0, Opcode::vendor(0xC1, 0x0001), &[0x01]).await.unwrap_err();
    assert!(matches!(err, MeshError::PublicationNotConfigured));

    set_publish_addr(&node, ModelKind::Vendor, 0, GROUP);
    node.publish_vendor(0, Opcode::vendor(0xC1, 0x0001), &[0x01]).await.unwrap();

    let sent = stack.last_sent().unwrap();
    assert_eq!(sent.ctx.addr, GROUP);
    assert_eq!(sent.payload, vec![0x01]);
}
