//! Registration and composition: declared models must land in the right
//! element slots with the right wire identities.

mod common;

use common::*;
use meshnode::stack::{AutoRespond, ModelHandle, ModelId, Opcode};
use meshnode::{
    LevelConfig, MeshError, MeshNode, ModelConfig, ModelKind, NodeConfig, OnOffConfig,
    SensorConfig, SensorSpec, VendorConfig, MAX_MODELS,
};

fn imu_vendor() -> VendorConfig {
    VendorConfig::new(0x0001, 0x0001)
        .with_opcode(Opcode::vendor(0xC0, 0x0001))
        .with_opcode(Opcode::vendor(0xC1, 0x0001))
}

#[tokio::test]
async fn composition_lists_models_in_declaration_order() {
    init_logging();
    let (_node, stack) = node_with(vec![
        ModelConfig::OnOff(OnOffConfig::new(false)),
        ModelConfig::Sensor(SensorConfig::new(vec![SensorSpec::new(0x004F, |_| Ok(2150))])),
        ModelConfig::Vendor(imu_vendor()),
        ModelConfig::Level(LevelConfig::new(0)),
    ])
    .await;

    let (_, composition) = stack.initialized_with().unwrap();
    assert_eq!(composition.elements.len(), 1);
    let element = &composition.elements[0];

    let sig_ids: Vec<ModelId> = element.sig_models.iter().map(|m| m.id).collect();
    assert_eq!(
        sig_ids,
        vec![
            ModelId::CONFIG_SERVER,
            ModelId::GEN_ONOFF_SERVER,
            ModelId::SENSOR_SERVER,
            ModelId::SENSOR_SETUP_SERVER,
            ModelId::GEN_LEVEL_SERVER,
        ]
    );

    assert_eq!(element.vendor_models.len(), 1);
    let vendor = &element.vendor_models[0];
    assert_eq!(vendor.id, ModelId::Vendor { company_id: 0x0001, model_id: 0x0001 });
    assert_eq!(vendor.handle, ModelHandle::vendor(0));
    assert_eq!(
        vendor.opcodes,
        vec![Opcode::vendor(0xC0, 0x0001), Opcode::vendor(0xC1, 0x0001)]
    );
}

#[tokio::test]
async fn sensor_models_defer_responses_to_the_app() {
    let (_node, stack) = node_with(vec![
        ModelConfig::OnOff(OnOffConfig::new(false)),
        ModelConfig::Sensor(SensorConfig::new(vec![SensorSpec::new(0x004D, |_| Ok(4800))])),
    ])
    .await;

    let (_, composition) = stack.initialized_with().unwrap();
    let element = &composition.elements[0];
    // OnOff answers come from the stack; sensor answers come from the
    // last written state, which the app keeps fresh.
    assert_eq!(element.sig_models[1].auto_respond, AutoRespond::ALL);
    assert_eq!(element.sig_models[2].auto_respond, AutoRespond::BY_APP);
    assert_eq!(element.sig_models[3].auto_respond, AutoRespond::BY_APP);
}

#[tokio::test]
async fn composition_carries_default_config_server_settings() {
    let (_node, stack) = node_with(vec![ModelConfig::OnOff(OnOffConfig::new(false))]).await;

    let (_, composition) = stack.initialized_with().unwrap();
    assert_eq!(composition.company_id, 0xFFFF);
    assert_eq!(composition.product_id, 0x0000);
    assert_eq!(composition.version_id, 0x0000);

    let cfg = &composition.config_server;
    assert!(!cfg.relay);
    assert!(cfg.secure_beacon);
    assert!(!cfg.friend);
    assert!(!cfg.gatt_proxy);
    assert_eq!(cfg.default_ttl, 7);
    assert_eq!(cfg.net_transmit.count, 2);
    assert_eq!(cfg.net_transmit.interval_ms, 20);
    assert_eq!(cfg.relay_retransmit.count, 2);
    assert_eq!(cfg.relay_retransmit.interval_ms, 20);
}

#[tokio::test]
async fn device_identity_embeds_prefix_and_address() {
    let stack = RecordingStack::new();
    let config = NodeConfig::new("bench-node")
        .with_uuid_prefix([0xDD, 0xDD])
        .with_model(ModelConfig::OnOff(OnOffConfig::new(false)));
    let node = MeshNode::initialize(stack.clone(), config).await.unwrap();

    let (identity, _) = stack.initialized_with().unwrap();
    assert_eq!(identity.name, "bench-node");
    let bytes = identity.uuid.as_bytes();
    assert_eq!(&bytes[..2], &[0xDD, 0xDD]);
    assert_eq!(&bytes[2..8], &DEVICE_ADDR);
    assert_eq!(&bytes[8..], &[0u8; 8]);
    assert_eq!(node.device_uuid(), identity.uuid);
}

#[tokio::test]
async fn empty_device_name_falls_back_to_default() {
    let stack = RecordingStack::new();
    let config = NodeConfig::new("").with_model(ModelConfig::OnOff(OnOffConfig::new(false)));
    let node = MeshNode::initialize(stack.clone(), config).await.unwrap();
    assert_eq!(node.device_name(), meshnode::DEFAULT_DEVICE_NAME);
}

#[tokio::test]
async fn find_reports_kind_relative_handles() {
    let (node, _stack) = node_with(vec![
        ModelConfig::OnOff(OnOffConfig::new(false)),
        ModelConfig::Level(LevelConfig::new(0)),
        ModelConfig::OnOff(OnOffConfig::new(true)),
    ])
    .await;

    assert_eq!(node.find(ModelKind::OnOff, 0), Some(ModelHandle::sig(1)));
    assert_eq!(node.find(ModelKind::Level, 0), Some(ModelHandle::sig(2)));
    assert_eq!(node.find(ModelKind::OnOff, 1), Some(ModelHandle::sig(3)));
    assert_eq!(node.find(ModelKind::OnOff, 2), None);
    assert_eq!(node.model_count(), 3);
}

#[tokio::test]
async fn ninth_model_is_rejected() {
    let stack = RecordingStack::new();
    let mut config = NodeConfig::new("full-node");
    for _ in 0..=MAX_MODELS {
        config = config.with_model(ModelConfig::OnOff(OnOffConfig::new(false)));
    }
    let err = MeshNode::initialize(stack, config).await.unwrap_err();
    assert!(matches!(err, MeshError::CapacityExceeded { max: MAX_MODELS }));
}

#[tokio::test]
async fn power_level_models_are_rejected() {
    let stack = RecordingStack::new();
    let config = NodeConfig::new("node").with_model(ModelConfig::PowerLevel);
    let err = MeshNode::initialize(stack, config).await.unwrap_err();
    assert!(matches!(err, MeshError::Unsupported(ModelKind::PowerLevel)));
}

#[tokio::test]
async fn vendor_opcodes_must_match_the_company() {
    let stack = RecordingStack::new();
    let config = NodeConfig::new("node").with_model(ModelConfig::Vendor(
        VendorConfig::new(0x0001, 0x0001).with_opcode(Opcode::vendor(0xC0, 0x0002)),
    ));
    let err = MeshNode::initialize(stack, config).await.unwrap_err();
    assert!(matches!(err, MeshError::InvalidConfig(_)));
}
