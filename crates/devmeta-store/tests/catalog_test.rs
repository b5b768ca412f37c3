//! Catalog loading tests

use std::io::Write;

use devmeta_core::{FunctionKind, Interaction, MetadataStore};
use devmeta_store::{MemoryStore, StoreError};

const CATALOG: &str = r#"
meta:
  name: Test catalog
  version: "1.0"

aspects:
  - id: air
    name: Air
    sub_aspects:
      - id: inside_air
        name: Inside Air

functions:
  - id: "urn:infai:ses:measuring-function:temperature"
    name: Get Temperature
  - id: "urn:infai:ses:controlling-function:on"
    name: Set On

device_types:
  - id: thermometer
    name: Thermometer
    device_class_id: thermometer
    services:
      - id: get_temp
        interaction: event_and_request
        outputs:
          - id: c1
            content_variable:
              id: v1
              name: temperature
              type: "https://schema.org/Float"
              function_id: "urn:infai:ses:measuring-function:temperature"
              aspect_id: inside_air

devices:
  - id: device-1
    name: Living room thermometer
    device_type_id: thermometer
"#;

#[tokio::test]
async fn load_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let store = MemoryStore::from_file(file.path()).unwrap();
    assert_eq!(store.meta().name.as_deref(), Some("Test catalog"));
    assert_eq!(store.device_type_count(), 1);
    assert_eq!(store.aspect_roots().len(), 1);
    assert_eq!(store.aspect_node_count(), 0);

    let dt = store.get_device_type("thermometer").await.unwrap().unwrap();
    assert_eq!(dt.services[0].interaction, Interaction::EventAndRequest);

    let function = store
        .get_function("urn:infai:ses:controlling-function:on")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(function.rdf_type, Some(FunctionKind::Controlling));

    let device = store.get_device("device-1").await.unwrap().unwrap();
    assert_eq!(device.device_type_id, "thermometer");
    assert!(store.get_device("device-2").await.unwrap().is_none());
}

#[tokio::test]
async fn load_json_file() {
    let value: serde_json::Value = serde_yaml::from_str(CATALOG).unwrap();
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();

    let store = MemoryStore::from_file(file.path()).unwrap();
    assert_eq!(
        store.measuring_aspect_ids().await.unwrap(),
        vec!["inside_air".to_string()]
    );
}

#[test]
fn unsupported_extension() {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    let err = MemoryStore::from_file(file.path()).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedFormat(ext) if ext == "toml"));
}

#[test]
fn malformed_yaml_is_reported() {
    let err = MemoryStore::from_yaml("device_types: {not: a list}").unwrap_err();
    assert!(matches!(err, StoreError::YamlError(_)));
}
