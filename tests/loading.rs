use std::path::PathBuf;

use confnode::{ConfigError, ConfigNode};
use serde_json::{json, Map, Value};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn expected_tree() -> Value {
    json!({
        "foo": "bar",
        "arr": [1, 2, 3],
        "server": {"host": "localhost", "port": 8080},
        "cats": [{"name": "tom"}, {"name": "jerry"}]
    })
}

fn enabled_formats() -> Vec<(&'static str, &'static str)> {
    let mut formats = vec![("json", "app.json")];
    if cfg!(feature = "toml") {
        formats.push(("toml", "app.toml"));
    }
    if cfg!(feature = "yaml") {
        formats.push(("yaml", "app.yaml"));
    }
    formats
}

#[test]
fn test_load_file_with_construction_format() {
    for (format, file) in enabled_formats() {
        let mut node = ConfigNode::builder().format(format).build().unwrap();
        node.load_from_file(fixture(file), None).unwrap();

        assert_eq!(node.get("foo"), "bar", "format {format}");
        assert_eq!(node.get("cats").at(1).get("name"), "jerry", "format {format}");
        assert_eq!(Value::Object(node.as_map().clone()), expected_tree(), "format {format}");
    }
}

#[test]
fn test_load_file_with_load_format() {
    for (format, file) in enabled_formats() {
        let mut node = ConfigNode::new();
        node.load_from_file(fixture(file), Some(format)).unwrap();
        assert_eq!(node.get("server").get("port"), 8080, "format {format}");
    }
}

#[test]
fn test_load_file_keeps_previous_keys() {
    for (format, file) in enabled_formats() {
        let mut node = ConfigNode::from_map(map(json!({"previous_key": "val", "foo": 0})));
        node.load_from_file(fixture(file), Some(format)).unwrap();

        assert_eq!(node.get("previous_key"), "val", "format {format}");
        assert_eq!(node.get("foo"), "bar", "format {format}");
    }
}

#[test]
fn test_round_trip_json() {
    let tree = expected_tree();
    let mut node = ConfigNode::new();
    node.load_from_string(&serde_json::to_string_pretty(&tree).unwrap(), Some("json"))
        .unwrap();
    assert_eq!(Value::Object(node.as_map().clone()), tree);
}

#[cfg(feature = "toml")]
#[test]
fn test_round_trip_toml() {
    let tree = expected_tree();
    let mut node = ConfigNode::new();
    node.load_from_string(&toml::to_string(&tree).unwrap(), Some("toml"))
        .unwrap();
    assert_eq!(Value::Object(node.as_map().clone()), tree);
}

#[cfg(feature = "yaml")]
#[test]
fn test_round_trip_yaml() {
    let tree = expected_tree();
    let mut node = ConfigNode::new();
    node.load_from_string(&serde_yaml::to_string(&tree).unwrap(), Some("yaml"))
        .unwrap();
    assert_eq!(Value::Object(node.as_map().clone()), tree);
}

#[test]
fn test_absent_chains_are_always_empty() {
    let mut node = ConfigNode::new();
    node.load_from_file(fixture("app.json"), None).unwrap();

    let paths: &[&[&str]] = &[
        &["missing"],
        &["some", "value", "does", "nt", "exists"],
        &["server", "tls", "cert"],
        &["foo", "bar"],
    ];
    for path in paths {
        let item = path
            .iter()
            .skip(1)
            .fold(node.get(path[0]), |item, key| item.get(key));
        assert!(item.is_missing(), "{path:?}");
        assert_eq!(item, Value::Null, "{path:?}");
        assert_eq!(item.to_string(), "None");
    }
}

#[test]
fn test_get_and_get_path_agree() {
    let mut node = ConfigNode::new();
    node.load_from_file(fixture("app.json"), None).unwrap();

    for key in ["foo", "arr", "server", "cats", "nope"] {
        assert_eq!(node.get(key), node.get_path(key), "{key}");
    }
    assert_eq!(node.get_path("cats.0.name"), node.get("cats").at(0).get("name"));
}

#[cfg(feature = "validation")]
#[test]
fn test_failed_validation_leaves_data_untouched() {
    let schema = map(json!({
        "foo": {"type": "integer"},
        "some_field": {"type": "string"}
    }));
    let mut node = ConfigNode::builder()
        .schema(schema)
        .data(map(json!({"foo": 1})))
        .build()
        .unwrap();
    let before = node.as_map().clone();

    let err = node.load_from_file(fixture("app.json"), None).unwrap_err();
    let validation = match err {
        ConfigError::Validation(validation) => validation,
        other => panic!("expected a validation error, got {other}"),
    };

    let message = validation.message();
    assert!(message.contains("foo: must be of integer type\n"));
    assert!(message.contains("arr: unknown field\n"));
    assert!(message.contains("server: unknown field\n"));
    assert_eq!(*node.as_map(), before);

    node.update(map(json!({"foo": "not an integer"})));
    assert_eq!(node.get("foo"), "not an integer");
}

#[test]
fn test_unsupported_format_on_load() {
    let mut node = ConfigNode::new();
    let err = node
        .load_from_file(fixture("app.json"), Some("ini"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}
