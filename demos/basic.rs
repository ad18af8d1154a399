use confnode::{ConfigError, ConfigNode};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Server {
    host: String,
    port: u16,
}

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = ConfigNode::new();
    config.load_from_file("tests/fixtures/app.json", None)?;

    println!("foo = {}", config.get("foo"));
    println!("first cat = {}", config.get("cats").at(0).get("name"));
    println!(
        "tls configured = {}",
        config.get("server").get("tls").get("cert").is_present()
    );

    let server: Server = config
        .get("server")
        .into_node()
        .unwrap_or_default()
        .deserialize()?;
    println!("listening on {}:{}", server.host, server.port);

    let schema = json!({
        "foo": {"type": "integer"},
        "some_field": {"type": "string"}
    });
    let mut strict = ConfigNode::builder()
        .schema(schema.as_object().cloned().unwrap_or_default())
        .build()?;

    match strict.load_from_file("tests/fixtures/app.json", None) {
        Err(ConfigError::Validation(err)) => print!("{}", err.message()),
        other => other?,
    }

    Ok(())
}
