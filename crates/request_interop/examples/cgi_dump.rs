//! Builds a request from a CGI environment and prints it as JSON.
//!
//! REQUEST_METHOD=post HTTP_HOST=example.com QUERY_STRING='a[]=1&a[]=2' \
//!     cargo run --example cgi_dump < body.txt

use std::{
    env,
    error::Error,
    io::{self, Read},
};

use request_interop::{Body, Factory, RawValue, RequestParts, Resource, UrlParts};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let factory = Factory::new();
    let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

    let mut headers = Vec::new();
    let mut server = Vec::new();
    for (name, value) in env::vars() {
        if let Some(header) = name.strip_prefix("HTTP_") {
            headers.push((header.replace('_', "-"), RawValue::from(value.clone())));
        }
        server.push((name, RawValue::from(value)));
    }

    let mut url = UrlParts::new().scheme(if var("HTTPS").is_some() { "https" } else { "http" });
    url.host = var("SERVER_NAME").or_else(|| var("HTTP_HOST"));
    url.path = var("SCRIPT_NAME");
    url.query = var("QUERY_STRING");
    if let Some(port) = var("SERVER_PORT") {
        url = url.port(port.parse()?);
    }

    let cookies: Vec<(String, RawValue)> = var("HTTP_COOKIE")
        .iter()
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), RawValue::from(value)))
        .collect();

    let mut body = Vec::new();
    io::stdin().read_to_end(&mut body)?;

    let query = factory.parse_query(url.query.as_deref().unwrap_or_default());
    let mut parts = RequestParts::new()
        .url(factory.new_url(url)?)
        .headers(RawValue::Map(headers))
        .cookies(RawValue::Map(cookies))
        .server(RawValue::Map(server))
        .query(query)
        .body(Resource::from(body));
    parts.method = var("REQUEST_METHOD");
    let req = factory.new_request(parts)?;

    let dump = serde_json::json!({
        "method": req.method(),
        "url": req.url().to_string(),
        "headers": req.headers(),
        "cookies": req.cookies(),
        "query": req.query(),
        "body": req.contents()?,
    });
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
