use request_interop_api::{RawValue, Resource};

use crate::http::{params::ParamMap, upload::UploadNode, url::Url};

/// The raw inputs of [`crate::Factory::new_request`]. Anything left unset becomes an empty
/// structure, a `GET` method or an empty URL.
#[derive(Debug, Default)]
pub struct RequestParts {
    pub cookies: Option<RawValue>,
    pub files: Option<RawValue>,
    pub headers: Option<RawValue>,
    pub input: Option<RawValue>,
    pub method: Option<String>,
    pub query: Option<RawValue>,
    pub server: Option<RawValue>,
    pub uploads: Option<ParamMap<UploadNode>>,
    pub url: Option<Url>,
    pub body: Option<Resource>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookies(mut self, cookies: impl Into<RawValue>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    /// Sets a single cookie, keeping the ones already set
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        push_entry(&mut self.cookies, name.into(), RawValue::String(value.into()));
        self
    }

    pub fn files(mut self, files: impl Into<RawValue>) -> Self {
        self.files = Some(files.into());
        self
    }

    pub fn headers(mut self, headers: impl Into<RawValue>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Adds a single header, keeping the ones already set
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        push_entry(&mut self.headers, name.into(), RawValue::String(value.into()));
        self
    }

    pub fn input(mut self, input: impl Into<RawValue>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn query(mut self, query: impl Into<RawValue>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn server(mut self, server: impl Into<RawValue>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Sets a single server variable, keeping the ones already set
    pub fn server_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        push_entry(&mut self.server, name.into(), RawValue::String(value.into()));
        self
    }

    pub fn uploads(mut self, uploads: ParamMap<UploadNode>) -> Self {
        self.uploads = Some(uploads);
        self
    }

    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn body(mut self, body: impl Into<Resource>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Appends to a raw map, or replaces whatever non-map value was there
fn push_entry(slot: &mut Option<RawValue>, key: String, value: RawValue) {
    match slot {
        Some(RawValue::Map(entries)) => entries.push((key, value)),
        _ => *slot = Some(RawValue::Map(vec![(key, value)])),
    }
}
