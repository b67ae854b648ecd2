mod parts;
pub use parts::RequestParts;

use request_interop_api::{Body, Method, Resource};

use crate::http::{
    body::RequestBody,
    header::HeaderMap,
    params::ParamMap,
    tree::{FileEntry, InputValue, QueryValue},
    upload::UploadNode,
    url::Url,
};

/// An immutable snapshot of one incoming request.
///
/// Every map and tree is present, and empty when the transport supplied nothing for it.
/// Built through [`crate::Factory::new_request`].
#[derive(Debug, Default)]
pub struct Request {
    pub(crate) cookies: ParamMap<String>,
    pub(crate) files: ParamMap<FileEntry>,
    pub(crate) headers: HeaderMap,
    pub(crate) input: ParamMap<InputValue>,
    pub(crate) method: Method,
    pub(crate) query: ParamMap<QueryValue>,
    pub(crate) server: ParamMap<String>,
    pub(crate) uploads: ParamMap<UploadNode>,
    pub(crate) url: Url,
    pub(crate) body: RequestBody,
}

impl Request {
    pub fn cookies(&self) -> &ParamMap<String> {
        &self.cookies
    }

    pub fn files(&self) -> &ParamMap<FileEntry> {
        &self.files
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn input(&self) -> &ParamMap<InputValue> {
        &self.input
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn query(&self) -> &ParamMap<QueryValue> {
        &self.query
    }

    pub fn server(&self) -> &ParamMap<String> {
        &self.server
    }

    pub fn uploads(&self) -> &ParamMap<UploadNode> {
        &self.uploads
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn request_body(&self) -> &RequestBody {
        &self.body
    }

    /// A header value by name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn server_var(&self, name: &str) -> Option<&str> {
        self.server.get(name).map(String::as_str)
    }
}

impl Body for Request {
    fn body(&self) -> Option<&Resource> {
        self.body.body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let req = Request::default();
        assert_eq!(req.method(), Method::GET);
        assert!(req.cookies().is_empty());
        assert!(req.files().is_empty());
        assert!(req.headers().is_empty());
        assert!(req.input().is_empty());
        assert!(req.query().is_empty());
        assert!(req.server().is_empty());
        assert!(req.uploads().is_empty());
        assert!(req.url().is_empty());
        assert_eq!(req.contents().unwrap(), "");
    }
}
