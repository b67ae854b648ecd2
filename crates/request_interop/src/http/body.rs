use request_interop_api::{Body, Resource, StreamError};

use crate::http::stream::ResourceStream;

/// Raw body content with no cursor of its own; it is consumed whole
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBody {
    resource: Option<Resource>,
}

impl RequestBody {
    pub(crate) fn new(resource: Option<Resource>) -> Self {
        Self { resource }
    }

    pub fn is_present(&self) -> bool {
        self.resource.is_some()
    }

    /// Opens an independent cursor over the content
    pub fn stream(&self) -> Result<Option<ResourceStream>, StreamError> {
        self.resource.as_ref().map(ResourceStream::open).transpose()
    }
}

impl Body for RequestBody {
    fn body(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }
}
