//! Request Interop
//! is a runtime agnostic model of an incoming HTTP request. Transport adapters hand raw,
//! loosely typed data to a [`Factory`], which validates it once and produces immutable
//! [`Url`], [`FileUpload`], [`RequestBody`] and [`Request`] values for application code.

pub mod factory;
pub mod http;

pub use factory::{Factory, FactoryConfig};
pub use http::{
    body::RequestBody,
    header::{HeaderMap, HeaderName},
    params::ParamMap,
    request::{Request, RequestParts},
    stream::ResourceStream,
    tree::{FileEntry, FileField, FileGroup, FileItem, InputValue, QueryValue, parse_query},
    upload::{FileUpload, UploadNode, UploadParts},
    url::{Scheme, Url, UrlHost, UrlParts},
};
pub use request_interop_api as api;
pub use request_interop_api::{
    Body, ConstructionError, ConstructionErrorKind, Field, Method, RawValue, Resource,
    Stream, StreamError, Upload, UploadError, UploadStatus, Whence,
};

static_assertions::assert_impl_all!(Url: Send, Sync, Clone);
static_assertions::assert_impl_all!(Request: Send, Sync);
static_assertions::assert_impl_all!(FileUpload: Send, Sync);
static_assertions::assert_not_impl_any!(FileUpload: Clone);
static_assertions::assert_not_impl_any!(ResourceStream: Clone);
