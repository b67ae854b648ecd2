//! Request Interop API
//! is the transport-facing facade of the request interop project: the raw input shapes a
//! transport adapter hands over, and the capability traits every request value exposes,
//! so that servers, middleware and test harnesses can agree on one view of "the current request".

pub mod ascii;
pub mod body;
pub mod error;
pub mod method;
pub mod raw;
pub mod resource;
pub mod stream;
pub mod upload;

pub use body::Body;
pub use error::{ConstructionError, ConstructionErrorKind, Field, FieldPath, StreamError, UploadError};
pub use method::{InvalidMethod, Method};
pub use raw::RawValue;
pub use resource::Resource;
pub use stream::{Stream, Whence};
pub use upload::{Upload, UploadStatus};
