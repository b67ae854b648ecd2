use crate::{error::StreamError, resource::Resource};

/// A value that may carry raw body content
pub trait Body {
    fn body(&self) -> Option<&Resource>;

    /// The full content as text. No body is a valid state and yields an empty string.
    fn contents(&self) -> Result<String, StreamError> {
        match self.body() {
            None => Ok(String::new()),
            Some(resource) => {
                let bytes = resource.read_all()?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}
