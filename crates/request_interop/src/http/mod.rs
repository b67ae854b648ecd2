pub mod body;
pub mod header;
pub mod params;
pub mod request;
pub mod stream;
pub mod tree;
pub mod upload;
pub mod url;
