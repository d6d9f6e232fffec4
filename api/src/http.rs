pub const LINE_DELIMITER: &str = "\r\n";

pub mod reader;
mod response;
pub mod writer;

pub type Request = http::Request<Option<String>>;
pub use response::{IntoResponse, Json, Response};
