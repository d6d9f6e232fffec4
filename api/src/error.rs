use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed before a request was sent")]
    ConnectionClosed,
    #[error("invalid request format")]
    InvalidFormat,
    #[error("invalid method: {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),
    #[error("invalid uri: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),
    #[error("unsupported http version")]
    UnsupportedVersion,
    #[error("invalid content-length header")]
    InvalidContentLength,
    #[error("body of {declared} bytes exceeds the {max} bytes limit")]
    BodyTooLarge { declared: usize, max: usize },
    #[error("body ended after {received} of {expected} bytes")]
    ShortBody { expected: usize, received: usize },
    #[error("body is not valid utf-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("failed to write response: {0}")]
    Io(#[from] io::Error),
    #[error("failed to format response: {0}")]
    Fmt(#[from] std::fmt::Error),
}
