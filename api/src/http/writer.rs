use std::fmt::Write;

use bytes::BytesMut;
use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ResponseError;

use super::{Response, LINE_DELIMITER};

pub fn reason_phrase(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "OK",
    }
}

pub async fn write_response<W>(
    sink: &mut W,
    status: StatusCode,
    body: &str,
) -> Result<(), ResponseError>
where
    W: AsyncWrite + Unpin,
{
    let mut head = BytesMut::with_capacity(128);
    write!(
        head,
        "HTTP/1.1 {} {}{LINE_DELIMITER}",
        status.as_u16(),
        reason_phrase(status)
    )?;
    write!(head, "Content-Type: {}{LINE_DELIMITER}", mime::APPLICATION_JSON)?;
    write!(head, "Content-Length: {}{LINE_DELIMITER}", body.len())?;
    head.write_str(LINE_DELIMITER)?;

    sink.write_all(&head).await?;
    sink.write_all(body.as_bytes()).await?;
    sink.flush().await?;

    Ok(())
}

pub async fn send<W>(sink: &mut W, response: &Response) -> Result<(), ResponseError>
where
    W: AsyncWrite + Unpin,
{
    write_response(sink, response.status(), response.body()).await
}
