use http::{header::CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue, Method, Uri, Version};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};

use crate::error::RequestError;

use super::Request;

const MAX_LINE_BYTES: u64 = 8 * 1024;

pub async fn read_request<R>(stream: &mut R, max_body: usize) -> Result<Request, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let (method, uri, version) = read_request_line(stream).await?;
    let headers = read_headers(stream).await?;

    // only POST and PUT carry a payload, framing headers on anything else are ignored
    let body = if method == Method::POST || method == Method::PUT {
        let content_length = content_length(&headers, max_body)?;
        let body = read_body(stream, content_length).await?;
        (content_length > 0).then_some(body)
    } else {
        None
    };

    let mut request = http::Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = version;
    *request.headers_mut() = headers;

    Ok(request)
}

pub async fn read_request_line<R>(stream: &mut R) -> Result<(Method, Uri, Version), RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let line = loop {
        match read_line(stream).await? {
            // tolerate stray CRLFs left before the request line
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
            None => return Err(RequestError::ConnectionClosed),
        }
    };

    //request line = "METHOD PATH HTTP/VERSION\r\n"
    let mut line = line.as_str();
    let method = split_to_byte(&mut line, b' ')?;
    let path = split_to_byte(&mut line, b' ')?;
    let version = match line {
        "HTTP/0.9" => Version::HTTP_09,
        "HTTP/1.0" => Version::HTTP_10,
        "HTTP/1.1" => Version::HTTP_11,
        "HTTP/2.0" => Version::HTTP_2,
        "HTTP/3.0" => Version::HTTP_3,
        _ => return Err(RequestError::UnsupportedVersion),
    };

    Ok((
        Method::from_bytes(method.as_bytes())?,
        Uri::try_from(path)?,
        version,
    ))
}

pub async fn read_headers<R>(stream: &mut R) -> Result<HeaderMap, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HeaderMap::new();

    // header = "Name: Value\r\n"
    while let Some(line) = read_line(stream).await? {
        if line.is_empty() {
            break;
        }

        let mut value = line.as_str();
        let Ok(name) = split_to_byte(&mut value, b':') else {
            tracing::debug!(%line, "ignoring header line without a colon");
            continue;
        };

        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value.trim()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!(%line, "ignoring malformed header line"),
        }
    }

    Ok(headers)
}

pub fn content_length(headers: &HeaderMap, max_body: usize) -> Result<usize, RequestError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(0);
    };

    let declared = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or(RequestError::InvalidContentLength)?;
    if declared <= 0 {
        return Ok(0);
    }

    let declared = usize::try_from(declared).map_err(|_| RequestError::InvalidContentLength)?;
    if declared > max_body {
        return Err(RequestError::BodyTooLarge {
            declared,
            max: max_body,
        });
    }

    Ok(declared)
}

pub async fn read_body<R>(stream: &mut R, len: usize) -> Result<String, RequestError>
where
    R: AsyncRead + Unpin,
{
    if len == 0 {
        return Ok(String::new());
    }

    let mut buf = Vec::with_capacity(len);
    let received = (&mut *stream).take(len as u64).read_to_end(&mut buf).await?;
    if received < len {
        return Err(RequestError::ShortBody {
            expected: len,
            received,
        });
    }

    Ok(String::from_utf8(buf)?)
}

async fn read_line<R>(stream: &mut R) -> Result<Option<String>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = (&mut *stream)
        .take(MAX_LINE_BYTES)
        .read_line(&mut line)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if !line.ends_with('\n') && read as u64 >= MAX_LINE_BYTES {
        return Err(RequestError::InvalidFormat);
    }

    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);

    Ok(Some(line))
}

#[inline]
fn split_to_byte<'a>(buf: &mut &'a str, byte: u8) -> Result<&'a str, RequestError> {
    memchr::memchr(byte, buf.as_bytes())
        .map(|e| {
            let part = &buf[..e];
            *buf = &buf[e + 1..];
            part
        })
        .ok_or(RequestError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_a_full_request() {
        let mut stream: &[u8] = b"POST /api/dinosaurio HTTP/1.1\r\n\
Host: localhost:8080\r\n\
Content-Type: application/json\r\n\
Content-Length: 28\r\n\
\r\n\
{\"Dinosaurio\":\"Triceratops\"}";

        let request = read_request(&mut stream, 1024).await.unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/api/dinosaurio");
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.headers()["host"], "localhost:8080");
        assert_eq!(
            request.body().as_deref(),
            Some(r#"{"Dinosaurio":"Triceratops"}"#)
        );
        assert!(stream.is_empty());
    }

    #[tokio::test]
    async fn request_without_body() {
        let mut stream: &[u8] = b"GET /api/dinosaurios HTTP/1.1\r\nHost: x\r\n\r\n";
        let request = read_request(&mut stream, 1024).await.unwrap();
        assert_eq!(request.method(), Method::GET);
        assert!(request.body().is_none());
    }

    #[tokio::test]
    async fn framing_headers_only_matter_for_payload_methods() {
        let mut stream: &[u8] = b"GET /api/dinosaurios HTTP/1.1\r\nContent-Length: abc\r\n\r\n";
        let request = read_request(&mut stream, 16).await.unwrap();
        assert!(request.body().is_none());

        let mut stream: &[u8] = b"DELETE /api/dinosaurio/1 HTTP/1.1\r\nContent-Length: 5\r\n\r\n";
        let request = read_request(&mut stream, 16).await.unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert!(request.body().is_none());

        let mut stream: &[u8] = b"PUT /api/dinosaurio/1 HTTP/1.1\r\nContent-Length: abc\r\n\r\n";
        assert!(matches!(
            read_request(&mut stream, 16).await,
            Err(RequestError::InvalidContentLength)
        ));
    }

    #[tokio::test]
    async fn rejects_bad_request_lines() {
        let mut stream: &[u8] = b"GET\r\n\r\n";
        assert!(matches!(
            read_request_line(&mut stream).await,
            Err(RequestError::InvalidFormat)
        ));

        let mut stream: &[u8] = b"GET / HTTP/4.2\r\n\r\n";
        assert!(matches!(
            read_request_line(&mut stream).await,
            Err(RequestError::UnsupportedVersion)
        ));

        let mut stream: &[u8] = b"";
        assert!(matches!(
            read_request_line(&mut stream).await,
            Err(RequestError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn malformed_header_lines_are_ignored() {
        let mut stream: &[u8] =
            b"Content-Length: 4\r\nthis line has no colon\r\nbad name: x\r\nAccept:  */* \r\n\r\nbody";

        let headers = read_headers(&mut stream).await.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[CONTENT_LENGTH], "4");
        assert_eq!(headers["accept"], "*/*");
        assert_eq!(stream, b"body");
    }

    #[tokio::test]
    async fn headers_stop_at_end_of_stream() {
        let mut stream: &[u8] = b"Host: a\r\n";
        let headers = read_headers(&mut stream).await.unwrap();
        assert_eq!(headers["host"], "a");
    }

    #[test]
    fn content_length_rules() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers, 10).unwrap(), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert_eq!(content_length(&headers, 10).unwrap(), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("-5"));
        assert_eq!(content_length(&headers, 10).unwrap(), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static(" 7"));
        assert_eq!(content_length(&headers, 10).unwrap(), 7);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("seven"));
        assert!(matches!(
            content_length(&headers, 10),
            Err(RequestError::InvalidContentLength)
        ));

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("11"));
        assert!(matches!(
            content_length(&headers, 10),
            Err(RequestError::BodyTooLarge { declared: 11, max: 10 })
        ));
    }

    #[tokio::test]
    async fn reads_exactly_the_declared_length() {
        let mut stream: &[u8] = b"{\"a\":1}trailing";
        let body = read_body(&mut stream, 7).await.unwrap();
        assert_eq!(body, "{\"a\":1}");
        assert_eq!(stream, b"trailing");

        assert_eq!(read_body(&mut stream, 0).await.unwrap(), "");
        assert_eq!(stream, b"trailing");
    }

    #[tokio::test]
    async fn short_body_is_an_error() {
        let mut stream: &[u8] = b"{\"Dino";
        assert!(matches!(
            read_body(&mut stream, 28).await,
            Err(RequestError::ShortBody {
                expected: 28,
                received: 6
            })
        ));
    }

    #[tokio::test]
    async fn non_utf8_body_is_an_error() {
        let mut stream: &[u8] = &[0xff, 0xfe];
        assert!(matches!(
            read_body(&mut stream, 2).await,
            Err(RequestError::InvalidUtf8(_))
        ));
    }

    #[tokio::test]
    async fn overlong_lines_are_rejected() {
        let mut raw = vec![b'a'; MAX_LINE_BYTES as usize + 10];
        raw.extend_from_slice(b"\r\n");
        let mut stream: &[u8] = &raw;
        assert!(matches!(
            read_headers(&mut stream).await,
            Err(RequestError::InvalidFormat)
        ));
    }
}
