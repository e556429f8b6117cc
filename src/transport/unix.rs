/// HTTP over the local caching daemon's unix-domain socket
///
/// Same request/response contract as the network path, with the daemon
/// standing in for the identity service. The daemon closes the connection
/// after each response, so the body is whatever follows the header block
/// (de-chunked when the daemon says so).
use super::{read_capped, RawResponse, MAX_RESPONSE_SIZE, USER_AGENT};
use crate::config::RuntimeConfig;
use crate::error::{ResolveError, ResolveResult};
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::time::Duration;

// Generous allowance for the status line and headers on top of the body cap.
const MAX_WIRE_SIZE: usize = MAX_RESPONSE_SIZE + 16 * 1024;

pub(super) fn request(config: &RuntimeConfig, query: &str) -> ResolveResult<RawResponse> {
    let socket = &config.cached_unix_socket;
    let mut stream = UnixStream::connect(socket).map_err(|e| {
        ResolveError::Transport(format!("cannot connect to daemon socket {}: {}", socket, e))
    })?;

    let timeout = (config.request_timeout > 0)
        .then(|| Duration::from_secs(config.request_timeout));
    stream
        .set_read_timeout(timeout)
        .and_then(|_| stream.set_write_timeout(timeout))
        .map_err(|e| ResolveError::Transport(format!("cannot set socket timeout: {}", e)))?;

    let request = format!(
        "GET /{} HTTP/1.1\r\nHost: localhost\r\nUser-Agent: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
        query, USER_AGENT
    );
    stream
        .write_all(request.as_bytes())
        .map_err(|e| ResolveError::Transport(format!("daemon write error: {}", e)))?;

    let raw = read_capped(&mut stream, MAX_WIRE_SIZE)?;
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> ResolveResult<RawResponse> {
    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| malformed("missing header terminator"))?;
    let head = std::str::from_utf8(&raw[..header_end])
        .map_err(|_| malformed("headers are not utf-8"))?;

    let status_line = head.lines().next().unwrap_or("");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| malformed("bad status line"))?;

    let chunked = head.lines().skip(1).any(|line| {
        let line = line.to_ascii_lowercase();
        line.starts_with("transfer-encoding:") && line.contains("chunked")
    });

    let payload = &raw[header_end + 4..];
    let body = if chunked {
        dechunk(payload)?
    } else {
        payload.to_vec()
    };
    if body.len() > MAX_RESPONSE_SIZE {
        return Err(ResolveError::ResponseTooLarge {
            limit: MAX_RESPONSE_SIZE,
        });
    }
    Ok(RawResponse { body, status })
}

fn dechunk(mut data: &[u8]) -> ResolveResult<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let line_end = data
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| malformed("truncated chunk header"))?;
        let size_field = std::str::from_utf8(&data[..line_end])
            .map_err(|_| malformed("chunk size is not utf-8"))?;
        let size_field = size_field.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| malformed("bad chunk size"))?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(body);
        }
        // Cap the declared size before any arithmetic on it; a hostile size
        // field near usize::MAX must not overflow the length checks below.
        if size > MAX_RESPONSE_SIZE {
            return Err(ResolveError::ResponseTooLarge {
                limit: MAX_RESPONSE_SIZE,
            });
        }
        if data.len() < size + 2 {
            return Err(malformed("truncated chunk body"));
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

fn malformed(detail: &str) -> ResolveError {
    ResolveError::Transport(format!("malformed daemon response: {}", detail))
}
