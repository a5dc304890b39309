//! Best-effort payload diagnostics printed to stdout.
//!
//! Nothing here can fail the session: decode errors are logged at debug
//! level and counted, and stdout write errors are ignored. The text is built
//! on the worker that read the frame, but the stdout write runs on the
//! blocking pool so a stalled pipe cannot hold up the echo.

use std::io::Write;

use metrics::counter;
use tracing::debug;
use wsecho_core::pretty;

use crate::metrics::DIAGNOSTIC_DECODE_FAILURES_TOTAL;

/// Payloads larger than this are identified but not decoded or rendered.
pub const MAX_RENDERED_BYTES: usize = 64 * 1024;

/// Identify the worker thread servicing the current frame.
fn worker_id() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => format!("{name} {:?}", thread.id()),
        None => format!("{:?}", thread.id()),
    }
}

/// Build the diagnostic text for one payload.
///
/// Always names the worker; appends the indented rendering when the payload
/// is JSON and no larger than [`MAX_RENDERED_BYTES`].
pub fn describe(payload: &[u8]) -> String {
    let mut out = format!("Thread ID: {}\n", worker_id());
    if payload.len() > MAX_RENDERED_BYTES {
        debug!(len = payload.len(), "payload too large to render");
        return out;
    }
    match pretty::decode(payload) {
        Ok(value) => out.push_str(&pretty::render(&value)),
        Err(e) => {
            counter!(DIAGNOSTIC_DECODE_FAILURES_TOTAL).increment(1);
            debug!(error = %e, len = payload.len(), "payload is not JSON, skipping rendering");
        }
    }
    out
}

/// Print the diagnostic text for `payload` to stdout.
///
/// Must be called from within a Tokio runtime.
pub fn emit(payload: &[u8]) {
    let text = describe(payload);
    let _handle = tokio::task::spawn_blocking(move || write_stdout(&text));
}

fn write_stdout(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payload_is_rendered_after_worker_line() {
        let out = describe(br#"{"a":1,"b":[true,null]}"#);
        let (first, rest) = out.split_once('\n').unwrap();
        assert!(first.starts_with("Thread ID: "));
        assert!(first.contains("ThreadId("));
        assert_eq!(
            rest,
            "{\n    \"a\" : 1,\n    \"b\" : [\n        true,\n        null\n    ]\n}\n"
        );
    }

    #[test]
    fn non_json_payload_only_names_worker() {
        let out = describe(b"not-json");
        assert!(out.starts_with("Thread ID: "));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn binary_garbage_is_swallowed() {
        let out = describe(&[0x00, 0xff, 0x13, 0x37]);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn named_thread_is_reported() {
        let out = std::thread::Builder::new()
            .name("wsecho-worker".into())
            .spawn(|| describe(b"1"))
            .unwrap()
            .join()
            .unwrap();
        assert!(out.starts_with("Thread ID: wsecho-worker ThreadId("));
        assert!(out.ends_with("\n1\n"));
    }

    #[test]
    fn oversized_payload_is_not_rendered() {
        let mut big = String::from("[");
        while big.len() <= MAX_RENDERED_BYTES {
            big.push_str("1,");
        }
        big.push_str("1]");
        assert!(pretty::decode(big.as_bytes()).is_ok());

        let out = describe(big.as_bytes());
        assert!(out.starts_with("Thread ID: "));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn payload_at_the_limit_is_rendered() {
        let exact = format!("\"{}\"", "x".repeat(MAX_RENDERED_BYTES - 2));
        assert_eq!(exact.len(), MAX_RENDERED_BYTES);
        let out = describe(exact.as_bytes());
        assert_eq!(out.lines().count(), 2);
    }

    #[tokio::test]
    async fn emit_returns_without_waiting_for_stdout() {
        emit(b"[1,2,3]");
        emit(b"");
    }
}
