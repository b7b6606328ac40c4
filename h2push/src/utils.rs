use bytes::{Bytes, BytesMut};
use h2::RecvStream;
use tokio::time::Duration;

use std::fmt::{self, Display};

/// Read a stream's body to its end, giving back flow-control capacity as chunks arrive
pub async fn read_body(recv_stream: &mut RecvStream) -> Result<Bytes, h2::Error> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = recv_stream.data().await {
        let chunk = chunk?;
        let _ = recv_stream.flow_control().release_capacity(chunk.len());
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

pub trait DurationExt {
    fn autofmt(&'_ self) -> DurationAutoFormatter<'_>;
}

impl DurationExt for Duration {
    fn autofmt(&'_ self) -> DurationAutoFormatter<'_> {
        DurationAutoFormatter(self)
    }
}

pub struct DurationAutoFormatter<'a>(pub &'a Duration);

impl<'a> Display for DurationAutoFormatter<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0.as_nanos();
        match t {
            t if t < 1000 => write!(fmt, "{}ns", t),
            t if t < 1_000_000 => write!(fmt, "{:.3}µs", t as f64 / 1e3),
            t if t < 1_000_000_000 => write!(fmt, "{:.3}ms", t as f64 / 1e6),
            t if t < 60_000_000_000 => write!(fmt, "{:.3}s", t as f64 / 1e9),
            t => write!(fmt, "{:.3}mins", t as f64 / 60e9),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DurationExt;
    use tokio::time::Duration;

    #[test]
    fn autofmt() {
        assert_eq!(Duration::from_nanos(999).autofmt().to_string(), "999ns");
        assert_eq!(Duration::from_micros(1500).autofmt().to_string(), "1.500ms");
        assert_eq!(Duration::from_secs(2).autofmt().to_string(), "2.000s");
        assert_eq!(Duration::from_secs(90).autofmt().to_string(), "1.500mins");
    }
}
