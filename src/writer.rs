use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use time::OffsetDateTime;

use crate::format::{Caller, HeaderFlags, format_line};

/// Destination for formatted bytes. Dropping a sink closes it.
pub type Sink = Box<dyn Write + Send>;

/// State guarded by the writer's mutex.
struct WriterState {
    /// Current output destination.
    sink: Sink,
    /// Written at the start of every line.
    prefix: String,
    /// Header segments.
    flags: HeaderFlags,
    /// Reused line buffer.
    buf: String,
}

/// A line writer that serializes all access to one sink.
///
/// Every write, sink swap and accessor goes through the same mutex, so a
/// line is never torn and no write reaches a sink after it was replaced.
pub struct SerialWriter {
    state: Mutex<WriterState>,
}

impl SerialWriter {
    /// Create a writer over `sink`.
    pub fn new(sink: Sink, prefix: impl Into<String>, flags: HeaderFlags) -> Self {
        Self {
            state: Mutex::new(WriterState {
                sink,
                prefix: prefix.into(),
                flags,
                buf: String::new(),
            }),
        }
    }

    /// Create a writer appending to `path`, creating the file if needed.
    pub fn append_to(path: &Path, flags: HeaderFlags) -> io::Result<Self> {
        let file = open_append(path)?;
        Ok(Self::new(Box::new(file), "", flags))
    }

    // A panic while holding the lock must not silence the logger.
    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write raw bytes to the current sink.
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        self.lock().sink.write_all(bytes)
    }

    /// Format one line with the current prefix and flags and write it.
    pub fn output(&self, now: OffsetDateTime, caller: Option<Caller>, text: &str) -> io::Result<()> {
        let mut guard = self.lock();
        let state = &mut *guard;

        state.buf.clear();
        format_line(&mut state.buf, &state.prefix, state.flags, now, caller, text);
        state.sink.write_all(state.buf.as_bytes())
    }

    /// Install `sink`, flushing and closing the previous one.
    pub fn replace_sink(&self, sink: Sink) {
        let mut guard = self.lock();
        // Best effort: the old sink is going away either way.
        let _ = guard.sink.flush();
        let old = std::mem::replace(&mut guard.sink, sink);
        drop(old);
    }

    /// Alias of [`replace_sink`](Self::replace_sink).
    pub fn set_output(&self, sink: Sink) {
        self.replace_sink(sink);
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock().sink.flush()
    }

    pub fn prefix(&self) -> String {
        self.lock().prefix.clone()
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.lock().prefix = prefix.into();
    }

    pub fn flags(&self) -> HeaderFlags {
        self.lock().flags
    }

    pub fn set_flags(&self, flags: HeaderFlags) {
        self.lock().flags = flags;
    }
}

impl std::fmt::Debug for SerialWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SerialWriter")
            .field("prefix", &state.prefix)
            .field("flags", &state.flags)
            .finish_non_exhaustive()
    }
}

/// Open `path` for appending, creating it if absent.
pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use time::macros::datetime;

    /// In-memory sink whose contents stay readable after it is handed off.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub(crate) Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub(crate) struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_uses_prefix_and_flags() {
        let buf = SharedBuf::default();
        let writer = SerialWriter::new(Box::new(buf.clone()), "app: ", HeaderFlags::STD);

        writer
            .output(datetime!(2026-01-09 08:07:06 UTC), None, "started")
            .unwrap();

        assert_eq!(buf.contents(), "app: 2026-01-09 08:07:06 started\n");
    }

    #[test]
    fn test_accessors() {
        let writer = SerialWriter::new(Box::new(io::sink()), "", HeaderFlags::STD);
        assert_eq!(writer.prefix(), "");
        assert_eq!(writer.flags(), HeaderFlags::STD);

        writer.set_prefix("svc ");
        writer.set_flags(HeaderFlags::NONE);
        assert_eq!(writer.prefix(), "svc ");
        assert_eq!(writer.flags(), HeaderFlags::NONE);
    }

    #[test]
    fn test_replace_sink_redirects_writes() {
        let first = SharedBuf::default();
        let second = SharedBuf::default();
        let writer = SerialWriter::new(Box::new(first.clone()), "", HeaderFlags::NONE);

        writer.write(b"one\n").unwrap();
        writer.replace_sink(Box::new(second.clone()));
        writer.write(b"two\n").unwrap();

        assert_eq!(first.contents(), "one\n");
        assert_eq!(second.contents(), "two\n");
    }

    #[test]
    fn test_write_error_is_returned() {
        let writer = SerialWriter::new(Box::new(FailingSink), "", HeaderFlags::NONE);
        let err = writer.write(b"lost\n").unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_concurrent_lines_are_not_torn() {
        let buf = SharedBuf::default();
        let writer = Arc::new(SerialWriter::new(
            Box::new(buf.clone()),
            "",
            HeaderFlags::NONE,
        ));
        let now = OffsetDateTime::now_utc();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = Arc::clone(&writer);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        writer
                            .output(now, None, &format!("thread-{t} line-{i} payload"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = buf.contents();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 8 * 200);
        for line in lines {
            assert!(line.starts_with("thread-") && line.ends_with(" payload"), "{line}");
        }
    }

    #[test]
    fn test_append_to_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.log");
        std::fs::write(&path, "old\n").unwrap();

        let writer = SerialWriter::append_to(&path, HeaderFlags::NONE).unwrap();
        writer.output(OffsetDateTime::now_utc(), None, "new").unwrap();
        writer.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }
}
