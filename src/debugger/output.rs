//! Output redirection adapters installed for the duration of a debugged
//! run. `SPEC_FULL.md` §4.6, mirroring the original's `DebugStdout` /
//! `DebugStderr` / `DebugExcept` extension objects.

/// Minimal sink a host interpreter's stdout/stderr can be redirected to.
pub trait OutputSink: Send {
    fn write(&mut self, text: &str);
    fn flush(&mut self) {}
}

/// Buffers everything written to it; the default sink installed by
/// [`super::Debugger::install_output_sinks`] when the host does not supply
/// its own, and the sink tests assert against.
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: String,
}

impl BufferSink {
    pub fn new() -> Self {
        BufferSink::default()
    }

    pub fn contents(&self) -> &str {
        &self.buf
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }
}

impl OutputSink for BufferSink {
    fn write(&mut self, text: &str) {
        self.buf.push_str(text);
    }
}

/// Saved stdout/stderr sinks, restored verbatim by `restore_output_sinks`
/// on stop so the host's previous configuration is never lost (§6).
pub struct OutputSinks {
    pub stdout: Box<dyn OutputSink>,
    pub stderr: Box<dyn OutputSink>,
}

impl Default for OutputSinks {
    fn default() -> Self {
        OutputSinks { stdout: Box::new(BufferSink::new()), stderr: Box::new(BufferSink::new()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_accumulates_writes() {
        let mut sink = BufferSink::new();
        sink.write("hello ");
        sink.write("world");
        assert_eq!(sink.contents(), "hello world");
        assert_eq!(sink.take(), "hello world");
        assert_eq!(sink.contents(), "");
    }
}
