//! Captured interpreter exception state. `SPEC_FULL.md` §4.5.

/// One entry of a captured traceback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackFrame {
    pub file: String,
    pub function: String,
    pub line: u32,
}

/// Snapshot of an interpreter exception, taken at the moment of an
/// `Exception` trace event (or at `run_file` failure). Outlives the
/// interpreter's own error indicator, which is cleared immediately after
/// capture (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub error_type: String,
    pub message: String,
    pub traceback: Vec<TracebackFrame>,
    current_frame_level: usize,
}

impl ExceptionInfo {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>, traceback: Vec<TracebackFrame>) -> Self {
        ExceptionInfo { error_type: error_type.into(), message: message.into(), traceback, current_frame_level: 0 }
    }

    pub fn is_syntax_error(&self) -> bool {
        self.error_type == "SyntaxError"
    }

    pub fn is_indentation_error(&self) -> bool {
        self.error_type == "IndentationError"
    }

    pub fn is_warning(&self) -> bool {
        self.error_type.ends_with("Warning")
    }

    pub fn is_keyboard_interrupt(&self) -> bool {
        self.error_type == "KeyboardInterrupt"
    }

    pub fn is_system_exit(&self) -> bool {
        self.error_type == "SystemExit"
    }

    /// Whether this exception is, by UI convention, non-fatal even though it
    /// propagated out of `run_file` (§4.3's "Fatal errors during
    /// `run_file`").
    pub fn is_reportable_not_fatal(&self) -> bool {
        self.is_system_exit() || self.is_keyboard_interrupt()
    }

    /// Current cursor into `traceback`, 0 = innermost (raise site). Stepping
    /// this cursor never mutates the captured frames themselves.
    pub fn current_frame_level(&self) -> usize {
        self.current_frame_level
    }

    pub fn current_frame(&self) -> Option<&TracebackFrame> {
        self.traceback.get(self.current_frame_level)
    }

    pub fn step_up(&mut self) {
        if self.current_frame_level + 1 < self.traceback.len() {
            self.current_frame_level += 1;
        }
    }

    pub fn step_down(&mut self) {
        self.current_frame_level = self.current_frame_level.saturating_sub(1);
    }

    pub fn set_frame_level(&mut self, level: usize) {
        self.current_frame_level = level.min(self.traceback.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExceptionInfo {
        ExceptionInfo::new(
            "ValueError",
            "x",
            vec![
                TracebackFrame { file: "a.py".into(), function: "<module>".into(), line: 3 },
                TracebackFrame { file: "a.py".into(), function: "f".into(), line: 7 },
            ],
        )
    }

    #[test]
    fn classification_predicates() {
        let info = sample();
        assert!(!info.is_syntax_error());
        assert!(!info.is_keyboard_interrupt());
        assert!(!info.is_reportable_not_fatal());
        let interrupt = ExceptionInfo::new("KeyboardInterrupt", "", vec![]);
        assert!(interrupt.is_keyboard_interrupt());
        assert!(interrupt.is_reportable_not_fatal());
    }

    #[test]
    fn stepping_frame_level_does_not_mutate_traceback() {
        let mut info = sample();
        let original = info.traceback.clone();
        info.step_up();
        assert_eq!(info.current_frame_level(), 1);
        info.step_up();
        assert_eq!(info.current_frame_level(), 1, "clamped at the outermost frame");
        info.step_down();
        assert_eq!(info.current_frame_level(), 0);
        assert_eq!(info.traceback, original);
    }
}
