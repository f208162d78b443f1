//! The Python debugger's trace-hook-driven state machine. `SPEC_FULL.md`
//! §4.3–§4.6 and §5 for the concurrency model this module implements.

pub mod breakpoint;
pub mod event;
pub mod exception;
pub mod output;

use std::sync::{Condvar, Mutex};

use log::{debug, trace, warn};

use breakpoint::BreakpointStore;
pub use event::DebuggerEvent;
use event::{EventReceiver, EventSender};
use exception::ExceptionInfo;
use output::OutputSinks;

/// One of the five trace-hook event kinds the embedded interpreter reports
/// (§4.3). The `C*` variants are accepted for interface completeness and
/// immediately ignored, matching the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Call,
    Return,
    Line,
    Exception,
    CCall,
    CReturn,
    CException,
}

/// What the trace hook tells its caller to do next. The embedded
/// interpreter is expected to honor `StopExecution` by raising an
/// interrupt/`KeyboardInterrupt` at the next opportunity (§5 "Cancellation").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAction {
    Continue,
    StopExecution,
}

/// Everything the debugger needs to know about the interpreter frame that
/// raised the current trace event, and the two operations it needs
/// performed on the debugger's behalf without itself depending on a
/// concrete embedded interpreter (§1 Non-goals, §9 design notes).
pub trait InterpreterFrame {
    fn file(&self) -> &str;
    fn function(&self) -> &str;
    fn line(&self) -> u32;
    /// Call depth, 0 for the module/top-level frame.
    fn depth(&self) -> u32;
    /// Compile and evaluate `expr` (already `=`→`==` rewritten) against
    /// this frame's globals/locals. The trace hook must be disabled for the
    /// duration (§4.3); implementors do that on the interpreter side. Any
    /// compile/eval failure is reported as `None` and swallowed by the
    /// caller (§7).
    fn eval_condition(&self, expr: &str) -> Option<bool>;
    /// Whether an active try/except frame on the current call stack
    /// encloses the raise point of the exception now being reported
    /// (§4.3's "Exception events").
    fn exception_will_be_caught(&self) -> bool;
    /// Snapshot of the exception carried by an `Exception` trace event.
    /// Only consulted when `event == TraceEvent::Exception`.
    fn current_exception(&self) -> Option<ExceptionInfo>;
}

/// `SPEC_FULL.md` §4.3 "States", excluding the synthetic `Halted` state
/// (modeled as `halted: bool` alongside any of these, per the spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stopped,
    Running,
    HaltOnNext,
    SingleStep,
    StepOver,
    StepOut,
}

/// Runtime-supplied configuration, not hard-coded constants (ambient
/// "Configuration" section of `SPEC_FULL.md` §1).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct DebuggerPreferences {
    pub halt_on_exception: bool,
    pub break_on_first_line: bool,
}

impl Default for DebuggerPreferences {
    fn default() -> Self {
        DebuggerPreferences { halt_on_exception: false, break_on_first_line: false }
    }
}

/// Running counters of dispatched trace events, independent of whether any
/// of them caused a halt (`SPEC_FULL.md` §4.3 "Debugger statistics").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebuggerStats {
    pub line_events: u64,
    pub call_events: u64,
    pub return_events: u64,
    pub exception_events: u64,
}

#[derive(Debug, Clone)]
struct CurrentFrame {
    file: String,
    function: String,
    line: u32,
    depth: u32,
}

struct Shared {
    state: State,
    halted: bool,
    try_stop: bool,
    max_halt: u32,
    call_stack: Vec<CurrentFrame>,
    stack_level: usize,
    stats: DebuggerStats,
}

impl Default for Shared {
    fn default() -> Self {
        Shared {
            state: State::Stopped,
            halted: false,
            try_stop: false,
            max_halt: 0,
            call_stack: Vec::new(),
            stack_level: 0,
            stats: DebuggerStats::default(),
        }
    }
}

/// The debugger. All mutable debugger-internal state lives behind `shared`
/// (one mutex), kept deliberately separate from interpreter-owned state
/// that the trace hook only ever touches transiently through
/// `InterpreterFrame` (§9 design notes).
pub struct Debugger {
    shared: Mutex<Shared>,
    halt_cv: Condvar,
    breakpoints: Mutex<BreakpointStore>,
    events: EventSender,
    preferences: DebuggerPreferences,
    output: Mutex<Option<OutputSinks>>,
}

impl Debugger {
    pub fn new(preferences: DebuggerPreferences) -> (Self, EventReceiver) {
        let (tx, rx) = event::channel();
        let debugger = Debugger {
            shared: Mutex::new(Shared::default()),
            halt_cv: Condvar::new(),
            breakpoints: Mutex::new(BreakpointStore::new()),
            events: tx,
            preferences,
            output: Mutex::new(None),
        };
        (debugger, rx)
    }

    /// Read-only access (lookup, `has_file`, iteration). Mutating calls go
    /// through the `add_breakpoint`/`remove_breakpoint`/etc. methods below so
    /// that every mutation emits its notification on the event channel
    /// synchronously, per §4.4/§5 ("Breakpoint events are delivered
    /// synchronously with the mutation that caused them").
    pub fn breakpoints(&self) -> std::sync::MutexGuard<'_, BreakpointStore> {
        self.breakpoints.lock().unwrap()
    }

    fn emit_breakpoint_notification(&self, notification: Option<breakpoint::BreakpointNotification>) {
        use breakpoint::BreakpointNotification::*;
        let Some(notification) = notification else { return };
        let event = match notification {
            Added(id) => DebuggerEvent::BreakpointAdded(id),
            Changed(id) => DebuggerEvent::BreakpointChanged(id),
            Removed(id) => DebuggerEvent::BreakpointRemoved(id),
        };
        event::emit(&self.events, event);
    }

    pub fn add_breakpoint(&self, file: &str, line: u32) -> breakpoint::BreakpointId {
        let (id, notification) = self.breakpoints.lock().unwrap().add(file, line);
        self.emit_breakpoint_notification(Some(notification));
        id
    }

    pub fn remove_breakpoint(&self, id: breakpoint::BreakpointId) {
        let notification = self.breakpoints.lock().unwrap().remove(id);
        self.emit_breakpoint_notification(notification);
    }

    pub fn clear_all_breakpoints(&self) {
        let notifications = self.breakpoints.lock().unwrap().clear_all();
        for n in notifications {
            self.emit_breakpoint_notification(Some(n));
        }
    }

    pub fn set_breakpoint_condition(&self, id: breakpoint::BreakpointId, expr: Option<String>) {
        let notification = self.breakpoints.lock().unwrap().set_condition(id, expr);
        self.emit_breakpoint_notification(notification);
    }

    pub fn set_breakpoint_enabled(&self, id: breakpoint::BreakpointId, enabled: bool) {
        let notification = self.breakpoints.lock().unwrap().set_enabled(id, enabled);
        self.emit_breakpoint_notification(notification);
    }

    pub fn set_breakpoint_ignore_to(&self, id: breakpoint::BreakpointId, n: u32) {
        let notification = self.breakpoints.lock().unwrap().set_ignore_to(id, n);
        self.emit_breakpoint_notification(notification);
    }

    pub fn set_breakpoint_ignore_from(&self, id: breakpoint::BreakpointId, n: u32) {
        let notification = self.breakpoints.lock().unwrap().set_ignore_from(id, n);
        self.emit_breakpoint_notification(notification);
    }

    // ---- control surface (§6) ----------------------------------------

    pub fn start(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.state = if self.preferences.break_on_first_line { State::HaltOnNext } else { State::Running };
        shared.try_stop = false;
        debug!("debugger started, initial state {:?}", shared.state);
        drop(shared);
        event::emit(&self.events, DebuggerEvent::Started);
    }

    /// `stop()` while running sets `try_stop`, checked at the next
    /// trace-hook entry; while halted, instead wakes the halted hook.
    pub fn stop(&self) {
        let mut shared = self.shared.lock().unwrap();
        if shared.halted {
            shared.state = State::Stopped;
            shared.halted = false;
            drop(shared);
            self.halt_cv.notify_all();
        } else {
            shared.try_stop = true;
        }
    }

    pub fn try_stop(&self) -> bool {
        self.shared.lock().unwrap().try_stop
    }

    pub fn halt_on_next(&self) {
        self.shared.lock().unwrap().state = State::HaltOnNext;
    }

    pub fn step_over(&self) {
        self.resume(State::StepOver);
    }

    pub fn step_into(&self) {
        self.resume(State::SingleStep);
    }

    pub fn step_out(&self) {
        self.resume(State::StepOut);
    }

    pub fn continue_(&self) {
        self.resume(State::Running);
    }

    fn resume(&self, next: State) {
        let mut shared = self.shared.lock().unwrap();
        shared.max_halt = shared.call_stack.last().map(|f| f.depth).unwrap_or(0);
        shared.state = next;
        if shared.halted {
            shared.halted = false;
            let file = shared.call_stack.last().map(|f| f.file.clone()).unwrap_or_default();
            let line = shared.call_stack.last().map(|f| f.line).unwrap_or(0);
            drop(shared);
            self.halt_cv.notify_all();
            event::emit(&self.events, DebuggerEvent::ReleaseAt { file, line });
        }
    }

    pub fn set_stack_level(&self, level: usize) {
        let mut shared = self.shared.lock().unwrap();
        let max = shared.call_stack.len().saturating_sub(1);
        shared.stack_level = level.min(max);
    }

    pub fn current_frame(&self) -> Option<(String, String, u32)> {
        let shared = self.shared.lock().unwrap();
        if !shared.halted {
            return None;
        }
        shared.call_stack.get(shared.stack_level).map(|f| (f.file.clone(), f.function.clone(), f.line))
    }

    pub fn current_file(&self) -> Option<String> {
        self.current_frame().map(|(file, _, _)| file)
    }

    pub fn current_line(&self) -> Option<u32> {
        self.current_frame().map(|(_, _, line)| line)
    }

    pub fn call_depth(&self) -> u32 {
        self.shared.lock().unwrap().call_stack.len() as u32
    }

    pub fn is_halted(&self) -> bool {
        self.shared.lock().unwrap().halted
    }

    pub fn is_running(&self) -> bool {
        matches!(self.shared.lock().unwrap().state, State::Running | State::SingleStep | State::StepOver | State::StepOut | State::HaltOnNext)
    }

    pub fn stats(&self) -> DebuggerStats {
        self.shared.lock().unwrap().stats
    }

    /// `SPEC_FULL.md` §4.6: save whatever sinks the host currently has
    /// installed, then install `sinks` for the duration of a debugged run.
    pub fn install_output_sinks(&self, sinks: OutputSinks) -> Option<OutputSinks> {
        self.output.lock().unwrap().replace(sinks)
    }

    pub fn restore_output_sinks(&self) -> Option<OutputSinks> {
        self.output.lock().unwrap().take()
    }

    // ---- trace hook (§4.3) --------------------------------------------

    pub fn on_trace(&self, event: TraceEvent, frame: &dyn InterpreterFrame) -> TraceAction {
        match event {
            TraceEvent::CCall | TraceEvent::CReturn | TraceEvent::CException => TraceAction::Continue,
            TraceEvent::Call => self.on_call(frame),
            TraceEvent::Return => self.on_return(frame),
            TraceEvent::Line => self.on_line(frame),
            TraceEvent::Exception => self.on_exception(frame),
        }
    }

    fn on_call(&self, frame: &dyn InterpreterFrame) -> TraceAction {
        let mut shared = self.shared.lock().unwrap();
        shared.stats.call_events += 1;
        shared.call_stack.push(CurrentFrame {
            file: frame.file().to_string(),
            function: frame.function().to_string(),
            line: frame.line(),
            depth: frame.depth(),
        });
        drop(shared);
        event::emit(
            &self.events,
            DebuggerEvent::FunctionCalled { file: frame.file().to_string(), function: frame.function().to_string(), line: frame.line() },
        );
        TraceAction::Continue
    }

    fn on_return(&self, frame: &dyn InterpreterFrame) -> TraceAction {
        let mut shared = self.shared.lock().unwrap();
        shared.stats.return_events += 1;
        shared.call_stack.pop();
        shared.stack_level = shared.stack_level.min(shared.call_stack.len().saturating_sub(1));
        drop(shared);
        event::emit(&self.events, DebuggerEvent::FunctionExited { file: frame.file().to_string(), function: frame.function().to_string() });
        TraceAction::Continue
    }

    fn on_line(&self, frame: &dyn InterpreterFrame) -> TraceAction {
        {
            let mut shared = self.shared.lock().unwrap();
            shared.stats.line_events += 1;
            if let Some(top) = shared.call_stack.last_mut() {
                top.line = frame.line();
            }
            if shared.try_stop {
                shared.state = State::Stopped;
                shared.try_stop = false;
                drop(shared);
                event::emit(&self.events, DebuggerEvent::Stopped);
                return TraceAction::StopExecution;
            }
        }

        // Reentrancy (§5): a second interpreter thread cooperatively yields
        // until `halted` clears rather than blocking on the wait primitive
        // immediately.
        while self.is_halted() {
            std::thread::yield_now();
        }

        let should_halt = {
            let shared = self.shared.lock().unwrap();
            match shared.state {
                State::SingleStep | State::HaltOnNext => true,
                State::StepOver => frame.depth() <= shared.max_halt,
                State::StepOut => frame.depth() <= shared.max_halt.saturating_sub(1),
                State::Running => self.breakpoint_hit(frame),
                State::Stopped => false,
            }
        };

        if !should_halt {
            return TraceAction::Continue;
        }

        if !self.breakpoints.lock().unwrap().has_file(frame.file()) {
            trace!("suppressing halt in unopened file {}", frame.file());
            return TraceAction::Continue;
        }

        self.halt(frame)
    }

    fn breakpoint_hit(&self, frame: &dyn InterpreterFrame) -> bool {
        let mut breakpoints = self.breakpoints.lock().unwrap();
        let Some(bp) = breakpoints.lookup(frame.file(), frame.line()) else { return false };
        if !bp.enabled {
            return false;
        }
        if let Some(condition) = bp.condition.clone() {
            drop(breakpoints);
            let rewritten = rewrite_condition(&condition);
            frame.eval_condition(&rewritten).unwrap_or(false)
        } else {
            let id = bp.id;
            breakpoints.hit(id)
        }
    }

    /// Block the calling (interpreter) thread on the wait primitive until a
    /// step/continue/stop command signals it (§4.3 "Halt mechanism", §5
    /// "Suspension points").
    fn halt(&self, frame: &dyn InterpreterFrame) -> TraceAction {
        let file = frame.file().to_string();
        let line = frame.line();
        {
            let mut shared = self.shared.lock().unwrap();
            shared.halted = true;
            if let Some(top) = shared.call_stack.last_mut() {
                top.line = line;
            }
            shared.stack_level = 0;
            debug!("halting at {file}:{line}");
        }
        event::emit(&self.events, DebuggerEvent::HaltAt { file: file.clone(), line });
        event::emit(&self.events, DebuggerEvent::NextInstruction);

        let shared = self.shared.lock().unwrap();
        let shared = self.halt_cv.wait_while(shared, |s| s.halted).unwrap();
        if shared.state == State::Stopped {
            TraceAction::StopExecution
        } else {
            TraceAction::Continue
        }
    }

    fn on_exception(&self, frame: &dyn InterpreterFrame) -> TraceAction {
        self.shared.lock().unwrap().stats.exception_events += 1;
        if frame.exception_will_be_caught() {
            return TraceAction::Continue;
        }
        let Some(info) = frame.current_exception() else { return TraceAction::Continue };
        event::emit(&self.events, DebuggerEvent::ExceptionOccurred(info));
        if self.preferences.halt_on_exception {
            self.shared.lock().unwrap().state = State::HaltOnNext;
            return self.on_line(frame);
        }
        TraceAction::Continue
    }

    // ---- run_file (§4.3 "Fatal errors during `run_file`") -------------

    /// Drives a script to completion via `execute`, which represents
    /// handing control to the embedded interpreter. `execute` returns
    /// `Err(info)` for a compile failure or an unhandled exception
    /// propagating out of the script.
    pub fn run_file(&self, path: &str, execute: impl FnOnce(&Debugger) -> Result<(), ExceptionInfo>) {
        self.start();
        let result = execute(self);
        let mut shared = self.shared.lock().unwrap();
        shared.state = State::Stopped;
        shared.halted = false;
        drop(shared);
        match result {
            Ok(()) => {}
            Err(info) if info.is_reportable_not_fatal() => {
                event::emit(&self.events, DebuggerEvent::ExceptionOccurred(info));
            }
            Err(info) => {
                warn!("{path}: fatal {} ({})", info.error_type, info.message);
                event::emit(&self.events, DebuggerEvent::ExceptionFatal(info));
            }
        }
        event::emit(&self.events, DebuggerEvent::Stopped);
    }
}

/// §4.3 "Condition evaluation": rewrite a bare `=` (not part of `==`, `<=`,
/// `>=`, `!=`) to `==`, guarding against an accidental assignment in a
/// breakpoint condition. Intentionally conservative — see SPEC_FULL.md §9's
/// open question about parsing before rewriting; this mirrors the original
/// behavior verbatim.
pub fn rewrite_condition(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '=' {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            if next == Some('=') {
                out.push('=');
                out.push('=');
                i += 2;
                continue;
            }
            if matches!(prev, Some('<') | Some('>') | Some('!') | Some('=')) {
                out.push('=');
                i += 1;
                continue;
            }
            out.push('=');
            out.push('=');
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct MockFrame {
        file: String,
        function: String,
        line: AtomicU32,
        depth: u32,
        caught: bool,
        exception: Option<ExceptionInfo>,
        cond_value: Option<bool>,
    }

    impl InterpreterFrame for MockFrame {
        fn file(&self) -> &str {
            &self.file
        }
        fn function(&self) -> &str {
            &self.function
        }
        fn line(&self) -> u32 {
            self.line.load(Ordering::SeqCst)
        }
        fn depth(&self) -> u32 {
            self.depth
        }
        fn eval_condition(&self, _expr: &str) -> Option<bool> {
            self.cond_value
        }
        fn exception_will_be_caught(&self) -> bool {
            self.caught
        }
        fn current_exception(&self) -> Option<ExceptionInfo> {
            self.exception.clone()
        }
    }

    fn frame(file: &str, line: u32, depth: u32) -> MockFrame {
        MockFrame {
            file: file.to_string(),
            function: "f".to_string(),
            line: AtomicU32::new(line),
            depth,
            caught: false,
            exception: None,
            cond_value: None,
        }
    }

    #[test]
    fn condition_rewrite_leaves_comparisons_alone() {
        assert_eq!(rewrite_condition("i = 5"), "i == 5");
        assert_eq!(rewrite_condition("i == 5"), "i == 5");
        assert_eq!(rewrite_condition("i <= 5"), "i <= 5");
        assert_eq!(rewrite_condition("i != 5"), "i != 5");
        assert_eq!(rewrite_condition("i >= 5"), "i >= 5");
    }

    #[test]
    fn unconditional_breakpoint_halts_when_file_opened() {
        let (debugger, _rx) = Debugger::new(DebuggerPreferences::default());
        debugger.add_breakpoint("a.py", 7);
        debugger.start();
        debugger.shared.lock().unwrap().state = State::Running;

        let debugger = Arc::new(debugger);
        let d2 = debugger.clone();
        let handle = std::thread::spawn(move || {
            let f = frame("a.py", 7, 0);
            d2.on_trace(TraceEvent::Line, &f)
        });

        // Wait until halted, then release it.
        while !debugger.is_halted() {
            std::thread::yield_now();
        }
        debugger.continue_();
        let action = handle.join().unwrap();
        assert_eq!(action, TraceAction::Continue);
    }

    #[test]
    fn halt_suppressed_when_file_not_opened() {
        let (debugger, _rx) = Debugger::new(DebuggerPreferences::default());
        debugger.start();
        debugger.shared.lock().unwrap().state = State::Running;
        let f = frame("unopened.py", 3, 0);
        let action = debugger.on_trace(TraceEvent::Line, &f);
        assert_eq!(action, TraceAction::Continue);
        assert!(!debugger.is_halted());
    }

    #[test]
    fn step_over_only_halts_at_or_above_saved_depth() {
        let (debugger, _rx) = Debugger::new(DebuggerPreferences::default());
        debugger.start();
        {
            let mut shared = debugger.shared.lock().unwrap();
            shared.state = State::StepOver;
            shared.max_halt = 1;
        }
        let deeper = frame("a.py", 10, 2);
        assert_eq!(debugger.on_trace(TraceEvent::Line, &deeper), TraceAction::Continue);
        assert!(!debugger.is_halted());
    }

    #[test]
    fn run_file_reports_fatal_exception() {
        let (debugger, rx) = Debugger::new(DebuggerPreferences::default());
        debugger.run_file("bad.py", |_| {
            Err(ExceptionInfo::new("ValueError", "x", vec![exception::TracebackFrame { file: "bad.py".into(), function: "<module>".into(), line: 1 }]))
        });
        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], DebuggerEvent::Started));
        assert!(events.iter().any(|e| matches!(e, DebuggerEvent::ExceptionFatal(_))));
        assert!(matches!(events.last().unwrap(), DebuggerEvent::Stopped));
    }

    #[test]
    fn run_file_reports_system_exit_as_non_fatal() {
        let (debugger, rx) = Debugger::new(DebuggerPreferences::default());
        debugger.run_file("ok.py", |_| Err(ExceptionInfo::new("SystemExit", "0", vec![])));
        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, DebuggerEvent::ExceptionOccurred(_))));
        assert!(!events.iter().any(|e| matches!(e, DebuggerEvent::ExceptionFatal(_))));
    }

    #[test]
    fn breakpoint_mutations_emit_events_synchronously() {
        let (debugger, rx) = Debugger::new(DebuggerPreferences::default());
        let id = debugger.add_breakpoint("a.py", 3);
        debugger.set_breakpoint_condition(id, Some("i == 5".to_string()));
        debugger.set_breakpoint_enabled(id, false);
        debugger.remove_breakpoint(id);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], DebuggerEvent::BreakpointAdded(added) if added == id));
        assert_eq!(events.iter().filter(|e| matches!(e, DebuggerEvent::BreakpointChanged(changed) if *changed == id)).count(), 2);
        assert!(matches!(events.last().unwrap(), DebuggerEvent::BreakpointRemoved(removed) if *removed == id));
    }
}
