//! Debugger event stream. `SPEC_FULL.md` §6 and §5 ("Ordering guarantees").

use super::breakpoint::BreakpointId;
use super::exception::ExceptionInfo;

/// One entry of the debugger's outward event stream. Delivered in the
/// exact temporal order of the interpreter events that triggered them.
#[derive(Debug, Clone, PartialEq)]
pub enum DebuggerEvent {
    Started,
    Stopped,
    HaltAt { file: String, line: u32 },
    ReleaseAt { file: String, line: u32 },
    NextInstruction,
    FunctionCalled { file: String, function: String, line: u32 },
    FunctionExited { file: String, function: String },
    ExceptionOccurred(ExceptionInfo),
    ExceptionFatal(ExceptionInfo),
    ClearException { file: String, line: u32 },
    ClearAllExceptions,
    BreakpointAdded(BreakpointId),
    BreakpointChanged(BreakpointId),
    BreakpointRemoved(BreakpointId),
}

/// Sending side of the event channel. Unbounded per §5's "implementation
/// note": a slow or absent subscriber must never block the interpreter
/// thread that drives the trace hook.
pub type EventSender = std::sync::mpsc::Sender<DebuggerEvent>;
pub type EventReceiver = std::sync::mpsc::Receiver<DebuggerEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    std::sync::mpsc::channel()
}

/// Send `event`, logging (not propagating) a failure caused by every
/// receiver having been dropped — see SPEC_FULL.md §5.
pub(super) fn emit(sender: &EventSender, event: DebuggerEvent) {
    if sender.send(event).is_err() {
        log::warn!("debugger event dropped: no receiver attached");
    }
}
