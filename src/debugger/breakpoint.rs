//! Breakpoint model. `SPEC_FULL.md` §4.4 and the persistence framing in §6.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Monotonically increasing across the process lifetime; never reused even
/// when the breakpoint that held it is removed.
pub type BreakpointId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> BreakpointId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A single breakpoint. `SPEC_FULL.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: BreakpointId,
    pub line: u32,
    pub enabled: bool,
    hit_count: u32,
    ignore_to: u32,
    ignore_from: u32,
    pub condition: Option<String>,
}

impl Breakpoint {
    fn new(id: BreakpointId, line: u32) -> Self {
        Breakpoint {
            id,
            line,
            enabled: true,
            hit_count: 0,
            ignore_to: 0,
            ignore_from: u32::MAX,
            condition: None,
        }
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    /// Increment the hit counter and report whether the breakpoint's own
    /// counting policy says to halt. Callers that have set a `condition`
    /// should evaluate it instead and ignore this result (§4.3).
    fn hit(&mut self) -> bool {
        self.hit_count += 1;
        self.enabled && self.hit_count >= self.ignore_to && self.hit_count <= self.ignore_from
    }
}

/// Emitted synchronously with every mutation of a [`BreakpointStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointNotification {
    Added(BreakpointId),
    Changed(BreakpointId),
    Removed(BreakpointId),
}

/// All breakpoints for a single source path.
#[derive(Debug, Clone, Default)]
pub struct BreakpointFile {
    pub path: String,
    breakpoints: Vec<Breakpoint>,
}

impl BreakpointFile {
    fn new(path: impl Into<String>) -> Self {
        BreakpointFile { path: path.into(), breakpoints: Vec::new() }
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn lookup(&self, line: u32) -> Option<&Breakpoint> {
        self.breakpoints.iter().find(|b| b.line == line)
    }

    fn lookup_mut(&mut self, line: u32) -> Option<&mut Breakpoint> {
        self.breakpoints.iter_mut().find(|b| b.line == line)
    }

    fn find_mut(&mut self, id: BreakpointId) -> Option<&mut Breakpoint> {
        self.breakpoints.iter_mut().find(|b| b.id == id)
    }
}

/// The debugger's `path -> BreakpointFile` map (§3). Read-mostly; callers
/// are responsible for serializing mutating calls (§5).
#[derive(Debug, Default)]
pub struct BreakpointStore {
    files: HashMap<String, BreakpointFile>,
    index: HashMap<BreakpointId, String>,
}

impl BreakpointStore {
    pub fn new() -> Self {
        BreakpointStore::default()
    }

    pub fn add(&mut self, file: &str, line: u32) -> (BreakpointId, BreakpointNotification) {
        let id = next_id();
        let bp = Breakpoint::new(id, line);
        let entry = self.files.entry(file.to_string()).or_insert_with(|| BreakpointFile::new(file));
        entry.breakpoints.push(bp);
        self.index.insert(id, file.to_string());
        (id, BreakpointNotification::Added(id))
    }

    pub fn remove(&mut self, id: BreakpointId) -> Option<BreakpointNotification> {
        let file = self.index.remove(&id)?;
        if let Some(bf) = self.files.get_mut(&file) {
            bf.breakpoints.retain(|b| b.id != id);
        }
        Some(BreakpointNotification::Removed(id))
    }

    pub fn clear_all(&mut self) -> Vec<BreakpointNotification> {
        let ids: Vec<_> = self.index.keys().copied().collect();
        self.files.clear();
        self.index.clear();
        ids.into_iter().map(BreakpointNotification::Removed).collect()
    }

    pub fn set_condition(&mut self, id: BreakpointId, expr: Option<String>) -> Option<BreakpointNotification> {
        self.with_breakpoint_mut(id, |bp| bp.condition = expr)
    }

    pub fn set_enabled(&mut self, id: BreakpointId, enabled: bool) -> Option<BreakpointNotification> {
        self.with_breakpoint_mut(id, |bp| bp.enabled = enabled)
    }

    pub fn set_ignore_to(&mut self, id: BreakpointId, n: u32) -> Option<BreakpointNotification> {
        self.with_breakpoint_mut(id, |bp| bp.ignore_to = n)
    }

    pub fn set_ignore_from(&mut self, id: BreakpointId, n: u32) -> Option<BreakpointNotification> {
        self.with_breakpoint_mut(id, |bp| bp.ignore_from = n)
    }

    fn with_breakpoint_mut(&mut self, id: BreakpointId, f: impl FnOnce(&mut Breakpoint)) -> Option<BreakpointNotification> {
        let file = self.index.get(&id)?;
        let bf = self.files.get_mut(file)?;
        let bp = bf.find_mut(id)?;
        f(bp);
        Some(BreakpointNotification::Changed(id))
    }

    /// §4.4: increments the hit counter and reports whether the plain
    /// counting policy says to halt. Has no opinion on `condition` — the
    /// debugger state machine evaluates that separately (§4.3).
    pub fn hit(&mut self, id: BreakpointId) -> bool {
        let Some(file) = self.index.get(&id) else { return false };
        let Some(bf) = self.files.get_mut(file) else { return false };
        bf.find_mut(id).map(|bp| bp.hit()).unwrap_or(false)
    }

    pub fn lookup(&self, file: &str, line: u32) -> Option<&Breakpoint> {
        self.files.get(file).and_then(|bf| bf.lookup(line))
    }

    pub fn lookup_mut(&mut self, file: &str, line: u32) -> Option<&mut Breakpoint> {
        self.files.get_mut(file).and_then(|bf| bf.lookup_mut(line))
    }

    pub fn file(&self, path: &str) -> Option<&BreakpointFile> {
        self.files.get(path)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &BreakpointFile> {
        self.files.values()
    }
}

const FORMAT_VERSION: u16 = 1;
const FLAG_ENABLED: u8 = 0b0000_0001;

/// Failures while (de)serializing a [`BreakpointFile`] per §6's byte
/// framing. Unlike condition-evaluation failures (swallowed, §7), these are
/// host/storage-layer errors and are surfaced to the caller.
#[derive(Debug, Error)]
pub enum BreakpointCodecError {
    #[error("unsupported breakpoint file format version {0}")]
    UnsupportedVersion(u16),
    #[error("truncated breakpoint stream: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("breakpoint stream contained invalid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl BreakpointFile {
    /// `version(u16), path(utf8), count(u32), [ id(u64), line(u32),
    /// flags(u8), ignore_to(u32), ignore_from(u32), condition(utf8) ]*`
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        write_string(&mut out, &self.path);
        out.extend_from_slice(&(self.breakpoints.len() as u32).to_le_bytes());
        for bp in &self.breakpoints {
            out.extend_from_slice(&bp.id.to_le_bytes());
            out.extend_from_slice(&bp.line.to_le_bytes());
            let flags = if bp.enabled { FLAG_ENABLED } else { 0 };
            out.push(flags);
            out.extend_from_slice(&bp.ignore_to.to_le_bytes());
            out.extend_from_slice(&bp.ignore_from.to_le_bytes());
            write_string(&mut out, bp.condition.as_deref().unwrap_or(""));
        }
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BreakpointCodecError> {
        let mut cursor = Cursor::new(bytes);
        let version = cursor.read_u16()?;
        if version != FORMAT_VERSION {
            return Err(BreakpointCodecError::UnsupportedVersion(version));
        }
        let path = cursor.read_string()?;
        let count = cursor.read_u32()?;
        let mut breakpoints = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = cursor.read_u64()?;
            let line = cursor.read_u32()?;
            let flags = cursor.read_u8()?;
            let ignore_to = cursor.read_u32()?;
            let ignore_from = cursor.read_u32()?;
            let condition_raw = cursor.read_string()?;
            breakpoints.push(Breakpoint {
                id,
                line,
                enabled: flags & FLAG_ENABLED != 0,
                hit_count: 0,
                ignore_to,
                ignore_from,
                condition: if condition_raw.is_empty() { None } else { Some(condition_raw) },
            });
        }
        Ok(BreakpointFile { path, breakpoints })
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BreakpointCodecError> {
        if self.pos + n > self.bytes.len() {
            return Err(BreakpointCodecError::Truncated { expected: n, found: self.bytes.len() - self.pos });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, BreakpointCodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, BreakpointCodecError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn read_u32(&mut self) -> Result<u32, BreakpointCodecError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64, BreakpointCodecError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_string(&mut self) -> Result<String, BreakpointCodecError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let mut store = BreakpointStore::new();
        let (a, _) = store.add("a.py", 1);
        let (b, _) = store.add("a.py", 2);
        assert!(b > a);
    }

    #[test]
    fn hit_respects_enabled_and_thresholds() {
        let mut store = BreakpointStore::new();
        let (id, _) = store.add("a.py", 7);
        store.set_ignore_to(id, 2);
        assert!(!store.hit(id));
        assert!(store.hit(id));
        store.set_enabled(id, false);
        assert!(!store.hit(id));
    }

    #[test]
    fn serialize_round_trips_with_preserved_ids() {
        let mut store = BreakpointStore::new();
        let (id, _) = store.add("file.py", 7);
        store.set_condition(id, Some("i == 5".to_string()));
        store.set_ignore_to(id, 3);
        let bf = store.file("file.py").unwrap().clone();
        let bytes = bf.serialize();
        let restored = BreakpointFile::deserialize(&bytes).unwrap();
        assert_eq!(restored.path, bf.path);
        assert_eq!(restored.breakpoints().len(), 1);
        assert_eq!(restored.breakpoints()[0].id, id);
        assert_eq!(restored.breakpoints()[0].condition.as_deref(), Some("i == 5"));
    }

    #[test]
    fn deserialize_rejects_unknown_version() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&99u16.to_le_bytes());
        let err = BreakpointFile::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, BreakpointCodecError::UnsupportedVersion(99)));
    }

    #[test]
    fn deserialize_rejects_truncated_stream() {
        let bytes = 1u16.to_le_bytes();
        let err = BreakpointFile::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, BreakpointCodecError::Truncated { .. }));
    }
}
