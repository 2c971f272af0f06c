//! Hand-rolled test double for the debug target.
//!
//! `FakeTarget` answers every `DebugTarget` call from in-memory tables,
//! records the call order, and can gate `fetch_frames` behind a
//! semaphore so tests control exactly when a pause's frame fetch
//! resolves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use rewind_core::events::PointDescription;
use rewind_core::target::DebugTarget;
use rewind_core::{
    Error, Frame, Location, MessageLevel, RawConsoleMessage, Result, Scope, ScopeKind,
};

/// A console message with only the fields every test needs.
pub fn raw_message(text: &str) -> RawConsoleMessage {
    RawConsoleMessage {
        source: "ConsoleAPI".into(),
        level: MessageLevel::Info,
        text: text.into(),
        url: None,
        script_id: None,
        line: None,
        column: None,
        point: PointDescription {
            point: "1".into(),
            time: 0.0,
            frame: None,
        },
        argument_values: Vec::new(),
        stack: None,
    }
}

pub fn frame(id: &str, script: &str, line: u32) -> Frame {
    Frame {
        frame_id: id.into(),
        function_name: Some(format!("fn_{id}")),
        location: Location::new(script, line, 0),
    }
}

pub fn scope(id: &str) -> Scope {
    Scope {
        scope_id: id.into(),
        kind: ScopeKind::Function,
        bindings: Vec::new(),
    }
}

pub struct FakeTarget {
    /// Frame lists returned by successive `fetch_frames` calls; the last
    /// list is reused once the script runs out.
    frame_lists: Mutex<Vec<Vec<Frame>>>,
    frame_calls: AtomicUsize,
    /// One permit is consumed per `fetch_frames` call.
    pub frames_gate: Semaphore,
    fail_frames: AtomicBool,

    scopes: Mutex<HashMap<String, Vec<Scope>>>,
    fail_scopes: AtomicBool,

    url_by_id: Mutex<HashMap<String, String>>,
    ids_by_url: Mutex<HashMap<String, Vec<String>>>,

    /// Location overrides keyed by `"script:line:column"`; identity when absent.
    location_map: Mutex<HashMap<String, Location>>,
    fail_locations: AtomicBool,

    /// Expression → outcome; missing expressions evaluate to null.
    eval_outcomes: Mutex<HashMap<String, std::result::Result<Value, String>>>,

    removed_breakpoints: Mutex<Vec<String>>,
    fail_remove_breakpoint: AtomicBool,

    /// Every call in arrival order, e.g. `"fetch_frames"`, `"evaluate:x"`.
    calls: Mutex<Vec<String>>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self {
            frame_lists: Mutex::new(Vec::new()),
            frame_calls: AtomicUsize::new(0),
            frames_gate: Semaphore::new(Semaphore::MAX_PERMITS),
            fail_frames: AtomicBool::new(false),
            scopes: Mutex::new(HashMap::new()),
            fail_scopes: AtomicBool::new(false),
            url_by_id: Mutex::new(HashMap::new()),
            ids_by_url: Mutex::new(HashMap::new()),
            location_map: Mutex::new(HashMap::new()),
            fail_locations: AtomicBool::new(false),
            eval_outcomes: Mutex::new(HashMap::new()),
            removed_breakpoints: Mutex::new(Vec::new()),
            fail_remove_breakpoint: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A target whose `fetch_frames` blocks until permits are added to
    /// [`frames_gate`](Self::frames_gate).
    pub fn with_gated_frames() -> Self {
        let target = Self::new();
        // Drain the gate: each fetch must now be released explicitly.
        target.frames_gate.forget_permits(Semaphore::MAX_PERMITS);
        target
    }

    // ── configuration ────────────────────────────────────────────────

    pub fn push_frame_list(&self, frames: Vec<Frame>) {
        self.frame_lists.lock().unwrap().push(frames);
    }

    pub fn set_scopes(&self, frame_id: &str, scopes: Vec<Scope>) {
        self.scopes.lock().unwrap().insert(frame_id.into(), scopes);
    }

    pub fn add_script(&self, script_id: &str, url: &str) {
        self.url_by_id
            .lock()
            .unwrap()
            .insert(script_id.into(), url.into());
        self.ids_by_url
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push(script_id.into());
    }

    pub fn map_location(&self, from: &Location, to: Location) {
        self.location_map
            .lock()
            .unwrap()
            .insert(location_key(from), to);
    }

    pub fn set_eval(&self, expression: &str, outcome: std::result::Result<Value, String>) {
        self.eval_outcomes
            .lock()
            .unwrap()
            .insert(expression.into(), outcome);
    }

    pub fn fail_frames(&self, fail: bool) {
        self.fail_frames.store(fail, Ordering::SeqCst);
    }

    pub fn fail_scopes(&self, fail: bool) {
        self.fail_scopes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_locations(&self, fail: bool) {
        self.fail_locations.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove_breakpoint(&self, fail: bool) {
        self.fail_remove_breakpoint.store(fail, Ordering::SeqCst);
    }

    // ── inspection ───────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first call matching `name`, panicking when absent.
    pub fn call_index(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .position(|c| c == name || c.starts_with(&format!("{name}:")))
            .unwrap_or_else(|| panic!("no call matching {name:?} in {:?}", self.calls()))
    }

    pub fn removed_breakpoints(&self) -> Vec<String> {
        self.removed_breakpoints.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl Default for FakeTarget {
    fn default() -> Self {
        Self::new()
    }
}

fn location_key(location: &Location) -> String {
    format!(
        "{}:{}:{}",
        location.script_id, location.line, location.column
    )
}

impl DebugTarget for FakeTarget {
    async fn fetch_frames(&self) -> Result<Vec<Frame>> {
        self.record("fetch_frames");
        let permit = self
            .frames_gate
            .acquire()
            .await
            .map_err(|_| Error::target("frames gate closed"))?;
        permit.forget();

        if self.fail_frames.load(Ordering::SeqCst) {
            return Err(Error::target("frames unavailable"));
        }

        let index = self.frame_calls.fetch_add(1, Ordering::SeqCst);
        let lists = self.frame_lists.lock().unwrap();
        Ok(lists
            .get(index)
            .or_else(|| lists.last())
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_scopes(&self, frame_id: &str) -> Result<Vec<Scope>> {
        self.record(format!("fetch_scopes:{frame_id}"));
        if self.fail_scopes.load(Ordering::SeqCst) {
            return Err(Error::target("scopes unavailable"));
        }
        Ok(self
            .scopes
            .lock()
            .unwrap()
            .get(frame_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn preferred_location(&self, raw: &Location) -> Result<Location> {
        self.record(format!("preferred_location:{}", location_key(raw)));
        if self.fail_locations.load(Ordering::SeqCst) {
            return Err(Error::target("no mapping"));
        }
        Ok(self
            .location_map
            .lock()
            .unwrap()
            .get(&location_key(raw))
            .cloned()
            .unwrap_or_else(|| raw.clone()))
    }

    async fn preferred_mapped_location(&self, raw: &Location) -> Result<Location> {
        self.record(format!("preferred_mapped_location:{}", location_key(raw)));
        if self.fail_locations.load(Ordering::SeqCst) {
            return Err(Error::target("no mapping"));
        }
        Ok(self
            .location_map
            .lock()
            .unwrap()
            .get(&location_key(raw))
            .cloned()
            .unwrap_or_else(|| raw.clone()))
    }

    async fn evaluate(&self, frame_id: &str, expression: &str) -> Result<Value> {
        self.record(format!("evaluate:{frame_id}:{expression}"));
        match self.eval_outcomes.lock().unwrap().get(expression) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(Error::evaluation(message.clone())),
            None => Ok(json!(null)),
        }
    }

    async fn remove_breakpoint(&self, breakpoint_id: &str) -> Result<()> {
        self.record(format!("remove_breakpoint:{breakpoint_id}"));
        if self.fail_remove_breakpoint.load(Ordering::SeqCst) {
            return Err(Error::target("breakpoint not found"));
        }
        self.removed_breakpoints
            .lock()
            .unwrap()
            .push(breakpoint_id.into());
        Ok(())
    }

    fn record_script(&self, script_id: &str, url: Option<&str>) {
        if let Some(url) = url {
            self.add_script(script_id, url);
        }
    }

    fn script_url(&self, script_id: &str) -> Option<String> {
        self.url_by_id.lock().unwrap().get(script_id).cloned()
    }

    fn script_ids_for_url(&self, url: &str) -> Vec<String> {
        self.ids_by_url
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default()
    }
}
