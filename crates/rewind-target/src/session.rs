//! Typed operations over the raw RPC connection.
//!
//! [`TargetSession`] wraps a [`RequestHandle`] with the typed calls the
//! session layer consumes, and owns the script index built from
//! `Debugger.scriptParsed` notifications.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use rewind_core::prelude::*;
use rewind_core::target::DebugTarget;
use rewind_core::{Frame, Location, Scope};

use super::client::RequestHandle;

// ---------------------------------------------------------------------------
// Script index
// ---------------------------------------------------------------------------

/// Bidirectional url ↔ script-id index.
///
/// Several scripts can share one URL (e.g. the same source loaded into
/// multiple iframes), so the url side maps to a list.
#[derive(Debug, Default)]
pub struct ScriptIndex {
    url_by_id: HashMap<String, String>,
    ids_by_url: HashMap<String, Vec<String>>,
}

impl ScriptIndex {
    pub fn add(&mut self, script_id: &str, url: &str) {
        if self
            .url_by_id
            .insert(script_id.to_string(), url.to_string())
            .is_none()
        {
            self.ids_by_url
                .entry(url.to_string())
                .or_default()
                .push(script_id.to_string());
        }
    }

    pub fn url_of(&self, script_id: &str) -> Option<String> {
        self.url_by_id.get(script_id).cloned()
    }

    pub fn ids_for(&self, url: &str) -> Vec<String> {
        self.ids_by_url.get(url).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.url_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.url_by_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TargetSession
// ---------------------------------------------------------------------------

/// Typed view of one attached debug target.
pub struct TargetSession {
    handle: RequestHandle,
    scripts: RwLock<ScriptIndex>,
}

#[derive(Deserialize)]
struct FramesResult {
    frames: Vec<Frame>,
}

#[derive(Deserialize)]
struct ScopesResult {
    scopes: Vec<Scope>,
}

#[derive(Deserialize)]
struct LocationResult {
    location: Location,
}

#[derive(Deserialize)]
struct EvaluateResult {
    #[serde(default)]
    returned: Option<Value>,
    #[serde(default)]
    exception: Option<String>,
}

impl TargetSession {
    pub fn new(handle: RequestHandle) -> Self {
        Self {
            handle,
            scripts: RwLock::new(ScriptIndex::default()),
        }
    }

    /// Subscribe to the notification streams the session consumes.
    ///
    /// Returns a list of human-readable error descriptions for any
    /// streams that could not be subscribed (non-fatal — the session
    /// continues without them).
    pub async fn listen(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for stream in ["Scripts", "Pauses", "Console", "Logpoints"] {
            if let Err(e) = self
                .handle
                .request("Session.listen", Some(json!({ "stream": stream })))
                .await
            {
                errors.push(format!("{stream} stream: {e}"));
            }
        }

        errors
    }

    /// Number of scripts currently known to the index.
    pub fn script_count(&self) -> usize {
        self.scripts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn typed_request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let result = self.handle.request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| Error::target(format!("parse {method} response: {e}")))
    }
}

impl DebugTarget for TargetSession {
    async fn fetch_frames(&self) -> Result<Vec<Frame>> {
        let result: FramesResult = self.typed_request("Pause.getAllFrames", None).await?;
        Ok(result.frames)
    }

    async fn fetch_scopes(&self, frame_id: &str) -> Result<Vec<Scope>> {
        let result: ScopesResult = self
            .typed_request("Pause.getScope", Some(json!({ "frameId": frame_id })))
            .await?;
        Ok(result.scopes)
    }

    async fn preferred_location(&self, raw: &Location) -> Result<Location> {
        let result: LocationResult = self
            .typed_request(
                "Source.getPreferredLocation",
                Some(json!({ "location": raw })),
            )
            .await?;
        Ok(result.location)
    }

    async fn preferred_mapped_location(&self, raw: &Location) -> Result<Location> {
        let result: LocationResult = self
            .typed_request("Source.getMappedLocation", Some(json!({ "location": raw })))
            .await?;
        Ok(result.location)
    }

    async fn evaluate(&self, frame_id: &str, expression: &str) -> Result<Value> {
        let result: EvaluateResult = self
            .typed_request(
                "Pause.evaluateInFrame",
                Some(json!({ "frameId": frame_id, "expression": expression })),
            )
            .await?;
        if let Some(exception) = result.exception {
            return Err(Error::evaluation(exception));
        }
        Ok(result.returned.unwrap_or(Value::Null))
    }

    async fn remove_breakpoint(&self, breakpoint_id: &str) -> Result<()> {
        self.handle
            .request(
                "Debugger.removeBreakpoint",
                Some(json!({ "breakpointId": breakpoint_id })),
            )
            .await?;
        Ok(())
    }

    fn record_script(&self, script_id: &str, url: Option<&str>) {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            // Inline/eval scripts have no URL; nothing to index.
            return;
        };
        match self.scripts.write() {
            Ok(mut index) => index.add(script_id, url),
            Err(poisoned) => {
                warn!("script index lock poisoned; recovering");
                poisoned.into_inner().add(script_id, url);
            }
        }
    }

    fn script_url(&self, script_id: &str) -> Option<String> {
        self.scripts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .url_of(script_id)
    }

    fn script_ids_for_url(&self, url: &str) -> Vec<String> {
        self.scripts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .ids_for(url)
    }
}
