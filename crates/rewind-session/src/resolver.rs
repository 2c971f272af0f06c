//! Location resolution — mapping raw locations to preferred positions.
//!
//! All lookups are best-effort: a failed or ambiguous mapping degrades
//! to whatever raw data the caller supplied, never to an error. Message
//! display must not block on an unmapped location.

use futures_util::future::join_all;

use rewind_core::prelude::*;
use rewind_core::target::DebugTarget;
use rewind_core::{
    Frame, Location, RawConsoleMessage, RawStackFrame, SourcePosition, StackFrame,
};

/// Resolve one raw frame location to its preferred source position.
///
/// Falls back to the raw location (with a url lookup on its script id)
/// when the target cannot map it.
pub async fn resolve_frame_position<T>(target: &T, raw: &Location) -> SourcePosition
where
    T: DebugTarget + Sync,
{
    let location = match target.preferred_location(raw).await {
        Ok(mapped) => mapped,
        Err(err) => {
            debug!("preferred location lookup failed, using raw: {}", err);
            raw.clone()
        }
    };
    let url = target.script_url(&location.script_id);
    SourcePosition::resolved(url, location.script_id.clone(), location.line, location.column)
}

/// Resolve the preferred positions of every frame, preserving frame order.
pub async fn resolve_frame_positions<T>(target: &T, frames: &[Frame]) -> Vec<SourcePosition>
where
    T: DebugTarget + Sync,
{
    join_all(
        frames
            .iter()
            .map(|frame| resolve_frame_position(target, &frame.location)),
    )
    .await
}

/// Resolve a console message's stack trace, preserving frame order.
///
/// Per-frame resolutions run concurrently; the output order is the
/// input order regardless of completion order.
pub async fn resolve_stack<T>(target: &T, stack: &[RawStackFrame]) -> Vec<StackFrame>
where
    T: DebugTarget + Sync,
{
    join_all(stack.iter().map(|frame| async {
        let position = resolve_frame_position(target, &frame.location).await;
        StackFrame {
            filename: position.url,
            script_id: position
                .script_id
                .unwrap_or_else(|| frame.location.script_id.clone()),
            line: position.line.unwrap_or(frame.location.line),
            column: position.column.unwrap_or(frame.location.column),
            function_name: frame.function_name.clone(),
        }
    }))
    .await
}

/// Resolve the primary source position of a console message.
///
/// An execution-point-scoped frame location always wins over the
/// message's own url/line/column: it reflects actual source-mapped
/// control flow, the message properties do not.
///
/// Without a frame location, a url naming exactly one known script is
/// mapped through that script id; zero or several matches leave the
/// position unmapped rather than guessing.
pub async fn resolve_message_position<T>(target: &T, msg: &RawConsoleMessage) -> SourcePosition
where
    T: DebugTarget + Sync,
{
    if let Some(frame) = &msg.point.frame {
        return resolve_frame_position(target, frame).await;
    }

    let script_id = match &msg.script_id {
        Some(id) => Some(id.clone()),
        None => msg.url.as_deref().and_then(|url| {
            let ids = target.script_ids_for_url(url);
            if ids.len() == 1 {
                ids.into_iter().next()
            } else {
                // Zero or several candidate scripts: ambiguous, leave unmapped.
                None
            }
        }),
    };

    let Some(script_id) = script_id else {
        return SourcePosition::unresolved(msg.url.clone(), msg.line, msg.column);
    };

    let raw = Location::new(script_id, msg.line.unwrap_or(1), msg.column.unwrap_or(0));
    let location = match target.preferred_mapped_location(&raw).await {
        Ok(mapped) => mapped,
        Err(err) => {
            debug!("mapped location lookup failed, using raw: {}", err);
            raw
        }
    };

    let url = target.script_url(&location.script_id).or_else(|| msg.url.clone());
    SourcePosition::resolved(url, location.script_id.clone(), location.line, location.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{raw_message, FakeTarget};
    use rewind_core::events::PointDescription;

    fn frame(id: &str, script: &str, line: u32) -> RawStackFrame {
        RawStackFrame {
            frame_id: id.into(),
            function_name: Some(format!("fn_{id}")),
            location: Location::new(script, line, 0),
        }
    }

    #[tokio::test]
    async fn test_stack_resolution_preserves_order() {
        let target = FakeTarget::new();
        target.add_script("1", "https://example.com/a.js");
        target.add_script("2", "https://example.com/b.js");

        let stack = vec![frame("f0", "1", 10), frame("f1", "2", 20), frame("f2", "1", 30)];
        let resolved = resolve_stack(&target, &stack).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].function_name.as_deref(), Some("fn_f0"));
        assert_eq!(resolved[0].filename.as_deref(), Some("https://example.com/a.js"));
        assert_eq!(resolved[1].line, 20);
        assert_eq!(resolved[2].script_id, "1");
    }

    #[tokio::test]
    async fn test_point_frame_wins_over_message_fields() {
        let target = FakeTarget::new();
        target.add_script("7", "https://example.com/mapped.js");

        let mut msg = raw_message("hello");
        msg.url = Some("https://example.com/raw.js".into());
        msg.line = Some(99);
        msg.point = PointDescription {
            point: "5".into(),
            time: 1.0,
            frame: Some(Location::new("7", 12, 3)),
        };

        let position = resolve_message_position(&target, &msg).await;
        assert_eq!(position.url.as_deref(), Some("https://example.com/mapped.js"));
        assert_eq!(position.line, Some(12));
        assert_eq!(position.column, Some(3));
    }

    #[tokio::test]
    async fn test_unique_url_match_is_mapped() {
        let target = FakeTarget::new();
        target.add_script("3", "https://example.com/app.js");

        let mut msg = raw_message("hello");
        msg.url = Some("https://example.com/app.js".into());
        msg.line = Some(8);
        msg.column = Some(2);

        let position = resolve_message_position(&target, &msg).await;
        assert_eq!(position.script_id.as_deref(), Some("3"));
        assert_eq!(position.line, Some(8));
    }

    #[tokio::test]
    async fn test_ambiguous_url_is_left_unmapped() {
        let target = FakeTarget::new();
        target.add_script("3", "https://example.com/app.js");
        target.add_script("4", "https://example.com/app.js");

        let mut msg = raw_message("hello");
        msg.url = Some("https://example.com/app.js".into());
        msg.line = Some(8);

        let position = resolve_message_position(&target, &msg).await;
        assert!(position.script_id.is_none());
        assert_eq!(position.url.as_deref(), Some("https://example.com/app.js"));
        assert_eq!(position.line, Some(8));
    }

    #[tokio::test]
    async fn test_unknown_url_is_left_unmapped() {
        let target = FakeTarget::new();

        let mut msg = raw_message("hello");
        msg.url = Some("https://example.com/nowhere.js".into());

        let position = resolve_message_position(&target, &msg).await;
        assert!(position.script_id.is_none());
        assert_eq!(position.url.as_deref(), Some("https://example.com/nowhere.js"));
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_raw() {
        let target = FakeTarget::new();
        target.add_script("7", "https://example.com/app.js");
        target.fail_locations(true);

        let mut msg = raw_message("hello");
        msg.point = PointDescription {
            point: "5".into(),
            time: 1.0,
            frame: Some(Location::new("7", 12, 3)),
        };

        let position = resolve_message_position(&target, &msg).await;
        // Mapping failed but the raw frame location still names the message.
        assert_eq!(position.script_id.as_deref(), Some("7"));
        assert_eq!(position.line, Some(12));
        assert_eq!(position.url.as_deref(), Some("https://example.com/app.js"));
    }
}
