//! Headless follower — attaches to a target and prints session events.

use std::sync::Arc;

use rewind_core::prelude::*;
use rewind_core::ConsoleMessagePacket;
use rewind_session::{ConsoleStore, DebugSession, SessionEvent};
use rewind_target::{ClientEvent, TargetClient, TargetSession};

use crate::config::Settings;

/// Attach to the target at `ws_uri` and follow it until it disconnects
/// or the user interrupts.
pub async fn run_follow(ws_uri: &str, settings: &Settings) -> Result<()> {
    let mut client = TargetClient::connect(ws_uri).await?;
    let target = Arc::new(TargetSession::new(client.request_handle()));

    for error in target.listen().await {
        warn!("stream subscription failed: {}", error);
    }

    let (session, mut events) = DebugSession::new(Arc::clone(&target), "main");
    let mut store = ConsoleStore::new(settings.max_messages);

    info!("attached to {}", ws_uri);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, detaching");
                break;
            }

            client_event = client.event_receiver().recv() => match client_event {
                Some(ClientEvent::Notification(notification)) => {
                    session.handle_notification(notification).await;
                }
                Some(ClientEvent::Disconnected) | None => {
                    eprintln!("target disconnected");
                    break;
                }
            },

            session_event = events.recv() => match session_event {
                Some(event) => print_event(&mut store, event, settings),
                None => break,
            },
        }
    }

    client.disconnect().await;
    session.shutdown().await;

    eprintln!(
        "followed {} message(s), {} error(s)",
        store.len(),
        store.error_count()
    );
    Ok(())
}

fn print_event(store: &mut ConsoleStore, event: SessionEvent, settings: &Settings) {
    match event {
        SessionEvent::MessageBatch(batch) => {
            for packet in &batch {
                print_packet(packet, settings);
            }
            store.add_batch(batch);
        }
        SessionEvent::MessagesCleared => {
            store.clear();
            println!("--- console cleared ---");
        }
        SessionEvent::LogpointCleared { log_group_id } => {
            store.clear_log_group(&log_group_id);
        }
        SessionEvent::PauseHydrated {
            frames, selected, ..
        } => {
            let position = selected
                .as_ref()
                .and_then(|s| {
                    let name = s.display_name()?;
                    Some(format!("{}:{}", name, s.line.unwrap_or(0)))
                })
                .unwrap_or_else(|| "<unknown>".to_string());
            println!("--- paused at {} ({} frames) ---", position, frames.len());
        }
        SessionEvent::PauseFailed { error, .. } => {
            eprintln!("--- pause hydration failed: {} ---", error);
        }
        other => {
            debug!("unrendered session event: {}", other.kind());
        }
    }
}

fn print_packet(packet: &ConsoleMessagePacket, settings: &Settings) {
    if settings.json_output {
        match serde_json::to_string(packet) {
            Ok(line) => println!("{}", line),
            Err(err) => warn!("failed to serialize packet: {}", err),
        }
        return;
    }

    let source = packet
        .position
        .display_name()
        .map(|name| format!("{}:{}", name, packet.position.line.unwrap_or(0)))
        .unwrap_or_else(|| "<unknown>".to_string());

    let mut line = String::new();
    if settings.show_timestamps {
        line.push_str(&packet.received_at.format("%H:%M:%S%.3f ").to_string());
    }
    line.push_str(&format!("[{}] {} {}", packet.level.label(), source, packet.text));
    if !packet.argument_values.is_empty() {
        let values: Vec<String> = packet
            .argument_values
            .iter()
            .map(|v| v.to_string())
            .collect();
        line.push_str(&format!(" {}", values.join(" ")));
    }
    println!("{}", line);
}
