use async_trait::async_trait;
use colored::*;
use lounge_core::{ChatBody, ChatMessage, Identity, TrackId};
use lounge_peer::{ConnectionState, ParticipantBehavior, SinkInfo, ViewerStatus};

/// Prints lounge activity to the terminal.
pub struct TerminalBehavior;

fn paint(identity: &Identity) -> ColoredString {
    let hex = identity.color.trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());

    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => identity.display_name.truecolor(r, g, b).bold(),
        _ => identity.display_name.bold(),
    }
}

#[async_trait]
impl ParticipantBehavior for TerminalBehavior {
    async fn on_status(&self, status: ViewerStatus) {
        let text = format!("* {status}");
        if status.is_terminal() {
            println!("{}", text.red());
        } else {
            println!("{}", text.cyan());
        }
    }

    async fn on_peer_state(&self, viewer: &Identity, state: ConnectionState) {
        println!("{} {} {}", "*".dimmed(), paint(viewer), state.to_string().dimmed());
    }

    async fn on_chat(&self, message: &ChatMessage) {
        if let ChatBody::Text { body } = &message.body {
            println!("[{}] {}: {}", message.sender.initials(), paint(&message.sender), body);
        }
    }

    async fn on_roster(&self, roster: &[Identity]) {
        let names: Vec<String> = roster.iter().map(|p| paint(p).to_string()).collect();
        println!("{} {}", "* in the lounge:".cyan(), names.join(", "));
    }

    async fn on_track_added(&self, viewer: &Identity, sink: &SinkInfo) {
        println!("{} {} {:?} track {}", "+".green(), paint(viewer), sink.kind, sink.track_id);
    }

    async fn on_track_removed(&self, viewer: &Identity, track_id: &TrackId) {
        println!("{} {} track {}", "-".red(), paint(viewer), track_id);
    }
}
