use crate::models::{ChatMessage, ChatSession, Role};
use colored::*;
use std::io::{self, Write};

pub fn print_welcome_banner() {
    println!(
        "{}",
        "Hi there! I'm DASH, your dataset scout. Tell me about your project and the data you need."
            .cyan()
    );
    println!("{}", "Type /help for commands, /exit to quit.".dimmed());
    println!();
}

pub fn print_chat_help() {
    println!("{}", "Commands:".bold());
    println!("{}", "  /new        Start a new conversation".dimmed());
    println!("{}", "  /sessions   List saved conversations".dimmed());
    println!("{}", "  /help       Show this help".dimmed());
    println!("{}", "  /exit       Leave the chat".dimmed());
}

/// Print one message. Sources and tools of an assistant reply are shown
/// separately when the structured result is known.
pub fn display_message(message: &ChatMessage) {
    match message.role {
        Role::User => {
            println!("{} {}", "you>".green().bold(), message.content);
        }
        Role::Assistant => match &message.result {
            Some(result) => {
                if let Some(summary) = result.summary.as_deref() {
                    println!("{}", summary);
                }
                if let Some(relevancy) = result.relevancy_explained.as_deref() {
                    println!();
                    println!("{} {}", "Why it's relevant:".bold(), relevancy);
                }
                if !result.sources.is_empty() {
                    println!("{}", "\n---\nSources:".dimmed());
                    for (index, source) in result.sources.iter().enumerate() {
                        println!("{}", format!("[{}] {}", index + 1, source).cyan());
                    }
                }
                if !result.tools_used.is_empty() {
                    println!(
                        "{}",
                        format!("Tools used: {}", result.tools_used.join(", ")).dimmed()
                    );
                }
            }
            None => println!("{}", message.content),
        },
    }
}

/// Print the part of `so_far` that has not been shown yet. Returns the new
/// printed length.
pub fn display_streaming_update(printed: usize, so_far: &str) -> usize {
    if let Some(rest) = so_far.get(printed..) {
        print!("{}", rest);
        let _ = io::stdout().flush();
    }
    so_far.len()
}

pub fn display_session_list(sessions: &[ChatSession]) {
    if sessions.is_empty() {
        println!("{}", "No saved conversations.".dimmed());
        return;
    }

    for session in sessions {
        let title = if session.title.is_empty() {
            "(untitled)"
        } else {
            session.title.as_str()
        };
        println!(
            "{}  {}  {}",
            session.id.yellow(),
            session
                .updated_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed(),
            title
        );
    }
}

pub fn display_session(session: &ChatSession) {
    println!("{}", session.title.bold());
    println!("{}", format!("{} messages", session.messages.len()).dimmed());
    println!();
    for message in &session.messages {
        display_message(message);
        println!();
    }
}
