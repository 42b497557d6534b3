//! Log formatting and console output
//!
//! Handles colorized tag/level columns, wrapping long messages at word
//! boundaries, and broken pipes when stdout is piped into another command.

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 7;
const BRACKET_SPACE_WIDTH: usize = 3;
const TOTAL_PREFIX_WIDTH: usize = TAG_WIDTH + LEVEL_WIDTH + BRACKET_SPACE_WIDTH * 2;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 160;

pub fn format_and_log(tag: &LogTag, level: LogLevel, message: &str, use_colors: bool) {
    let time = Local::now().format("%H:%M:%S").to_string();
    let chunks = wrap_text(message, MAX_LINE_LENGTH - TOTAL_PREFIX_WIDTH - time.len() - 1);

    let (prefix, tag_str, level_str) = if use_colors {
        (
            time.dimmed().to_string(),
            format_tag(tag).to_string(),
            format_level(level).to_string(),
        )
    } else {
        (
            time.clone(),
            format!("{:<width$}", tag.label(), width = TAG_WIDTH),
            format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH),
        )
    };

    print_stdout_safe(&format!(
        "{} [{}] [{}] {}",
        prefix, tag_str, level_str, chunks[0]
    ));

    if chunks.len() > 1 {
        let continuation = " ".repeat(time.len() + 1 + TOTAL_PREFIX_WIDTH);
        for chunk in &chunks[1..] {
            print_stdout_safe(&format!("{}{}", continuation, chunk));
        }
    }
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.label(), width = TAG_WIDTH);
    match tag {
        LogTag::System => padded.bright_yellow().bold(),
        LogTag::Config => padded.bright_white().bold(),
        LogTag::Api => padded.bright_purple().bold(),
        LogTag::RateLimit => padded.bright_red().bold(),
        LogTag::Cache => padded.bright_cyan().bold(),
        LogTag::Aggregator => padded.bright_green().bold(),
        LogTag::Pagination => padded.bright_blue().bold(),
        LogTag::Broadcast => padded.bright_magenta().bold(),
        LogTag::Service => padded.bright_yellow().bold(),
        LogTag::Webserver => padded.bright_green().bold(),
        LogTag::Websocket => padded.bright_cyan().bold(),
        LogTag::External => padded.white().dimmed(),
        LogTag::Other(_) => padded.white().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let padded = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => padded.bright_red().bold(),
        LogLevel::Warning => padded.bright_yellow().bold(),
        LogLevel::Info => padded.white().bold(),
        LogLevel::Debug | LogLevel::Verbose => padded.dimmed(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
    if let Err(e) = out.flush() {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

/// Wrap text at word boundaries, respecting existing newlines
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(20);
    let mut result = Vec::new();

    for line in text.split('\n') {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current_line = String::new();
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current_line.chars().count();

            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                result.extend(break_long_word(word, max_width));
            } else if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_len + word_len + 1 <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }

    result
}

/// Break a very long word (URLs, JSON blobs) into fixed-width chunks
fn break_long_word(word: &str, max_width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
