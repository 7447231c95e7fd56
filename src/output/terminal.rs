// Colored terminal output for keyword annotations and live trend events.
//
// `extract` prints per-token classifications through `display_annotations`.
// Without the web feature, `run` publishes into a `TerminalSink` so the
// trends still show up somewhere.

use colored::Colorize;

use crate::broadcast::{BroadcastSink, ConnectionStatus, SinkEvent};
use crate::lexicon::heuristic::{Classification, WordClass};
use crate::ranking::frequency::RankedWord;

use super::truncate_chars;

/// How many ranking rows the terminal sink prints.
const TERMINAL_RANKING_ROWS: usize = 10;

/// Display the segmented tokens of one text and what became of each.
pub fn display_annotations(text: &str, cleaned: &str, tokens: &[(String, Option<Classification>)]) {
    println!("\n{}", "=== Keyword Extraction ===".bold());
    println!("  {} {}", "Input:  ".dimmed(), text);
    println!("  {} {}", "Cleaned:".dimmed(), cleaned);
    println!();

    if tokens.is_empty() {
        println!("  No tokens.");
        return;
    }

    println!(
        "  {:<16} {:<10} {}",
        "Token".dimmed(),
        "Class".dimmed(),
        "Evidence".dimmed()
    );
    println!("  {}", "-".repeat(44).dimmed());

    for (token, classification) in tokens {
        match classification {
            Some(c) => println!(
                "  {:<16} {:<10} {}",
                token,
                colorize_class(c.class),
                c.evidence
            ),
            None => println!("  {:<16} {}", token.dimmed(), "rejected".dimmed()),
        }
    }

    let kept = tokens.iter().filter(|(_, c)| c.is_some()).count();
    println!("\n  {kept} of {} tokens kept as keywords", tokens.len());
}

/// Print a compact ranking table.
pub fn display_ranking(entries: &[RankedWord]) {
    if entries.is_empty() {
        println!("  {}", "(no keywords yet)".dimmed());
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("  {:>3}. {:<20} {:>6}", i + 1, entry.word, entry.count);
    }
}

fn colorize_class(class: WordClass) -> colored::ColoredString {
    let label = class.to_string();
    match class {
        WordClass::Noun => label.green(),
        WordClass::Verb => label.cyan(),
        WordClass::Adjective => label.yellow(),
    }
}

/// Prints ingestion events to stdout.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl BroadcastSink for TerminalSink {
    fn publish(&self, event: SinkEvent) {
        match event {
            SinkEvent::Keyword(k) => {
                let who = k.author.as_deref().unwrap_or("?");
                println!(
                    "{} @{}: {}",
                    "+".green(),
                    who,
                    truncate_chars(&k.text, 60).dimmed()
                );
                println!("    {}", k.keywords.join(" ").bold());
            }
            SinkEvent::Ranking(r) => {
                println!("\n{}", "=== Trending ===".bold());
                let rows = r.entries.len().min(TERMINAL_RANKING_ROWS);
                display_ranking(&r.entries[..rows]);
                println!();
            }
            SinkEvent::Connection(c) => match c.status {
                ConnectionStatus::Connected => println!("{} {}", "●".green(), c.message),
                ConnectionStatus::Disconnected => {
                    println!("{} {}", "●".red(), c.message.yellow())
                }
            },
            SinkEvent::Stats(s) => println!(
                "{}",
                format!(
                    "processed {} records in {}s (attempts: {})",
                    s.processed_total, s.uptime_seconds, s.attempt_count
                )
                .dimmed()
            ),
        }
    }
}
