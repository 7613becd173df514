use std::io::IsTerminal;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;

use copilot_history_sessions::{
    format_timestamp, ConversationMessage, QueryOutcome, Role, SearchQuery, SearchResult,
    SessionHistory, SessionListing, SessionStats, ToolUsage,
};

use crate::config::HistoryConfig;

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Search all sessions with a regular expression
    Search {
        /// Pattern to search for
        query: String,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// Only search events of this type (e.g. user.message)
        #[arg(long)]
        event_type: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the most recent sessions
    List {
        /// Number of sessions to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the conversation of a session
    Show {
        /// Session ID or part of it (launches interactive picker if omitted)
        session: Option<String>,

        /// Include tool calls and their results
        #[arg(long)]
        tool_calls: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find messages referencing a file path
    Files {
        /// Path or part of a path
        path: String,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tool invocations
    Tools {
        /// Tool name or part of it (all tools if omitted)
        name: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_history_command(
    action: HistoryAction,
    history: &SessionHistory,
    config: &HistoryConfig,
) -> Result<()> {
    let store = history.store();

    match action {
        HistoryAction::Search {
            query,
            case_sensitive,
            event_type,
            max_results,
            json,
        } => {
            let max_results = max_results.unwrap_or_else(|| config.max_results());
            if json {
                print_json(&history.search_sessions(
                    &query,
                    case_sensitive,
                    event_type.as_deref(),
                    max_results,
                ))?;
            } else {
                let outcome = store.search(&SearchQuery {
                    pattern: query,
                    case_sensitive,
                    event_type,
                    max_results,
                });
                print_outcome(outcome, print_search_results);
            }
        }
        HistoryAction::List { limit, json } => {
            let limit = limit.unwrap_or_else(|| config.list_limit());
            if json {
                print_json(&history.list_recent_sessions(limit))?;
            } else {
                print_outcome(
                    store.recent_sessions(limit, history.titles()),
                    print_sessions_table,
                );
            }
        }
        HistoryAction::Stats { json } => {
            if json {
                print_json(&history.get_session_stats())?;
            } else {
                match store.stats() {
                    Ok(stats) => print_stats(&stats),
                    Err(error) => print_error(&error),
                }
            }
        }
        HistoryAction::Show {
            session,
            tool_calls,
            json,
        } => {
            let session = match session {
                Some(session) => session,
                None => pick_session(history, config)?,
            };
            if json {
                print_json(&history.get_session_conversation(&session, tool_calls))?;
            } else {
                print_outcome(
                    store.conversation(&session, tool_calls),
                    print_conversation,
                );
            }
        }
        HistoryAction::Files {
            path,
            max_results,
            json,
        } => {
            let max_results = max_results.unwrap_or_else(|| config.max_results());
            if json {
                print_json(&history.search_by_file_path(&path, max_results))?;
            } else {
                print_outcome(
                    store.search_by_file_path(&path, max_results),
                    print_search_results,
                );
            }
        }
        HistoryAction::Tools {
            name,
            max_results,
            json,
        } => {
            let max_results = max_results.unwrap_or_else(|| config.max_results());
            if json {
                print_json(&history.search_tool_usage(name.as_deref(), max_results))?;
            } else {
                print_outcome(
                    store.search_tool_usage(name.as_deref(), max_results),
                    print_tool_usage,
                );
            }
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_outcome<T>(outcome: QueryOutcome<T>, print: fn(&[T])) {
    match outcome {
        QueryOutcome::Found(items) => print(&items),
        QueryOutcome::Empty(message) => println!("{}", message.dimmed()),
        QueryOutcome::Failed(error) => print_error(&error),
    }
}

fn print_error(error: &dyn std::fmt::Display) {
    eprintln!("{} {}", "error:".bright_red().bold(), error);
}

fn pick_session(history: &SessionHistory, config: &HistoryConfig) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("No session given and stdin is not a terminal");
    }

    let listings = match history
        .store()
        .recent_sessions(config.list_limit(), history.titles())
    {
        QueryOutcome::Found(listings) => listings,
        QueryOutcome::Empty(message) => anyhow::bail!(message),
        QueryOutcome::Failed(error) => return Err(error.into()),
    };

    let items: Vec<String> = listings
        .iter()
        .map(|s| format!("{} | {:<14} | {}", s.modified, s.model, preview(&s.title, 60)))
        .collect();

    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a session")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(listings[selection].session_id.clone())
}

fn print_sessions_table(listings: &[SessionListing]) {
    println!(
        "{:<18} {:<16} {:<38} {}",
        "MODIFIED".dimmed(),
        "MODEL".dimmed(),
        "SESSION".dimmed(),
        "TITLE".dimmed(),
    );

    for s in listings {
        println!(
            "{:<18} {:<16} {:<38} {}",
            s.modified,
            s.model.bright_cyan(),
            s.session_id,
            preview(&s.title, 60)
        );
    }
}

fn print_search_results(results: &[SearchResult]) {
    for r in results {
        println!(
            "{} {} {}",
            r.timestamp.dimmed(),
            r.event_type.bright_blue(),
            r.session_id.dimmed()
        );
        println!(
            "    {}",
            r.context
                .replacen(&r.matched_text, &r.matched_text.bright_yellow().to_string(), 1)
        );
    }
    println!();
    println!("{}", format!("{} result(s)", results.len()).dimmed());
}

fn print_tool_usage(usages: &[ToolUsage]) {
    for u in usages {
        println!(
            "{} {} {}",
            u.timestamp.dimmed(),
            u.tool_name.bright_green(),
            u.session_id.dimmed()
        );
        if !u.arguments.is_null() {
            println!("    {}", preview(&u.arguments.to_string(), 120));
        }
    }
}

fn print_conversation(messages: &[ConversationMessage]) {
    for m in messages {
        let role = match m.role {
            Role::System => "system".dimmed().to_string(),
            Role::User => "user".bright_green().bold().to_string(),
            Role::Assistant => "assistant".bright_blue().bold().to_string(),
        };
        println!("{} {}", role, format_timestamp(&m.timestamp).dimmed());
        for line in m.content.lines() {
            println!("  {}", line);
        }

        for call in m.tool_calls.iter().flatten() {
            println!(
                "  {} {} {}",
                "->".dimmed(),
                call.name.bright_yellow(),
                preview(&call.arguments.to_string(), 100)
            );
            if let Some(ref result) = call.result {
                println!("     {}", preview(result, 100).dimmed());
            }
        }
        println!();
    }
}

fn print_stats(stats: &SessionStats) {
    println!("{}", "=== Session Statistics ===".bright_blue().bold());
    println!("{}  {}", "Total Sessions:".dimmed(), stats.total_sessions);
    println!("{}  {}", "Total Events:".dimmed(), stats.total_entries);
    println!(
        "{}  {} .. {}",
        "Date Range:".dimmed(),
        format_timestamp(stats.date_range.earliest.as_deref().unwrap_or_default()),
        format_timestamp(stats.date_range.latest.as_deref().unwrap_or_default()),
    );

    if !stats.models_used.is_empty() {
        println!();
        println!("{}", "Models:".dimmed());
        for model in &stats.models_used {
            println!("  {}", model);
        }
    }

    if !stats.event_types.is_empty() {
        println!();
        println!("{}", "By Event Type:".dimmed());
        let mut counts: Vec<(&String, &usize)> = stats.event_types.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (kind, count) in counts {
            println!("  {:<24} {}", kind, count);
        }
    }
}

/// First line of `text`, cut to `max` characters.
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        format!("{}...", line.chars().take(max).collect::<String>())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_on_missing_store_is_reported_not_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let history = SessionHistory::new(copilot_history_sessions::SessionStore::with_dir(
            dir.path().join("missing"),
        ));
        let config = HistoryConfig::default();

        for json in [false, true] {
            let result =
                handle_history_command(HistoryAction::Stats { json }, &history, &config);
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("first\nsecond", 10), "first");
        assert_eq!(preview("abcdefghij", 4), "abcd...");
        assert_eq!(preview("", 4), "");
    }
}
