use adiutor_core::config::ConfigOverrides;
use adiutor_core::error::AppError;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: adiutor add "Buy milk" --category Shopping --due 2025-01-12
    /// Example: adiutor add "Call mom" --remind 2025-01-11T18:30 --tag family
    Add {
        title: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Reminder time (YYYY-MM-DDTHH:mm)
        #[arg(long)]
        remind: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Repeatable
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Edit fields of a task
    ///
    /// Example: adiutor edit 3f2a --title "Buy oat milk" --clear-due
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, conflicts_with = "clear_remind")]
        remind: Option<String>,
        #[arg(long)]
        clear_remind: bool,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Comma separated, replaces the current tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: adiutor delete 3f2a
    Delete { id: String },
    /// Toggle a task between done and todo
    ///
    /// Example: adiutor done 3f2a
    Done { id: String },
    /// Advance a task's status (todo, in-progress, blocked)
    Status { id: String },
    /// Advance a task's priority (low, medium, high)
    Priority { id: String },
    /// Remove every completed task
    ClearCompleted,
    /// List tasks
    ///
    /// Example: adiutor list --category Work --sort due
    /// Example: adiutor list --tag errand
    List {
        /// Category name or "All"
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// created, due or priority
        #[arg(long)]
        sort: Option<String>,
    },
    /// List every tag in use
    Tags,
    /// Count completed and pending tasks
    Stats,
    /// Show details of a task
    ///
    /// Example: adiutor show 3f2a
    Show { id: String },
    /// Show or change the completion streak
    Streak {
        #[command(subcommand)]
        action: StreakCommand,
    },
    /// Apply a tool-call record (JSON); "-" reads it from stdin
    ///
    /// Example: adiutor tool-call '{"name":"addTask","args":{"title":"Stretch"}}'
    ToolCall { record: String },
    /// Run one reminder scan and send notifications
    Remind,
    /// Scan for reminders until interrupted
    Watch,
    /// List reminders waiting to be dismissed
    Pending,
    /// Dismiss a pending reminder
    ///
    /// Example: adiutor dismiss 3f2a
    /// Example: adiutor dismiss --all
    Dismiss {
        #[arg(required_unless_present = "all")]
        id: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StreakCommand {
    /// Show the current streak
    Show,
    /// Change the streak goal
    ///
    /// Example: adiutor streak set --target 3 --period weekly
    Set {
        #[arg(long)]
        target: Option<u32>,
        #[arg(long)]
        period: Option<String>,
    },
    /// Start the streak over
    Reset,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    ScanInterval,
    Notifications,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "scan_interval" | "scan_interval_secs" => ConfigOverrideTarget::ScanInterval,
        "notifications" => ConfigOverrideTarget::Notifications,
        other => return Err(format!("unknown config field '{other}'")),
    };
    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` into one set of overrides. Later values
/// win.
pub fn config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)
            .map_err(|err| AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {err}")))?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::ScanInterval => {
                let secs = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: scan_interval must be a number of seconds"
                    ))
                })?;
                overrides.scan_interval_secs = Some(secs);
            }
            ConfigOverrideTarget::Notifications => {
                overrides.notifications = Some(parse_switch(&parsed.value).ok_or_else(|| {
                    AppError::invalid_input(format!(
                        "{CONFIG_OVERRIDE_FLAG}: notifications must be on or off"
                    ))
                })?);
            }
        }
    }
    Ok(overrides)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ConfigOverrideTarget, config_overrides, parse_config_override};
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Noir ").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Noir");

        let parsed = parse_config_override("scan-interval=30").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::ScanInterval);
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("aliases.ls=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn config_overrides_collects_typed_values() {
        let overrides = config_overrides(&[
            "theme=dark".to_string(),
            "scan_interval=12".to_string(),
            "notifications=off".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("dark"));
        assert_eq!(overrides.scan_interval_secs, Some(12));
        assert_eq!(overrides.notifications, Some(false));
    }

    #[test]
    fn config_overrides_rejects_bad_values() {
        let err = config_overrides(&["scan_interval=soon".to_string()]).unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = config_overrides(&["notifications=maybe".to_string()]).unwrap_err();
        assert!(err.message().contains("on or off"));
    }

    #[test]
    fn add_collects_repeated_tags() {
        let cli = Cli::try_parse_from([
            "adiutor", "add", "Buy milk", "--tag", "errand", "--tag", "home", "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::Add { title, tags, .. } => {
                assert_eq!(title.as_deref(), Some("Buy milk"));
                assert_eq!(tags, vec!["errand".to_string(), "home".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn edit_rejects_due_with_clear_due() {
        let err = Cli::try_parse_from(["adiutor", "edit", "1", "--due", "2025-01-01", "--clear-due"]);
        assert!(err.is_err());
    }

    #[test]
    fn stats_takes_no_arguments() {
        let cli = Cli::try_parse_from(["adiutor", "stats", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Stats));
        assert!(Cli::try_parse_from(["adiutor", "stats", "extra"]).is_err());
    }

    #[test]
    fn dismiss_requires_id_or_all() {
        assert!(Cli::try_parse_from(["adiutor", "dismiss"]).is_err());
        assert!(Cli::try_parse_from(["adiutor", "dismiss", "--all"]).is_ok());
    }
}
