use adiutor_cli::cli::{Cli, Command, StreakCommand, config_overrides};
use adiutor_core::board::Board;
use adiutor_core::clock::SystemClock;
use adiutor_core::config::{self, Config, Palette};
use adiutor_core::error::AppError;
use adiutor_core::model::{
    Category, Priority, StreakSettings, Task, TaskStatus, format_due_date, format_reminder_time,
    parse_due_date, parse_reminder_time, split_tags,
};
use adiutor_core::notify;
use adiutor_core::reminder::ScanLoop;
use adiutor_core::storage::{self, JsonDirStorage, Storage};
use adiutor_core::task_store::{NewTask, TaskPatch, TaskStats};
use adiutor_core::tool_call::ToolCall;
use adiutor_core::view::{CategoryFilter, TagFilter, TaskView};
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Read};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::warn;

const SHORT_ID_LEN: usize = 8;

struct Session {
    board: Board<JsonDirStorage>,
    base_config: Config,
}

impl Session {
    fn open(clock: SystemClock) -> Result<Self, AppError> {
        let loaded = config::load_config_with_fallback();
        if let Some(err) = loaded.error {
            warn!(error = %err, "config unreadable, using defaults");
        }
        let storage = JsonDirStorage::new(storage::data_dir()?);
        let board = Board::load(storage, Box::new(clock))?;
        Ok(Self {
            board,
            base_config: loaded.config,
        })
    }

    fn resolve(&self, id: &str) -> Result<String, AppError> {
        self.board
            .resolve_id(id)
            .ok_or_else(|| AppError::invalid_input(format!("task not found: {}", id.trim())))
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Reminder")]
    reminder: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: short_id(task.id()).to_string(),
            title: task.title().to_string(),
            status: task.status().to_string(),
            priority: task.priority().to_string(),
            category: task.category().to_string(),
            due: task
                .due_date()
                .map(format_due_date)
                .unwrap_or_else(|| "-".to_string()),
            reminder: task
                .reminder_time()
                .map(format_reminder_time)
                .unwrap_or_else(|| "-".to_string()),
            tags: task.tags().join(", "),
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn task_json(task: &Task) -> Result<serde_json::Value, AppError> {
    let mut value = serde_json::to_value(task)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("completed".to_string(), task.completed().into());
    }
    Ok(value)
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    println!("{}", task_json(task)?);
    Ok(())
}

fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    let payload = tasks
        .iter()
        .map(task_json)
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::Value::Array(payload));
    Ok(())
}

fn print_tasks_table(tasks: &[Task], palette: &Palette) {
    if tasks.is_empty() {
        println!("{}", palette.mutedize("No tasks."));
        return;
    }
    let mut table = Table::new(tasks.iter().map(TaskRow::from_task));
    table.with(Style::modern());
    println!("{table}");
}

fn print_task_detail(task: &Task, palette: &Palette) {
    println!("{}", palette.accentize(task.title()));
    println!("  id:       {}", task.id());
    println!("  status:   {}", task.status());
    println!("  priority: {}", task.priority());
    println!("  category: {}", task.category());
    if let Some(due) = task.due_date() {
        println!("  due:      {}", format_due_date(due));
    }
    if let Some(at) = task.reminder_time() {
        let state = if task.reminded() { "sent" } else { "pending" };
        println!("  reminder: {} ({state})", format_reminder_time(at));
    }
    if !task.tags().is_empty() {
        println!("  tags:     {}", task.tags().join(", "));
    }
}

fn print_streak(session: &Session, json: bool, palette: &Palette) -> Result<(), AppError> {
    let settings = session.board.streak_settings();
    let state = session.board.streak_state();
    let goal_met = session.board.is_goal_met_this_period();
    if json {
        let payload = serde_json::json!({
            "settings": settings,
            "state": state,
            "goalMet": goal_met,
        });
        println!("{payload}");
        return Ok(());
    }

    println!("{} {}", palette.accentize("Streak:"), state.count);
    println!(
        "Goal: {} per {} period, progress {}/{}",
        settings.target, settings.period, state.current_period_progress, settings.target
    );
    if goal_met {
        println!("{}", palette.mutedize("Goal met this period."));
    }
    Ok(())
}

fn print_stats(stats: TaskStats, json: bool, palette: &Palette) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_value(stats)?);
        return Ok(());
    }

    println!("{}", palette.accentize("Daily Productivity"));
    if stats.total == 0 {
        println!("{}", palette.mutedize("No tasks yet!"));
        return Ok(());
    }
    println!("  completed: {}", stats.completed);
    println!("  pending:   {}", stats.pending);
    if stats.pending == 0 {
        println!("{}", palette.mutedize("All done. Keep it up."));
    }
    Ok(())
}

fn parse_optional<T, F>(value: Option<&str>, parse: F) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Result<T, AppError>,
{
    value.map(parse).transpose()
}

fn required_title(title: Option<String>) -> Result<String, AppError> {
    match title {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::invalid_input("title is required")),
    }
}

fn deliver_fired(fired: &[Task], config: &Config, json: bool) -> Result<(), AppError> {
    if fired.is_empty() {
        return Ok(());
    }
    let notifier = notify::notifier_for(config.notifications_enabled())?;
    let outcome = notify::deliver(notifier.as_ref(), fired);
    for failure in &outcome.failures {
        eprintln!(
            "WARN: notification failed for {}: {}",
            failure.task_id, failure.error
        );
    }
    if json {
        print_tasks_json(fired)?;
    } else {
        for task in fired {
            println!("Reminder: {}", notify::notification_body(task));
        }
    }
    Ok(())
}

/// One `watch` iteration: pick up changes written by other invocations, fire
/// due reminders, then dismiss what was delivered so nothing piles up.
fn watch_tick<S: Storage>(
    board: &mut Board<S>,
    config: &Config,
    json: bool,
) -> Result<usize, AppError> {
    board.reload()?;
    let fired = board.scan_reminders()?;
    deliver_fired(&fired, config, json)?;
    for task in &fired {
        board.dismiss_notification(task.id());
    }
    Ok(fired.len())
}

fn read_tool_call(record: &str) -> Result<ToolCall, AppError> {
    let content = if record.trim() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        record.to_string()
    };
    serde_json::from_str(&content)
        .map_err(|err| AppError::invalid_data(format!("tool call: {err}")))
}

fn run_command(cli: Cli, session: &mut Session) -> Result<(), AppError> {
    let overrides = config_overrides(&cli.config_override)?;
    let config = config::merge_overrides(&session.base_config, &overrides);
    let palette = config.palette();

    match cli.command {
        Command::Add {
            title,
            due,
            remind,
            priority,
            status,
            tags,
            category,
        } => {
            let title = required_title(title)?;
            let new_task = NewTask {
                title,
                due_date: parse_optional(due.as_deref(), parse_due_date)?,
                reminder_time: parse_optional(remind.as_deref(), parse_reminder_time)?,
                priority: parse_optional(priority.as_deref(), str::parse::<Priority>)?
                    .unwrap_or_default(),
                status: parse_optional(status.as_deref(), str::parse::<TaskStatus>)?
                    .unwrap_or_default(),
                tags,
                category: parse_optional(category.as_deref(), str::parse::<Category>)?
                    .unwrap_or_default(),
            };
            let task = session
                .board
                .add_task(new_task)?
                .ok_or_else(|| AppError::invalid_input("title is required"))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.title(), short_id(task.id()));
            }
        }
        Command::Edit {
            id,
            title,
            due,
            clear_due,
            remind,
            clear_remind,
            priority,
            status,
            tags,
            category,
        } => {
            let id = session.resolve(&id)?;
            if matches!(title.as_deref(), Some(value) if value.trim().is_empty()) {
                return Err(AppError::invalid_input("title cannot be empty"));
            }
            let due_date = if clear_due {
                Some(None)
            } else {
                parse_optional(due.as_deref(), parse_due_date)?.map(Some)
            };
            let reminder_time = if clear_remind {
                Some(None)
            } else {
                parse_optional(remind.as_deref(), parse_reminder_time)?.map(Some)
            };
            let patch = TaskPatch {
                title,
                due_date,
                reminder_time,
                priority: parse_optional(priority.as_deref(), str::parse::<Priority>)?,
                status: parse_optional(status.as_deref(), str::parse::<TaskStatus>)?,
                tags: tags.as_deref().map(split_tags),
                category: parse_optional(category.as_deref(), str::parse::<Category>)?,
            };
            let task = session
                .board
                .update_task(&id, patch)?
                .ok_or_else(|| AppError::invalid_input(format!("task not found: {id}")))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Updated task: {} ({})", task.title(), short_id(task.id()));
            }
        }
        Command::Delete { id } => {
            let id = session.resolve(&id)?;
            let task = session
                .board
                .delete_task(&id)?
                .ok_or_else(|| AppError::invalid_input(format!("task not found: {id}")))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.title(), short_id(task.id()));
            }
        }
        Command::Done { id } => {
            let id = session.resolve(&id)?;
            let task = session
                .board
                .toggle_completion(&id)?
                .ok_or_else(|| AppError::invalid_input(format!("task not found: {id}")))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                let verb = if task.completed() { "Completed" } else { "Reopened" };
                println!("{verb} task: {} ({})", task.title(), short_id(task.id()));
                if task.completed() && session.board.is_goal_met_this_period() {
                    println!(
                        "{}",
                        palette.accentize(&format!(
                            "Streak: {}",
                            session.board.streak_state().count
                        ))
                    );
                }
            }
        }
        Command::Status { id } => {
            let id = session.resolve(&id)?;
            let task = session
                .board
                .cycle_status(&id)?
                .ok_or_else(|| AppError::invalid_input(format!("task not found: {id}")))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Status of {} is now {}", task.title(), task.status());
            }
        }
        Command::Priority { id } => {
            let id = session.resolve(&id)?;
            let task = session
                .board
                .cycle_priority(&id)?
                .ok_or_else(|| AppError::invalid_input(format!("task not found: {id}")))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Priority of {} is now {}", task.title(), task.priority());
            }
        }
        Command::ClearCompleted => {
            let removed = session.board.clear_completed()?;
            if cli.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Cleared {removed} completed task(s)");
            }
        }
        Command::List {
            category,
            tag,
            sort,
        } => {
            let view = TaskView {
                category: parse_optional(category.as_deref(), str::parse::<CategoryFilter>)?
                    .unwrap_or_default(),
                tag: tag
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| TagFilter::tag(value.trim()))
                    .unwrap_or_default(),
                sort: parse_optional(sort.as_deref(), str::parse)?.unwrap_or_default(),
            };
            let tasks = session.board.view(&view);
            if cli.json {
                print_tasks_json(&tasks)?;
            } else {
                println!(
                    "{}",
                    palette.mutedize(&format!("{} task(s), sorted by {}", tasks.len(), view.sort))
                );
                print_tasks_table(&tasks, &palette);
            }
        }
        Command::Tags => {
            let tags = session.board.unique_tags();
            if cli.json {
                println!("{}", serde_json::json!(tags));
            } else {
                for tag in tags {
                    println!("{tag}");
                }
            }
        }
        Command::Stats => {
            print_stats(session.board.stats(), cli.json, &palette)?;
        }
        Command::Show { id } => {
            let id = session.resolve(&id)?;
            let task = session
                .board
                .get(&id)
                .ok_or_else(|| AppError::invalid_input(format!("task not found: {id}")))?;
            if cli.json {
                print_task_json(task)?;
            } else {
                print_task_detail(task, &palette);
            }
        }
        Command::Streak { action } => {
            match action {
                StreakCommand::Show => {
                    session.board.observe_streak()?;
                }
                StreakCommand::Set { target, period } => {
                    let current = session.board.streak_settings();
                    let settings = StreakSettings {
                        target: target.unwrap_or(current.target),
                        period: parse_optional(period.as_deref(), str::parse)?
                            .unwrap_or(current.period),
                    };
                    session.board.set_streak_settings(settings)?;
                }
                StreakCommand::Reset => {
                    session.board.reset_streak()?;
                }
            }
            print_streak(session, cli.json, &palette)?;
        }
        Command::ToolCall { record } => {
            let call = read_tool_call(&record)?;
            match session.board.apply_tool_call(&call)? {
                Some(reply) => {
                    if cli.json {
                        println!("{}", serde_json::json!({ "id": call.id, "reply": reply }));
                    } else {
                        println!("{reply}");
                    }
                }
                None => return Err(AppError::invalid_input("tool call needs a title")),
            }
        }
        Command::Remind => {
            let fired = session.board.scan_reminders()?;
            if fired.is_empty() {
                if cli.json {
                    print_tasks_json(&fired)?;
                } else {
                    println!("{}", palette.mutedize("No reminders due."));
                }
            }
            deliver_fired(&fired, &config, cli.json)?;
        }
        Command::Watch => {
            let scan_loop = ScanLoop::new(config.scan_interval());
            let stop = scan_loop.stop_flag();
            signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
            signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;
            if !cli.json {
                println!(
                    "{}",
                    palette.mutedize(&format!(
                        "Watching reminders every {}s, Ctrl-C to stop.",
                        config.scan_interval().as_secs()
                    ))
                );
            }
            let board = &mut session.board;
            scan_loop.run(|| watch_tick(board, &config, cli.json).map(|_| ()));
        }
        Command::Pending => {
            let pending = session.board.pending_notifications();
            if cli.json {
                print_tasks_json(pending)?;
            } else {
                print_tasks_table(pending, &palette);
            }
        }
        Command::Dismiss { id, all } => {
            let dismissed = if all {
                session.board.dismiss_all_notifications()
            } else {
                let id = id.unwrap_or_default();
                let id = session.resolve(&id)?;
                usize::from(session.board.dismiss_notification(&id))
            };
            if cli.json {
                println!("{}", serde_json::json!({ "dismissed": dismissed }));
            } else {
                println!("Dismissed {dismissed} reminder(s)");
            }
        }
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive(clock: SystemClock) -> Result<(), AppError> {
    let mut session = Session::open(clock)?;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("adiutor".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        // Other invocations may have written since the last command.
        if let Err(err) = session.board.reload() {
            eprintln!("ERROR: {}", err);
            continue;
        }

        // Reminders are scanned between commands so they surface while the
        // session is open.
        match session.board.scan_reminders() {
            Ok(fired) => {
                for task in &fired {
                    println!("Reminder: {}", notify::notification_body(task));
                }
            }
            Err(err) => eprintln!("ERROR: {}", err),
        }

        if let Err(err) = run_command(cli, &mut session) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    // Read the local offset while the process is still single threaded.
    let clock = SystemClock::local();
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive(clock) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if !err.use_stderr() {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let result = Session::open(clock).and_then(|mut session| run_command(cli, &mut session));
    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
