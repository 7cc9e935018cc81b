use std::io::{self, Read};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::Month;

use super::render;
use super::Commands;
use crate::app::{Coordinator, Surface};
use crate::config::AppConfig;
use crate::storage::StoreHandle;
use crate::todos::{CalendarDay, Todo, TodoFilter, TodoId};
use crate::validation::{check_credentials, check_todo_text, AuthMode, Credentials};

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Email address (prompted if omitted)
    #[arg(long)]
    pub email: Option<String>,
    /// Password (prompted if omitted; never checked)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SignupArgs {
    #[command(flatten)]
    pub login: LoginArgs,
    /// Display name (prompted if omitted)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Day to show as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<CalendarDay>,
    /// Which todos to list: all, active or completed
    #[arg(long)]
    pub filter: Option<TodoFilter>,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Todo text. If omitted, reads from stdin.
    #[arg()]
    pub text: Vec<String>,
    /// Day the todo belongs to as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<CalendarDay>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    /// Todo id or a unique prefix of it
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Todo id or a unique prefix of it
    pub id: String,
    /// Replacement text
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalendarArgs {
    /// Month to show as YYYY-MM (defaults to the current month)
    #[arg(long)]
    pub month: Option<YearMonth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("'{s}' is not a YYYY-MM month");
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month
            .parse::<u8>()
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or_else(invalid)?;
        Ok(Self { year, month })
    }
}

pub fn execute(config: &AppConfig, store: StoreHandle, command: Commands) -> Result<String> {
    let today = CalendarDay::today();
    let mut app = Coordinator::open(store, today)?.with_filter(config.default_filter);
    match command {
        Commands::Login(args) => login(config, &mut app, args),
        Commands::Signup(args) => signup(config, &mut app, args),
        Commands::Logout => logout(&mut app),
        Commands::Whoami => Ok(whoami(&app)),
        Commands::List(args) => list(&mut app, args),
        Commands::Add(args) => add(&mut app, args),
        Commands::Toggle(args) => toggle(&mut app, args),
        Commands::Edit(args) => edit(&mut app, args),
        Commands::Delete(args) => delete(&mut app, args),
        Commands::ClearCompleted => clear_completed(&mut app),
        Commands::Calendar(args) => calendar(config, &app, args),
    }
}

fn login(config: &AppConfig, app: &mut Coordinator, args: LoginArgs) -> Result<String> {
    let credentials = collect_credentials(args, None, AuthMode::Login)?;
    ensure_valid(&credentials, AuthMode::Login, config)?;
    let identity = app.login(&credentials.email, &credentials.password)?;
    Ok(format!("Signed in as {} <{}>", identity.name, identity.email))
}

fn signup(config: &AppConfig, app: &mut Coordinator, args: SignupArgs) -> Result<String> {
    let credentials = collect_credentials(args.login, args.name, AuthMode::Signup)?;
    ensure_valid(&credentials, AuthMode::Signup, config)?;
    let name = credentials.name.as_deref().unwrap_or_default();
    let identity = app.signup(&credentials.email, &credentials.password, name)?;
    Ok(format!(
        "Created profile {} <{}> and signed in",
        identity.name, identity.email
    ))
}

fn logout(app: &mut Coordinator) -> Result<String> {
    let Some(identity) = app.identity().cloned() else {
        return Ok("Not signed in.".to_string());
    };
    app.logout()?;
    Ok(format!("Signed out {}. Your todos are kept.", identity.email))
}

fn whoami(app: &Coordinator) -> String {
    match (app.surface(), app.identity()) {
        (Surface::SignedIn, Some(identity)) => format!("{} <{}>", identity.name, identity.email),
        _ => "Not signed in. Run `todomate login` or `todomate signup`.".to_string(),
    }
}

fn list(app: &mut Coordinator, args: ListArgs) -> Result<String> {
    if let Some(date) = args.date {
        app.select_date(date);
    }
    if let Some(filter) = args.filter {
        app.set_filter(filter);
    }
    Ok(render::day_view(&app.view()?))
}

fn add(app: &mut Coordinator, args: AddArgs) -> Result<String> {
    let raw = if args.text.is_empty() {
        read_stdin()?.unwrap_or_default()
    } else {
        args.text.join(" ")
    };
    let text = check_todo_text(&raw)?;
    if let Some(date) = args.date {
        app.select_date(date);
    }
    let todo = app.add_todo(text).context("adding todo")?;
    let mut out = format!("Added {} to {}\n", render::short_id(&todo), todo.date);
    out.push_str(&render::day_view(&app.view()?));
    Ok(out)
}

fn toggle(app: &mut Coordinator, args: IdArgs) -> Result<String> {
    let todo = resolve_todo(app, &args.id)?;
    app.toggle_todo(&todo.id)?;
    app.select_date(todo.date);
    Ok(render::day_view(&app.view()?))
}

fn edit(app: &mut Coordinator, args: EditArgs) -> Result<String> {
    let todo = resolve_todo(app, &args.id)?;
    let changed = app.edit_todo(&todo.id, &args.text.join(" "))?;
    app.select_date(todo.date);
    let mut out = String::new();
    if !changed {
        out.push_str("Nothing to change.\n");
    }
    out.push_str(&render::day_view(&app.view()?));
    Ok(out)
}

fn delete(app: &mut Coordinator, args: IdArgs) -> Result<String> {
    let todo = resolve_todo(app, &args.id)?;
    app.delete_todo(&todo.id)?;
    app.select_date(todo.date);
    let mut out = format!("Deleted \"{}\"\n", todo.text);
    out.push_str(&render::day_view(&app.view()?));
    Ok(out)
}

fn clear_completed(app: &mut Coordinator) -> Result<String> {
    let removed = app.clear_completed()?;
    Ok(match removed {
        0 => "No completed todos to clear.".to_string(),
        1 => "Cleared 1 completed todo.".to_string(),
        n => format!("Cleared {n} completed todos."),
    })
}

fn calendar(config: &AppConfig, app: &Coordinator, args: CalendarArgs) -> Result<String> {
    let selected = app.selected_date();
    let YearMonth { year, month } = args.month.unwrap_or(YearMonth {
        year: selected.year(),
        month: selected.month(),
    });
    let days = app.month(year, month)?;
    Ok(render::calendar(
        year,
        month,
        &days,
        selected,
        config.calendar.week_starts_monday,
    ))
}

fn collect_credentials(
    args: LoginArgs,
    name: Option<String>,
    mode: AuthMode,
) -> Result<Credentials> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt("Password")?,
    };
    let name = match (mode, name) {
        (AuthMode::Signup, None) => Some(prompt("Name")?),
        (_, name) => name,
    };
    Ok(Credentials {
        email: email.trim().to_string(),
        password,
        name: name.map(|name| name.trim().to_string()),
    })
}

fn ensure_valid(credentials: &Credentials, mode: AuthMode, config: &AppConfig) -> Result<()> {
    let errors = check_credentials(credentials, mode, &config.auth);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    bail!("{details}")
}

/// Matches `needle` against full ids first, then against unique prefixes.
fn resolve_id(todos: &[Todo], needle: &str) -> Result<TodoId> {
    let needle = needle.trim();
    if needle.is_empty() {
        bail!("todo id cannot be empty");
    }
    if let Some(todo) = todos.iter().find(|todo| todo.id.as_str() == needle) {
        return Ok(todo.id.clone());
    }
    let matches = todos
        .iter()
        .filter(|todo| todo.id.as_str().starts_with(needle))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [] => bail!("no todo matches id '{needle}'"),
        [todo] => Ok(todo.id.clone()),
        many => bail!("id '{needle}' is ambiguous ({} todos match)", many.len()),
    }
}

fn resolve_todo(app: &Coordinator, needle: &str) -> Result<Todo> {
    let todos = app.todos()?;
    let id = resolve_id(todos, needle)?;
    todos
        .iter()
        .find(|todo| todo.id == id)
        .cloned()
        .with_context(|| format!("todo {id} disappeared"))
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;
    use crate::app::DayView;
    use crate::index::{self, DayStats};
    use crate::session::Identity;
    use crate::storage::MemoryStore;

    type TestResult<T = ()> = Result<T>;

    fn day(raw: &str) -> CalendarDay {
        raw.parse().expect("valid day")
    }

    fn todo(id: &str, text: &str, completed: bool) -> Todo {
        Todo {
            id: TodoId::from(id),
            text: text.into(),
            completed,
            date: day("2024-01-02"),
            created_at: 0,
        }
    }

    fn signed_in_store() -> TestResult<StoreHandle> {
        let store = StoreHandle::from_arc(Arc::new(MemoryStore::new()));
        let config = AppConfig::default();
        execute(
            &config,
            store.clone(),
            Commands::Login(LoginArgs {
                email: Some("kim@example.com".into()),
                password: Some("secret1".into()),
            }),
        )?;
        Ok(store)
    }

    #[test]
    fn day_view_renders_stats_and_items() {
        let view = DayView {
            identity: Identity::from_email("kim@example.com"),
            date: day("2024-01-02"),
            filter: TodoFilter::All,
            todos: vec![
                todo("1a2b3c4d-0000", "walk dog", false),
                todo("5e6f7a8b-1111", "buy milk", true),
            ],
            stats: DayStats {
                active: 1,
                completed: 1,
            },
            dates_with_todos: BTreeSet::from([day("2024-01-02")]),
        };
        insta::assert_snapshot!(render::day_view(&view), @r"
        Tuesday 2024-01-02 · kim
        active 1 · completed 1 · [all] active completed
          [ ] 1a2b3c4d  walk dog
          [x] 5e6f7a8b  buy milk
        ");
    }

    #[test]
    fn empty_filtered_view_names_the_filter() {
        let view = DayView {
            identity: Identity::from_email("kim@example.com"),
            date: day("2024-01-02"),
            filter: TodoFilter::Completed,
            todos: Vec::new(),
            stats: DayStats {
                active: 3,
                completed: 0,
            },
            dates_with_todos: BTreeSet::new(),
        };
        let output = render::day_view(&view);
        assert!(output.ends_with("No completed todos for this day."), "{output}");
        assert!(output.contains("all active [completed]"));
    }

    #[test]
    fn calendar_marks_todo_days_and_selection() {
        let items = vec![todo("a", "x", false)];
        let days = index::month_overview(&items, 2024, Month::January).expect("valid");
        let output = render::calendar(2024, Month::January, &days, day("2024-01-31"), true);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "January 2024");
        assert_eq!(lines[1], " Mo  Tu  We  Th  Fr  Sa  Su");
        assert_eq!(lines[2], "  1   2*  3   4   5   6   7");
        assert_eq!(lines[6], " 29  30 >31");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn calendar_can_start_on_sunday() {
        let days = index::month_overview(&[], 2024, Month::September).expect("valid");
        let output = render::calendar(2024, Month::September, &days, day("2024-01-01"), false);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], " Su  Mo  Tu  We  Th  Fr  Sa");
        assert_eq!(lines[2], "  1   2   3   4   5   6   7");
    }

    #[test]
    fn resolve_id_accepts_unique_prefixes() -> TestResult {
        let todos = vec![
            todo("abc123", "one", false),
            todo("abd456", "two", false),
            todo("ab", "three", false),
        ];
        assert_eq!(resolve_id(&todos, "abc")?, TodoId::from("abc123"));
        assert_eq!(resolve_id(&todos, "ab")?, TodoId::from("ab"));
        let ambiguous = resolve_id(&todos, "a").unwrap_err().to_string();
        assert!(ambiguous.contains("ambiguous"), "{ambiguous}");
        assert!(resolve_id(&todos, "zzz").is_err());
        assert!(resolve_id(&todos, "  ").is_err());
        Ok(())
    }

    #[test]
    fn year_month_parses_strictly() {
        assert_eq!(
            "2024-02".parse::<YearMonth>(),
            Ok(YearMonth {
                year: 2024,
                month: Month::February
            })
        );
        for raw in ["2024-2", "2024-13", "24-02", "2024/02", ""] {
            assert!(raw.parse::<YearMonth>().is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn cli_login_rejects_malformed_credentials() -> TestResult {
        let store = StoreHandle::from_arc(Arc::new(MemoryStore::new()));
        let err = execute(
            &AppConfig::default(),
            store.clone(),
            Commands::Login(LoginArgs {
                email: Some("kim".into()),
                password: Some("123".into()),
            }),
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("not a valid email"), "{err}");
        assert!(err.contains("at least 6"), "{err}");

        let whoami = execute(&AppConfig::default(), store, Commands::Whoami)?;
        assert!(whoami.starts_with("Not signed in"));
        Ok(())
    }

    #[test]
    fn cli_commands_require_sign_in() {
        let store = StoreHandle::from_arc(Arc::new(MemoryStore::new()));
        let err = execute(
            &AppConfig::default(),
            store,
            Commands::List(ListArgs::default()),
        )
        .unwrap_err()
        .to_string();
        assert_eq!(err, "sign in to manage todos");
    }

    #[test]
    fn cli_add_toggle_edit_delete_flow() -> TestResult {
        let store = signed_in_store()?;
        let config = AppConfig::default();

        let added = execute(
            &config,
            store.clone(),
            Commands::Add(AddArgs {
                text: vec!["water".into(), "plants".into()],
                date: Some(day("2024-04-01")),
            }),
        )?;
        assert!(added.starts_with("Added "), "{added}");
        assert!(added.contains("[ ] "), "{added}");
        assert!(added.contains("water plants"));

        let id = added
            .split_whitespace()
            .nth(1)
            .expect("short id in output")
            .to_string();

        let toggled = execute(&config, store.clone(), Commands::Toggle(IdArgs { id: id.clone() }))?;
        assert!(toggled.contains("[x] "), "{toggled}");
        assert!(toggled.contains("active 0 · completed 1"), "{toggled}");

        let edited = execute(
            &config,
            store.clone(),
            Commands::Edit(EditArgs {
                id: id.clone(),
                text: vec!["water".into(), "the".into(), "plants".into()],
            }),
        )?;
        assert!(edited.contains("water the plants"), "{edited}");

        let unchanged = execute(
            &config,
            store.clone(),
            Commands::Edit(EditArgs {
                id: id.clone(),
                text: vec!["  water the plants ".into()],
            }),
        )?;
        assert!(unchanged.starts_with("Nothing to change."), "{unchanged}");

        let deleted = execute(&config, store.clone(), Commands::Delete(IdArgs { id }))?;
        assert!(deleted.contains("Deleted \"water the plants\""), "{deleted}");
        assert!(deleted.ends_with("No todos for this day yet."), "{deleted}");
        Ok(())
    }

    #[test]
    fn cli_logout_keeps_todos() -> TestResult {
        let store = signed_in_store()?;
        let config = AppConfig::default();
        execute(
            &config,
            store.clone(),
            Commands::Add(AddArgs {
                text: vec!["survive logout".into()],
                date: Some(day("2024-04-01")),
            }),
        )?;

        let out = execute(&config, store.clone(), Commands::Logout)?;
        assert!(out.starts_with("Signed out kim@example.com"));

        execute(
            &config,
            store.clone(),
            Commands::Signup(SignupArgs {
                login: LoginArgs {
                    email: Some("lee@example.com".into()),
                    password: Some("secret1".into()),
                },
                name: Some("Lee".into()),
            }),
        )?;
        let listed = execute(
            &config,
            store,
            Commands::List(ListArgs {
                date: Some(day("2024-04-01")),
                filter: None,
            }),
        )?;
        assert!(listed.contains("· Lee"), "{listed}");
        assert!(listed.contains("survive logout"), "{listed}");
        Ok(())
    }

    #[test]
    fn cli_clear_completed_reports_count() -> TestResult {
        let store = signed_in_store()?;
        let config = AppConfig::default();
        let out = execute(&config, store, Commands::ClearCompleted)?;
        assert_eq!(out, "No completed todos to clear.");
        Ok(())
    }
}
