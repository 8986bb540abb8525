use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, Frame, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction, Rect}, style::{Style, Modifier, Color}};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use todos::{
    application::session::{AppView, View},
    config::Config,
    domain::{auth::{Authenticator, Credentials, SessionToken}, filter::Filter, repository::TodoRepository, todo::ClientId},
    infrastructure::{sqlite, sqlite_auth::SqliteAuthenticator, sqlite_repo::SqliteTodoRepository},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    init_logging(&config.log_file)?;

    sqlite::prepare_sqlite_file(&config.database_url)?;
    let pool = sqlite::connect(&config.database_url).await?;
    let repo = SqliteTodoRepository::new(pool.clone());
    repo.init().await?;
    let auth = SqliteAuthenticator::new(pool).with_ttl(chrono::Duration::hours(config.session_ttl_hours));
    auth.init().await?;

    let token = read_session(&config.session_file);
    let app = AppView::start(auth, repo, token).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, Tui::new(app, config.session_file.clone())).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

// Logs go to a file; writing to stderr would tear the alternate screen.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

fn read_session(path: &Path) -> Option<SessionToken> {
    std::fs::read_to_string(path).ok()?.parse().ok()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Form { LogIn, SignUp }

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { Username, Password }

struct Tui<A: Authenticator + Clone, R: TodoRepository + Clone> {
    app: AppView<A, R>,
    session_file: PathBuf,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    form: Form,
    field: ActiveField,
    username: String,
    password: String,
    draft: String,
    filter_rx: Option<watch::Receiver<Filter>>,
    status: String,
}

impl<A: Authenticator + Clone, R: TodoRepository + Clone> Tui<A, R> {
    fn new(app: AppView<A, R>, session_file: PathBuf) -> Self {
        let mut tui = Self {
            app,
            session_file,
            selected: 0,
            last_tick: Instant::now(),
            mode: Mode::View,
            list_state: ListState::default(),
            form: Form::LogIn,
            field: ActiveField::Username,
            username: String::new(),
            password: String::new(),
            draft: String::new(),
            filter_rx: None,
            status: String::new(),
        };
        tui.entered();
        tui
    }

    // Called whenever the authenticated view may have been (re)created.
    fn entered(&mut self) {
        self.filter_rx = self.app.manage().map(|m| m.filter().subscribe());
        self.selected = 0;
        self.mode = Mode::View;
        if let Some(session) = self.app.session() {
            if let Err(e) = std::fs::write(&self.session_file, session.token.to_string()) {
                tracing::warn!(error = %e, "failed to remember session");
            }
        }
    }

    fn selected_cid(&self) -> Option<ClientId> {
        let manage = self.app.manage()?;
        manage.visible().get(self.selected).map(|t| t.cid())
    }

    fn visible_len(&self) -> usize { self.app.manage().map(|m| m.visible().len()).unwrap_or(0) }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn poll_filter(&mut self) {
        let Some(rx) = self.filter_rx.as_mut() else { return };
        if rx.has_changed().unwrap_or(false) {
            let filter = *rx.borrow_and_update();
            self.selected = 0;
            self.status = format!("showing {filter}");
        }
    }

    async fn submit_form(&mut self) {
        let credentials = Credentials::new(self.username.trim(), self.password.clone());
        let result = match self.form {
            Form::LogIn => self.app.log_in(&credentials).await,
            Form::SignUp => self.app.sign_up(&credentials).await,
        };
        self.password.clear();
        if result.is_ok() {
            self.status = format!("welcome, {}", credentials.username);
            self.entered();
        }
    }

    async fn log_out(&mut self) {
        self.filter_rx = None;
        self.app.log_out().await;
        let _ = std::fs::remove_file(&self.session_file);
        self.username.clear();
        self.status = "logged out".to_string();
    }

    fn report<T>(&mut self, result: std::result::Result<T, todos::domain::repository::StoreError>) {
        if let Err(e) = result { self.status = format!("not saved: {e}"); }
    }
}

async fn run_app<A: Authenticator + Clone, R: TodoRepository + Clone>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut tui: Tui<A, R>) -> Result<()> {
    let tick_rate = Duration::from_millis(200);

    loop {
        tui.poll_filter();
        tui.clamp_selection();
        terminal.draw(|f| draw(f, &mut tui))?;

        let timeout = tick_rate.saturating_sub(tui.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                if !tui.app.is_authenticated() {
                    match key.code {
                        KeyCode::Esc => break,
                        KeyCode::F(2) => { tui.form = match tui.form { Form::LogIn => Form::SignUp, Form::SignUp => Form::LogIn }; }
                        KeyCode::Tab => { tui.field = match tui.field { ActiveField::Username => ActiveField::Password, ActiveField::Password => ActiveField::Username }; }
                        KeyCode::Enter => tui.submit_form().await,
                        KeyCode::Backspace => { match tui.field { ActiveField::Username => { tui.username.pop(); }, ActiveField::Password => { tui.password.pop(); } } }
                        KeyCode::Char(c) => { match tui.field { ActiveField::Username => tui.username.push(c), ActiveField::Password => tui.password.push(c) } }
                        _ => {}
                    }
                    continue;
                }
                match tui.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if tui.selected > 0 { tui.selected -= 1; } }
                        KeyCode::Down => { if tui.selected + 1 < tui.visible_len() { tui.selected += 1; } }
                        KeyCode::Enter => {
                            if let Some(cid) = tui.selected_cid() {
                                let result = match tui.app.manage_mut() { Some(m) => m.toggle(cid).await, None => Ok(false) };
                                tui.report(result);
                            }
                        }
                        KeyCode::Char('n') => { tui.mode = Mode::Create; tui.draft.clear(); }
                        KeyCode::Char('e') => {
                            let content = tui.selected_cid().and_then(|cid| tui.app.manage().and_then(|m| m.todos().get(cid)).map(|t| t.content.clone()));
                            if let Some(content) = content { tui.mode = Mode::Edit; tui.draft = content; }
                        }
                        KeyCode::Char('d') => {
                            if let Some(cid) = tui.selected_cid() {
                                let result = match tui.app.manage_mut() { Some(m) => m.clear(cid).await, None => Ok(false) };
                                tui.report(result);
                                if tui.selected > 0 { tui.selected -= 1; }
                            }
                        }
                        KeyCode::Char('f') => {
                            if let Some(m) = tui.app.manage_mut() { let next = m.filter().current().cycle(); m.select_filter(next); }
                        }
                        KeyCode::Char('b') => { if let Some(m) = tui.app.manage_mut() { m.back(); } }
                        KeyCode::Char('w') => { if let Some(m) = tui.app.manage_mut() { m.forward(); } }
                        KeyCode::Char('a') => {
                            let result = match tui.app.manage_mut() {
                                Some(m) => { let done = !m.stats().all_done; m.toggle_all(done).await }
                                None => Ok(0),
                            };
                            tui.report(result);
                        }
                        KeyCode::Char('c') => {
                            let result = match tui.app.manage_mut() { Some(m) => m.clear_completed().await, None => Ok(0) };
                            tui.report(result);
                        }
                        KeyCode::Char('o') => tui.log_out().await,
                        _ => {}
                    },
                    Mode::Create | Mode::Edit => match key.code {
                        KeyCode::Esc => { tui.mode = Mode::View; tui.draft.clear(); }
                        KeyCode::Enter => {
                            let content = tui.draft.clone();
                            let result = match (tui.mode, tui.selected_cid(), tui.app.manage_mut()) {
                                (Mode::Create, _, Some(m)) => m.create(&content).await.map(|_| ()),
                                (Mode::Edit, Some(cid), Some(m)) => m.edit(cid, &content).await.map(|_| ()),
                                _ => Ok(()),
                            };
                            tui.report(result);
                            tui.mode = Mode::View;
                            tui.draft.clear();
                        }
                        KeyCode::Backspace => { tui.draft.pop(); }
                        KeyCode::Char(c) => tui.draft.push(c),
                        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => { /* ignore nav in input */ }
                        _ => {}
                    },
                }
            }
        }
        if tui.last_tick.elapsed() >= tick_rate {
            tui.last_tick = Instant::now();
        }
    }
    Ok(())
}

fn draw<A: Authenticator + Clone, R: TodoRepository + Clone>(f: &mut Frame, tui: &mut Tui<A, R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    match tui.app.view() {
        View::LogIn(form) => {
            let title = match tui.form { Form::LogIn => "log in", Form::SignUp => "sign up" };
            let header = Paragraph::new("Tab: switch field, F2: log in / sign up, Enter: submit, Esc: quit")
                .block(Block::default().borders(Borders::ALL).title("todos"));
            f.render_widget(header, chunks[0]);

            let error = match tui.form { Form::LogIn => form.login_error.as_deref(), Form::SignUp => form.signup_error.as_deref() };
            let cursor = |field: ActiveField| if tui.field == field { "_" } else { "" };
            let body = format!(
                "Username: {}{}\nPassword: {}{}\n\n{}",
                tui.username,
                cursor(ActiveField::Username),
                "*".repeat(tui.password.chars().count()),
                cursor(ActiveField::Password),
                error.unwrap_or(""),
            );
            f.render_widget(Paragraph::new(body).block(Block::default().borders(Borders::ALL).title(title)), chunks[1]);
            render_footer(f, chunks[2], &tui.status, "info");
        }
        View::ManageTodos(manage) => {
            let header = Paragraph::new("Enter: toggle, n: new, e: edit, d: delete, f: filter, b/w: back/forward, a: toggle all, c: clear completed, o: log out, q: quit")
                .block(Block::default().borders(Borders::ALL).title(format!("todos of {}", manage.user().username)));
            f.render_widget(header, chunks[0]);

            let list_items: Vec<ListItem> = manage.visible().into_iter().map(|t| {
                let mark = if t.done { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {}", mark, t.content))
            }).collect();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("items [{}]", manage.filter().current())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, chunks[1], &mut tui.list_state);

            let stats = manage.stats();
            let (title, text) = match tui.mode {
                Mode::View => ("info", format!("{} total, {} done, {} remaining  |  filter=[{}]  {}", stats.total, stats.done, stats.remaining, manage.filter().current(), tui.status)),
                Mode::Create => ("create", format!("Content: {}_  |  Enter to save, Esc to cancel", tui.draft)),
                Mode::Edit => ("edit", format!("Content: {}_  |  Enter to save, Esc to cancel", tui.draft)),
            };
            render_footer(f, chunks[2], &text, title);
        }
    }
}

fn render_footer(f: &mut Frame, area: Rect, text: &str, title: &str) {
    let footer = Paragraph::new(text.to_string()).block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(footer, area);
}
