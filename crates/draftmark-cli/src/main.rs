use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use draftmark_config::Config;
use draftmark_engine::editing::{
    CommandResolver, EditKey, KeyIntent, Modifiers, ResolverConfig, Session, SessionAdapter,
    Snapshot, mutators,
};
use draftmark_engine::io::{self, ExportOptions};
use draftmark_engine::models::{self, BlockType, CharMeta, Document, InlineStyle, Selection};
use log::{info, warn};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

const SAMPLE_DOCUMENT: &str = "# Headline 1

Hello

* World
* Second
* Third

OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Left,
    Right,
    Up,
    Down,
}

struct App {
    session: Session,
    resolver: CommandResolver,
    path: Option<PathBuf>,
    status: String,
}

impl App {
    fn new(session: Session, resolver: CommandResolver, path: Option<PathBuf>) -> Self {
        let status = match &path {
            Some(path) => format!("Editing {}", path.display()),
            None => "Editing sample document (Ctrl+S needs a FILE argument)".to_string(),
        };
        Self {
            session,
            resolver,
            path,
            status,
        }
    }

    /// Apply one keystroke; returns false when the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let modifiers = Modifiers {
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            alt: key.modifiers.contains(KeyModifiers::ALT),
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        };

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('q') if modifiers.ctrl => return false,
            KeyCode::Char('s') if modifiers.ctrl => {
                if let Err(e) = self.save() {
                    self.status = format!("Save failed: {e}");
                }
            }
            KeyCode::Char(c) if modifiers.alt => self.toggle_block_type(c),
            KeyCode::Char(c) if !modifiers.ctrl => {
                let text = c.to_string();
                self.session.apply(|s| mutators::insert_text(s, &text));
            }
            KeyCode::Enter => self.press_return(modifiers),
            KeyCode::Tab => self.press_tab(Modifiers::NONE),
            KeyCode::BackTab => self.press_tab(Modifiers::SHIFT),
            KeyCode::Backspace => {
                if let Some(next) = mutators::backspace(self.session.current()) {
                    self.session.commit(next);
                }
            }
            KeyCode::Left => self.move_cursor(Motion::Left),
            KeyCode::Right => self.move_cursor(Motion::Right),
            KeyCode::Up => self.move_cursor(Motion::Up),
            KeyCode::Down => self.move_cursor(Motion::Down),
            _ => {}
        }
        true
    }

    fn press_return(&mut self, modifiers: Modifiers) {
        let intent = KeyIntent::new(EditKey::Return, modifiers);
        if !self.session.dispatch(&self.resolver, intent) {
            self.session.apply(mutators::split_block);
        }
    }

    fn press_tab(&mut self, modifiers: Modifiers) {
        let intent = KeyIntent::new(EditKey::Tab, modifiers);
        if !self.session.dispatch(&self.resolver, intent) {
            self.status = "Tab only changes the depth of list items".to_string();
        }
    }

    fn toggle_block_type(&mut self, key: char) {
        let block_type = match key {
            '0' => BlockType::Unstyled,
            'u' => BlockType::UnorderedListItem,
            'o' => BlockType::OrderedListItem,
            'c' => BlockType::CodeBlock,
            level => match level.to_digit(10).and_then(|d| BlockType::header(d as u8)) {
                Some(header) => header,
                None => return,
            },
        };
        self.session
            .apply(|s| mutators::toggle_block_type(s, block_type));
    }

    fn move_cursor(&mut self, motion: Motion) {
        let snapshot = self.session.current();
        let document = snapshot.document();
        let key = snapshot.selection().focus_key.clone();
        let offset = snapshot.selection().focus_offset;
        let block = document.block_for_key(&key);

        let (target, target_offset) = match motion {
            Motion::Left if offset > 0 => (key, offset - 1),
            Motion::Left => match document.block_before(&key) {
                Some(previous) => (previous.key().clone(), previous.len()),
                None => (key, 0),
            },
            Motion::Right if offset < block.len() => (key, offset + 1),
            Motion::Right => match document.block_after(&key) {
                Some(next) => (next.key().clone(), 0),
                None => (key, offset),
            },
            Motion::Up => match document.block_before(&key) {
                Some(previous) => (previous.key().clone(), offset.min(previous.len())),
                None => (key, 0),
            },
            Motion::Down => match document.block_after(&key) {
                Some(next) => (next.key().clone(), offset.min(next.len())),
                None => (key, block.len()),
            },
        };

        match snapshot.with_selection(Selection::collapsed(target, target_offset)) {
            Ok(moved) => self.session.commit(moved),
            Err(e) => warn!("cursor move rejected: {e}"),
        }
    }

    fn save(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            self.status = "No file to save to: start with draftmark-cli FILE".to_string();
            return Ok(());
        };
        io::write_document(
            path,
            self.session.current().document(),
            self.session.export_options(),
        )?;
        info!("saved version {} to {}", self.session.version(), path.display());
        self.status = format!("Saved {}", path.display());
        Ok(())
    }
}

fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [FILE]", args[0]);
        process::exit(1);
    }

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring config file: {e}");
            Config::default()
        }
    };
    let path = args.get(1).map(PathBuf::from).or(config.document.clone());

    let export = ExportOptions {
        gfm: config.export.gfm,
    };
    let document = match &path {
        Some(path) if path.exists() => io::read_document(path)?,
        Some(_) => Document::empty(),
        None => io::parse_markdown(SAMPLE_DOCUMENT),
    };
    let session = Session::new(Snapshot::from_document(document), export);
    let resolver = CommandResolver::new(ResolverConfig {
        max_depth: config.editor.max_list_depth,
    });
    let mut app = App::new(session, resolver, path);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Log to the file named by `DRAFTMARK_LOG` when set, since stderr is hidden
/// behind the alternate screen
fn init_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = env::var_os("DRAFTMARK_LOG") {
        let file = std::fs::File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[0]);

    let snapshot = app.session.current();
    let selection = snapshot.selection();
    let lines: Vec<Line> = snapshot
        .document()
        .blocks()
        .iter()
        .flat_map(|block| {
            let cursor = (block.key() == &selection.focus_key).then_some(selection.focus_offset);
            block_lines(block, cursor)
        })
        .collect();

    let editor = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Document"))
        .wrap(Wrap { trim: false });
    f.render_widget(editor, columns[0]);

    let markdown = Paragraph::new(app.session.markdown().to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Markdown (v{})", app.session.version())),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(markdown, columns[1]);

    let help = Paragraph::new(vec![
        Line::from(Span::styled(
            app.status.clone(),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(Span::raw(
            "Esc/Ctrl+Q: Quit | Ctrl+S: Save | Alt+Enter: Soft newline | Tab/Shift+Tab: Depth | Alt+0-6/u/o/c: Block type",
        )),
    ]);
    f.render_widget(help, rows[1]);
}

/// Marker shown before a block's first line and the indent for its later lines
fn block_prefix(block: &models::Block) -> (String, String) {
    let indent = "  ".repeat(block.depth());
    let marker = match block.block_type() {
        BlockType::Unstyled => String::new(),
        BlockType::UnorderedListItem => "• ".to_string(),
        BlockType::OrderedListItem => "1. ".to_string(),
        BlockType::CodeBlock => "│ ".to_string(),
        header => format!("{} ", "#".repeat(header.header_level().unwrap_or(1) as usize)),
    };
    let continuation = if block.block_type() == BlockType::CodeBlock {
        format!("{indent}│ ")
    } else {
        " ".repeat(indent.chars().count() + marker.chars().count())
    };
    (format!("{indent}{marker}"), continuation)
}

fn inline_style(meta: &CharMeta, block_type: BlockType) -> Style {
    let mut style = match block_type {
        BlockType::CodeBlock => Style::default().fg(Color::Yellow),
        header if header.header_level().is_some() => {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        }
        _ => Style::default(),
    };
    for inline in &meta.style {
        style = match inline {
            InlineStyle::Bold => style.add_modifier(Modifier::BOLD),
            InlineStyle::Italic => style.add_modifier(Modifier::ITALIC),
            InlineStyle::Underline => style.add_modifier(Modifier::UNDERLINED),
            InlineStyle::Code => style.fg(Color::Yellow),
        };
    }
    if meta.entity.is_some() {
        style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Render one block, splitting soft newlines onto their own lines and
/// highlighting the character under the cursor
fn block_lines(block: &models::Block, cursor: Option<usize>) -> Vec<Line<'static>> {
    let (prefix, continuation) = block_prefix(block);
    let chars: Vec<char> = block.text().chars().collect();
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);

    let mut lines = Vec::new();
    let mut spans = vec![Span::styled(prefix, Style::default().fg(Color::DarkGray))];
    for (range, meta) in block.style().ranges() {
        let style = inline_style(meta, block.block_type());
        let mut run = String::new();
        for offset in range {
            let c = chars[offset];
            let at_cursor = cursor == Some(offset);
            if at_cursor || c == '\n' {
                if !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), style));
                }
            }
            if at_cursor {
                let shown = if c == '\n' { ' ' } else { c };
                spans.push(Span::styled(shown.to_string(), style.patch(cursor_style)));
            }
            if c == '\n' {
                lines.push(Line::from(std::mem::take(&mut spans)));
                spans.push(Span::raw(continuation.clone()));
            } else if !at_cursor {
                run.push(c);
            }
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, style));
        }
    }
    if cursor == Some(chars.len()) {
        spans.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(spans));
    lines.push(Line::from(""));
    lines
}
