mod app;
mod catalog;
mod config;
mod constants;
mod content;
mod display;
mod graphics;
mod html;
mod input;
mod locale;
mod logging;
mod player;
mod policy;
mod render;
mod sequencer;
mod site;
mod state;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use app::App;
use catalog::Category;
use config::Config;
use constants::constants;
use content::{ContentDocument, ContentSource, load_content};
use display::CliDisplayMode;
use locale::Lang;
use site::PageRequest;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Browse the KJ Kids channel in the terminal or as static pages")]
struct Args {
  #[command(subcommand)]
  command: Option<Command>,

  /// Content document: a URL or a local path (default from the built-in constants)
  #[arg(long, global = true)]
  content: Option<String>,

  /// Display language; overrides the saved preference for this run
  #[arg(long, global = true, value_enum)]
  lang: Option<Lang>,

  /// Display mode: 'auto', 'kitty', 'sixel', 'direct', or 'ascii' (default: auto-detect)
  #[arg(short, long, global = true, default_value = "auto")]
  display_mode: CliDisplayMode,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Interactive terminal browser (the default)
  Browse {
    /// Open a letter lesson page instead of the videos tab
    #[arg(long)]
    letter: Option<String>,
  },
  /// Render one HTML page
  Render {
    /// Tab ('videos', 'shorts', 'playlists') or a letter key
    #[arg(long, default_value = "videos")]
    tab: String,
    #[arg(short, long, default_value = "")]
    query: String,
    /// How many cards to show
    #[arg(long)]
    visible: Option<usize>,
    /// Render a letter page (takes precedence over --tab)
    #[arg(long)]
    letter: Option<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Write every tab and letter page into a directory
  Site {
    #[arg(short, long)]
    out: PathBuf,
  },
  /// Print shell completions
  Completions { shell: clap_complete::Shell },
}

fn content_source(args: &Args) -> ContentSource {
  ContentSource::parse(args.content.as_deref().unwrap_or(&constants().content_source))
}

fn page_lang(args: &Args) -> Lang {
  args.lang.or_else(|| Config::load().lang()).unwrap_or_default()
}

async fn load(args: &Args) -> Result<ContentDocument> {
  let client = reqwest::Client::new();
  load_content(&client, &content_source(args)).await
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let mut args = Args::parse();

  match args.command.take().unwrap_or(Command::Browse { letter: None }) {
    Command::Completions { shell } => {
      clap_complete::generate(shell, &mut Args::command(), "kjkids", &mut std::io::stdout());
      Ok(())
    }
    Command::Render { tab, query, visible, letter, out } => {
      logging::init_stderr()?;
      let doc = load(&args).await?;
      let category = letter.map(Category::Letter).unwrap_or_else(|| Category::parse(&tab));
      let request = PageRequest { lang: page_lang(&args), category, query, visible };
      if let Some(body) = site::write_single(&doc, &request, out.as_deref()).await? {
        let mut stdout = std::io::stdout();
        stdout.write_all(body.as_bytes()).context("Failed to write page to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
      }
      Ok(())
    }
    Command::Site { out } => {
      logging::init_stderr()?;
      let doc = load(&args).await?;
      let written = site::write_site(&doc, page_lang(&args), &out).await?;
      eprintln!("Wrote {} pages to {}", written.len(), out.display());
      Ok(())
    }
    Command::Browse { letter } => browse(args, letter).await,
  }
}

async fn browse(args: Args, letter: Option<String>) -> Result<()> {
  let log_dir = config::project_dirs()
    .map(|dirs| dirs.data_dir().join("logs"))
    .unwrap_or_else(|| std::env::temp_dir().join("kjkids-logs"));
  let _guard = logging::init_file(&log_dir)?;

  let display_mode = display::resolve_display_mode(args.display_mode);
  let category = letter.map(Category::Letter).unwrap_or_default();
  let source = content_source(&args);
  info!(source = %source, mode = %display_mode.label(), "kjkids starting");
  let mut app = App::new(source, args.lang, category, display_mode);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  app.start();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if app.display_mode.uses_graphics_protocol() {
      sync_protocol_thumbnail(app)?;
    }

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  graphics::clear(app.display_mode)?;
  app.stop().await?;
  Ok(())
}

/// Kitty/Sixel images live outside ratatui's buffer: resend only when the
/// selected thumbnail or its area changes, and clear when the pane goes away.
fn sync_protocol_thumbnail(app: &mut App) -> Result<()> {
  let mode = app.display_mode;
  let selected = app.selected_thumbnail().map(|(id, _)| id.to_string());
  match (app.gfx.thumb_area, selected) {
    (Some(area), Some(video_id)) => {
      let key = (video_id, area);
      if app.gfx.last_sent.as_ref() != Some(&key) {
        if let Some(image) = app.thumbnails.get(&key.0) {
          graphics::paint(mode, image, area)?;
        }
        app.gfx.last_sent = Some(key);
      }
    }
    _ => {
      if app.gfx.last_sent.take().is_some() {
        graphics::clear(mode)?;
      }
    }
  }
  Ok(())
}
