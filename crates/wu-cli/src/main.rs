//! `wu` CLI: operator tool for the WU marketplace client.
//!
//! Renders a page offline through the same boot pipeline the site runs
//! (partials, auth gating, controllers), inspects identity tokens, and
//! queries the backend API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wu_client::{ApiClient, SessionProvider, StaticSession, UploadOptions};
use wu_core::{
    AuthState, Boot, BootContext, BootReport, ClientConfig, DirFragmentSource, Document,
    FragmentSource, HttpFragmentSource,
};
use wu_storage::{BrowserStorage, JsonFileStorage, MemoryStorage, WebStorage};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

// ── CLI structure ────────────────────────────────────────────────────

/// WU marketplace client tool.
#[derive(Parser)]
#[command(
    name = "wu",
    version,
    about = "WU CLI: render marketplace pages, inspect tokens, query the API",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         WU_API_BASE_URL          Backend API base URL\n  \
         WU_MEDIA_BASE_URL        Public media base URL\n  \
         WU_ID_TOKEN              Identity token of the acting user\n  \
         WU_STATE_FILE            JSON file used as persistent local storage\n  \
         WU_SESSION_TIMEOUT_SECS  Page guard session timeout (default 8)\n  \
         WU_LOG_LEVEL             Log filter when RUST_LOG is unset\n  \
         WU_LOG_JSON              Emit logs as JSON\n\n\
         {DIM}Examples:{RESET}\n  \
         wu render site/tryouts.html\n  \
         wu render site/profile.html --url '/w/kid-lightning'\n  \
         wu whoami\n  \
         wu state --state ~/.wu/state.json\n  \
         wu upload me.jpg --key avatars/me.jpg --avatar"
    ),
)]
struct Cli {
    /// Backend API base URL.
    #[arg(long, global = true, env = "WU_API_BASE_URL")]
    api: Option<String>,

    /// Public base URL for uploaded media.
    #[arg(long, global = true, env = "WU_MEDIA_BASE_URL")]
    media: Option<String>,

    /// Identity token of the acting user.
    #[arg(long, global = true, env = "WU_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// JSON file used as persistent local storage across runs.
    #[arg(long, global = true, env = "WU_STATE_FILE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a page and print the resulting HTML.
    Render {
        /// HTML file to render.
        file: PathBuf,
        /// URL the page is served at (defaults to `/<file name>`).
        #[arg(long)]
        url: Option<String>,
        /// Directory partials are read from (defaults to the file's directory).
        #[arg(long, conflicts_with = "origin")]
        root: Option<PathBuf>,
        /// Fetch partials over HTTP instead, resolving include URLs against this base URL.
        #[arg(long)]
        origin: Option<String>,
    },
    /// Decode the identity token and show the resulting auth state.
    Whoami,
    /// Show the entries kept in the local state file.
    State,
    /// List tryouts.
    Tryouts {
        /// Only the signed-in promoter's tryouts.
        #[arg(long)]
        mine: bool,
    },
    /// Show one tryout.
    Tryout {
        /// Tryout id.
        id: String,
    },
    /// List public wrestler profiles.
    Talent,
    /// Show a wrestler's public profile.
    Wrestler {
        /// Profile handle.
        handle: String,
    },
    /// List applications to a tryout.
    Applications {
        /// Tryout id.
        tryout_id: String,
    },
    /// Upload a file through a presigned URL.
    Upload {
        /// File to upload.
        file: PathBuf,
        /// Object key to store it under.
        #[arg(long)]
        key: String,
        /// Content type (guessed from the extension when omitted).
        #[arg(long)]
        content_type: Option<String>,
        /// Upload as a profile photo (server-side encryption).
        #[arg(long)]
        avatar: bool,
    },
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(title: &str) {
    println!("{BOLD}{CYAN}{title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<14}{RESET} {value}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

// ── Entry point ──────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api) = cli.api.clone() {
        config.api_base_url = api;
    }
    if let Some(media) = cli.media.clone() {
        config.media_base_url = Some(media);
    }
    init_logging(&config.log_level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{RED}{BOLD}✗ Error:{RESET} {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var_os("WU_LOG_JSON").is_some() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let session: Arc<dyn SessionProvider> = Arc::new(StaticSession::from_id_token(cli.token));

    match cli.command {
        Commands::Render {
            file,
            url,
            root,
            origin,
        } => {
            let local = local_storage(cli.state.as_deref()).await?;
            let fragments: Arc<dyn FragmentSource> = match origin {
                Some(origin) => Arc::new(
                    HttpFragmentSource::new(&origin)
                        .with_context(|| format!("invalid --origin {origin}"))?,
                ),
                None => {
                    let root = root
                        .or_else(|| file.parent().map(Path::to_path_buf))
                        .unwrap_or_default();
                    Arc::new(DirFragmentSource::new(root))
                }
            };
            cmd_render(&file, url, config, session, local, fragments).await
        }
        Commands::Whoami => cmd_whoami(session).await,
        Commands::State => {
            let Some(path) = cli.state.as_deref() else {
                bail!("no state file: pass --state or set WU_STATE_FILE");
            };
            let local = local_storage(Some(path)).await?;
            cmd_state(local.as_ref()).await
        }
        command => {
            let api = ApiClient::new(config.api_config(), session)
                .context("failed to build API client")?;
            cmd_api(&api, command).await
        }
    }
}

async fn local_storage(state: Option<&Path>) -> Result<Arc<dyn WebStorage>> {
    Ok(match state {
        Some(path) => Arc::new(
            JsonFileStorage::open(path)
                .await
                .with_context(|| format!("failed to open state file {}", path.display()))?,
        ),
        None => Arc::new(MemoryStorage::new()),
    })
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_render(
    file: &Path,
    url: Option<String>,
    config: ClientConfig,
    session: Arc<dyn SessionProvider>,
    local: Arc<dyn WebStorage>,
    fragments: Arc<dyn FragmentSource>,
) -> Result<()> {
    let html = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let url = url.unwrap_or_else(|| {
        let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        format!("/{name}")
    });

    let storage = BrowserStorage::new(Arc::new(MemoryStorage::new()), local);
    let mut ctx = BootContext::new(Document::parse(&html), &url, config, storage, session, fragments);
    let report = Boot::default().run(&mut ctx).await;

    println!("{}", ctx.document.to_html());
    print_report(&report, &mut ctx);
    Ok(())
}

/// Boot summary on stderr, keeping stdout clean HTML.
fn print_report(report: &BootReport, ctx: &mut BootContext) {
    let page = report.page.as_ref().map_or("-".to_owned(), ToString::to_string);
    eprintln!("{DIM}page:{RESET} {page}");
    eprintln!("{DIM}loaded:{RESET} {}", report.loaded.join(", "));
    for (name, reason) in &report.failed {
        eprintln!("{YELLOW}failed:{RESET} {name}: {reason}");
    }
    if let Some(partials) = ctx.partials.filter(|p| p.exhausted) {
        eprintln!("{YELLOW}partials:{RESET} gave up after {} passes", partials.passes);
    }
    if let Some(to) = &report.navigation {
        eprintln!("{YELLOW}navigates to:{RESET} {to}");
    }
    for script in ctx.document.take_pending_scripts() {
        let what = script.src().map_or_else(|| "inline".to_owned(), str::to_owned);
        eprintln!("{DIM}script:{RESET} {what}");
    }
}

async fn cmd_whoami(session: Arc<dyn SessionProvider>) -> Result<()> {
    let state: AuthState = wu_core::AuthResolver::new(session).get_auth_state().await;

    header("Identity");
    if !state.signed_in() {
        kv_line("Signed in", "no");
        return Ok(());
    }
    kv_line("Signed in", "yes");
    kv_line("Subject", state.subject_id().unwrap_or("-"));
    kv_line("Name", state.display_name().unwrap_or("-"));
    let groups: Vec<&str> = state.groups().iter().map(String::as_str).collect();
    kv_line("Groups", &groups.join(", "));
    let roles: Vec<&str> = state.roles().iter().map(|r| r.as_str()).collect();
    kv_line("Roles", &roles.join(", "));
    Ok(())
}

async fn cmd_state(local: &dyn WebStorage) -> Result<()> {
    header("Local state");
    let keys = local.keys().await.context("failed to list state entries")?;
    if keys.is_empty() {
        println!("  {DIM}empty{RESET}");
    }
    for key in keys {
        let value = local.get(&key).await?.unwrap_or_default();
        println!("  {BOLD}{key}{RESET}  {value}");
    }
    Ok(())
}

async fn cmd_api(api: &ApiClient, command: Commands) -> Result<()> {
    match command {
        Commands::Tryouts { mine } => {
            let tryouts = if mine {
                api.my_tryouts().await?
            } else {
                api.list_tryouts().await?
            };
            header("Tryouts");
            if tryouts.is_empty() {
                println!("  {DIM}none{RESET}");
            }
            for t in tryouts {
                let slots = t.slots.map(|n| format!(" ({n} slots)")).unwrap_or_default();
                println!(
                    "  {BOLD}{}{RESET}  {} · {} · {}  [{}]{slots}",
                    t.id,
                    t.org_name,
                    t.city,
                    t.date,
                    t.status.label()
                );
            }
        }
        Commands::Tryout { id } => {
            let t = api.get_tryout(&id).await?;
            header(&format!("Tryout {}", t.id));
            kv_line("Promotion", &t.org_name);
            kv_line("City", &t.city);
            kv_line("Date", &t.date);
            kv_line("Status", t.status.label());
            kv_line("Requirements", &t.requirements);
        }
        Commands::Talent => {
            let wrestlers = api.list_wrestlers().await?;
            header("Talent");
            for w in wrestlers {
                println!(
                    "  {BOLD}{}{RESET}  {}  {DIM}{}{RESET}",
                    w.stage_name,
                    w.location(),
                    w.slug().unwrap_or("-")
                );
            }
        }
        Commands::Wrestler { handle } => {
            let w = api.get_wrestler(&handle).await?;
            header(&w.stage_name);
            kv_line("Handle", w.slug().unwrap_or("-"));
            kv_line("Location", &w.location());
            kv_line("Gimmicks", &w.gimmicks.join(", "));
            kv_line("Bio", &w.bio);
            if let Some(url) = w.photo_key.as_deref().and_then(|k| api.media_url(k)) {
                kv_line("Photo", &url);
            }
        }
        Commands::Applications { tryout_id } => {
            let apps = api.list_applications(&tryout_id).await?;
            header(&format!("Applications to {tryout_id}"));
            for a in apps {
                let who = a
                    .applicant
                    .as_ref()
                    .map_or("Unnamed applicant", |p| p.stage_name.as_str());
                println!("  {BOLD}{who}{RESET}  {DIM}{}{RESET}", a.timestamp);
                if !a.notes.is_empty() {
                    println!("    {}", a.notes);
                }
                if let Some(reel) = &a.reel_link {
                    println!("    {reel}");
                }
            }
        }
        Commands::Upload {
            file,
            key,
            content_type,
            avatar,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&file).to_owned());
            let options = if avatar {
                UploadOptions::avatar()
            } else {
                UploadOptions::default()
            };
            let stored = api.upload(&key, &content_type, bytes, options).await?;
            success(&format!("uploaded {} as {stored}", file.display()));
        }
        Commands::Render { .. } | Commands::Whoami | Commands::State => bail!("not an API command"),
    }
    Ok(())
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
