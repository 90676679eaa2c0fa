use clap::Parser;
use log::{info, warn};
use review_config::{AppConfig, FileStore, KeyValueStore};
use review_engine::{
    DiffCache, DiffViewMode, HashSynchronizer, MemoryHistory, ReviewSession, ReviewStore,
    RowProjector, SessionConfig, SessionKey, UnifiedDiffParser,
};
use review_host::{FixtureClient, PullRequestFixture};
use std::path::PathBuf;
use std::sync::Arc;

mod command_id;
mod keymap;
mod logger;
mod render;
mod replay;

use keymap::default_keymap;
use replay::Replay;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "pr-review")]
#[command(version)]
#[command(about = "Replay a pull request review session from a fixture")]
#[command(after_help = keys_help())]
struct Args {
    /// Pull request fixture (JSON)
    fixture: PathBuf,

    /// Deep link to apply after opening, e.g. "file=src/main.rs&L=12"
    #[arg(long)]
    link: Option<String>,

    /// Keys to replay in order
    #[arg(long, default_value = "")]
    keys: String,
}

fn keys_help() -> String {
    let mut help = String::from("Keys:");
    for binding in default_keymap().bindings() {
        help.push_str(&format!("\n  {}  {}", binding.key, binding.command.description()));
    }
    help
}

fn open_storage() -> Option<Arc<dyn KeyValueStore>> {
    match FileStore::open_default() {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Session state will not be persisted: {:#}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_file = logger::init()?;
    info!("Starting pr-review, logging to {}", log_file.display());

    let config = AppConfig::load();
    let fixture = PullRequestFixture::load(&args.fixture)?;
    let key = SessionKey::new(&fixture.owner, &fixture.repo, fixture.pull_request.number);

    let store = ReviewStore::new(
        key,
        DiffViewMode::from(config.default_diff_view_mode),
        open_storage(),
    );
    let session = ReviewSession::new(
        store.clone(),
        Arc::new(FixtureClient::new(fixture)),
        Arc::new(UnifiedDiffParser::with_theme(&config.syntax_theme)),
        DiffCache::shared(config.diff_cache_capacity),
        SessionConfig::from(&config),
    );
    session.open().await?;

    let history = Arc::new(MemoryHistory::new());
    let sync = HashSynchronizer::attach(store.clone(), history.clone());

    if let Some(link) = &args.link {
        if sync.navigate_from_hash(link) {
            session.load_selected().await;
        } else {
            eprintln!("Ignoring deep link {link}");
        }
    }
    if store.get_snapshot().selected_file.is_none() {
        session.select_next_file().await;
    }

    let replay = Replay::new(
        &session,
        sync.clone(),
        history,
        default_keymap(),
        config.page_jump,
    );
    replay.run(&args.keys).await;

    let state = store.get_snapshot();
    let rows = RowProjector::new().project(&state);
    print!("{}", render::render(&state, &rows));
    if let Some(link) = sync.current_link() {
        println!("\n#{link}");
    }

    sync.detach();
    info!("Exiting pr-review");
    Ok(())
}
