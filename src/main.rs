use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use podsync::config::Config;
use podsync::db::{self, Database};
use podsync::model::{Episode, Podcast};
use podsync::repo::{CatalogRepository, EpisodeRepository, PodcastRepository};
use podsync::source::{LocalSource, RemoteSource};

#[derive(Parser, Debug)]
#[command(name = "podsync")]
#[command(about = "Local-first podcast catalog with remote sync")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/podsync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List followed podcasts from the local catalog
  List {
    /// Re-sync from the remote catalog before listing
    #[arg(short, long)]
    refresh: bool,
  },
  /// List episodes from the local catalog
  Episodes {
    /// Re-sync from the remote catalog before listing
    #[arg(short, long)]
    refresh: bool,
  },
  /// Replace the local catalog with the remote's current contents
  Refresh,
  /// Follow a podcast, saved locally and pushed upstream
  Follow {
    id: i64,
    title: String,
    author: String,
    /// Cached artwork asset id
    #[arg(long, default_value_t = 0)]
    image: i64,
  },
  /// Delete every podcast and episode, locally and upstream
  Wipe,
  /// Print live catalog snapshots, re-syncing on an interval
  Watch {
    /// Seconds between remote re-syncs
    #[arg(short, long, default_value_t = 60)]
    interval: u64,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing()?;

  let config = Config::load(args.config.as_deref())?;
  let (podcasts, episodes) = open_repositories(&config)?;

  match args.command {
    Command::List { refresh } => {
      print_podcasts(&podcasts.fetch_all(refresh).await?);
    }
    Command::Episodes { refresh } => {
      print_episodes(&episodes.fetch_all(refresh).await?);
    }
    Command::Refresh => {
      podcasts.refresh().await?;
      episodes.refresh().await?;
      println!("Catalog synced from remote.");
    }
    Command::Follow {
      id,
      title,
      author,
      image,
    } => {
      let podcast = Podcast::new(id, title, author, image);
      podcasts.save(&podcast).await?;
      println!("Following {} by {}", podcast.title, podcast.author);
    }
    Command::Wipe => {
      podcasts.delete_all().await?;
      episodes.delete_all().await?;
      println!("Catalog cleared locally and upstream.");
    }
    Command::Watch { interval } => {
      watch_podcasts(&podcasts, Duration::from_secs(interval)).await?;
    }
  }

  Ok(())
}

/// Set up file logging in the data directory; stdout belongs to the command
/// output.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = db::default_data_dir()?;
  std::fs::create_dir_all(&log_dir).map_err(|e| eyre!("Failed to create data directory: {}", e))?;

  let appender = tracing_appender::rolling::never(log_dir, "podsync.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

fn open_repositories(config: &Config) -> Result<(PodcastRepository, EpisodeRepository)> {
  let db = match &config.database {
    Some(path) => Database::open_at(path)?,
    None => Database::open()?,
  };
  let db = Arc::new(db);

  let podcasts = CatalogRepository::new(
    LocalSource::new(Arc::clone(&db))?,
    RemoteSource::new(config)?,
  );
  let episodes = CatalogRepository::new(
    LocalSource::new(Arc::clone(&db))?,
    RemoteSource::new(config)?,
  );

  Ok((podcasts, episodes))
}

/// Subscribe to the live sequence and re-sync on a timer, printing each
/// snapshot as it lands. Runs until interrupted.
async fn watch_podcasts(podcasts: &PodcastRepository, interval: Duration) -> Result<()> {
  let mut rx = podcasts.watch()?;
  print_podcasts(&rx.borrow_and_update().clone());

  let mut ticker = tokio::time::interval(interval);
  loop {
    tokio::select! {
      changed = rx.changed() => {
        changed.map_err(|_| eyre!("Live sequence closed"))?;
        println!();
        print_podcasts(&rx.borrow_and_update().clone());
      }
      _ = ticker.tick() => {
        if let Err(e) = podcasts.refresh().await {
          warn!("Refresh failed: {}", e);
        }
      }
    }
  }
}

fn print_podcasts(entries: &[Podcast]) {
  if entries.is_empty() {
    println!("No podcasts followed.");
    return;
  }

  for podcast in entries {
    println!(
      "{:>6}  {:<40}  {:<24}  followed {}",
      podcast.id,
      podcast.title,
      podcast.author,
      podcast.followed_date.format("%Y-%m-%d")
    );
  }
}

fn print_episodes(entries: &[Episode]) {
  if entries.is_empty() {
    println!("No episodes in the catalog.");
    return;
  }

  for episode in entries {
    println!(
      "{:>6}  {:<10}  {:<48}  {:?}",
      episode.id, episode.code, episode.title, episode.download_status
    );
  }
}
