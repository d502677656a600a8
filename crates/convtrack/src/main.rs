use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;

use convtrack::api::{ArtifactKind, ConversionApi, HttpConversionApi, JobId};
use convtrack::board::{ConversionBoard, RenameOutcome};
use convtrack::config::{
    default_config_path, expand_home, load_config, validate_config, ClientConfig,
};
use convtrack::credentials::{CredentialAccessor, TokenStore};
use convtrack::download::FileSystemSink;
use convtrack::logging::init_logging;
use convtrack::notify::{Notice, NoticeCenter, NoticeLevel};
use convtrack::ConvtrackError;

#[derive(Parser)]
#[command(author, version, about = "Track audio conversion jobs and fetch their transcripts", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Service URL, used when no config file is present
    #[arg(long, env = "CONVTRACK_BASE_URL")]
    server: Option<String>,

    /// Only show jobs of this owner (administrators)
    #[arg(long, global = true)]
    search: Option<String>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the board once
    List,
    /// Keep the board updated until no job is active (or Ctrl-C)
    Watch,
    /// Save an artifact of a completed job
    Download {
        id: JobId,
        /// txt, docx or pdf
        kind: ArtifactKind,
        /// Directory to save into (defaults to the configured one)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Change a job's display name
    Rename { id: JobId, name: String },
    /// Delete a job and its artifacts
    Delete {
        id: JobId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Submit a media file for conversion
    Upload {
        file: PathBuf,
        /// Spoken language, or "auto" to detect
        #[arg(long, default_value = "auto")]
        language: String,
        /// Display name (defaults to the file name without extension)
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// Forget the stored token
    Logout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, ConvtrackError> {
    let path = cli
        .config
        .clone()
        .or_else(|| default_config_path().filter(|p| p.exists()));

    let mut config = match (path, &cli.server) {
        (Some(path), _) => load_config(path)?,
        (None, Some(server)) => ClientConfig::for_server(server),
        (None, None) => {
            return Err(convtrack::ConfigError::Validation {
                message: "no config file found; pass --config or --server".to_string(),
            }
            .into())
        }
    };

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    validate_config(&config)?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode, ConvtrackError> {
    let config = resolve_config(&cli)?;
    init_logging(&config.logging)?;

    let credentials = Arc::new(TokenStore::from_config(&config.credentials));
    if let Commands::Logout = cli.command {
        credentials.clear()?;
        println!("Signed out");
        return Ok(ExitCode::SUCCESS);
    }

    let api: Arc<dyn ConversionApi> =
        Arc::new(HttpConversionApi::new(&config.server, credentials.clone())?);
    let viewer = api.current_user().await?;

    if let Commands::Whoami = cli.command {
        println!(
            "{} <{}>{}  credits: {:.1}",
            viewer.username,
            viewer.email,
            if viewer.is_privileged() { " (admin)" } else { "" },
            viewer.credits
        );
        return Ok(ExitCode::SUCCESS);
    }

    let download_dir = match &cli.command {
        Commands::Download {
            output: Some(dir), ..
        } => dir.clone(),
        _ => PathBuf::from(expand_home(&config.downloads.directory)),
    };
    let notices = NoticeCenter::default();
    let mut rx = notices.subscribe();
    let mut board = ConversionBoard::new(
        viewer,
        api,
        credentials,
        Arc::new(FileSystemSink::new(download_dir)),
        &config.polling,
        notices,
    );

    if let Some(search) = &cli.search {
        match board.search() {
            Some(filter) => filter.set_input(search.clone()),
            None => eprintln!("--search is only available to administrators, ignoring"),
        }
    }

    let ok = match cli.command {
        Commands::List => {
            let result = if cli.search.is_some() && board.viewer().is_privileged() {
                board.submit_search().await
            } else {
                board.refresh().await
            };
            print!("{}", board.render());
            result.is_ok()
        }
        Commands::Watch => {
            let filtered = cli.search.is_some() && board.viewer().is_privileged();
            watch(&mut board, &mut rx, filtered).await
        }
        Commands::Download { id, kind, .. } => {
            let _ = board.refresh().await;
            match board.download(id, kind).await {
                Ok(saved) => {
                    println!("Saved {}", saved.path.display());
                    true
                }
                Err(_) => false,
            }
        }
        Commands::Rename { id, name } => {
            let _ = board.refresh().await;
            match board.begin_edit(id) {
                Ok(()) => {
                    board.set_draft(name);
                    match board.commit_edit().await {
                        Ok(RenameOutcome::Unchanged { .. }) => {
                            println!("Name unchanged");
                            true
                        }
                        Ok(RenameOutcome::Renamed { .. }) => true,
                        Err(_) => false,
                    }
                }
                Err(e) => {
                    eprintln!("{}", e);
                    false
                }
            }
        }
        Commands::Delete { id, yes } => {
            if !yes {
                eprintln!("Deleting conversion {} cannot be undone; pass --yes to confirm", id);
                false
            } else {
                board.delete(id).await.is_ok()
            }
        }
        Commands::Upload {
            file,
            language,
            name,
        } => board
            .upload(&file, Some(&language), name.as_deref())
            .await
            .is_ok(),
        Commands::Whoami | Commands::Logout => true,
    };

    print_pending(&mut rx);
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Mounts the board and reprints it whenever a refresh lands, until no job
/// is active or the user interrupts.
async fn watch(
    board: &mut ConversionBoard,
    rx: &mut broadcast::Receiver<Notice>,
    filtered: bool,
) -> bool {
    if filtered {
        if let Some(filter) = board.search() {
            filter.submit();
        }
    }
    board.mount().await;
    print!("{}", board.render());
    print_pending(rx);

    let mut seen = board.jobs().revision();
    let mut check = tokio::time::interval(std::time::Duration::from_millis(250));
    while board.jobs().has_active_jobs() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
            _ = check.tick() => {
                print_pending(rx);
                let revision = board.jobs().revision();
                if revision != seen {
                    seen = revision;
                    println!();
                    print!("{}", board.render());
                }
            }
        }
    }

    board.unmount();
    true
}

fn print_pending(rx: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        match notice.level {
            NoticeLevel::Success => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("{}", notice.message),
        }
    }
}
