use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_playlist::authorize_youtube_client;
use youtube_playlist::config::{self, Config};
use youtube_playlist::oauth::CLIENT_SECRETS_FILE;
use youtube_playlist::playlist_builder::{add_video, create_empty_playlist, read_video_list};
use youtube_playlist::prompt::{ConsolePrompt, LoopbackPrompt};
use youtube_playlist::source::{self, SourceFormat};
use youtube_playlist::token_store::{FileTokenStore, TOKEN_STORE_FILE};
use youtube_playlist::youtube_api::{NewPlaylist, YouTubeClient};

/// Create a YouTube playlist from the video URLs listed in a results file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding settings.cfg, client_secrets.json, and the oauth2.json token store
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// File listing the videos, one `Url:` line per video
    #[arg(long, default_value = source::SOURCE_FILE)]
    source: PathBuf,

    /// Character in front of the video identifier on each `Url:` line
    #[arg(long, default_value_t = '?')]
    delimiter: char,

    /// Don't open a browser or listen for the OAuth redirect; paste the result instead
    #[arg(long)]
    no_browser: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    println!("### Script started at {} ###\n", now());

    let config = Config::load(&args.config_dir.join(config::SETTINGS_FILE))?;

    let yt = authorize(&args, &config).await?;

    let playlist = NewPlaylist {
        title: config.playlist_title,
        description: config.playlist_description,
        privacy: config.privacy,
    };
    let videos =
        read_video_list(&args.source, &SourceFormat::with_delimiter(args.delimiter)).await?;

    let created = create_empty_playlist(&yt, &playlist).await?;
    println!("New playlist added: {}", playlist.title);
    println!("\tID: {}", created.id);
    println!("\tURL: {}", created.url());
    println!("\tPrivacy: {}", playlist.privacy);

    for video_id in &videos {
        let video = add_video(&yt, &created.id, video_id).await?;
        println!(
            "\tVideo added: {} ({})",
            video.title.as_deref().unwrap_or("<untitled>"),
            video.video_id
        );
    }

    println!("\n### Script finished at {} ###", now());

    Ok(())
}

async fn authorize(args: &Args, config: &Config) -> eyre::Result<YouTubeClient> {
    let client_secrets = args.config_dir.join(CLIENT_SECRETS_FILE);
    let store = FileTokenStore::new(args.config_dir.join(TOKEN_STORE_FILE));
    let http_client = reqwest::Client::builder()
        .build()
        .context("build HTTP client")?;

    if args.no_browser {
        let mut prompt = ConsolePrompt::default();
        authorize_youtube_client(&config.api_key, &client_secrets, &store, &mut prompt, http_client)
            .await
    } else {
        let mut prompt = LoopbackPrompt::bind().await?;
        authorize_youtube_client(&config.api_key, &client_secrets, &store, &mut prompt, http_client)
            .await
    }
}

fn now() -> String {
    jiff::Zoned::now().strftime("%a %b %d %H:%M:%S %Y").to_string()
}
