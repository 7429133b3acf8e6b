use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use likesync::{cli, config, error, transfer::DEFAULT_PLAYLIST_NAME, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Defaults to `transfer` when omitted
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Copy liked songs into a YouTube playlist
    Transfer(TransferOptions),

    /// Authorize with Spotify or YouTube and cache the credential
    Auth(AuthOptions),

    /// List your Spotify liked songs
    Liked,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TransferOptions {
    /// Title of the destination playlist
    #[clap(long, default_value = DEFAULT_PLAYLIST_NAME)]
    pub playlist: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    #[command(subcommand)]
    pub provider: Provider,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Provider {
    /// Authorize read access to your Spotify library
    Spotify,
    /// Authorize playlist management on YouTube
    Youtube,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Command::Completions(opt)) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    match cli.command {
        None => cli::transfer(&settings, DEFAULT_PLAYLIST_NAME).await,
        Some(Command::Transfer(opt)) => cli::transfer(&settings, &opt.playlist).await,
        Some(Command::Auth(opt)) => match opt.provider {
            Provider::Spotify => cli::auth_spotify(&settings).await,
            Provider::Youtube => cli::auth_youtube(&settings).await,
        },
        Some(Command::Liked) => cli::liked(&settings).await,
        Some(Command::Completions(_)) => {}
    }
}
