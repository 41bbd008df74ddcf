//! # Moody - Mood-Driven Playlists
//!
//! Command-line entry point. Loads `.env`, initializes logging, parses
//! arguments and routes each command to the library.
//!
//! ```bash
//! moody auth
//! moody create "rough day, need something calm"
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use moody::auth::{self, OAuthClient, TokenCache};
use moody::cli::{self, Command, PlaylistFlags};
use moody::completion;
use moody::config::{self, Credentials, Settings};
use moody::error::MoodyError;
use moody::generator::{GeneratedPlaylist, GeneratorOptions, PlaylistGenerator};
use moody::history::SessionHistory;
use moody::mood::{MoodClassifier, MoodDecision, MoodProfile, MoodSource, MoodTable, Seed};
use moody::sentiment::VaderScorer;
use moody::spotify::SpotifyClient;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

/// Tracks listed after a successful run.
const PREVIEW_TRACKS: usize = 5;

/// Main entry point for the Moody application.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug moody create "..."` - Enable debug logging
/// - `RUST_LOG=moody::sentiment=trace moody classify "..."` - Per-word scoring
fn main() -> Result<()> {
    env_logger::init();

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {e}");
    }

    let args = cli::Args::parse();
    let settings = settings_from_args(&args);

    let custom_table;
    let table = match args.profiles.as_deref() {
        Some(path) => {
            custom_table = load_profiles(path)?;
            &custom_table
        }
        None => MoodTable::default_table(),
    };

    match args.command {
        Command::Classify { text } => {
            let text = require_text(&text)?;
            let decision = MoodClassifier::new(table, VaderScorer).classify(text);
            print_decision(&decision);
        }
        Command::Create { text, flags } => {
            let text = require_text(&text)?;
            let client = connect(&settings)?;
            let generator = PlaylistGenerator::new(MoodClassifier::new(table, VaderScorer), &client, &settings)
                .with_options(options(flags));
            let result = generator.run(text)?;
            print_result(&result);
        }
        Command::Interactive { flags } => {
            // fail fast on missing credentials or an absent login
            connect(&settings)?;
            run_interactive(table, &settings, options(flags))?;
        }
        Command::Moods { label } => match label {
            Some(label) => print_profile(table.get(label)),
            None => table.iter().for_each(print_profile),
        },
        Command::Auth { code } => {
            authorize(&settings, code.as_deref())?;
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(
                completion::shell_to_completion_shell(shell),
                &mut cmd,
                &mut io::stdout(),
            );
        }
    }

    Ok(())
}

/// Environment settings with command-line overrides applied.
fn settings_from_args(args: &cli::Args) -> Settings {
    let base = Settings::from_env();
    Settings {
        market: args
            .market
            .as_deref()
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .or(base.market.clone()),
        request_timeout: Duration::from_secs(args.timeout),
        max_external_calls: args.max_calls,
        fallback_delay: Duration::from_millis(args.search_delay),
        ..base
    }
}

fn load_profiles(path: &Path) -> Result<MoodTable> {
    let table = MoodTable::from_json_file(path)
        .with_context(|| format!("Invalid mood profiles in {}", path.display()))?;
    info!("Loaded mood profiles from {}", path.display());
    Ok(table)
}

fn require_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Please describe how you feel; the text must not be empty.");
    }
    Ok(trimmed)
}

fn options(flags: PlaylistFlags) -> GeneratorOptions {
    GeneratorOptions {
        dry_run: flags.dry_run,
        surprise: flags.surprise,
    }
}

/// Spotify client authorized with the cached token.
fn connect(settings: &Settings) -> Result<SpotifyClient> {
    let credentials = Credentials::from_env().map_err(MoodyError::Authentication)?;
    let oauth = OAuthClient::new(credentials, settings.request_timeout).map_err(MoodyError::Authentication)?;
    let cache = TokenCache::new(config::get_token_cache_path()?);

    let access_token = auth::valid_access_token(&oauth, &cache).map_err(MoodyError::Authentication)?;
    SpotifyClient::new(access_token, settings).context("Failed to build the Spotify HTTP client")
}

fn authorize(settings: &Settings, code: Option<&str>) -> Result<()> {
    let oauth = OAuthClient::new(Credentials::from_env()?, settings.request_timeout)?;
    let cache = TokenCache::new(config::get_token_cache_path()?);

    let code = match code {
        Some(given) => auth::parse_redirect(given, None)?,
        None => {
            let state = auth::generate_state();
            println!("Open this URL in your browser and approve access:\n");
            println!("  {}\n", oauth.authorize_url(&state));
            print!("Paste the URL you were redirected to: ");
            io::stdout().flush()?;

            let mut pasted = String::new();
            io::stdin().read_line(&mut pasted)?;
            auth::parse_redirect(&pasted, Some(&state))?
        }
    };

    let token = oauth.exchange_code(&code)?;
    cache.save(&token)?;
    println!("Authorized. Token saved to {}", cache.path().display());
    Ok(())
}

/// Reads one mood per line. The token is checked, and refreshed when it has
/// expired, before every request, so long sessions keep working.
fn run_interactive(table: &MoodTable, settings: &Settings, options: GeneratorOptions) -> Result<()> {
    let mut history = SessionHistory::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("Tell me how you feel. Commands: 'history', 'quit'.");
    loop {
        print!("\nmood> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();

        match input {
            "" => println!("Please describe how you feel."),
            "quit" | "exit" => break,
            "history" => print_history(&history),
            text => {
                let outcome = connect(settings).and_then(|client| {
                    let generator = PlaylistGenerator::new(MoodClassifier::new(table, VaderScorer), &client, settings)
                        .with_options(options);
                    Ok(generator.run(text)?)
                });
                match outcome {
                    Ok(result) => {
                        history.record(result.decision.label, text);
                        print_result(&result);
                    }
                    Err(e) => match e.downcast_ref::<MoodyError>() {
                        Some(MoodyError::EmptyResult { mood }) => {
                            history.record(*mood, text);
                            eprintln!("No {mood} tracks could be found right now. Try again in a moment.");
                        }
                        _ => eprintln!("Error: {e:#}"),
                    },
                }
            }
        }
    }
    Ok(())
}

fn print_history(history: &SessionHistory) {
    if history.is_empty() {
        println!("No moods yet.");
        return;
    }
    println!("Recent moods (newest first):");
    for entry in history.recent() {
        println!("  {:<7} {}", entry.label.capitalized(), entry.text);
    }
}

fn print_decision(decision: &MoodDecision) {
    println!("Mood: {} {}", decision.profile.emoji, decision.label.capitalized());
    match &decision.source {
        MoodSource::Keyword(keyword) => println!("Matched keyword: '{keyword}'"),
        MoodSource::Sentiment => println!("Decided by sentiment"),
    }
    println!("Sentiment: {:.3}", decision.sentiment);
    println!(
        "Targets: valence {:.2}, energy {:.2}",
        decision.profile.target_valence(),
        decision.profile.target_energy()
    );
}

fn print_result(result: &GeneratedPlaylist) {
    print_decision(&result.decision);
    println!("Found {} tracks ({:?})", result.tracks.len(), result.strategy);
    if result.surprise_added {
        println!("A little surprise was added at the top.");
    }
    for track in result.tracks.iter().take(PREVIEW_TRACKS) {
        println!("  {track}");
    }
    if result.tracks.len() > PREVIEW_TRACKS {
        println!("  ... and {} more", result.tracks.len() - PREVIEW_TRACKS);
    }

    match &result.playlist {
        Some(playlist) => println!("Playlist ready: {}", playlist.url),
        None => println!("Dry run: no playlist created."),
    }
}

fn print_profile(profile: &MoodProfile) {
    let seeds: Vec<String> = profile
        .seeds
        .iter()
        .map(|seed| match seed {
            Seed::Genre(genre) => genre.clone(),
            Seed::Track(id) => format!("track:{id}"),
        })
        .collect();

    println!("{} {}", profile.emoji, profile.label.capitalized());
    println!("  keywords: {}", profile.keywords.join(", "));
    println!(
        "  valence:  {:.1}-{:.1}  energy: {:.1}-{:.1}",
        profile.valence_range.0, profile.valence_range.1, profile.energy_range.0, profile.energy_range.1
    );
    println!("  seeds:    {}", seeds.join(", "));
    println!("  search:   {}", profile.search_terms.join(", "));
}
