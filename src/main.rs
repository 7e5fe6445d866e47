mod config;
mod lyrics;
mod player;
mod storage;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lyrics::LyricsBlock;

#[derive(Debug, Parser)]
#[command(name = "lyricblocks", version, about = "Two-line synchronized lyrics from word timings")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SegmentArgs {
    /// Timing payload: file path, http(s) URL, or `-` for stdin.
    src: String,
    /// Keep section tags like "[Verse]" in the text.
    #[arg(long)]
    tags: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the two-line blocks of a payload.
    Blocks {
        #[command(flatten)]
        seg: SegmentArgs,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print every cleaned lyrics line, ignoring block pairing.
    Lines {
        #[command(flatten)]
        seg: SegmentArgs,
    },
    /// Print the plain lyrics text of a payload.
    Plain {
        src: String,
    },
    /// Print the block shown at a playback position.
    At {
        #[command(flatten)]
        seg: SegmentArgs,
        /// Playback position in seconds.
        seconds: f64,
    },
    /// Play the lyrics against a simulated clock.
    Follow {
        #[command(flatten)]
        seg: SegmentArgs,
        /// Start position in seconds.
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        /// Playback speed (defaults to the config value).
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Print two-line timing windows, padded to `count`.
    Windows {
        src: String,
        count: usize,
    },
    /// Store a payload for a song.
    Import {
        src: String,
        #[arg(long)]
        task: String,
        #[arg(long)]
        audio: String,
    },
    /// List stored songs.
    Songs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the blocks of a stored song.
    Show {
        #[arg(long)]
        task: String,
        #[arg(long)]
        audio: String,
        #[arg(long)]
        tags: bool,
        #[arg(long)]
        json: bool,
        /// Print the stored plain lyrics (section tags removed) instead.
        #[arg(long, conflicts_with = "json")]
        plain: bool,
    },
    /// Inspect or change the config file.
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the config file path and contents.
    Show,
    /// Keep or strip section tags by default.
    Tags {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Set the default `follow` playback speed.
    Rate { rate: f64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Blocks { seg, json } => {
            let payload = lyrics::load_payload(&seg.src).await?;
            let blocks = lyrics::segment(&payload.aligned_words, cfg.segment_options(seg.tags));
            print_blocks(&blocks, json)?;
        }
        Command::Lines { seg } => {
            let payload = lyrics::load_payload(&seg.src).await?;
            let out = lyrics::segment_lyrics(&payload.aligned_words, cfg.segment_options(seg.tags));
            if !out.full_lyrics.is_empty() {
                println!("{}", out.full_lyrics);
            }
        }
        Command::Plain { src } => {
            let payload = lyrics::load_payload(&src).await?;
            println!("{}", lyrics::plain::plain_lyrics(&payload.aligned_words));
        }
        Command::At { seg, seconds } => {
            let payload = lyrics::load_payload(&seg.src).await?;
            let blocks = lyrics::segment(&payload.aligned_words, cfg.segment_options(seg.tags));
            match lyrics::block_index_at(&blocks, seconds) {
                Some(i) => println!("{}", blocks[i].text()),
                None => tracing::warn!(seconds, "no lyrics block at this position"),
            }
        }
        Command::Follow { seg, from, rate } => {
            let payload = lyrics::load_payload(&seg.src).await?;
            let blocks = lyrics::segment(&payload.aligned_words, cfg.segment_options(seg.tags));
            let clock = player::PlaybackClock::start(from, rate.unwrap_or(cfg.playback.rate));
            player::follow(&blocks, &clock, cfg.poll_interval(), |block, position| {
                match block {
                    Some(b) => println!("[{}] {}", fmt_time(position), b.text().replace('\n', " / ")),
                    None => println!("[{}]", fmt_time(position)),
                }
            })
            .await;
        }
        Command::Windows { src, count } => {
            let payload = lyrics::load_payload(&src).await?;
            for (i, w) in lyrics::timing::timing_windows(&payload.aligned_words, count)
                .iter()
                .enumerate()
            {
                println!("{:02}. {} - {}", i + 1, fmt_time(w.start), fmt_time(w.end));
            }
        }
        Command::Import { src, task, audio } => {
            let payload = lyrics::load_payload(&src).await?;
            let song = storage::SongRecord::from_payload(&task, &audio, &payload, now_unix())?;
            let store = open_storage(&cfg)?;
            store.save_song(&song)?;
            tracing::info!(task = %task, audio = %audio, words = payload.aligned_words.len(), "stored song");
            println!("Stored {task}/{audio}.");
        }
        Command::Songs { limit } => {
            let store = open_storage(&cfg)?;
            for s in store.list_songs(limit)? {
                println!("{}/{}  {}", s.task_id, s.audio_id, s.first_line);
            }
        }
        Command::Show {
            task,
            audio,
            tags,
            json,
            plain,
        } => {
            let store = open_storage(&cfg)?;
            let song = store
                .get_song(&task, &audio)?
                .with_context(|| format!("no stored song {task}/{audio}"))?;
            if plain {
                println!("{}", lyrics::plain::sanitize_plain_lyrics(&song.plain_lyrics));
            } else {
                let words = song.aligned_words()?;
                print_blocks(&lyrics::segment(&words, cfg.segment_options(tags)), json)?;
            }
        }
        Command::Config { cmd } => {
            let mut cfg = cfg;
            match cmd {
                ConfigCommand::Show => {
                    let path = match cli.config.clone() {
                        Some(p) => p,
                        None => config::default_config_path().context("default config path")?,
                    };
                    println!("# {}", path.display());
                    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                    return Ok(());
                }
                ConfigCommand::Tags { enabled } => cfg.segment.include_section_tags = enabled,
                ConfigCommand::Rate { rate } => {
                    if !(rate.is_finite() && rate > 0.0) {
                        anyhow::bail!("rate must be a positive number, got {rate}");
                    }
                    cfg.playback.rate = rate;
                }
            }
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Updated config.");
        }
    }

    Ok(())
}

fn open_storage(cfg: &config::Config) -> anyhow::Result<storage::Storage> {
    let path = cfg.database_path();
    storage::Storage::open(&path).with_context(|| format!("open song store {}", path.display()))
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn print_blocks(blocks: &[LyricsBlock], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(blocks)?);
        return Ok(());
    }

    for (i, b) in blocks.iter().enumerate() {
        println!(
            "{:02}. {} - {}  {}",
            i + 1,
            fmt_time(b.start),
            fmt_time(b.end),
            b.lines[0]
        );
        if !b.is_single() {
            println!("{:width$}{}", "", b.lines[1], width = 22);
        }
    }
    Ok(())
}

/// Seconds as mm:ss.cc
fn fmt_time(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let centis = (seconds.abs() * 100.0).round() as u64;
    format!(
        "{sign}{:02}:{:02}.{:02}",
        centis / 6000,
        (centis / 100) % 60,
        centis % 100
    )
}
