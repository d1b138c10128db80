//! bgg-fetch: command line front end for the fetch engine.
//!
//! Usage:
//!   bgg-fetch plays <GAME>... [--all-cached] [--out FILE]   Dump plays as TSV
//!   bgg-fetch thing <ID> [--json]                          Show one game
//!   bgg-fetch search <QUERY> [--fuzzy]                     Search board games
//!   bgg-fetch cached                                       List games with cached plays
//!
//! A GAME is a numeric id, `list-<id>` (board games on a geeklist),
//! `family-<id>` (members of a family) or a name resolved through search.

use anyhow::{anyhow, bail, Context};
use bgg_fetch::cache::ResponseCache;
use bgg_fetch::request::ThingFlag;
use bgg_fetch::{
    FamilyRequest, FetchConfig, FetchEngine, FetchEngineBuilder, GeekListRequest, PlaysRequest,
    SearchRequest, ThingRequest,
};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LIST_PREFIX: &str = "list-";
const FAMILY_PREFIX: &str = "family-";

#[derive(Parser, Debug)]
#[command(name = "bgg-fetch", version, about = "Fetch BoardGameGeek data politely")]
struct Cli {
    /// YAML configuration file; `BGG_*` environment variables still apply on top
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bypass the response cache for fetches in this run
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write every logged play of the given games as tab-separated rows
    Plays {
        games: Vec<String>,

        /// Also include every game with cached plays
        #[arg(long)]
        all_cached: bool,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Show one game with its statistics
    Thing {
        id: u64,

        /// Print the parsed record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search board games by name
    Search {
        query: String,

        /// Substring match instead of exact name match
        #[arg(long)]
        fuzzy: bool,
    },
    /// List game ids with cached plays
    Cached,
}

/// One output row per play.
#[derive(Debug, Serialize)]
struct PlayRow<'a> {
    game_id: u64,
    game: &'a str,
    play_id: u64,
    date: String,
    quantity: u32,
    length_minutes: u32,
    players: usize,
    incomplete: bool,
    location: &'a str,
    user_id: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("command failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = FetchConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let cache_dir = config.cache_dir.clone();
    let mut builder = FetchEngineBuilder::from_config(config);
    if cli.no_cache {
        builder = builder.no_cache();
    }
    let engine = builder.build().context("building fetch engine")?;

    match cli.command {
        Commands::Plays {
            games,
            all_cached,
            out,
        } => {
            let listing = if all_cached {
                Some(listing_cache(cache_dir.as_deref())?)
            } else {
                None
            };
            cmd_plays(&engine, listing.as_ref(), &games, out).await
        }
        Commands::Thing { id, json } => cmd_thing(&engine, id, json).await,
        Commands::Search { query, fuzzy } => cmd_search(&engine, &query, fuzzy).await,
        Commands::Cached => cmd_cached(&listing_cache(cache_dir.as_deref())?).await,
    }
}

async fn cmd_plays(
    engine: &FetchEngine,
    listing: Option<&ResponseCache>,
    inputs: &[String],
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut ids = Vec::new();
    if let Some(cache) = listing {
        ids.extend(cached_game_ids(cache).await?);
    }
    for input in inputs {
        ids.extend(resolve_games(engine, input).await?);
    }
    if ids.is_empty() {
        bail!("no games given; pass ids, names, list-<id>, family-<id> or --all-cached");
    }

    let sink: Box<dyn Write> = match &out {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(sink);

    for (index, id) in ids.iter().copied().enumerate() {
        let game = ThingRequest::single(id).query_first(engine).await?;
        let name = game.primary_name().unwrap_or_default();
        info!(game_id = id, index, name, "processing plays");

        let plays = engine.plays(PlaysRequest::for_thing(id)).flatten();
        futures::pin_mut!(plays);
        let mut count = 0usize;
        while let Some(play) = plays.try_next().await? {
            writer.serialize(PlayRow {
                game_id: id,
                game: name,
                play_id: play.id,
                date: play.date.map(|d| d.to_string()).unwrap_or_default(),
                quantity: play.quantity,
                length_minutes: play.length_minutes,
                players: play.players.len(),
                incomplete: play.incomplete,
                location: play.location.as_deref().unwrap_or_default(),
                user_id: play.user_id,
            })?;
            count += 1;
        }
        info!(game_id = id, plays = count, "finished game");
    }
    writer.flush()?;
    Ok(())
}

/// Expand one command line game argument into thing ids.
async fn resolve_games(engine: &FetchEngine, input: &str) -> anyhow::Result<Vec<u64>> {
    if let Some(raw) = input.strip_prefix(LIST_PREFIX) {
        let id: u64 = raw.parse().with_context(|| format!("bad geeklist id {raw:?}"))?;
        let list = engine.fetch(&GeekListRequest::new(id)).await?;
        info!(
            list_id = list.id,
            title = list.title.as_str(),
            user = list.username.as_str(),
            edited = %list.edit_date,
            "reading geeklist"
        );
        return Ok(list
            .items_of("thing", "boardgame")
            .map(|item| item.object_id)
            .collect());
    }

    if let Some(raw) = input.strip_prefix(FAMILY_PREFIX) {
        let id: u64 = raw.parse().with_context(|| format!("bad family id {raw:?}"))?;
        let family = FamilyRequest::single(id).query_first(engine).await?;
        info!(
            family_id = family.id,
            name = family.primary_name().unwrap_or_default(),
            "reading family"
        );
        return Ok(family.members.iter().map(|m| m.id).collect());
    }

    if let Ok(id) = input.parse::<u64>() {
        return Ok(vec![id]);
    }

    let results = engine
        .fetch(&SearchRequest::new(input).of_types(["boardgame"]))
        .await?;
    let first = results
        .items
        .first()
        .ok_or_else(|| anyhow!("no board game named {input:?}"))?;
    if results.items.len() > 1 {
        info!(
            name = first.name.as_str(),
            year = first.year_published,
            candidates = results.items.len(),
            "several matches, using the first"
        );
    } else {
        info!(name = first.name.as_str(), "game found");
    }
    Ok(vec![first.id])
}

/// The configured disk cache, opened for listing only.
///
/// Independent of `--no-cache`, which only keeps fetches off the cache.
fn listing_cache(cache_dir: Option<&Path>) -> anyhow::Result<ResponseCache> {
    let dir = cache_dir.ok_or_else(|| anyhow!("no cache directory configured"))?;
    Ok(ResponseCache::disk(dir))
}

async fn cached_game_ids(cache: &ResponseCache) -> anyhow::Result<Vec<u64>> {
    let keys = cache.cached_keys("plays").await?;
    Ok(keys.iter().filter_map(|k| k.parse().ok()).collect())
}

async fn cmd_thing(engine: &FetchEngine, id: u64, json: bool) -> anyhow::Result<()> {
    let game = ThingRequest::single(id)
        .with_flag(ThingFlag::Stats)
        .query_first(engine)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&game)?);
        return Ok(());
    }

    println!("{} ({})", game.primary_name().unwrap_or("?"), game.id);
    println!("  type:       {}", game.kind);
    if let Some(year) = game.year_published {
        println!("  published:  {}", year);
    }
    if let Some((min, max)) = game.player_count() {
        println!("  players:    {}-{}", min, max);
    }
    if let Some(category) = game.primary_category() {
        println!("  category:   {}", category);
    }
    if let Some(rank) = game.overall_rank() {
        println!("  rank:       {}", rank);
    }
    if let Some(ratings) = &game.ratings {
        println!(
            "  ratings:    {} (avg {:.2}, owned by {})",
            ratings.users_rated, ratings.average, ratings.owned
        );
    }
    Ok(())
}

async fn cmd_search(engine: &FetchEngine, query: &str, fuzzy: bool) -> anyhow::Result<()> {
    let results = engine
        .fetch(
            &SearchRequest::new(query)
                .of_types(["boardgame"])
                .exact(!fuzzy),
        )
        .await?;
    for item in &results.items {
        match item.year_published {
            Some(year) => println!("{}\t{}\t{}", item.id, item.name, year),
            None => println!("{}\t{}", item.id, item.name),
        }
    }
    info!(total = results.total, "search finished");
    Ok(())
}

async fn cmd_cached(cache: &ResponseCache) -> anyhow::Result<()> {
    for id in cached_game_ids(cache).await? {
        println!("{}", id);
    }
    Ok(())
}
