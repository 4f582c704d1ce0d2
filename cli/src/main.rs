use anyhow::Result;
use clap::{Parser, Subcommand};
use github::profile::DEFAULT_PROFILE_LIMIT;
use github::search::total_pages;
use github::{load_profile, load_repos, search_term, GithubClient, RateLimitFlag, ReadmeEnricher, Repository};
use ranker::markdown::DEFAULT_SUMMARY_WORDS;
use ranker::{summarize, Liveness, Ranker};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "reposearch")]
#[command(about = "Search GitHub repositories, reordering descriptive queries by README relevance", long_about = None)]
struct Cli {
    /// JSON settings file with optional `client` and `rank` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search repositories by name; descriptive queries are re-ranked by README content
    Search {
        /// Free-text query
        query: Vec<String>,
        /// Result page to load
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,
        /// Keep the API's star ordering
        #[arg(long, default_value_t = false)]
        no_rank: bool,
    },
    /// Show one repository with its languages and contributors
    Repo {
        /// Numeric id or owner/name
        id: String,
    },
    /// List a user's repositories with languages and contributors
    Profile {
        username: String,
        #[arg(long, default_value_t = DEFAULT_PROFILE_LIMIT)]
        limit: usize,
    },
    /// Print a short summary of a repository's README
    Readme {
        owner: String,
        name: String,
        #[arg(long, default_value_t = DEFAULT_SUMMARY_WORDS)]
        words: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut cfg = AppConfig::load(cli.config.as_deref())?;
    if let Commands::Search { per_page: Some(n), .. } = &cli.command {
        cfg.client.per_page = *n;
    }

    let flag = RateLimitFlag::new();
    let client = GithubClient::new(cfg.client.clone(), flag.clone())?;
    let ranker = Ranker::new(cfg.rank.clone());

    let result = match cli.command {
        Commands::Search { query, page, no_rank, .. } => search(&client, &ranker, &query.join(" "), page, !no_rank).await,
        Commands::Repo { id } => repo(&client, &id).await,
        Commands::Profile { username, limit } => profile(&client, &username, limit).await,
        Commands::Readme { owner, name, words } => readme(&client, &owner, &name, words).await,
    };

    if flag.is_set() {
        eprintln!("GitHub API rate limit reached: results may be empty or incomplete. Set GITHUB_TOKEN to raise the limit.");
    }
    result
}

async fn search(client: &GithubClient, ranker: &Ranker, raw: &str, page: u32, rank: bool) -> Result<()> {
    let q = search_term(raw);
    let loaded = load_repos(client, &q, page).await;
    let pages = total_pages(loaded.total_count, client.config().per_page);
    tracing::info!(q = %q, page, hits = loaded.total_count, pages, "search loaded");

    let items = if rank && ranker.is_descriptive(raw) {
        let live = Liveness::new();
        let watcher = live.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.abandon();
            }
        });
        let enricher = ReadmeEnricher::new(client.clone());
        let ranked = ranker.maybe_rank_until(raw, loaded.items.clone(), Some(&enricher), &live).await;
        ctrl_c.abort();
        match ranked {
            Some(items) => items,
            None => {
                eprintln!("ranking cancelled; showing results in star order");
                loaded.items
            }
        }
    } else {
        loaded.items
    };

    println!("page {page} of {pages} (~{} repositories)", loaded.total_count);
    for (i, repo) in items.iter().enumerate() {
        println!("{:>3}. {}", i + 1, describe(repo));
    }
    Ok(())
}

async fn repo(client: &GithubClient, id: &str) -> Result<()> {
    let repo = client.repository(id).await.into_result()?;
    let (languages, contributors) = tokio::join!(
        async {
            match repo.languages_url.as_deref() {
                Some(url) => client.languages(url).await.ok().unwrap_or_default(),
                None => Vec::new(),
            }
        },
        async {
            match repo.contributors_url.as_deref() {
                Some(url) => client.contributors(url).await.ok().unwrap_or_default(),
                None => Vec::new(),
            }
        }
    );
    println!("{}", describe(&repo));
    if let Some(url) = &repo.html_url {
        println!("     {url}");
    }
    println!("     languages: {}", languages.join(", "));
    for c in contributors {
        println!("     {:<24} {} commits", c.login, c.contributions);
    }
    Ok(())
}

async fn profile(client: &GithubClient, username: &str, limit: usize) -> Result<()> {
    let repos = load_profile(client, username, limit).await.into_result()?;
    println!("{username}: {} repositories", repos.len());
    for entry in repos {
        let people: Vec<&str> = entry.contributors.iter().map(|c| c.login.as_str()).collect();
        println!("  {}", describe(&entry.repo));
        println!("     languages: {} | contributors: {}", entry.languages.join(", "), people.join(", "));
    }
    Ok(())
}

async fn readme(client: &GithubClient, owner: &str, name: &str, words: usize) -> Result<()> {
    match client.readme(owner, name).await.into_result()? {
        Some(md) => println!("{}", summarize(&md, words)),
        None => println!("{owner}/{name} has no README"),
    }
    Ok(())
}

fn describe(repo: &Repository) -> String {
    let title = if repo.full_name.is_empty() { &repo.name } else { &repo.full_name };
    match repo.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(d) => format!("{title} [{} stars] - {}", repo.stargazers_count, summarize(d, DEFAULT_SUMMARY_WORDS)),
        None => format!("{title} [{} stars]", repo.stargazers_count),
    }
}
