//! # GitView Binary
//!
//! Command-line front end over the GitView stores. Writes are made under
//! the client's anonymous identity.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gv_config::{LogFormat, Settings};
use gv_core::models::{Post, RepoCoordinate, RepoPost};
use gv_github::RepositoryInfo;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::app::App;

#[derive(Parser)]
#[command(name = "gitview")]
#[command(version)]
#[command(about = "A social feed for GitHub repositories")]
struct Cli {
    /// Config file (defaults to ./gitview.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post to the global feed
    Post { text: String },
    /// Show the global feed, newest first
    Feed {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
        /// Show cards for repositories linked in each post
        #[arg(long)]
        cards: bool,
        /// Translate post text
        #[arg(short, long)]
        translate: bool,
    },
    /// Post to a repository's timeline
    RepoPost {
        #[arg(value_parser = parse_repo)]
        repo: RepoCoordinate,
        text: String,
    },
    /// Show a repository's timeline
    RepoFeed {
        #[arg(value_parser = parse_repo)]
        repo: RepoCoordinate,
    },
    /// Like or unlike a repository post
    Like { post_id: Uuid },
    /// Reply to a repository post
    Reply { post_id: Uuid, text: String },
    /// Edit one of your repository posts
    Edit { post_id: Uuid, text: String },
    /// Delete one of your repository posts
    Delete { post_id: Uuid },
    /// Bookmark or un-bookmark a feed post
    Bookmark { post_id: Uuid },
    /// Most-starred repositories
    Trending {
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Search repositories
    Search { query: String },
    /// Show a repository card for a GitHub URL
    Repo { url: String },
    /// Translate text
    Translate { text: String },
    /// Send a direct message
    Send { to: String, text: String },
    /// Show the conversation with another user
    Chat { with: String },
    /// List conversations
    Inbox,
}

fn parse_repo(s: &str) -> Result<RepoCoordinate, String> {
    RepoCoordinate::parse(s).ok_or_else(|| format!("expected owner/name, got `{s}`"))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,gitview=info,gv_stores=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(cli.config.as_deref())?;
    init_tracing(settings.log.format);

    let app = App::build(settings).await?;
    run(&app, cli.command).await
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Post { text } => {
            let me = app.anonymous.get_or_create().await?;
            let id = app.feed.create_post(&text, &me, None).await?;
            println!("{id}");
        }
        Commands::Feed { pages, cards, translate } => {
            let mut pager = app.feed.pager(app.settings.feed.page_size);
            for _ in 0..pages {
                let page = pager.load_more().await;
                let texts: Vec<&str> = page.posts.iter().map(|p| p.text.as_str()).collect();
                let texts = if translate {
                    app.translator.translate_batch(&texts[..]).await
                } else {
                    texts.iter().map(|t| t.to_string()).collect()
                };
                for (post, text) in page.posts.iter().zip(texts) {
                    let mark = if app.feed.is_bookmarked(post.id).await { "*" } else { " " };
                    println!("{mark} {}", post_line(post, &text));
                    if cards {
                        for card in app.github.expand_repository_cards(&post.text).await {
                            println!("    {}", card_line(&card));
                        }
                    }
                }
                if !pager.has_more() {
                    break;
                }
            }
        }
        Commands::RepoPost { repo, text } => {
            let me = app.anonymous.get_or_create().await?;
            let id = app
                .timeline
                .create_repo_post(&text, &repo.owner, &repo.name, &me, None)
                .await?;
            println!("{id}");
        }
        Commands::RepoFeed { repo } => {
            let posts = app
                .timeline
                .fetch_repo_posts(&repo.owner, &repo.name, app.settings.repo.page_size)
                .await;
            for post in &posts {
                println!("{}", repo_post_line(post));
                for reply in post.replies.replies() {
                    println!("    {} {}: {}", reply.created_at.format("%Y-%m-%d %H:%M"), reply.author_id, reply.text);
                }
            }
        }
        Commands::Like { post_id } => {
            let me = app.anonymous.get_or_create().await?;
            let liked = app.timeline.toggle_like(post_id, &me).await?;
            println!("{}", if liked { "liked" } else { "unliked" });
        }
        Commands::Reply { post_id, text } => {
            let me = app.anonymous.get_or_create().await?;
            let reply = app.timeline.add_reply(post_id, &text, &me, None).await?;
            println!("{}", reply.id);
        }
        Commands::Edit { post_id, text } => {
            let me = app.anonymous.get_or_create().await?;
            app.timeline.update_post(post_id, &text, &me).await?;
        }
        Commands::Delete { post_id } => {
            let me = app.anonymous.get_or_create().await?;
            app.timeline.delete_post(post_id, &me).await?;
        }
        Commands::Bookmark { post_id } => {
            let bookmarked = app.feed.toggle_bookmark(post_id).await?;
            println!("{}", if bookmarked { "bookmarked" } else { "removed" });
        }
        Commands::Trending { language } => {
            let repos = app
                .github
                .fetch_trending_repositories(language.as_deref(), app.settings.trending.page_size)
                .await;
            repos.iter().for_each(|r| println!("{}", card_line(r)));
        }
        Commands::Search { query } => {
            let repos = app
                .github
                .search_repositories(&query, app.settings.trending.page_size)
                .await?;
            repos.iter().for_each(|r| println!("{}", card_line(r)));
        }
        Commands::Repo { url } => match app.github.fetch_repository_info(&url).await {
            Some(info) => {
                println!("{}", card_line(&info));
                if !info.description.is_empty() {
                    println!("{}", info.description);
                }
                println!("{}", info.url);
            }
            None => anyhow::bail!("could not load repository info for {url}"),
        },
        Commands::Translate { text } => {
            println!("{}", app.translator.translate(&text).await);
        }
        Commands::Send { to, text } => {
            let me = app.anonymous.get_or_create().await?;
            let id = app.messaging.send_message(&me, &to, &text, None).await?;
            println!("{id}");
        }
        Commands::Chat { with } => {
            let me = app.anonymous.get_or_create().await?;
            for message in app.messaging.fetch_chat_messages(&me, &with).await {
                let who = if message.sender_id == me { "me" } else { with.as_str() };
                println!("{} {who}: {}", message.created_at.format("%Y-%m-%d %H:%M"), message.text);
            }
        }
        Commands::Inbox => {
            let me = app.anonymous.get_or_create().await?;
            for chat in app.messaging.fetch_user_chats(&me).await {
                println!(
                    "{} {} ({}): {}",
                    chat.last_message_at.format("%Y-%m-%d %H:%M"),
                    chat.display_name,
                    chat.counterpart_id,
                    chat.last_message
                );
            }
        }
    }
    Ok(())
}

fn author_name(author: Option<&gv_core::models::AuthorSnapshot>) -> &str {
    author.map(|a| a.name.as_str()).unwrap_or("anonymous")
}

fn post_line(post: &Post, text: &str) -> String {
    format!(
        "{} {} {}: {}",
        post.created_at.format("%Y-%m-%d %H:%M"),
        post.id,
        author_name(post.author.as_ref()),
        text
    )
}

fn repo_post_line(post: &RepoPost) -> String {
    let edited = if post.updated_at.is_some() { " (edited)" } else { "" };
    format!(
        "{} {} {}: {}{edited} [{} likes, {} replies]",
        post.created_at.format("%Y-%m-%d %H:%M"),
        post.id,
        author_name(post.author.as_ref()),
        post.text,
        post.likes.count(),
        post.replies.count()
    )
}

fn card_line(repo: &RepositoryInfo) -> String {
    let language = if repo.language.is_empty() { "-" } else { repo.language.as_str() };
    format!("{} ★{} [{}]", repo.full_name, repo.stars, language)
}
