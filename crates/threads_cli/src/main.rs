use clap::{Args, Parser, Subcommand};

mod controllers;
mod errors;
mod http;
mod utils;

///  ________                        __
/// /_  __/ /_  ________  ____ _____/ /____
///  / / / __ \/ ___/ _ \/ __ `/ __  / ___/
/// / / / / / / /  /  __/ /_/ / /_/ (__  )
/// /_/ /_/ /_/_/   \___/\__,_/\__,_/____/
///
#[derive(Parser)]
#[command(author, version, about, long_about = None, verbatim_doc_comment)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(verbatim_doc_comment)]
enum Commands {
    /// Test the connection to the Threads server
    /// usage: `threads health`
    #[command(verbatim_doc_comment)]
    Health,
    /// Store the session token issued by the auth provider
    /// usage: `threads login <token>`
    #[command(verbatim_doc_comment)]
    Login(LoginArgs),
    /// Create or update your profile
    /// usage: `threads onboard <username> <name> [--bio <bio>] [--image <url>]`
    #[command(verbatim_doc_comment)]
    Onboard(OnboardArgs),
    /// Print the details of your profile
    /// usage: `threads me`
    #[command(verbatim_doc_comment)]
    Me,
    /// Post a new thread
    /// usage: `threads post "<text>" [--community <id>]`
    #[command(verbatim_doc_comment)]
    Post(PostArgs),
    /// Reply to a thread
    /// usage: `threads reply <thread> "<text>"`
    #[command(verbatim_doc_comment)]
    Reply(ReplyArgs),
    /// Delete one of your threads along with its replies
    /// usage: `threads delete <thread>`
    #[command(verbatim_doc_comment)]
    Delete(ThreadArgs),
    /// Print the home feed
    /// usage: `threads feed [--page <n>]`
    #[command(verbatim_doc_comment)]
    Feed(PageArgs),
    /// Print a thread with its replies
    /// usage: `threads thread <thread>`
    #[command(verbatim_doc_comment)]
    Thread(ThreadArgs),
    /// Search other users by username or name
    /// usage: `threads search [query] [--page <n>]`
    #[command(verbatim_doc_comment)]
    Search(SearchArgs),
    /// Search communities by username or name
    /// usage: `threads communities [query] [--page <n>]`
    #[command(verbatim_doc_comment)]
    Communities(SearchArgs),
    /// Print a community with its members and threads
    /// usage: `threads community <id>`
    #[command(verbatim_doc_comment)]
    Community(CommunityArgs),
    /// Print replies other users left on your threads
    /// usage: `threads activity`
    #[command(verbatim_doc_comment)]
    Activity,
}

#[derive(Args)]
struct LoginArgs {
    token: String,
}

#[derive(Args)]
struct OnboardArgs {
    username: String,
    name: String,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    image: Option<String>,
}

#[derive(Args)]
struct PostArgs {
    text: String,
    #[arg(long)]
    community: Option<String>,
}

#[derive(Args)]
struct ReplyArgs {
    thread: String,
    text: String,
}

#[derive(Args)]
struct ThreadArgs {
    thread: String,
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u64,
}

#[derive(Args)]
struct SearchArgs {
    query: Option<String>,
    #[arg(long, default_value_t = 1)]
    page: u64,
}

#[derive(Args)]
struct CommunityArgs {
    id: String,
}

/**
 * CLI for Threads
 */
#[tokio::main]
pub async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Health => controllers::health().await,
        Commands::Login(cmd) => controllers::login(cmd.token).await,
        Commands::Onboard(cmd) => {
            controllers::onboard(cmd.username, cmd.name, cmd.bio, cmd.image).await
        }
        Commands::Me => controllers::me().await,
        Commands::Post(cmd) => controllers::post(cmd.text, cmd.community).await,
        Commands::Reply(cmd) => controllers::reply(cmd.thread, cmd.text).await,
        Commands::Delete(cmd) => controllers::delete(cmd.thread).await,
        Commands::Feed(cmd) => controllers::feed(cmd.page).await,
        Commands::Thread(cmd) => controllers::thread(cmd.thread).await,
        Commands::Search(cmd) => controllers::search(cmd.query, cmd.page).await,
        Commands::Communities(cmd) => controllers::communities(cmd.query, cmd.page).await,
        Commands::Community(cmd) => controllers::community(cmd.id).await,
        Commands::Activity => controllers::activity().await,
    };

    match result {
        Ok(message) => {
            println!("{}", message);
        }
        Err(e) => {
            println!("Error: {}", e);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_accepts_a_community() {
        let cli = Cli::parse_from(["threads", "post", "hello world", "--community", "org_1"]);
        match cli.command {
            Commands::Post(cmd) => {
                assert_eq!(cmd.text, "hello world");
                assert_eq!(cmd.community.as_deref(), Some("org_1"));
            }
            _ => panic!("expected post"),
        }
    }

    #[test]
    fn search_defaults_to_first_page() {
        let cli = Cli::parse_from(["threads", "search"]);
        match cli.command {
            Commands::Search(cmd) => {
                assert_eq!(cmd.query, None);
                assert_eq!(cmd.page, 1);
            }
            _ => panic!("expected search"),
        }
    }
}
