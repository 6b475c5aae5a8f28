use anyhow::{Context, Result};
use twitch_scout::{auth_service, Session, Stream, TwitchService};

fn session_from_env() -> Session {
    let mut session = Session::new(std::env::var("TWITCH_CLIENT_ID").unwrap_or_default());
    if let Ok(token) = std::env::var("TWITCH_TOKEN") {
        session.set_oauth_token(token);
    }
    if let Ok(username) = std::env::var("TWITCH_USERNAME") {
        session.set_username(username);
    }
    if let Ok(game) = std::env::var("TWITCH_GAME") {
        session.set_game_filter(game);
    }
    if let Ok(path) = std::env::var("TWITCH_CURL_PATH") {
        session.set_curl_path(path);
    }
    session
}

fn print_usage() {
    eprintln!("Usage: twitch-scout <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login                     Log in interactively");
    eprintln!("  search <term> [limit]     Search live streams");
    eprintln!("  channels <term> [limit]   Search channels");
    eprintln!("  followed [limit]          List live followed streams");
    eprintln!("  top                       Show the most-viewed live streams");
    eprintln!();
    eprintln!("Configuration comes from TWITCH_CLIENT_ID, TWITCH_TOKEN,");
    eprintln!("TWITCH_USERNAME, TWITCH_GAME, and TWITCH_CURL_PATH.");
}

fn parse_limit(arg: Option<&String>) -> Result<Option<u32>> {
    match arg {
        Some(raw) => {
            let limit = raw
                .parse()
                .with_context(|| format!("Not a number: {}", raw))?;
            Ok(Some(limit))
        }
        None => Ok(None),
    }
}

fn print_stream_table(streams: &[Stream]) {
    println!(
        "{:<24} {:>9}  {:<22} {}",
        "CHANNEL", "VIEWERS", "GAME", "TITLE"
    );
    for stream in streams {
        let viewers = stream
            .viewers
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:>9}  {:<22} {}",
            stream.name,
            viewers,
            truncate(&stream.game, 22),
            truncate(&stream.status, 60)
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(command) => command.as_str(),
        None => {
            print_usage();
            std::process::exit(2);
        }
    };

    let mut service = TwitchService::new(session_from_env());

    match command {
        "login" => {
            auth_service::authenticate(service.session_mut()).await?;
            println!("Logged in. The token applies to this process only.");
        }
        "search" => {
            let term = args.get(1).context("search needs a term")?;
            let limit = parse_limit(args.get(2))?;
            for stream in service.search_streams(term, limit).await? {
                println!("{}", stream);
            }
        }
        "channels" => {
            let term = args.get(1).context("channels needs a term")?;
            let limit = parse_limit(args.get(2))?;
            for channel in service.search_channels(term, limit).await? {
                println!("{}  {}", channel, channel.url);
            }
        }
        "followed" => {
            let limit = parse_limit(args.get(1))?;
            for stream in service.get_followed_streams(limit).await? {
                println!("{}", stream);
            }
        }
        "top" => {
            let streams = service.list_top_streams().await?;
            print_stream_table(&streams);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}
