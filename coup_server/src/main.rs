//! Line-oriented Coup server using the room actor model.
//!
//! Reads `<room> <user> <command> [args...]` lines from stdin, runs each one
//! in its room, and prints the reply.

mod commands;
mod config;
mod logging;

use anyhow::Error;
use coup_engine::{RoomManager, RoomResponse};
use ctrlc::set_handler;
use pico_args::Arguments;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    commands::{ParseError, Request, USAGE, parse_line},
    config::ServerConfig,
};

const HELP: &str = "\
Run a Coup room server on stdin/stdout

USAGE:
  coup_server [OPTIONS]

OPTIONS:
  --max-players     N      Largest table a deal accepts  [default: env COUP_MAX_PLAYERS or 6]
  --starting-money  N      Coins each player starts with [default: env COUP_STARTING_MONEY or 2]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  COUP_MIN_PLAYERS         Smallest table a deal accepts (default 2)
  COUP_MAX_PLAYERS         Largest table a deal accepts (default 6)
  COUP_STARTING_MONEY      Coins each player starts with (default 2)
  COUP_FORCED_COUP_AT      Players holding this much must coup (default 10)
  COUP_ROOM_INBOX          Commands that may queue up per room (default 100)
  RUST_LOG                 Log filter (default info)
  (A .env file in the working directory is read too)

INPUT:
  One command per line: <room> <user> <command> [args...]
  Send `help` as the command to list them.
";

struct Args {
    max_players: Option<usize>,
    starting_money: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        max_players: pargs.opt_value_from_str("--max-players")?,
        starting_money: pargs.opt_value_from_str("--starting-money")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.max_players, args.starting_money);
    config.validate()?;
    tracing::info!(
        min_players = config.min_players,
        max_players = config.max_players,
        starting_money = config.starting_money,
        forced_coup_at = config.forced_coup_at,
        "Starting Coup server"
    );

    // Catching signals for exit.
    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();
    set_handler(move || {
        let _ = shutdown_tx.send(());
    })?;

    let manager = RoomManager::new(config.room_config());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&manager, &line).await,
                    None => break,
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Caught interrupt");
                break;
            }
        }
    }

    tracing::info!(rooms = manager.active_room_count().await, "Shutting down server...");
    manager.close_all().await;

    Ok(())
}

async fn handle_line(manager: &RoomManager, line: &str) {
    let request = match parse_line(line) {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(ParseError::UnknownCommand(verb)) if verb.eq_ignore_ascii_case("help") => {
            println!("{USAGE}");
            return;
        }
        Err(e) => {
            logging::log_unparsed_line(line, &e.to_string());
            println!("{e}");
            return;
        }
    };

    let Request {
        room,
        username,
        command,
    } = request;
    match manager.execute(&room, username.clone(), command).await {
        Ok(RoomResponse::Broadcast(text)) => {
            for line in text.lines() {
                println!("[{room}] {line}");
            }
        }
        Ok(RoomResponse::Private(text)) => {
            logging::log_private_reply(&room, username.as_str());
            for line in text.lines() {
                println!("[{room}] ({username}) {line}");
            }
        }
        Err(e) => {
            tracing::warn!(room = %room, error = %e, "Room unavailable");
            println!("[{room}] {e}");
        }
    }
}
