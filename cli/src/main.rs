/*
    pixel-jumble | Guess the album from your own Spotify listening history.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

mod api;
mod game;
mod hints;
mod pixelate;
mod storage;

use anyhow::{Context, Result};
use api::PuzzleClient;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use game::{Game, GameState, GuessOutcome};
use jumble_core::TimeRange;
use log::{info, warn};
use pixelate::Cover;
use std::io::{self, Write};
use std::path::PathBuf;
use storage::{FileStore, GuessedAlbums, KeyValueStore};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const MAX_COVER_COLUMNS: u16 = 60;

#[derive(Parser)]
#[command(name = "pixel-jumble")]
#[command(about = "Guess the album from your own Spotify listening history", long_about = None)]
struct Cli {
    /// Base URL of the puzzle server
    #[arg(
        long,
        global = true,
        env = "PIXEL_JUMBLE_SERVER",
        default_value = "http://localhost:5000"
    )]
    server: String,

    /// Where guessed albums are remembered (defaults to the per-user config directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the URL that logs you in with Spotify
    Login,
    /// Starts a game with the access token handed out after login
    Play {
        #[arg(long, env = "PIXEL_JUMBLE_TOKEN")]
        token: String,
        /// short_term, medium_term or long_term; asked interactively when omitted
        #[arg(long)]
        mode: Option<TimeRange>,
    },
    /// Forgets the albums already guessed, for one mode or all of them
    Reset {
        #[arg(long)]
        mode: Option<TimeRange>,
    },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();
    let client = PuzzleClient::new(&cli.server)?;

    match cli.command {
        Commands::Login => handle_login(&client),
        Commands::Play { token, mode } => {
            let store = open_store(cli.store)?;
            handle_play(&client, store, &token, mode).await
        }
        Commands::Reset { mode } => {
            let store = open_store(cli.store)?;
            handle_reset(store, mode)
        }
    }
}

fn open_store(path: Option<PathBuf>) -> Result<FileStore> {
    let path = match path {
        Some(path) => path,
        None => FileStore::default_path()?,
    };
    info!("Guessed albums are stored in {}", path.display());
    FileStore::open(&path).with_context(|| format!("Failed to open {}", path.display()))
}

fn handle_login(client: &PuzzleClient) -> Result<()> {
    println!("Open this URL in your browser to log in with Spotify:");
    println!();
    println!("   {}", client.login_url());
    println!();
    println!("After logging in, copy the access_token from the address bar and run:");
    println!("   pixel-jumble play --token <ACCESS_TOKEN>");
    Ok(())
}

fn handle_reset<S: KeyValueStore>(store: S, mode: Option<TimeRange>) -> Result<()> {
    let mut guessed = GuessedAlbums::new(store);
    let modes = match mode {
        Some(mode) => vec![mode],
        None => TimeRange::ALL.to_vec(),
    };
    for mode in modes {
        let count = guessed.list(mode).len();
        guessed.clear(mode)?;
        println!("[RESET] {}: forgot {} album(s)", mode.label(), count);
    }
    Ok(())
}

async fn handle_play<S: KeyValueStore>(
    client: &PuzzleClient,
    store: S,
    token: &str,
    mode: Option<TimeRange>,
) -> Result<()> {
    let mut game = Game::new(store);
    game.authenticate(token)?;
    if let Some(mode) = mode {
        game.choose_mode(mode)?;
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut cover = Cover::Missing;

    loop {
        match game.state() {
            GameState::Login => return Ok(()),
            GameState::ModeSelect => {
                let Some(mode) = prompt_mode(&game, &mut input).await? else {
                    return Ok(());
                };
                game.choose_mode(mode)?;
            }
            GameState::Loading => {
                println!();
                println!("Loading a {} puzzle...", game.mode().label());
                cover = load_puzzle(client, &mut game).await?;
            }
            GameState::Playing => {
                draw(&game, &cover)?;
                let label = "Your guess (:hint, :jumble, :give-up, :quit)";
                let Some(line) = prompt(&mut input, label).await? else {
                    return Ok(());
                };
                match line.trim() {
                    ":quit" | ":q" => return Ok(()),
                    ":hint" | ":h" => println!("Hint: {}", game.reveal_hint()?),
                    ":jumble" | ":j" => {
                        let jumbled = game.jumble(&mut rand::rng())?;
                        println!("Jumbled: {}", jumbled);
                    }
                    ":give-up" => game.give_up()?,
                    guess => {
                        if game.guess(guess)? == GuessOutcome::Incorrect {
                            println!("{}", game.message());
                        }
                    }
                }
            }
            GameState::Finished => {
                draw(&game, &cover)?;
                println!("{}", game.message());
                let label = "[p] play again, [m] change mode, [q] quit";
                let Some(line) = prompt(&mut input, label).await? else {
                    return Ok(());
                };
                match line.trim() {
                    "p" => game.play_again()?,
                    "m" => game.change_mode()?,
                    "q" => return Ok(()),
                    other => println!("Unknown choice '{}'", other),
                }
            }
        }
    }
}

async fn load_puzzle<S: KeyValueStore>(client: &PuzzleClient, game: &mut Game<S>) -> Result<Cover> {
    let token = game.access_token().unwrap_or_default().to_string();
    let fetched = client
        .fetch_puzzle(&token, game.mode(), &game.excluded_albums())
        .await;

    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!("Puzzle request failed: {}", e);
            game.puzzle_failed();
            return Ok(Cover::Missing);
        }
    };

    if fetched.reset_history {
        info!("Every album in this mode was guessed; starting over");
        println!("You've seen every album in this mode. Starting over!");
    }

    let cover = match fetched.puzzle.cover_url.as_deref() {
        Some(url) => match client.fetch_cover(url).await {
            Ok(bytes) => Cover::load(&bytes),
            Err(e) => {
                warn!("Cover download failed: {}", e);
                Cover::Missing
            }
        },
        None => Cover::Missing,
    };

    game.puzzle_loaded(fetched.puzzle, fetched.reset_history)?;
    Ok(cover)
}

fn draw<S: KeyValueStore>(game: &Game<S>, cover: &Cover) -> Result<()> {
    let columns = crossterm::terminal::size()
        .map(|(width, _)| width.min(MAX_COVER_COLUMNS))
        .unwrap_or(MAX_COVER_COLUMNS);
    let level = if game.state() == GameState::Finished {
        1
    } else {
        game.pixelation()
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout)?;
    pixelate::paint(&mut stdout, cover, level, columns)?;

    if let Some(puzzle) = game.puzzle() {
        writeln!(stdout, "Artist: {}", puzzle.artist_name)?;
    }
    for hint in game.revealed_hints() {
        writeln!(stdout, "  * {}", hint)?;
    }
    if let Some(jumbled) = game.jumbled() {
        writeln!(stdout, "  * Jumbled: {}", jumbled)?;
    }
    stdout.flush()?;
    Ok(())
}

async fn prompt_mode<S: KeyValueStore>(
    game: &Game<S>,
    input: &mut Input,
) -> Result<Option<TimeRange>> {
    if !game.message().is_empty() {
        println!("{}", game.message());
    }
    loop {
        println!();
        println!("Choose a time range:");
        for (i, mode) in TimeRange::ALL.iter().enumerate() {
            println!("  [{}] {}", i + 1, mode.label());
        }
        let Some(line) = prompt(input, "Mode (1-3, q to quit)").await? else {
            return Ok(None);
        };
        let choice = line.trim();
        if choice == "q" {
            return Ok(None);
        }
        let picked = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| TimeRange::ALL.get(i).copied())
            .or_else(|| choice.parse::<TimeRange>().ok());
        match picked {
            Some(mode) => return Ok(Some(mode)),
            None => println!("Unknown mode '{}'", choice),
        }
    }
}

/// Prints `label` and waits for a line; `None` on end of input.
async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{}> ", label);
    io::stdout().flush()?;
    Ok(input.next_line().await?)
}
