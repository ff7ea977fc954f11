//! goban-sync command line.
//!
//! ## Usage
//!
//! - `goban-sync gtp` - Serve the built-in engine over GTP
//! - `goban-sync demo` - Computer-vs-computer game, then a jump back to the start
//! - `goban-sync play --engine <cmd>` - Play against an external GTP engine

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use goban_sync::board::{Color, is_pass, parse_vertex};
use goban_sync::config::{GameSetup, NewMoveInsertPolicy, PlayerKind, Preferences};
use goban_sync::constants::{DEFAULT_BOARD_SIZE, DEFAULT_KOMI};
use goban_sync::engine::LocalEngine;
use goban_sync::events::GameEvent;
use goban_sync::gtp::Transport;
use goban_sync::process::ProcessTransport;
use goban_sync::session::{DiscardAndPlay, Execution, ScriptBackup, Session};

/// goban-sync: Go game record kept in step with a GTP engine
#[derive(Parser)]
#[command(name = "goban-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the built-in random engine over GTP on stdin/stdout
    Gtp {
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
        /// Seed for reproducible moves
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Let the built-in engine play itself, then jump back to the start
    Demo {
        #[arg(long, default_value_t = 9)]
        size: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Line-oriented game against an external GTP engine
    Play {
        /// Engine command line, e.g. "gnugo --mode gtp"
        #[arg(long)]
        engine: String,
        #[command(flatten)]
        game: GameArgs,
        /// Keep replaced moves as a branch instead of discarding them
        #[arg(long)]
        branch: bool,
        /// Write the game's synchronization script here after every change
        #[arg(long)]
        backup: Option<std::path::PathBuf>,
    },
}

#[derive(clap::Args)]
struct GameArgs {
    #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,
    #[arg(long, default_value_t = DEFAULT_KOMI)]
    komi: f32,
    #[arg(long, default_value_t = 0)]
    handicap: usize,
    #[arg(long, value_enum, default_value_t = Player::Human)]
    black: Player,
    #[arg(long, value_enum, default_value_t = Player::Computer)]
    white: Player,
}

#[derive(Clone, Copy, ValueEnum)]
enum Player {
    Human,
    Computer,
}

impl From<Player> for PlayerKind {
    fn from(p: Player) -> Self {
        match p {
            Player::Human => PlayerKind::Human,
            Player::Computer => PlayerKind::Computer,
        }
    }
}

impl From<&GameArgs> for GameSetup {
    fn from(args: &GameArgs) -> Self {
        GameSetup {
            board_size: args.size,
            komi: args.komi,
            handicap: args.handicap,
            black: args.black.into(),
            white: args.white.into(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Some(Commands::Gtp { size, seed }) => {
            let mut engine = match seed {
                Some(seed) => LocalEngine::with_seed(size, seed),
                None => LocalEngine::new(size),
            };
            engine.run().context("GTP loop failed")
        }
        Some(Commands::Demo { size, seed }) => run_demo(size, seed),
        None => run_demo(9, None),
        Some(Commands::Play {
            engine,
            game,
            branch,
            backup,
        }) => {
            let mut parts = engine.split_whitespace();
            let Some(program) = parts.next() else {
                bail!("empty engine command");
            };
            let args: Vec<String> = parts.map(str::to_string).collect();
            let transport = ProcessTransport::spawn(program, &args)?;
            let prefs = Preferences {
                new_move_insert_policy: if branch {
                    NewMoveInsertPolicy::CreateNewVariation
                } else {
                    NewMoveInsertPolicy::ReplaceFutureBoardPositions
                },
                ..Preferences::default()
            };
            let mut session = Session::new(transport, prefs, &GameSetup::from(&game))?;
            if let Some(path) = backup {
                session = session.with_backup(ScriptBackup::new(path));
            }
            run_interactive(&mut session)
        }
    }
}

fn run_demo(size: usize, seed: Option<u64>) -> Result<()> {
    println!("goban-sync: built-in engine against itself\n");

    let engine = match seed {
        Some(seed) => LocalEngine::with_seed(size, seed),
        None => LocalEngine::new(size),
    };
    let setup = GameSetup {
        board_size: size,
        black: PlayerKind::Computer,
        white: PlayerKind::Computer,
        ..GameSetup::default()
    };
    let mut session = Session::new(engine, Preferences::default(), &setup)?;
    session.run_until_idle()?;

    let game = session.game();
    println!("{}", game.board());
    println!(
        "{} board positions, ended by {:?}",
        game.number_of_board_positions(),
        game.end_reason()
    );
    session.set_scoring(true)?;
    session.run_until_idle()?;
    if let Some(score) = session.game().score() {
        println!("score: {score}");
    }

    session.subscribe(|event| {
        if let GameEvent::BoardPositionChangeProgress { step, steps } = event {
            println!("  back to the start: step {step}/{steps}");
        }
    });
    match session.change_board_position(0)? {
        Execution::Completed => println!("jumped back to the start"),
        Execution::Scheduled { steps } => {
            println!("jumping back to the start in {steps} steps");
            while session.pump()? {}
        }
    }
    println!("{}", session.game().board());
    Ok(())
}

const HELP: &str = "commands: play <vertex> | pass | resign | undo | genmove | suggest | goto <n> | \
back [n] | forward [n] | first | last | discard | continue | show | quit";

fn run_interactive<T: Transport>(session: &mut Session<T>) -> Result<()> {
    println!("{HELP}");
    session.run_until_idle()?;
    print_game(session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        if command == "quit" {
            break;
        }
        let size = session.game().board().size;
        let count = |args: &[&str]| args.first().and_then(|n| n.parse::<isize>().ok()).unwrap_or(1);
        let result = match command {
            "play" => match args.first() {
                Some(v) if is_pass(v) => session.pass(),
                Some(v) => match parse_vertex(v, size) {
                    Some(pt) => session.play(pt),
                    None => {
                        println!("bad vertex '{v}'");
                        continue;
                    }
                },
                None => {
                    println!("play needs a vertex");
                    continue;
                }
            },
            "pass" => session.pass(),
            "resign" => session.resign(),
            "undo" => session.undo(),
            "genmove" => session.discard_and_play(DiscardAndPlay::ComputerPlay),
            "suggest" => session.suggest_move(),
            "goto" => match args.first().and_then(|n| n.parse().ok()) {
                Some(n) => session.change_board_position(n).map(|_| ()),
                None => {
                    println!("goto needs a board position");
                    continue;
                }
            },
            "back" => session.change_board_position_by(-count(args)).map(|_| ()),
            "forward" => session.change_board_position_by(count(args)).map(|_| ()),
            "first" => session.first_board_position().map(|_| ()),
            "last" => session.last_board_position().map(|_| ()),
            "discard" => session.change_and_discard(),
            "continue" => session.discard_and_play(DiscardAndPlay::ContinuePausedGame),
            "show" => Ok(()),
            _ => {
                println!("{HELP}");
                continue;
            }
        };
        match result.and_then(|()| session.run_until_idle()) {
            Ok(()) => print_game(session),
            Err(e) => println!("error: {e}"),
        }
        if let Some(mv) = session.suggestion() {
            println!("suggested: {mv}");
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_game<T: Transport>(session: &Session<T>) {
    let game = session.game();
    println!("{}", game.board());
    let to_play = match game.next_color() {
        Color::Black => "black",
        Color::White => "white",
    };
    println!(
        "position {}/{}, {to_play} to play, {:?}",
        game.current_board_position(),
        game.tree().last_board_position(),
        game.state()
    );
}
