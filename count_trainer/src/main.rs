use clap::{Parser, ValueEnum};
use count_trainer::logging::init_logging;
use count_trainer::prelude::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Drill,
    Table,
}

/// Practice keeping the Hi-Lo running count, one card at a time or at a simulated table.
#[derive(Debug, Parser)]
#[command(name = "count_trainer", version)]
struct Args {
    /// Training mode to start in
    #[arg(long, value_enum, default_value_t = Mode::Drill)]
    mode: Mode,
    /// Number of decks in the shoe (1, 2, 4, 6 or 8), saved for the next session
    #[arg(long)]
    decks: Option<u32>,
    /// Number of player seats at the table
    #[arg(long, default_value_t = 3)]
    seats: usize,
    /// Directory the settings file is kept in, defaults to ~/.count_trainer
    #[arg(long)]
    storage_dir: Option<PathBuf>,
    /// Deal without pausing between cards
    #[arg(long)]
    instant: bool,
    /// Seed for the shoe shuffles
    #[arg(long)]
    seed: Option<u64>,
    /// Show the running count in the stats
    #[arg(long)]
    show_count: bool,
    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

impl From<&Args> for TrainerConfig {
    fn from(args: &Args) -> Self {
        let mut builder = TrainerConfig::new();
        builder
            .num_seats(args.seats)
            .seed(args.seed.unwrap_or_else(rand::random));
        if args.instant {
            builder.instant();
        }
        let storage_dir = args.storage_dir.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".count_trainer"))
        });
        if let Some(dir) = storage_dir {
            builder.storage_dir(dir);
        }
        builder.build()
    }
}

const HELP: &str = "\
commands:
  deal            deal a card (drill) or a new round (table)
  check <n>       check your running count
  hit | stand     play the active seat (table)
  clear           clear the table, the count is kept (table)
  seats <n>       change the number of seats between rounds (table)
  reset           start a new shoe for the current mode
  decks <n>       change the number of decks
  count|pile|training on|off
                  show the running count, the discard pile or per card hints
  mode drill|table
  stats | help | quit";

fn on_off(arg: Option<&str>) -> Option<bool> {
    match arg {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    }
}

fn print_table(session: &TrainerSession) {
    let snapshot = session.table().snapshot();
    let dealer = snapshot
        .dealer_cards
        .iter()
        .map(|c| c.map(|c| c.to_string()).unwrap_or_else(|| "??".to_string()))
        .collect::<Vec<String>>()
        .join(" ");
    println!("dealer: {:<24} ({})", dealer, snapshot.dealer_value);
    for seat in &snapshot.seats {
        let marker = if snapshot.active_seat == Some(seat.id) {
            ">"
        } else {
            " "
        };
        let cards = seat
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        println!(
            "{} player {}: {:<20} ({}) {:?}",
            marker, seat.id, cards, seat.value, seat.status
        );
    }
    println!("{}", snapshot.message);
}

/// Fires the table's scheduled steps one after another, waiting out each delay, until nothing is pending.
fn drive_table(session: &mut TrainerSession) -> Result<()> {
    while let Some(pending) = session.table().pending() {
        thread::sleep(pending.delay);
        session.table_fire(pending.ticket)?;
        print_table(session);
    }
    Ok(())
}

fn run_command(session: &mut TrainerSession, mode: &mut Mode, line: &str) -> Result<bool> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some(c) => c,
        None => return Ok(true),
    };
    let arg = words.next();

    match (command, *mode) {
        ("quit" | "exit", _) => return Ok(false),
        ("help", _) => println!("{HELP}"),
        ("stats", Mode::Drill) => println!("{}", session.drill_stats()),
        ("stats", Mode::Table) => println!("{}", session.table_stats()),
        ("deal", Mode::Drill) => {
            let outcome = session.drill_deal();
            println!("{}", outcome);
            if let Some(delta) = session.drill().hint(session.preferences()) {
                println!("hint: {}", format_signed(delta));
            }
            if let Some(pile) = session.drill().discard_pile(session.preferences()) {
                let cards = pile
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<String>>()
                    .join(" ");
                println!("discard pile: {}", cards);
            }
        }
        ("deal", Mode::Table) => {
            session.table_deal()?;
            print_table(session);
            drive_table(session)?;
        }
        ("check", Mode::Drill) => {
            let outcome = session.drill_check(arg.unwrap_or(""))?;
            println!("{}", outcome);
        }
        ("check", Mode::Table) => {
            let outcome = session.table_check(arg.unwrap_or(""))?;
            println!("{}", outcome);
        }
        ("hit", Mode::Table) => {
            session.table_hit()?;
            print_table(session);
            drive_table(session)?;
        }
        ("stand", Mode::Table) => {
            session.table_stand()?;
            print_table(session);
            drive_table(session)?;
        }
        ("clear", Mode::Table) => {
            session.table_clear();
            print_table(session);
        }
        ("seats", Mode::Table) => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) => {
                session.table_set_seats(n)?;
                print_table(session);
            }
            None => println!("usage: seats <n>"),
        },
        ("reset", Mode::Drill) => {
            session.drill_reset();
            println!("{}", session.drill().feedback());
        }
        ("reset", Mode::Table) => {
            session.table_reset_shoe();
            println!("{}", session.table().last_event());
        }
        ("decks", _) => match arg.and_then(|a| a.parse::<u32>().ok()) {
            Some(n) => {
                session.set_num_decks(n)?;
                println!(
                    "{} decks, {} cards in each shoe",
                    n,
                    session.drill_shoe().total_cards()
                );
            }
            None => println!("usage: decks <n>"),
        },
        ("count" | "pile" | "training", _) => match on_off(arg) {
            Some(flag) => {
                let prefs = session.preferences_mut();
                match command {
                    "count" => prefs.show_count = flag,
                    "pile" => prefs.show_discard_pile = flag,
                    _ => prefs.training_mode = flag,
                }
            }
            None => println!("usage: {command} on|off"),
        },
        ("mode", _) => match arg.and_then(|a| Mode::from_str(a, true).ok()) {
            Some(m) => {
                *mode = m;
                println!("mode: {:?}", m);
            }
            None => println!("usage: mode drill|table"),
        },
        _ => println!("unknown command for {:?} mode, type help", mode),
    }
    Ok(true)
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_level);

    let config = TrainerConfig::from(&args);
    info!(seed = ?config.seed, "starting trainer");
    let mut session = match TrainerSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(decks) = args.decks {
        if let Err(e) = session.set_num_decks(decks) {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
    session.preferences_mut().show_count = args.show_count;

    let mut mode = args.mode;
    println!(
        "{} decks, {} mode. Type help for commands.",
        session.preferences().num_decks(),
        format!("{:?}", mode).to_lowercase()
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }

        match run_command(&mut session, &mut mode, line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("{e}"),
        }
    }
}
