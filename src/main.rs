//! duelmat - interactive board demo
//!
//! ## Usage
//!
//! ```text
//! duelmat [OPTIONS]
//!
//! Options:
//!   --p1 NAME    First player name (default "p1")
//!   --p2 NAME    Second player name (default "p2")
//!   --no-flip    Skip the opening coin flip; --p1 takes the first turn
//! ```
//!
//! Type `help` at the prompt for the command list. Every change notification
//! from the board is echoed the way the on-screen badges would react.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};

use duelmat::{
    ActionKind, CardId, DEFINITIONS, GameSession, Phase, PlayerId, TokenKind,
};
use env_logger::Env;
use rand::Rng;

struct Args {
    p1: String,
    p2: String,
    no_flip: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        p1: "p1".to_string(),
        p2: "p2".to_string(),
        no_flip: false,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--p1" => {
                if let Some(name) = iter.next() {
                    args.p1 = name;
                }
            }
            "--p2" => {
                if let Some(name) = iter.next() {
                    args.p2 = name;
                }
            }
            "--no-flip" => args.no_flip = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("unknown option '{other}' (try --help)");
                std::process::exit(1);
            }
        }
    }
    args
}

fn main() {
    env_logger::init_from_env(Env::default().filter_or("RUST_LOG", "info"));
    let args = parse_args();

    println!("========================================");
    println!("   duelmat - board demo");
    println!("========================================\n");

    let mut first = args.p1.clone();
    let mut second = args.p2.clone();
    if args.no_flip {
        println!("{first} takes the first turn.\n");
    } else {
        let mut rng = rand::rng();
        if rng.random_bool(0.5) {
            std::mem::swap(&mut first, &mut second);
        }
        println!("Coin flip: {first} takes the first turn.\n");
    }

    let mut session = GameSession::new(first.as_str(), second.as_str());
    subscribe_printers(&mut session);
    print_board(&session);

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        input.clear();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(err) => {
                eprintln!("input error: {err}");
                break;
            }
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if !handle_command(&mut session, line) {
            break;
        }
    }
    println!("Goodbye!");
}

/// Echoes every board notification to the terminal.
fn subscribe_printers(session: &mut GameSession) {
    session.turn_mut().on_phase_change(|event| {
        println!(
            "  [phase] {} -> {} (turn {})",
            event.previous_phase, event.new_phase, event.turn_number
        );
    });
    session.turn_mut().on_turn_change(|event| {
        println!(
            "  [turn] turn {} over; turn {} begins with {} active",
            event.previous_turn, event.new_turn, event.active_player
        );
    });
    session.life_mut().on_life_change(|event| {
        let source = event.source.as_deref().unwrap_or("-");
        println!(
            "  [life] {}: {} -> {} ({:+}, source {})",
            event.player, event.previous_life, event.new_life, event.change, source
        );
    });
    session.tokens_mut().on_token_change(|event| {
        println!(
            "  [token] {} {}: {} -> {}",
            event.card, event.kind, event.previous_count, event.new_count
        );
    });
}

/// Runs one command line. Returns false when the user quits.
fn handle_command(session: &mut GameSession, line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["help"] => print_help(),
        ["quit"] | ["exit"] | ["q"] => return false,
        ["board"] | ["state"] => print_board(session),
        ["next"] | ["n"] => {
            session.turn_mut().advance_phase();
        }
        ["end"] => {
            session.turn_mut().end_turn();
        }
        ["phase", name] => match name.parse::<Phase>() {
            Ok(phase) => session.turn_mut().set_phase(phase),
            Err(err) => eprintln!("{err}"),
        },
        ["act", name] => match name.parse::<ActionKind>() {
            Ok(action) => {
                if let Err(err) = session.turn_mut().consume_action(action) {
                    eprintln!("{err}");
                }
            }
            Err(err) => eprintln!("{err}"),
        },
        ["life"] => print_life(session),
        ["damage", player, amount] => mutate_life(session, player, amount, LifeOp::Damage),
        ["heal", player, amount] => mutate_life(session, player, amount, LifeOp::Heal),
        ["setlife", player, amount] => mutate_life(session, player, amount, LifeOp::Set),
        ["reset-life"] => {
            session.life_mut().reset_all_life();
        }
        ["token", op, card, kind] => token_command(session, op, card, kind, 1),
        ["token", op, card, kind, count] => match count.parse::<u32>() {
            Ok(count) => token_command(session, op, card, kind, count),
            Err(_) => eprintln!("count must be a non-negative integer"),
        },
        ["tokens"] => print_tokens(session),
        ["tokens", card] => print_tokens_on(session, &CardId::from(*card)),
        ["clear-tokens", card] => session.tokens_mut().clear_tokens(&CardId::from(*card)),
        ["kinds"] => print_kinds(),
        ["save", path] => save_session(session, path),
        ["load", path] => load_session(session, path),
        _ => eprintln!("unknown command, try 'help'"),
    }
    true
}

enum LifeOp {
    Damage,
    Heal,
    Set,
}

fn mutate_life(session: &mut GameSession, player: &str, amount: &str, op: LifeOp) {
    let Ok(amount) = amount.parse::<i64>() else {
        eprintln!("amount must be an integer");
        return;
    };
    let player = PlayerId::from(player);
    let result = match op {
        LifeOp::Damage => session.life_mut().deal_damage(&player, amount, Some("cli")),
        LifeOp::Heal => session.life_mut().heal(&player, amount, Some("cli")),
        LifeOp::Set => session.life_mut().set_life(&player, amount, Some("cli")),
    };
    if let Err(err) = result {
        eprintln!("{err}");
    }
}

fn token_command(session: &mut GameSession, op: &str, card: &str, kind: &str, count: u32) {
    let kind = match kind.parse::<TokenKind>() {
        Ok(kind) => kind,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    match op {
        "add" => {
            session.tokens_mut().add_token(card, kind, count);
        }
        "remove" | "rm" => {
            session.tokens_mut().remove_token(card, kind, count);
        }
        "set" => {
            session.tokens_mut().set_token_count(card, kind, count);
        }
        _ => eprintln!("token operations are add, remove and set"),
    }
}

fn print_board(session: &GameSession) {
    let turn = session.turn();
    println!(
        "-- turn {} | phase {} | active {}",
        turn.turn_number(),
        turn.phase(),
        turn.active_player()
    );
    let actions = turn.actions();
    let available: Vec<&str> = ActionKind::ALL
        .into_iter()
        .filter(|action| actions.available(*action))
        .map(ActionKind::name)
        .collect();
    if available.is_empty() {
        println!("   no actions available");
    } else {
        println!("   actions: {}", available.join(", "));
    }
    print_life(session);
    print_tokens(session);
}

fn print_life(session: &GameSession) {
    let life = session.life();
    for player in life.player_ids() {
        if let Ok(total) = life.life(&player) {
            let status = match life.is_dead(&player) {
                Ok(true) => " (dead)",
                _ => "",
            };
            println!("   {player}: {total} life{status}");
        }
    }
}

fn print_tokens(session: &GameSession) {
    let cards = session.tokens().cards_with_tokens();
    if cards.is_empty() {
        println!("   no tokens on the board");
        return;
    }
    for card in cards {
        print_tokens_on(session, &card);
    }
}

fn print_tokens_on(session: &GameSession, card: &CardId) {
    let on_card = session.tokens().tokens_on_card(card);
    if on_card.is_empty() {
        println!("   {card}: no tokens");
        return;
    }
    let mut entries: Vec<(TokenKind, u32)> = on_card.into_iter().collect();
    entries.sort_unstable_by_key(|(kind, _)| *kind);
    let rendered: Vec<String> = entries
        .iter()
        .map(|(kind, count)| format!("{kind} x{count}"))
        .collect();
    println!("   {card}: {}", rendered.join(", "));
}

fn print_kinds() {
    for def in &DEFINITIONS {
        let stacking = if def.stackable { "stackable" } else { "single" };
        println!(
            "   {} \"{}\" - {}, value {}, color {}",
            def.kind, def.name, stacking, def.value, def.color
        );
    }
}

fn save_session(session: &GameSession, path: &str) {
    match session.to_json() {
        Ok(json) => match fs::write(path, json) {
            Ok(()) => println!("saved to {path}"),
            Err(err) => eprintln!("could not write '{path}': {err}"),
        },
        Err(err) => eprintln!("{err}"),
    }
}

fn load_session(session: &mut GameSession, path: &str) {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("could not read '{path}': {err}");
            return;
        }
    };
    match session.restore_json(&json) {
        Ok(()) => print_board(session),
        Err(err) => eprintln!("{err}"),
    }
}

fn print_usage() {
    println!("duelmat [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --p1 NAME    first player name (default \"p1\")");
    println!("  --p2 NAME    second player name (default \"p2\")");
    println!("  --no-flip    skip the coin flip; --p1 takes the first turn");
}

fn print_help() {
    println!("Commands:");
    println!("  board                      show the full board state");
    println!("  next                       advance to the next phase");
    println!("  phase <name>               jump straight to a phase");
    println!("  end                        end the current turn");
    println!("  act <action>               spend an action flag");
    println!("  life                       show life totals");
    println!("  damage <player> <n>        deal damage");
    println!("  heal <player> <n>          heal");
    println!("  setlife <player> <n>       set a life total");
    println!("  reset-life                 reset everyone to starting life");
    println!("  token add|remove|set <card> <kind> [n]");
    println!("  tokens [card]              show token counts");
    println!("  clear-tokens <card>        remove every token from a card");
    println!("  kinds                      list the token kinds");
    println!("  save <file> / load <file>  snapshot the session as JSON");
    println!("  quit                       leave");
    println!();
    println!("Phases: {}", phase_names().join(", "));
    println!("Actions: {}", action_names().join(", "));
}

fn phase_names() -> Vec<&'static str> {
    Phase::ALL.into_iter().map(Phase::name).collect()
}

fn action_names() -> Vec<&'static str> {
    ActionKind::ALL.into_iter().map(ActionKind::name).collect()
}
