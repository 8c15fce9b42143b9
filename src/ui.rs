#![cfg(feature = "std")]

//! Terminal rendering of evaluations, keyboards and game progress.

use crate::common::{LetterState, PlayerId};
use crate::evaluate::Evaluation;
use crate::game::Game;
use crate::keyboard::KeyboardState;
use crate::session::{ConnectionState, GameView};
use crate::word::Word;

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[42;30m";
const YELLOW: &str = "\x1b[43;30m";
const GRAY: &str = "\x1b[100;37m";
const DIM: &str = "\x1b[2m";

fn paint(ch: char, state: LetterState) -> String {
    let color = match state {
        LetterState::Correct => GREEN,
        LetterState::Present => YELLOW,
        LetterState::Absent => GRAY,
    };
    format!("{} {} {}", color, ch, RESET)
}

/// One guess row: each letter on its evaluation color.
pub fn format_evaluation(word: &Word, eval: &Evaluation) -> String {
    word.letters()
        .iter()
        .zip(eval.iter())
        .map(|(ch, state)| paint(*ch, *state))
        .collect()
}

/// Three keyboard rows with each key on its best-known color; untouched
/// keys render dim.
pub fn format_keyboard(keyboard: &KeyboardState) -> String {
    const ROWS: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM"];
    let mut out = String::new();
    for (i, row) in ROWS.iter().enumerate() {
        out.push_str(&"  ".repeat(i));
        for ch in row.chars() {
            match keyboard.state_of(ch) {
                Some(state) => out.push_str(&paint(ch, state)),
                None => out.push_str(&format!("{} {} {}", DIM, ch, RESET)),
            }
        }
        out.push('\n');
    }
    out
}

/// Progress of every other participant: nickname and attempts used, without
/// revealing their words.
pub fn format_opponents(game: &Game, viewer: PlayerId) -> String {
    let mut out = String::new();
    for member in game.players.iter().filter(|p| p.player != viewer) {
        let attempts = game.attempts_of(member.player);
        out.push_str(&format!(
            "  {}: {}/{} attempts\n",
            member.nickname, attempts, game.max_attempts
        ));
    }
    out
}

/// Full board for the viewer: own guesses, keyboard, opponents, link state.
pub fn print_view(view: &GameView, viewer: PlayerId) {
    println!();
    for guess in view.game.guesses_of(viewer) {
        println!("  {}", format_evaluation(&guess.word, &guess.eval));
    }
    println!();
    print!("{}", format_keyboard(&view.keyboard));
    if view.game.multiplayer {
        print!("{}", format_opponents(&view.game, viewer));
    }
    if view.connection == ConnectionState::Degraded {
        println!("  !! connection lost; local state preserved, use retry");
    }
}
