//! The CLI shell: reads a distance matrix from standard input, searches
//! for the given number of generations, and reports the champion.

use std::io;
use std::process;

use mqtc::{DistanceMatrix, Search, Trace};

fn main() {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "mqtc".to_string());
    let generations = args.next().and_then(|arg| arg.parse::<usize>().ok());

    // Exactly one argument: a positive decimal generation count.
    let generations = match (generations, args.next()) {
        (Some(g), None) if g > 0 => g,
        _ => {
            println!("Usage: cat <datafile> | {program} <# generations>");
            process::exit(0);
        }
    };

    let stdin = io::stdin();
    let data = match DistanceMatrix::from_reader(stdin.lock()) {
        Ok(data) => data,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };

    let outcome = Search::new(&data, generations)
        .with_trace(Trace::open())
        .run();

    print!("{}", outcome.champion);
    print!("best:{:.6} init:", outcome.best);
    for cost in &outcome.init {
        print!("{cost:.6} ");
    }
    println!();

    process::exit(1);
}
