use std::env;
use std::fs;
use std::process;
use tagpattern::{PatternCache, PolicyKind, TagMap};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: tagpattern [--policy NAME] [--list] <pattern> <song.yaml>";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let mut kind = PolicyKind::Plain;
    let mut list = false;
    let mut positional = Vec::new();

    // Parse flags
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--list" => list = true,
            "--policy" => {
                let Some(name) = iter.next() else {
                    eprintln!("{}", USAGE);
                    process::exit(1);
                };
                kind = match name.parse() {
                    Ok(kind) => kind,
                    Err(_) => {
                        let names: Vec<&str> = PolicyKind::ALL.iter().map(|k| k.name()).collect();
                        eprintln!(
                            "Unknown policy '{}', expected one of: {}",
                            name,
                            names.join(", ")
                        );
                        process::exit(1);
                    }
                };
            }
            _ => positional.push(arg),
        }
    }

    let &[pattern, song_path] = positional.as_slice() else {
        eprintln!("{}", USAGE);
        eprintln!("Policies: plain, file, file-any-ext, markup, markup-shorthand, url");
        process::exit(1);
    };

    // Read song file
    let content = match fs::read_to_string(song_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", song_path, e);
            process::exit(1);
        }
    };

    let song = match TagMap::from_yaml(&content) {
        Ok(song) => song,
        Err(e) => {
            eprintln!("Error in '{}': {}", song_path, e);
            process::exit(1);
        }
    };

    let mut cache = PatternCache::default();
    let formatter = match cache.get(kind, pattern) {
        Ok(formatter) => formatter,
        Err(e) => {
            eprintln!("Pattern error: {}", e);
            process::exit(1);
        }
    };

    // Output
    if list {
        match formatter.format_list(&song) {
            Ok(values) => {
                for (display, sort) in values {
                    println!("{}\t{}", display, sort);
                }
            }
            Err(e) => {
                eprintln!("Render error: {}", e);
                process::exit(1);
            }
        }
    } else {
        match formatter.format(&song) {
            Ok(value) => println!("{}", value),
            Err(e) => {
                eprintln!("Render error: {}", e);
                process::exit(1);
            }
        }
    }
}
