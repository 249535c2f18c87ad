use std::{
    io::Read,
    path::Path,
};

use {
    anyhow::{Context, Result},
    threadline_social::{is_valid_message, parse_action_response, segment as split, weighted_len},
};

/// Read the whole input from `file`, or from stdin when no file is given.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        },
    }
}

fn render_chunks(chunks: &[String]) -> String {
    let total = chunks.len();
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("--- {}/{total} ({}) ---\n{chunk}", i + 1, weighted_len(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn segment(file: Option<&Path>, max_length: usize) -> Result<()> {
    let text = read_input(file)?;
    let chunks = split(&text, max_length);
    if chunks.is_empty() {
        eprintln!("Nothing to publish.");
        return Ok(());
    }
    println!("{}", render_chunks(&chunks));
    Ok(())
}

pub fn intents(file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let flags = parse_action_response(&text);
    println!("{}", serde_json::to_string_pretty(&flags)?);
    Ok(())
}

pub fn check_spam(file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    if is_valid_message(&text) {
        println!("ok");
    } else {
        println!("spam");
        std::process::exit(1);
    }
    Ok(())
}
