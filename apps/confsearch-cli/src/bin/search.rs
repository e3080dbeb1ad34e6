use std::env;

use confsearch_cli::{init_tracing, App};
use confsearch_core::types::SearchMode;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <query> [--mode KEYWORD|VECTOR|HYBRID] [--offset N] [--limit N]");
    eprintln!("Example: {program} 'fintech conference' --mode HYBRID --limit 10");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("confsearch-search", String::as_str);

    let mut query = None;
    let mut mode = SearchMode::Hybrid.to_string();
    let mut offset = 0usize;
    let mut limit = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--mode" | "-m" => mode = rest.next().unwrap_or_else(|| usage(program)).to_uppercase(),
            "--offset" => offset = rest.next().and_then(|v| v.parse().ok()).unwrap_or_else(|| usage(program)),
            "--limit" | "-n" => {
                limit = Some(rest.next().and_then(|v| v.parse().ok()).unwrap_or_else(|| usage(program)));
            }
            _ if !arg.starts_with('-') => query = Some(arg.clone()),
            _ => usage(program),
        }
    }
    let Some(query) = query else { usage(program) };

    let app = App::from_config()?;
    let limit = limit.unwrap_or(app.settings.search.default_limit);
    println!("🔍 {mode} search: \"{query}\" (offset {offset}, limit {limit})");

    let outcome = app.service.search(&query, &mode, offset, limit).await;
    app.shutdown().await;
    let results = outcome?;

    println!("Found {} results", results.len());
    for (i, c) in results.iter().enumerate() {
        let score = c.score.map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
        println!("\n  {}. score={score}  id={}  {}", offset + i + 1, c.id, c.name);
        if !c.formatted_location.is_empty() {
            println!("     📍 {}", c.formatted_location);
        }
        if let (Some(start), Some(end)) = (c.start_date, c.end_date) {
            println!("     📅 {start} → {end}");
        }
    }
    Ok(())
}
