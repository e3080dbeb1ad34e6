use std::env;

use confsearch_cli::{cancel_on_ctrl_c, init_tracing, App};
use confsearch_core::config::expand_path;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <command>");
    eprintln!("Commands:");
    eprintln!("  create-index        create the index if it does not exist");
    eprintln!("  delete-data         delete the index and everything in it");
    eprintln!("  load <file.csv>     create the index if needed, then index the CSV");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("confsearch-admin", String::as_str);
    let Some(command) = args.get(1).map(String::as_str) else { usage(program) };
    if !matches!(command, "create-index" | "delete-data" | "load") {
        usage(program);
    }
    let csv = match (command, args.get(2)) {
        ("load", Some(file)) => Some(expand_path(file)),
        ("load", None) => usage(program),
        _ => None,
    };

    let app = App::from_config()?.with_progress();
    let index = app.service.index_name().to_string();
    let outcome = match (command, csv) {
        ("create-index", _) => app.service.create_index_if_needed().await.map(|created| {
            if created {
                println!("✅ Created index '{index}'");
            } else {
                println!("Index '{index}' already exists");
            }
        }),
        ("delete-data", _) => app.service.delete_data().await.map(|deleted| {
            if deleted {
                println!("🗑️  Deleted index '{index}'");
            } else {
                println!("Index '{index}' does not exist");
            }
        }),
        (_, Some(path)) => {
            println!("Loading {} into '{index}'", path.display());
            let cancel = cancel_on_ctrl_c();
            app.service.load_csv(&path, &cancel).await.map(|report| {
                println!(
                    "\n📊 Indexed {} conferences in {} batches ({:.1}s)",
                    report.documents,
                    report.batches,
                    report.elapsed.as_secs_f64()
                );
            })
        }
        _ => usage(program),
    };

    app.shutdown().await;
    Ok(outcome?)
}
