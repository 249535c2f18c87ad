use {clap::Subcommand, threadline_config::ThreadlineConfig, threadline_memory::MemoryRecord};

#[derive(Subcommand)]
pub enum MemoryAction {
    /// List the most recent memories.
    List {
        /// Maximum number of memories to show.
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Output results as JSON for scripting.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub async fn handle_memory(action: MemoryAction, config: &ThreadlineConfig) -> anyhow::Result<()> {
    match action {
        MemoryAction::List { limit, json } => list_memories(config, limit, json).await,
    }
}

async fn list_memories(config: &ThreadlineConfig, limit: u32, json: bool) -> anyhow::Result<()> {
    let db_path = config.memory.resolved_database_path();
    if !db_path.exists() {
        if json {
            println!("[]");
        } else {
            println!("Memory database not found at {}.", db_path.display());
        }
        return Ok(());
    }

    let store = threadline_memory::SqliteMemoryStore::open(&db_path).await?;
    let records = store.list_recent(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No memories stored.");
    } else {
        print_human(&records);
    }
    Ok(())
}

fn print_human(records: &[MemoryRecord]) {
    for (i, r) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} [{}] {}", r.id, r.content.source, r.created_at);
        if let Some(url) = &r.content.url {
            println!("  {url}");
        }
        let snippet = r.content.text.trim();
        let preview: String = snippet.chars().take(200).collect();
        for line in preview.lines() {
            println!("  {line}");
        }
        if snippet.chars().count() > 200 {
            println!("  ...");
        }
    }
}
