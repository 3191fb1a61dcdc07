mod document;
mod generate;
mod pipeline;
mod prompt;
mod search_index;
mod settings;
mod splitter;

use std::io::Write;
use std::path::Path;
use std::process::exit;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use generate::HttpGenerator;
use pipeline::Pipeline;
use search_index::{OpenSearchIndex, SearchOptions};
use settings::{Args, Settings};
use splitter::SplitterConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = match load_settings(&args) {
        Ok(ret) => ret,
        Err(error) => {
            eprintln!("Problem while loading settings. {error}");
            exit(1);
        }
    };

    if let Err(error) = run(settings).await {
        eprintln!("{error:#}");
        exit(1);
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_defaults()?,
    };
    Ok(settings)
}

async fn run(settings: Settings) -> Result<()> {
    let index = OpenSearchIndex::new(
        &settings.index.url,
        settings.index.username.clone(),
        settings.index.password.clone(),
    );
    let generator = HttpGenerator::new(&settings.llm.url, &settings.llm.model);
    let pipeline = Pipeline::new(
        index,
        generator,
        &settings.index.name,
        SearchOptions {
            size: settings.index.search_size,
        },
    );

    // One-time indexing flow: load, split, and write the schema chunks.
    let splitter_config = SplitterConfig {
        chunk_size: settings.chunking.chunk_size,
        chunk_overlap: settings.chunking.chunk_overlap,
        separators: settings.chunking.separators.clone(),
    };
    let indexed = pipeline
        .index_schema(Path::new(&settings.schema_file), &splitter_config)
        .await?;
    info!("Indexing completed: {indexed} records.");

    // Query flow: one question per line until 'exit'.
    loop {
        print!("Enter your question (or 'exit' to quit): ");
        std::io::stdout().flush()?;

        let mut question = String::new();
        if std::io::stdin().read_line(&mut question)? == 0 {
            break;
        }
        let question = question.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") {
            break;
        }

        match pipeline.ask(question).await {
            Ok(sql) => println!("{sql}"),
            Err(error) => eprintln!("Problem while generating query. {error:#}"),
        }
    }

    Ok(())
}
