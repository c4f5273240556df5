// src/main.rs

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Args;
use git_timeline::report;
use git_timeline::{Applied, GitSource, HistorySource, TimelineConfig, TimelineRequest, TimelineWorker};
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    let source = GitSource::open(&args.repo)
        .with_context(|| format!("Not a git repository: {}", args.repo.display()))?;
    let mut config = TimelineConfig::load(source.workdir(), args.config.as_deref())?;
    if let Some(limit) = args.limit {
        config.limit = limit as usize;
    }
    if let Some(sample_size) = args.sample_size {
        config.tloc.sample_size = sample_size as usize;
    }

    if args.list_branches {
        let current = source.current_branch();
        for head in source.list_branch_heads()? {
            let marker = if current.as_deref() == Some(head.name.as_str()) { "*" } else { " " };
            println!("{} {} {:.8}", marker, head.name, head.tip.to_string());
        }
        return Ok(());
    }

    let request = TimelineRequest { selector: args.selector(), limit: config.limit };
    println!("Loading up to {} commits from {}...", request.limit, request.selector);

    let repo_path = args.repo.clone();
    let worker = TimelineWorker::new(move || GitSource::open(&repo_path), config.tloc)
        .with_progress(!args.no_progress);
    let mut view = worker.view();
    let generation = worker.request(request)?;

    // 1. Wait for the batch of our request
    loop {
        let outcome = worker.outcomes().recv()?;
        let done = outcome.generation == generation;
        if let Applied::Failed(notice) = view.apply(outcome) {
            bail!(notice);
        }
        if done {
            break;
        }
    }
    let Some(batch) = view.batch() else {
        bail!("No timeline was produced");
    };
    println!("Analysis finished in {:.2?}.", start_time.elapsed());

    // 2. Summary of the newest commit
    println!("{}", report::summary(batch));

    // 3. Optional outputs
    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
        report::write_csv(batch, BufWriter::new(file))?;
        println!("Wrote CSV to {}", path.display());
    }
    if let Some(path) = &args.json {
        std::fs::write(path, report::to_json(batch)?)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        println!("Wrote JSON to {}", path.display());
    }
    if args.lanes {
        println!();
        if batch.lanes.is_empty() {
            println!("No local branch contains the loaded commits");
        }
        print!("{}", report::swimlane_text(batch));
    }
    if let Some(prefix) = &args.details {
        match batch.find(prefix) {
            Some(record) => {
                println!();
                print!("{}", report::commit_details(record));
            }
            None => bail!("No single loaded commit matches '{}'", prefix),
        }
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}
