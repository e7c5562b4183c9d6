use anyhow::Context;
use bedside::config_loader::TrainingConfig;
use bedside::trainer::{evaluate, train};
use clap::Parser;
use std::path::Path;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Offline trainer for the bedside scoring model", long_about = None)]
struct Args {
    /// CSV training set: text followed by four target scores per row
    #[clap(short, long)]
    data: String,

    /// Where to write the trained model
    #[clap(short, long, default_value = "model.bin")]
    out: String,

    #[clap(long, default_value_t = 25)]
    epochs: usize,

    #[clap(long, default_value_t = 0.01)]
    learning_rate: f32,

    /// Visit examples in shuffled order each epoch (seeded, reproducible)
    #[clap(long)]
    shuffle: bool,

    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Optional held-out CSV to evaluate after training
    #[clap(long)]
    eval: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let cfg = TrainingConfig {
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        shuffle: args.shuffle,
        seed: args.seed,
    };

    let model = train(Path::new(&args.data), &cfg)
        .with_context(|| format!("training from {} failed", args.data))?;

    let out = Path::new(&args.out);
    model
        .save(out)
        .with_context(|| format!("failed to write model to {}", args.out))?;
    model
        .write_manifest(out)
        .context("failed to write model manifest")?;
    println!("Model saved to {}", args.out);

    if let Some(eval_data) = args.eval {
        let report = evaluate(&model, Path::new(&eval_data))
            .with_context(|| format!("evaluation of {eval_data} failed"))?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
