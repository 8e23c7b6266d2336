mod cli;
mod model_file;
mod pipeline;
mod report;

use anyhow::Result;
use clap::Parser;
use vx_core::config::{VoxConfig, load_config};

use crate::cli::{ClassifyArgs, Command, TrainArgs};
use crate::pipeline::{OTHER_LABEL, Recording, TARGET_LABEL};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    let mut config = resolve_config(&cli)?;

    match &cli.command {
        Command::Train(args) => {
            args.apply_overrides(&mut config);
            config.validate()?;
            run_train(args, &config)
        }
        Command::Classify(args) => run_classify(args),
    }
}

fn resolve_config(cli: &cli::Cli) -> Result<VoxConfig> {
    if cli.config.exists() {
        load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(VoxConfig::default())
    }
}

fn run_train(args: &TrainArgs, config: &VoxConfig) -> Result<()> {
    let recordings: Vec<Recording> = Recording::labeled(&args.targets, TARGET_LABEL)
        .chain(Recording::labeled(&args.others, OTHER_LABEL))
        .collect();
    log::info!(
        "{} enregistrements cibles, {} autres",
        args.targets.len(),
        args.others.len()
    );

    let dataset = pipeline::build_dataset(&recordings, config)?;
    log::info!("Dataset : {} lignes x {} features", dataset.len(), dataset.feature_count());

    let (model, confusion) = pipeline::train_and_evaluate(dataset, config)?;
    println!("{confusion}");

    if let Some(ref path) = args.model {
        model_file::save_model(&model, path)?;
    }
    Ok(())
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    // Extraction parameters come from the model, not from the config file.
    let model = model_file::load_model(&args.model)?;
    for path in &args.files {
        let verdict = pipeline::classify_file(&model, path)?;
        println!("{}", path.display());
        for (i, score) in verdict.frame_scores.iter().enumerate() {
            println!("  frame {i:>4} : {score:.4}");
        }
        println!(
            "  moyenne {:.4} -> {}",
            verdict.mean_score,
            if verdict.is_target { "locuteur cible" } else { "autre locuteur" }
        );
    }
    Ok(())
}
