use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vx_core::config::VoxConfig;

/// voxid : vérification du locuteur par réseau RBF.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extraire, entraîner le réseau et mesurer la précision sur la partition d'évaluation.
    Train(TrainArgs),
    /// Scorer des enregistrements avec un modèle sauvegardé.
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Enregistrement du locuteur cible (label 1). Répétable.
    #[arg(long = "target", required = true)]
    pub targets: Vec<PathBuf>,

    /// Enregistrement d'un autre locuteur (label 0). Répétable.
    #[arg(long = "other", required = true)]
    pub others: Vec<PathBuf>,

    /// Sauvegarder le modèle entraîné (JSON).
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Nombre de centres RBF.
    #[arg(long)]
    pub clusters: Option<usize>,

    /// Nombre d'époques de descente de gradient.
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Pas d'apprentissage.
    #[arg(long)]
    pub learning_rate: Option<f32>,

    /// Lignes utilisées pour l'entraînement, le reste sert à l'évaluation.
    #[arg(long)]
    pub train_rows: Option<usize>,

    /// Graine pour le mélange des lignes et l'initialisation des centres.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Modèle produit par `voxid train --model`.
    #[arg(long)]
    pub model: PathBuf,

    /// Enregistrements à scorer.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl TrainArgs {
    /// Apply the CLI overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut VoxConfig) {
        if let Some(v) = self.clusters {
            config.rbf.cluster_count = v;
        }
        if let Some(v) = self.epochs {
            config.rbf.max_epochs = v;
        }
        if let Some(v) = self.learning_rate {
            config.rbf.learning_rate = v;
        }
        if let Some(v) = self.train_rows {
            config.dataset.train_rows = v;
        }
        if self.seed.is_some() {
            config.rbf.seed = self.seed;
            config.dataset.shuffle_seed = self.seed;
        }
    }
}
