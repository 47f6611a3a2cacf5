use chrono::{DateTime, Utc};
use recall::cli::{Cli, Commands, ConfigAction};
use recall::config::Config;
use recall::error::{RecallError, Result};
use recall::routing::{QueryClassifier, RouteDecision};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Route { query, json, at } => {
            cmd_route(cli.config, &query, json, at)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "recall=debug" } else { "recall=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_route(config_path: Option<PathBuf>, query: &str, json: bool, at: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let classifier = QueryClassifier::from_config(&config);

    let now = match at {
        Some(at) => parse_timestamp(&at)?,
        None => Utc::now(),
    };

    let decision = classifier.route_at(query, now);

    if json {
        let output = serde_json::to_string_pretty(&decision).map_err(|e| RecallError::Json {
            source: e,
            context: "Failed to serialize route decision".to_string(),
        })?;
        println!("{}", output);
    } else {
        print_decision(&decision);
    }

    Ok(())
}

fn print_decision(decision: &RouteDecision) {
    println!("Strategy:   {}", decision.strategy);
    println!("            {}", decision.strategy.description());
    println!("Confidence: {:.2}", decision.confidence);

    match &decision.time_range {
        Some(range) => {
            println!("Time range: {}", range.label);
            println!("  Start:    {}", range.start.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  End:      {}", range.end.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Mode:     {}", decision.schedule_query_mode.as_str());
        }
        None => println!("Time range: none"),
    }

    if decision.semantic_query.is_empty() {
        println!("Semantic:   (none)");
    } else {
        println!("Semantic:   {}", decision.semantic_query);
    }
    println!("Hybrid:     {}", if decision.strategy.is_hybrid() { "yes" } else { "no" });
    println!("Reranker:   {}", if decision.needs_reranker { "yes" } else { "no" });
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            RecallError::Other(anyhow::anyhow!(
                "Invalid timestamp '{}': {} (expected RFC 3339, e.g. 2025-01-15T10:30:00Z)",
                value,
                e
            ))
        })
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path)?;
            let mut value = serde_json::to_value(&config).map_err(|e| RecallError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            if let Some(section) = section {
                value = value.get(&section).cloned().ok_or_else(|| {
                    RecallError::Config(format!("Unknown config section: {}", section))
                })?;
            }

            let json = serde_json::to_string_pretty(&value).map_err(|e| RecallError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RecallError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Path => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'recall config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides()?;
        recall::config::ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    Config::load(&path)
}
