//! Configuration management commands.

use anyhow::{bail, Context as _, Result};
use armature_core::ArmatureConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }
    println!();
    print!("{}", ctx.config.to_toml()?);

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.default_config_path();

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = ArmatureConfig::default();
    if let Some(name) = ctx.cwd.file_name().and_then(|n| n.to_str()) {
        config.project.name = name.to_string();
    }

    tokio::fs::write(&config_path, config.to_toml()?)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors = Vec::new();
    if let Err(e) = ctx.config.validate() {
        errors.push(e.to_string());
    }
    let warnings = warnings(&ctx.config);

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": errors.is_empty(),
            "errors": errors,
            "warnings": warnings,
        }));
    } else {
        for error in &errors {
            ctx.output.error(&format!("Error: {}", error));
        }
        for warning in &warnings {
            ctx.output.warn(&format!("Warning: {}", warning));
        }
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
    } else {
        ctx.output.success("Configuration is valid (with warnings)");
    }

    Ok(())
}

/// Problems that do not stop the server from starting.
fn warnings(config: &ArmatureConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.routes_dir().is_dir() {
        warnings.push(format!(
            "routes directory {} does not exist",
            config.routes_dir().display()
        ));
    }
    if !config.routes_dir().starts_with(config.src_dir()) {
        warnings.push("paths.routes_dir is outside paths.src_dir; route edits will not hot reload".to_string());
    }
    if config.build_dir().starts_with(config.src_dir()) {
        warnings.push("paths.build_dir is inside paths.src_dir".to_string());
    }
    if config.hmr.enabled && config.hmr.debounce_ms == 0 {
        warnings.push("hmr.debounce_ms is 0; every file event triggers a rebuild".to_string());
    }

    warnings
}
