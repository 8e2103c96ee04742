//! List and resolve routes.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use armature_cache::CacheManager;
use armature_router::{RouteResolver, RouteTree};

use super::RoutesArgs;
use crate::context::Context;

/// Run the routes command.
pub async fn run(args: RoutesArgs, ctx: &Context) -> Result<()> {
    match args.path {
        Some(path) => resolve(&path, ctx).await,
        None => list(ctx),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let routes_dir = ctx.config.routes_dir();
    let tree = RouteTree::scan(&routes_dir, &ctx.config.routes)
        .with_context(|| format!("Failed to scan {}", routes_dir.display()))?;

    if ctx.output.is_json() {
        ctx.output.json(&tree);
        return Ok(());
    }

    ctx.output.header(&format!("Routes ({})", tree.len()));
    if tree.is_empty() {
        ctx.output.info(&format!("No routes in {}", routes_dir.display()));
        return Ok(());
    }

    let width = tree
        .routes()
        .iter()
        .map(|r| r.pattern.len())
        .max()
        .unwrap_or(0);
    for entry in tree.routes() {
        let file = display_relative(&entry.file, &routes_dir);
        ctx.output.table_row(&[entry.pattern.as_str(), file.as_str()], &[width, 0]);
    }

    Ok(())
}

async fn resolve(path: &str, ctx: &Context) -> Result<()> {
    let routes_dir = ctx.config.routes_dir();
    let cache = Arc::new(CacheManager::new(&ctx.config.cache));
    let resolver = RouteResolver::new(routes_dir.clone(), ctx.config.routes.clone(), cache);
    let info = resolver.resolve(path).await?;

    if ctx.output.is_json() {
        ctx.output.json(&info);
        return Ok(());
    }

    let Some(file) = info.file() else {
        ctx.output.warn(&format!("No route matches {}", path));
        return Ok(());
    };

    ctx.output.header(path);
    ctx.output.kv("file", &display_relative(file, &routes_dir));
    if let Some(layout) = &info.layout {
        ctx.output.kv("layout", &display_relative(layout, &routes_dir));
    }
    for (name, value) in &info.params {
        ctx.output.kv(&format!("params.{}", name), value);
    }

    Ok(())
}

fn display_relative(file: &Path, root: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).display().to_string()
}
