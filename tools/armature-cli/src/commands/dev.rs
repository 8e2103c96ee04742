//! Run the development server.

use anyhow::Result;

use super::DevArgs;
use crate::context::Context;

/// Run the dev command.
pub async fn run(args: DevArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.no_hmr {
        config.hmr.enabled = false;
    }
    config.validate()?;

    if !config.routes_dir().is_dir() {
        ctx.output.warn(&format!(
            "Routes directory {} does not exist; every page will be 404",
            config.routes_dir().display()
        ));
    }

    ctx.output.header("Starting dev server");
    ctx.output.kv("Root", &config.root().display().to_string());
    ctx.output.kv("URL", &format!("http://{}", config.server.addr()));
    ctx.output.kv("HMR", if config.hmr.enabled { config.hmr.endpoint.as_str() } else { "disabled" });
    ctx.output.debug(&format!("Bundler: {}", config.build.bundler));

    armature_server::serve(config, ctx.bundler()).await?;

    ctx.output.success("Server stopped");
    Ok(())
}
