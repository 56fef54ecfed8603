use std::path::Path;

use chapel_core::{QueryParams, ResourceCache, ResourceType};
use serde_json::json;

use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn clear(
    context: &Context,
    resource: ResourceType,
    cache_dir: &Path,
) -> Result<CommandResult, CliError> {
    let view = context.view(resource);
    let key = view.cache_key(&QueryParams::new());
    view.clear_cache().await;

    Ok(CommandResult::ok(json!({
        "cache_dir": cache_dir.display().to_string(),
        "cleared": key,
    })))
}

pub async fn purge(context: &Context, cache_dir: &Path) -> Result<CommandResult, CliError> {
    let timeout = context.config.settings().cache_timeout;
    let cache = ResourceCache::new(context.store.clone(), timeout);
    let purged = cache.purge_expired().await?;
    let remaining = context.store.keys().await?.len();

    let result = CommandResult::ok(json!({
        "cache_dir": cache_dir.display().to_string(),
        "purged": purged,
        "remaining": remaining,
    }));
    if cache.is_disabled() {
        Ok(result.with_warning(format!(
            "{} mode keeps nothing cached; every entry was purged",
            context.config.mode
        )))
    } else {
        Ok(result)
    }
}
