use chapel_core::ResourceType;
use serde_json::json;

use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(context: &Context, resource: ResourceType) -> Result<CommandResult, CliError> {
    let endpoints = resource.endpoints();
    let settings = context.config.settings();

    Ok(CommandResult::ok(json!({
        "resource": resource,
        "sources": context.router.sources(resource.as_str()),
        "endpoints": {
            "list": endpoints.list,
            "local": endpoints.local,
            "cdn": endpoints.cdn,
        },
        "cache_timeout_ms": u64::try_from(settings.cache_timeout.as_millis()).unwrap_or(u64::MAX),
        "fallbacks_enabled": settings.enable_fallbacks,
    })))
}
