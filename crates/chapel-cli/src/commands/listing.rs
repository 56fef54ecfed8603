use chapel_core::{QueryParams, ResourceType};
use serde_json::json;

use crate::error::CliError;

use super::{CommandResult, Context};

/// The listing-shaped commands; all of them go through a `ResourceView`.
pub enum Listing<'a> {
    Fetch(QueryParams),
    Search(&'a str),
    Sort(&'a str),
    Refresh,
    Featured,
    Stats,
}

pub async fn run(
    context: &Context,
    resource: ResourceType,
    listing: Listing<'_>,
) -> Result<CommandResult, CliError> {
    let no_params = QueryParams::new();
    let mut view = match listing {
        Listing::Featured => context.featured_view(resource),
        _ => context.view(resource),
    };

    let items = match &listing {
        Listing::Fetch(params) => view.fetch_data(params).await,
        Listing::Search(term) => {
            let term = term.trim();
            if term.is_empty() {
                return Err(CliError::Command(String::from(
                    "search term must not be empty",
                )));
            }
            view.search(term, &no_params).await
        }
        Listing::Sort(by) => view.sort(by, &no_params).await,
        Listing::Refresh => view.refresh(&no_params).await,
        Listing::Featured | Listing::Stats => view.fetch_data(&no_params).await,
    };

    let data = match listing {
        Listing::Featured => json!({
            "resource": resource,
            "item": view.featured_item(),
        }),
        Listing::Stats => json!({
            "resource": resource,
            "stats": view.stats(),
        }),
        _ => json!({
            "resource": resource,
            "items": items,
            "metadata": view.metadata(),
        }),
    };

    let mut result = CommandResult::ok(data);
    if let Some(error) = view.error() {
        result = result.with_error(error);
        if view.has_data() {
            result = result.with_warning("every source failed; serving fallback data");
        }
    } else if view.is_empty() {
        result = result.with_warning(format!("no {resource} items found"));
    }
    Ok(result)
}
