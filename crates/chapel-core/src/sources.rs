//! Source prioritization.
//!
//! | Mode | Order |
//! |------|-------|
//! | development | local API route, local static JSON, CDN JSON |
//! | production | CDN JSON, local API route, local static JSON |

use crate::config::{ApiConfig, RuntimeMode};
use crate::resource::ResourceType;

impl ApiConfig {
    /// Ordered candidate URLs for `resource`, most preferred first.
    pub fn sources_for(&self, resource: ResourceType) -> Vec<String> {
        let endpoints = resource.endpoints();
        let base = self.base_url();
        let api = format!("{base}{}", endpoints.list);
        let local = format!("{base}{}", endpoints.local);
        let cdn = format!("{}{}", self.cdn_base(), endpoints.cdn);

        match self.mode {
            RuntimeMode::Development => vec![api, local, cdn],
            RuntimeMode::Production => vec![cdn, api, local],
        }
    }
}

/// Ordered candidate URLs for a resource name.
///
/// Names match exactly (`"audio"`, not `"Audio"`), since the same name
/// selects the payload key during normalization. Unknown names yield an
/// empty list; callers treat that as "no sources".
pub fn data_sources(resource: &str, config: &ApiConfig) -> Vec<String> {
    ResourceType::ALL
        .into_iter()
        .find(|known| known.as_str() == resource)
        .map(|known| config.sources_for(known))
        .unwrap_or_default()
}
