//! Resource type identifiers and the static endpoint registry.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Content categories understood by the fetch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Audio,
    Transcripts,
    Articles,
    Gallery,
}

impl ResourceType {
    pub const ALL: [Self; 4] = [Self::Audio, Self::Transcripts, Self::Articles, Self::Gallery];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Transcripts => "transcripts",
            Self::Articles => "articles",
            Self::Gallery => "gallery",
        }
    }

    /// Candidate locations for this resource type.
    pub const fn endpoints(self) -> ResourceEndpoints {
        match self {
            Self::Audio => ResourceEndpoints {
                list: "/api/audio",
                local: "/data/audios.json",
                cdn: "/audios/audios.json",
            },
            Self::Transcripts => ResourceEndpoints {
                list: "/api/transcripts",
                local: "/data/transcripts.json",
                cdn: "/transcripts/transcripts.json",
            },
            Self::Articles => ResourceEndpoints {
                list: "/api/articles",
                local: "/data/articles.json",
                cdn: "/articles/articles.json",
            },
            Self::Gallery => ResourceEndpoints {
                list: "/api/gallery",
                local: "/data/gallery.json",
                cdn: "/gallery/gallery.json",
            },
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "transcripts" => Ok(Self::Transcripts),
            "articles" => Ok(Self::Articles),
            "gallery" => Ok(Self::Gallery),
            other => Err(ValidationError::UnknownResourceType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Path set for one resource type.
///
/// `list` and `local` are relative to the site base URL, `cdn` is relative
/// to the CDN base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEndpoints {
    pub list: &'static str,
    pub local: &'static str,
    pub cdn: &'static str,
}
