//! Upload categories: the logical prefixes objects are stored under.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Category of an uploaded object. Each category is a top-level key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Avatar,
    Gif,
    Video,
    Theme,
    Icon,
    General,
    /// Media attached to a board post, partitioned by post id.
    Post,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Image,
        Category::Avatar,
        Category::Gif,
        Category::Video,
        Category::Theme,
        Category::Icon,
        Category::General,
        Category::Post,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Avatar => "avatar",
            Category::Gif => "gif",
            Category::Video => "video",
            Category::Theme => "theme",
            Category::Icon => "icon",
            Category::General => "general",
            Category::Post => "posts",
        }
    }

    /// Shared categories are not partitioned per user.
    pub fn is_shared(&self) -> bool {
        matches!(self, Category::General | Category::Theme | Category::Icon)
    }

    /// Destination prefix for an upload owned by `owner`.
    ///
    /// Layout: `<category>` for shared categories, `posts/<post id>` for post
    /// media, otherwise `<category>/user_<id>` or `<category>/anonymous`.
    pub fn destination_prefix(&self, owner: Option<u64>) -> String {
        if self.is_shared() {
            return self.as_str().to_string();
        }
        if *self == Category::Post {
            return match owner {
                Some(id) => format!("posts/{}", id),
                None => "posts".to_string(),
            };
        }
        match owner {
            Some(id) if id > 0 => format!("{}/user_{}", self.as_str(), id),
            _ => format!("{}/anonymous", self.as_str()),
        }
    }

    /// The listing prefix used when scanning this category.
    pub fn scan_prefix(&self) -> String {
        format!("{}/", self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('/').to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Invalid category: {}", s))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
