//! Podcast domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use podcast_core::{PodcastId, UserId};

/// A show published by a creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Podcast {
    pub id: PodcastId,
    pub name: String,
    pub url: String,
    pub description: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPodcast {
    pub name: String,
    pub url: String,
    pub description: String,
    pub user_id: UserId,
}

/// A podcast with its owner's display name, for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct PodcastWithOwner {
    #[serde(flatten)]
    pub podcast: Podcast,
    pub owner_name: String,
}
