//! Short-video feed
//!
//! Only a fixture-backed source exists; it stands where a network fetch
//! would go and simulates its latency.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::errors::DuoCamError;
use crate::types::FeedPost;

/// Supplier of the current ordered list of posts
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn load_feed(&self) -> Vec<FeedPost>;
}

/// Fixed list of posts returned after a delay
#[derive(Debug, Clone)]
pub struct MockFeedSource {
    posts: Vec<FeedPost>,
    latency: Duration,
}

impl MockFeedSource {
    pub fn new(posts: Vec<FeedPost>, latency: Duration) -> Self {
        Self { posts, latency }
    }

    /// Built-in sample posts
    pub fn with_sample_posts(latency: Duration) -> Self {
        Self::new(sample_posts(), latency)
    }

    /// Posts read from a JSON array of [`FeedPost`]
    pub fn from_json_file<P: AsRef<Path>>(path: P, latency: Duration) -> Result<Self, DuoCamError> {
        let path = path.as_ref();
        let contents = fs::read(path)
            .map_err(|e| DuoCamError::Io(format!("Failed to read feed fixture {:?}: {}", path, e)))?;
        let posts: Vec<FeedPost> = serde_json::from_slice(&contents)?;
        log::info!("Loaded {} feed post(s) from {:?}", posts.len(), path);
        Ok(Self::new(posts, latency))
    }

    /// Source described by `config`; an unreadable fixture falls back to the samples
    pub fn from_config(config: &FeedConfig) -> Self {
        match &config.fixture_path {
            Some(path) => Self::from_json_file(path, config.latency()).unwrap_or_else(|e| {
                log::warn!("Feed fixture unusable, using sample posts: {}", e);
                Self::with_sample_posts(config.latency())
            }),
            None => Self::with_sample_posts(config.latency()),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl FeedSource for MockFeedSource {
    async fn load_feed(&self) -> Vec<FeedPost> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.posts.clone()
    }
}

fn post(
    id: &str,
    title: &str,
    creator: &str,
    views: u64,
    likes: u64,
    description: &str,
    duration_secs: f64,
) -> FeedPost {
    FeedPost {
        id: id.to_string(),
        title: title.to_string(),
        creator: creator.to_string(),
        media_url: format!("https://media.example.com/videos/{}.mp4", id),
        thumbnail_url: format!("https://media.example.com/thumbs/{}.jpg", id),
        views,
        likes,
        description: description.to_string(),
        duration_secs,
    }
}

/// Sample posts in feed order
pub fn sample_posts() -> Vec<FeedPost> {
    vec![
        post(
            "sunrise-hike",
            "Sunrise hike, both angles",
            "@trailmix",
            182_400,
            12_310,
            "Front cam for the reactions, back cam for the view.",
            14.2,
        ),
        post(
            "latte-art",
            "Latte art attempt #47",
            "@barista.bea",
            54_020,
            4_870,
            "Still can't do the swan.",
            11.0,
        ),
        post(
            "skate-line",
            "First clean line at the park",
            "@kickflipkid",
            1_204_500,
            98_400,
            "Took three weekends. Worth it.",
            15.0,
        ),
        post(
            "street-food",
            "Night market dumplings",
            "@eatwithsam",
            309_870,
            27_600,
            "Watch my face when the soup hits.",
            12.6,
        ),
        post(
            "dog-park",
            "He saw the squirrel",
            "@biscuit_the_corgi",
            2_750_000,
            341_200,
            "Dual cam was made for this.",
            9.8,
        ),
        post(
            "desk-setup",
            "Desk setup tour",
            "@minimal.mo",
            8_940,
            612,
            "Cable management is a lifestyle.",
            13.4,
        ),
    ]
}
