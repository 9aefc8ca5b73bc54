use anyhow::Context;
use serde::{Deserialize, Serialize};
use tgrelay_derive::BotRequest;

use super::{PhotoSize, API};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for this user or bot
    pub id: i64,

    /// True, if this user is a bot
    #[serde(default)]
    pub is_bot: bool,

    /// User‘s or bot’s first name
    pub first_name: String,

    /// User‘s or bot’s last name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// User‘s or bot’s username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// IETF language tag of the user's language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// A user's profile pictures, each in up to 4 sizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfilePhotos {
    /// Total number of profile pictures the target user has
    pub total_count: i64,

    /// Requested profile pictures
    #[serde(default)]
    pub photos: Vec<Vec<PhotoSize>>,
}

/// `getMe` takes no parameters.
#[derive(Debug, Clone, Default, Serialize, BotRequest)]
pub struct GetMeRequest {}

#[derive(Debug, Clone, Serialize, BotRequest)]
pub struct GetUserProfilePhotosRequest {
    /// Unique identifier of the target user
    pub user_id: i64,

    /// Sequential number of the first photo to be returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    /// Limits the number of photos to be retrieved. Defaults to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl GetUserProfilePhotosRequest {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            offset: None,
            limit: None,
        }
    }
}

impl API {
    /// Returns basic information about the bot.
    pub async fn get_me(&self) -> anyhow::Result<User> {
        self.call("getMe", &GetMeRequest::default())
            .await
            .context("Failed to retrieve bot information")
    }

    pub async fn get_user_profile_photos(
        &self,
        req: &GetUserProfilePhotosRequest,
    ) -> anyhow::Result<UserProfilePhotos> {
        self.call("getUserProfilePhotos", req)
            .await
            .context("Failed to retrieve user information")
    }
}
