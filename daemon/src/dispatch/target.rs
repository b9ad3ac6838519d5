//! Notification URL construction

use url::Url;

use super::DispatchError;
use crate::shortcut::Shortcut;

/// Where and for whom notifications are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    base: Url,
    user_uid: String,
}

impl NotificationTarget {
    pub fn new(base_url: &str, user_uid: &str) -> Result<Self, DispatchError> {
        let base = Url::parse(base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(DispatchError::UnsupportedScheme(base.scheme().to_string()));
        }
        if user_uid.is_empty() {
            return Err(DispatchError::EmptyUserId);
        }
        Ok(Self {
            base,
            user_uid: user_uid.to_string(),
        })
    }

    /// `{base}?uid={user}&keys={k1-k2-..}`, keeping any query already on the base
    ///
    /// The base is in normalized form, so a bare `http://host` gains a `/` path.
    pub fn url_for(&self, shortcut: &Shortcut) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("uid", &self.user_uid)
            .append_pair("keys", &shortcut.joined("-"));
        url
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}
