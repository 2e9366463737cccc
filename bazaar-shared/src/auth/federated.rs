//! Federated login payloads
//!
//! Users never sign in with a local password. An identity provider
//! (Facebook, Google) authenticates them and the callback hands over an
//! auth hash of this shape:
//!
//! ```json
//! {
//!   "provider": "facebook",
//!   "uid": "10203040",
//!   "info": { "email": "an@example.com", "name": "Nguyễn An", "image": "http://graph.facebook.com/10203040/picture" },
//!   "extra": { "raw_info": { "link": "https://www.facebook.com/an" } }
//! }
//! ```
//!
//! The user model turns it into a user with
//! [`crate::models::user::User::from_federated`].

use serde::{Deserialize, Serialize};

/// Provider name Facebook sends
pub const FACEBOOK: &str = "facebook";

/// Provider name Google sends
pub const GOOGLE: &str = "google_oauth2";

/// Credentials handed over by an identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederatedAuth {
    /// Provider name, e.g. `facebook` or `google_oauth2`
    pub provider: String,

    /// User id at the provider
    pub uid: String,

    #[serde(default)]
    pub info: FederatedInfo,

    #[serde(default)]
    pub extra: FederatedExtra,
}

/// Normalized identity fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FederatedInfo {
    pub email: Option<String>,
    pub name: Option<String>,

    /// Avatar URL
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FederatedExtra {
    #[serde(default)]
    pub raw_info: RawInfo,
}

/// Provider-specific fields used for profile links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInfo {
    /// Facebook profile URL
    pub link: Option<String>,

    /// Google profile URL
    pub profile: Option<String>,
}

/// Which profile column a provider's link is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLink {
    Facebook,
    Google,
}

impl ProfileLink {
    /// Classifies a provider; anything but Facebook counts as Google
    pub fn for_provider(provider: &str) -> Self {
        if provider == FACEBOOK {
            ProfileLink::Facebook
        } else {
            ProfileLink::Google
        }
    }

    /// Profile column written for this provider
    pub fn column(&self) -> &'static str {
        match self {
            ProfileLink::Facebook => "fb_link",
            ProfileLink::Google => "gg_link",
        }
    }
}

impl FederatedAuth {
    /// Profile column and the link to store in it
    ///
    /// The link is `None` when the provider did not send one; the column
    /// is still cleared in that case.
    pub fn profile_link(&self) -> (ProfileLink, Option<&str>) {
        let kind = ProfileLink::for_provider(&self.provider);
        let raw = &self.extra.raw_info;
        let link = match kind {
            ProfileLink::Facebook => raw.link.as_deref(),
            ProfileLink::Google => raw.profile.as_deref(),
        };
        (kind, link)
    }

    /// Avatar URL upgraded to HTTPS, if one was sent
    pub fn secure_image(&self) -> Option<String> {
        self.info
            .image
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(secure_avatar_url)
    }
}

/// Replaces the first `http://` in an avatar URL with `https://`
pub fn secure_avatar_url(url: &str) -> String {
    url.replacen("http://", "https://", 1)
}

/// Compares the callback secret sent by the login gateway with the
/// configured one
///
/// Every byte is compared, whatever the first mismatch.
pub fn verify_callback_secret(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        return false;
    }

    provided
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> FederatedAuth {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_secure_avatar_url() {
        assert_eq!(
            secure_avatar_url("http://graph.facebook.com/1/picture"),
            "https://graph.facebook.com/1/picture"
        );
        assert_eq!(
            secure_avatar_url("https://lh3.googleusercontent.com/a.jpg"),
            "https://lh3.googleusercontent.com/a.jpg"
        );
        // Only the first occurrence is replaced
        assert_eq!(
            secure_avatar_url("http://a.example.com/?next=http://b"),
            "https://a.example.com/?next=http://b"
        );
    }

    #[test]
    fn test_facebook_payload() {
        let auth = payload(
            r#"{
                "provider": "facebook",
                "uid": "10203040",
                "info": {"email": "an@example.com", "name": "Nguyễn An", "image": "http://graph.facebook.com/10203040/picture"},
                "extra": {"raw_info": {"link": "https://www.facebook.com/an", "id": "10203040"}}
            }"#,
        );

        assert_eq!(
            auth.profile_link(),
            (ProfileLink::Facebook, Some("https://www.facebook.com/an"))
        );
        assert_eq!(
            auth.secure_image().as_deref(),
            Some("https://graph.facebook.com/10203040/picture")
        );
    }

    #[test]
    fn test_other_providers_use_google_column() {
        let auth = payload(
            r#"{
                "provider": "google_oauth2",
                "uid": "1188",
                "info": {"email": "binh@example.com", "name": "Lê Bình"},
                "extra": {"raw_info": {"profile": "https://plus.google.com/1188", "link": "ignored"}}
            }"#,
        );

        let (kind, link) = auth.profile_link();
        assert_eq!(kind, ProfileLink::Google);
        assert_eq!(kind.column(), "gg_link");
        assert_eq!(link, Some("https://plus.google.com/1188"));
        assert_eq!(auth.secure_image(), None);

        assert_eq!(ProfileLink::for_provider("github"), ProfileLink::Google);
    }

    #[test]
    fn test_minimal_payload() {
        let auth = payload(r#"{"provider": "facebook", "uid": "1"}"#);
        assert_eq!(auth.info, FederatedInfo::default());
        assert_eq!(auth.profile_link(), (ProfileLink::Facebook, None));
    }

    #[test]
    fn test_verify_callback_secret() {
        assert!(verify_callback_secret("s3cret", "s3cret"));
        assert!(!verify_callback_secret("s3cret", "s3creT"));
        assert!(!verify_callback_secret("s3cret", "s3cret-longer"));
        assert!(!verify_callback_secret("", "s3cret"));
    }
}
