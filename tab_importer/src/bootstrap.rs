use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::client::{extract_identifier, SubmissionRequest, SubmitMethod, TournamentApi};
use crate::entity_type::{CollectionScope, EntityType};
use crate::error::{ApiError, ImportError};
use crate::transform::{Payload, Target};

const SHORT_NAME_LENGTH: usize = 24;

/// What identifies the tournament being imported into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSettings {
    pub site_url: String,
    pub slug: String,
    pub name: String,
    pub short_name: Option<String>,
}

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9_]+").unwrap();
}

pub fn slugify(name: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

impl TournamentSettings {
    /// Settings named after the directory the data is imported from.
    pub fn for_directory(site_url: impl Into<String>, directory_name: &str) -> Self {
        let short_name = if directory_name.chars().count() > SHORT_NAME_LENGTH {
            format!("{}..", directory_name.chars().take(SHORT_NAME_LENGTH).collect::<String>())
        } else {
            directory_name.to_string()
        };

        TournamentSettings {
            site_url: site_url.into(),
            slug: slugify(directory_name),
            name: directory_name.to_string(),
            short_name: Some(short_name),
        }
    }
}

/// The resolved tournament every entity URL is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentBase {
    api_root: String,
    tournament_url: String,
}

impl TournamentBase {
    pub fn new(api_root: impl Into<String>, tournament_url: impl Into<String>) -> Self {
        TournamentBase {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            tournament_url: tournament_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn tournament_url(&self) -> &str {
        &self.tournament_url
    }

    pub fn collection_url(&self, entity_type: EntityType) -> Option<String> {
        let collection = entity_type.collection()?;
        let base = match entity_type.collection_scope() {
            CollectionScope::Tournament => &self.tournament_url,
            CollectionScope::Api => &self.api_root,
        };
        Some(format!("{}/{}", base, collection))
    }

    /// Turns a payload into a request, or `None` if its target did not resolve.
    pub fn request_for(&self, payload: Payload) -> Option<SubmissionRequest> {
        let (method, url) = match payload.target {
            Target::Collection(entity_type) => {
                (SubmitMethod::Post, self.collection_url(entity_type)?)
            }
            Target::Resource(url) => (SubmitMethod::Patch, url?),
        };
        Some(SubmissionRequest { method, url, body: payload.body })
    }
}

/// `{scheme}://{host[:port]}/api/v1` for any page URL of the site.
pub fn api_root_for(site_url: &str) -> Result<String, ImportError> {
    let url = Url::parse(site_url)?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ImportError::UnsupportedUrl(site_url.to_string()));
    }
    Ok(format!("{}/api/v1", url.origin().ascii_serialization()))
}

/// Finds the tournament with the configured slug, creating it if the remote
/// service does not know it yet.
pub async fn bootstrap_tournament(
    api: &dyn TournamentApi,
    settings: &TournamentSettings,
) -> Result<TournamentBase, ImportError> {
    let api_root = api_root_for(&settings.site_url)?;
    let lookup_url = format!("{}/tournaments/{}", api_root, settings.slug);

    match api.fetch(&lookup_url).await {
        Ok(body) => {
            let url = extract_identifier(&body)
                .ok_or(ImportError::MissingIdentifier { url: lookup_url })?;
            info!("Using existing tournament {} at {}", settings.slug, url);
            return Ok(TournamentBase::new(api_root, url));
        }
        Err(ApiError::Rejected { status, .. }) => {
            debug!("Lookup of tournament {} returned {}", settings.slug, status);
        }
        Err(source) => {
            return Err(ImportError::Bootstrap { slug: settings.slug.clone(), source });
        }
    }

    let mut body = json!({
        "name": settings.name,
        "slug": settings.slug,
        "active": true,
    });
    if let Some(short_name) = &settings.short_name {
        body["short_name"] = json!(short_name);
    }

    let request = SubmissionRequest {
        method: SubmitMethod::Post,
        url: format!("{}/tournaments", api_root),
        body,
    };
    let response = api
        .submit(&request)
        .await
        .map_err(|source| ImportError::Bootstrap { slug: settings.slug.clone(), source })?;
    let url = extract_identifier(&response)
        .ok_or(ImportError::MissingIdentifier { url: request.url })?;

    info!("Created tournament {} at {}", settings.slug, url);
    Ok(TournamentBase::new(api_root, url))
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    fn base() -> TournamentBase {
        TournamentBase::new(
            "https://tab.example/api/v1",
            "https://tab.example/api/v1/tournaments/wudc/",
        )
    }

    #[test]
    fn test_collection_urls() {
        let base = base();
        assert_eq!(
            base.collection_url(EntityType::Teams),
            Some("https://tab.example/api/v1/tournaments/wudc/teams".into())
        );
        assert_eq!(
            base.collection_url(EntityType::FeedbackQuestions),
            Some("https://tab.example/api/v1/tournaments/wudc/feedback-questions".into())
        );
        assert_eq!(
            base.collection_url(EntityType::Institutions),
            Some("https://tab.example/api/v1/institutions".into())
        );
        assert_eq!(base.collection_url(EntityType::Scores), None);
    }

    #[test]
    fn test_request_methods() {
        let base = base();
        let target = Target::Collection(EntityType::Venues);
        let create = base.request_for(Payload { target, body: json!({}) }).unwrap();
        assert_eq!(create.method, SubmitMethod::Post);
        assert_eq!(create.url, "https://tab.example/api/v1/tournaments/wudc/venues");

        let target = Target::Resource(Some("https://tab.example/a/1".into()));
        let patch = base.request_for(Payload { target, body: json!({}) }).unwrap();
        assert_eq!(patch.method, SubmitMethod::Patch);
        assert_eq!(patch.url, "https://tab.example/a/1");

        let unresolved = Payload { target: Target::Resource(None), body: json!({}) };
        assert_eq!(base.request_for(unresolved), None);
    }

    #[test]
    fn test_api_root() {
        assert_eq!(
            api_root_for("https://tab.example/wudc/admin/").unwrap(),
            "https://tab.example/api/v1"
        );
        assert_eq!(api_root_for("http://localhost:8000").unwrap(), "http://localhost:8000/api/v1");
        assert_matches!(api_root_for("not a url"), Err(ImportError::InvalidUrl(_)));
        assert_matches!(
            api_root_for("mailto:tab@example.com"),
            Err(ImportError::UnsupportedUrl(_))
        );
    }

    #[test]
    fn test_settings_from_directory() {
        let settings = TournamentSettings::for_directory("https://tab.example", "Australs 2024");
        assert_eq!(settings.slug, "australs-2024");
        assert_eq!(settings.name, "Australs 2024");
        assert_eq!(settings.short_name, Some("Australs 2024".into()));

        let settings = TournamentSettings::for_directory(
            "https://tab.example",
            "World Universities Debating Championship",
        );
        assert_eq!(settings.short_name, Some("World Universities Debat..".into()));
        assert_eq!(settings.slug, "world-universities-debating-championship");
    }
}
