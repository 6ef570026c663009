//! REST API source.

use super::{ContentSource, MemberSource};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use policy::Rank;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use storage::{Material, MaterialId, MaterialKind, MaterialSummary, Member};
use tracing::debug;

const MATERIALS_PATH: &str = "materials";
const CURRENT_MEMBER_PATH: [&str; 2] = ["auth", "me"];

/// Builder for creating a REST source.
#[derive(Debug, Clone)]
pub struct RestSourceBuilder {
    base_url: String,
    token: Option<String>,
}

impl RestSourceBuilder {
    /// Create a new builder for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the source, validating the base URL.
    pub fn build(self) -> Result<RestSource> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base_url {:?} cannot carry a path",
                self.base_url
            )));
        }

        Ok(RestSource {
            client: reqwest::Client::new(),
            base_url,
            token: self.token,
        })
    }
}

/// Content and member source backed by the site's REST API.
pub struct RestSource {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl RestSource {
    /// Create a builder for the REST source.
    pub fn builder(base_url: impl Into<String>) -> RestSourceBuilder {
        RestSourceBuilder::new(base_url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base_url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let mut req = self.client.get(url).header("accept", "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized(status.to_string()));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(response.url().path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        response.json().await.map_err(|e| Error::Api(e.to_string()))
    }
}

impl std::fmt::Display for RestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rest({})", self.base_url)
    }
}

impl ContentSource for RestSource {
    async fn list(&self, search: Option<&str>) -> Result<Vec<MaterialSummary>> {
        let mut url = self.endpoint(&[MATERIALS_PATH])?;
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            url.query_pairs_mut().append_pair("search", search);
        }

        let body: ListBody = self.get_json(url).await?;
        Ok(body
            .into_items()
            .into_iter()
            .map(ApiMaterial::into_summary)
            .collect())
    }

    async fn fetch(&self, id: &MaterialId) -> Result<Material> {
        let url = self.endpoint(&[MATERIALS_PATH, id.as_str()])?;
        let body: ItemBody<ApiMaterial> = self.get_json(url).await?;
        body.into_inner().into_material()
    }
}

impl MemberSource for RestSource {
    async fn current_member(&self) -> Result<Member> {
        let url = self.endpoint(&CURRENT_MEMBER_PATH)?;
        let body: ItemBody<ApiMember> = self.get_json(url).await?;
        Ok(body.into_inner().into_member())
    }
}

/// List responses arrive either bare or wrapped in `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<ApiMaterial>),
    Wrapped { data: Vec<ApiMaterial> },
}

impl ListBody {
    fn into_items(self) -> Vec<ApiMaterial> {
        match self {
            ListBody::Bare(items) | ListBody::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemBody<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemBody<T> {
    fn into_inner(self) -> T {
        match self {
            ItemBody::Wrapped { data } | ItemBody::Bare(data) => data,
        }
    }
}

/// Identifiers are strings or integers depending on the backend.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Text(String),
    Number(i64),
}

impl From<ApiId> for MaterialId {
    fn from(id: ApiId) -> Self {
        match id {
            ApiId::Text(s) => MaterialId(s),
            ApiId::Number(n) => MaterialId(n.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMaterial {
    id: ApiId,
    title: String,
    #[serde(rename = "type")]
    kind: MaterialKind,
    #[serde(default)]
    required_rank: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl ApiMaterial {
    fn into_summary(self) -> MaterialSummary {
        MaterialSummary {
            required_rank: api_rank(self.required_rank.as_deref()),
            id: self.id.into(),
            title: self.title,
            kind: self.kind,
        }
    }

    fn into_material(self) -> Result<Material> {
        let id: MaterialId = self.id.into();
        let Some(url) = self.url else {
            return Err(Error::Api(format!("material {id} has no url")));
        };
        let created_at = self.created_at.unwrap_or_else(Utc::now);

        Ok(Material {
            required_rank: api_rank(self.required_rank.as_deref()),
            id,
            title: self.title,
            kind: self.kind,
            url,
            description: self.description,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMember {
    username: String,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
    #[serde(default)]
    rank: Option<String>,
}

impl ApiMember {
    fn into_member(self) -> Member {
        Member {
            display_name: self.display_name.unwrap_or_else(|| self.username.clone()),
            rank: self
                .rank
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .map(|r| api_rank(Some(r))),
            username: self.username,
        }
    }
}

fn api_rank(name: Option<&str>) -> Rank {
    let rank = Rank::resolve(name);
    if let Some(name) = name {
        if rank == Rank::LOWEST && name != Rank::LOWEST.name() {
            debug!(name, "unrecognized rank from API, treating as lowest");
        }
    }
    rank
}
