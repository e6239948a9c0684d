// Tabbycat REST API client: fetches round pairings and venues and builds
// private URLs.
//
// Pairings reference teams, venues and adjudicators by hyperlink; the id used
// throughout this crate is the final path segment of that link.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::draw::links::PrivateUrls;
use crate::draw::{Room, Venue};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TabbycatError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PairingJson {
    #[serde(default)]
    venue: Option<String>,
    #[serde(default)]
    teams: Vec<DebateTeamJson>,
    #[serde(default)]
    adjudicators: Option<PanelJson>,
}

#[derive(Debug, Deserialize)]
struct DebateTeamJson {
    team: String,
    #[serde(default)]
    side: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PanelJson {
    #[serde(default)]
    chair: Option<String>,
    #[serde(default)]
    panellists: Vec<String>,
    #[serde(default)]
    trainees: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VenueJson {
    id: u64,
    name: String,
}

// ---------------------------------------------------------------------------
// TabbycatClient
// ---------------------------------------------------------------------------

pub struct TabbycatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    slug: String,
}

impl TabbycatClient {
    pub fn new(api_key: String, base_url: &str, slug: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            slug,
        })
    }

    fn tournament_url(&self) -> String {
        format!("{}/api/v1/tournaments/{}", self.base_url, self.slug)
    }

    async fn get_text(&self, url: String) -> Result<(String, String), TabbycatError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .send()
            .await
            .map_err(|source| TabbycatError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TabbycatError::Status { url, status });
        }

        let text = response.text().await.map_err(|source| TabbycatError::Http {
            url: url.clone(),
            source,
        })?;
        Ok((url, text))
    }

    /// Fetch the pairings of one round.
    pub async fn get_draw(&self, round: &str) -> Result<Vec<Room>, TabbycatError> {
        let (url, text) = self
            .get_text(format!("{}/rounds/{round}/pairings", self.tournament_url()))
            .await?;
        parse_pairings(&text).map_err(|source| TabbycatError::Decode { url, source })
    }

    /// Fetch the pairings of every round in `rounds`, concatenated in order.
    pub async fn get_draws(&self, rounds: &[String]) -> Result<Vec<Room>, TabbycatError> {
        let mut rooms = Vec::new();
        for round in rounds {
            rooms.extend(self.get_draw(round).await?);
        }
        Ok(rooms)
    }

    pub async fn get_venues(&self) -> Result<Vec<Venue>, TabbycatError> {
        let (url, text) = self
            .get_text(format!("{}/venues", self.tournament_url()))
            .await?;
        parse_venues(&text).map_err(|source| TabbycatError::Decode { url, source })
    }
}

impl PrivateUrls for TabbycatClient {
    fn private_url_from_key(&self, key: &str) -> String {
        format!("{}/{}/privateurls/{key}/", self.base_url, self.slug)
    }
}

// ---------------------------------------------------------------------------
// JSON decoding helpers
// ---------------------------------------------------------------------------

/// Final non-empty path segment of a hyperlink, e.g.
/// `https://tab.example/api/v1/tournaments/t/teams/12` → `12`.
pub(crate) fn id_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Display name for a Tabbycat side code. Unknown codes are shown verbatim.
pub fn side_display_name(code: &str) -> String {
    match code {
        "aff" => "Proposition",
        "neg" => "Opposition",
        "og" => "Opening Government",
        "oo" => "Opening Opposition",
        "cg" => "Closing Government",
        "co" => "Closing Opposition",
        other => other,
    }
    .to_string()
}

pub(crate) fn parse_pairings(data: &str) -> Result<Vec<Room>, serde_json::Error> {
    let pairings: Vec<PairingJson> = serde_json::from_str(data)?;
    Ok(pairings.into_iter().map(room_from_pairing).collect())
}

fn room_from_pairing(pairing: PairingJson) -> Room {
    let panel = pairing.adjudicators.unwrap_or_default();
    let (team_ids, side_names): (Vec<String>, Vec<String>) = pairing
        .teams
        .iter()
        .map(|t| {
            (
                id_from_url(&t.team),
                side_display_name(t.side.as_deref().unwrap_or_default()),
            )
        })
        .unzip();

    Room {
        venue_id: pairing.venue.as_deref().map(id_from_url).unwrap_or_default(),
        team_ids,
        side_names,
        chair_id: panel.chair.as_deref().map(id_from_url).unwrap_or_default(),
        panellist_ids: panel.panellists.iter().map(|u| id_from_url(u)).collect(),
        trainee_ids: panel.trainees.iter().map(|u| id_from_url(u)).collect(),
    }
}

pub(crate) fn parse_venues(data: &str) -> Result<Vec<Venue>, serde_json::Error> {
    let venues: Vec<VenueJson> = serde_json::from_str(data)?;
    Ok(venues
        .into_iter()
        .map(|v| Venue {
            id: v.id.to_string(),
            name: v.name,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
