/*
    pixel-jumble | Guess the album from your own Spotify listening history.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub const MUSICBRAINZ_URL: &str = "https://musicbrainz.org/ws/2";
pub const WIKIDATA_URL: &str = "https://www.wikidata.org/wiki/Special:EntityData";

/// MusicBrainz asks anonymous clients for at most one request per second.
pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_millis(1000);

/// Search candidates inspected for a link back to the Spotify profile.
const MAX_CANDIDATES: usize = 3;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected {service} status: {status}")]
    Status { service: &'static str, status: u16 },
    #[error("no MusicBrainz artist found for '{0}'")]
    NoArtist(String),
}

/// Best-effort birth date lookup. `None` means unknown, never an error.
#[async_trait]
pub trait BirthDateSource: Send + Sync {
    async fn birth_date(&self, artist_name: &str, profile_url: Option<&str>) -> Option<String>;
}

/// A date known to year, month or day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    /// Parses MusicBrainz dates (`1942`, `1942-06`, `1942-06-18`) and Wikidata
    /// timestamps (`+1942-06-18T00:00:00Z`, where unknown parts are `00`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().trim_start_matches('+');
        let date = raw.split('T').next()?;
        let mut parts = date.split('-');

        let year = parts.next()?.parse::<i32>().ok()?;
        let month = parts
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .filter(|m| (1..=12).contains(m));
        let day = month.and_then(|_| {
            parts
                .next()
                .and_then(|d| d.parse::<u32>().ok())
                .filter(|d| (1..=31).contains(d))
        });

        Some(Self { year, month, day })
    }

    /// Drops components finer than the given Wikidata precision (9 = year, 10 = month).
    fn truncate_to_precision(self, precision: u64) -> Self {
        match precision {
            0..=9 => Self {
                month: None,
                day: None,
                ..self
            },
            10 => Self { day: None, ..self },
            _ => self,
        }
    }

    /// `June 18, 1942`, `June 1942` or `1942`.
    pub fn display(&self) -> String {
        match (self.month, self.day) {
            (Some(month), Some(day)) => NaiveDate::from_ymd_opt(self.year, month, day)
                .map(|date| date.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|| self.year.to_string()),
            (Some(month), None) => NaiveDate::from_ymd_opt(self.year, month, 1)
                .map(|date| date.format("%B %Y").to_string())
                .unwrap_or_else(|| self.year.to_string()),
            _ => self.year.to_string(),
        }
    }
}

/// Looks up an artist on MusicBrainz and, when linked, their Wikidata entity.
pub struct MusicBrainzLookup {
    client: Client,
    musicbrainz_url: String,
    wikidata_url: String,
    courtesy_delay: Duration,
}

impl MusicBrainzLookup {
    pub fn new(user_agent: &str, courtesy_delay: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            musicbrainz_url: MUSICBRAINZ_URL.to_string(),
            wikidata_url: WIKIDATA_URL.to_string(),
            courtesy_delay,
        })
    }

    /// Points the lookup at other hosts, e.g. a mirror.
    pub fn with_base_urls(mut self, musicbrainz_url: &str, wikidata_url: &str) -> Self {
        self.musicbrainz_url = musicbrainz_url.trim_end_matches('/').to_string();
        self.wikidata_url = wikidata_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn lookup(
        &self,
        artist_name: &str,
        profile_url: Option<&str>,
    ) -> Result<Option<PartialDate>, LookupError> {
        sleep(self.courtesy_delay).await;
        let query = format!("artist:\"{}\"", artist_name.replace('"', "\\\""));
        let search = self
            .get_json(
                "MusicBrainz",
                &format!("{}/artist/", self.musicbrainz_url),
                &[("query", query.as_str()), ("fmt", "json"), ("limit", "5")],
            )
            .await?;

        let candidates = search_candidates(&search);
        if candidates.is_empty() {
            return Err(LookupError::NoArtist(artist_name.to_string()));
        }

        // One pause covers the whole follow-up phase: candidate details and Wikidata.
        sleep(self.courtesy_delay).await;

        let mut chosen: Option<Value> = None;
        for (index, id) in candidates.iter().take(MAX_CANDIDATES).enumerate() {
            let detail = match self
                .get_json(
                    "MusicBrainz",
                    &format!("{}/artist/{}", self.musicbrainz_url, id),
                    &[("inc", "url-rels"), ("fmt", "json")],
                )
                .await
            {
                Ok(detail) => detail,
                Err(e) if index == 0 => return Err(e),
                Err(e) => {
                    warn!("Skipping MusicBrainz candidate {}: {}", id, e);
                    break;
                }
            };

            let matches = profile_url.is_some_and(|url| links_to_profile(&detail, url));
            if matches {
                debug!("MusicBrainz artist {} links to {:?}", id, profile_url);
                chosen = Some(detail);
                break;
            }
            if chosen.is_none() {
                chosen = Some(detail);
            }
            if profile_url.is_none() {
                break;
            }
        }

        let Some(artist) = chosen else {
            return Err(LookupError::NoArtist(artist_name.to_string()));
        };

        if let Some(entity) = wikidata_entity(&artist) {
            match self.wikidata_birth_date(&entity).await {
                Ok(Some(date)) => return Ok(Some(date)),
                Ok(None) => {}
                Err(e) => warn!("Wikidata lookup for {} failed: {}", entity, e),
            }
        }

        Ok(life_span_begin(&artist))
    }

    async fn wikidata_birth_date(&self, entity: &str) -> Result<Option<PartialDate>, LookupError> {
        let body = self
            .get_json(
                "Wikidata",
                &format!("{}/{}.json", self.wikidata_url, entity),
                &[],
            )
            .await?;
        Ok(wikidata_date_of_birth(&body, entity))
    }

    async fn get_json(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, LookupError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                service,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BirthDateSource for MusicBrainzLookup {
    async fn birth_date(&self, artist_name: &str, profile_url: Option<&str>) -> Option<String> {
        match self.lookup(artist_name, profile_url).await {
            Ok(date) => date.map(|d| d.display()),
            Err(e) => {
                warn!("Could not fetch birth date for {}: {}", artist_name, e);
                None
            }
        }
    }
}

/// Artist MBIDs in search-result order.
fn search_candidates(body: &Value) -> Vec<String> {
    body.get("artists")
        .and_then(|value| value.as_array())
        .map(|artists| {
            artists
                .iter()
                .filter_map(|artist| artist.get("id").and_then(|id| id.as_str()))
                .map(|id| id.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn relation_urls(artist: &Value) -> impl Iterator<Item = (&str, &str)> {
    artist
        .get("relations")
        .and_then(|value| value.as_array())
        .into_iter()
        .flatten()
        .filter_map(|relation| {
            let kind = relation.get("type")?.as_str()?;
            let resource = relation.get("url")?.get("resource")?.as_str()?;
            Some((kind, resource))
        })
}

fn links_to_profile(artist: &Value, profile_url: &str) -> bool {
    let wanted = normalize_url(profile_url);
    relation_urls(artist).any(|(_, resource)| normalize_url(resource) == wanted)
}

fn normalize_url(url: &str) -> String {
    url.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_lowercase()
}

/// `Q1299` from a `https://www.wikidata.org/wiki/Q1299` relation.
fn wikidata_entity(artist: &Value) -> Option<String> {
    relation_urls(artist)
        .find(|(kind, _)| *kind == "wikidata")
        .and_then(|(_, resource)| resource.trim_end_matches('/').rsplit('/').next())
        .filter(|entity| entity.starts_with('Q'))
        .map(|entity| entity.to_string())
}

fn life_span_begin(artist: &Value) -> Option<PartialDate> {
    artist
        .get("life-span")
        .and_then(|span| span.get("begin"))
        .and_then(|begin| begin.as_str())
        .and_then(PartialDate::parse)
}

/// Reads property P569 (date of birth) from an entity document.
fn wikidata_date_of_birth(body: &Value, entity: &str) -> Option<PartialDate> {
    let value = body
        .get("entities")?
        .get(entity)?
        .get("claims")?
        .get("P569")?
        .as_array()?
        .first()?
        .get("mainsnak")?
        .get("datavalue")?
        .get("value")?;

    let time = value.get("time")?.as_str()?;
    let precision = value.get("precision").and_then(|p| p.as_u64()).unwrap_or(11);
    PartialDate::parse(time).map(|date| date.truncate_to_precision(precision))
}
