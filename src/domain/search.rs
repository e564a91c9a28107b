use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_MAX_RESULTS: usize = 20;

/// How an incoming batch combines with what is already stored for the same query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    #[default]
    #[serde(alias = "novo")]
    New,
    #[serde(alias = "sobrescrever")]
    Overwrite,
    #[serde(alias = "juntar")]
    Merge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    GoogleMaps,
}

impl Source {
    pub const ALL: [Source; 1] = [Source::GoogleMaps];

    pub fn id(&self) -> &'static str {
        match self {
            Source::GoogleMaps => "google_maps",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Source::GoogleMaps => "Google Maps",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Source::GoogleMaps => "Busca no Google Maps via navegador",
        }
    }

    pub fn parse(id: &str) -> Option<Source> {
        Source::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn search_url(&self, query: &str) -> Result<Url, url::ParseError> {
        match self {
            Source::GoogleMaps => {
                let mut url = Url::parse("https://www.google.com/maps/search/")?;
                url.path_segments_mut()
                    .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                    .pop_if_empty()
                    .push(query);
                Ok(url)
            }
        }
    }
}

/// Key under which batches are persisted and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub establishment_type: String,
    pub region: String,
    pub max_results: usize,
    pub source: Source,
    pub mode: MergeMode,
}

impl SearchRequest {
    pub fn query(&self) -> String {
        format!("{} em {}", self.establishment_type, self.region)
    }

    pub fn key(&self) -> QueryKey {
        QueryKey {
            kind: self.establishment_type.clone(),
            region: self.region.clone(),
        }
    }
}
