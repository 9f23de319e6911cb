use serde::{Deserialize, Serialize};
use std::path::Path;

/// Station id selected when the preference store has nothing saved yet.
pub const DEFAULT_STATION_ID: &str = "shonan";

/// A selectable radio station. Identity is the `id` — two values with the
/// same id are the same station regardless of the other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// Dial label, e.g. "78.9". Not guaranteed to be numeric.
    pub frequency: String,
    /// Opaque stream endpoint. The core never interprets it.
    pub url: String,
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Station {}

impl Station {
    /// Numeric frequency in MHz, when the dial label parses as one.
    /// Frontends use this to decide whether to show a "MHz" suffix.
    pub fn frequency_mhz(&self) -> Option<f64> {
        self.frequency.trim().parse().ok()
    }
}

/// Fixed, ordered list of selectable stations.
///
/// The order is ascending by numeric frequency where the dial label parses;
/// stations with non-numeric labels come after, keeping their relative order.
#[derive(Debug, Clone)]
pub struct Catalog {
    stations: Vec<Station>,
}

impl Catalog {
    pub fn new(mut stations: Vec<Station>) -> Self {
        stations.sort_by(|a, b| match (a.frequency_mhz(), b.frequency_mhz()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Self { stations }
    }

    /// The built-in Shonan-area station list, already in frequency order.
    pub fn builtin() -> Self {
        Self::new(vec![
            Station {
                id: "blue-shonan".into(),
                name: "FM Blue Shonan".into(),
                frequency: "78.5".into(),
                url: "https://mtist.as.smartstream.ne.jp/30019/livestream/playlist.m3u8".into(),
            },
            Station {
                id: "shonan".into(),
                name: "Shonan Beach FM".into(),
                frequency: "78.9".into(),
                url: "https://shonanbeachfm.out.airtime.pro/shonanbeachfm_c".into(),
            },
            Station {
                id: "kamakura".into(),
                name: "Kamakura FM".into(),
                frequency: "82.8".into(),
                url: "https://mtist.as.smartstream.ne.jp/30037/livestream/playlist.m3u8".into(),
            },
            Station {
                id: "chofu".into(),
                name: "Chofu FM".into(),
                frequency: "83.8".into(),
                url: "https://mtist.as.smartstream.ne.jp/30039/livestream/playlist.m3u8".into(),
            },
            Station {
                id: "salus".into(),
                name: "FM Salus".into(),
                frequency: "84.1".into(),
                url: "https://mtist.as.smartstream.ne.jp/30048/livestream/playlist.m3u8".into(),
            },
        ])
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.stations.iter().position(|s| s.id == id)
    }

    /// Station to select when nothing is persisted: the default id when the
    /// catalog carries it, otherwise the first entry.
    pub fn default_station(&self) -> Option<&Station> {
        self.by_id(DEFAULT_STATION_ID).or_else(|| self.stations.first())
    }

    /// Next station after `id`, wrapping from the last entry to the first.
    pub fn next_after(&self, id: &str) -> Option<&Station> {
        let idx = self.position(id)?;
        self.stations.get((idx + 1) % self.stations.len())
    }

    /// Previous station before `id`, wrapping from the first entry to the last.
    pub fn previous_before(&self, id: &str) -> Option<&Station> {
        let idx = self.position(id)?;
        let len = self.stations.len();
        self.stations.get((idx + len - 1) % len)
    }
}

// ── TOML catalog loader ───────────────────────────────────────────────────────

/// Intermediate struct matching the TOML `[[station]]` table, kept separate
/// from `Station` so the file schema can diverge without breaking callers.
#[derive(Debug, Deserialize)]
struct TomlStationFile {
    station: Vec<TomlStation>,
}

#[derive(Debug, Deserialize)]
struct TomlStation {
    id: String,
    name: String,
    #[serde(default)]
    frequency: String,
    url: String,
}

pub fn load_catalog_from_toml(path: &Path) -> anyhow::Result<Catalog> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog_from_toml_str(&content)
}

pub fn parse_catalog_from_toml_str(content: &str) -> anyhow::Result<Catalog> {
    let file: TomlStationFile = toml::from_str(content)?;
    if file.station.is_empty() {
        anyhow::bail!("station file contains no stations");
    }
    let mut seen = std::collections::HashSet::new();
    for s in &file.station {
        if !seen.insert(s.id.as_str()) {
            anyhow::bail!("duplicate station id '{}'", s.id);
        }
    }
    let stations = file
        .station
        .into_iter()
        .map(|s| Station {
            id: s.id,
            name: s.name,
            frequency: s.frequency,
            url: s.url,
        })
        .collect();
    Ok(Catalog::new(stations))
}
