//! Player roster, read from a YAML file maintained by hand. Only whitelisted
//! Vietnamese players with at least one usable stream channel are exposed.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Names allowed on the dashboard (matched as lowercase substrings).
const ALLOWED_NAMES: &[&str] = &[
    "saymyname",
    "hoang",
    "fcmnlop",
    "accm",
    "quảng trị",
    "py_blue_sky",
];

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub twitch: Vec<String>,
    #[serde(default)]
    pub youtube: Vec<String>,
    #[serde(default)]
    pub id: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: Option<u32>,
    pub name: String,
    pub twitch_channels: Vec<String>,
    pub youtube_channels: Vec<YoutubeChannel>,
    pub twitch_urls: Vec<String>,
    pub youtube_urls: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct YoutubeChannel {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

pub fn load_players(path: &str) -> anyhow::Result<Vec<PlayerEntry>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Filter the roster down to whitelisted Vietnamese players and extract their
/// channel identifiers; players without a single usable channel are dropped.
pub fn vietnam_players(entries: &[PlayerEntry]) -> Vec<PlayerView> {
    entries
        .iter()
        .filter(|player| {
            if player.country.to_lowercase() != "vn" {
                return false;
            }
            let name = player.name.to_lowercase();
            ALLOWED_NAMES.iter().any(|allowed| name.contains(allowed))
        })
        .map(|player| PlayerView {
            id: player.id,
            name: player.name.clone(),
            twitch_channels: player
                .twitch
                .iter()
                .filter_map(|url| twitch_channel(url))
                .collect(),
            youtube_channels: player
                .youtube
                .iter()
                .map(|url| youtube_channel(url))
                .collect(),
            twitch_urls: player.twitch.clone(),
            youtube_urls: player.youtube.clone(),
        })
        .filter(|player| !player.twitch_channels.is_empty() || !player.youtube_channels.is_empty())
        .collect()
}

fn twitch_channel(url: &str) -> Option<String> {
    let pattern = Regex::new(r"twitch\.tv/([^/?]+)").unwrap();
    pattern
        .captures(url)
        .map(|captures| captures[1].to_string())
}

fn youtube_channel(url: &str) -> YoutubeChannel {
    let forms = [
        ("channel", r"/channel/([^/?]+)"),
        ("user", r"/user/([^/?]+)"),
        ("custom", r"/c/([^/?]+)"),
        ("handle", r"@([^/?]+)"),
    ];

    for (kind, pattern) in forms {
        let matcher = Regex::new(pattern).unwrap();
        if let Some(captures) = matcher.captures(url) {
            return YoutubeChannel {
                kind: kind.to_string(),
                id: captures[1].to_string(),
            };
        }
    }

    YoutubeChannel {
        kind: "unknown".to_string(),
        id: url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<PlayerEntry> {
        serde_yaml::from_str(
            r#"
- name: ACCM
  country: vn
  id: 7
  twitch:
    - https://twitch.tv/theaccm
  youtube:
    - https://youtube.com/@theaccm
- name: SayMyName
  country: vn
  twitch:
    - https://www.twitch.tv/saymyname_aoe?lang=en
- name: TheViper
  country: "no"
  twitch:
    - https://twitch.tv/theviper
- name: Hoang
  country: vn
- name: RandomVN
  country: vn
  twitch:
    - https://twitch.tv/randomvn
"#,
        )
        .unwrap()
    }

    #[test]
    fn keeps_only_whitelisted_vietnamese_players_with_channels() {
        let players = vietnam_players(&roster());
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();

        // TheViper is not Vietnamese, RandomVN is not whitelisted, and Hoang
        // has no channels at all.
        assert_eq!(names, vec!["ACCM", "SayMyName"]);
    }

    #[test]
    fn extracts_twitch_channel_names() {
        let players = vietnam_players(&roster());
        assert_eq!(players[0].twitch_channels, vec!["theaccm"]);
        assert_eq!(players[1].twitch_channels, vec!["saymyname_aoe"]);
    }

    #[test]
    fn classifies_youtube_urls() {
        assert_eq!(
            youtube_channel("https://www.youtube.com/channel/UCabc123"),
            YoutubeChannel {
                kind: "channel".into(),
                id: "UCabc123".into()
            }
        );
        assert_eq!(
            youtube_channel("https://youtube.com/user/theaccm"),
            YoutubeChannel {
                kind: "user".into(),
                id: "theaccm".into()
            }
        );
        assert_eq!(
            youtube_channel("https://youtube.com/c/AccmAoe"),
            YoutubeChannel {
                kind: "custom".into(),
                id: "AccmAoe".into()
            }
        );
        assert_eq!(
            youtube_channel("https://youtube.com/@theaccm"),
            YoutubeChannel {
                kind: "handle".into(),
                id: "theaccm".into()
            }
        );
        assert_eq!(
            youtube_channel("https://youtu.be/xyz").kind,
            "unknown".to_string()
        );
    }
}
