//! I/O 支持：网描述的 JSON 与 RON 序列化接口.
use std::fs;
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::builder::{ModelError, NetBuilder};
use crate::net::core::Net;
use crate::net::ids::NodeId;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("inconsistent net: {0}")]
    Model(#[from] ModelError),
    #[error("unsupported net file extension: {0:?}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDescription {
    pub id: String,
    #[serde(default)]
    pub marked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDescription {
    pub source: String,
    pub target: String,
}

/// Flat, identifier-based description of a net as it is stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDescription {
    pub places: Vec<PlaceDescription>,
    pub transitions: Vec<TransitionDescription>,
    #[serde(default)]
    pub arcs: Vec<ArcDescription>,
}

impl NetDescription {
    pub fn into_net(self) -> Result<Net, ModelError> {
        let mut builder = NetBuilder::new();
        for place in &self.places {
            builder.add_place(&place.id, place.marked)?;
        }
        for transition in &self.transitions {
            builder.add_transition(&transition.id)?;
        }
        for arc in &self.arcs {
            builder.add_arc(&arc.source, &arc.target);
        }
        builder.build()
    }

    pub fn from_net(net: &Net) -> Self {
        let node_name = |node: NodeId| match node {
            NodeId::Place(p) => net.place_name(p).to_string(),
            NodeId::Transition(t) => net.transition_name(t).to_string(),
        };
        Self {
            places: net
                .places
                .iter()
                .map(|p| PlaceDescription {
                    id: p.name.clone(),
                    marked: p.marked,
                })
                .collect(),
            transitions: net
                .transitions
                .iter()
                .map(|t| TransitionDescription { id: t.name.clone() })
                .collect(),
            arcs: net
                .arcs
                .iter()
                .map(|arc| ArcDescription {
                    source: node_name(arc.source),
                    target: node_name(arc.target),
                })
                .collect(),
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    fs::write(path, to_json_string(value)?)?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    from_json_str(&fs::read_to_string(path)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let pretty = PrettyConfig::default().new_line("\n".to_string());
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn write_ron<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    fs::write(path, to_ron_string(value)?)?;
    Ok(())
}

pub fn read_ron<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    from_ron_str(&fs::read_to_string(path)?)
}

/// Loads and validates a net description, picking the format by extension.
pub fn load_net<P: AsRef<Path>>(path: P) -> Result<Net, IoError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let description: NetDescription = match extension.as_str() {
        "json" => read_json(path)?,
        "ron" => read_ron(path)?,
        other => return Err(IoError::UnsupportedFormat(other.to_string())),
    };
    let net = description.into_net()?;
    log::info!(
        "loaded {}: {} places, {} transitions, {} arcs",
        path.display(),
        net.places_len(),
        net.transitions_len(),
        net.arcs.len()
    );
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN_JSON: &str = r#"{
        "places": [{ "id": "p1", "marked": true }, { "id": "p2" }],
        "transitions": [{ "id": "t1" }],
        "arcs": [{ "source": "p1", "target": "t1" }, { "source": "t1", "target": "p2" }]
    }"#;

    #[test]
    fn json_description_builds_net() {
        let description: NetDescription = from_json_str(CHAIN_JSON).unwrap();
        let net = description.into_net().unwrap();
        assert_eq!(net.places_len(), 2);
        assert_eq!(net.transitions_len(), 1);
        assert_eq!(net.marking_names(&net.initial_marking()), vec!["p1"]);
    }

    #[test]
    fn ron_output_reads_back_to_same_description() {
        let description: NetDescription = from_json_str(CHAIN_JSON).unwrap();
        let net = description.clone().into_net().unwrap();
        let text = to_ron_string(&NetDescription::from_net(&net)).unwrap();
        let back: NetDescription = from_ron_str(&text).unwrap();
        assert_eq!(back, description);
    }

    #[test]
    fn inconsistent_description_is_reported() {
        let description = NetDescription {
            places: vec![PlaceDescription {
                id: "p".into(),
                marked: true,
            }],
            transitions: vec![],
            arcs: vec![ArcDescription {
                source: "p".into(),
                target: "t".into(),
            }],
        };
        assert!(matches!(
            description.into_net(),
            Err(ModelError::UnknownTarget { .. })
        ));
    }
}
