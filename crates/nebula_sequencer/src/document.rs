// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON keyframe documents.
//!
//! A document holds one or more sheets. Each sheet has static overrides
//! (constant values per object) and a sequence whose tracks are grouped by
//! object:
//!
//! ```json
//! { "sheetsById": { "Scene": {
//!     "staticOverrides": { "byObject": { "Camera": { "position": { "y": 4 } } } },
//!     "sequence": {
//!       "length": 6, "subUnitsPerUnit": 30,
//!       "tracksByObject": { "Camera": {
//!         "trackData": { "aX": { "type": "BasicKeyframedTrack", "keyframes": [
//!           { "id": "k0", "position": 0, "value": 6, "connectedRight": true,
//!             "handles": [0.5, 1, 0.5, 0], "type": "bezier" } ] } },
//!         "trackIdByPropPath": { "[\"position\",\"x\"]": "aX" } } } } } } }
//! ```
//!
//! Parsing is all-or-nothing: any inconsistency fails the whole document.

use crate::binding::{AnimatedProperty, PropertyKey};
use crate::error::{Result, SequenceError};
use crate::keyframe::{InterpolationMode, Keyframe, KeyframeId};
use crate::sequence::{Sequence, DEFAULT_LENGTH, DEFAULT_SUBUNITS_PER_UNIT};
use crate::track::KeyframeTrack;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

const BASIC_TRACK_TYPE: &str = "BasicKeyframedTrack";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDocument {
    #[serde(default)]
    sheets_by_id: IndexMap<String, SheetDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetDocument {
    #[serde(default)]
    static_overrides: StaticOverrides,
    #[serde(default)]
    sequence: Option<SequenceDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaticOverrides {
    #[serde(default)]
    by_object: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SequenceDocument {
    #[serde(default = "default_length")]
    length: f32,
    #[serde(default = "default_subunits")]
    sub_units_per_unit: u32,
    #[serde(default)]
    tracks_by_object: IndexMap<String, ObjectTracks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectTracks {
    #[serde(default)]
    track_data: IndexMap<String, TrackDocument>,
    #[serde(default)]
    track_id_by_prop_path: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TrackDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    keyframes: Vec<KeyframeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyframeDocument {
    #[serde(default)]
    id: Option<String>,
    position: f32,
    value: Value,
    #[serde(default = "default_connected")]
    connected_right: bool,
    #[serde(default)]
    handles: Option<[f32; 4]>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

fn default_length() -> f32 {
    DEFAULT_LENGTH
}

fn default_subunits() -> u32 {
    DEFAULT_SUBUNITS_PER_UNIT
}

fn default_connected() -> bool {
    true
}

/// Names of the sheets in a document, in document order
pub fn sheet_names(json: &str) -> Result<Vec<String>> {
    let document: ProjectDocument = serde_json::from_str(json)?;
    Ok(document.sheets_by_id.into_keys().collect())
}

/// Parse one sheet of a document into a [`Sequence`]
///
/// With `sheet = None` the first sheet is used.
pub fn parse_document(json: &str, sheet: Option<&str>) -> Result<Sequence> {
    let document: ProjectDocument = serde_json::from_str(json)?;
    let mut sheets = document.sheets_by_id;

    let (name, sheet_doc) = match sheet {
        Some(name) => {
            let doc = sheets
                .shift_remove(name)
                .ok_or_else(|| SequenceError::UnknownSheet(name.to_string()))?;
            (name.to_string(), doc)
        }
        None => sheets
            .shift_remove_index(0)
            .ok_or_else(|| SequenceError::malformed("document", "no sheets"))?,
    };

    build_sequence(name, sheet_doc)
}

fn build_sequence(name: String, sheet: SheetDocument) -> Result<Sequence> {
    let seq_doc = sheet.sequence.unwrap_or(SequenceDocument {
        length: DEFAULT_LENGTH,
        sub_units_per_unit: DEFAULT_SUBUNITS_PER_UNIT,
        tracks_by_object: IndexMap::new(),
    });

    let mut sequence = Sequence::new(name.as_str(), seq_doc.length)?;
    sequence.subunits_per_unit = seq_doc.sub_units_per_unit;

    for (object, tracks) in seq_doc.tracks_by_object {
        let mut properties: IndexMap<PropertyKey, AnimatedProperty> = IndexMap::new();

        for (raw_path, track_id) in &tracks.track_id_by_prop_path {
            let path = parse_prop_path(&object, raw_path)?;
            let (key, channel) = PropertyKey::from_path(&object, &path)?;
            let context = format!("{key}.{channel}");

            let track_doc = tracks.track_data.get(track_id).ok_or_else(|| {
                SequenceError::malformed(
                    context.as_str(),
                    format!("references missing track `{track_id}`"),
                )
            })?;
            let track = build_track(&context, channel, track_doc)?;

            properties
                .entry(key.clone())
                .or_insert_with(|| AnimatedProperty::new(key))
                .add_channel(track)?;
        }

        let orphans = tracks
            .track_data
            .keys()
            .filter(|id| !tracks.track_id_by_prop_path.values().any(|v| v == *id))
            .count();
        if orphans > 0 {
            tracing::debug!("Object `{}` has {} unreferenced tracks", object, orphans);
        }

        for property in properties.into_values() {
            sequence.add_property(property)?;
        }
    }

    for (object, value) in &sheet.static_overrides.by_object {
        let mut path = Vec::new();
        collect_static(&mut sequence, object, value, &mut path)?;
    }

    sequence.validate()?;
    Ok(sequence)
}

fn parse_prop_path(object: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
        SequenceError::malformed(
            format!("object `{object}`"),
            format!("bad property path {raw}: {e}"),
        )
    })
}

fn build_track(context: &str, channel: String, doc: &TrackDocument) -> Result<KeyframeTrack> {
    if let Some(kind) = doc.kind.as_deref() {
        if kind != BASIC_TRACK_TYPE {
            return Err(SequenceError::malformed(
                context,
                format!("unsupported track type `{kind}`"),
            ));
        }
    }

    let mut keyframes = Vec::with_capacity(doc.keyframes.len());
    for kf in &doc.keyframes {
        let value = kf.value.as_f64().ok_or_else(|| {
            SequenceError::malformed(
                context,
                format!("keyframe at t={} has non-numeric value {}", kf.position, kf.value),
            )
        })? as f32;

        let mut keyframe = Keyframe::new(kf.position, value);
        if let Some(id) = &kf.id {
            keyframe.id = KeyframeId(id.clone());
        }

        keyframe.interpolation = match kf.kind.as_deref() {
            kind if !kf.connected_right || kind == Some("hold") => InterpolationMode::Step,
            Some("linear") => InterpolationMode::Linear,
            Some("bezier") | None => InterpolationMode::Curve,
            Some(other) => {
                return Err(SequenceError::malformed(
                    context,
                    format!("unknown keyframe type `{other}`"),
                ))
            }
        };
        if let Some([in_x, in_y, out_x, out_y]) = kf.handles {
            keyframe.in_handle = Some([in_x, in_y]);
            keyframe.out_handle = Some([out_x, out_y]);
        }
        keyframes.push(keyframe);
    }

    KeyframeTrack::new(channel, keyframes).map_err(|e| match e {
        SequenceError::MalformedTrackData { reason, .. } => SequenceError::malformed(context, reason),
        other => other,
    })
}

fn collect_static(
    sequence: &mut Sequence,
    object: &str,
    value: &Value,
    path: &mut Vec<String>,
) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (segment, child) in map {
                path.push(segment.clone());
                collect_static(sequence, object, child, path)?;
                path.pop();
            }
        }
        Value::Number(number) => {
            let (key, channel) = PropertyKey::from_path(object, path)?;
            let value = number.as_f64().unwrap_or(f64::NAN) as f32;
            sequence.set_static_override(key, channel, value)?;
        }
        other => {
            tracing::debug!(
                "Skipping non-numeric static value {} on `{}`",
                other,
                object
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolator::CubicBezier;

    const DOCUMENT: &str = r#"{
        "sheetsById": {
            "Scene": {
                "staticOverrides": {
                    "byObject": {
                        "Camera": { "position": { "y": 4 }, "label": "main" }
                    }
                },
                "sequence": {
                    "subUnitsPerUnit": 30,
                    "length": 6,
                    "type": "PositionalSequence",
                    "tracksByObject": {
                        "Camera": {
                            "trackData": {
                                "tX": {
                                    "type": "BasicKeyframedTrack",
                                    "__debugName": "Camera:[\"position\",\"x\"]",
                                    "keyframes": [
                                        { "id": "a", "position": 0, "value": 6, "connectedRight": true, "handles": [0.5, 0.5, 0.5, 0.5], "type": "bezier" },
                                        { "id": "b", "position": 2, "value": 0, "connectedRight": true, "handles": [0.5, 0.5, 0.5, 0.5], "type": "bezier" }
                                    ]
                                },
                                "tZ": {
                                    "type": "BasicKeyframedTrack",
                                    "keyframes": [
                                        { "id": "c", "position": 0, "value": 12, "connectedRight": false },
                                        { "id": "d", "position": 3, "value": 5 }
                                    ]
                                }
                            },
                            "trackIdByPropPath": {
                                "[\"position\",\"x\"]": "tX",
                                "[\"position\",\"z\"]": "tZ"
                            }
                        }
                    }
                }
            },
            "Other": {}
        },
        "definitionVersion": "0.4.0",
        "revisionHistory": []
    }"#;

    fn camera() -> PropertyKey {
        PropertyKey::new("Camera", "position")
    }

    #[test]
    fn test_parse_first_sheet() {
        let seq = parse_document(DOCUMENT, None).unwrap();
        assert_eq!(seq.name, "Scene");
        assert_eq!(seq.length(), 6.0);
        assert_eq!(seq.property_count(), 1);

        let property = seq.property(&camera()).unwrap();
        let x = property.channel("x").unwrap();
        assert_eq!(x.keyframes()[0].id, KeyframeId::from("a"));
        assert_eq!(x.keyframes()[0].interpolation, InterpolationMode::Curve);
        assert_eq!(
            property.channel("z").unwrap().keyframes()[0].interpolation,
            InterpolationMode::Step
        );
        assert_eq!(seq.static_override(&camera(), "y"), Some(4.0));
    }

    #[test]
    fn test_evaluate_parsed_document() {
        let seq = parse_document(DOCUMENT, None).unwrap();
        let values = seq.evaluate(1.0, &CubicBezier);
        let [x, y, z] = values.get(&camera()).unwrap().vec3().unwrap();
        assert!((x - 3.0).abs() < 1e-3);
        assert_eq!(y, 4.0);
        // Held until t=3
        assert_eq!(z, 12.0);
    }

    #[test]
    fn test_select_sheet() {
        assert_eq!(sheet_names(DOCUMENT).unwrap(), vec!["Scene", "Other"]);
        let other = parse_document(DOCUMENT, Some("Other")).unwrap();
        assert_eq!(other.property_count(), 0);
        assert_eq!(other.length(), DEFAULT_LENGTH);

        let err = parse_document(DOCUMENT, Some("Missing")).unwrap_err();
        assert!(matches!(err, SequenceError::UnknownSheet(name) if name == "Missing"));
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let broken = DOCUMENT.replace(r#""position": 3, "value": 5"#, r#""position": 0, "value": 5"#);
        let err = parse_document(&broken, None).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_missing_track_rejected() {
        let broken = DOCUMENT.replace(r#""[\"position\",\"z\"]": "tZ""#, r#""[\"position\",\"z\"]": "gone""#);
        let err = parse_document(&broken, None).unwrap_err();
        match err {
            SequenceError::MalformedTrackData { context, reason } => {
                assert_eq!(context, "Camera.position.z");
                assert!(reason.contains("gone"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let broken = DOCUMENT.replace(r#""value": 12"#, r#""value": "twelve""#);
        assert!(parse_document(&broken, None).unwrap_err().is_malformed());
    }

    #[test]
    fn test_empty_document() {
        let err = parse_document(r#"{ "sheetsById": {} }"#, None).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            parse_document("not json", None).unwrap_err(),
            SequenceError::Json(_)
        ));
    }
}
