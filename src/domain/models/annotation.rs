//! Clinical notes, annotator kinds and annotation results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of annotator a submission implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotatorKind {
    Date,
    Person,
    Location,
    Address,
}

impl AnnotatorKind {
    /// Endpoint under the API base. It doubles as the key of the result list.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Date => "textDateAnnotations",
            Self::Person => "textPersonNameAnnotations",
            Self::Location | Self::Address => "textPhysicalAddressAnnotations",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Person => "person",
            Self::Location => "location",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for AnnotatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "person" => Ok(Self::Person),
            "location" => Ok(Self::Location),
            "address" => Ok(Self::Address),
            other => Err(format!(
                "unknown annotator kind '{other}' (expected date, person, location or address)"
            )),
        }
    }
}

/// Note content as sent to the annotator, identifier already stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBody {
    pub note_type: String,
    pub patient_id: String,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One input record from the notes file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalNote {
    #[serde(alias = "identifier")]
    pub id: String,
    #[serde(flatten)]
    pub body: NoteBody,
}

impl ClinicalNote {
    /// Split the record into its identifier and the body to send onward.
    pub fn into_parts(self) -> (String, NoteBody) {
        (self.id, self.body)
    }
}

/// Request payload for the annotation endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationRequest<'a> {
    pub note: &'a NoteBody,
}

/// A single span reported by an annotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub start: i64,
    pub length: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Kind-specific attributes such as `dateFormat` or `addressType`.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Provenance linking a result back to its input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSource {
    #[serde(rename = "resourceSource")]
    pub resource_source: String,
}

/// Annotation lists keyed by response key, as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    #[serde(flatten)]
    pub annotations: BTreeMap<String, Vec<TextAnnotation>>,
}

impl AnnotationPayload {
    /// Strictly parse a probe payload and require the list for `kind`.
    pub fn parse(kind: AnnotatorKind, raw: &[u8]) -> Result<Self, String> {
        let payload: Self = serde_json::from_slice(raw)
            .map_err(|e| format!("response is not a valid annotation object: {e}"))?;
        if !payload.annotations.contains_key(kind.endpoint()) {
            return Err(format!("response is missing '{}'", kind.endpoint()));
        }
        Ok(payload)
    }

    pub fn with_source(self, note_id: impl Into<String>) -> AnnotationResult {
        AnnotationResult {
            annotation_source: AnnotationSource {
                resource_source: note_id.into(),
            },
            annotations: self.annotations,
        }
    }
}

/// Annotations for one input record, stamped with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    #[serde(rename = "annotationSource")]
    pub annotation_source: AnnotationSource,
    #[serde(flatten)]
    pub annotations: BTreeMap<String, Vec<TextAnnotation>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_endpoint_mapping() {
        assert_eq!(AnnotatorKind::Date.endpoint(), "textDateAnnotations");
        assert_eq!(AnnotatorKind::Person.endpoint(), "textPersonNameAnnotations");
        assert_eq!(
            AnnotatorKind::Location.endpoint(),
            AnnotatorKind::Address.endpoint()
        );
        assert_eq!("DATE".parse::<AnnotatorKind>().unwrap(), AnnotatorKind::Date);
        assert!("phone".parse::<AnnotatorKind>().is_err());
    }

    #[test]
    fn test_note_strips_identifier() {
        let note: ClinicalNote = serde_json::from_value(json!({
            "id": "note-1",
            "noteType": "loinc:LP29684-5",
            "patientId": "patient-1",
            "text": "On 12/26/2020 ...",
            "note_name": "n1"
        }))
        .unwrap();

        let (id, body) = note.into_parts();
        assert_eq!(id, "note-1");

        let sent = serde_json::to_value(AnnotationRequest { note: &body }).unwrap();
        assert_eq!(sent["note"]["noteType"], "loinc:LP29684-5");
        assert_eq!(sent["note"]["note_name"], "n1");
        assert!(sent["note"].get("id").is_none());
    }

    #[test]
    fn test_identifier_alias() {
        let note: ClinicalNote = serde_json::from_value(json!({
            "identifier": "awesome-note",
            "noteType": "loinc:LP29684-5",
            "patientId": "awesome-patient",
            "text": "hello"
        }))
        .unwrap();
        assert_eq!(note.id, "awesome-note");
    }

    #[test]
    fn test_payload_requires_kind_key() {
        let raw = br#"{"textDateAnnotations":[{"start":3,"length":10,"text":"12/26/2020","dateFormat":"MM/DD/YYYY","confidence":95.5}]}"#;
        let payload = AnnotationPayload::parse(AnnotatorKind::Date, raw).unwrap();
        let result = payload.with_source("note-1");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["annotationSource"]["resourceSource"], "note-1");
        assert_eq!(value["textDateAnnotations"][0]["dateFormat"], "MM/DD/YYYY");

        let err = AnnotationPayload::parse(AnnotatorKind::Person, raw).unwrap_err();
        assert!(err.contains("textPersonNameAnnotations"));
    }

    #[test]
    fn test_payload_rejects_non_json() {
        let raw = b"{'textDateAnnotations': []}";
        assert!(AnnotationPayload::parse(AnnotatorKind::Date, raw).is_err());
    }
}
