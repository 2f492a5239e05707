//! Attachment embedded in a message

use serde::{Deserialize, Serialize};

/// Media or file attached to a message
///
/// Attachments have no identity of their own; they are stored inside the
/// owning message row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    /// Attachment kind as reported by the provider (e.g. "img", "video")
    #[serde(rename = "type")]
    pub kind: String,
    pub src_url: String,
    pub file_name: String,
    /// Size in bytes
    pub file_size: f64,
    pub mime_type: String,
    /// Playback length in seconds for audio/video
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub is_gif: bool,
    pub is_sticker: bool,
    pub is_voice_note: bool,
}

/// Encode an attachment list as JSON text for storage
pub fn encode_attachments(attachments: &[Attachment]) -> serde_json::Result<String> {
    serde_json::to_string(attachments)
}

/// Decode a stored attachment list; NULL, empty text and `null` yield no attachments
pub fn decode_attachments(raw: Option<&str>) -> serde_json::Result<Vec<Attachment>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str::<Option<Vec<Attachment>>>(text)?.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_round_trip_every_field() {
        let attachments = vec![
            Attachment {
                kind: "video".to_string(),
                src_url: "mxc://example.org/abc".to_string(),
                file_name: "clip.mp4".to_string(),
                file_size: 1_048_576.0,
                mime_type: "video/mp4".to_string(),
                duration: 12.345,
                width: 1920,
                height: 1080,
                is_gif: true,
                is_sticker: false,
                is_voice_note: true,
            },
            Attachment {
                kind: "img".to_string(),
                is_sticker: true,
                ..Default::default()
            },
        ];

        let encoded = encode_attachments(&attachments).unwrap();
        let decoded = decode_attachments(Some(&encoded)).unwrap();
        assert_eq!(decoded, attachments);
    }

    #[test]
    fn test_json_keys_match_storage_format() {
        let json = serde_json::to_value(Attachment {
            kind: "img".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["type"], "img");
        assert!(json.get("is_voice_note").is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let decoded = decode_attachments(Some(r#"[{"type":"file"}]"#)).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].kind, "file");
        assert_eq!(decoded[0].width, 0);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_attachments(None).unwrap().is_empty());
        assert!(decode_attachments(Some("null")).unwrap().is_empty());
        assert!(decode_attachments(Some("[]")).unwrap().is_empty());
    }
}
