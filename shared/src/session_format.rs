use bincode::{Decode, Encode};
use thiserror::Error;

use crate::snapshot::Snapshot;
use crate::worksheet::Worksheet;

pub const SESSION_FILE_MAGIC: [u8; 4] = *b"SHWK";
pub const SESSION_FILE_VERSION: u32 = 1;
const SESSION_HEADER_LEN: usize = SESSION_FILE_MAGIC.len() + std::mem::size_of::<u32>();

/// Everything the worksheet persists, bundled for download.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct WorksheetFile {
    pub math_text: String,
    pub canvas: Option<Snapshot>,
    pub worksheet: Worksheet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionFileDecodeError {
    #[error("unsupported worksheet file version {0}")]
    UnsupportedVersion(u32),
    #[error("not a worksheet file")]
    InvalidData,
}

pub fn encode_session_file(data: &WorksheetFile) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&SESSION_FILE_MAGIC);
    payload.extend_from_slice(&SESSION_FILE_VERSION.to_le_bytes());
    let body = bincode::encode_to_vec(data, bincode::config::standard()).unwrap_or_default();
    payload.extend_from_slice(&body);
    payload
}

pub fn decode_session_file(payload: &[u8]) -> Result<WorksheetFile, SessionFileDecodeError> {
    if !(payload.len() >= SESSION_HEADER_LEN && payload.starts_with(&SESSION_FILE_MAGIC)) {
        return Err(SessionFileDecodeError::InvalidData);
    }
    let version = u32::from_le_bytes(
        payload[SESSION_FILE_MAGIC.len()..SESSION_HEADER_LEN]
            .try_into()
            .map_err(|_| SessionFileDecodeError::InvalidData)?,
    );
    let body = &payload[SESSION_HEADER_LEN..];
    let mut file: WorksheetFile = match version {
        1 => bincode::decode_from_slice(body, bincode::config::standard())
            .map(|(data, _)| data)
            .map_err(|_| SessionFileDecodeError::InvalidData)?,
        _ => return Err(SessionFileDecodeError::UnsupportedVersion(version)),
    };
    // Decoding skips the data URL check; a bad canvas is dropped, not fatal.
    file.canvas = file
        .canvas
        .and_then(|snapshot| Snapshot::from_data_url(snapshot.into_data_url()).ok());
    file.worksheet.ensure_defaults();
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worksheet_file_survives_encoding() {
        let mut worksheet = Worksheet::blank();
        worksheet.set_header("header-materia", "Cálculo");
        let file = WorksheetFile {
            math_text: "x^2".into(),
            canvas: Some(Snapshot::from_data_url("data:image/png;base64,AAAA").unwrap()),
            worksheet,
        };
        let bytes = encode_session_file(&file);
        assert_eq!(&bytes[..4], b"SHWK");
        assert_eq!(decode_session_file(&bytes), Ok(file));
    }

    #[test]
    fn rejects_foreign_bytes() {
        assert_eq!(
            decode_session_file(b"PK\x03\x04 zip"),
            Err(SessionFileDecodeError::InvalidData)
        );
        assert_eq!(decode_session_file(b"SHW"), Err(SessionFileDecodeError::InvalidData));
    }

    #[test]
    fn rejects_future_versions() {
        let mut bytes = encode_session_file(&WorksheetFile::default());
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        assert_eq!(
            decode_session_file(&bytes),
            Err(SessionFileDecodeError::UnsupportedVersion(7))
        );
    }

    #[test]
    fn truncated_body_is_invalid() {
        let mut file = WorksheetFile::default();
        file.math_text = "a long enough formula".into();
        let bytes = encode_session_file(&file);
        assert_eq!(
            decode_session_file(&bytes[..bytes.len() - 5]),
            Err(SessionFileDecodeError::InvalidData)
        );
    }
}
