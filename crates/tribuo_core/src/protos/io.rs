//! Reading and writing envelopes as length-delimited-free protobuf
//! files on disk.

use std::fs;
use std::path::Path;

use prost::Message;
use tribuo_proto::core::EnvelopeProto;

use crate::errors::Result;

/// File extension used for natively serialized artifacts.
pub const TRIBUO_NATIVE_EXTENSION: &str = "tribuo";

/// Write a single envelope to `path`, replacing any existing file.
pub fn write_envelope_to_file(envelope: &EnvelopeProto, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, envelope.encode_to_vec())?;
    Ok(())
}

/// Read a single envelope from `path`.
pub fn read_envelope_from_file(path: impl AsRef<Path>) -> Result<EnvelopeProto> {
    let bytes = fs::read(path)?;
    Ok(EnvelopeProto::decode(bytes.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protos;

    #[test]
    fn envelope_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join(format!("marker.{TRIBUO_NATIVE_EXTENSION}"));

        let envelope = protos::pack_marker(0, "tribuo.domain.VotingCombiner");
        write_envelope_to_file(&envelope, &path).unwrap();
        let got = read_envelope_from_file(&path).unwrap();
        assert_eq!(envelope, got);
    }

    #[test]
    fn truncated_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tribuo");
        // A lone length-delimited tag with no payload behind it.
        std::fs::write(&path, [0x1a, 0x05]).unwrap();
        read_envelope_from_file(&path).unwrap_err();
    }
}
