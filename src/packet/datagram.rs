use super::{
    HEADER_LEN, MAGIC, ProtocolError, TYPE_DECODE, TYPE_HEARTBEAT, TYPE_LOGGED_ADIF, TYPE_STATUS,
    cursor::Cursor,
    tags::{TagMap, parse_record},
};

const CALL_MARKER: &[u8] = b"<call:";

/// A decoded datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Liveness announcement; informational only.
    Heartbeat {
        /// Schema version from the header.
        schema: u32,
        /// Sending client id.
        client_id: String,
        /// Highest schema the client understands.
        max_schema: u32,
        /// Client software version.
        version: String,
    },
    /// Current dial frequency, mode and DX call of the client.
    Status {
        /// Schema version from the header.
        schema: u32,
        /// Sending client id.
        client_id: String,
        /// Dial frequency in hertz.
        dial_freq_hz: u64,
        /// Client mode string, e.g. `FT8`.
        mode: String,
        /// Callsign currently selected for a QSO.
        dx_call: String,
    },
    /// Decode report. Payload is not consumed.
    Decode {
        /// Sending client id.
        client_id: String,
    },
    /// A contact the client just logged, as ADIF tags.
    LoggedAdif {
        /// Sending client id.
        client_id: String,
        /// Tags from the `<call:` marker through `<EOR>`.
        tags: TagMap,
    },
}

/// Decodes one datagram. Any failure means the datagram is dropped whole.
pub fn decode(datagram: &[u8]) -> Result<Packet, ProtocolError> {
    if datagram.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            offset: 0,
            needed: HEADER_LEN,
            available: datagram.len(),
        });
    }
    let mut cur = Cursor::new(datagram);
    let magic = cur.read_u32()?;
    if magic != MAGIC {
        return Err(ProtocolError::BadMagic(magic));
    }
    let schema = cur.read_u32()?;
    let kind = cur.read_u32()?;
    let client_id = cur.read_utf8("client id")?.to_string();

    match kind {
        TYPE_HEARTBEAT => {
            let max_schema = cur.read_u32()?;
            let version = cur.read_utf8("version")?.to_string();
            Ok(Packet::Heartbeat {
                schema,
                client_id,
                max_schema,
                version,
            })
        }
        TYPE_STATUS => {
            let dial_freq_hz = cur.read_u64()?;
            let mode = cur.read_utf8("mode")?.to_string();
            let dx_call = cur.read_utf8("dx call")?.to_string();
            Ok(Packet::Status {
                schema,
                client_id,
                dial_freq_hz,
                mode,
                dx_call,
            })
        }
        TYPE_DECODE => Ok(Packet::Decode { client_id }),
        TYPE_LOGGED_ADIF => {
            let start = datagram
                .windows(CALL_MARKER.len())
                .position(|w| w == CALL_MARKER)
                .ok_or(ProtocolError::MissingCallMarker)?;
            let text = std::str::from_utf8(&datagram[start..])
                .map_err(|_| ProtocolError::Utf8("logged ADIF"))?;
            let tags = parse_record(text)?;
            Ok(Packet::LoggedAdif { client_id, tags })
        }
        other => Err(ProtocolError::UnsupportedType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::encode::DatagramBuilder;

    #[test]
    fn decodes_heartbeat() {
        let dg = DatagramBuilder::heartbeat("WSJT-X", 3, "2.6.1");
        assert_eq!(
            decode(&dg),
            Ok(Packet::Heartbeat {
                schema: 2,
                client_id: "WSJT-X".to_string(),
                max_schema: 3,
                version: "2.6.1".to_string(),
            })
        );
    }

    #[test]
    fn decodes_status() {
        let dg = DatagramBuilder::status("WSJT-X", 14_074_000, "FT8", "K1ABC");
        let Ok(Packet::Status { dial_freq_hz, mode, dx_call, .. }) = decode(&dg) else {
            panic!("expected status");
        };
        assert_eq!(dial_freq_hz, 14_074_000);
        assert_eq!(mode, "FT8");
        assert_eq!(dx_call, "K1ABC");
    }

    #[test]
    fn logged_adif_skips_everything_before_call_marker() {
        let adif = "\n<adif_ver:5>3.1.0\n<programid:6>WSJT-X\n<EOH>\n<call:4>W1AW <srx_string:6>1D CT <EOR>";
        let dg = DatagramBuilder::logged_adif("WSJT-X", adif);
        let Ok(Packet::LoggedAdif { tags, .. }) = decode(&dg) else {
            panic!("expected logged adif");
        };
        assert_eq!(tags.get("CALL"), Some("W1AW"));
        assert_eq!(tags.get("PROGRAMID"), None);
        assert_eq!(tags.get("SRX_STRING"), Some("1D CT"));
    }

    #[test]
    fn logged_adif_without_marker_is_dropped() {
        let dg = DatagramBuilder::logged_adif("WSJT-X", "<CALL:4>W1AW <EOR>");
        assert_eq!(decode(&dg), Err(ProtocolError::MissingCallMarker));
    }

    #[test]
    fn bad_magic_short_and_unknown_types_are_dropped() {
        let mut dg = DatagramBuilder::heartbeat("X", 3, "1").to_vec();
        dg[0] = 0;
        assert!(matches!(decode(&dg), Err(ProtocolError::BadMagic(_))));

        assert_eq!(
            decode(&[0xAD, 0xBC, 0xCB]),
            Err(ProtocolError::Truncated { offset: 0, needed: HEADER_LEN, available: 3 })
        );
        let header_only = DatagramBuilder::new(0, "").finish();
        assert_eq!(header_only.len(), HEADER_LEN);
        assert!(matches!(decode(&header_only), Err(ProtocolError::Truncated { offset: 16, .. })));

        let close = DatagramBuilder::new(6, "WSJT-X").finish();
        assert_eq!(decode(&close), Err(ProtocolError::UnsupportedType(6)));

        let decode_pkt = DatagramBuilder::new(2, "WSJT-X").finish();
        assert!(matches!(decode(&decode_pkt), Ok(Packet::Decode { .. })));
    }

    #[test]
    fn truncated_status_payload_fails_closed() {
        let dg = DatagramBuilder::status("WSJT-X", 7_074_000, "FT8", "K1ABC");
        let cut = &dg[..dg.len() - 2];
        assert!(matches!(decode(cut), Err(ProtocolError::Truncated { .. })));
    }
}
