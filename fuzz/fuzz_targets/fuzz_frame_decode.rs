//! Fuzz target for Ethernet/IPv4/TCP frame decoding.
//!
//! The input is one frame. Decoding must either fail cleanly or return a
//! payload that lies inside the frame; the frame is then pushed through a
//! connection table.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mysqltap_core::{decode_frame, ConnectionTable, Query, RawPacket};

fuzz_target!(|data: &[u8]| {
    if let Ok(Some(frame)) = decode_frame(data) {
        assert!(frame.payload.len() <= data.len());
        let _ = frame.connection_key();
    }

    let mut table = ConnectionTable::with_sink(|_q: Query| {});
    let _ = table.on_frame(&RawPacket::ethernet(1, 0, data.to_vec()));
});
