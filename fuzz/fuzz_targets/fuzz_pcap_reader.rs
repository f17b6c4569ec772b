//! Fuzz target for pcap container reading.
//!
//! Exercises magic detection, the global header, record headers and
//! captures cut off at arbitrary points.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mysqltap_core::PcapReader;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = PcapReader::new(Cursor::new(data)) {
        while let Ok(Some(_packet)) = reader.next_packet() {}
    }
});
