//! Fuzz target for MySQL packet framing and the protocol state machine.
//!
//! The input is a series of chunks. Each chunk starts with a control byte:
//! bit 0 picks the direction, bit 1 the sequence mode (first chunk only),
//! and the upper six bits give the chunk length.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mysqltap_core::mysql::{MysqlPacket, ProtocolStateMachine, SequenceMode};
use mysqltap_core::stream::{Direction, PacketFramer};

fuzz_target!(|data: &[u8]| {
    let Some(&first) = data.first() else {
        return;
    };
    let mode = if first & 0b10 != 0 {
        SequenceMode::Shared
    } else {
        SequenceMode::PerDirection
    };

    let mut machine = ProtocolStateMachine::new(1, mode);
    let mut to_server = PacketFramer::new();
    let mut from_server = PacketFramer::new();

    let mut rest = data;
    let mut ts = 0i64;
    while let Some((&control, tail)) = rest.split_first() {
        let len = usize::from(control >> 2).min(tail.len());
        let (chunk, tail) = tail.split_at(len);
        rest = tail;
        ts += 1;

        let (direction, framer) = if control & 1 == 0 {
            (Direction::ToServer, &mut to_server)
        } else {
            (Direction::FromServer, &mut from_server)
        };
        framer.push(chunk);

        while let Some(framed) = framer.next_packet() {
            let packet = MysqlPacket {
                direction,
                sequence: framed.sequence,
                body: framed.body,
                frame_number: ts as u64,
                timestamp_us: ts,
            };
            if let Ok(Some(query)) = machine.step(&packet) {
                assert!(query.completed_at >= query.issued_at);
                assert!(query.latency_us() >= 0);
            }
        }
    }
});
