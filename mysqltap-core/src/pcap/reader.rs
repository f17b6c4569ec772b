//! PCAP file reader with automatic gzip handling.
//!
//! [`PcapReader`] works over any `R: Read` source, using the `pcap_parser`
//! crate for record parsing. The global header's magic number is checked up
//! front so that a byte-swapped capture is rejected instead of misparsed.
//!
//! A capture that ends in the middle of a header or record is treated as a
//! normal end of stream.

use std::fs::File;
use std::io::{BufReader, Chain, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned};

use super::{RawPacket, LINKTYPE_ETHERNET};
use crate::error::{Error, PcapError};

/// Buffer size for the pcap_parser reader (256KB).
const BUFFER_SIZE: usize = 262144;

/// Size of the classic PCAP global header.
pub const GLOBAL_HEADER_LEN: usize = 24;

/// Expected magic number, read little-endian.
pub const PCAP_MAGIC: u32 = 0xa1b2c3d4;

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

type HeaderChain<R> = Chain<Cursor<Vec<u8>>, R>;

/// Reader for classic PCAP captures.
///
/// # Example
///
/// ```ignore
/// use mysqltap_core::pcap::PcapReader;
///
/// let mut reader = PcapReader::open("capture.pcap.gz")?;
/// while let Some(packet) = reader.next_packet()? {
///     println!("Frame {}: {} bytes", packet.frame_number, packet.data.len());
/// }
/// ```
pub struct PcapReader<R: Read> {
    /// `None` when the capture ended inside the global header.
    inner: Option<LegacyPcapReader<HeaderChain<R>>>,
    /// Set once the source has been fully read or ended inside a record.
    finished: bool,
    frame_number: u64,
    link_type: u16,
}

impl PcapReader<Box<dyn Read + Send>> {
    /// Open a PCAP file for reading.
    ///
    /// Automatically detects and decompresses gzipped files.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|_| {
            Error::Pcap(PcapError::FileNotFound {
                path: path.display().to_string(),
            })
        })?;

        let mut magic = [0u8; 2];
        let bytes_read = file.read(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;

        let source: Box<dyn Read + Send> = if bytes_read == 2 && magic == GZIP_MAGIC {
            tracing::debug!(path = %path.display(), "decompressing gzip capture");
            Box::new(MultiGzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(file)
        };

        Self::new(source)
    }
}

impl<R: Read> PcapReader<R> {
    /// Create a reader over an arbitrary byte source.
    ///
    /// Fails if the magic number is missing, byte-swapped or unknown.
    pub fn new(mut source: R) -> Result<Self, Error> {
        let mut header = Vec::with_capacity(GLOBAL_HEADER_LEN);
        source
            .by_ref()
            .take(GLOBAL_HEADER_LEN as u64)
            .read_to_end(&mut header)?;

        if header.len() < 4 {
            return Err(Error::Pcap(PcapError::InvalidFormat {
                reason: "File too short to read magic number".to_string(),
            }));
        }
        check_magic(&header[..4])?;

        if header.len() < GLOBAL_HEADER_LEN {
            tracing::warn!(
                have = header.len(),
                "capture ends inside the global header, no frames to read"
            );
            return Ok(Self {
                inner: None,
                finished: true,
                frame_number: 0,
                link_type: LINKTYPE_ETHERNET,
            });
        }

        let chained = Cursor::new(header).chain(source);
        let reader = LegacyPcapReader::new(BUFFER_SIZE, chained).map_err(|e| {
            Error::Pcap(PcapError::InvalidFormat {
                reason: format!("Failed to parse PCAP header: {e}"),
            })
        })?;

        Ok(Self {
            inner: Some(reader),
            finished: false,
            frame_number: 0,
            link_type: LINKTYPE_ETHERNET,
        })
    }

    /// Get the link type of the capture (e.g., 1 = Ethernet).
    #[inline]
    pub fn link_type(&self) -> u16 {
        self.link_type
    }

    /// Get the current frame count.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    /// Read the next packet.
    ///
    /// Returns `Ok(None)` at end of file, including a file that stops
    /// part-way through a record.
    pub fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        use pcap_parser::PcapError as PcapParserError;

        if self.finished {
            return Ok(None);
        }
        let Some(reader) = self.inner.as_mut() else {
            return Ok(None);
        };

        loop {
            match reader.next() {
                Ok((offset, block)) => match block {
                    PcapBlockOwned::Legacy(packet) => {
                        self.frame_number += 1;

                        let timestamp_us =
                            (packet.ts_sec as i64) * 1_000_000 + (packet.ts_usec as i64);

                        let raw = RawPacket::new(
                            self.frame_number,
                            timestamp_us,
                            packet.caplen,
                            packet.origlen,
                            self.link_type,
                            packet.data.to_vec(),
                        );

                        reader.consume(offset);
                        return Ok(Some(raw));
                    }
                    PcapBlockOwned::LegacyHeader(header) => {
                        let link_type = header.network.0;
                        if link_type != LINKTYPE_ETHERNET as i32 {
                            return Err(Error::Pcap(PcapError::UnsupportedLinkType {
                                link_type: link_type as u16,
                            }));
                        }
                        self.link_type = link_type as u16;
                        reader.consume(offset);
                        continue;
                    }
                    _ => {
                        reader.consume(offset);
                        continue;
                    }
                },
                Err(PcapParserError::Eof) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(PcapParserError::UnexpectedEof) => {
                    tracing::warn!(
                        frames = self.frame_number,
                        "capture ends inside a record, treating as end of stream"
                    );
                    self.finished = true;
                    return Ok(None);
                }
                Err(PcapParserError::Incomplete(_)) => {
                    reader.refill().map_err(|e| {
                        Error::Pcap(PcapError::InvalidFormat {
                            reason: format!("Refill error: {e}"),
                        })
                    })?;
                    continue;
                }
                Err(e) => {
                    return Err(Error::Pcap(PcapError::InvalidFormat {
                        reason: format!("Parse error: {e}"),
                    }))
                }
            }
        }
    }
}

/// Validate the global header's magic number.
fn check_magic(bytes: &[u8]) -> Result<(), Error> {
    let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

    if magic == PCAP_MAGIC {
        Ok(())
    } else if magic.swap_bytes() == PCAP_MAGIC {
        Err(Error::Pcap(PcapError::WrongByteOrder { magic }))
    } else {
        Err(Error::Pcap(PcapError::InvalidFormat {
            reason: format!("Unknown magic number: {magic:#010x}"),
        }))
    }
}

/// Iterator adapter for PcapReader.
impl<R: Read> Iterator for PcapReader<R> {
    type Item = Result<RawPacket, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
