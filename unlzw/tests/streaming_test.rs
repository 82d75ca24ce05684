//! Streaming behaviour: chunking, output limits, sinks, errors, hostile input.

mod common;

use common::*;
use std::io::{self, Cursor, Read};
use unlzw::{
    ByteSink, DecodeStatus, DecoderState, ErrorKind, LzwConfig, LzwDecoder, StreamDecoder,
    decompress, decompress_range, decompress_to_writer,
};

fn decode_in_chunks(config: LzwConfig, input: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut dec = LzwDecoder::new(config, Vec::new(), None).unwrap();
    for chunk in input.chunks(chunk_size) {
        dec.feed(chunk).unwrap();
    }
    dec.finish().unwrap();
    dec.into_sink()
}

#[test]
fn test_chunking_is_transparent() {
    let cases = [
        (LzwConfig::UNIX_COMPRESS, WORDS_Z),
        (LzwConfig::UNIX_COMPRESS, WORDS_CLEAR12_Z),
        (LzwConfig::ZIP_SHRINK, WORDS_SHR),
    ];
    for (config, input) in cases {
        let whole = decode_in_chunks(config, input, input.len());
        assert_eq!(whole, WORDS);
        for chunk_size in [1, 2, 3, 7, 64, 4096] {
            let chunked = decode_in_chunks(config, input, chunk_size);
            assert_eq!(chunked, whole, "{} in {chunk_size}-byte chunks", config.dialect);
        }
    }
}

#[test]
fn test_irregular_chunks() {
    let mut rng = Lcg::new(0x5eed);
    let mut dec = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, Vec::new(), None).unwrap();
    let mut rest = WORDS_CLEAR12_Z;
    while !rest.is_empty() {
        let n = (1 + rng.below(40)).min(rest.len());
        let (chunk, tail) = rest.split_at(n);
        dec.feed(chunk).unwrap();
        rest = tail;
    }
    dec.feed(&[]).unwrap();
    dec.finish().unwrap();
    assert_eq!(dec.into_sink(), WORDS);
}

#[test]
fn test_expected_len_never_exceeded() {
    for limit in [0, 1, 2, 1023, 1024, 1025, 5000, WORDS.len() - 1] {
        let mut dec =
            LzwDecoder::new(LzwConfig::UNIX_COMPRESS, Vec::new(), Some(limit as u64)).unwrap();
        for chunk in WORDS_Z.chunks(100) {
            assert!(dec.bytes_written() <= limit as u64);
            if dec.feed(chunk).unwrap() == DecodeStatus::Done {
                break;
            }
        }
        assert_eq!(dec.finish().unwrap(), limit as u64);
        assert_eq!(dec.into_sink(), &WORDS[..limit]);
    }
}

#[test]
fn test_expected_len_longer_than_stream() {
    let expected = Some(WORDS.len() as u64 + 100);
    let out = decompress(WORDS_Z, LzwConfig::UNIX_COMPRESS, expected).unwrap();
    assert_eq!(out, WORDS);
}

#[test]
fn test_done_ignores_further_input() {
    let mut dec = LzwDecoder::new(LzwConfig::ZIP_SHRINK, Vec::new(), Some(10)).unwrap();
    assert_eq!(dec.feed(WORDS_SHR).unwrap(), DecodeStatus::Done);
    let consumed = dec.bytes_consumed();
    assert_eq!(dec.feed(b"garbage").unwrap(), DecodeStatus::Done);
    assert_eq!(dec.bytes_consumed(), consumed);
    dec.finish().unwrap();
    assert_eq!(dec.state(), DecoderState::Done);
    assert_eq!(dec.into_sink(), &WORDS[..10]);
}

/// Accepts a fixed number of bytes, then reports short writes.
struct Quota {
    data: Vec<u8>,
    room: usize,
}

impl ByteSink for Quota {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.room);
        self.data.extend_from_slice(&buf[..n]);
        self.room -= n;
        Ok(n)
    }
}

struct Broken;

impl ByteSink for Broken {
    fn write_chunk(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk on fire"))
    }
}

#[test]
fn test_short_write_is_a_sink_error() {
    let sink = Quota {
        data: Vec::new(),
        room: 3000,
    };
    let mut dec = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, sink, None).unwrap();
    let err = dec.decode_all(WORDS_Z).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sink);
    assert_eq!(dec.bytes_written(), 3000);

    // Sticky: the same error comes back
    assert_eq!(dec.feed(&[0]).unwrap_err(), err);
    let sink = dec.into_sink();
    assert_eq!(sink.data, &WORDS[..3000]);
}

#[test]
fn test_failing_sink_on_finish() {
    // Small output stays staged until finish
    let mut dec = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, Broken, None).unwrap();
    dec.feed(&[0x1f, 0x9d, 0x90, 0x41, 0x82, 0x00]).unwrap();
    let err = dec.finish().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sink);
    assert!(err.message().contains("disk on fire"));
    assert_eq!(dec.state(), DecoderState::Failed);
}

#[test]
fn test_errors_are_sticky() {
    let mut input = vec![0x1f, 0x9d, 0x90];
    input.extend(pack(&[(97, 9), (300, 9)]));

    let mut dec = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, Vec::new(), None).unwrap();
    let first = dec.feed(&input).unwrap_err();
    assert_eq!(first.kind(), ErrorKind::Protocol);

    let again = dec.feed(&pack(&[(97, 9)])).unwrap_err();
    assert_eq!(again, first);
    assert_eq!(dec.finish().unwrap_err(), first);
    assert!(dec.is_finished());
}

#[test]
fn test_decompress_to_writer() {
    let mut out = Vec::new();
    let expected = Some(WORDS.len() as u64);
    let n = decompress_to_writer(WORDS_SHR, LzwConfig::ZIP_SHRINK, expected, &mut out).unwrap();
    assert_eq!(n, WORDS.len() as u64);
    assert_eq!(out, WORDS);
}

#[test]
fn test_decompress_range_in_container() {
    let mut container = vec![0xaa; 777];
    container.extend_from_slice(WORDS_Z);
    container.extend_from_slice(&[0x55; 333]);

    let mut out = Vec::new();
    let n = decompress_range(
        &mut Cursor::new(&container),
        777,
        WORDS_Z.len() as u64,
        LzwConfig::UNIX_COMPRESS,
        &mut out,
        None,
    )
    .unwrap();
    assert_eq!(n, WORDS.len() as u64);
    assert_eq!(out, WORDS);
}

/// Counts how many bytes were pulled through it.
struct Counting<R> {
    inner: R,
    read: usize,
}

impl<R: Read> Read for Counting<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n;
        Ok(n)
    }
}

#[test]
fn test_decode_from_stops_at_expected_len() {
    let original = sample_text(31, 8000);
    let compressed = compress_unix(&original, 16, None);
    assert!(compressed.len() > 3 * 4096);

    let mut reader = Counting {
        inner: Cursor::new(&compressed),
        read: 0,
    };
    let mut dec = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, Vec::new(), Some(100)).unwrap();
    assert_eq!(dec.decode_from(&mut reader, None).unwrap(), 100);
    assert_eq!(reader.read, 4096);
    assert_eq!(dec.into_sink(), &original[..100]);
}

#[test]
fn test_random_input_never_panics() {
    let mut rng = Lcg::new(42);
    let configs = [
        LzwConfig::UNIX_COMPRESS,
        LzwConfig::unix_compress_raw(9, false),
        LzwConfig::unix_compress_raw(12, true),
        LzwConfig::unix_compress_raw(16, true),
        LzwConfig::ZIP_SHRINK,
    ];
    for round in 0..400 {
        let config = configs[round % configs.len()];
        let mut input = Vec::new();
        if config == LzwConfig::UNIX_COMPRESS {
            input.extend_from_slice(&[0x1f, 0x9d, 0x89 + (round % 8) as u8]);
        }
        let len = 1 + rng.below(3000);
        input.extend(rng.bytes(len));

        let mut dec = LzwDecoder::new(config, Vec::new(), Some(1 << 20)).unwrap();
        let _ = dec.decode_all(&input);
        assert!(dec.bytes_written() <= 1 << 20);
        if let Some(table) = dec.table() {
            assert!(table.highest_code_ever_used() < table.capacity());
        }
    }
}

#[test]
fn test_mutated_streams_never_panic() {
    let mut rng = Lcg::new(7);
    let cases = [
        (LzwConfig::UNIX_COMPRESS, WORDS_Z),
        (LzwConfig::UNIX_COMPRESS, WORDS_CLEAR12_Z),
        (LzwConfig::ZIP_SHRINK, WORDS_SHR),
    ];
    for round in 0..300 {
        let (config, clean) = cases[round % cases.len()];
        let mut input = clean.to_vec();
        for _ in 0..1 + rng.below(4) {
            let pos = rng.below(input.len());
            input[pos] ^= 1 << rng.below(8);
        }

        match decompress(&input, config, Some(WORDS.len() as u64)) {
            Ok(out) => assert!(out.len() <= WORDS.len()),
            Err(err) => assert!(matches!(
                err.kind(),
                ErrorKind::Format | ErrorKind::Protocol
            )),
        }
    }
}

#[test]
fn test_kwk_sequences_fuzz() {
    // Codes drawn around the next free slot exercise the KwK path hard
    let mut rng = Lcg::new(99);
    for _ in 0..200 {
        let first = rng.below(256) as u16;
        let mut codes = vec![(first, 9u8)];
        for i in 0..200u16 {
            let next_slot = 257 + i;
            let code = match rng.below(4) {
                0 => rng.below(256) as u16,
                1 => next_slot,
                2 => next_slot.saturating_sub(rng.below(5) as u16),
                _ => next_slot + rng.below(3) as u16,
            };
            codes.push((code.min(511), 9));
        }
        let input = pack(&codes);
        for config in [LzwConfig::unix_compress_raw(9, true), LzwConfig::ZIP_SHRINK] {
            if let Err(err) = decompress(&input, config, None) {
                assert_eq!(err.kind(), ErrorKind::Protocol);
            }
        }
    }
}
