// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Cursor;

use proptest::prelude::*;

use super::*;
use crate::test_support::{ChunkReader, TrickleWriter};

const MAX: usize = 1024;

#[test]
fn encode_layout() -> anyhow::Result<()> {
    let bytes = encode(Param::Cmd, b"ls -la", MAX)?;
    assert_eq!(&bytes[..4], &12u32.to_be_bytes());
    assert_eq!(&bytes[4..], b"cmd:ls -la\x17\x17");
    Ok(())
}

#[test]
fn value_may_contain_separator_and_single_etb() -> anyhow::Result<()> {
    let bytes = encode(Param::Pwd, b"/a:b\x17c", MAX)?;
    let frame = decode(&bytes[HEADER_LEN..])?;
    assert_eq!(frame.param, Param::Pwd);
    assert_eq!(frame.value.as_ref(), b"/a:b\x17c");
    Ok(())
}

#[test]
fn empty_value() -> anyhow::Result<()> {
    let frame = decode(b"status:\x17\x17")?;
    assert_eq!(frame, Frame::new(Param::Status, ""));
    Ok(())
}

#[test]
fn unterminated_payload() {
    let err = decode(b"cmd:ls\x17").err();
    assert!(matches!(err, Some(ProtocolError::Unterminated { len: 7 })));
}

#[test]
fn missing_separator() {
    let err = decode(b"cmd\x17\x17").err();
    assert!(matches!(err, Some(ProtocolError::BadSeparator)));
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Malformed));
}

#[test]
fn unknown_parameter_is_desync() {
    let err = decode(b"colour:red\x17\x17").err();
    assert!(matches!(&err, Some(ProtocolError::UnknownParam(name)) if name == "colour"));
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Desync));
}

#[test]
fn oversized_frames_are_refused_both_ways() {
    let value = vec![b'x'; MAX];
    assert!(matches!(
        encode(Param::VgexpandData, &value, MAX),
        Err(ProtocolError::TooLarge { max: MAX, .. })
    ));

    let mut stream = Cursor::new((MAX as u32 + 1).to_be_bytes().to_vec());
    assert!(matches!(
        read_frame(&mut stream, MAX),
        Err(ProtocolError::TooLarge { len, max: MAX }) if len == MAX + 1
    ));
}

#[test]
fn closed_stream_reads_as_eof() -> anyhow::Result<()> {
    assert!(read_frame(&mut Cursor::new(Vec::new()), MAX)?.is_eof());

    let mut truncated = encode(Param::Cmd, b"make", MAX)?.to_vec();
    truncated.truncate(truncated.len() - 3);
    assert!(read_frame(&mut Cursor::new(truncated), MAX)?.is_eof());

    assert!(read_frame(&mut Cursor::new(vec![0, 0]), MAX)?.is_eof());
    Ok(())
}

#[test]
fn frames_survive_byte_at_a_time_delivery() -> anyhow::Result<()> {
    let mut w = TrickleWriter::new(1);
    write_frame(&mut w, Param::File, b"/tmp/a b", MAX)?;
    write_frame(&mut w, Param::Order, b"up", MAX)?;

    let chunks: Vec<[u8; 1]> = w.written.iter().map(|b| [*b]).collect();
    let mut r = ChunkReader::new(chunks);
    assert_eq!(read_frame(&mut r, MAX)?, Frame::new(Param::File, "/tmp/a b"));
    assert_eq!(read_frame(&mut r, MAX)?, Frame::new(Param::Order, "up"));
    assert!(read_frame(&mut r, MAX)?.is_eof());
    assert!(r.is_drained());
    Ok(())
}

#[test]
fn vectored_write_matches_encode() -> anyhow::Result<()> {
    let mut w = TrickleWriter::new(5);
    write_frame(&mut w, Param::DevelopingMask, b"*.rs", MAX)?;
    assert_eq!(w.written, encode(Param::DevelopingMask, b"*.rs", MAX)?.to_vec());
    Ok(())
}

#[test]
fn channel_round_trip() -> anyhow::Result<()> {
    let mut chan = Channel::new(Cursor::new(Vec::new()), MAX);
    chan.send(Param::Pid, "4242")?;
    chan.send_frame(&Frame::new(Param::Status, "prompt"))?;

    let mut chan = Channel::new(Cursor::new(chan.get_ref().get_ref().clone()), MAX);
    assert_eq!(chan.recv()?, Frame::new(Param::Pid, "4242"));
    assert_eq!(chan.recv()?.value_str(), "prompt");
    assert!(chan.recv()?.is_eof());
    Ok(())
}

#[test]
fn param_names_parse() -> anyhow::Result<()> {
    for param in Param::ALL {
        assert_eq!(param.to_string().parse::<Param>()?, param);
    }
    crate::assert_err_contains!("colour".parse::<Param>(), "unknown parameter");
    Ok(())
}

proptest! {
    #[test]
    fn any_value_round_trips(
        index in 0..Param::ALL.len(),
        value in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let param = Param::ALL[index];
        let bytes = encode(param, &value, MAX).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let frame = read_frame(&mut Cursor::new(bytes.to_vec()), MAX)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(frame.param, param);
        prop_assert_eq!(frame.value.as_ref(), value.as_slice());
    }
}
