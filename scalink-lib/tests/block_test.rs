use scalink_lib::Error;
use scalink_lib::scope::block::{
    BlockError, WaveformBlock, decode_samples, encode_block, encode_samples, framed_len,
};

#[test]
fn test_decode_word_samples() {
    // #18 then four little-endian words
    let raw = b"#18\x01\x00\xff\xff\x00\x80\xff\x7f\n";
    let samples = decode_samples(raw).unwrap();
    assert_eq!(samples, vec![1, -1, i16::MIN, i16::MAX]);
}

#[test]
fn test_sign_extension_of_high_bit() {
    let raw = b"#12\x01\x80";
    assert_eq!(decode_samples(raw).unwrap(), vec![-32767]);
}

#[test]
fn test_zero_length_payload_is_empty() {
    let raw = b"#10";
    assert_eq!(decode_samples(raw).unwrap(), Vec::<i16>::new());
}

#[test]
fn test_trailing_bytes_ignored() {
    let raw = b"#14\x02\x00\x03\x00\n\n";
    let block = WaveformBlock::parse(raw).unwrap();
    assert_eq!(block.header_digits, 1);
    assert_eq!(block.payload_len(), 4);
    assert_eq!(block.end, 7);
    assert_eq!(block.samples(), vec![2, 3]);
}

#[test]
fn test_multi_digit_header() {
    let samples: Vec<i16> = (0..600).map(|i| i as i16 - 300).collect();
    let raw = encode_samples(&samples);
    assert!(raw.starts_with(b"#41200"));
    assert_eq!(decode_samples(&raw).unwrap(), samples);
}

#[test]
fn test_missing_start_of_frame() {
    let err = WaveformBlock::parse(b"18abcdefgh").unwrap_err();
    assert_eq!(err, BlockError::MissingStart);
    assert!(matches!(decode_samples(b"no block here"), Err(Error::Frame(_))));
}

#[test]
fn test_truncated_payload() {
    let err = WaveformBlock::parse(b"#18\x01\x00\x02").unwrap_err();
    assert_eq!(
        err,
        BlockError::Incomplete {
            needed: Some(11),
            available: 6
        }
    );
    assert!(matches!(decode_samples(b"#18\x01\x00\x02"), Err(Error::Frame(_))));
}

#[test]
fn test_truncated_header() {
    assert_eq!(
        WaveformBlock::parse(b"#").unwrap_err(),
        BlockError::Incomplete {
            needed: None,
            available: 1
        }
    );
    assert_eq!(
        WaveformBlock::parse(b"#31").unwrap_err(),
        BlockError::Incomplete {
            needed: None,
            available: 3
        }
    );
}

#[test]
fn test_odd_payload_length() {
    assert_eq!(
        WaveformBlock::parse(b"#13\x01\x02\x03").unwrap_err(),
        BlockError::OddLength(3)
    );
}

#[test]
fn test_zero_digit_count_rejected() {
    assert_eq!(
        WaveformBlock::parse(b"#0").unwrap_err(),
        BlockError::InvalidDigitCount(b'0')
    );
    assert!(matches!(decode_samples(b"#x12"), Err(Error::Frame(_))));
}

#[test]
fn test_non_numeric_length() {
    assert_eq!(
        WaveformBlock::parse(b"#2a4\x00\x00").unwrap_err(),
        BlockError::InvalidLength(b"a4".to_vec())
    );
}

#[test]
fn test_framed_len_for_partial_reads() {
    let full = encode_block(&[0u8; 10]);
    assert_eq!(framed_len(&full), Ok(full.len()));
    assert!(matches!(
        framed_len(&full[..5]),
        Err(BlockError::Incomplete { .. })
    ));
    assert_eq!(framed_len(b"1\n"), Err(BlockError::MissingStart));
}

#[test]
fn test_any_even_payload_decodes_to_half_as_many_samples() {
    let lengths = [0usize, 2, 4, 8, 10, 98, 100, 998, 1000, 4096, 48800];
    for (i, &n) in lengths.iter().enumerate() {
        let payload: Vec<u8> = (0..n)
            .map(|j| (j.wrapping_mul(31) + i * 7 + (j >> 3)) as u8)
            .collect();
        let raw = encode_block(&payload);

        let block = WaveformBlock::parse(&raw).unwrap();
        assert_eq!(block.payload, &payload[..], "n = {}", n);
        assert_eq!(block.end, raw.len());

        let samples = decode_samples(&raw).unwrap();
        assert_eq!(samples.len(), n / 2, "n = {}", n);
        assert_eq!(encode_samples(&samples), raw, "n = {}", n);
    }
}

#[test]
fn test_single_digit_header_payload() {
    let raw = b"#16\xaa\xbb\x00\x01\xfe\xff";
    let samples = decode_samples(raw).unwrap();
    assert_eq!(samples.len(), 3);
    assert_eq!(samples, vec![i16::from_le_bytes([0xaa, 0xbb]), 256, -2]);
    assert_eq!(encode_samples(&samples), raw.to_vec());
}
