//! PCM/WAVE encoding
//!
//! Serializes a rendered buffer into a RIFF/WAVE byte stream: 44-byte
//! header followed by interleaved little-endian PCM at 16- or 24-bit
//! depth. Pure function of (buffer, bit depth); no resampling, no
//! filtering, no I/O.

use stanza_core::{BitDepth, SampleBuffer};

/// WAVE format tag for linear PCM
const FORMAT_PCM: u16 = 1;

/// Encode a buffer as a complete RIFF/WAVE byte stream
///
/// Quantization: clamp to [-1, 1], scale by 2^(bits-1) - 1, round to the
/// nearest integer, store little-endian and channel-interleaved.
pub fn encode_wav(buffer: &SampleBuffer, bit_depth: BitDepth) -> Vec<u8> {
    let channels = buffer.channels();
    let sample_rate = buffer.sample_rate().as_hz();
    let bytes_per_sample = u32::from(bit_depth.bytes());
    let block_align = channels * bit_depth.bytes();
    let byte_rate = sample_rate * u32::from(channels) * bytes_per_sample;
    let data_len = buffer.len() as u32 * bytes_per_sample;

    let mut out = Vec::with_capacity(44 + data_len as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bit_depth.bits().to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    let scale = bit_depth.max_amplitude();
    match bit_depth {
        BitDepth::Sixteen => {
            for &sample in buffer.samples() {
                let value = (sample.clamp(-1.0, 1.0) * scale).round() as i16;
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        BitDepth::TwentyFour => {
            for &sample in buffer.samples() {
                let value = (sample.clamp(-1.0, 1.0) * scale).round() as i32;
                out.extend_from_slice(&value.to_le_bytes()[..3]);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::SampleRate;

    fn test_buffer(samples: Vec<f32>, channels: u16) -> SampleBuffer {
        SampleBuffer::new(samples, channels, SampleRate::new(44_100)).unwrap()
    }

    #[test]
    fn header_layout_16_bit() {
        let buffer = test_buffer(vec![0.0; 8], 2);
        let bytes = encode_wav(&buffer, BitDepth::Sixteen);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(bytes.len(), 44 + 8 * 2);

        // Format tag, channels, sample rate
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 2);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            44_100
        );
        // Block align = channels * bytes per sample
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 4);
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16);
        // Data chunk size
        assert_eq!(
            u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
            16
        );
    }

    #[test]
    fn header_layout_24_bit() {
        let buffer = test_buffer(vec![0.0; 4], 1);
        let bytes = encode_wav(&buffer, BitDepth::TwentyFour);
        assert_eq!(bytes.len(), 44 + 4 * 3);
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 3); // block align
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 24);
    }

    #[test]
    fn full_scale_quantization() {
        let buffer = test_buffer(vec![1.0, -1.0], 2);
        let bytes = encode_wav(&buffer, BitDepth::Sixteen);
        let first = i16::from_le_bytes([bytes[44], bytes[45]]);
        let second = i16::from_le_bytes([bytes[46], bytes[47]]);
        assert_eq!(first, 32_767);
        assert_eq!(second, -32_767);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let buffer = test_buffer(vec![2.0, -3.0], 2);
        let bytes = encode_wav(&buffer, BitDepth::Sixteen);
        assert_eq!(i16::from_le_bytes([bytes[44], bytes[45]]), 32_767);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), -32_767);
    }

    #[test]
    fn rounding_is_nearest() {
        // 0.5 * 32767 = 16383.5 -> rounds to 16384
        let buffer = test_buffer(vec![0.5, 0.5], 2);
        let bytes = encode_wav(&buffer, BitDepth::Sixteen);
        assert_eq!(i16::from_le_bytes([bytes[44], bytes[45]]), 16_384);
    }

    #[test]
    fn twenty_four_bit_sample_encoding() {
        let buffer = test_buffer(vec![0.5], 1);
        let bytes = encode_wav(&buffer, BitDepth::TwentyFour);
        let value =
            i32::from_le_bytes([bytes[44], bytes[45], bytes[46], 0]) << 8 >> 8;
        let expected = (0.5_f32 * 8_388_607.0).round() as i32;
        assert_eq!(value, expected);
    }

    #[test]
    fn encoder_is_pure() {
        let buffer = test_buffer(vec![0.1, -0.2, 0.3, -0.4], 2);
        let a = encode_wav(&buffer, BitDepth::Sixteen);
        let b = encode_wav(&buffer, BitDepth::Sixteen);
        assert_eq!(a, b);
    }
}
