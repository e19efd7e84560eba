use super::error::EnvelopeError;
use super::header::{ContentType, MessageHeader};
use super::keys::ContentCipher;
use super::wire::WireReader;

const FRAME_CONTENT: &[u8] = b"AWSKMSEncryptionClient Frame";
const FINAL_FRAME_CONTENT: &[u8] = b"AWSKMSEncryptionClient Final Frame";
const SINGLE_BLOCK_CONTENT: &[u8] = b"AWSKMSEncryptionClient Single Block";
const FINAL_FRAME_MARKER: u32 = u32::MAX;

fn body_aad(message_id: &[u8], content: &[u8], sequence_number: u32, length: u64) -> Vec<u8> {
    let mut aad = Vec::with_capacity(message_id.len() + content.len() + 12);
    aad.extend_from_slice(message_id);
    aad.extend_from_slice(content);
    aad.extend_from_slice(&sequence_number.to_be_bytes());
    aad.extend_from_slice(&length.to_be_bytes());
    aad
}

fn frame_iv(sequence_number: u32, iv_length: usize) -> Vec<u8> {
    let mut iv = vec![0u8; iv_length];
    iv[iv_length - 4..].copy_from_slice(&sequence_number.to_be_bytes());
    iv
}

pub(crate) fn decrypt_body(
    reader: &mut WireReader<'_>,
    header: &MessageHeader,
    cipher: &ContentCipher,
) -> Result<Vec<u8>, EnvelopeError> {
    match header.content_type {
        ContentType::NonFramed => decrypt_single_block(reader, header, cipher),
        ContentType::Framed => decrypt_frames(reader, header, cipher),
    }
}

fn decrypt_single_block(
    reader: &mut WireReader<'_>,
    header: &MessageHeader,
    cipher: &ContentCipher,
) -> Result<Vec<u8>, EnvelopeError> {
    let suite = header.suite;
    let iv = reader.take(suite.iv_length(), "body iv")?;
    let length = reader.u64("body content length")?;
    let content_len = usize::try_from(length)
        .map_err(|_| EnvelopeError::MalformedBody("content length overflows usize".to_string()))?;
    let ciphertext = reader.take(content_len, "body content")?;
    let tag = reader.take(suite.tag_length(), "body authentication tag")?;

    let aad = body_aad(&header.message_id, SINGLE_BLOCK_CONTENT, 1, length);
    cipher
        .open(iv, &aad, ciphertext, tag)
        .ok_or(EnvelopeError::BodyAuthentication(1))
}

fn decrypt_frames(
    reader: &mut WireReader<'_>,
    header: &MessageHeader,
    cipher: &ContentCipher,
) -> Result<Vec<u8>, EnvelopeError> {
    let suite = header.suite;
    let frame_length = header.frame_length as usize;
    let mut plaintext = Vec::new();
    let mut expected = 1u32;

    loop {
        let marker = reader.u32("frame sequence number")?;
        let is_final = marker == FINAL_FRAME_MARKER;
        let sequence_number = if is_final {
            reader.u32("final frame sequence number")?
        } else {
            marker
        };
        if sequence_number != expected {
            return Err(EnvelopeError::MalformedBody(format!(
                "frame {sequence_number} arrived where frame {expected} was expected"
            )));
        }

        let iv = reader.take(suite.iv_length(), "frame iv")?;
        let content_len = if is_final {
            let declared = reader.u32("final frame content length")? as usize;
            if declared > frame_length {
                return Err(EnvelopeError::MalformedBody(format!(
                    "final frame holds {declared} bytes, more than the frame length {frame_length}"
                )));
            }
            declared
        } else {
            frame_length
        };
        let ciphertext = reader.take(content_len, "frame content")?;
        let tag = reader.take(suite.tag_length(), "frame authentication tag")?;

        let content = if is_final {
            FINAL_FRAME_CONTENT
        } else {
            FRAME_CONTENT
        };
        let aad = body_aad(
            &header.message_id,
            content,
            sequence_number,
            content_len as u64,
        );
        let frame = cipher
            .open(iv, &aad, ciphertext, tag)
            .ok_or(EnvelopeError::BodyAuthentication(sequence_number))?;
        plaintext.extend_from_slice(&frame);

        if is_final {
            return Ok(plaintext);
        }
        expected = match expected.checked_add(1) {
            Some(next) if next != FINAL_FRAME_MARKER => next,
            _ => {
                return Err(EnvelopeError::MalformedBody(
                    "message exceeds the maximum frame count".to_string(),
                ))
            }
        };
    }
}

/// Appends the framed body for `plaintext`; the final frame carries the remainder.
pub(crate) fn encrypt_frames(
    out: &mut Vec<u8>,
    header: &MessageHeader,
    cipher: &ContentCipher,
    plaintext: &[u8],
) -> Result<(), EnvelopeError> {
    let suite = header.suite;
    let frame_length = header.frame_length as usize;
    let full_frames = plaintext.len() / frame_length;
    if full_frames >= (FINAL_FRAME_MARKER - 1) as usize {
        return Err(EnvelopeError::Encryption(
            "plaintext needs more frames than the format allows".to_string(),
        ));
    }

    for index in 0..full_frames {
        let sequence_number = index as u32 + 1;
        let chunk = &plaintext[index * frame_length..(index + 1) * frame_length];
        let iv = frame_iv(sequence_number, suite.iv_length());
        let aad = body_aad(
            &header.message_id,
            FRAME_CONTENT,
            sequence_number,
            chunk.len() as u64,
        );
        let (ciphertext, tag) = cipher.seal(&iv, &aad, chunk, suite.tag_length())?;
        out.extend_from_slice(&sequence_number.to_be_bytes());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        out.extend_from_slice(&tag);
    }

    let sequence_number = full_frames as u32 + 1;
    let remainder = &plaintext[full_frames * frame_length..];
    let iv = frame_iv(sequence_number, suite.iv_length());
    let aad = body_aad(
        &header.message_id,
        FINAL_FRAME_CONTENT,
        sequence_number,
        remainder.len() as u64,
    );
    let (ciphertext, tag) = cipher.seal(&iv, &aad, remainder, suite.tag_length())?;
    out.extend_from_slice(&FINAL_FRAME_MARKER.to_be_bytes());
    out.extend_from_slice(&sequence_number.to_be_bytes());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&(remainder.len() as u32).to_be_bytes());
    out.extend_from_slice(&ciphertext);
    out.extend_from_slice(&tag);
    Ok(())
}

pub(crate) fn encrypt_single_block(
    out: &mut Vec<u8>,
    header: &MessageHeader,
    cipher: &ContentCipher,
    plaintext: &[u8],
) -> Result<(), EnvelopeError> {
    let suite = header.suite;
    let iv = frame_iv(1, suite.iv_length());
    let length = plaintext.len() as u64;
    let aad = body_aad(&header.message_id, SINGLE_BLOCK_CONTENT, 1, length);
    let (ciphertext, tag) = cipher.seal(&iv, &aad, plaintext, suite.tag_length())?;
    out.extend_from_slice(&iv);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&ciphertext);
    out.extend_from_slice(&tag);
    Ok(())
}
