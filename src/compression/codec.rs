use crate::compression::vbyte::{VByteCursor, VByteEncoder};
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::posting::{Posting, PostingLayout};

/// Gap + VByte encoding of one posting list.
///
/// Per posting: id gap, tf, one tf per field, then block count and block gaps.
/// Ids and block ids must be strictly increasing.
pub struct PostingCodec;

impl PostingCodec {
    pub fn encode(postings: &[Posting], layout: &PostingLayout, output: &mut Vec<u8>) -> Result<()> {
        let mut previous: Option<u32> = None;

        for posting in postings {
            let gap = match previous {
                None => posting.id,
                Some(prev) if posting.id > prev => posting.id - prev - 1,
                Some(prev) => {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("posting ids not increasing: {} after {}", posting.id, prev),
                    ));
                }
            };
            previous = Some(posting.id);

            VByteEncoder::encode_u32(output, gap);
            VByteEncoder::encode_u32(output, posting.tf);

            if layout.has_fields() {
                if posting.field_tfs.len() != layout.field_count {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("posting {} has {} field tfs, layout has {}", posting.id, posting.field_tfs.len(), layout.field_count),
                    ));
                }
                for &field_tf in &posting.field_tfs {
                    VByteEncoder::encode_u32(output, field_tf);
                }
            }

            if layout.blocks {
                Self::encode_blocks(&posting.blocks, output)?;
            }
        }

        Ok(())
    }

    fn encode_blocks(blocks: &[u32], output: &mut Vec<u8>) -> Result<()> {
        VByteEncoder::encode_u32(output, blocks.len() as u32);
        let mut previous: Option<u32> = None;
        for &block in blocks {
            let gap = match previous {
                None => block,
                Some(prev) if block > prev => block - prev - 1,
                Some(prev) => {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("block ids not increasing: {} after {}", block, prev),
                    ));
                }
            };
            VByteEncoder::encode_u32(output, gap);
            previous = Some(block);
        }
        Ok(())
    }

    /// Decode `count` postings, returning them with the number of bytes consumed
    pub fn decode(data: &[u8], count: u32, layout: &PostingLayout) -> Result<(Vec<Posting>, usize)> {
        let mut cursor = VByteCursor::new(data);
        let mut postings = Vec::with_capacity(count as usize);
        let mut previous: Option<u32> = None;

        for _ in 0..count {
            let gap = cursor.next_u32()?;
            let id = match previous {
                None => gap,
                Some(prev) => prev
                    .checked_add(gap)
                    .and_then(|v| v.checked_add(1))
                    .ok_or_else(|| Error::new(ErrorKind::Corrupt, "posting id overflow".to_string()))?,
            };
            previous = Some(id);

            let tf = cursor.next_u32()?;
            let mut field_tfs = Vec::with_capacity(layout.field_count);
            for _ in 0..layout.field_count {
                field_tfs.push(cursor.next_u32()?);
            }

            let mut blocks = Vec::new();
            if layout.blocks {
                let block_count = cursor.next_u32()?;
                blocks.reserve(block_count as usize);
                let mut prev_block: Option<u32> = None;
                for _ in 0..block_count {
                    let gap = cursor.next_u32()?;
                    let block = match prev_block {
                        None => gap,
                        Some(prev) => prev
                            .checked_add(gap)
                            .and_then(|v| v.checked_add(1))
                            .ok_or_else(|| Error::new(ErrorKind::Corrupt, "block id overflow".to_string()))?,
                    };
                    blocks.push(block);
                    prev_block = Some(block);
                }
            }

            postings.push(Posting { id, tf, field_tfs, blocks });
        }

        Ok((postings, cursor.position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_keep_small_ids_small() {
        let postings = vec![Posting::new(3, 1), Posting::new(4, 2), Posting::new(200, 1)];
        let mut out = Vec::new();
        PostingCodec::encode(&postings, &PostingLayout::default(), &mut out).unwrap();
        // 3,1 | 0,2 | 195,1 -> the last gap needs two bytes
        assert_eq!(out.len(), 7);

        let (decoded, consumed) = PostingCodec::decode(&out, 3, &PostingLayout::default()).unwrap();
        assert_eq!(decoded, postings);
        assert_eq!(consumed, out.len());
    }

    #[test]
    fn test_fields_and_blocks_survive() {
        let layout = PostingLayout::new(2, true);
        let postings = vec![
            Posting { id: 0, tf: 3, field_tfs: vec![1, 2], blocks: vec![0, 4, 5] },
            Posting { id: 9, tf: 1, field_tfs: vec![0, 1], blocks: vec![7] },
        ];
        let mut out = Vec::new();
        PostingCodec::encode(&postings, &layout, &mut out).unwrap();
        let (decoded, _) = PostingCodec::decode(&out, 2, &layout).unwrap();
        assert_eq!(decoded, postings);
    }

    #[test]
    fn test_rejects_unsorted_ids() {
        let postings = vec![Posting::new(5, 1), Posting::new(5, 1)];
        let err = PostingCodec::encode(&postings, &PostingLayout::default(), &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_rejects_wrong_field_arity() {
        let layout = PostingLayout::new(3, false);
        let postings = vec![Posting { id: 1, tf: 1, field_tfs: vec![1], blocks: Vec::new() }];
        assert!(PostingCodec::encode(&postings, &layout, &mut Vec::new()).is_err());
    }
}
