use crate::storage::{MediaRef, SessionRecord};

/// Append `media` to the end of the session's queue.
pub fn append(record: &mut SessionRecord, media: MediaRef) {
    record.media_queue.push(media);
}

/// Move the whole queue out of the session, leaving it empty.
#[must_use]
pub fn take(record: &mut SessionRecord) -> Vec<MediaRef> {
    std::mem::take(&mut record.media_queue)
}

/// Drop everything queued for the session.
pub fn clear(record: &mut SessionRecord) {
    record.media_queue.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_fresh_record() -> Result<(), serde_json::Error> {
        let mut record: SessionRecord = serde_json::from_str("{}")?;

        append(&mut record, MediaRef::photo("a"));
        assert_eq!(record.media_queue, vec![MediaRef::photo("a")]);

        append(&mut record, MediaRef::video("b"));
        assert_eq!(
            record.media_queue,
            vec![MediaRef::photo("a"), MediaRef::video("b")]
        );
        Ok(())
    }

    #[test]
    fn test_take_empties_queue() {
        let mut record = SessionRecord::default();
        append(&mut record, MediaRef::photo("a"));
        append(&mut record, MediaRef::photo("b"));

        let taken = take(&mut record);
        assert_eq!(taken.len(), 2);
        assert!(record.media_queue.is_empty());
        assert!(take(&mut record).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut record = SessionRecord::default();
        append(&mut record, MediaRef::video("a"));
        clear(&mut record);
        assert!(record.media_queue.is_empty());
    }
}
