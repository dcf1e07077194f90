use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{Error as MongoDriverError, ErrorKind, WriteFailure};
use threads_common::errors::ThreadsServerError;
use threads_common::models::Thread;

const DUPLICATE_KEY_CODE: i32 = 11000;

/**
 * Wrap a driver error with the fixed message of the action that failed
 *
 * @param action - human readable prefix, e.g. "Failed to fetch user"
 */
pub fn mongo_error(action: &'static str) -> impl Fn(MongoDriverError) -> ThreadsServerError {
    move |e| ThreadsServerError::MongoError(format!("{}: {}", action, e))
}

/// True when the write was rejected by a unique index
pub fn is_duplicate_key(error: &MongoDriverError) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, ThreadsServerError> {
    ObjectId::parse_str(id).map_err(|_| ThreadsServerError::InvalidObjectId(id.to_string()))
}

/**
 * Build the listing filter shared by user and community search
 * @dev the search string is not a regular expression: its metacharacters are escaped and it is
 * matched as a case-insensitive substring of username OR name, so `b.b` never matches `bob`
 *
 * @param search_string - raw text from the search bar (ignored when blank)
 * @param exclude_id - external id of a user to leave out of the results
 */
pub fn search_filter(search_string: &str, exclude_id: Option<&str>) -> Document {
    let mut filter = doc! {};
    if let Some(id) = exclude_id {
        filter.insert("id", doc! { "$ne": id });
    }
    let search = search_string.trim();
    if !search.is_empty() {
        let pattern = regex::escape(search);
        filter.insert(
            "$or",
            vec![
                doc! { "username": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    filter
}

/// Concatenate the reply ids of every thread, in order, duplicates kept
pub fn collect_reply_ids(threads: &[Thread]) -> Vec<ObjectId> {
    threads
        .iter()
        .flat_map(|thread| thread.children.iter().copied())
        .collect()
}

/// Filter matching top level threads only
pub fn top_level_filter() -> Document {
    doc! { "parent_id": { "$in": [null] } }
}
