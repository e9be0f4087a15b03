//! Topic and channel name rules enforced by nsqd

use crate::nsq::{NsqError, NsqResult};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_NAME_LENGTH: usize = 64;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[.a-zA-Z0-9_-]+(#ephemeral)?$").expect("name pattern is a valid regex")
});

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LENGTH && NAME_PATTERN.is_match(name)
}

pub fn validate_topic(name: &str) -> NsqResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(NsqError::InvalidName {
            kind: "topic",
            name: name.to_string(),
        })
    }
}

pub fn validate_channel(name: &str) -> NsqResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(NsqError::InvalidName {
            kind: "channel",
            name: name.to_string(),
        })
    }
}
