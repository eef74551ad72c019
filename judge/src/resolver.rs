//! Problem resolver
//!
//! Turns whatever the user typed ("0", "abc100_a", "Birthday", "abc100")
//! into exactly one entry of the problem index:
//!
//! 1. a purely numeric key is a zero-based position; full-width digits
//!    count as digits
//! 2. an exact problem name
//! 3. otherwise a substring of any field in [`MATCH_FIELDS`]; this must
//!    single out one entry, else the candidates are reported back

use tracing::debug;

use crate::error::{Candidate, CandidateList, ProblemError, Result};
use crate::index::{IndexEntry, ProblemIndex};

type FieldExtractor = fn(&IndexEntry) -> &str;

/// Fields searched by substring matching
pub const MATCH_FIELDS: &[(&str, FieldExtractor)] = &[
    ("contest url", |e| e.contest.url.as_str()),
    ("contest name", |e| e.contest.name.as_str()),
    ("name", |e| e.name.as_str()),
    ("root dir", |e| e.root_dir.as_str()),
    ("title", |e| e.title.as_str()),
    ("url", |e| e.url.as_str()),
];

/// A resolved problem and its position in the index
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub position: usize,
    pub entry: &'a IndexEntry,
}

pub fn resolve<'a>(index: &'a ProblemIndex, key: &str) -> Result<Resolved<'a>> {
    if key.is_empty() {
        return Err(ProblemError::not_found("Empty problem key"));
    }

    if let Some(digits) = position_digits(key) {
        return by_position(index, &digits);
    }

    if let Some((position, entry)) = index.get(key) {
        debug!("Resolved {:?} by exact name", key);
        return Ok(Resolved { position, entry });
    }

    let candidates: Vec<(usize, &IndexEntry)> = index
        .iter()
        .filter(|(_, entry)| matches_key(entry, key))
        .collect();

    match candidates.as_slice() {
        [] => Err(ProblemError::not_found(format!(
            "Failed to find {} in the problem index",
            key
        ))),
        [(position, entry)] => {
            debug!("Resolved {:?} by substring to {}", key, entry.name);
            Ok(Resolved {
                position: *position,
                entry: *entry,
            })
        }
        many => Err(ProblemError::AmbiguousProblem {
            key: key.to_string(),
            candidates: CandidateList(
                many.iter()
                    .map(|(position, entry)| Candidate {
                        position: *position,
                        name: entry.name.clone(),
                        contest_url: entry.contest.url.clone(),
                    })
                    .collect(),
            ),
        }),
    }
}

/// ASCII form of a key made only of ASCII or full-width digits
fn position_digits(key: &str) -> Option<String> {
    key.chars()
        .map(|c| match c {
            '0'..='9' => Some(c),
            '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10),
            _ => None,
        })
        .collect()
}

fn by_position<'a>(index: &'a ProblemIndex, key: &str) -> Result<Resolved<'a>> {
    let out_of_range = || {
        ProblemError::not_found(format!(
            "No problem at index {} ({} problems available)",
            key,
            index.len()
        ))
    };
    let position: usize = key.parse().map_err(|_| out_of_range())?;
    let entry = index.get_index(position).ok_or_else(out_of_range)?;
    debug!("Resolved {:?} by position to {}", key, entry.name);
    Ok(Resolved { position, entry })
}

fn matches_key(entry: &IndexEntry, key: &str) -> bool {
    MATCH_FIELDS
        .iter()
        .any(|(_, field)| field(entry).contains(key))
}
