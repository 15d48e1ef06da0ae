//! Position allocation inside a queue.
//!
//! Positions are positive integers unique per queue. They are not required to
//! be contiguous, except right after [`compress`].

use std::collections::BTreeSet;

use crate::{
    domain::{Queue, QueueMember, UserId},
    errors::Rejection,
};

/// Smallest positive integer not in `occupied`.
pub fn first_available_position(occupied: &BTreeSet<u32>) -> u32 {
    let mut candidate = 1;
    for &p in occupied.range(1..) {
        if p != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}

pub fn is_reserved(occupied: &BTreeSet<u32>, position: u32) -> bool {
    occupied.contains(&position)
}

/// The first `count` free positions in ascending order, continuing past the
/// largest occupied position once the gaps run out.
pub fn available_positions(occupied: &BTreeSet<u32>, count: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(count.min(1024));
    let mut candidate = 1u32;
    while out.len() < count {
        if !occupied.contains(&candidate) {
            out.push(candidate);
        }
        candidate = match candidate.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    out
}

/// Renumber members at or after `starting_at` to consecutive positions from
/// `starting_at`, keeping their relative order. Members before `starting_at`
/// are untouched. Returns `true` if any position changed.
///
/// `members` is left sorted by position.
pub fn compress(members: &mut [QueueMember], starting_at: u32) -> bool {
    members.sort_by_key(|m| m.position);

    let mut changed = false;
    let mut next = starting_at.max(1);
    for m in members.iter_mut().filter(|m| m.position >= starting_at) {
        if m.position != next {
            m.position = next;
            changed = true;
        }
        next += 1;
    }
    changed
}

/// Decide where `user_id` lands when joining `queue`.
///
/// `requested` is an explicit position choice; `capacity` is the member limit
/// and also the largest position that may be requested.
pub fn plan_enqueue(
    queue: &Queue,
    user_id: UserId,
    requested: Option<u32>,
    capacity: usize,
) -> Result<u32, Rejection> {
    if queue.is_member(user_id) {
        return Err(Rejection::AlreadyParticipates);
    }
    if queue.members.len() >= capacity {
        return Err(Rejection::QueueFull(capacity));
    }

    let occupied = queue.occupied();
    let Some(position) = requested else {
        return Ok(first_available_position(&occupied));
    };

    if queue.is_dynamic {
        return Err(Rejection::DynamicQueuePosition);
    }
    if position == 0 || position as usize > capacity {
        return Err(Rejection::InvalidPosition(position));
    }
    if is_reserved(&occupied, position) {
        return Err(Rejection::PositionReserved(position));
    }
    Ok(position)
}
