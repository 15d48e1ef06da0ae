//! Position swap handshake.
//!
//! The server keeps no conversation state: everything the handshake needs
//! travels inside `xp` callback tokens.
//!
//! 1. Proposal list: `xp {d.i}` lists the other members of the queue.
//! 2. Proposal: `xp {u=target, d={i, p=requester position}}`, pressed by the
//!    requester. The bot sends the target Accept/Decline buttons.
//! 3. Resolution: `xp {u=requester, d={i, p}, a=true|false}`, pressed by the
//!    target. The requester's position at proposal time (`p`) doubles as the
//!    freshness check: if it moved, the proposal is stale.

use crate::{
    callback::{codes, CallbackToken},
    domain::{QueueId, UserId},
};

/// Which step of the handshake a `xp` token drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapStage {
    /// Show the list of members to pick from.
    PickTarget,
    /// The requester picked `target`, claiming to stand at `source_position`.
    Propose {
        target: UserId,
        source_position: u32,
    },
    /// The target answered a proposal from `requester`.
    Answer {
        requester: UserId,
        source_position: u32,
        accepted: bool,
    },
}

impl SwapStage {
    /// Classify a `xp` token. `None` means the token lacks fields its stage needs.
    pub fn from_token(token: &CallbackToken) -> Option<Self> {
        let position = token.position();
        match (token.user_id, position, token.agreement) {
            (None, _, None) => Some(SwapStage::PickTarget),
            (Some(target), Some(source_position), None) => Some(SwapStage::Propose {
                target,
                source_position,
            }),
            (Some(requester), Some(source_position), Some(accepted)) => Some(SwapStage::Answer {
                requester,
                source_position,
                accepted,
            }),
            _ => None,
        }
    }
}

pub fn pick_target_token(queue_id: QueueId) -> CallbackToken {
    CallbackToken::new(codes::EXCHANGE_POSITIONS).with_queue(queue_id)
}

pub fn proposal_token(queue_id: QueueId, target: UserId, source_position: u32) -> CallbackToken {
    CallbackToken::new(codes::EXCHANGE_POSITIONS)
        .with_user(target)
        .with_queue(queue_id)
        .with_position(source_position)
}

/// Accept/Decline token sent to the target. `u` now names the requester: the
/// target is whoever presses the button.
pub fn answer_token(
    queue_id: QueueId,
    requester: UserId,
    source_position: u32,
    accepted: bool,
) -> CallbackToken {
    CallbackToken::new(codes::EXCHANGE_POSITIONS)
        .with_user(requester)
        .with_queue(queue_id)
        .with_position(source_position)
        .with_agreement(accepted)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapResolution {
    /// Both still in place: the requester moves to `target_position`, the
    /// target to `requester_position`.
    Swap {
        requester_position: u32,
        target_position: u32,
    },
    /// The requester moved since the proposal was made.
    Stale { current: u32 },
    RequesterLeft,
    TargetLeft,
}

/// Decide the outcome of an accepted proposal from freshly read positions.
pub fn resolve(
    source_position: u32,
    requester_current: Option<u32>,
    target_current: Option<u32>,
) -> SwapResolution {
    let Some(requester_position) = requester_current else {
        return SwapResolution::RequesterLeft;
    };
    if requester_position != source_position {
        return SwapResolution::Stale {
            current: requester_position,
        };
    }
    let Some(target_position) = target_current else {
        return SwapResolution::TargetLeft;
    };
    SwapResolution::Swap {
        requester_position,
        target_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_requester_swaps() {
        assert_eq!(
            resolve(2, Some(2), Some(7)),
            SwapResolution::Swap {
                requester_position: 2,
                target_position: 7
            }
        );
    }

    #[test]
    fn moved_requester_is_stale() {
        assert_eq!(resolve(2, Some(5), Some(7)), SwapResolution::Stale { current: 5 });
    }

    #[test]
    fn departures_abort() {
        assert_eq!(resolve(2, None, Some(7)), SwapResolution::RequesterLeft);
        assert_eq!(resolve(2, Some(2), None), SwapResolution::TargetLeft);
    }

    #[test]
    fn stages_follow_token_fields() {
        let q = QueueId(4);
        assert_eq!(
            SwapStage::from_token(&pick_target_token(q)),
            Some(SwapStage::PickTarget)
        );
        assert_eq!(
            SwapStage::from_token(&pick_target_token(q).with_page(2)),
            Some(SwapStage::PickTarget)
        );
        assert_eq!(
            SwapStage::from_token(&proposal_token(q, UserId(8), 3)),
            Some(SwapStage::Propose {
                target: UserId(8),
                source_position: 3
            })
        );
        assert_eq!(
            SwapStage::from_token(&answer_token(q, UserId(5), 3, false)),
            Some(SwapStage::Answer {
                requester: UserId(5),
                source_position: 3,
                accepted: false
            })
        );
        let missing_position = CallbackToken::new(codes::EXCHANGE_POSITIONS)
            .with_queue(q)
            .with_user(UserId(8));
        assert_eq!(SwapStage::from_token(&missing_position), None);
    }

    #[test]
    fn answer_tokens_fit_a_button() {
        let t = answer_token(QueueId(i64::from(i32::MAX)), UserId(9_999_999_999), 100, true);
        assert!(t.fits_button());
    }
}
