//! User-facing text.
//!
//! Handlers only ever name a [`MessageKey`]; the [`TextProvider`] owns the
//! wording. Parameters are substituted into `{0}`, `{1}`, ... and must already
//! be HTML-escaped when they carry user input.

use crate::errors::Rejection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Help,
    HelpPrivate,

    // Failures
    Outdated,
    InternalError,
    OperatorInternalError,

    // Rejections
    QueueDeleted,
    ChatDeleted,
    QueueNotFound,
    QueueNameMissing,
    InvalidQueueName,
    QueueNameTooLong,
    QueueNameTaken,
    TooManyQueues,
    AlreadyParticipates,
    NotParticipating,
    PositionReserved,
    InvalidPosition,
    DynamicQueuePosition,
    QueueFull,
    NoRights,
    GroupOnly,
    SwapWithSelf,
    SwapStale,
    RequesterLeft,
    TargetLeft,
    TargetUnreachable,

    // Results
    QueueCreated,
    Enqueued,
    Dequeued,
    QueueRemoved,
    QueueNowDynamic,
    QueueNowStatic,

    // Views
    ChatsHeader,
    NoChats,
    ChatQueuesHeader,
    NoQueues,
    QueueHeader,
    QueueEmpty,
    QueueMemberLine,
    ModeDynamic,
    ModeStatic,
    ChoosePosition,
    ChooseSwapTarget,
    NoSwapTargets,
    ConfirmRemoveQueue,

    // Swap handshake
    SwapProposal,
    SwapProposalSent,
    SwapDone,
    SwapAcceptedRequester,
    SwapDeclinedTarget,
    SwapDeclinedRequester,

    // Buttons
    BtnMyChats,
    BtnBackToChats,
    BtnBackToChat,
    BtnBackToQueue,
    BtnEnqueueMe,
    BtnChoosePosition,
    BtnDequeueMe,
    BtnExchange,
    BtnMakeDynamic,
    BtnMakeStatic,
    BtnRemoveQueue,
    BtnRefresh,
    BtnAccept,
    BtnDecline,
    BtnYes,
    BtnNo,
    BtnNextPage,
    BtnPrevPage,
    BtnPosition,
}

pub trait TextProvider: Send + Sync {
    fn message(&self, key: MessageKey, params: &[&str]) -> String;
}

/// Substitute `{0}`, `{1}`, ... in `template` in a single pass; substituted
/// text is never scanned for placeholders again.
pub fn render(template: &str, params: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let param = after.find('}').and_then(|close| {
            let index = &after[..close];
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let p = params.get(index.parse::<usize>().ok()?)?;
            Some((p, close))
        });
        match param {
            Some((p, close)) => {
                out.push_str(p);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Bundled English wording.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishTexts;

impl EnglishTexts {
    fn template(key: MessageKey) -> &'static str {
        use MessageKey::*;
        match key {
            Help => "<b>Queue bot</b>\n\n\
/queue – queues of this chat\n\
/createqueue &lt;name&gt; – create a queue\n\
/enqueue &lt;name&gt; [position] – join a queue\n\
/dequeue &lt;name&gt; – leave a queue\n\
/removequeue &lt;name&gt; – delete a queue (creator or admin)",
            HelpPrivate => "<b>Queue bot</b>\n\nAdd me to a group and create queues there. \
Here you can browse the queues of the chats we share.",

            Outdated => "This message is outdated, please use a current button or command.",
            InternalError => "Something went wrong. Please try again later.",
            OperatorInternalError => "⚠️ Internal error while handling {0}: <code>{1}</code>",

            QueueDeleted => "This queue has been deleted.",
            ChatDeleted => "This chat is no longer available.",
            QueueNotFound => "Queue <b>{0}</b> does not exist.",
            QueueNameMissing => "Please specify a queue name.",
            InvalidQueueName => "A queue name must contain something besides digits.",
            QueueNameTooLong => "A queue name can be at most {0} characters long.",
            QueueNameTaken => "A queue with this name already exists.",
            TooManyQueues => "This chat already has the maximum of {0} queues.",
            AlreadyParticipates => "You already participate in this queue.",
            NotParticipating => "You do not participate in this queue.",
            PositionReserved => "Position {0} is already taken.",
            InvalidPosition => "Position {0} is not available.",
            DynamicQueuePosition => "Positions cannot be chosen in a dynamic queue.",
            QueueFull => "The queue is full ({0} members).",
            NoRights => "You lack the rights to do that.",
            GroupOnly => "This command works in group chats only.",
            SwapWithSelf => "You cannot exchange positions with yourself.",
            SwapStale => "The proposal is no longer valid: the requester is now at position {0}. Please make a new proposal.",
            RequesterLeft => "The requester has left the queue.",
            TargetLeft => "That member is no longer in the queue.",
            TargetUnreachable => "I cannot message that member. They need to start a private chat with me first.",

            QueueCreated => "Queue <b>{0}</b> created.",
            Enqueued => "You joined <b>{0}</b> at position {1}.",
            Dequeued => "You left <b>{0}</b>.",
            QueueRemoved => "Queue <b>{0}</b> removed.",
            QueueNowDynamic => "Queue <b>{0}</b> is now dynamic.",
            QueueNowStatic => "Queue <b>{0}</b> is no longer dynamic.",

            ChatsHeader => "<b>Your chats</b>",
            NoChats => "I have not seen you in any group yet.",
            ChatQueuesHeader => "<b>Queues of {0}</b>",
            NoQueues => "There are no queues yet. Create one with /createqueue.",
            QueueHeader => "<b>{0}</b> ({1})",
            QueueEmpty => "Nobody is in this queue yet.",
            QueueMemberLine => "{0}. {1}",
            ModeDynamic => "dynamic",
            ModeStatic => "fixed positions",
            ChoosePosition => "<b>{0}</b>: choose a position",
            ChooseSwapTarget => "<b>{0}</b>: you are at position {1}. Whom do you want to exchange positions with?",
            NoSwapTargets => "There is nobody to exchange positions with.",
            ConfirmRemoveQueue => "Really remove queue <b>{0}</b>?",

            SwapProposal => "{0} proposes to exchange positions in <b>{1}</b>: you would move from {3} to {2}.",
            SwapProposalSent => "Proposal sent to {0}.",
            SwapDone => "Done! Your position in <b>{0}</b> is now {1}.",
            SwapAcceptedRequester => "{0} accepted: your position in <b>{1}</b> is now {2}.",
            SwapDeclinedTarget => "You declined the proposal.",
            SwapDeclinedRequester => "{0} declined your proposal in <b>{1}</b>.",

            BtnMyChats => "📋 My chats",
            BtnBackToChats => "⬅️ Chats",
            BtnBackToChat => "⬅️ Queues",
            BtnBackToQueue => "⬅️ Queue",
            BtnEnqueueMe => "➕ Join",
            BtnChoosePosition => "🔢 Choose position",
            BtnDequeueMe => "➖ Leave",
            BtnExchange => "🔄 Exchange",
            BtnMakeDynamic => "Make dynamic",
            BtnMakeStatic => "Make fixed",
            BtnRemoveQueue => "🗑 Remove",
            BtnRefresh => "🔃 Refresh",
            BtnAccept => "✅ Accept",
            BtnDecline => "❌ Decline",
            BtnYes => "Yes",
            BtnNo => "No",
            BtnNextPage => "▶️",
            BtnPrevPage => "◀️",
            BtnPosition => "{0}",
        }
    }
}

impl TextProvider for EnglishTexts {
    fn message(&self, key: MessageKey, params: &[&str]) -> String {
        render(Self::template(key), params)
    }
}

impl Rejection {
    /// Message key plus parameters for the user-facing notice.
    pub fn message(&self) -> (MessageKey, Vec<String>) {
        use MessageKey as K;
        match self {
            Rejection::OutdatedCallback => (K::Outdated, vec![]),
            Rejection::QueueDeleted => (K::QueueDeleted, vec![]),
            Rejection::ChatDeleted => (K::ChatDeleted, vec![]),
            Rejection::QueueNotFound(name) => (
                K::QueueNotFound,
                vec![crate::formatting::escape_html(name)],
            ),
            Rejection::QueueNameMissing => (K::QueueNameMissing, vec![]),
            Rejection::InvalidQueueName => (K::InvalidQueueName, vec![]),
            Rejection::QueueNameTooLong(max) => (K::QueueNameTooLong, vec![max.to_string()]),
            Rejection::QueueNameTaken => (K::QueueNameTaken, vec![]),
            Rejection::TooManyQueues(max) => (K::TooManyQueues, vec![max.to_string()]),
            Rejection::AlreadyParticipates => (K::AlreadyParticipates, vec![]),
            Rejection::NotParticipating => (K::NotParticipating, vec![]),
            Rejection::PositionReserved(p) => (K::PositionReserved, vec![p.to_string()]),
            Rejection::InvalidPosition(p) => (K::InvalidPosition, vec![p.to_string()]),
            Rejection::DynamicQueuePosition => (K::DynamicQueuePosition, vec![]),
            Rejection::QueueFull(max) => (K::QueueFull, vec![max.to_string()]),
            Rejection::NoRights => (K::NoRights, vec![]),
            Rejection::GroupOnly => (K::GroupOnly, vec![]),
            Rejection::SwapWithSelf => (K::SwapWithSelf, vec![]),
            Rejection::SwapStale(current) => (K::SwapStale, vec![current.to_string()]),
            Rejection::RequesterLeft => (K::RequesterLeft, vec![]),
            Rejection::TargetLeft => (K::TargetLeft, vec![]),
            Rejection::TargetUnreachable => (K::TargetUnreachable, vec![]),
        }
    }

    pub fn render(&self, texts: &dyn TextProvider) -> String {
        let (key, params) = self.message();
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        texts.message(key, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_positional_params() {
        assert_eq!(render("{0} at {1}, again {0}", &["a", "2"]), "a at 2, again a");
        assert_eq!(render("no params", &[]), "no params");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        assert_eq!(
            EnglishTexts.message(MessageKey::Enqueued, &["{1}", "3"]),
            "You joined <b>{1}</b> at position 3."
        );
        assert_eq!(render("{0}{1}", &["{1}", "{0}"]), "{1}{0}");
        assert_eq!(render("{x} {} {5} {", &["a"]), "{x} {} {5} {");
    }

    #[test]
    fn rejection_renders_with_escaped_name() {
        let text = Rejection::QueueNotFound("<x>".to_string()).render(&EnglishTexts);
        assert_eq!(text, "Queue <b>&lt;x&gt;</b> does not exist.");
    }

    #[test]
    fn stale_swap_mentions_current_position() {
        let text = Rejection::SwapStale(5).render(&EnglishTexts);
        assert!(text.contains("position 5"));
    }
}
