use crate::{
    callback::CallbackToken,
    keyboard::KeyboardBuilder,
    texts::{MessageKey, TextProvider},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page numbers start at 1")]
    ZeroPage,
    #[error("page size must be positive")]
    ZeroSize,
}

/// Slice `items` into the 1-based page `page` of `size` items.
///
/// Pages past the end are empty.
pub fn page<T>(items: &[T], page: usize, size: usize) -> Result<&[T], PageError> {
    if page == 0 {
        return Err(PageError::ZeroPage);
    }
    if size == 0 {
        return Err(PageError::ZeroSize);
    }
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    Ok(&items[start..end])
}

pub fn page_count(len: usize, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    len.div_ceil(size)
}

/// The page a token asks for; tokens without `p` show the first page.
pub fn requested_page(token: &CallbackToken) -> usize {
    token.page.map(|p| p as usize).unwrap_or(1).max(1)
}

/// Add ◀️/▶️ buttons. Both re-embed `origin` unchanged except for `p`.
pub fn attach_page_controls(
    kb: &mut KeyboardBuilder,
    texts: &dyn TextProvider,
    origin: &CallbackToken,
    current: usize,
    has_next: bool,
) {
    kb.end_row();
    if current > 1 {
        kb.button(
            texts.message(MessageKey::BtnPrevPage, &[]),
            &origin.clone().with_page(page_number(current - 1)),
        );
    }
    if has_next {
        kb.button(
            texts.message(MessageKey::BtnNextPage, &[]),
            &origin.clone().with_page(page_number(current + 1)),
        );
    }
    kb.end_row();
}

fn page_number(p: usize) -> u32 {
    u32::try_from(p).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{callback::codes, domain::ChatId, texts::EnglishTexts};

    #[test]
    fn slices_one_based_pages() {
        let items: Vec<i32> = (1..=10).collect();
        assert_eq!(page(&items, 2, 3).unwrap(), &[4, 5, 6]);
        assert_eq!(page(&items, 4, 3).unwrap(), &[10]);
        assert!(page(&items, 5, 3).unwrap().is_empty());
    }

    #[test]
    fn zero_page_or_size_fails_fast() {
        let items: Vec<i32> = (1..=10).collect();
        assert_eq!(page(&items, 0, 3), Err(PageError::ZeroPage));
        assert_eq!(page(&items, 2, 0), Err(PageError::ZeroSize));
    }

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(10, 3), 4);
        assert_eq!(page_count(9, 3), 3);
        assert_eq!(page_count(0, 3), 0);
    }

    #[test]
    fn page_controls_only_vary_the_page() {
        let origin = CallbackToken::new(codes::GET_CHAT)
            .with_chat(ChatId(-9))
            .with_page(2);
        let mut kb = KeyboardBuilder::new();
        attach_page_controls(&mut kb, &EnglishTexts, &origin, 2, true);
        let tokens: Vec<CallbackToken> = kb
            .build()
            .buttons()
            .map(|b| CallbackToken::decode(&b.callback_data).unwrap())
            .collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], origin.clone().with_page(1));
        assert_eq!(tokens[1], origin.clone().with_page(3));
    }

    #[test]
    fn first_page_has_no_previous_button() {
        let origin = CallbackToken::new(codes::LIST_CHATS);
        let mut kb = KeyboardBuilder::new();
        attach_page_controls(&mut kb, &EnglishTexts, &origin, 1, false);
        assert!(kb.build().is_empty());
        assert_eq!(requested_page(&origin), 1);
    }
}
