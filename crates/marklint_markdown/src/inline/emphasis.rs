//! The delimiter-stack emphasis resolver. Walks closers from a lower bound
//! upward; for each one, searches downward for the nearest matching opener,
//! consuming up to two delimiters at a time so `***` can produce nested
//! strong and regular emphasis.

use rustc_hash::FxHashMap;

use crate::token::{MarkdownToken, TokenData, TokenName};

use super::InlineProcessor;

pub(super) enum EmphasisMatchResult {
    NoMatch,
    ConsumedCloser,
    ConsumedOpener,
    ConsumedBoth,
}

/// Process the delimiter arena entries in `bottom..limit`, matching emphasis
/// as much as possible. The per-character lower bound keeps repeated failed
/// searches from rescanning the same span, holding the overall cost linear.
pub(crate) fn process_emphasis(p: &mut InlineProcessor, bottom: usize, limit: usize) {
    let limit = limit.min(p.delimiters.len());
    let mut openers_bottom: FxHashMap<char, usize> = FxHashMap::default();

    for closer_index in bottom..limit {
        {
            let closer = &p.delimiters[closer_index];
            if !closer.is_emphasis()
                || !closer.can_close()
                || !closer.is_active()
                || closer.remaining() == 0
            {
                continue;
            }
        }
        let closer_character = p.delimiters[closer_index].character;
        let search_bottom = *openers_bottom.get(&closer_character).unwrap_or(&bottom);

        let mut found_opener = false;
        for opener_index in (search_bottom..closer_index).rev() {
            {
                let opener = &p.delimiters[opener_index];
                if !opener.is_emphasis()
                    || opener.character != closer_character
                    || !opener.can_open()
                    || !opener.is_active()
                    || opener.remaining() == 0
                {
                    continue;
                }
            }
            found_opener = true;

            match match_emphasis(p, opener_index, closer_index) {
                EmphasisMatchResult::ConsumedCloser | EmphasisMatchResult::ConsumedBoth => break,
                _ => continue,
            }
        }

        // Nothing below this closer can ever match it (or any later closer
        // of the same character); advance the lower bound.
        if !found_opener {
            openers_bottom.insert(closer_character, closer_index);
        }
    }
}

/// Consume the maximum number of delimiters from a known-compatible opener
/// and closer pair, two at a time for strong emphasis, recording the start
/// and end tokens on their respective arena nodes.
pub(super) fn match_emphasis(
    p: &mut InlineProcessor,
    opener_index: usize,
    closer_index: usize,
) -> EmphasisMatchResult {
    let mut to_consume = {
        let opener = &p.delimiters[opener_index];
        let closer = &p.delimiters[closer_index];
        let total_length = opener.remaining() + closer.remaining();

        // "If one of the delimiters can both open and close emphasis, then
        // the sum of the lengths of the delimiter runs containing the
        // opening and closing delimiters must not be a multiple of 3 unless
        // both lengths are multiples of 3."
        if opener.can_open_and_close() || closer.can_open_and_close() {
            if total_length % 3 == 0 && (opener.remaining() % 3 != 0 || closer.remaining() % 3 != 0)
            {
                return EmphasisMatchResult::NoMatch;
            }
        }

        opener.remaining().min(closer.remaining())
    };

    while to_consume > 0 {
        let take = to_consume.min(2);

        {
            let opener = &mut p.delimiters[opener_index];
            // Openers are consumed from the right edge of the run inward,
            // so later matches wrap outside earlier ones.
            let offset = opener.original_count - opener.right_consumed - take;
            opener.right_consumed += take;
            opener.starts.push(MarkdownToken::new(
                opener.line_number,
                opener.column_number + offset,
                TokenData::Emphasis {
                    emphasis_length: take,
                    emphasis_character: opener.character,
                },
            ));
        }
        {
            let closer = &mut p.delimiters[closer_index];
            // Closers are consumed from the left edge outward.
            let column = closer.column_number + closer.left_consumed;
            closer.left_consumed += take;
            closer.ends.push(MarkdownToken::end_at(
                closer.line_number,
                column,
                TokenName::Emphasis,
                "",
                None,
            ));
        }

        to_consume -= take;
    }

    // All unmatched delimiters strictly between the pair would have had to
    // complete within that range, which has now been passed over.
    for index in opener_index + 1..closer_index {
        p.delimiters[index].deactivate();
    }

    let opener_remaining = p.delimiters[opener_index].remaining();
    let closer_remaining = p.delimiters[closer_index].remaining();
    if opener_remaining > 0 && closer_remaining == 0 {
        EmphasisMatchResult::ConsumedCloser
    } else if closer_remaining > 0 && opener_remaining == 0 {
        EmphasisMatchResult::ConsumedOpener
    } else {
        EmphasisMatchResult::ConsumedBoth
    }
}
