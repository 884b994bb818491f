use crate::consts;
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Text typed in at the game-over screen
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct NameBuffer(String);

impl NameBuffer {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Append `ch` if it is printable and the name would still fit in
    /// [`NAME_MAX_WIDTH`][consts::NAME_MAX_WIDTH] columns.  Returns whether
    /// the character was accepted.
    pub(crate) fn push(&mut self, ch: char) -> bool {
        if !is_name_char(ch) {
            return false;
        }
        let mut buf = [0u8; 4];
        let width = self.0.width() + ch.encode_utf8(&mut buf).width();
        if width > consts::NAME_MAX_WIDTH {
            return false;
        }
        self.0.push(ch);
        true
    }

    /// Remove the last user-perceived character
    pub(crate) fn backspace(&mut self) {
        if let Some((i, _)) = self.0.grapheme_indices(true).next_back() {
            self.0.truncate(i);
        }
    }

    /// Return the name to record, with surrounding whitespace removed and
    /// [`ANONYMOUS`][consts::ANONYMOUS] substituted for an empty name
    pub(crate) fn to_entry_name(&self) -> String {
        match self.0.trim() {
            "" => String::from(consts::ANONYMOUS),
            s => s.to_owned(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

fn is_name_char(ch: char) -> bool {
    ch == ' '
        || matches!(
            ch.general_category_group(),
            GeneralCategoryGroup::Letter
                | GeneralCategoryGroup::Mark
                | GeneralCategoryGroup::Number
                | GeneralCategoryGroup::Punctuation
                | GeneralCategoryGroup::Symbol
        )
}
