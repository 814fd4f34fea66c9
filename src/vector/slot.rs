//! Embedding slots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the embedding positions of a document.
///
/// Every document has a main slot and three named section slots. Weighted
/// queries carry one query vector and one weight per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Main,
    #[serde(rename = "section_1")]
    Section1,
    #[serde(rename = "section_2")]
    Section2,
    #[serde(rename = "section_3")]
    Section3,
}

impl Slot {
    /// All slots in scoring order.
    pub const ALL: [Slot; 4] = [Slot::Main, Slot::Section1, Slot::Section2, Slot::Section3];

    /// The three named section slots.
    pub const SECTIONS: [Slot; 3] = [Slot::Section1, Slot::Section2, Slot::Section3];

    pub fn index(self) -> usize {
        match self {
            Slot::Main => 0,
            Slot::Section1 => 1,
            Slot::Section2 => 2,
            Slot::Section3 => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::Main => "main",
            Slot::Section1 => "section_1",
            Slot::Section2 => "section_2",
            Slot::Section3 => "section_3",
        }
    }

    /// Section slot for a zero-based section position, if in range.
    pub fn section(position: usize) -> Option<Slot> {
        Slot::SECTIONS.get(position).copied()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
