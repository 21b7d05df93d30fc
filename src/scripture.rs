//! Devotional quotation library surfaced during sessions

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptureCategory {
    Anger,
    Peace,
    Listening,
    Praise,
    Forgiveness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scripture {
    pub reference: &'static str,
    pub text: &'static str,
    pub category: ScriptureCategory,
}

pub const SCRIPTURES: &[Scripture] = &[
    Scripture {
        reference: "Proverbs 15:1",
        text: "A gentle answer turns away wrath, but a harsh word stirs up anger.",
        category: ScriptureCategory::Anger,
    },
    Scripture {
        reference: "James 1:19",
        text: "My dear brothers and sisters, take note of this: Everyone should be quick to listen, slow to speak and slow to become angry.",
        category: ScriptureCategory::Listening,
    },
    Scripture {
        reference: "Ephesians 4:29",
        text: "Do not let any unwholesome talk come out of your mouths, but only what is helpful for building others up according to their needs, that it may benefit those who listen.",
        category: ScriptureCategory::Peace,
    },
    Scripture {
        reference: "Proverbs 18:21",
        text: "The tongue has the power of life and death, and those who love it will eat its fruit.",
        category: ScriptureCategory::Peace,
    },
    Scripture {
        reference: "Colossians 4:6",
        text: "Let your conversation be always full of grace, seasoned with salt, so that you may know how to answer everyone.",
        category: ScriptureCategory::Peace,
    },
    Scripture {
        reference: "Proverbs 31:26",
        text: "She speaks with wisdom, and faithful instruction is on her tongue.",
        category: ScriptureCategory::Peace,
    },
];

/// Pick a quotation uniformly at random.
///
/// Reselects on every call; callers wanting one quotation per session
/// should pick once and hold it.
pub fn random_scripture() -> &'static Scripture {
    SCRIPTURES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&SCRIPTURES[0])
}

/// All quotations in one category, in library order
pub fn by_category(category: ScriptureCategory) -> impl Iterator<Item = &'static Scripture> {
    SCRIPTURES.iter().filter(move |s| s.category == category)
}
