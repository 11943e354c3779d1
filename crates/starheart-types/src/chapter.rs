//! Chapter positions in the linear story.
//!
//! Progress stores the chapter as a plain integer; these constants name the
//! positions the narrative views route on.

/// Title page, before the story begins.
pub const START: i32 = 0;
/// The stargazer on the hill.
pub const STARGAZER: i32 = 1;
/// Constellation tracing minigame.
pub const CONSTELLATION: i32 = 2;
/// The voice among the stars.
pub const VOICE: i32 = 3;
/// The tale of the bamboo cutter, where clues are collected.
pub const CLUES: i32 = 4;
/// The final lock and password riddle.
pub const FINALE: i32 = 5;

/// Clues hidden in the bamboo cutter chapter.
pub const CLUE_IDS: [&str; 4] = ["bamboo", "letter", "feather", "stone"];

/// Human-readable name of a chapter position.
pub fn title(chapter: i32) -> &'static str {
    match chapter {
        START => "Prologue",
        STARGAZER => "The Stargazer",
        CONSTELLATION => "Trace the Constellation",
        VOICE => "A Voice Among the Stars",
        CLUES => "The Bamboo Cutter",
        FINALE => "The Final Lock",
        _ => "Unknown",
    }
}

/// Whether `chapter` is one of the positions above.
pub fn is_known(chapter: i32) -> bool {
    (START..=FINALE).contains(&chapter)
}
