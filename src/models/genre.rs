/// TMDB genre codes and their display names, movie and TV lists combined.
///
/// The TV list reuses most movie codes and adds its own composite genres
/// (e.g. "Sci-Fi & Fantasy"), so one table covers both media types.
pub static GENRES: [(u32, &str); 27] = [
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
    (10759, "Action & Adventure"),
    (10762, "Kids"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
];

/// Placeholder shown to users for codes missing from [`GENRES`]
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Looks up the display name of a genre code
pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(code, _)| *code == id)
        .map(|(_, name)| *name)
}

/// Resolves genre codes to names, skipping codes that are not in the table
pub fn resolve_genre_names(ids: &[u32]) -> Vec<&'static str> {
    ids.iter().filter_map(|id| genre_name(*id)).collect()
}

/// Resolves genre codes to names for display, keeping unknown codes as "Unknown"
pub fn display_genre_names(ids: &[u32]) -> Vec<String> {
    ids.iter()
        .map(|id| genre_name(*id).unwrap_or(UNKNOWN_GENRE).to_string())
        .collect()
}
