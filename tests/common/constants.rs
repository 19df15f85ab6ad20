//! Shared constants for end-to-end tests

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user handle
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Second user, for checks involving more than one author
pub const OTHER_USER: &str = "otheruser";

pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Catalog IDs
// ============================================================================
// Ids are assigned in insertion order on a fresh database.

/// "The Test Band"
pub const ARTIST_1_ID: i64 = 1;

/// "Jazz Ensemble"
pub const ARTIST_2_ID: i64 = 2;

/// "First Album" by The Test Band
pub const ALBUM_1_ID: i64 = 1;

/// "Jazz Collection" by Jazz Ensemble
pub const ALBUM_2_ID: i64 = 2;

/// "Opening Track" on First Album
pub const SONG_1_ID: i64 = 1;

/// "Second Song" on First Album
pub const SONG_2_ID: i64 = 2;

/// "Smooth Interlude" on Jazz Collection
pub const SONG_3_ID: i64 = 3;

/// An id no fixture entity uses
pub const MISSING_ID: i64 = 9999;

// ============================================================================
// Timing
// ============================================================================

pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
