/// Storage format for calendar dates (`2024-09-02`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format for clock times (`08:00`).
pub const TIME_FORMAT: &str = "%H:%M";

/// Length assumed for an event whose end cannot be parsed.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Term length used when none is configured.
pub const DEFAULT_TOTAL_WEEKS: u32 = 20;

/// Upper bound for a reminder offset (four weeks).
pub const MAX_REMINDER_MINUTES: u32 = 4 * 7 * 24 * 60;

/// Reminder offsets the UI offers. Unplanning cancels all of these in addition to
/// the event's own offsets, so triggers survive offset edits without leaking.
pub const KNOWN_REMINDER_OFFSETS: &[u32] = &[0, 5, 10, 15, 30, 60, 120, 1440];

/// Prefix of the synthetic identity given to expanded course occurrences.
pub const OCCURRENCE_ID_PREFIX: &str = "course_";

/// Built-in period table, used when a term has none or it fails to parse.
pub const DEFAULT_PERIODS: &[(u32, &str, &str)] = &[
    (1, "08:00", "08:45"),
    (2, "08:55", "09:40"),
    (3, "10:00", "10:45"),
    (4, "10:55", "11:40"),
    (5, "14:00", "14:45"),
    (6, "14:55", "15:40"),
    (7, "16:00", "16:45"),
    (8, "16:55", "17:40"),
    (9, "19:00", "19:45"),
    (10, "19:55", "20:40"),
    (11, "20:50", "21:35"),
    (12, "21:45", "22:30"),
];
