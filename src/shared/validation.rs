use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for calendar-date input fields (YYYY-MM-DD)
    /// Format check only; whether the date actually exists (day 32,
    /// Feb 30) is decided by the datetime utility.
    /// - Valid: "2024-01-15", "1999-12-31"
    /// - Invalid: "2024-1-5", "01-15-2024", "2024/01/15"
    pub static ref DATE_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();

    /// Regex for 24-hour wall-clock time input fields (HH:MM)
    /// - Valid: "00:00", "09:30", "23:59"
    /// - Invalid: "24:00", "9:30", "12:60", "12:30:00"
    pub static ref TIME_REGEX: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
}
