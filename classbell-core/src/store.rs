//! JSON-file persistence for courses, events and the term.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::course::Course;
use crate::error::{BellError, BellResult};
use crate::event::Event;
use crate::term::TermConfig;

const COURSES_FILE: &str = "courses.json";
const EVENTS_FILE: &str = "events.json";
const TERM_FILE: &str = "term.json";

/// Data directory holding `courses.json`, `events.json` and `term.json`.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Store { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // COURSES:

    pub fn courses(&self) -> BellResult<Vec<Course>> {
        self.load(COURSES_FILE)
    }

    pub fn save_courses(&self, courses: &[Course]) -> BellResult<()> {
        self.save(COURSES_FILE, courses)
    }

    pub fn add_course(&self, course: Course) -> BellResult<()> {
        course.validate()?;
        let mut courses = self.courses()?;
        courses.push(course);
        self.save_courses(&courses)
    }

    pub fn update_course(&self, course: Course) -> BellResult<()> {
        course.validate()?;
        let mut courses = self.courses()?;
        let slot = courses
            .iter_mut()
            .find(|c| c.id == course.id)
            .ok_or_else(|| BellError::NotFound(format!("course '{}'", course.id)))?;
        *slot = course;
        self.save_courses(&courses)
    }

    pub fn delete_course(&self, id: &str) -> BellResult<Course> {
        let mut courses = self.courses()?;
        let index = courses
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BellError::NotFound(format!("course '{id}'")))?;
        let removed = courses.remove(index);
        self.save_courses(&courses)?;
        Ok(removed)
    }

    /// Drop the single occurrence of course `id` on `date`.
    pub fn exclude_course_date(&self, id: &str, date: NaiveDate) -> BellResult<()> {
        let mut courses = self.courses()?;
        let course = courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| BellError::NotFound(format!("course '{id}'")))?;
        course.exclude(date);
        self.save_courses(&courses)
    }

    // EVENTS:

    pub fn events(&self) -> BellResult<Vec<Event>> {
        self.load(EVENTS_FILE)
    }

    pub fn save_events(&self, events: &[Event]) -> BellResult<()> {
        self.save(EVENTS_FILE, events)
    }

    pub fn add_event(&self, event: Event) -> BellResult<()> {
        event.validate()?;
        let mut events = self.events()?;
        events.push(event);
        self.save_events(&events)
    }

    pub fn update_event(&self, event: Event) -> BellResult<()> {
        event.validate()?;
        let mut events = self.events()?;
        let slot = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| BellError::NotFound(format!("event '{}'", event.id)))?;
        *slot = event;
        self.save_events(&events)
    }

    pub fn delete_event(&self, id: &str) -> BellResult<Event> {
        let mut events = self.events()?;
        let index = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| BellError::NotFound(format!("event '{id}'")))?;
        let removed = events.remove(index);
        self.save_events(&events)?;
        Ok(removed)
    }

    // TERM:

    pub fn term(&self) -> BellResult<TermConfig> {
        let path = self.dir.join(TERM_FILE);
        if !path.exists() {
            return Ok(TermConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| BellError::Store(format!("{}: {e}", path.display())))
    }

    pub fn save_term(&self, term: &TermConfig) -> BellResult<()> {
        self.save(TERM_FILE, term)
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> BellResult<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| BellError::Store(format!("{}: {e}", path.display())))
    }

    fn save<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> BellResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| BellError::Serialization(e.to_string()))?;

        // Replaced atomically; readers never see a partial file.
        let path = self.dir.join(file);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn empty_directory_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("data"));

        assert!(store.courses().unwrap().is_empty());
        assert!(store.events().unwrap().is_empty());
        assert_eq!(store.term().unwrap(), TermConfig::default());
    }

    #[test]
    fn course_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());

        let course = Course::new("Databases", 2, (3, 4), (1, 16));
        let id = course.id.clone();
        store.add_course(course).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        store.exclude_course_date(&id, date).unwrap();
        assert!(store.courses().unwrap()[0].excluded_dates.contains(&date));

        let mut edited = store.courses().unwrap().remove(0);
        edited.location = Some("Lab 3".into());
        store.update_course(edited).unwrap();
        assert_eq!(store.courses().unwrap()[0].location.as_deref(), Some("Lab 3"));

        let removed = store.delete_course(&id).unwrap();
        assert_eq!(removed.name, "Databases");
        assert!(store.courses().unwrap().is_empty());
    }

    #[test]
    fn invalid_course_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());

        let err = store.add_course(Course::new("Databases", 9, (3, 4), (1, 16)));
        assert!(matches!(err, Err(BellError::InvalidCourse(_))));
        assert!(store.courses().unwrap().is_empty());
    }

    #[test]
    fn missing_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());

        assert!(matches!(store.delete_event("nope"), Err(BellError::NotFound(_))));
        assert!(matches!(store.delete_course("nope"), Err(BellError::NotFound(_))));

        let event = Event::new("Seminar", at("2024-09-18 14:00"), at("2024-09-18 15:00"));
        assert!(matches!(store.update_event(event), Err(BellError::NotFound(_))));
    }

    #[test]
    fn event_and_term_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());

        let event = Event::new("Seminar", at("2024-09-18 14:00"), at("2024-09-18 15:00"));
        store.add_event(event.clone()).unwrap();
        assert_eq!(store.events().unwrap(), vec![event]);

        let term = TermConfig::new(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(), 18);
        store.save_term(&term).unwrap();
        assert_eq!(store.term().unwrap(), term);
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(EVENTS_FILE), "[{").unwrap();
        let store = Store::open(dir.path());

        assert!(matches!(store.events(), Err(BellError::Store(_))));
    }
}
