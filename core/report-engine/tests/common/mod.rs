//! FILENAME: tests/common/mod.rs
//! Fixtures for report-engine integration tests.

#![allow(dead_code)]

use report_engine::{Column, Record};

/// Course assignments at two schools, grouped contiguously by school and
/// course.
pub fn assignments() -> Vec<Record> {
    [
        ("Homework", "hw1", 98, "Math", "Yale"),
        ("Test", "test 1", 89, "Math", "Yale"),
        ("Quiz", "quiz 1", 89, "Biology", "Yale"),
        ("Test", "test 2", 89, "Biology", "Yale"),
        ("Homework", "hw2", 90, "History", "Harvard"),
        ("Test", "test 1", 75, "History", "Harvard"),
        ("Homework", "hw3", 90, "Law", "Harvard"),
        ("Quiz", "quiz 1", 90, "Law", "Harvard"),
    ]
    .into_iter()
    .map(|(kind, description, score, course, school)| {
        Record::new()
            .with("assignment_type", kind)
            .with("description", description)
            .with("score", score)
            .with("course", course)
            .with("school", school)
    })
    .collect()
}

pub fn assignment_columns() -> Vec<Column> {
    vec![
        Column::titled("assignment_type", "Assignment Type"),
        Column::titled("description", "Description"),
        Column::titled("score", "Score"),
        Column::titled("course", "Course"),
        Column::titled("school", "School"),
    ]
}

pub fn characters() -> Vec<Record> {
    [
        ("Luke Skywalker", "Jedi Knight", "Star Wars", 50),
        ("Emporer Palpatine", "Sith Lord", "Star Wars", 95),
        ("Mithrander", "Wizard", "Middle Earth", 9001),
        ("Aragorn", "Ranger", "Middle Earth", 80),
    ]
    .into_iter()
    .map(|(name, class, world, power_level)| {
        Record::new()
            .with("name", name)
            .with("class", class)
            .with("world", world)
            .with("power_level", power_level)
    })
    .collect()
}

/// The three-record score set used by the small scenarios.
pub fn scores() -> Vec<Record> {
    vec![
        Record::new().with("school", "Yale").with("score", 98),
        Record::new().with("school", "Yale").with("score", 89),
        Record::new().with("school", "Harvard").with("score", 90),
    ]
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
