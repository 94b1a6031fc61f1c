use cadence_core::models::{Assignment, WorkoutGroup, WorkoutType};
use chrono::NaiveDate;
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use std::collections::HashMap;
use uuid::Uuid;

/// Assignment already redacted for the viewer, plus what the table needs to label it.
#[derive(Debug, Clone)]
pub struct ViewAssignment {
    pub assignment: Assignment,
    pub group_name: Option<String>,
    /// Name and details are still withheld from this viewer
    pub hidden: bool,
}

impl ViewAssignment {
    pub fn new(
        assignment: &Assignment,
        viewer: Uuid,
        today: NaiveDate,
        groups: &HashMap<Uuid, String>,
    ) -> Self {
        let group_name = assignment.group_id.map(|id| {
            groups
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.to_string()[..8].to_string())
        });
        Self {
            assignment: assignment.redacted_for(viewer, today),
            group_name,
            hidden: assignment.is_hidden_from(viewer, today),
        }
    }
}

pub fn display_schedule(items: &[ViewAssignment], today: NaiveDate) {
    if items.is_empty() {
        println!("No workouts scheduled.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Workout", "Type", "Group", "Details"]);

    for item in items {
        let a = &item.assignment;
        let mut row = Row::new();
        row.add_cell(Cell::new(&a.id.simple().to_string()[..8]));

        let date_text = a.date.format("%a %Y-%m-%d").to_string();
        let date_cell = if a.date == today {
            Cell::new(date_text).fg(Color::Yellow).add_attribute(Attribute::Bold)
        } else if a.date < today {
            Cell::new(date_text).fg(Color::DarkGrey)
        } else {
            Cell::new(date_text)
        };
        row.add_cell(date_cell);

        let mut title = String::new();
        if a.series_id.is_some() {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(&a.title);
        row.add_cell(Cell::new(title));

        let type_cell = match a.workout_type {
            WorkoutType::Wod => Cell::new(a.workout_type).fg(Color::Cyan),
            WorkoutType::Lift => Cell::new(a.workout_type).fg(Color::Magenta),
        };
        row.add_cell(type_cell);

        row.add_cell(Cell::new(item.group_name.as_deref().unwrap_or("Personal")));

        let details = if item.hidden {
            let reveal = a.reveal_date.unwrap_or(a.date);
            Cell::new(format!("Hidden until {}", reveal)).fg(Color::DarkGrey)
        } else {
            Cell::new(a.description.as_deref().unwrap_or(""))
        };
        row.add_cell(details);

        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_dates(dates: &[NaiveDate]) {
    if dates.is_empty() {
        println!("No dates generated.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Weekday"]);
    for (i, date) in dates.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date.format("%Y-%m-%d")),
            Cell::new(date.format("%A")),
        ]);
    }

    println!("{table}");
}

pub fn display_groups(groups: &[WorkoutGroup]) {
    if groups.is_empty() {
        println!("No groups found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Created"]);

    for group in groups {
        let mut row = Row::new();
        row.add_cell(Cell::new(group.id.to_string()));
        row.add_cell(Cell::new(&group.name));
        row.add_cell(Cell::new(group.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}
