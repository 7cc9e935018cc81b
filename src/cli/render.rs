use std::fmt::Write as _;

use strum::IntoEnumIterator;
use time::{Month, Weekday};

use crate::app::DayView;
use crate::index::MonthDay;
use crate::todos::{CalendarDay, Todo, TodoFilter};

const SHORT_ID_LEN: usize = 8;

pub fn short_id(todo: &Todo) -> &str {
    let id = todo.id.as_str();
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

pub fn day_view(view: &DayView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "{} {} · {}",
        view.date.date().weekday(),
        view.date,
        view.identity.name
    );
    let _ = writeln!(
        &mut out,
        "active {} · completed {} · {}",
        view.stats.active,
        view.stats.completed,
        filter_tabs(view.filter)
    );

    if view.is_empty() {
        if view.stats.total() == 0 {
            out.push_str("  No todos for this day yet.");
        } else {
            let _ = write!(&mut out, "  No {} todos for this day.", view.filter);
        }
        return out;
    }

    let lines = view
        .todos
        .iter()
        .map(|todo| {
            format!(
                "  [{}] {}  {}",
                if todo.completed { 'x' } else { ' ' },
                short_id(todo),
                todo.text
            )
        })
        .collect::<Vec<_>>();
    out.push_str(&lines.join("\n"));
    out
}

fn filter_tabs(current: TodoFilter) -> String {
    TodoFilter::iter()
        .map(|filter| {
            if filter == current {
                format!("[{filter}]")
            } else {
                filter.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A month grid. Days with todos carry `*`; the selected day is marked `>`.
pub fn calendar(
    year: i32,
    month: Month,
    days: &[MonthDay],
    selected: CalendarDay,
    week_starts_monday: bool,
) -> String {
    let mut lines = vec![format!("{month} {year}")];

    let week: Vec<Weekday> = if week_starts_monday {
        vec![
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
            Weekday::Sunday,
        ]
    } else {
        vec![
            Weekday::Sunday,
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
        ]
    };
    lines.push(
        week.iter()
            .map(|day| format!(" {:<3}", &day.to_string()[..2]))
            .collect::<String>()
            .trim_end()
            .to_string(),
    );

    let Some(first) = days.first() else {
        return lines.join("\n");
    };
    let lead = week
        .iter()
        .position(|day| *day == first.day.date().weekday())
        .unwrap_or(0);

    let mut row = "    ".repeat(lead);
    let mut column = lead;
    for entry in days {
        let pointer = if entry.day == selected { '>' } else { ' ' };
        let marker = if entry.stats.total() > 0 { '*' } else { ' ' };
        let _ = write!(&mut row, "{pointer}{:>2}{marker}", entry.day.day());
        column += 1;
        if column == 7 {
            lines.push(row.trim_end().to_string());
            row.clear();
            column = 0;
        }
    }
    if !row.is_empty() {
        lines.push(row.trim_end().to_string());
    }
    lines.join("\n")
}
