//! The task model and the filters a task listing accepts.
//!
//! | Parameter  | Accepts                          | Narrows to                     |
//! |------------|----------------------------------|--------------------------------|
//! | `status`   | `open`, `done`                   | tasks in that state            |
//! | `owner`    | comma separated, `ana,bo`        | tasks owned by any of them     |
//! | `priority` | `3` or a range `2-4`             | that priority, or the range    |
//! | `due`      | `2024-05` or `2024-05-17`        | tasks due in that month or day |
//! | `title`    | any string                       | titles containing it           |
//! | `limit`    | integer, ignored when malformed  | (caps the printed listing)     |

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use paramsieve::memory::{Field, Op, Operand, Query};
use paramsieve::{Filter, FilterSet, FilteredResource, Groups, InvalidArgument, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub owner: String,
    pub priority: i64,
    #[serde(default)]
    pub done: bool,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub due: Option<String>,
}

impl Task {
    fn field(&self, name: &str) -> Field<'_> {
        match name {
            "id" => Field::Int(self.id),
            "title" => Field::Str(&self.title),
            "owner" => Field::Str(&self.owner),
            "priority" => Field::Int(self.priority),
            "done" => Field::Bool(self.done),
            "due" => self.due.as_deref().map_or(Field::Missing, Field::Str),
            _ => Field::Missing,
        }
    }
}

fn accessor<'a>(task: &'a Task, name: &str) -> Field<'a> {
    task.field(name)
}

/// A task list together with the filters it accepts.
pub struct TaskList {
    tasks: Vec<Task>,
    filters: FilterSet<Query>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        Ok(TaskList {
            tasks,
            filters: task_filters()?,
        })
    }

    /// Reads a JSON array of tasks.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let tasks: Vec<Task> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON task list", path.display()))?;
        Self::new(tasks)
    }

    pub fn sample() -> Result<Self> {
        Self::new(sample_tasks())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Runs a query over the list, keeping task order.
    pub fn select(&self, query: &Query) -> Vec<&Task> {
        query.filter(&self.tasks, accessor)
    }
}

impl FilteredResource<Query> for TaskList {
    fn base_query(&self) -> Query {
        Query::new()
    }

    fn filter_set(&self) -> &FilterSet<Query> {
        &self.filters
    }
}

fn operand(value: &Value) -> std::result::Result<Operand, InvalidArgument> {
    Operand::from_value(value)
        .ok_or_else(|| InvalidArgument::rejected(format!("unsupported value '{value}'")))
}

fn group<'a>(groups: &'a Groups, name: &str) -> std::result::Result<&'a str, InvalidArgument> {
    groups
        .get(name)
        .ok_or_else(|| InvalidArgument::rejected(format!("missing '{name}' in {groups}")))
}

/// The filter set behind the table in the module docs.
pub fn task_filters() -> paramsieve::Result<FilterSet<Query>> {
    // `limit` only caps output; malformed values are dropped.
    let paging = FilterSet::builder()
        .handler("limit", |q: Query, v: Value| {
            v.as_i64()
                .filter(|n| *n >= 0)
                .map(|_| q)
                .ok_or_else(|| InvalidArgument::rejected("limit must not be negative"))
        })
        .filter("limit", Filter::integer().handler("limit"))
        .ignore_failure(true)
        .build()?;

    let set = FilterSet::builder()
        .handler("status", |q: Query, v: Value| match v.as_str() {
            Some("open") => Ok(q.and("done", Op::Eq, false)),
            Some("done") => Ok(q.and("done", Op::Eq, true)),
            _ => Err(InvalidArgument::rejected("status must be 'open' or 'done'")),
        })
        .handler("owner", |q: Query, v: Value| Ok(q.and("owner", Op::In, operand(&v)?)))
        .handler("priority", |q: Query, v: Value| {
            Ok(q.and("priority", Op::Eq, operand(&v)?))
        })
        .groups_handler("priority_range", |q: Query, g: Groups| {
            let low: i64 = group(&g, "low")?
                .parse()
                .map_err(|_| InvalidArgument::rejected("priority out of range"))?;
            let high: i64 = group(&g, "high")?
                .parse()
                .map_err(|_| InvalidArgument::rejected("priority out of range"))?;
            if low > high {
                return Err(InvalidArgument::rejected(format!(
                    "empty priority range {low}-{high}"
                )));
            }
            Ok(q.and("priority", Op::Gte, low).and("priority", Op::Lte, high))
        })
        .groups_handler("due", |q: Query, g: Groups| {
            let mut prefix = format!("{}-{}", group(&g, "year")?, group(&g, "month")?);
            if let Some(day) = g.get("day") {
                prefix.push('-');
                prefix.push_str(day);
            }
            Ok(q.and("due", Op::StartsWith, prefix))
        })
        .handler("title", |q: Query, v: Value| {
            Ok(q.and("title", Op::Contains, operand(&v)?))
        })
        .filter("status", Filter::string().handler("status"))
        .filter("owner", Filter::csv().handler("owner"))
        .filter(
            "priority",
            Filter::choice([
                Filter::integer().handler("priority"),
                Filter::pattern(r"(?P<low>\d+)\s*-\s*(?P<high>\d+)")?.handler("priority_range"),
            ]),
        )
        .filter(
            "due",
            Filter::pattern(r"(?P<year>\d{4})-(?P<month>\d{2})(?:-(?P<day>\d{2}))?")?
                .handler("due"),
        )
        .filter("title", Filter::string().handler("title"))
        .nest("paging", paging)
        .build()?;

    Ok(set)
}

fn sample_tasks() -> Vec<Task> {
    let task = |id, title: &str, owner: &str, priority, done, due: Option<&str>| Task {
        id,
        title: title.to_string(),
        owner: owner.to_string(),
        priority,
        done,
        due: due.map(str::to_string),
    };

    vec![
        task(1, "Write release notes", "ana", 2, false, Some("2024-05-17")),
        task(2, "Fix login redirect", "bo", 5, false, Some("2024-05-03")),
        task(3, "Ship 1.0", "ana", 4, false, Some("2024-06-01")),
        task(4, "Triage issues", "cy", 3, true, None),
        task(5, "Update docs site", "bo", 1, true, Some("2024-04-28")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramsieve::Params;
    use std::io::Write;

    fn ids(list: &TaskList, query: &str) -> paramsieve::Result<Vec<i64>> {
        let query = list.filtered_query(&Params::from_query_string(query))?;
        Ok(list.select(&query).iter().map(|t| t.id).collect())
    }

    #[test]
    fn no_params_lists_everything() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "").unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn status_and_owner() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "status=open").unwrap(), vec![1, 2, 3]);
        assert_eq!(ids(&list, "status=done&owner=bo").unwrap(), vec![5]);
    }

    #[test]
    fn priority_value_or_range() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "priority=5").unwrap(), vec![2]);
        assert_eq!(ids(&list, "priority=3-5").unwrap(), vec![2, 3, 4]);
        assert_eq!(ids(&list, "priority=3+-+5").unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn priority_rejections_are_reported() {
        let list = TaskList::sample().unwrap();

        let err = ids(&list, "priority=urgent").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("'priority'"));

        let err = ids(&list, "priority=5-1").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn due_month_or_day() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "due=2024-05").unwrap(), vec![1, 2]);
        assert_eq!(ids(&list, "due=2024-05-03").unwrap(), vec![2]);
        assert!(ids(&list, "due=May").is_err());
    }

    #[test]
    fn owners_match_any() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "owner=ana,cy").unwrap(), vec![1, 3, 4]);
        assert_eq!(ids(&list, "owner=ana&owner=bo").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn title_contains() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "title=docs").unwrap(), vec![5]);
    }

    #[test]
    fn malformed_limit_is_ignored() {
        let list = TaskList::sample().unwrap();
        assert_eq!(ids(&list, "owner=ana&limit=lots").unwrap(), vec![1, 3]);
        assert_eq!(ids(&list, "owner=ana&limit=-1").unwrap(), vec![1, 3]);
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 9, "title": "Water plants", "owner": "dee", "priority": 1}}]"#
        )
        .unwrap();

        let list = TaskList::load(file.path()).unwrap();
        assert_eq!(list.tasks().len(), 1);
        assert!(!list.tasks()[0].done);
        assert_eq!(ids(&list, "owner=dee").unwrap(), vec![9]);
    }

    #[test]
    fn load_rejects_non_task_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tasks": []}}"#).unwrap();

        let err = TaskList::load(file.path()).err().unwrap();
        assert!(err.to_string().contains("not a JSON task list"));
    }
}
