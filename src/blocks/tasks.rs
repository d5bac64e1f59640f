//! Task-list parsing and rendering.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Deepest nesting level offered by the task editor (three levels in total).
pub const MAX_INDENT: usize = 2;

static TASK_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)-\s+\[(x| )\]\s(.*)").expect("task item pattern is valid")
});

/// One checkbox item. Nesting is expressed only through `indent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    pub text: String,
    pub done: bool,
    pub indent: usize,
}

impl ParsedTask {
    pub fn new(text: impl Into<String>, done: bool, indent: usize) -> Self {
        Self {
            text: text.into(),
            done,
            indent,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Parse the lines of one task-list block.
///
/// Indent is half the leading whitespace, rounded down. Lines that are not
/// task items become unchecked, unindented items holding the trimmed line.
pub fn parse_tasks<S: AsRef<str>>(lines: &[S]) -> Vec<ParsedTask> {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            let Some(caps) = TASK_ITEM.captures(line) else {
                tracing::trace!(line, "not a task item, keeping as plain text");
                return ParsedTask::new(line.trim(), false, 0);
            };
            ParsedTask {
                text: caps[3].to_string(),
                done: &caps[2] == "x",
                indent: caps[1].chars().count() / 2,
            }
        })
        .collect()
}

/// Render tasks as indented checkbox markdown without a trailing newline.
///
/// A non-blank `title` becomes a `##` heading followed by a blank line.
/// Blank items are dropped unless the list has exactly one item, which is
/// then rendered as `...`.
pub fn render_tasks(title: Option<&str>, tasks: &[ParsedTask]) -> String {
    let mut lines = Vec::with_capacity(tasks.len() + 2);
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        lines.push(format!("## {title}"));
        lines.push(String::new());
    }

    let keep_blank = tasks.len() == 1;
    for task in tasks.iter().filter(|task| keep_blank || !task.is_blank()) {
        let text = if task.text.is_empty() { "..." } else { &task.text };
        lines.push(format!(
            "{}- [{}] {text}",
            "  ".repeat(task.indent),
            if task.done { 'x' } else { ' ' },
        ));
    }
    lines.join("\n")
}

/// Working copy of a task list in the structured editor.
///
/// The list is never empty: removing the last item leaves one blank item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub title: String,
    tasks: Vec<ParsedTask>,
}

impl TaskList {
    /// A list holding `tasks`, or one blank item when `tasks` is empty.
    pub fn from_tasks(tasks: Vec<ParsedTask>) -> Self {
        if tasks.is_empty() {
            return Self::default();
        }
        Self {
            title: String::new(),
            tasks,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn tasks(&self) -> &[ParsedTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the list holds no items.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ParsedTask> {
        self.tasks.get(index)
    }

    /// Insert a blank item after `index` (clamped to the end).
    ///
    /// Returns the index of the new item.
    pub fn insert_after(&mut self, index: usize, indent: usize) -> usize {
        let at = (index + 1).min(self.tasks.len());
        self.tasks
            .insert(at, ParsedTask::new("", false, indent.min(MAX_INDENT)));
        at
    }

    /// Append a blank top-level item.
    pub fn push_blank(&mut self) -> usize {
        self.insert_after(self.tasks.len(), 0)
    }

    /// Remove the item at `index`; removing the only item resets the list.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.tasks.len() {
            return false;
        }
        if self.tasks.len() == 1 {
            self.tasks = vec![ParsedTask::default()];
        } else {
            self.tasks.remove(index);
        }
        true
    }

    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> bool {
        self.update(index, |task| task.text = text.into())
    }

    pub fn set_done(&mut self, index: usize, done: bool) -> bool {
        self.update(index, |task| task.done = done)
    }

    pub fn toggle(&mut self, index: usize) -> bool {
        self.update(index, |task| task.done = !task.done)
    }

    /// Nest the item one level deeper, up to `MAX_INDENT`.
    pub fn indent(&mut self, index: usize) -> bool {
        self.update(index, |task| task.indent = (task.indent + 1).min(MAX_INDENT))
    }

    /// Move the item one level out, stopping at the top level.
    pub fn outdent(&mut self, index: usize) -> bool {
        self.update(index, |task| task.indent = task.indent.saturating_sub(1))
    }

    /// Render with the list's title, if any.
    pub fn render(&self) -> String {
        render_tasks(Some(self.title.as_str()), &self.tasks)
    }

    pub fn into_tasks(self) -> Vec<ParsedTask> {
        self.tasks
    }

    fn update(&mut self, index: usize, f: impl FnOnce(&mut ParsedTask)) -> bool {
        let Some(task) = self.tasks.get_mut(index) else {
            return false;
        };
        f(task);
        true
    }
}

impl Default for TaskList {
    fn default() -> Self {
        Self {
            title: String::new(),
            tasks: vec![ParsedTask::default()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Parsing ---

    #[test]
    fn test_parse_flags_and_indent() {
        let tasks = parse_tasks(&["- [ ] buy milk", "  - [x] eggs", "     - [ ] five spaces"]);
        assert_eq!(
            tasks,
            vec![
                ParsedTask::new("buy milk", false, 0),
                ParsedTask::new("eggs", true, 1),
                ParsedTask::new("five spaces", false, 2),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_text_whitespace() {
        let tasks = parse_tasks(&["- [ ]  padded  "]);
        assert_eq!(tasks[0].text, " padded  ");
    }

    #[test]
    fn test_parse_tab_counts_as_one_column() {
        let tasks = parse_tasks(&["\t\t- [x] tabbed"]);
        assert_eq!(tasks[0].indent, 1);
    }

    #[test]
    fn test_parse_non_task_line_degrades_to_text() {
        let tasks = parse_tasks(&["   * not a task  "]);
        assert_eq!(tasks, vec![ParsedTask::new("* not a task", false, 0)]);
    }

    #[test]
    fn test_parse_uppercase_x_is_not_a_task() {
        let tasks = parse_tasks(&["- [X] shout"]);
        assert_eq!(tasks, vec![ParsedTask::new("- [X] shout", false, 0)]);
    }

    // --- Rendering ---

    #[test]
    fn test_render_nested_list() {
        let tasks = vec![
            ParsedTask::new("plan", false, 0),
            ParsedTask::new("draft", true, 1),
            ParsedTask::new("review", false, 2),
        ];
        assert_eq!(
            render_tasks(None, &tasks),
            "- [ ] plan\n  - [x] draft\n    - [ ] review"
        );
    }

    #[test]
    fn test_render_with_title() {
        let tasks = vec![ParsedTask::new("ship", false, 0)];
        assert_eq!(render_tasks(Some("Release"), &tasks), "## Release\n\n- [ ] ship");
    }

    #[test]
    fn test_render_blank_title_is_omitted() {
        let tasks = vec![ParsedTask::new("ship", false, 0)];
        assert_eq!(render_tasks(Some("   "), &tasks), "- [ ] ship");
    }

    #[test]
    fn test_render_single_blank_task_uses_ellipsis() {
        let tasks = vec![ParsedTask::new("", false, 0)];
        assert_eq!(render_tasks(None, &tasks), "- [ ] ...");
    }

    #[test]
    fn test_render_drops_blank_tasks_from_longer_lists() {
        let tasks = vec![ParsedTask::new("", false, 0), ParsedTask::new("a", true, 0)];
        assert_eq!(render_tasks(None, &tasks), "- [x] a");
    }

    #[test]
    fn test_render_whitespace_only_single_task_is_kept_verbatim() {
        let tasks = vec![ParsedTask::new("  ", false, 0)];
        assert_eq!(render_tasks(None, &tasks), "- [ ]   ");
    }

    #[test]
    fn test_render_does_not_clamp_indent() {
        let tasks = vec![ParsedTask::new("deep", false, 4)];
        assert_eq!(render_tasks(None, &tasks), "        - [ ] deep");
    }

    #[test]
    fn test_render_empty_list() {
        assert_eq!(render_tasks(None, &[]), "");
    }

    // --- Structured editing ---

    #[test]
    fn test_task_list_default_has_one_blank_item() {
        let list = TaskList::default();
        assert_eq!(list.tasks(), &[ParsedTask::default()]);
        assert_eq!(list.render(), "- [ ] ...");
    }

    #[test]
    fn test_task_list_from_empty_vec() {
        assert_eq!(TaskList::from_tasks(Vec::new()), TaskList::default());
    }

    #[test]
    fn test_insert_after_keeps_requested_indent() {
        let mut list = TaskList::from_tasks(vec![
            ParsedTask::new("a", false, 0),
            ParsedTask::new("b", false, 1),
        ]);
        let idx = list.insert_after(1, 1);
        assert_eq!(idx, 2);
        assert_eq!(list.get(2), Some(&ParsedTask::new("", false, 1)));

        let idx = list.insert_after(0, 7);
        assert_eq!(idx, 1);
        assert_eq!(list.get(1).map(|t| t.indent), Some(MAX_INDENT));
    }

    #[test]
    fn test_remove_last_item_resets() {
        let mut list = TaskList::from_tasks(vec![ParsedTask::new("only", true, 2)]);
        assert!(list.remove(0));
        assert_eq!(list.tasks(), &[ParsedTask::default()]);
        assert!(!list.remove(3));
    }

    #[test]
    fn test_indent_and_outdent_clamp() {
        let mut list = TaskList::default();
        for _ in 0..5 {
            list.indent(0);
        }
        assert_eq!(list.get(0).map(|t| t.indent), Some(MAX_INDENT));
        for _ in 0..5 {
            list.outdent(0);
        }
        assert_eq!(list.get(0).map(|t| t.indent), Some(0));
        assert!(!list.indent(9));
    }

    #[test]
    fn test_edit_and_render_with_title() {
        let mut list = TaskList::default().with_title("Today");
        list.set_text(0, "write tests");
        let idx = list.push_blank();
        list.set_text(idx, "review");
        list.toggle(idx);
        list.push_blank();
        assert_eq!(
            list.render(),
            "## Today\n\n- [ ] write tests\n- [x] review"
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn task() -> impl Strategy<Value = ParsedTask> {
            ("[A-Za-z0-9][A-Za-z0-9 ]{0,15}", any::<bool>(), 0..=MAX_INDENT)
                .prop_map(|(text, done, indent)| ParsedTask::new(text, done, indent))
        }

        proptest! {
            #[test]
            fn render_then_parse_is_identity(tasks in prop::collection::vec(task(), 1..12)) {
                let rendered = render_tasks(None, &tasks);
                let lines: Vec<&str> = rendered.split('\n').collect();
                prop_assert_eq!(parse_tasks(&lines), tasks);
            }

            #[test]
            fn rendered_tasks_are_one_block(tasks in prop::collection::vec(task(), 1..12)) {
                let rendered = render_tasks(None, &tasks);
                let map = crate::blocks::detect_blocks(&rendered);
                prop_assert_eq!(map.len(), 1);
                prop_assert_eq!(map.get(0).map(|b| b.line_count()), Some(tasks.len()));
            }
        }
    }
}
