use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::error::TodoError;
use crate::todo::{
  Priority,
  Status,
  Todo,
  normalize_wire_name
};

/// One equality selector of the sidebar:
/// `ALL` or a single value.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum Selector<T> {
  #[default]
  All,
  Only(T)
}

impl<T: PartialEq> Selector<T> {
  pub fn accepts(
    &self,
    value: &T
  ) -> bool {
    match self {
      | Selector::All => true,
      | Selector::Only(wanted) => {
        wanted == value
      }
    }
  }

  pub fn is_all(&self) -> bool {
    matches!(self, Selector::All)
  }
}

impl<T: fmt::Display> fmt::Display
  for Selector<T>
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Selector::All => f.write_str("ALL"),
      | Selector::Only(value) => {
        write!(f, "{value}")
      }
    }
  }
}

impl<T> FromStr for Selector<T>
where
  T: FromStr<Err = TodoError>
{
  type Err = TodoError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    if normalize_wire_name(s) == "ALL" {
      return Ok(Selector::All);
    }
    s.parse::<T>().map(Selector::Only)
  }
}

pub type StatusFilter = Selector<Status>;
pub type PriorityFilter =
  Selector<Priority>;

/// Independent AND of the status and
/// priority selectors.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct TodoFilter {
  pub status:   StatusFilter,
  pub priority: PriorityFilter
}

impl TodoFilter {
  pub fn new(
    status: StatusFilter,
    priority: PriorityFilter
  ) -> Self {
    Self {
      status,
      priority
    }
  }

  pub fn matches(
    &self,
    todo: &Todo
  ) -> bool {
    self.status.accepts(&todo.status)
      && self
        .priority
        .accepts(&todo.priority)
  }

  /// Filtered view in list order.
  #[tracing::instrument(skip(
    self, todos
  ))]
  pub fn apply<'a>(
    &self,
    todos: &'a [Todo]
  ) -> Vec<&'a Todo> {
    let out: Vec<&Todo> = todos
      .iter()
      .filter(|todo| self.matches(todo))
      .collect();
    trace!(
      status = %self.status,
      priority = %self.priority,
      total = todos.len(),
      kept = out.len(),
      "applied filter"
    );
    out
  }
}
