use std::fmt;

use thiserror::Error;

use crate::todo::{
  Status,
  TodoId
};

/// Required field of a new todo that was left blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
  Title,
  Description,
  Deadline
}

impl fmt::Display for MissingField {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    let name = match self {
      | MissingField::Title => "title",
      | MissingField::Description => {
        "description"
      }
      | MissingField::Deadline => {
        "deadline"
      }
    };
    f.write_str(name)
  }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TodoError {
  #[error("fill all fields (missing: {})", join_fields(.0))]
  Validation(Vec<MissingField>),

  #[error("not logged in; run `todo login`")]
  NotAuthenticated,

  #[error("{method} {path} failed with HTTP {status}: {body}")]
  Http {
    status: u16,
    method: &'static str,
    path:   String,
    body:   String
  },

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("failed decoding server response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid date {0:?}; expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("no todo with id {0}")]
  NotFound(TodoId),

  #[error("todo {id} is {from}; it cannot be moved to {to}")]
  IllegalTransition {
    id:   TodoId,
    from: Status,
    to:   Status
  },

  #[error("no todo is being edited")]
  NoActiveEdit,

  #[error("invalid selector {value:?}; expected one of {expected}")]
  InvalidSelector {
    value:    String,
    expected: &'static str
  },

  #[error(transparent)]
  Io(#[from] std::io::Error)
}

impl TodoError {
  /// Network-level failures the user can retry.
  pub fn is_remote(&self) -> bool {
    matches!(
      self,
      TodoError::Http { .. }
        | TodoError::Transport(_)
        | TodoError::Decode(_)
        | TodoError::NotAuthenticated
    )
  }
}

fn join_fields(
  fields: &[MissingField]
) -> String {
  fields
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
  use super::{
    MissingField,
    TodoError
  };

  #[test]
  fn validation_message_lists_fields() {
    let err = TodoError::Validation(vec![
      MissingField::Title,
      MissingField::Deadline,
    ]);
    assert_eq!(
      err.to_string(),
      "fill all fields (missing: title, \
       deadline)"
    );
    assert!(!err.is_remote());
  }
}
