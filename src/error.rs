// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

use crate::path::Path;

/// Error type produced by caller-supplied comparators and equality functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a comparison run.
///
/// Mismatches between the compared values are never reported through this
/// type, they end up as [`Difference`](crate::Difference) records instead.
#[derive(Debug, Error)]
pub enum CompareError {
    /// The rule set contradicts itself. Raised before any traversal happens.
    #[error("invalid rule set: {0}")]
    Configuration(String),

    /// A leaf strategy was asked to order values that have no natural ordering.
    #[error("cannot order {actual} against {other}: {reason}")]
    InvalidOperation {
        actual: String,
        other: String,
        reason: &'static str,
    },

    /// A caller-supplied comparator or equality function failed.
    #[error("custom comparison failed at {path}: {source}")]
    UserComparator {
        path: Path,
        #[source]
        source: BoxError,
    },

    /// A shared node was mutably borrowed elsewhere while being compared.
    #[error("shared value at {path} is already mutably borrowed")]
    SharedNodeBorrowed { path: Path },
}

impl CompareError {
    /// Hands back the error raised by caller code, if that is what aborted the run.
    pub fn into_user_error(self) -> Option<BoxError> {
        match self {
            CompareError::UserComparator { source, .. } => Some(source),
            _ => None,
        }
    }

    pub(crate) fn user(path: &Path, source: BoxError) -> Self {
        CompareError::UserComparator {
            path: path.clone(),
            source,
        }
    }
}

/// Errors raised while parsing a textual path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid path `{0}`")]
    Syntax(String),

    #[error("invalid index `{index}` in path `{path}`")]
    Index { path: String, index: String },
}
