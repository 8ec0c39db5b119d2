use fixture_core::{MarkCode, MarkPoint};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Gives the uncoded marks of a cloud distinct bookkeeping ids.
///
/// Uncoded marks are numbered in cloud order starting at the start index. They stay uncoded, so the ids
/// never take part in code based pairing. Coded marks are passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PointEnumerator {
    start_index: u32,
}

impl PointEnumerator {
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Default is `1000`.
    #[must_use]
    pub fn start_index(self, start_index: u32) -> Self {
        Self { start_index }
    }

    pub fn enumerate<P: Copy>(&self, cloud: &[MarkPoint<P>]) -> Vec<MarkPoint<P>> {
        let mut next = self.start_index;
        cloud
            .iter()
            .map(|mark| {
                if mark.has_code() {
                    *mark
                } else {
                    let id = next;
                    next += 1;
                    mark.with_code(MarkCode::uncoded(id))
                }
            })
            .collect()
    }
}

impl Default for PointEnumerator {
    fn default() -> Self {
        Self { start_index: 1000 }
    }
}
