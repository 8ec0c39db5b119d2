#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Whether a mark carries a decoded identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum MarkKind {
    /// A plain circular mark. Its id is only a bookkeeping index.
    Uncoded,
    /// A mark whose bit code was decoded by the detector.
    BitCoded,
}

/// The identity of a detected or nominal mark.
///
/// Two codes are equal only if both the id and the kind are equal. Uncoded marks never take part in
/// code based pairing, whatever their id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MarkCode {
    pub id: u32,
    pub kind: MarkKind,
}

impl MarkCode {
    pub fn coded(id: u32) -> Self {
        Self {
            id,
            kind: MarkKind::BitCoded,
        }
    }

    pub fn uncoded(id: u32) -> Self {
        Self {
            id,
            kind: MarkKind::Uncoded,
        }
    }

    pub fn is_coded(self) -> bool {
        self.kind != MarkKind::Uncoded
    }
}

impl Default for MarkCode {
    fn default() -> Self {
        Self::uncoded(0)
    }
}

/// A point in some coordinate space tagged with its [`MarkCode`].
///
/// A `MarkPoint` is a value: moving it to another space with [`MarkPoint::with_point`] or
/// [`MarkPoint::map`] produces a new mark with the same code.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MarkPoint<P> {
    code: MarkCode,
    point: P,
}

impl<P> MarkPoint<P> {
    pub fn new(code: MarkCode, point: P) -> Self {
        Self { code, point }
    }

    /// Creates an uncoded mark with id `0`.
    pub fn uncoded(point: P) -> Self {
        Self::new(MarkCode::default(), point)
    }

    pub fn code(&self) -> MarkCode {
        self.code
    }

    pub fn point(&self) -> &P {
        &self.point
    }

    pub fn into_point(self) -> P {
        self.point
    }

    pub fn has_code(&self) -> bool {
        self.code.is_coded()
    }

    /// Same code, new coordinate (possibly in another space).
    pub fn with_point<Q>(&self, point: Q) -> MarkPoint<Q> {
        MarkPoint::new(self.code, point)
    }

    /// Same coordinate, new code.
    #[must_use]
    pub fn with_code(self, code: MarkCode) -> Self {
        Self { code, ..self }
    }

    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> MarkPoint<Q> {
        MarkPoint::new(self.code, f(self.point))
    }
}
